//! # trellis
//!
//! A compose-style component tree reconciler.
//!
//! A view function describes the children a node should have as a list of
//! [`View`]s. The reconciler matches that description against the existing
//! children by kind and key, then issues the smallest batch of structural
//! operations it can find: ranged removals, moves along a longest increasing
//! subsequence, and inserts of fully built subtrees. Every structural change
//! goes through the tree's mutator, which keeps attachment lifecycle hooks
//! and the rendering backend in step.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: slotmap-backed node arena and the structural mutator
//! - **[`props`]**: typed per-node properties with managed and direct writes
//! - **[`component`]**: the component trait, built-in components, lifecycle tracking
//! - **[`render`]**: string and live backends, plus an in-memory host tree
//! - **[`compose`]**: declarative views and the reconciliation pass
//! - **[`reactive`]**: signals, effects, memos and injectable schedulers
//! - **[`app`]**: the driver that reruns a view when its signals change
//! - **[`testing`]**: a step-by-step pilot and snapshot helpers
//!
//! ## Example
//!
//! ```ignore
//! use trellis::{App, View};
//! use trellis::reactive::create_signal;
//!
//! let (items, set_items) = create_signal(vec!["a", "b"]);
//! let app = App::headless(move || {
//!     vec![View::element("ul").children(
//!         items.get().into_iter().map(|s| View::element("li").key(s).child(View::text(s))),
//!     )]
//! })?;
//! set_items.set(vec!["b", "a"]);
//! assert_eq!(app.render_to_string(), "<ul><li>b</li><li>a</li></ul>");
//! ```

// Foundation
pub mod context;
pub mod props;

// Tree
pub mod component;
pub mod dom;
pub mod render;

// Composition
pub mod compose;
pub mod reactive;

// Application
pub mod app;
pub mod testing;

pub use app::{App, AppConfig};
pub use component::{Component, LifecycleEvent};
pub use compose::{reconcile, ComposeError, PassReport, View};
pub use context::ComposeContext;
pub use dom::{Key, KindId, NodeId, Tree};
pub use props::{PropertyError, Value};
pub use render::{Backend, LiveBackend, MemoryHost, StringBackend};
