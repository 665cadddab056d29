//! Effects, memos and batching.
//!
//! An effect is a closure that re-runs whenever any signal it reads changes:
//!
//! ```ignore
//! let (count, set_count) = create_signal(0);
//! create_effect(move || log::info!("count = {}", count.get()));
//! set_count.set(1); // logs "count = 1"
//! ```
//!
//! A memo only notifies downstream readers when its output changes, and
//! [`batch`] groups writes so that each reaction runs once.

pub use super::signal::{
    batch, create_effect, create_effect_with_id, create_memo, dispose_effect, EffectId,
};
