//! Component system: behaviour trait, lifecycle tracking, built-ins.

pub mod builtin;
pub mod lifecycle;
pub mod traits;

pub use builtin::{Element, Root, Text, ROOT_TAG, TEXT_PROP, TEXT_TAG};
pub use lifecycle::{LifecycleEvent, LifecycleTracker};
pub use traits::{Component, LifecycleContext, RenderInput};
