//! Property store: typed, change-detecting per-node state.

pub mod error;
pub mod store;
pub mod value;

pub use error::PropertyError;
pub use store::{ChangeCallback, PropertyDef, PropertyStore, ValueCallback};
pub use value::{Value, ValueKind};
