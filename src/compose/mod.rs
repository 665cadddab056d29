//! Declarative composition: views and reconciliation.

pub mod error;
pub mod reconcile;
pub mod view;

pub use error::ComposeError;
pub use reconcile::{reconcile, PassReport};
pub use view::View;
