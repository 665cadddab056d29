//! Headless testing helpers: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to drive an [`App`](crate::app::App) over an in-memory
//! host one scheduler tick at a time. Use [`render_to_string`] and
//! [`outline`] to capture a tree as plain text for snapshot assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::{Pilot, PilotBackend};
pub use snapshot::{outline, render_to_string};
