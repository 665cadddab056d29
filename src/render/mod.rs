//! Rendering backends: capability trait, string backend, live host mirroring.

pub mod backend;
pub mod live;
pub mod memory;
pub mod string;

pub use backend::Backend;
pub use live::{HostTree, LiveBackend};
pub use memory::{HostHandle, MemoryHost};
pub use string::StringBackend;
