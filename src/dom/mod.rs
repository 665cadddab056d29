//! Logical component tree: slotmap arena, structural mutator, markup rendering.

pub mod mutator;
pub mod node;
pub mod render;
pub mod tree;

pub use mutator::{OpRecord, StructuralOp};
pub use node::{Key, KindId, NodeData, NodeId};
pub use tree::Tree;
