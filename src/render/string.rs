//! String backend: no backing tree.
//!
//! Every operation only affects the logical tree; the observable output is
//! [`Tree::render_to_string`](crate::dom::Tree::render_to_string).

use super::backend::Backend;
use crate::dom::node::{NodeData, NodeId};

/// Backend for environments without a live display surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringBackend;

impl Backend for StringBackend {
    fn attach_root(&mut self, _root: NodeId) {}

    fn apply_create(&mut self, _node: NodeId, _data: &NodeData) {}

    fn apply_insert(&mut self, _parent: NodeId, _index: usize, _child: NodeId) {}

    fn apply_remove(&mut self, _parent: NodeId, _index: usize) {}

    fn apply_move(&mut self, _parent: NodeId, _from: usize, _to: usize) {}

    fn apply_clear(&mut self, _parent: NodeId) {}
}
