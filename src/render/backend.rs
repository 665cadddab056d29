//! Backend capability interface.
//!
//! The tree mirrors every structural operation into its [`Backend`]. Indices
//! are positions within `parent`'s child list as the logical tree sees them at
//! the moment of the call, so a backend whose child lists are kept in sync can
//! apply them verbatim.

use crate::dom::node::{NodeData, NodeId};
use crate::props::Value;

/// Sink for structural and property operations.
pub trait Backend {
    /// The tree root was created.
    fn attach_root(&mut self, root: NodeId);

    /// A node was created (detached). Its initial properties are set.
    fn apply_create(&mut self, node: NodeId, data: &NodeData);

    /// Insert `child` so that it ends at `index` in `parent`
    /// (`index == len` appends).
    fn apply_insert(&mut self, parent: NodeId, index: usize, child: NodeId);

    /// Remove the child at `index` of `parent`.
    fn apply_remove(&mut self, parent: NodeId, index: usize);

    /// Relocate a single child: remove it from `from`, then insert it so that
    /// it ends at `to` (an index into the list after the removal).
    fn apply_move(&mut self, parent: NodeId, from: usize, to: usize);

    /// Remove every child of `parent`.
    fn apply_clear(&mut self, parent: NodeId);

    /// A property value of `node` changed.
    fn apply_property(&mut self, _node: NodeId, _name: &str, _value: Option<&Value>) {}

    /// The visibility flag of `node` changed.
    fn apply_visibility(&mut self, _node: NodeId, _visible: bool) {}

    /// `node` was destroyed; forget any state kept for it.
    fn release(&mut self, _node: NodeId) {}
}
