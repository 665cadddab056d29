//! Tree mutator: insert, remove-range, move-range, clear.
//!
//! These four operations are the only structural edits. Each one updates the
//! logical child list of a parent and mirrors the same edit into the backend,
//! so that after every call the backend's child order equals the logical one.
//!
//! Index arguments are preconditions: out-of-range values panic instead of
//! clamping, since clamping one side would desynchronize the two trees.
//!
//! # Move semantics
//!
//! `move_range(parent, from, to, count)` takes `to` in pre-move coordinates:
//! the run `from..from + count` ends up immediately before the child that was
//! at `to` (or at the end when `to == len`). Its final start index is
//! therefore `to` when moving left and `to - count` when moving right.
//! Moving back is `move_range(dest, from, count)` when the run moved left,
//! and `move_range(dest, from + count, count)` when it moved right.

use super::node::NodeId;
use super::tree::Tree;
use crate::component::traits::LifecycleContext;
use crate::render::Backend;

// ---------------------------------------------------------------------------
// Operation log
// ---------------------------------------------------------------------------

/// A structural operation against one parent's child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralOp {
    Insert { index: usize, node: NodeId },
    RemoveRange { index: usize, count: usize },
    MoveRange { from: usize, to: usize, count: usize },
    ClearAll,
}

/// A recorded operation together with the parent it targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpRecord {
    pub parent: NodeId,
    pub op: StructuralOp,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl<B: Backend> Tree<B> {
    /// Insert a detached `node` so that it ends at `index` among `parent`'s
    /// children; `index == len` appends.
    ///
    /// If `parent` is attached, `on_insert` fires for every node of the
    /// inserted subtree that was not attached yet, parents first.
    ///
    /// # Panics
    ///
    /// Panics if either node does not exist, `node` is the root, already has
    /// a parent, or is `parent` or one of its ancestors, or if
    /// `index > len`.
    pub fn insert(&mut self, parent: NodeId, index: usize, node: NodeId) {
        assert!(self.nodes.contains_key(node), "insert: node does not exist");
        assert!(node != self.root, "insert: the root cannot be inserted");
        assert!(
            !self.parent.contains_key(node),
            "insert: node is already attached to a parent"
        );
        assert!(
            node != parent && !self.ancestors(parent).contains(&node),
            "insert: node is an ancestor of the target parent"
        );
        let len = self.child_count(parent);
        assert!(index <= len, "insert: index {index} out of range for {len} children");

        self.children[parent].insert(index, node);
        self.parent.insert(node, parent);
        self.backend.apply_insert(parent, index, node);
        log::trace!("insert index={index} uid={}", self.nodes[node].uid);
        self.record(parent, StructuralOp::Insert { index, node });

        if self.nodes[parent].attached {
            self.attach_subtree(node);
        }
    }

    /// Remove `count` children starting at `index`, destroying their subtrees.
    ///
    /// The child at `index` is removed `count` times, so the original
    /// positions `index..index + count` go away.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not exist or `index + count > len`.
    pub fn remove_range(&mut self, parent: NodeId, index: usize, count: usize) {
        let len = self.child_count(parent);
        assert!(
            index.checked_add(count).is_some_and(|end| end <= len),
            "remove_range: {count} children at {index} out of range for {len} children"
        );

        for _ in 0..count {
            let child = self.children[parent].remove(index);
            self.parent.remove(child);
            self.backend.apply_remove(parent, index);
            self.destroy_subtree(child);
        }
        log::trace!("remove_range index={index} count={count}");
        self.record(parent, StructuralOp::RemoveRange { index, count });
    }

    /// Relocate the run `from..from + count` to just before the child at
    /// `to` (pre-move coordinates). No lifecycle hooks fire.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not exist, the run exceeds the child list,
    /// `to > len`, or `to` lies strictly inside the run.
    pub fn move_range(&mut self, parent: NodeId, from: usize, to: usize, count: usize) {
        let len = self.child_count(parent);
        assert!(
            from.checked_add(count).is_some_and(|end| end <= len),
            "move_range: {count} children at {from} out of range for {len} children"
        );
        assert!(to <= len, "move_range: destination {to} out of range for {len} children");
        assert!(
            to <= from || to >= from + count,
            "move_range: destination {to} lies inside the moved run {from}..{}",
            from + count
        );

        self.record(parent, StructuralOp::MoveRange { from, to, count });
        let dest = if from > to { to } else { to - count };
        if count == 0 || dest == from {
            return;
        }
        log::trace!("move_range from={from} to={to} count={count}");

        if count == 1 && dest.abs_diff(from) == 1 {
            // Adjacent single element: a swap has the same end state.
            self.children[parent].swap(from, dest);
            self.backend.apply_move(parent, from, dest);
        } else if from > to {
            // Moving left: the i-th element sits at from + i and lands at to + i.
            for i in 0..count {
                let node = self.children[parent].remove(from + i);
                self.children[parent].insert(to + i, node);
                self.backend.apply_move(parent, from + i, to + i);
            }
        } else {
            // Moving right: the run's head is always at `from`; after its
            // removal the original `to` child sits at to - 1.
            for _ in 0..count {
                let node = self.children[parent].remove(from);
                self.children[parent].insert(to - 1, node);
                self.backend.apply_move(parent, from, to - 1);
            }
        }
    }

    /// Remove every child of `parent`, destroying their subtrees. The backend
    /// is cleared with one bulk call.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not exist.
    pub fn clear_all(&mut self, parent: NodeId) {
        let kids = std::mem::take(
            self.children
                .get_mut(parent)
                .expect("clear_all: parent does not exist"),
        );
        for &kid in &kids {
            self.parent.remove(kid);
        }
        self.backend.apply_clear(parent);
        log::trace!("clear_all count={}", kids.len());
        for kid in kids {
            self.destroy_subtree(kid);
        }
        self.record(parent, StructuralOp::ClearAll);
    }

    /// Apply an operation value.
    pub fn apply(&mut self, parent: NodeId, op: StructuralOp) {
        match op {
            StructuralOp::Insert { index, node } => self.insert(parent, index, node),
            StructuralOp::RemoveRange { index, count } => self.remove_range(parent, index, count),
            StructuralOp::MoveRange { from, to, count } => self.move_range(parent, from, to, count),
            StructuralOp::ClearAll => self.clear_all(parent),
        }
    }

    // ── Operation log ───────────────────────────────────────────────

    /// Start or stop recording operations.
    pub fn record_ops(&mut self, enabled: bool) {
        self.ops = enabled.then(Vec::new);
    }

    /// Take the operations recorded so far.
    pub fn take_ops(&mut self) -> Vec<OpRecord> {
        self.ops.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn record(&mut self, parent: NodeId, op: StructuralOp) {
        if let Some(ops) = &mut self.ops {
            ops.push(OpRecord { parent, op });
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Mark `node` and its descendants attached, parents first.
    fn attach_subtree(&mut self, node: NodeId) {
        for id in self.walk_depth_first(node) {
            let data = &mut self.nodes[id];
            if data.attached {
                continue;
            }
            data.attached = true;
            let cx = LifecycleContext {
                node: id,
                uid: data.uid,
                props: &data.props,
            };
            data.component.on_insert(&cx);
            self.lifecycle.on_insert(id, data.uid);
        }
    }

    /// Free `node` and its descendants, children before parents, firing
    /// `on_remove` for those that were attached.
    pub(crate) fn destroy_subtree(&mut self, node: NodeId) {
        let mut order = self.walk_depth_first(node);
        order.reverse();
        for id in order {
            let Some(mut data) = self.nodes.remove(id) else {
                continue;
            };
            self.children.remove(id);
            self.parent.remove(id);
            if data.attached {
                data.attached = false;
                let cx = LifecycleContext {
                    node: id,
                    uid: data.uid,
                    props: &data.props,
                };
                data.component.on_remove(&cx);
                self.lifecycle.on_remove(id, data.uid);
            }
            self.backend.release(id);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
