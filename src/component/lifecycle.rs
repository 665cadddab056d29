//! Lifecycle tracking: insert, remove, property update.
//!
//! The tree reports every attach/detach of a node to the live composition
//! here, alongside calling the component's hooks. The tracker keeps the set of
//! attached nodes and, while recording, a queue of events that can be drained
//! for inspection. A tree starts with recording off so a long-running app does
//! not accumulate events nobody drains.

use std::collections::HashSet;

use crate::dom::node::NodeId;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// A structural transition of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The node joined the live composition.
    Inserted { node: NodeId, uid: u64 },
    /// The node left the live composition.
    Removed { node: NodeId, uid: u64 },
    /// A property of an attached node changed.
    Updated { node: NodeId, uid: u64 },
}

impl LifecycleEvent {
    pub fn uid(&self) -> u64 {
        match self {
            LifecycleEvent::Inserted { uid, .. }
            | LifecycleEvent::Removed { uid, .. }
            | LifecycleEvent::Updated { uid, .. } => *uid,
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleTracker
// ---------------------------------------------------------------------------

/// Tracks which nodes are attached and accumulates lifecycle events.
#[derive(Debug)]
pub struct LifecycleTracker {
    attached: HashSet<NodeId>,
    pending: Vec<LifecycleEvent>,
    recording: bool,
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleTracker {
    /// A tracker that records events.
    pub fn new() -> Self {
        Self {
            attached: HashSet::new(),
            pending: Vec::new(),
            recording: true,
        }
    }

    /// Turn event recording on or off. Turning it off drops pending events;
    /// attachment state is tracked either way.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
        if !recording {
            self.pending.clear();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    fn record(&mut self, event: LifecycleEvent) {
        if self.recording {
            self.pending.push(event);
        }
    }

    /// Record an attach. Returns `false` (and records nothing) if the node
    /// was already attached.
    pub fn on_insert(&mut self, node: NodeId, uid: u64) -> bool {
        if self.attached.insert(node) {
            self.record(LifecycleEvent::Inserted { node, uid });
            true
        } else {
            false
        }
    }

    /// Record a detach. Returns `false` if the node was not attached.
    pub fn on_remove(&mut self, node: NodeId, uid: u64) -> bool {
        if self.attached.remove(&node) {
            self.record(LifecycleEvent::Removed { node, uid });
            true
        } else {
            false
        }
    }

    /// Record a property change. Ignored for detached nodes.
    pub fn on_update(&mut self, node: NodeId, uid: u64) {
        if self.attached.contains(&node) {
            self.record(LifecycleEvent::Updated { node, uid });
        }
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.attached.contains(&node)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Drain and return all pending events, oldest first.
    pub fn drain(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
