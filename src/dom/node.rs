//! Node types: NodeId, Key, KindId, NodeData.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use slotmap::new_key_type;

use crate::component::traits::Component;
use crate::props::{PropertyStore, Value};

new_key_type! {
    /// Arena handle of a tree node. Copy, lightweight (u64).
    pub struct NodeId;
}

// ---------------------------------------------------------------------------
// Key / KindId
// ---------------------------------------------------------------------------

/// Reconciliation key distinguishing siblings of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<u32> for Key {
    fn from(i: u32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Int(i64::try_from(i).expect("key exceeds i64::MAX"))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

/// Component type identity used when matching old nodes against new views.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KindId {
    Root,
    Element(String),
    Text,
    Custom(TypeId),
}

// ---------------------------------------------------------------------------
// NodeData
// ---------------------------------------------------------------------------

/// Data associated with a single tree node.
pub struct NodeData {
    /// Process-unique identity from the tree's [`ComposeContext`](crate::context::ComposeContext).
    pub uid: u64,
    pub(crate) props: PropertyStore,
    pub(crate) visible: bool,
    pub(crate) kind: KindId,
    pub(crate) key: Option<Key>,
    pub(crate) component: Box<dyn Component>,
    pub(crate) attached: bool,
    /// Property values declared by the last reconciliation pass.
    pub(crate) declared: HashMap<String, Option<Value>>,
    /// Visibility declared by the last reconciliation pass.
    pub(crate) declared_visible: Option<bool>,
}

impl NodeData {
    pub(crate) fn new(
        uid: u64,
        kind: KindId,
        key: Option<Key>,
        component: Box<dyn Component>,
    ) -> Self {
        Self {
            uid,
            props: PropertyStore::new(),
            visible: true,
            kind,
            key,
            component,
            attached: false,
            declared: HashMap::new(),
            declared_visible: None,
        }
    }

    pub fn tag(&self) -> &str {
        self.component.tag()
    }

    pub fn kind(&self) -> &KindId {
        &self.kind
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Properties of this node. Writes go through the tree so they reach
    /// the backend.
    pub fn props(&self) -> &PropertyStore {
        &self.props
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn component_mut(&mut self) -> &mut dyn Component {
        self.component.as_mut()
    }

    /// Downcast the component to a concrete type.
    pub fn component_as<C: 'static>(&self) -> Option<&C> {
        self.component.as_any().downcast_ref::<C>()
    }

    /// Whether the node is part of a live composition.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl fmt::Debug for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeData")
            .field("uid", &self.uid)
            .field("tag", &self.tag())
            .field("key", &self.key)
            .field("visible", &self.visible)
            .field("attached", &self.attached)
            .field("props", &self.props)
            .finish()
    }
}
