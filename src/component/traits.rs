//! Component trait: tag, property registration, markup, lifecycle hooks.
//!
//! A `Component` supplies the behaviour of a tree node. Structural state
//! (parent, children, visibility, uid) lives in the tree; the component only
//! decides how its node is serialized and reacts to being attached/detached.

use std::any::Any;

use crate::dom::node::NodeId;
use crate::dom::render::write_element;
use crate::props::{PropertyError, PropertyStore};

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

/// Everything a component sees while serializing itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    /// The node's properties.
    pub props: &'a PropertyStore,
    /// Whether the node is visible.
    pub visible: bool,
    /// Already-serialized markup of the node's children, in child order.
    pub children: &'a str,
}

/// Read-only view handed to lifecycle hooks.
///
/// Hooks cannot reach the tree, so they cannot mutate the region that is
/// being inserted or removed.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleContext<'a> {
    pub node: NodeId,
    pub uid: u64,
    pub props: &'a PropertyStore,
}

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// Behaviour of a tree node.
///
/// Object-safe; nodes store `Box<dyn Component>`.
pub trait Component {
    /// Markup tag name (e.g. `"div"`). Built-ins use `#`-prefixed pseudo tags.
    fn tag(&self) -> &str;

    /// Register the component's properties. Called once at node creation.
    fn define_properties(&self, _props: &mut PropertyStore) -> Result<(), PropertyError> {
        Ok(())
    }

    /// Serialize this node into `out`. Must not have side effects.
    ///
    /// Defaults to element markup: `<tag attrs>children</tag>`.
    fn render(&self, input: &RenderInput<'_>, out: &mut String) {
        write_element(self.tag(), input, out);
    }

    /// Called once when the node becomes part of a live composition.
    fn on_insert(&mut self, _cx: &LifecycleContext<'_>) {}

    /// Called once when the node leaves a live composition.
    fn on_remove(&mut self, _cx: &LifecycleContext<'_>) {}

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for mutable runtime type inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

// ===========================================================================
// Tests
// ===========================================================================
