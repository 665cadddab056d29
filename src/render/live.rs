//! Live backend: mirrors the logical tree into a host display tree.
//!
//! The host is anything that exposes a DOM-like API through [`HostTree`]:
//! reference-child insertion (`insertBefore`), child removal, bulk clearing and
//! attribute/text updates. [`LiveBackend`] owns the host and translates the
//! tree's index-based operations into those calls.

use std::fmt;

use slotmap::SecondaryMap;

use super::backend::Backend;
use crate::component::builtin::{TEXT_PROP, TEXT_TAG};
use crate::dom::node::{NodeData, NodeId};
use crate::props::Value;

// ---------------------------------------------------------------------------
// HostTree
// ---------------------------------------------------------------------------

/// Narrow adapter over a native display tree.
pub trait HostTree {
    /// Host node handle.
    type Handle: Copy + Eq + fmt::Debug;

    fn create_element(&mut self, tag: &str) -> Self::Handle;

    fn create_text(&mut self, text: &str) -> Self::Handle;

    fn child_count(&self, parent: Self::Handle) -> usize;

    fn child_at(&self, parent: Self::Handle, index: usize) -> Option<Self::Handle>;

    /// Insert `child` before `reference`, or append when `reference` is `None`.
    fn insert_before(
        &mut self,
        parent: Self::Handle,
        child: Self::Handle,
        reference: Option<Self::Handle>,
    );

    fn remove_child(&mut self, parent: Self::Handle, child: Self::Handle);

    fn clear_children(&mut self, parent: Self::Handle);

    /// Set (`Some`) or remove (`None`) an attribute.
    fn set_attribute(&mut self, node: Self::Handle, name: &str, value: Option<&str>);

    fn set_text(&mut self, node: Self::Handle, text: &str);

    fn set_hidden(&mut self, node: Self::Handle, hidden: bool) {
        self.set_attribute(node, "hidden", hidden.then_some(""));
    }

    /// The node will never be referenced again.
    fn destroy(&mut self, _node: Self::Handle) {}
}

// ---------------------------------------------------------------------------
// LiveBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Mirror<Hd> {
    handle: Hd,
    is_text: bool,
}

/// Backend that keeps a [`HostTree`] isomorphic to the logical tree.
pub struct LiveBackend<H: HostTree> {
    host: H,
    root: H::Handle,
    nodes: SecondaryMap<NodeId, Mirror<H::Handle>>,
}

impl<H: HostTree> LiveBackend<H> {
    /// Mirror into `host`, using `root` as the container of the tree root.
    pub fn new(host: H, root: H::Handle) -> Self {
        Self {
            host,
            root,
            nodes: SecondaryMap::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Host container of the tree root.
    pub fn root_handle(&self) -> H::Handle {
        self.root
    }

    /// Host handle mirroring `node`, if any.
    pub fn handle_of(&self, node: NodeId) -> Option<H::Handle> {
        self.nodes.get(node).map(|m| m.handle)
    }

    fn handle(&self, node: NodeId) -> H::Handle {
        self.handle_of(node)
            .expect("node has no backing handle; was it created through this tree?")
    }

    fn child_handle(&self, parent: H::Handle, index: usize) -> H::Handle {
        self.host
            .child_at(parent, index)
            .unwrap_or_else(|| panic!("backing tree out of sync: no child at index {index}"))
    }
}

impl<H: HostTree> Backend for LiveBackend<H> {
    fn attach_root(&mut self, root: NodeId) {
        self.nodes.insert(
            root,
            Mirror {
                handle: self.root,
                is_text: false,
            },
        );
    }

    fn apply_create(&mut self, node: NodeId, data: &NodeData) {
        let mirror = if data.tag() == TEXT_TAG {
            let text = data
                .props
                .get(TEXT_PROP)
                .and_then(Value::as_str)
                .unwrap_or_default();
            Mirror {
                handle: self.host.create_text(text),
                is_text: true,
            }
        } else {
            let handle = self.host.create_element(data.tag());
            for (name, value) in data.props.iter() {
                if let Some(attr) = attribute_value(Some(value)) {
                    self.host.set_attribute(handle, name, Some(&attr));
                }
            }
            Mirror {
                handle,
                is_text: false,
            }
        };
        if !data.is_visible() {
            self.host.set_hidden(mirror.handle, true);
        }
        self.nodes.insert(node, mirror);
    }

    fn apply_insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let parent = self.handle(parent);
        let child = self.handle(child);
        let reference = self.host.child_at(parent, index);
        self.host.insert_before(parent, child, reference);
    }

    fn apply_remove(&mut self, parent: NodeId, index: usize) {
        let parent = self.handle(parent);
        let child = self.child_handle(parent, index);
        self.host.remove_child(parent, child);
    }

    fn apply_move(&mut self, parent: NodeId, from: usize, to: usize) {
        let parent = self.handle(parent);
        let child = self.child_handle(parent, from);
        self.host.remove_child(parent, child);
        let reference = self.host.child_at(parent, to);
        self.host.insert_before(parent, child, reference);
    }

    fn apply_clear(&mut self, parent: NodeId) {
        let parent = self.handle(parent);
        self.host.clear_children(parent);
    }

    fn apply_property(&mut self, node: NodeId, name: &str, value: Option<&Value>) {
        let Some(mirror) = self.nodes.get(node).copied() else {
            return;
        };
        if mirror.is_text {
            if name == TEXT_PROP {
                let text = value.and_then(Value::as_str).unwrap_or_default();
                self.host.set_text(mirror.handle, text);
            }
            return;
        }
        let attr = attribute_value(value);
        self.host.set_attribute(mirror.handle, name, attr.as_deref());
    }

    fn apply_visibility(&mut self, node: NodeId, visible: bool) {
        if let Some(mirror) = self.nodes.get(node) {
            self.host.set_hidden(mirror.handle, !visible);
        }
    }

    fn release(&mut self, node: NodeId) {
        if let Some(mirror) = self.nodes.remove(node) {
            self.host.destroy(mirror.handle);
        }
    }
}

impl<H: HostTree + fmt::Debug> fmt::Debug for LiveBackend<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveBackend")
            .field("host", &self.host)
            .field("root", &self.root)
            .field("mirrored", &self.nodes.len())
            .finish()
    }
}

/// Attribute text for a property value; `None` removes the attribute.
fn attribute_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Bool(false) => None,
        Value::Bool(true) => Some(String::new()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_values() {
        assert_eq!(attribute_value(None), None);
        assert_eq!(attribute_value(Some(&Value::Bool(false))), None);
        assert_eq!(attribute_value(Some(&Value::Bool(true))), Some(String::new()));
        assert_eq!(attribute_value(Some(&Value::from(vec!["a", "b"]))), Some("a b".into()));
    }
}
