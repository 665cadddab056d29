//! In-memory host tree.
//!
//! A minimal DOM stand-in for headless runs and tests. Handles are indices
//! into an arena; destroyed slots go on a free list and are handed out again
//! by the next create. [`MemoryHost::serialize`] emits the same markup format as the
//! logical tree's string rendering.

use super::live::HostTree;
use crate::dom::render::{escape_attr, escape_text, is_void};

/// Handle of a [`MemoryHost`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostHandle(usize);

#[derive(Debug, Clone)]
enum Content {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct HostNode {
    content: Content,
    children: Vec<HostHandle>,
    parent: Option<HostHandle>,
    hidden: bool,
    alive: bool,
}

/// Arena-backed host tree with DOM-like semantics.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    free: Vec<usize>,
    root: HostHandle,
    mutations: usize,
}

impl MemoryHost {
    /// Create a host with an empty container node (`root()`).
    pub fn new() -> Self {
        let mut host = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: HostHandle(0),
            mutations: 0,
        };
        host.root = host.alloc(Content::Element {
            tag: "#root".into(),
            attrs: Vec::new(),
        });
        host
    }

    /// The container node.
    pub fn root(&self) -> HostHandle {
        self.root
    }

    pub fn children(&self, node: HostHandle) -> &[HostHandle] {
        &self.node(node).children
    }

    pub fn parent(&self, node: HostHandle) -> Option<HostHandle> {
        self.node(node).parent
    }

    pub fn tag(&self, node: HostHandle) -> Option<&str> {
        match &self.node(node).content {
            Content::Element { tag, .. } => Some(tag),
            Content::Text(_) => None,
        }
    }

    pub fn text(&self, node: HostHandle) -> Option<&str> {
        match &self.node(node).content {
            Content::Text(text) => Some(text),
            Content::Element { .. } => None,
        }
    }

    pub fn attribute(&self, node: HostHandle, name: &str) -> Option<&str> {
        match &self.node(node).content {
            Content::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            Content::Text(_) => None,
        }
    }

    pub fn is_hidden(&self, node: HostHandle) -> bool {
        self.node(node).hidden
    }

    /// Number of nodes not yet destroyed (including the container).
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.alive).count()
    }

    /// Number of structural host calls made so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// Serialize the children of `node` (the container) or `node` itself.
    pub fn serialize(&self, node: HostHandle) -> String {
        let mut out = String::new();
        if node == self.root {
            for &child in self.children(node) {
                self.write(child, &mut out);
            }
        } else {
            self.write(node, &mut out);
        }
        out
    }

    fn write(&self, handle: HostHandle, out: &mut String) {
        let node = self.node(handle);
        match &node.content {
            Content::Text(text) => {
                if !node.hidden {
                    out.push_str(&escape_text(text));
                }
            }
            Content::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attr(value));
                        out.push('"');
                    }
                }
                if node.hidden {
                    out.push_str(" hidden");
                }
                out.push('>');
                if is_void(tag) {
                    return;
                }
                for &child in &node.children {
                    self.write(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn alloc(&mut self, content: Content) -> HostHandle {
        let node = HostNode {
            content,
            children: Vec::new(),
            parent: None,
            hidden: false,
            alive: true,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                HostHandle(slot)
            }
            None => {
                self.nodes.push(node);
                HostHandle(self.nodes.len() - 1)
            }
        }
    }

    fn node(&self, handle: HostHandle) -> &HostNode {
        &self.nodes[handle.0]
    }

    fn node_mut(&mut self, handle: HostHandle) -> &mut HostNode {
        &mut self.nodes[handle.0]
    }

    fn detach(&mut self, child: HostHandle) {
        if let Some(old) = self.node_mut(child).parent.take() {
            self.node_mut(old).children.retain(|&c| c != child);
        }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTree for MemoryHost {
    type Handle = HostHandle;

    fn create_element(&mut self, tag: &str) -> HostHandle {
        self.alloc(Content::Element {
            tag: tag.to_owned(),
            attrs: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> HostHandle {
        self.alloc(Content::Text(text.to_owned()))
    }

    fn child_count(&self, parent: HostHandle) -> usize {
        self.node(parent).children.len()
    }

    fn child_at(&self, parent: HostHandle, index: usize) -> Option<HostHandle> {
        self.node(parent).children.get(index).copied()
    }

    fn insert_before(&mut self, parent: HostHandle, child: HostHandle, reference: Option<HostHandle>) {
        self.mutations += 1;
        // Like the DOM: inserting an attached node moves it.
        self.detach(child);
        let children = &self.nodes[parent.0].children;
        let position = match reference {
            Some(r) => children
                .iter()
                .position(|&c| c == r)
                .expect("reference node is not a child of parent"),
            None => children.len(),
        };
        self.node_mut(parent).children.insert(position, child);
        self.node_mut(child).parent = Some(parent);
    }

    fn remove_child(&mut self, parent: HostHandle, child: HostHandle) {
        self.mutations += 1;
        assert_eq!(
            self.node(child).parent,
            Some(parent),
            "node is not a child of parent"
        );
        self.detach(child);
    }

    fn clear_children(&mut self, parent: HostHandle) {
        self.mutations += 1;
        let children = std::mem::take(&mut self.node_mut(parent).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
    }

    fn set_attribute(&mut self, node: HostHandle, name: &str, value: Option<&str>) {
        if let Content::Element { attrs, .. } = &mut self.node_mut(node).content {
            match value {
                Some(v) => match attrs.iter_mut().find(|(n, _)| n == name) {
                    Some(slot) => slot.1 = v.to_owned(),
                    None => attrs.push((name.to_owned(), v.to_owned())),
                },
                None => attrs.retain(|(n, _)| n != name),
            }
        }
    }

    fn set_text(&mut self, node: HostHandle, text: &str) {
        if let Content::Text(content) = &mut self.node_mut(node).content {
            *content = text.to_owned();
        }
    }

    fn set_hidden(&mut self, node: HostHandle, hidden: bool) {
        self.node_mut(node).hidden = hidden;
    }

    fn destroy(&mut self, node: HostHandle) {
        let slot = self.node_mut(node);
        if !slot.alive {
            return;
        }
        slot.alive = false;
        slot.children.clear();
        slot.parent = None;
        self.free.push(node.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_and_append() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_element("a");
        let b = host.create_element("b");
        let c = host.create_element("c");
        host.insert_before(root, a, None);
        host.insert_before(root, c, None);
        host.insert_before(root, b, Some(c));
        assert_eq!(host.children(root), &[a, b, c]);
        assert_eq!(host.parent(b), Some(root));
    }

    #[test]
    fn insert_attached_node_moves_it() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_element("a");
        let b = host.create_element("b");
        host.insert_before(root, a, None);
        host.insert_before(root, b, None);
        host.insert_before(root, b, Some(a));
        assert_eq!(host.children(root), &[b, a]);
    }

    #[test]
    fn remove_and_clear() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_element("a");
        let b = host.create_element("b");
        host.insert_before(root, a, None);
        host.insert_before(root, b, None);
        host.remove_child(root, a);
        assert_eq!(host.children(root), &[b]);
        assert_eq!(host.parent(a), None);
        host.clear_children(root);
        assert_eq!(host.child_count(root), 0);
        assert_eq!(host.parent(b), None);
        assert_eq!(host.mutation_count(), 4);
    }

    #[test]
    #[should_panic(expected = "not a child")]
    fn remove_foreign_child_panics() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let a = host.create_element("a");
        host.remove_child(root, a);
    }

    #[test]
    fn serialize_matches_markup_format() {
        let mut host = MemoryHost::new();
        let root = host.root();
        let ul = host.create_element("ul");
        let li = host.create_element("li");
        let text = host.create_text("1 < 2");
        let br = host.create_element("br");
        host.set_attribute(ul, "class", Some("list"));
        host.set_attribute(li, "checked", Some(""));
        host.insert_before(root, ul, None);
        host.insert_before(ul, li, None);
        host.insert_before(li, text, None);
        host.insert_before(root, br, None);
        assert_eq!(
            host.serialize(root),
            r#"<ul class="list"><li checked>1 &lt; 2</li></ul><br>"#
        );
        host.set_hidden(li, true);
        host.set_attribute(ul, "class", None);
        host.set_text(text, "x");
        assert_eq!(host.serialize(ul), "<ul><li checked hidden>x</li></ul>");
        assert_eq!(host.attribute(li, "checked"), Some(""));
        assert_eq!(host.tag(ul), Some("ul"));
        assert_eq!(host.text(text), Some("x"));
        assert!(host.is_hidden(li));
    }

    #[test]
    fn destroy_marks_dead() {
        let mut host = MemoryHost::new();
        let a = host.create_element("a");
        assert_eq!(host.live_count(), 2);
        host.destroy(a);
        assert_eq!(host.live_count(), 1);
        host.destroy(a);
        assert_eq!(host.free.len(), 1);
    }

    #[test]
    fn destroyed_slots_are_reused() {
        let mut host = MemoryHost::new();
        let root = host.root();
        for round in 0..100 {
            let li = host.create_element("li");
            let text = host.create_text(&round.to_string());
            host.insert_before(root, li, None);
            host.insert_before(li, text, None);
            host.remove_child(root, li);
            host.destroy(text);
            host.destroy(li);
        }
        assert_eq!(host.nodes.len(), 3);
        assert_eq!(host.live_count(), 1);
        let fresh = host.create_element("p");
        host.insert_before(root, fresh, None);
        assert_eq!(host.serialize(root), "<p></p>");
    }
}
