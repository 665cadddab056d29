//! Component tree: slotmap arena, queries, properties, string rendering.
//!
//! Structural edits live in [`mutator`](super::mutator); this file owns the
//! storage and the non-structural operations.

use std::any::TypeId;

use slotmap::{SecondaryMap, SlotMap};

use super::mutator::OpRecord;
use super::node::{Key, KindId, NodeData, NodeId};
use crate::component::builtin::{Element, Root, Text};
use crate::component::lifecycle::{LifecycleEvent, LifecycleTracker};
use crate::component::traits::{Component, RenderInput};
use crate::context::ComposeContext;
use crate::props::{PropertyDef, PropertyError, Value};
use crate::render::{Backend, StringBackend};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The component tree, backed by a slotmap arena.
///
/// The root node is created with the tree and is always attached. Other
/// nodes are created detached with [`create`](Self::create) and join the
/// tree through the structural operations. Every change is mirrored into the
/// backend `B`.
pub struct Tree<B: Backend = StringBackend> {
    pub(crate) ctx: ComposeContext,
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    pub(crate) children: SecondaryMap<NodeId, Vec<NodeId>>,
    pub(crate) parent: SecondaryMap<NodeId, NodeId>,
    pub(crate) root: NodeId,
    pub(crate) backend: B,
    pub(crate) lifecycle: LifecycleTracker,
    pub(crate) ops: Option<Vec<OpRecord>>,
}

impl Tree<StringBackend> {
    /// A tree without a backing tree.
    pub fn headless(ctx: ComposeContext) -> Self {
        Self::new(ctx, StringBackend)
    }
}

impl<B: Backend> Tree<B> {
    /// Create a tree with a fresh root mirrored into `backend`.
    pub fn new(ctx: ComposeContext, mut backend: B) -> Self {
        let uid = ctx.next_uid();
        let mut nodes = SlotMap::with_key();
        let mut data = NodeData::new(uid, KindId::Root, None, Box::new(Root));
        data.attached = true;
        let root = nodes.insert(data);

        let mut children = SecondaryMap::new();
        children.insert(root, Vec::new());
        backend.attach_root(root);

        let mut lifecycle = LifecycleTracker::new();
        lifecycle.on_insert(root, uid);
        lifecycle.set_recording(false);

        Self {
            ctx,
            nodes,
            children,
            parent: SecondaryMap::new(),
            root,
            backend,
            lifecycle,
            ops: None,
        }
    }

    // ── Creation ────────────────────────────────────────────────────

    /// Create a detached node for `component`.
    pub fn create<C: Component + 'static>(&mut self, component: C) -> Result<NodeId, PropertyError> {
        let kind = kind_of(&component);
        self.create_node(Box::new(component), kind, None)
    }

    /// Create a detached node carrying a reconciliation key.
    pub fn create_keyed<C: Component + 'static>(
        &mut self,
        component: C,
        key: impl Into<Key>,
    ) -> Result<NodeId, PropertyError> {
        let kind = kind_of(&component);
        self.create_node(Box::new(component), kind, Some(key.into()))
    }

    pub(crate) fn create_node(
        &mut self,
        component: Box<dyn Component>,
        kind: KindId,
        key: Option<Key>,
    ) -> Result<NodeId, PropertyError> {
        let uid = self.ctx.next_uid();
        let mut data = NodeData::new(uid, kind, key, component);
        data.component.define_properties(&mut data.props)?;
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.backend.apply_create(id, &self.nodes[id]);
        log::trace!("create node uid={uid} tag={}", self.nodes[id].tag());
        Ok(id)
    }

    /// Destroy a node that was created but never inserted.
    ///
    /// # Panics
    ///
    /// Panics if the node has a parent or is the root.
    pub fn discard(&mut self, id: NodeId) {
        assert!(id != self.root, "discard: the root cannot be discarded");
        assert!(
            !self.parent.contains_key(id),
            "discard: node is still attached to a parent"
        );
        self.destroy_subtree(id);
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    ///
    /// Changes made here bypass the backend; prefer
    /// [`set_property`](Self::set_property) and [`show`](Self::show)/[`hide`](Self::hide).
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Children in order. Empty if the node has none or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Number of children of an existing node.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children
            .get(id)
            .map(Vec::len)
            .expect("node does not exist")
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root exists for the tree's lifetime.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a live node by uid.
    pub fn find_by_uid(&self, uid: u64) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, data)| data.uid == uid)
            .map(|(id, _)| id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    pub fn context(&self) -> &ComposeContext {
        &self.ctx
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn lifecycle(&self) -> &LifecycleTracker {
        &self.lifecycle
    }

    /// Start or stop keeping lifecycle events for
    /// [`drain_lifecycle_events`](Self::drain_lifecycle_events). Off by default.
    pub fn record_lifecycle(&mut self, enabled: bool) {
        self.lifecycle.set_recording(enabled);
    }

    /// Drain the lifecycle events recorded since the last drain.
    pub fn drain_lifecycle_events(&mut self) -> Vec<LifecycleEvent> {
        self.lifecycle.drain()
    }

    // ── Properties ──────────────────────────────────────────────────

    /// Current value of a property.
    pub fn property(&self, id: NodeId, name: &str) -> Option<&Value> {
        self.nodes.get(id).and_then(|data| data.props.get(name))
    }

    /// Register a property on an existing node.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn define_property(
        &mut self,
        id: NodeId,
        name: &str,
        def: PropertyDef,
    ) -> Result<(), PropertyError> {
        self.nodes
            .get_mut(id)
            .expect("define_property: node does not exist")
            .props
            .define(name, def)
    }

    /// Direct assignment; wins over declarative updates this cycle.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<Value>,
    ) -> Result<bool, PropertyError> {
        let data = self.nodes.get_mut(id).expect("set_property: node does not exist");
        let changed = data.props.set(name, value)?;
        if changed {
            self.mirror_property(id, name);
        }
        Ok(changed)
    }

    /// Declarative assignment from a reconciliation pass.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn apply_managed_update(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<Value>,
    ) -> Result<bool, PropertyError> {
        let data = self
            .nodes
            .get_mut(id)
            .expect("apply_managed_update: node does not exist");
        let changed = data.props.apply_managed_update(name, value)?;
        if changed {
            self.mirror_property(id, name);
        }
        Ok(changed)
    }

    /// Close the current update cycle on every node.
    pub fn end_cycle(&mut self) {
        for data in self.nodes.values_mut() {
            data.props.end_cycle();
        }
    }

    fn mirror_property(&mut self, id: NodeId, name: &str) {
        let data = &self.nodes[id];
        self.backend.apply_property(id, name, data.props.get(name));
        self.lifecycle.on_update(id, data.uid);
    }

    // ── Visibility ──────────────────────────────────────────────────

    /// Set the visibility flag. Returns whether it changed.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        let data = self.nodes.get_mut(id).expect("set_visible: node does not exist");
        if data.visible == visible {
            return false;
        }
        data.visible = visible;
        self.backend.apply_visibility(id, visible);
        true
    }

    pub fn show(&mut self, id: NodeId) -> bool {
        self.set_visible(id, true)
    }

    pub fn hide(&mut self, id: NodeId) -> bool {
        self.set_visible(id, false)
    }

    pub fn toggle(&mut self, id: NodeId) -> bool {
        let visible = self.nodes.get(id).is_some_and(NodeData::is_visible);
        self.set_visible(id, !visible)
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Serialize `id` and its subtree. Pure: repeated calls without
    /// mutation return identical output.
    pub fn render_to_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_node(id, &mut out);
        out
    }

    /// Serialize the whole tree.
    pub fn render_root(&self) -> String {
        self.render_to_string(self.root)
    }

    fn render_node(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(id) else {
            return;
        };
        let mut inner = String::new();
        for &child in self.children(id) {
            self.render_node(child, &mut inner);
        }
        data.component.render(
            &RenderInput {
                props: &data.props,
                visible: data.visible,
                children: &inner,
            },
            out,
        );
    }
}

/// Matching identity of a component value.
pub(crate) fn kind_of<C: Component + 'static>(component: &C) -> KindId {
    let type_id = TypeId::of::<C>();
    if type_id == TypeId::of::<Element>() {
        KindId::Element(component.tag().to_owned())
    } else if type_id == TypeId::of::<Text>() {
        KindId::Text
    } else if type_id == TypeId::of::<Root>() {
        KindId::Root
    } else {
        KindId::Custom(type_id)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{PropertyDef, ValueKind};
    use std::any::Any;

    fn tree() -> Tree {
        Tree::headless(ComposeContext::new())
    }

    /// Build:
    /// ```text
    ///   root
    ///   ├── ul
    ///   │   ├── li "a"
    ///   │   └── li "b"
    ///   └── p
    /// ```
    fn build() -> (Tree, NodeId, NodeId, NodeId, NodeId) {
        let mut t = tree();
        let root = t.root();
        let ul = t.create(Element::new("ul")).unwrap();
        let li_a = t.create(Element::new("li")).unwrap();
        let li_b = t.create(Element::new("li")).unwrap();
        let p = t.create(Element::new("p")).unwrap();
        let ta = t.create(Text::new("a")).unwrap();
        let tb = t.create(Text::new("b")).unwrap();
        t.insert(root, 0, ul);
        t.insert(root, 1, p);
        t.insert(ul, 0, li_a);
        t.insert(ul, 1, li_b);
        t.insert(li_a, 0, ta);
        t.insert(li_b, 0, tb);
        (t, ul, li_a, li_b, p)
    }

    struct Counter;

    impl Component for Counter {
        fn tag(&self) -> &str {
            "output"
        }

        fn define_properties(
            &self,
            props: &mut crate::props::PropertyStore,
        ) -> Result<(), PropertyError> {
            props.define("value", PropertyDef::new(ValueKind::Int).managed().with_initial(0))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    // ── Construction ────────────────────────────────────────────────

    #[test]
    fn new_tree_has_attached_root() {
        let t = tree();
        let root = t.root();
        assert_eq!(t.len(), 1);
        assert!(t.get(root).unwrap().is_attached());
        assert_eq!(t.get(root).unwrap().kind(), &KindId::Root);
        assert!(t.children(root).is_empty());
        assert!(!t.is_empty());
    }

    #[test]
    fn uids_come_from_context() {
        let ctx = ComposeContext::new();
        let mut a = Tree::headless(ctx.clone());
        let mut b = Tree::headless(ctx.clone());
        let x = a.create(Element::new("div")).unwrap();
        let y = b.create(Element::new("div")).unwrap();
        assert_ne!(a.get(x).unwrap().uid, b.get(y).unwrap().uid);
        assert_eq!(ctx.issued(), 4);
    }

    #[test]
    fn created_nodes_are_detached() {
        let mut t = tree();
        let id = t.create(Element::new("div")).unwrap();
        assert_eq!(t.parent(id), None);
        assert!(!t.get(id).unwrap().is_attached());
    }

    #[test]
    fn kinds_are_inferred() {
        let mut t = tree();
        let e = t.create(Element::new("div")).unwrap();
        let x = t.create(Text::new("x")).unwrap();
        let c = t.create(Counter).unwrap();
        assert_eq!(t.get(e).unwrap().kind(), &KindId::Element("div".into()));
        assert_eq!(t.get(x).unwrap().kind(), &KindId::Text);
        assert_eq!(t.get(c).unwrap().kind(), &KindId::Custom(TypeId::of::<Counter>()));
    }

    #[test]
    fn keyed_creation() {
        let mut t = tree();
        let id = t.create_keyed(Element::new("li"), 5).unwrap();
        assert_eq!(t.get(id).unwrap().key(), Some(&Key::Int(5)));
    }

    #[test]
    fn component_properties_are_defined() {
        let mut t = tree();
        let id = t.create(Counter).unwrap();
        assert_eq!(t.property(id, "value"), Some(&Value::Int(0)));
    }

    #[test]
    fn discard_detached_node() {
        let mut t = tree();
        let id = t.create(Element::new("div")).unwrap();
        t.discard(id);
        assert!(!t.contains(id));
    }

    #[test]
    #[should_panic(expected = "still attached")]
    fn discard_attached_node_panics() {
        let (mut t, ul, ..) = build();
        t.discard(ul);
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[test]
    fn relationships() {
        let (t, ul, li_a, li_b, p) = build();
        let root = t.root();
        assert_eq!(t.children(root), &[ul, p]);
        assert_eq!(t.children(ul), &[li_a, li_b]);
        assert_eq!(t.parent(li_a), Some(ul));
        assert_eq!(t.ancestors(li_b), vec![ul, root]);
        assert_eq!(t.child_count(ul), 2);
    }

    #[test]
    fn walk_is_preorder() {
        let (t, ul, li_a, li_b, p) = build();
        let walk = t.walk_depth_first(t.root());
        assert_eq!(walk.len(), 7);
        assert_eq!(walk[1], ul);
        assert_eq!(walk[2], li_a);
        assert_eq!(walk[4], li_b);
        assert_eq!(walk[6], p);
    }

    #[test]
    fn find_by_uid() {
        let (t, ul, ..) = build();
        let uid = t.get(ul).unwrap().uid;
        assert_eq!(t.find_by_uid(uid), Some(ul));
        assert_eq!(t.find_by_uid(9_999), None);
    }

    // ── Properties ──────────────────────────────────────────────────

    #[test]
    fn set_property_reports_change() {
        let mut t = tree();
        let id = t.create(Counter).unwrap();
        assert_eq!(t.set_property(id, "value", Some(Value::Int(0))), Ok(false));
        assert_eq!(t.set_property(id, "value", Some(Value::Int(2))), Ok(true));
        assert_eq!(t.property(id, "value"), Some(&Value::Int(2)));
    }

    #[test]
    fn managed_update_loses_to_direct_set_until_end_cycle() {
        let mut t = tree();
        let id = t.create(Counter).unwrap();
        t.set_property(id, "value", Some(Value::Int(1))).unwrap();
        assert_eq!(t.apply_managed_update(id, "value", Some(Value::Int(5))), Ok(false));
        assert_eq!(t.property(id, "value"), Some(&Value::Int(1)));
        t.end_cycle();
        assert_eq!(t.apply_managed_update(id, "value", Some(Value::Int(5))), Ok(true));
    }

    #[test]
    fn property_type_mismatch() {
        let mut t = tree();
        let id = t.create(Counter).unwrap();
        assert!(matches!(
            t.set_property(id, "value", Some(Value::from("x"))),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn property_update_on_attached_node_is_tracked() {
        let mut t = tree();
        t.record_lifecycle(true);
        let root = t.root();
        let id = t.create(Counter).unwrap();
        t.insert(root, 0, id);
        t.drain_lifecycle_events();
        t.set_property(id, "value", Some(Value::Int(3))).unwrap();
        let events = t.drain_lifecycle_events();
        assert!(matches!(events.as_slice(), [LifecycleEvent::Updated { .. }]));
    }

    #[test]
    fn lifecycle_events_are_not_kept_by_default() {
        let mut t = tree();
        let root = t.root();
        let id = t.create(Counter).unwrap();
        t.insert(root, 0, id);
        for n in 0..100 {
            t.set_property(id, "value", Some(Value::Int(n))).unwrap();
        }
        assert!(!t.lifecycle().has_pending());
        assert!(t.lifecycle().is_attached(id));
        assert!(t.drain_lifecycle_events().is_empty());
    }

    // ── Visibility ──────────────────────────────────────────────────

    #[test]
    fn visibility_round_trip() {
        let (mut t, _ul, _a, _b, p) = build();
        assert!(t.hide(p));
        assert!(!t.hide(p));
        assert!(!t.get(p).unwrap().is_visible());
        assert!(t.toggle(p));
        assert!(t.get(p).unwrap().is_visible());
        assert!(!t.show(p));
    }

    // ── Rendering ───────────────────────────────────────────────────

    #[test]
    fn render_tree() {
        let (t, ..) = build();
        assert_eq!(t.render_root(), "<ul><li>a</li><li>b</li></ul><p></p>");
    }

    #[test]
    fn render_subtree() {
        let (t, ul, ..) = build();
        assert_eq!(t.render_to_string(ul), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn render_is_idempotent() {
        let (t, ..) = build();
        assert_eq!(t.render_root(), t.render_root());
    }

    #[test]
    fn render_hidden_nodes() {
        let (mut t, ul, li_a, ..) = build();
        t.hide(ul);
        let text = t.children(li_a)[0];
        t.hide(text);
        assert_eq!(t.render_root(), "<ul hidden><li></li><li>b</li></ul><p></p>");
    }

    #[test]
    fn render_attributes() {
        let mut t = tree();
        let root = t.root();
        let id = t.create(Counter).unwrap();
        t.insert(root, 0, id);
        t.set_property(id, "value", Some(Value::Int(7))).unwrap();
        assert_eq!(t.render_root(), r#"<output value="7"></output>"#);
    }
}
