//! Declarative description of a subtree.
//!
//! A view function returns a fresh `Vec<View>` on every pass; the reconciler
//! diffs it against the children already in the tree.
//!
//! ```ignore
//! View::element("ul").class("todo").children(
//!     items.iter().map(|item| View::element("li").key(item.id).child(View::text(&item.title))),
//! )
//! ```

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use crate::component::builtin::{Element, Text, TEXT_PROP};
use crate::component::traits::Component;
use crate::dom::node::{Key, KindId};
use crate::props::Value;

/// Builds the component for a newly created node.
pub(crate) type Factory = Rc<dyn Fn() -> Box<dyn Component>>;

/// One node of a declarative description.
#[derive(Clone)]
pub struct View {
    pub(crate) kind: KindId,
    pub(crate) factory: Factory,
    pub(crate) key: Option<Key>,
    pub(crate) props: Vec<(String, Option<Value>)>,
    pub(crate) visible: bool,
    pub(crate) children: Vec<View>,
}

impl View {
    /// A plain element such as `div` or `li`.
    pub fn element(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let kind = KindId::Element(tag.clone());
        Self::with_factory(kind, Rc::new(move || Box::new(Element::new(tag.clone()))))
    }

    /// A text node. The content is the managed `text` property, so changing
    /// it between passes updates the node in place.
    pub fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        let initial = content.clone();
        Self::with_factory(KindId::Text, Rc::new(move || Box::new(Text::new(initial.clone()))))
            .prop(TEXT_PROP, content)
    }

    /// A custom component. `factory` runs only when a node is created; a
    /// retained node keeps its component instance.
    pub fn component<C, F>(factory: F) -> Self
    where
        C: Component + 'static,
        F: Fn() -> C + 'static,
    {
        let kind = KindId::Custom(TypeId::of::<C>());
        Self::with_factory(kind, Rc::new(move || Box::new(factory())))
    }

    fn with_factory(kind: KindId, factory: Factory) -> Self {
        Self {
            kind,
            factory,
            key: None,
            props: Vec::new(),
            visible: true,
            children: Vec::new(),
        }
    }

    /// Identify this view among siblings of the same kind.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Declare a property value. A later declaration of the same name wins.
    pub fn prop(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.declare(name.into(), Some(value.into()))
    }

    /// Declare a property as unset.
    pub fn unset(self, name: impl Into<String>) -> Self {
        self.declare(name.into(), None)
    }

    /// Add a class to the `class` list property.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        match self.props.iter_mut().find(|(n, _)| n == "class") {
            Some((_, Some(Value::List(list)))) => list.push(class),
            Some((_, slot)) => *slot = Some(Value::List(vec![class])),
            None => self.props.push(("class".into(), Some(Value::List(vec![class])))),
        }
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn child(mut self, child: View) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = View>) -> Self {
        self.children.extend(children);
        self
    }

    fn declare(mut self, name: String, value: Option<Value>) -> Self {
        match self.props.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.props.push((name, value)),
        }
        self
    }

    pub fn kind(&self) -> &KindId {
        &self.kind
    }

    pub fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Declared value of `name`: `None` if undeclared, `Some(None)` if
    /// declared unset.
    pub fn declared(&self, name: &str) -> Option<Option<&Value>> {
        self.props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_ref())
    }

    pub fn child_views(&self) -> &[View] {
        &self.children
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("props", &self.props)
            .field("visible", &self.visible)
            .field("children", &self.children)
            .finish()
    }
}
