//! Built-in components: Root, Element, Text.

use std::any::Any;

use crate::component::traits::{Component, RenderInput};
use crate::dom::render::escape_text;
use crate::props::{PropertyDef, PropertyError, PropertyStore, ValueKind};

/// Pseudo tag of the composition root.
pub const ROOT_TAG: &str = "#root";

/// Pseudo tag of text nodes.
pub const TEXT_TAG: &str = "#text";

/// Property holding a text node's content.
pub const TEXT_PROP: &str = "text";

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// The composition root. Serializes as its children only.
#[derive(Debug, Default)]
pub struct Root;

impl Component for Root {
    fn tag(&self) -> &str {
        ROOT_TAG
    }

    fn render(&self, input: &RenderInput<'_>, out: &mut String) {
        out.push_str(input.children);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A plain markup element. Attributes are whatever properties get defined on
/// its node.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Component for Element {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// A text node. Content lives in the managed `text` property.
#[derive(Debug, Clone, Default)]
pub struct Text {
    initial: String,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            initial: content.into(),
        }
    }
}

impl Component for Text {
    fn tag(&self) -> &str {
        TEXT_TAG
    }

    fn define_properties(&self, props: &mut PropertyStore) -> Result<(), PropertyError> {
        props.define(
            TEXT_PROP,
            PropertyDef::new(ValueKind::Str)
                .managed()
                .with_initial(self.initial.as_str()),
        )
    }

    fn render(&self, input: &RenderInput<'_>, out: &mut String) {
        if !input.visible {
            return;
        }
        if let Some(text) = input.props.get(TEXT_PROP).and_then(|v| v.as_str()) {
            out.push_str(&escape_text(text));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
