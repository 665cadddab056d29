//! Markup serialization helpers.
//!
//! Output format:
//!
//! - element: `<tag a="v">children</tag>`, attributes in definition order
//! - `Bool(true)` is a bare attribute, `Bool(false)` is omitted
//! - invisible elements carry a bare `hidden` attribute
//! - void tags (`br`, `img`, ...) have no closing tag and no children

use crate::component::traits::RenderInput;
use crate::props::Value;

/// Tags serialized without a closing tag.
pub const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Whether `tag` is a void element.
pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Write `<tag attrs>children</tag>` for a node.
pub fn write_element(tag: &str, input: &RenderInput<'_>, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in input.props.iter() {
        write_attribute(name, value, out);
    }
    if !input.visible {
        out.push_str(" hidden");
    }
    out.push('>');
    if is_void(tag) {
        return;
    }
    out.push_str(input.children);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Write a single ` name="value"` pair (with the leading space).
pub fn write_attribute(name: &str, value: &Value, out: &mut String) {
    match value {
        Value::Bool(false) => {}
        Value::Bool(true) => {
            out.push(' ');
            out.push_str(name);
        }
        other => {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attr(&other.to_string()));
            out.push('"');
        }
    }
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{PropertyDef, PropertyStore, ValueKind};

    fn props(pairs: &[(&str, Value)]) -> PropertyStore {
        let mut store = PropertyStore::new();
        for (name, value) in pairs {
            store
                .define(*name, PropertyDef::new(value.kind()).with_initial(value.clone()))
                .unwrap();
        }
        store
    }

    fn element(tag: &str, store: &PropertyStore, visible: bool, children: &str) -> String {
        let mut out = String::new();
        write_element(
            tag,
            &RenderInput {
                props: store,
                visible,
                children,
            },
            &mut out,
        );
        out
    }

    #[test]
    fn plain_element() {
        let store = PropertyStore::new();
        assert_eq!(element("div", &store, true, "x"), "<div>x</div>");
    }

    #[test]
    fn attributes_in_definition_order() {
        let store = props(&[
            ("id", Value::from("main")),
            ("class", Value::from(vec!["a", "b"])),
            ("tabindex", Value::from(2)),
        ]);
        assert_eq!(
            element("div", &store, true, ""),
            r#"<div id="main" class="a b" tabindex="2"></div>"#
        );
    }

    #[test]
    fn boolean_attributes() {
        let store = props(&[("disabled", Value::Bool(true)), ("checked", Value::Bool(false))]);
        assert_eq!(element("button", &store, true, ""), "<button disabled></button>");
    }

    #[test]
    fn unset_attributes_are_skipped() {
        let mut store = PropertyStore::new();
        store.define("title", PropertyDef::new(ValueKind::Str)).unwrap();
        assert_eq!(element("p", &store, true, ""), "<p></p>");
    }

    #[test]
    fn hidden_flag() {
        let store = PropertyStore::new();
        assert_eq!(element("p", &store, false, "y"), "<p hidden>y</p>");
    }

    #[test]
    fn void_tag_has_no_close() {
        let store = props(&[("src", Value::from("a.png"))]);
        assert_eq!(element("img", &store, true, "ignored"), r#"<img src="a.png">"#);
        assert!(is_void("br"));
        assert!(!is_void("div"));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("<a & b>"), "&lt;a &amp; b&gt;");
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
    }
}
