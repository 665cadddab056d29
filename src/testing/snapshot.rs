//! Snapshot helpers.
//!
//! Plain-text views of a tree for snapshot assertions: the rendered markup,
//! and an indented outline that also shows what markup hides (keys, uids,
//! attachment).

use std::fmt::Write;

use crate::dom::{NodeId, Tree};
use crate::render::Backend;

/// Render the whole tree to markup.
///
/// # Examples
///
/// ```ignore
/// let app = App::headless(|| vec![View::element("p")])?;
/// assert_eq!(app.with_tree(render_to_string), "<p></p>");
/// ```
pub fn render_to_string<B: Backend>(tree: &Tree<B>) -> String {
    tree.render_root()
}

/// One line per node, indented two spaces per level:
/// `tag key=K hidden #uid`. Text nodes show their content in quotes.
/// Lines are joined with `'\n'`, without a trailing newline.
pub fn outline<B: Backend>(tree: &Tree<B>) -> String {
    let mut lines = Vec::new();
    outline_node(tree, tree.root(), 0, &mut lines);
    lines.join("\n")
}

fn outline_node<B: Backend>(tree: &Tree<B>, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(data) = tree.get(id) else {
        return;
    };
    let mut line = "  ".repeat(depth);
    match data.props().get(crate::component::TEXT_PROP) {
        Some(text) if data.tag() == crate::component::TEXT_TAG => {
            let _ = write!(line, "{:?}", text.to_string());
        }
        _ => line.push_str(data.tag()),
    }
    if let Some(key) = data.key() {
        let _ = write!(line, " key={key}");
    }
    if !data.is_visible() {
        line.push_str(" hidden");
    }
    let _ = write!(line, " #{}", data.uid);
    lines.push(line);
    for &child in tree.children(id) {
        outline_node(tree, child, depth + 1, lines);
    }
}
