use crate::document::Document;
use crate::types::{NodeId, NodeKind};

/// Preorder successor of `node` inside the subtree rooted at `root`.
pub fn next_in_preorder(doc: &Document, node: NodeId, root: NodeId) -> Option<NodeId> {
    if let Some(first) = doc.first_child(node) {
        return Some(first);
    }
    let mut current = node;
    while current != root {
        if let Some(next) = doc.next_sibling(current) {
            return Some(next);
        }
        current = doc.parent(current)?;
    }
    None
}

/// Descendants of `root` in document order, excluding `root`.
pub fn descendants(doc: &Document, root: NodeId) -> Descendants<'_> {
    Descendants {
        doc,
        root,
        next: doc.first_child(root),
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = next_in_preorder(self.doc, current, self.root);
        Some(current)
    }
}

pub fn is_text(doc: &Document, node: NodeId) -> bool {
    matches!(doc.kind(node), NodeKind::Text(_))
}

pub fn is_comment(doc: &Document, node: NodeId) -> bool {
    matches!(doc.kind(node), NodeKind::Comment(_))
}

/// Text node descendants of `root`.
pub fn text_nodes(doc: &Document, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    descendants(doc, root).filter(move |n| is_text(doc, *n))
}

/// Indented one-line-per-node outline of a subtree, at most `cap` lines.
pub fn outline(doc: &Document, root: NodeId, cap: usize) -> Vec<String> {
    fn walk(doc: &Document, node: NodeId, depth: usize, out: &mut Vec<String>, left: &mut usize) {
        if *left == 0 {
            return;
        }
        *left -= 1;
        let indent = "  ".repeat(depth);
        match doc.kind(node) {
            NodeKind::Element { name, .. } => {
                let mut line = format!("{indent}<{name}");
                if let Some(id) = doc.get_attribute(node, "id").filter(|v| !v.is_empty()) {
                    line.push_str(&format!(r#" id="{id}""#));
                }
                if let Some(class) = doc.get_attribute(node, "class").filter(|v| !v.is_empty()) {
                    line.push_str(&format!(r#" class="{class}""#));
                }
                line.push('>');
                out.push(line);
            }
            NodeKind::Text(text) => out.push(format!("{indent}{text:?}")),
            NodeKind::Comment(text) => out.push(format!("{indent}<!--{text}-->")),
            other => out.push(format!("{indent}{}", other.node_name())),
        }
        for child in doc.children(node) {
            walk(doc, *child, depth + 1, out, left);
        }
    }

    let mut out = Vec::new();
    let mut left = cap;
    walk(doc, root, 0, &mut out, &mut left);
    out
}
