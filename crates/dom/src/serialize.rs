use crate::document::Document;
use crate::types::{NodeId, NodeKind};
use html::escape_text;
use html::tables::{is_opaque, is_void};

impl Document {
    /// Markup for `node` including its own tags.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        write_node(self, node, &mut out);
        out
    }

    /// Markup for the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            write_node(self, *child, &mut out);
        }
        out
    }
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Element { name, attributes } => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_text(value, true));
                out.push('"');
            }
            out.push('>');
            if is_void(name) {
                return;
            }
            for child in doc.children(node) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Text(data) => {
            let raw = doc
                .parent(node)
                .and_then(|p| doc.element_name(p))
                .is_some_and(is_opaque);
            if raw {
                out.push_str(data);
            } else {
                out.push_str(&escape_text(data, false));
            }
        }
        NodeKind::Comment(data) => {
            out.push_str("<!--");
            out.push_str(data);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            out.push(' ');
            out.push_str(data);
            out.push('>');
        }
        NodeKind::DocumentType { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Document | NodeKind::DocumentFragment => {
            for child in doc.children(node) {
                write_node(doc, *child, out);
            }
        }
        NodeKind::Notation { .. } | NodeKind::Entity { .. } => {}
    }
}
