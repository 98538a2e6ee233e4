use crate::document::Document;
use crate::types::{NodeId, NodeKind};
use html::{ParseError, Token, TokenSink};

impl Document {
    /// Builds a new document from `markup`. Top-level nodes become children
    /// of the document node.
    pub fn parse_html(markup: &str) -> Result<Document, ParseError> {
        let mut doc = Document::new();
        let fragment = doc.parse_fragment(markup)?;
        let root = doc.root();
        let children = doc.children(fragment).to_vec();
        for child in children {
            doc.detach(child);
            doc.push_child(root, child);
        }
        Ok(doc)
    }

    /// Parses `markup` into a new detached fragment of this document.
    ///
    /// On error no node reachable from the tree is touched.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<NodeId, ParseError> {
        let fragment = self.create_fragment();
        let mut builder = TreeBuilder {
            doc: self,
            root: fragment,
            open_elements: Vec::new(),
        };
        html::parse(markup, &mut builder)?;
        log::trace!(
            target: "dom.builder",
            "parsed fragment {fragment} from {} bytes",
            markup.len()
        );
        Ok(fragment)
    }
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    root: NodeId,
    open_elements: Vec<NodeId>,
}

impl TreeBuilder<'_> {
    fn current_parent(&self) -> NodeId {
        self.open_elements.last().copied().unwrap_or(self.root)
    }
}

impl TokenSink for TreeBuilder<'_> {
    fn token(&mut self, token: Token) {
        let parent = self.current_parent();
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let pairs: Vec<(&str, &str)> = attributes.iter().collect();
                let element = self.doc.create_element_with(&name, &pairs);
                self.doc.push_child(parent, element);
                if !self_closing {
                    self.open_elements.push(element);
                }
            }
            Token::EndTag(name) => {
                while let Some(open) = self.open_elements.pop() {
                    if self.doc.is_element_named(open, &name) {
                        break;
                    }
                }
            }
            Token::Text(text) => {
                if text.is_empty() {
                    return;
                }
                // The tokenizer may split one run of text; keep it a single node.
                if let Some(last) = self.doc.last_child(parent) {
                    if matches!(self.doc.kind(last), NodeKind::Text(_)) {
                        let _ = self.doc.append_data(last, &text);
                        return;
                    }
                }
                let node = self.doc.create_text(&text);
                self.doc.push_child(parent, node);
            }
            Token::Comment(text) => {
                let node = self.doc.create_comment(&text);
                self.doc.push_child(parent, node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_html_builds_nested_tree() {
        let doc = Document::parse_html(r#"<div id="d">ab<b>cd</b><!--c--></div>tail"#).unwrap();
        let root = doc.root();
        assert_eq!(doc.child_count(root), 2);
        let div = doc.element_by_id("d").unwrap();
        assert_eq!(doc.child_count(div), 3);
        assert_eq!(doc.text_content(div), "abcd");
        assert_eq!(doc.inner_html(root), r#"<div id="d">ab<b>cd</b><!--c--></div>tail"#);
    }

    #[test]
    fn split_text_tokens_become_one_node() {
        let doc = Document::parse_html("<p>a < b</p>").unwrap();
        let p = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.child_count(p), 1);
        assert_eq!(doc.text_content(p), "a < b");
    }

    #[test]
    fn parse_fragment_stays_detached() {
        let mut doc = Document::new();
        let frag = doc.parse_fragment("<li>a<li>b").unwrap();
        assert_eq!(doc.parent(frag), None);
        assert_eq!(doc.inner_html(frag), "<li>a</li><li>b</li>");
        assert!(doc.parse_fragment("<p>x<b").is_err());
        assert_eq!(doc.child_count(doc.root()), 0);
    }
}
