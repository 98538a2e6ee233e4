//! Character-offset bookmarks.
//!
//! A bookmark locates a range by the number of text characters between the
//! start of a container and each boundary, so it survives rebuilding the
//! nodes under the container as long as the text stays the same.
use crate::range::Range;
use dom::{Document, DomResult, NodeId, NodeKind};
use tools::char_len;

/// Range position as text offsets within `container`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bookmark {
    pub container: NodeId,
    pub start: usize,
    pub end: usize,
    /// Only meaningful for selections; ranges always record `false`.
    pub backward: bool,
}

impl Range {
    /// Measures the range against the text of `container`. A range outside
    /// the container yields an empty bookmark at offset 0.
    pub fn get_bookmark(&self, doc: &Document, container: NodeId) -> DomResult<Bookmark> {
        self.ensure_valid(doc)?;
        let mut preceding = Range::new(doc);
        preceding.select_node_contents(doc, container)?;
        let (mut start, mut end) = (0, 0);
        if let Some(overlap) = self.intersection(doc, &preceding)? {
            preceding.set_end(doc, overlap.start.node, overlap.start.offset)?;
            start = char_len(&preceding.text(doc)?);
            end = start + char_len(&overlap.text(doc)?);
        }
        Ok(Bookmark {
            container,
            start,
            end,
            backward: false,
        })
    }

    /// Places the range on the characters a bookmark describes.
    ///
    /// Offsets past the container's text leave the range collapsed at the
    /// container start (or with the end unmoved when only the end is out of
    /// reach).
    pub fn move_to_bookmark(&mut self, doc: &Document, bookmark: &Bookmark) -> DomResult<()> {
        self.set_start(doc, bookmark.container, 0)?;
        self.collapse(doc, true);
        let mut char_index = 0;
        let mut found_start = false;
        let mut stack = vec![bookmark.container];
        while let Some(node) = stack.pop() {
            if let NodeKind::Text(data) = doc.kind(node) {
                let next_index = char_index + char_len(data);
                if !found_start && (char_index..=next_index).contains(&bookmark.start) {
                    self.set_start(doc, node, bookmark.start - char_index)?;
                    found_start = true;
                }
                if found_start && (char_index..=next_index).contains(&bookmark.end) {
                    self.set_end(doc, node, bookmark.end - char_index)?;
                    break;
                }
                char_index = next_index;
            } else {
                stack.extend(doc.children(node).iter().rev());
            }
        }
        Ok(())
    }

    /// Selects characters `start..end` of `container`'s text.
    pub fn select_characters(
        &mut self,
        doc: &Document,
        container: NodeId,
        start: usize,
        end: usize,
    ) -> DomResult<()> {
        self.move_to_bookmark(
            doc,
            &Bookmark {
                container,
                start,
                end,
                backward: false,
            },
        )
    }
}
