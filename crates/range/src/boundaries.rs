use crate::range::Range;
use dom::dom_utils::{is_character_data, node_index, node_length, split_data_node};
use dom::{BoundaryPoint, Document, DomResult, NodeId};

fn same_type(doc: &Document, a: NodeId, b: NodeId) -> bool {
    doc.kind(a).node_type() == doc.kind(b).node_type()
}

/// Moves `positions` off `absorbed` before its data is joined onto
/// `survivor`, its adjacent sibling. `absorbed_first` means `absorbed` comes
/// before `survivor`.
fn patch_for_merge(
    doc: &Document,
    positions: &mut [&mut BoundaryPoint],
    survivor: NodeId,
    absorbed: NodeId,
    absorbed_first: bool,
) {
    let survivor_length = node_length(doc, survivor);
    let absorbed_length = node_length(doc, absorbed);
    let parent = doc.parent(absorbed);
    let absorbed_index = node_index(doc, absorbed);
    // Child offset of the gap between the two nodes.
    let gap = if absorbed_first { absorbed_index + 1 } else { absorbed_index };
    for point in positions.iter_mut() {
        if point.node == absorbed {
            point.node = survivor;
            if !absorbed_first {
                point.offset += survivor_length;
            }
        } else if point.node == survivor {
            if absorbed_first {
                point.offset += absorbed_length;
            }
        } else if Some(point.node) == parent {
            if point.offset == gap {
                let offset = if absorbed_first { absorbed_length } else { survivor_length };
                **point = BoundaryPoint::new(survivor, offset);
            } else if point.offset > gap {
                point.offset -= 1;
            }
        }
    }
}

/// Appends `sibling`'s data to `node` and removes `sibling`.
fn absorb_next(
    doc: &mut Document,
    node: NodeId,
    sibling: NodeId,
    positions: &mut [&mut BoundaryPoint],
) -> DomResult<()> {
    patch_for_merge(doc, positions, node, sibling, false);
    let data = doc.data(sibling).unwrap_or_default().to_string();
    doc.append_data(node, &data)?;
    doc.detach(sibling);
    Ok(())
}

impl Range {
    /// Splits character data at both boundaries so the range starts and ends
    /// on node edges.
    pub fn split_boundaries(&mut self, doc: &mut Document) -> DomResult<()> {
        self.split_boundaries_preserving(doc, &mut [])
    }

    /// [`split_boundaries`](Self::split_boundaries), also patching `positions`.
    pub fn split_boundaries_preserving(
        &mut self,
        doc: &mut Document,
        positions: &mut [&mut BoundaryPoint],
    ) -> DomResult<()> {
        self.ensure_valid(doc)?;
        let mut start = self.start;
        let mut end = self.end;
        if is_character_data(doc, end.node)
            && end.offset > 0
            && end.offset < node_length(doc, end.node)
        {
            let mut tracked: Vec<&mut BoundaryPoint> = vec![&mut start];
            tracked.extend(positions.iter_mut().map(|p| &mut **p));
            split_data_node(doc, end.node, end.offset, &mut tracked)?;
        }
        if is_character_data(doc, start.node)
            && start.offset > 0
            && start.offset < node_length(doc, start.node)
        {
            let mut tracked: Vec<&mut BoundaryPoint> = vec![&mut end];
            tracked.extend(positions.iter_mut().map(|p| &mut **p));
            let suffix = split_data_node(doc, start.node, start.offset, &mut tracked)?;
            start = BoundaryPoint::new(suffix, 0);
        }
        self.update_boundaries(doc, start, end);
        Ok(())
    }

    /// Merges character data neighbours of the same type at the boundaries,
    /// keeping the range over the same characters.
    pub fn normalize_boundaries(&mut self, doc: &mut Document) -> DomResult<()> {
        self.normalize_boundaries_preserving(doc, &mut [])
    }

    /// [`normalize_boundaries`](Self::normalize_boundaries), also moving
    /// `positions` that point into merged nodes.
    pub fn normalize_boundaries_preserving(
        &mut self,
        doc: &mut Document,
        positions: &mut [&mut BoundaryPoint],
    ) -> DomResult<()> {
        self.ensure_valid(doc)?;
        let BoundaryPoint { node: mut sc, offset: mut so } = self.start;
        let BoundaryPoint { node: mut ec, offset: mut eo } = self.end;
        let mut normalize_start = true;

        if is_character_data(doc, ec) {
            if eo == node_length(doc, ec) {
                if let Some(sibling) = doc.next_sibling(ec).filter(|s| same_type(doc, ec, *s)) {
                    absorb_next(doc, ec, sibling, positions)?;
                }
            } else if eo == 0 {
                if let Some(sibling) = doc.previous_sibling(ec).filter(|s| same_type(doc, ec, *s)) {
                    eo = node_length(doc, sibling);
                    if sc == ec {
                        normalize_start = false;
                    }
                    absorb_next(doc, sibling, ec, positions)?;
                    ec = sibling;
                }
            }
        } else {
            if eo > 0 {
                if let Some(end_node) = doc.child_at(ec, eo - 1) {
                    if is_character_data(doc, end_node) {
                        if let Some(sibling) =
                            doc.next_sibling(end_node).filter(|s| same_type(doc, end_node, *s))
                        {
                            ec = end_node;
                            eo = node_length(doc, end_node);
                            absorb_next(doc, end_node, sibling, positions)?;
                        }
                    }
                }
            }
            normalize_start = !self.collapsed();
        }

        if normalize_start {
            if is_character_data(doc, sc) {
                if so == 0 {
                    if let Some(sibling) =
                        doc.previous_sibling(sc).filter(|s| same_type(doc, sc, *s))
                    {
                        merge_backward(
                            doc, sc, sibling, positions, &mut sc, &mut so, &mut ec, &mut eo,
                        )?;
                    }
                } else if so == node_length(doc, sc) {
                    if let Some(sibling) = doc.next_sibling(sc).filter(|s| same_type(doc, sc, *s)) {
                        if ec == sibling {
                            ec = sc;
                            eo += so;
                        }
                        absorb_next(doc, sc, sibling, positions)?;
                    }
                }
            } else if let Some(start_node) = doc.child_at(sc, so) {
                if is_character_data(doc, start_node) {
                    if let Some(sibling) =
                        doc.previous_sibling(start_node).filter(|s| same_type(doc, start_node, *s))
                    {
                        merge_backward(
                            doc,
                            start_node,
                            sibling,
                            positions,
                            &mut sc,
                            &mut so,
                            &mut ec,
                            &mut eo,
                        )?;
                    }
                }
            }
        } else {
            sc = ec;
            so = eo;
        }

        self.update_boundaries(doc, BoundaryPoint::new(sc, so), BoundaryPoint::new(ec, eo));
        Ok(())
    }
}

/// Prepends `sibling` (the previous sibling of `node`) to `node` and moves
/// the start to the join.
#[allow(clippy::too_many_arguments)]
fn merge_backward(
    doc: &mut Document,
    node: NodeId,
    sibling: NodeId,
    positions: &mut [&mut BoundaryPoint],
    sc: &mut NodeId,
    so: &mut usize,
    ec: &mut NodeId,
    eo: &mut usize,
) -> DomResult<()> {
    patch_for_merge(doc, positions, node, sibling, true);
    let node_length_before = node_length(doc, node);
    let sibling_length = node_length(doc, sibling);
    let data = doc.data(sibling).unwrap_or_default().to_string();
    doc.insert_data(node, 0, &data)?;
    doc.detach(sibling);
    *sc = node;
    *so = sibling_length;
    if *ec == node {
        *eo += sibling_length;
    } else if doc.parent(node) == Some(*ec) {
        let index = node_index(doc, node);
        if *eo == index + 1 {
            *ec = node;
            *eo = node_length_before + sibling_length;
        } else if *eo > index + 1 {
            *eo -= 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::traverse::text_nodes;

    fn two_texts(a: &str, b: &str) -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p).unwrap();
        let t1 = doc.create_text(a);
        let t2 = doc.create_text(b);
        doc.append_child(p, t1).unwrap();
        doc.append_child(p, t2).unwrap();
        (doc, p, t1, t2)
    }

    #[test]
    fn split_boundaries_isolates_the_selected_text() {
        let mut doc = Document::parse_html("<p>abcdef</p>").unwrap();
        let p = doc.first_child(doc.root()).unwrap();
        let t = doc.first_child(p).unwrap();
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (t, 2, 4)).unwrap();
        let mut outside = BoundaryPoint::new(t, 5);
        range.split_boundaries_preserving(&mut doc, &mut [&mut outside]).unwrap();

        let parts: Vec<String> = doc
            .children(p)
            .iter()
            .map(|n| doc.data(*n).unwrap().to_string())
            .collect();
        assert_eq!(parts, ["ab", "cd", "ef"]);
        assert_eq!(range.start(), BoundaryPoint::new(doc.child_at(p, 1).unwrap(), 0));
        assert_eq!(range.end(), BoundaryPoint::new(doc.child_at(p, 1).unwrap(), 2));
        assert_eq!(outside, BoundaryPoint::new(doc.child_at(p, 2).unwrap(), 1));
        assert_eq!(range.text(&doc).unwrap(), "cd");
    }

    #[test]
    fn normalize_merges_across_start_and_end() {
        let mut doc = Document::parse_html("<p>abcdef</p>").unwrap();
        let p = doc.first_child(doc.root()).unwrap();
        let t = doc.first_child(p).unwrap();
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (t, 2, 4)).unwrap();
        range.split_boundaries(&mut doc).unwrap();
        assert_eq!(doc.child_count(p), 3);

        range.normalize_boundaries(&mut doc).unwrap();
        assert_eq!(doc.child_count(p), 1);
        let merged = doc.first_child(p).unwrap();
        assert_eq!(doc.data(merged), Some("abcdef"));
        assert_eq!(range.start(), BoundaryPoint::new(merged, 2));
        assert_eq!(range.end(), BoundaryPoint::new(merged, 4));
    }

    #[test]
    fn normalize_collapsed_range_between_texts() {
        let (mut doc, p, t1, t2) = two_texts("ab", "cd");
        let mut range = Range::new(&doc);
        range.collapse_to_point(&doc, t2, 0).unwrap();
        range.normalize_boundaries(&mut doc).unwrap();
        assert_eq!(doc.children(p), &[t1]);
        assert_eq!(doc.data(t1), Some("abcd"));
        assert!(range.collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(t1, 2));
    }

    #[test]
    fn normalize_start_between_element_children() {
        let (mut doc, p, t1, t2) = two_texts("ab", "cd");
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (p, 1, p, 2)).unwrap();
        range.normalize_boundaries(&mut doc).unwrap();
        assert_eq!(text_nodes(&doc, p).count(), 1);
        assert_eq!(doc.data(t2), Some("abcd"));
        assert!(doc.parent(t1).is_none());
        assert_eq!(range.start(), BoundaryPoint::new(t2, 2));
        assert_eq!(range.end(), BoundaryPoint::new(p, 1));
        assert_eq!(range.text(&doc).unwrap(), "cd");
    }

    #[test]
    fn normalize_moves_tracked_points_off_merged_nodes() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.append_child(doc.root(), p).unwrap();
        let texts: Vec<NodeId> = ["ab", "cd", "e", "f"]
            .into_iter()
            .map(|data| {
                let t = doc.create_text(data);
                doc.append_child(p, t).unwrap();
                t
            })
            .collect();
        let mut earlier_start = BoundaryPoint::new(p, 0);
        let mut earlier_end = BoundaryPoint::new(texts[1], 2);
        let mut between = BoundaryPoint::new(p, 2);

        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (p, 2, p, 3)).unwrap();
        range
            .normalize_boundaries_preserving(
                &mut doc,
                &mut [&mut earlier_start, &mut earlier_end, &mut between],
            )
            .unwrap();

        assert_eq!(doc.children(p), &[texts[0], texts[2]]);
        assert_eq!(doc.data(texts[2]), Some("cdef"));
        assert_eq!(earlier_start, BoundaryPoint::new(p, 0));
        assert_eq!(earlier_end, BoundaryPoint::new(texts[2], 2));
        assert_eq!(between, BoundaryPoint::new(texts[2], 2));
        assert_eq!(range.text(&doc).unwrap(), "e");
    }
}
