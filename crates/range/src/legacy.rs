//! Translation between boundary-point ranges and legacy text ranges.
//!
//! A text range only knows positions in the host's flattened text. To find
//! the boundary point behind a position, an empty marker element is moved
//! between the children of the enclosing element in a binary search, each
//! time asking the host where the marker sits relative to the text range.
use crate::host::{EndPoints, Host, TextRange};
use crate::range::Range;
use dom::dom_utils::{
    get_common_ancestor, is_character_data, is_or_is_ancestor_of, node_index, node_length,
};
use dom::{BoundaryPoint, Document, DomError, DomResult, NodeId, NodeKind};
use std::cmp::Ordering;
use tools::{char_len, slice_chars};

/// Text range units in `s`: a CRLF pair is one unit.
pub(crate) fn unit_len(s: &str) -> usize {
    char_len(s) - s.matches("\r\n").count()
}

/// Characters at the start of `s` covered by `units` text range units.
pub(crate) fn chars_for_units(s: &str, units: usize) -> usize {
    let mut chars = s.chars().peekable();
    let mut consumed = 0;
    for _ in 0..units {
        match chars.next() {
            Some('\r') if chars.peek() == Some(&'\n') => {
                chars.next();
                consumed += 2;
            }
            Some(_) => consumed += 1,
            None => break,
        }
    }
    consumed
}

/// Text range units covered by the first `chars` characters of `s`.
pub(crate) fn units_for_chars(s: &str, chars: usize) -> usize {
    unit_len(slice_chars(s, 0, chars))
}

/// Where the previous boundary search ended, so the end search can skip the
/// children before it.
#[derive(Clone, Copy, Debug)]
struct NodeInfo {
    node_index: usize,
    container: NodeId,
}

fn can_have_html(doc: &Document, node: NodeId) -> bool {
    match doc.kind(node) {
        NodeKind::Element { name, .. } => !html::tables::is_void(name),
        NodeKind::Document => true,
        _ => false,
    }
}

fn common_ancestor(doc: &Document, a: NodeId, b: NodeId) -> DomResult<NodeId> {
    if a == b {
        return Ok(a);
    }
    get_common_ancestor(doc, a, b).ok_or(DomError::WrongDocument)
}

/// Element enclosing both ends of a text range.
fn container_element(doc: &Document, text_range: &dyn TextRange) -> DomResult<NodeId> {
    let parent = text_range.parent_element(doc).ok_or(DomError::NotFound)?;
    let mut probe = text_range.duplicate();
    probe.collapse(true);
    let start_el = probe.parent_element(doc).ok_or(DomError::NotFound)?;
    let mut probe = text_range.duplicate();
    probe.collapse(false);
    let end_el = probe.parent_element(doc).ok_or(DomError::NotFound)?;
    let start_end = common_ancestor(doc, start_el, end_el)?;
    common_ancestor(doc, parent, start_end)
}

/// Characters of `boundary_node` between its start and the end of `working`.
///
/// Text with line breaks cannot be measured from `text()` alone because the
/// host may drop some of them, so the start is stepped forward one unit at a
/// time until it meets the end.
fn measure_offset(doc: &Document, working: &dyn TextRange, boundary_node: NodeId) -> usize {
    let data = doc.data(boundary_node).unwrap_or_default();
    if !data.contains(['\r', '\n']) {
        return char_len(&working.text(doc)).min(node_length(doc, boundary_node));
    }
    let mut probe = working.duplicate();
    let estimate = char_len(&probe.text(doc).replace("\r\n", "\r"));
    let mut units = usize::try_from(probe.move_start(doc, estimate as isize)).unwrap_or(0);
    let limit = unit_len(data);
    while units < limit
        && probe.compare_end_points(EndPoints::StartToEnd, &*probe) == Ordering::Less
    {
        units += 1;
        probe.move_start(doc, 1);
    }
    log::trace!(target: "range.legacy", "line break run measured as {units} units");
    chars_for_units(data, units.min(limit))
}

fn boundary_position(
    doc: &mut Document,
    text_range: &dyn TextRange,
    whole_container: NodeId,
    is_start: bool,
    is_collapsed: bool,
    start_info: Option<NodeInfo>,
) -> DomResult<(BoundaryPoint, NodeInfo)> {
    let mut working = text_range.duplicate();
    working.collapse(is_start);
    let mut container = working.parent_element(doc).unwrap_or(whole_container);
    if !is_or_is_ancestor_of(doc, whole_container, container) {
        container = whole_container;
    }

    if !can_have_html(doc, container) {
        let parent = doc.parent(container).ok_or(DomError::NotFound)?;
        let point = BoundaryPoint::new(parent, node_index(doc, container));
        return Ok((
            point,
            NodeInfo {
                node_index: point.offset,
                container: parent,
            },
        ));
    }

    let marker = doc.create_element("span");
    let how = if is_start {
        EndPoints::StartToStart
    } else {
        EndPoints::StartToEnd
    };
    let mut low = start_info
        .filter(|info| info.container == container)
        .map_or(0, |info| info.node_index);
    let mut high = doc.child_count(container);
    let mut index = high;
    let comparison = loop {
        doc.insert_at(container, marker, index)?;
        if let Err(err) = working.move_to_element_text(doc, marker) {
            doc.detach(marker);
            return Err(err);
        }
        let comparison = working.compare_end_points(how, text_range);
        if comparison == Ordering::Equal || low == high {
            break comparison;
        }
        if comparison == Ordering::Less {
            if high == low + 1 {
                break comparison;
            }
            low = index;
        } else {
            high = if high == low + 1 { low } else { index };
        }
        index = (low + high) / 2;
        doc.detach(marker);
    };

    let next = doc.next_sibling(marker);
    let point = match next {
        Some(boundary_node)
            if comparison == Ordering::Less && is_character_data(doc, boundary_node) =>
        {
            let side = if is_start {
                EndPoints::EndToStart
            } else {
                EndPoints::EndToEnd
            };
            working.set_end_point(side, text_range);
            BoundaryPoint::new(boundary_node, measure_offset(doc, &*working, boundary_node))
        }
        _ => {
            let previous = doc
                .previous_sibling(marker)
                .filter(|n| (is_collapsed || !is_start) && is_character_data(doc, *n));
            let next = next.filter(|n| (is_collapsed || is_start) && is_character_data(doc, *n));
            match (next, previous) {
                (Some(next), _) => BoundaryPoint::new(next, 0),
                (None, Some(previous)) => BoundaryPoint::new(previous, node_length(doc, previous)),
                (None, None) => BoundaryPoint::new(container, node_index(doc, marker)),
            }
        }
    };
    doc.detach(marker);
    Ok((
        point,
        NodeInfo {
            node_index: index,
            container,
        },
    ))
}

/// Boundary-point range equivalent to a legacy text range.
pub fn text_range_to_range(doc: &mut Document, text_range: &dyn TextRange) -> DomResult<Range> {
    let container = container_element(doc, text_range)?;
    let (start, end) = if text_range.is_collapsed() {
        let (point, _) = boundary_position(doc, text_range, container, true, true, None)?;
        (point, point)
    } else {
        let (start, info) = boundary_position(doc, text_range, container, true, false, None)?;
        let (end, _) = boundary_position(doc, text_range, container, false, false, Some(info))?;
        (start, end)
    };
    log::debug!(
        target: "range.legacy",
        "text range {}..{} resolved to {}:{} .. {}:{}",
        text_range.position(true),
        text_range.position(false),
        start.node,
        start.offset,
        end.node,
        end.offset
    );
    let mut range = Range::new(doc);
    range.set_start_and_end(doc, (start, end))?;
    Ok(range)
}

fn no_text_ranges() -> DomError {
    DomError::UnsupportedEnvironment("host has no text ranges".to_string())
}

/// Collapsed text range at one boundary point.
fn boundary_text_range(
    doc: &mut Document,
    host: &dyn Host,
    point: BoundaryPoint,
    is_start: bool,
) -> DomResult<Box<dyn TextRange>> {
    let (boundary_node, parent) = if is_character_data(doc, point.node) {
        let parent = doc.parent(point.node).ok_or(DomError::NotFound)?;
        (Some(point.node), parent)
    } else {
        (doc.child_at(point.node, point.offset), point.node)
    };
    let marker = doc.create_element("span");
    doc.insert_before(parent, marker, boundary_node)?;
    let mut working = host.create_text_range(doc).ok_or_else(no_text_ranges)?;
    let moved = working.move_to_element_text(doc, marker);
    doc.detach(marker);
    moved?;
    working.collapse(!is_start);

    if let NodeKind::Text(data) = doc.kind(point.node) {
        let units = units_for_chars(data, point.offset) as isize;
        if is_start {
            working.move_start(doc, units);
        } else {
            working.move_end(doc, units);
        }
    }
    Ok(working)
}

/// Legacy text range covering the same text as `range`.
pub fn range_to_text_range(
    doc: &mut Document,
    host: &dyn Host,
    range: &Range,
) -> DomResult<Box<dyn TextRange>> {
    range.ensure_valid(doc)?;
    let start = boundary_text_range(doc, host, range.start(), true)?;
    let end = boundary_text_range(doc, host, range.end(), false)?;
    let mut text_range = host.create_text_range(doc).ok_or_else(no_text_ranges)?;
    text_range.set_end_point(EndPoints::StartToStart, &*start);
    text_range.set_end_point(EndPoints::EndToEnd, &*end);
    Ok(text_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Quirks, SimHost};

    fn legacy_host() -> SimHost {
        SimHost::new(Quirks::legacy())
    }

    #[test]
    fn unit_conversions_treat_crlf_as_one() {
        let s = "a\r\nb\r\r\n";
        assert_eq!(unit_len(s), 5);
        assert_eq!(chars_for_units(s, 2), 3);
        assert_eq!(chars_for_units(s, 9), 7);
        assert_eq!(units_for_chars(s, 3), 2);
        assert_eq!(units_for_chars(s, 7), 5);
    }

    /// A text range over a fixed element that cannot be moved.
    #[derive(Clone, Debug)]
    struct Stuck {
        element: NodeId,
        start: usize,
        end: usize,
    }

    impl TextRange for Stuck {
        fn duplicate(&self) -> Box<dyn TextRange> {
            Box::new(self.clone())
        }

        fn position(&self, start: bool) -> usize {
            if start { self.start } else { self.end }
        }

        fn set_position(&mut self, start: bool, position: usize) {
            if start {
                self.start = position;
            } else {
                self.end = position;
            }
        }

        fn move_to_element_text(&mut self, _doc: &Document, _element: NodeId) -> DomResult<()> {
            Err(DomError::invalid_state("element text is not available"))
        }

        fn move_start(&mut self, _doc: &Document, _units: isize) -> isize {
            0
        }

        fn move_end(&mut self, _doc: &Document, _units: isize) -> isize {
            0
        }

        fn text(&self, _doc: &Document) -> String {
            String::new()
        }

        fn parent_element(&self, _doc: &Document) -> Option<NodeId> {
            Some(self.element)
        }
    }

    #[test]
    fn failed_move_leaves_no_marker_behind() {
        let mut doc = Document::parse_html(r#"<p id="p">abc</p>"#).unwrap();
        let p = doc.element_by_id("p").unwrap();
        let stuck = Stuck {
            element: p,
            start: 1,
            end: 2,
        };
        let err = text_range_to_range(&mut doc, &stuck).unwrap_err();
        assert!(matches!(err, DomError::InvalidState(_)), "{err:?}");
        assert_eq!(doc.inner_html(p), "abc");
    }

    #[test]
    fn element_boundaries_survive_the_round_trip() {
        let mut doc = Document::parse_html(r#"<p id="p">ab<b>cd</b>ef</p>"#).unwrap();
        let host = legacy_host();
        let p = doc.element_by_id("p").unwrap();
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (p, 1, 2)).unwrap();

        let text_range = range_to_text_range(&mut doc, &host, &range).unwrap();
        assert_eq!(text_range.text(&doc), "cd");
        let back = text_range_to_range(&mut doc, &*text_range).unwrap();
        assert_eq!(back.text(&doc).unwrap(), "cd");
        assert_eq!(back.end(), BoundaryPoint::new(p, 2));
        assert_eq!(doc.inner_html(p), "ab<b>cd</b>ef", "markers are removed");
    }

    #[test]
    fn text_offsets_across_elements() {
        let mut doc = Document::parse_html("<div><p>hello</p><p>world</p></div>").unwrap();
        let host = legacy_host();
        let div = doc.first_child(doc.root()).unwrap();
        let hello = doc.first_child(doc.child_at(div, 0).unwrap()).unwrap();
        let world = doc.first_child(doc.child_at(div, 1).unwrap()).unwrap();
        let range = Range::from_points(&doc, (hello, 3).into(), (world, 2).into()).unwrap();

        let text_range = range_to_text_range(&mut doc, &host, &range).unwrap();
        assert_eq!(text_range.text(&doc), "lowo");
        let back = text_range_to_range(&mut doc, &*text_range).unwrap();
        assert_eq!(back.start(), BoundaryPoint::new(hello, 3));
        assert_eq!(back.end(), BoundaryPoint::new(world, 2));
    }

    /// Every offset outside a CRLF pair maps back to itself, whether the
    /// range is collapsed there or reaches it from the start of the node.
    #[test]
    fn line_break_offsets_round_trip_exhaustively() {
        for data in ["a\r\nb", "\r\n\r\nxy\r\n", "x\ny\r\n\r\nz", "\r\n"] {
            let mut doc = Document::new();
            let p = doc.create_element("p");
            doc.append_child(doc.root(), p).unwrap();
            let t = doc.create_text(data);
            doc.append_child(p, t).unwrap();
            let host = legacy_host();

            let chars: Vec<char> = data.chars().collect();
            for offset in 0..=chars.len() {
                let splits_pair = offset > 0
                    && offset < chars.len()
                    && chars[offset - 1] == '\r'
                    && chars[offset] == '\n';
                if splits_pair {
                    continue;
                }
                let collapsed = Range::from_points(&doc, (t, offset).into(), (t, offset).into())
                    .unwrap();
                let tr = range_to_text_range(&mut doc, &host, &collapsed).unwrap();
                let back = text_range_to_range(&mut doc, &*tr).unwrap();
                assert_eq!(back.start(), BoundaryPoint::new(t, offset), "{data:?} @ {offset}");

                if offset > 0 {
                    let span = Range::from_points(&doc, (t, 0).into(), (t, offset).into()).unwrap();
                    let tr = range_to_text_range(&mut doc, &host, &span).unwrap();
                    let back = text_range_to_range(&mut doc, &*tr).unwrap();
                    assert_eq!(back.end(), BoundaryPoint::new(t, offset), "{data:?} ..{offset}");
                    assert_eq!(back.text(&doc).unwrap(), span.text(&doc).unwrap());
                }
            }
        }
    }

    #[test]
    fn missing_text_ranges_are_unsupported() {
        let mut doc = Document::parse_html("<p>x</p>").unwrap();
        let host = SimHost::new(Quirks::default());
        let range = Range::new(&doc);
        let err = range_to_text_range(&mut doc, &host, &range).unwrap_err();
        assert!(matches!(err, DomError::UnsupportedEnvironment(_)), "{err:?}");
    }
}
