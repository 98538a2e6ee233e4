//! Saving a selection as marker elements in the document.
//!
//! Unlike bookmarks, markers survive arbitrary edits around the selection:
//! each boundary becomes a hidden `<span>` that the editing code carries
//! along, and restoring turns the spans back into ranges.
use crate::selection::Selection;
use core_types::Direction;
use dom::dom_utils::compare_boundary_points;
use dom::{BoundaryPoint, Document, DomResult, NodeId, NodeKind};
use range::{Host, Range};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tools::char_len;

pub const MARKER_CLASS: &str = "rangySelectionBoundary";
const MARKER_STYLE: &str = "line-height: 0; display: none";
const MARKER_TEXT: &str = "\u{feff}";

static NEXT_MARKER: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkerInfo {
    Collapsed { id: String },
    Span { start_id: String, end_id: String },
}

/// Marker ids for every range of a saved selection, in document order.
#[derive(Clone, Debug)]
pub struct SavedSelection {
    pub infos: Vec<MarkerInfo>,
    pub backward: bool,
    restored: bool,
}

impl SavedSelection {
    #[inline]
    pub fn is_restored(&self) -> bool {
        self.restored
    }

    fn ids(&self) -> impl Iterator<Item = &str> {
        self.infos.iter().flat_map(|info| match info {
            MarkerInfo::Collapsed { id } => vec![id.as_str()],
            MarkerInfo::Span { start_id, end_id } => vec![start_id.as_str(), end_id.as_str()],
        })
    }
}

fn create_marker(doc: &mut Document) -> DomResult<(NodeId, String)> {
    let id = format!(
        "selectionBoundary_{}",
        NEXT_MARKER.fetch_add(1, AtomicOrdering::Relaxed)
    );
    let marker = doc.create_element_with(
        "span",
        &[("id", id.as_str()), ("class", MARKER_CLASS), ("style", MARKER_STYLE)],
    );
    let text = doc.create_text(MARKER_TEXT);
    doc.append_child(marker, text)?;
    Ok((marker, id))
}

/// Inserts a marker at one end of `range`.
fn insert_marker(doc: &mut Document, range: &Range, at_start: bool) -> DomResult<(NodeId, String)> {
    let (marker, id) = create_marker(doc)?;
    let mut at = range.clone();
    at.collapse(doc, at_start);
    at.insert_node(doc, marker)?;
    Ok((marker, id))
}

enum Placed {
    Collapsed(NodeId),
    Span(NodeId, NodeId),
}

/// Wraps every range of `selection` in marker elements and reselects the
/// text between them.
pub fn save_selection(
    doc: &mut Document,
    host: &mut dyn Host,
    selection: &mut Selection,
) -> DomResult<SavedSelection> {
    let backward = selection.is_backward();
    let mut ranges = selection.get_all_ranges();
    ranges.sort_by(|a, b| {
        compare_boundary_points(doc, a.start(), b.start()).unwrap_or(Ordering::Equal)
    });

    // Latest first, so inserting markers never moves a boundary still to
    // be marked. Ranges are only rebuilt once every marker is in place.
    let mut infos = Vec::with_capacity(ranges.len());
    let mut placed = Vec::with_capacity(ranges.len());
    for range in ranges.iter().rev() {
        if range.collapsed() {
            let (marker, id) = insert_marker(doc, range, true)?;
            placed.push(Placed::Collapsed(marker));
            infos.push(MarkerInfo::Collapsed { id });
        } else {
            let (end_marker, end_id) = insert_marker(doc, range, false)?;
            let (start_marker, start_id) = insert_marker(doc, range, true)?;
            placed.push(Placed::Span(start_marker, end_marker));
            infos.push(MarkerInfo::Span { start_id, end_id });
        }
    }
    infos.reverse();
    placed.reverse();

    let mut reselected = Vec::with_capacity(placed.len());
    for markers in placed {
        let mut marked = Range::new(doc);
        match markers {
            Placed::Collapsed(marker) => marked.collapse_after(doc, marker)?,
            Placed::Span(start, end) => {
                marked.set_start_after(doc, start)?;
                marked.set_end_before(doc, end)?;
            }
        }
        reselected.push(marked);
    }

    if backward && reselected.len() == 1 {
        selection.set_single_range(doc, host, &reselected[0], Direction::Backward)?;
    } else {
        selection.set_ranges(doc, host, &reselected)?;
    }
    log::debug!(target: "selection.markers", "saved {} range(s)", infos.len());
    Ok(SavedSelection {
        infos,
        backward,
        restored: false,
    })
}

fn take_marker(doc: &mut Document, id: &str) -> Option<NodeId> {
    let marker = doc.element_by_id(id);
    if marker.is_none() {
        log::warn!(target: "selection.markers", "marker {id} is missing");
    }
    marker
}

fn restore_range(doc: &mut Document, info: &MarkerInfo) -> DomResult<Option<Range>> {
    let mut range = Range::new(doc);
    match info {
        MarkerInfo::Collapsed { id } => {
            let Some(marker) = take_marker(doc, id) else {
                return Ok(None);
            };
            let previous_text = doc.previous_sibling(marker).and_then(|prev| match doc.kind(prev) {
                NodeKind::Text(data) => Some((prev, char_len(data))),
                _ => None,
            });
            match previous_text {
                Some((prev, len)) => range.collapse_to_point(doc, prev, len)?,
                None => range.collapse_before(doc, marker)?,
            }
            doc.detach(marker);
        }
        MarkerInfo::Span { start_id, end_id } => {
            let (Some(start), Some(end)) = (take_marker(doc, start_id), take_marker(doc, end_id))
            else {
                remove_ids(doc, [start_id.as_str(), end_id.as_str()]);
                return Ok(None);
            };
            range.set_start_before(doc, start)?;
            doc.detach(start);
            range.set_end_before(doc, end)?;
            doc.detach(end);
        }
    }
    Ok(Some(range))
}

/// Turns the markers of `saved` back into the selection and removes them.
///
/// A range whose markers have gone missing is skipped. Restoring twice is a
/// no-op.
pub fn restore_selection(
    doc: &mut Document,
    host: &mut dyn Host,
    selection: &mut Selection,
    saved: &mut SavedSelection,
    preserve_direction: bool,
) -> DomResult<()> {
    if saved.restored {
        log::debug!(target: "selection.markers", "selection already restored");
        return Ok(());
    }
    // Earliest first: removing a marker only shifts offsets after it.
    // Normalizing a range can merge text an earlier range points into, so
    // the earlier boundaries ride along.
    let mut points: Vec<(BoundaryPoint, BoundaryPoint)> = Vec::with_capacity(saved.infos.len());
    for info in &saved.infos {
        let Some(mut range) = restore_range(doc, info)? else {
            continue;
        };
        let mut tracked: Vec<&mut BoundaryPoint> =
            points.iter_mut().flat_map(|(start, end)| [start, end]).collect();
        range.normalize_boundaries_preserving(doc, &mut tracked)?;
        points.push((range.start(), range.end()));
    }
    let ranges = points
        .into_iter()
        .map(|(start, end)| Range::from_points(doc, start, end))
        .collect::<DomResult<Vec<_>>>()?;

    if preserve_direction && saved.backward && ranges.len() == 1 {
        selection.set_single_range(doc, host, &ranges[0], Direction::Backward)?;
    } else {
        selection.set_ranges(doc, host, &ranges)?;
    }
    saved.restored = true;
    Ok(())
}

fn remove_ids<'a>(doc: &mut Document, ids: impl IntoIterator<Item = &'a str>) -> usize {
    let mut removed = 0;
    for id in ids {
        if let Some(marker) = doc.element_by_id(id) {
            doc.detach(marker);
            removed += 1;
        }
    }
    removed
}

/// Deletes the markers of `saved` without touching the selection.
pub fn remove_markers(doc: &mut Document, saved: &SavedSelection) -> usize {
    remove_ids(doc, saved.ids())
}
