use crate::host::{Host, NativeRange};
use crate::range::How;
use core_types::ContextId;
use dom::{BoundaryPoint, Document, DomError, DomResult, NodeId};
use std::cmp::Ordering;

/// Which primitive ranges are built on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Implementation {
    /// Host boundary-point ranges, wrapped.
    Structural,
    /// Host text ranges, translated.
    Legacy,
}

/// What the host can do, measured once by [`Features::probe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Features {
    pub has_structural_range: bool,
    pub has_legacy_text_range: bool,
    pub supports_multi_range: bool,
    pub supports_backward_extend: bool,
    pub compare_constants_swapped: bool,
    pub native_contents_conformant: bool,
    pub native_set_start_throws_past_end: bool,
    pub implementation: Implementation,
}

impl Features {
    /// Runs the capability tests against a scratch document.
    ///
    /// Fails with [`DomError::UnsupportedEnvironment`] when the host has
    /// neither range primitive.
    pub fn probe(host: &mut dyn Host, prefer_text_range: bool) -> DomResult<Features> {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        doc.append_child(doc.root(), body)?;

        let has_structural_range = host.create_native_range(&doc).is_some();
        let has_legacy_text_range = host.create_text_range(&doc).is_some();
        let implementation = match (has_structural_range, has_legacy_text_range) {
            (true, true) if prefer_text_range => Implementation::Legacy,
            (true, _) => Implementation::Structural,
            (false, true) => Implementation::Legacy,
            (false, false) => {
                log::warn!(target: "range.features", "host has no range primitive");
                return Err(DomError::UnsupportedEnvironment(
                    "neither structural ranges nor text ranges are available".to_string(),
                ));
            }
        };

        let mut features = Features {
            has_structural_range,
            has_legacy_text_range,
            supports_multi_range: false,
            supports_backward_extend: false,
            compare_constants_swapped: false,
            native_contents_conformant: false,
            native_set_start_throws_past_end: false,
            implementation,
        };

        if has_structural_range {
            features.native_set_start_throws_past_end = probe_start_past_end(&mut doc, body, host)?;
            features.compare_constants_swapped = probe_compare_constants(&mut doc, body, host)?;
            features.native_contents_conformant = probe_delete_contents(&mut doc, body, host)?;
        }
        probe_selection(&mut doc, body, host, &mut features)?;

        log::debug!(target: "range.features", "{features:?}");
        Ok(features)
    }
}

fn scratch_text(doc: &mut Document, body: NodeId, data: &str) -> DomResult<NodeId> {
    doc.clear_children(body);
    let text = doc.create_text(data);
    doc.append_child(body, text)?;
    Ok(text)
}

fn native(doc: &Document, host: &dyn Host) -> DomResult<Box<dyn NativeRange>> {
    host.create_native_range(doc)
        .ok_or_else(|| DomError::UnsupportedEnvironment("structural range vanished".to_string()))
}

/// Whether moving the start of a collapsed range forward fails rather than
/// dragging the end along.
fn probe_start_past_end(doc: &mut Document, body: NodeId, host: &dyn Host) -> DomResult<bool> {
    let text = scratch_text(doc, body, "x")?;
    let mut range = native(doc, host)?;
    range.set_end(doc, BoundaryPoint::new(text, 0))?;
    range.set_start(doc, BoundaryPoint::new(text, 0))?;
    Ok(range.set_start(doc, BoundaryPoint::new(text, 1)).is_err())
}

/// Ranges over `"test"` at 0..3 and 2..4: a conformant `StartToEnd` puts the
/// first range's end after the second's start.
fn probe_compare_constants(doc: &mut Document, body: NodeId, host: &dyn Host) -> DomResult<bool> {
    let text = scratch_text(doc, body, "test")?;
    let mut first = native(doc, host)?;
    first.set_end(doc, BoundaryPoint::new(text, 3))?;
    first.set_start(doc, BoundaryPoint::new(text, 0))?;
    let other = (BoundaryPoint::new(text, 2), BoundaryPoint::new(text, 4));
    let start_to_end = first.compare_boundary_points(doc, How::StartToEnd.raw(), other.0, other.1)?;
    let end_to_start = first.compare_boundary_points(doc, How::EndToStart.raw(), other.0, other.1)?;
    Ok(start_to_end == Ordering::Less && end_to_start == Ordering::Greater)
}

/// Deleting `"2"` out of `"123"` must leave `"13"`.
fn probe_delete_contents(doc: &mut Document, body: NodeId, host: &dyn Host) -> DomResult<bool> {
    let text = scratch_text(doc, body, "123")?;
    let mut range = native(doc, host)?;
    range.set_end(doc, BoundaryPoint::new(text, 2))?;
    range.set_start(doc, BoundaryPoint::new(text, 1))?;
    range.delete_contents(doc)?;
    Ok(doc.data(text) == Some("13"))
}

/// Multi-range and extend support of the main context's selection, which is
/// left as it was found.
fn probe_selection(
    doc: &mut Document,
    body: NodeId,
    host: &mut dyn Host,
    features: &mut Features,
) -> DomResult<()> {
    let Some(selection) = host.selection(ContextId::MAIN) else {
        log::debug!(target: "range.features", "no main selection to probe");
        return Ok(());
    };
    features.supports_backward_extend = selection.has_extend();
    if features.implementation == Implementation::Legacy {
        return Ok(());
    }

    let saved: Vec<_> = (0..selection.range_count())
        .filter_map(|i| selection.range_at(i))
        .collect();
    let text = scratch_text(doc, body, "multi")?;
    selection.remove_all_ranges();
    selection.add_range(BoundaryPoint::new(text, 0), BoundaryPoint::new(text, 1));
    selection.add_range(BoundaryPoint::new(text, 2), BoundaryPoint::new(text, 3));
    features.supports_multi_range = selection.range_count() == 2;

    selection.remove_all_ranges();
    for (start, end) in saved {
        selection.add_range(start, end);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Quirks, SimHost};

    #[test]
    fn conformant_host() {
        let mut host = SimHost::new(Quirks::default());
        let features = Features::probe(&mut host, false).unwrap();
        assert_eq!(
            features,
            Features {
                has_structural_range: true,
                has_legacy_text_range: false,
                supports_multi_range: true,
                supports_backward_extend: true,
                compare_constants_swapped: false,
                native_contents_conformant: true,
                native_set_start_throws_past_end: false,
                implementation: Implementation::Structural,
            }
        );
    }

    #[test]
    fn quirky_structural_host() {
        let mut host = SimHost::new(Quirks {
            multi_range: false,
            extend: false,
            swapped_compare_constants: true,
            off_by_one_delete: true,
            throws_start_past_end: true,
            ..Quirks::default()
        });
        let features = Features::probe(&mut host, false).unwrap();
        assert!(features.compare_constants_swapped);
        assert!(!features.native_contents_conformant);
        assert!(features.native_set_start_throws_past_end);
        assert!(!features.supports_multi_range);
        assert!(!features.supports_backward_extend);
    }

    #[test]
    fn legacy_host_and_preference() {
        let mut host = SimHost::new(Quirks::legacy());
        let features = Features::probe(&mut host, false).unwrap();
        assert_eq!(features.implementation, Implementation::Legacy);
        assert!(!features.has_structural_range);

        let mut both = SimHost::new(Quirks {
            legacy_text_range: true,
            ..Quirks::default()
        });
        assert_eq!(
            Features::probe(&mut both, true).unwrap().implementation,
            Implementation::Legacy
        );
        assert_eq!(
            Features::probe(&mut both, false).unwrap().implementation,
            Implementation::Structural
        );
    }

    #[test]
    fn host_without_ranges_is_unsupported() {
        let mut host = SimHost::new(Quirks::bare());
        let err = Features::probe(&mut host, false).unwrap_err();
        assert!(matches!(err, DomError::UnsupportedEnvironment(_)), "{err:?}");
    }

    #[test]
    fn probing_keeps_the_existing_selection() {
        let doc = Document::parse_html("<p>abc</p>").unwrap();
        let t = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();
        let mut host = SimHost::new(Quirks::default());
        host.selection(ContextId::MAIN)
            .unwrap()
            .add_range(BoundaryPoint::new(t, 1), BoundaryPoint::new(t, 2));
        Features::probe(&mut host, false).unwrap();
        let selection = host.selection(ContextId::MAIN).unwrap();
        assert_eq!(selection.range_count(), 1);
        assert_eq!(
            selection.range_at(0),
            Some((BoundaryPoint::new(t, 1), BoundaryPoint::new(t, 2)))
        );
    }
}
