//! The live selection of one browsing context.
//!
//! A [`Selection`] caches the host selection as boundary-point ranges. The
//! host stays authoritative: every change is written to the host first and
//! [`Selection::refresh`] reads it back.
use core_types::{ContextId, Direction};
use dom::dom_utils::{compare_boundary_points, is_ancestor_of};
use dom::{BoundaryPoint, Document, DocumentId, DomError, DomResult, NodeId, NodeKind};
use range::{
    Bookmark, EngineConfig, Features, Host, Implementation, NativeSelection, Range,
    range_to_text_range, text_range_to_range,
};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Never read from the host.
    Uninitialized,
    /// Matches the host as of the last [`Selection::refresh`].
    Synchronized,
    /// The host reported a change that has not been read yet.
    Stale,
}

/// Copies of a selection's ranges, see [`Selection::save_ranges`].
#[derive(Clone, Debug)]
pub struct SavedRanges {
    pub ranges: Vec<Range>,
    pub backward: bool,
}

#[derive(Debug)]
pub struct Selection {
    context: ContextId,
    doc: DocumentId,
    ranges: Vec<Range>,
    anchor: Option<BoundaryPoint>,
    focus: Option<BoundaryPoint>,
    backward: bool,
    control: Option<Vec<NodeId>>,
    state: SyncState,
    features: Features,
    check_ranges: bool,
}

impl Selection {
    pub fn new(
        context: ContextId,
        doc: &Document,
        features: Features,
        config: &EngineConfig,
    ) -> Self {
        Self {
            context,
            doc: doc.id(),
            ranges: Vec::new(),
            anchor: None,
            focus: None,
            backward: false,
            control: None,
            state: SyncState::Uninitialized,
            features,
            check_ranges: config.check_selection_ranges,
        }
    }

    #[inline]
    pub fn context(&self) -> ContextId {
        self.context
    }

    #[inline]
    pub fn document_id(&self) -> DocumentId {
        self.doc
    }

    #[inline]
    pub fn state(&self) -> SyncState {
        self.state
    }

    #[inline]
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Records that the host selection changed behind this cache.
    pub fn mark_stale(&mut self) {
        if self.state == SyncState::Synchronized {
            self.state = SyncState::Stale;
        }
    }

    fn check_document(&self, doc: &Document) -> DomResult<()> {
        if doc.id() != self.doc {
            return Err(DomError::WrongDocument);
        }
        Ok(())
    }

    fn native<'h>(&self, host: &'h mut dyn Host) -> DomResult<&'h mut dyn NativeSelection> {
        let context = self.context;
        host.selection(context).ok_or_else(|| {
            DomError::invalid_state(format!("context {} has no selection", context.0))
        })
    }

    fn clear_cache(&mut self) {
        self.ranges.clear();
        self.anchor = None;
        self.focus = None;
        self.backward = false;
        self.control = None;
    }

    /// Caches `ranges` with anchor and focus taken from the last one.
    fn cache_ranges(&mut self, ranges: Vec<Range>, backward: bool) {
        self.backward = backward && !ranges.is_empty();
        match ranges.last() {
            Some(last) if self.backward => {
                self.anchor = Some(last.end());
                self.focus = Some(last.start());
            }
            Some(last) => {
                self.anchor = Some(last.start());
                self.focus = Some(last.end());
            }
            None => {
                self.anchor = None;
                self.focus = None;
            }
        }
        self.ranges = ranges;
    }

    /// Rebuilds the cached ranges from the host selection.
    pub fn refresh(&mut self, doc: &mut Document, host: &mut dyn Host) -> DomResult<()> {
        self.check_document(doc)?;
        let legacy = self.features.implementation == Implementation::Legacy;
        let native = self.native(host)?;
        self.clear_cache();

        if let Some(elements) = native.control_elements() {
            let ranges = elements
                .iter()
                .map(|element| {
                    let mut range = Range::new(doc);
                    range.select_node(doc, *element)?;
                    Ok(range)
                })
                .collect::<DomResult<Vec<_>>>()?;
            self.anchor = ranges.first().map(Range::start);
            self.focus = ranges.last().map(Range::end);
            self.ranges = ranges;
            self.control = Some(elements);
        } else if legacy {
            if let Some(text_range) = native.text_range() {
                let range = text_range_to_range(doc, &*text_range)?;
                self.cache_ranges(vec![range], false);
            }
        } else {
            let mut ranges = Vec::with_capacity(native.range_count());
            for index in 0..native.range_count() {
                if let Some((start, end)) = native.range_at(index) {
                    ranges.push(Range::from_points(doc, start, end)?);
                }
            }
            let (anchor, focus) = (native.anchor(), native.focus());
            self.ranges = ranges;
            self.anchor = anchor.or_else(|| self.ranges.last().map(Range::start));
            self.focus = focus.or_else(|| self.ranges.last().map(Range::end));
            self.backward = match (self.anchor, self.focus) {
                (Some(anchor), Some(focus)) if self.ranges.len() == 1 => {
                    compare_boundary_points(doc, anchor, focus)? == Ordering::Greater
                }
                _ => false,
            };
        }
        self.state = SyncState::Synchronized;
        log::debug!(
            target: "selection",
            "refreshed context {}: {} range(s), backward={}",
            self.context.0,
            self.ranges.len(),
            self.backward
        );
        Ok(())
    }

    // ---- adding and removing ranges ----

    /// Adds `range` to the host selection.
    ///
    /// A host without multi-range support has its current range replaced. A
    /// backward direction on a host without `extend` is added forwards with
    /// a warning.
    pub fn add_range(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        range: &Range,
        direction: Direction,
    ) -> DomResult<()> {
        self.check_document(doc)?;
        range.ensure_valid(doc)?;
        if self.control.is_some() {
            return self.add_range_to_control_selection(doc, host, range);
        }
        let backward = direction.is_backward() && self.honour_backward();

        if self.features.implementation == Implementation::Legacy {
            let text_range = range_to_text_range(doc, host, range)?;
            self.native(host)?.select_text_range(&*text_range);
        } else {
            let native = self.native(host)?;
            if !self.features.supports_multi_range && native.range_count() > 0 {
                log::debug!(target: "selection", "host keeps one range, replacing it");
                native.remove_all_ranges();
            }
            if backward {
                native.add_range(range.end(), range.end());
                native.extend(doc, range.start())?;
            } else {
                native.add_range(range.start(), range.end());
            }
        }

        if self.check_ranges {
            return self.refresh(doc, host);
        }
        let mut ranges = if self.features.supports_multi_range
            && self.features.implementation == Implementation::Structural
        {
            std::mem::take(&mut self.ranges)
        } else {
            Vec::new()
        };
        ranges.push(range.clone());
        self.cache_ranges(ranges, backward);
        self.state = SyncState::Synchronized;
        Ok(())
    }

    fn honour_backward(&self) -> bool {
        if self.features.supports_backward_extend
            && self.features.implementation == Implementation::Structural
        {
            return true;
        }
        log::warn!(
            target: "selection",
            "host cannot select backwards; adding the range forwards"
        );
        false
    }

    fn add_range_to_control_selection(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        range: &Range,
    ) -> DomResult<()> {
        let element = single_range_element(doc, range)?;
        let mut elements = self.control.clone().unwrap_or_default();
        elements.push(element);
        if !self.native(host)?.set_control_elements(&elements) {
            return Err(DomError::invalid_state(
                "element could not be added to the control selection",
            ));
        }
        self.refresh(doc, host)
    }

    /// Replaces the selection with one range.
    pub fn set_single_range(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        range: &Range,
        direction: Direction,
    ) -> DomResult<()> {
        self.remove_all_ranges(host)?;
        self.add_range(doc, host, range, direction)
    }

    /// Replaces the selection with `ranges`, all forwards.
    pub fn set_ranges(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        ranges: &[Range],
    ) -> DomResult<()> {
        self.remove_all_ranges(host)?;
        for range in ranges {
            self.add_range(doc, host, range, Direction::Forward)?;
        }
        Ok(())
    }

    /// Removes the cached range equal to `range`.
    pub fn remove_range(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        range: &Range,
    ) -> DomResult<()> {
        let index = self
            .ranges
            .iter()
            .position(|r| r.equals(range))
            .ok_or(DomError::NotFound)?;
        if let Some(mut elements) = self.control.clone() {
            elements.remove(index);
            if elements.is_empty() {
                return self.remove_all_ranges(host);
            }
            self.native(host)?.set_control_elements(&elements);
            return self.refresh(doc, host);
        }
        let mut remaining = self.ranges.clone();
        remaining.remove(index);
        let keep_backward = remaining.len() == 1 && self.backward;
        self.remove_all_ranges(host)?;
        for (i, kept) in remaining.iter().enumerate() {
            let direction = Direction::from(keep_backward && i == 0);
            self.add_range(doc, host, kept, direction)?;
        }
        Ok(())
    }

    pub fn remove_all_ranges(&mut self, host: &mut dyn Host) -> DomResult<()> {
        self.native(host)?.remove_all_ranges();
        self.clear_cache();
        self.state = SyncState::Synchronized;
        Ok(())
    }

    // ---- queries ----

    #[inline]
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// Fails with [`DomError::IndexSize`] outside `0..range_count()`.
    pub fn get_range_at(&self, index: usize) -> DomResult<&Range> {
        self.ranges.get(index).ok_or(DomError::IndexSize)
    }

    /// Independent copies of every range.
    pub fn get_all_ranges(&self) -> Vec<Range> {
        self.ranges.clone()
    }

    #[inline]
    pub fn anchor(&self) -> Option<BoundaryPoint> {
        self.anchor
    }

    #[inline]
    pub fn focus(&self) -> Option<BoundaryPoint> {
        self.focus
    }

    pub fn is_collapsed(&self) -> bool {
        match self.ranges.as_slice() {
            [] => true,
            [only] => self.control.is_none() && only.collapsed(),
            _ => false,
        }
    }

    #[inline]
    pub fn is_backward(&self) -> bool {
        self.backward
    }

    pub fn is_control_selection(&self) -> bool {
        self.control.is_some()
    }

    pub fn contains_node(
        &self,
        doc: &Document,
        node: NodeId,
        allow_partial: bool,
    ) -> DomResult<bool> {
        for range in &self.ranges {
            if range.contains_node(doc, node, allow_partial)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Text of every range, concatenated.
    pub fn text(&self, doc: &Document) -> DomResult<String> {
        let mut out = String::new();
        for range in &self.ranges {
            out.push_str(&range.text(doc)?);
        }
        Ok(out)
    }

    /// Markup of a copy of every range's contents, or of the selected
    /// elements of a control selection.
    pub fn to_html(&self, doc: &mut Document) -> DomResult<String> {
        if let Some(elements) = &self.control {
            return Ok(elements.iter().map(|el| doc.outer_html(*el)).collect());
        }
        let mut out = String::new();
        for range in &self.ranges {
            out.push_str(&range.to_html(doc)?);
        }
        Ok(out)
    }

    // ---- collapsing and extending ----

    pub fn collapse(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        node: NodeId,
        offset: usize,
    ) -> DomResult<()> {
        self.check_document(doc)?;
        let mut range = Range::new(doc);
        range.collapse_to_point(doc, node, offset)?;
        self.set_single_range(doc, host, &range, Direction::Forward)
    }

    pub fn collapse_to_start(&mut self, doc: &mut Document, host: &mut dyn Host) -> DomResult<()> {
        let start = self
            .ranges
            .first()
            .map(Range::start)
            .ok_or_else(|| DomError::invalid_state("selection has no ranges"))?;
        self.collapse(doc, host, start.node, start.offset)
    }

    pub fn collapse_to_end(&mut self, doc: &mut Document, host: &mut dyn Host) -> DomResult<()> {
        let end = self
            .ranges
            .last()
            .map(Range::end)
            .ok_or_else(|| DomError::invalid_state("selection has no ranges"))?;
        self.collapse(doc, host, end.node, end.offset)
    }

    pub fn select_all_children(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        node: NodeId,
    ) -> DomResult<()> {
        self.check_document(doc)?;
        let mut range = Range::new(doc);
        range.select_node_contents(doc, node)?;
        self.set_single_range(doc, host, &range, Direction::Forward)
    }

    /// Moves the focus to `(node, offset)`, keeping the anchor.
    pub fn extend(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        node: NodeId,
        offset: usize,
    ) -> DomResult<()> {
        self.check_document(doc)?;
        let anchor = self
            .anchor
            .ok_or_else(|| DomError::invalid_state("selection has no ranges"))?;
        let mut range = Range::new(doc);
        range.collapse_to_point(doc, node, offset)?;
        let focus = range.start();

        if self.features.supports_backward_extend
            && self.features.implementation == Implementation::Structural
        {
            self.native(host)?.extend(doc, focus)?;
            return self.refresh(doc, host);
        }
        let backward = compare_boundary_points(doc, focus, anchor)? == Ordering::Less;
        let (start, end) = if backward { (focus, anchor) } else { (anchor, focus) };
        range.set_start_and_end(doc, (start, end))?;
        self.set_single_range(doc, host, &range, Direction::from(backward))
    }

    /// Deletes the contents of every range (or the selected elements of a
    /// control selection) and leaves the selection collapsed where the last
    /// range was.
    pub fn delete_from_document(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
    ) -> DomResult<()> {
        self.check_document(doc)?;
        if let Some(elements) = self.control.take() {
            for element in elements {
                doc.detach(element);
            }
            return self.remove_all_ranges(host);
        }
        let mut ranges = self.get_all_ranges();
        if ranges.is_empty() {
            return Ok(());
        }
        self.remove_all_ranges(host)?;
        for range in ranges.iter_mut() {
            range.delete_contents(doc)?;
        }
        if let Some(last) = ranges.last() {
            self.add_range(doc, host, last, Direction::Forward)?;
        }
        Ok(())
    }

    // ---- checkpoints ----

    /// Clones of the current ranges and direction.
    pub fn save_ranges(&self) -> SavedRanges {
        SavedRanges {
            ranges: self.get_all_ranges(),
            backward: self.backward,
        }
    }

    pub fn restore_ranges(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        saved: &SavedRanges,
    ) -> DomResult<()> {
        match saved.ranges.as_slice() {
            [only] => self.set_single_range(doc, host, only, Direction::from(saved.backward)),
            ranges => self.set_ranges(doc, host, ranges),
        }
    }

    /// Character-offset bookmarks of every range within `container`.
    pub fn get_bookmark(&self, doc: &Document, container: NodeId) -> DomResult<Vec<Bookmark>> {
        let backward = self.backward && self.ranges.len() == 1;
        self.ranges
            .iter()
            .map(|range| {
                let mut bookmark = range.get_bookmark(doc, container)?;
                bookmark.backward = backward;
                Ok(bookmark)
            })
            .collect()
    }

    pub fn move_to_bookmark(
        &mut self,
        doc: &mut Document,
        host: &mut dyn Host,
        bookmarks: &[Bookmark],
    ) -> DomResult<()> {
        self.check_document(doc)?;
        self.remove_all_ranges(host)?;
        for bookmark in bookmarks {
            let mut range = Range::new(doc);
            range.move_to_bookmark(doc, bookmark)?;
            self.add_range(doc, host, &range, Direction::from(bookmark.backward))?;
        }
        Ok(())
    }

    /// Drops every cached reference. The selection must be refreshed before
    /// it is used again.
    pub fn detach(&mut self) {
        self.clear_cache();
        self.state = SyncState::Uninitialized;
    }

    pub fn inspect(&self, doc: &Document) -> String {
        let ranges: Vec<String> = self.ranges.iter().map(|r| r.inspect(doc)).collect();
        format!("[WrappedSelection(Ranges: {})]", ranges.join(", "))
    }
}

/// The one element a range covers, for control selections.
fn single_range_element(doc: &Document, range: &Range) -> DomResult<NodeId> {
    let nodes = range.get_nodes(doc, |_, _| true)?;
    let single = match nodes.split_first() {
        Some((first, rest)) if matches!(doc.kind(*first), NodeKind::Element { .. }) => rest
            .iter()
            .all(|n| is_ancestor_of(doc, *first, *n, false))
            .then_some(*first),
        _ => None,
    };
    single.ok_or_else(|| DomError::invalid_state("range does not consist of a single element"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use range::sim::{Quirks, SimHost};

    fn setup(quirks: Quirks, markup: &str) -> (Document, SimHost, Selection) {
        let doc = Document::parse_html(markup).unwrap();
        let mut host = SimHost::new(quirks);
        let features = Features::probe(&mut host, false).unwrap();
        let selection = Selection::new(ContextId::MAIN, &doc, features, &EngineConfig::default());
        (doc, host, selection)
    }

    fn first_text(doc: &Document) -> NodeId {
        doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap()
    }

    fn range(doc: &Document, node: NodeId, start: usize, end: usize) -> Range {
        Range::from_points(doc, (node, start).into(), (node, end).into()).unwrap()
    }

    #[test]
    fn added_range_is_read_back_from_host() {
        let (mut doc, mut host, mut sel) = setup(Quirks::default(), "<p>abcdef</p>");
        assert_eq!(sel.state(), SyncState::Uninitialized);
        let t = first_text(&doc);
        let r = range(&doc, t, 1, 3);
        sel.add_range(&mut doc, &mut host, &r, Direction::Forward).unwrap();

        assert_eq!(sel.state(), SyncState::Synchronized);
        assert_eq!(sel.range_count(), 1);
        assert_eq!(sel.text(&doc).unwrap(), "bc");
        assert_eq!(sel.anchor(), Some(BoundaryPoint::new(t, 1)));
        assert_eq!(sel.focus(), Some(BoundaryPoint::new(t, 3)));
        assert!(!sel.is_backward());
        assert!(!sel.is_collapsed());
        assert_eq!(
            sel.inspect(&doc),
            r#"[WrappedSelection(Ranges: [DomRange("abcdef":1, "abcdef":3)])]"#
        );
    }

    #[test]
    fn backward_range_with_extend() {
        let (mut doc, mut host, mut sel) = setup(Quirks::default(), "<p>abcdef</p>");
        let t = first_text(&doc);
        let r = range(&doc, t, 1, 3);
        sel.add_range(&mut doc, &mut host, &r, Direction::Backward).unwrap();
        assert!(sel.is_backward());
        assert_eq!(sel.anchor(), Some(BoundaryPoint::new(t, 3)));
        assert_eq!(sel.focus(), Some(BoundaryPoint::new(t, 1)));
        let bookmarks = sel.get_bookmark(&doc, doc.root()).unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert!(bookmarks[0].backward);
    }

    #[test]
    fn backward_without_extend_is_added_forwards() {
        let quirks = Quirks {
            extend: false,
            ..Quirks::default()
        };
        let (mut doc, mut host, mut sel) = setup(quirks, "<p>abcdef</p>");
        let t = first_text(&doc);
        let r = range(&doc, t, 1, 3);
        sel.add_range(&mut doc, &mut host, &r, Direction::Backward).unwrap();
        assert!(!sel.is_backward());
        assert_eq!(sel.text(&doc).unwrap(), "bc");
    }

    #[test]
    fn single_range_host_keeps_the_latest() {
        let quirks = Quirks {
            multi_range: false,
            ..Quirks::default()
        };
        let (mut doc, mut host, mut sel) = setup(quirks, "<p>abcdef</p>");
        let t = first_text(&doc);
        for r in [range(&doc, t, 0, 1), range(&doc, t, 4, 6)] {
            sel.add_range(&mut doc, &mut host, &r, Direction::Forward).unwrap();
        }
        assert_eq!(sel.range_count(), 1);
        assert_eq!(sel.text(&doc).unwrap(), "ef");
    }

    #[test]
    fn multiple_ranges() {
        let (mut doc, mut host, mut sel) = setup(Quirks::default(), "<p>abcdef</p>");
        let t = first_text(&doc);
        let first = range(&doc, t, 0, 1);
        let second = range(&doc, t, 4, 6);
        sel.set_ranges(&mut doc, &mut host, &[first.clone(), second]).unwrap();
        assert_eq!(sel.range_count(), 2);
        assert_eq!(sel.text(&doc).unwrap(), "aef");
        assert!(!sel.is_collapsed());
        assert!(matches!(sel.get_range_at(2), Err(DomError::IndexSize)));

        sel.remove_range(&mut doc, &mut host, &first).unwrap();
        assert_eq!(sel.range_count(), 1);
        assert_eq!(sel.text(&doc).unwrap(), "ef");
        let err = sel.remove_range(&mut doc, &mut host, &first).unwrap_err();
        assert!(matches!(err, DomError::NotFound), "{err:?}");
    }

    #[test]
    fn collapse_and_extend() {
        let (mut doc, mut host, mut sel) = setup(Quirks::default(), "<p>abcdef</p>");
        let t = first_text(&doc);
        sel.collapse(&mut doc, &mut host, t, 2).unwrap();
        assert!(sel.is_collapsed());

        sel.extend(&mut doc, &mut host, t, 5).unwrap();
        assert_eq!(sel.text(&doc).unwrap(), "cde");
        assert!(!sel.is_backward());

        sel.extend(&mut doc, &mut host, t, 0).unwrap();
        assert_eq!(sel.text(&doc).unwrap(), "ab");
        assert!(sel.is_backward());
        assert_eq!(sel.anchor(), Some(BoundaryPoint::new(t, 2)));

        sel.collapse_to_end(&mut doc, &mut host).unwrap();
        assert_eq!(sel.focus(), Some(BoundaryPoint::new(t, 2)));
    }

    #[test]
    fn extend_without_host_support_rebuilds_the_range() {
        let quirks = Quirks {
            extend: false,
            ..Quirks::default()
        };
        let (mut doc, mut host, mut sel) = setup(quirks, "<p>abcdef</p>");
        let t = first_text(&doc);
        sel.collapse(&mut doc, &mut host, t, 2).unwrap();
        sel.extend(&mut doc, &mut host, t, 4).unwrap();
        assert_eq!(sel.text(&doc).unwrap(), "cd");
    }

    #[test]
    fn collapsing_an_empty_selection_fails() {
        let (mut doc, mut host, mut sel) = setup(Quirks::default(), "<p>x</p>");
        assert!(sel.is_collapsed());
        let err = sel.collapse_to_start(&mut doc, &mut host).unwrap_err();
        assert!(matches!(err, DomError::InvalidState(_)), "{err:?}");
    }

    #[test]
    fn delete_from_document_leaves_a_caret() {
        let (mut doc, mut host, mut sel) = setup(Quirks::default(), "<p>abcdef</p>");
        let t = first_text(&doc);
        let r = range(&doc, t, 1, 3);
        sel.set_single_range(&mut doc, &mut host, &r, Direction::Forward).unwrap();
        sel.delete_from_document(&mut doc, &mut host).unwrap();
        assert_eq!(doc.data(t), Some("adef"));
        assert!(sel.is_collapsed());
        assert_eq!(sel.anchor(), Some(BoundaryPoint::new(t, 1)));
    }

    #[test]
    fn legacy_host_round_trips_through_text_ranges() {
        let (mut doc, mut host, mut sel) = setup(Quirks::legacy(), "<p>abcdef</p>");
        assert_eq!(sel.features().implementation, Implementation::Legacy);
        let t = first_text(&doc);
        let r = range(&doc, t, 1, 3);
        sel.add_range(&mut doc, &mut host, &r, Direction::Backward).unwrap();
        assert_eq!(sel.range_count(), 1);
        assert_eq!(sel.text(&doc).unwrap(), "bc");
        assert!(!sel.is_backward());
    }

    #[test]
    fn control_selection() {
        let (mut doc, mut host, mut sel) = setup(Quirks::legacy(), "<p><img><img>x</p>");
        let p = doc.first_child(doc.root()).unwrap();
        let (img1, img2, x) = (
            doc.child_at(p, 0).unwrap(),
            doc.child_at(p, 1).unwrap(),
            doc.child_at(p, 2).unwrap(),
        );
        assert!(host.selection(ContextId::MAIN).unwrap().set_control_elements(&[img1]));
        sel.refresh(&mut doc, &mut host).unwrap();
        assert!(sel.is_control_selection());
        assert!(!sel.is_collapsed());
        assert!(sel.contains_node(&doc, img1, false).unwrap());

        let text = range(&doc, x, 0, 1);
        let err = sel.add_range(&mut doc, &mut host, &text, Direction::Forward).unwrap_err();
        assert!(matches!(err, DomError::InvalidState(_)), "{err:?}");

        let mut second = Range::new(&doc);
        second.select_node(&doc, img2).unwrap();
        sel.add_range(&mut doc, &mut host, &second, Direction::Forward).unwrap();
        assert_eq!(sel.range_count(), 2);

        sel.delete_from_document(&mut doc, &mut host).unwrap();
        assert_eq!(doc.parent(img1), None);
        assert_eq!(doc.parent(img2), None);
        assert_eq!(sel.range_count(), 0);
    }

    #[test]
    fn bookmarks_and_saved_ranges() {
        let (mut doc, mut host, mut sel) =
            setup(Quirks::default(), "<div><p>abc</p><p>def</p></div>");
        let div = doc.first_child(doc.root()).unwrap();
        let t1 = doc.first_child(doc.child_at(div, 0).unwrap()).unwrap();
        let t2 = doc.first_child(doc.child_at(div, 1).unwrap()).unwrap();
        let r = Range::from_points(&doc, (t1, 1).into(), (t2, 2).into()).unwrap();
        sel.add_range(&mut doc, &mut host, &r, Direction::Backward).unwrap();

        let bookmarks = sel.get_bookmark(&doc, div).unwrap();
        assert_eq!((bookmarks[0].start, bookmarks[0].end), (1, 5));
        let saved = sel.save_ranges();

        sel.collapse(&mut doc, &mut host, t1, 0).unwrap();
        sel.move_to_bookmark(&mut doc, &mut host, &bookmarks).unwrap();
        assert_eq!(sel.text(&doc).unwrap(), "bcde");
        assert!(sel.is_backward());

        sel.collapse(&mut doc, &mut host, t1, 0).unwrap();
        sel.restore_ranges(&mut doc, &mut host, &saved).unwrap();
        assert!(sel.get_range_at(0).unwrap().equals(&r));
        assert!(sel.is_backward());
    }

    #[test]
    fn foreign_document_is_rejected() {
        let (_, mut host, mut sel) = setup(Quirks::default(), "<p>x</p>");
        let mut other = Document::parse_html("<p>y</p>").unwrap();
        let t = first_text(&other);
        let err = sel.collapse(&mut other, &mut host, t, 0).unwrap_err();
        assert!(matches!(err, DomError::WrongDocument), "{err:?}");
    }

    #[test]
    fn detach_and_staleness() {
        let (mut doc, mut host, mut sel) = setup(Quirks::default(), "<p>abc</p>");
        let t = first_text(&doc);
        sel.collapse(&mut doc, &mut host, t, 1).unwrap();
        sel.mark_stale();
        assert_eq!(sel.state(), SyncState::Stale);
        sel.detach();
        assert_eq!(sel.state(), SyncState::Uninitialized);
        assert_eq!(sel.range_count(), 0);
        sel.mark_stale();
        assert_eq!(sel.state(), SyncState::Uninitialized);
    }
}
