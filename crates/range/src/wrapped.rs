use crate::features::Features;
use crate::host::NativeRange;
use crate::range::{How, Range};
use crate::range_like::RangeLike;
use dom::{BoundaryPoint, Document, DomResult, NodeId};
use std::cmp::Ordering;

/// A host range kept in step with a [`Range`] mirror.
///
/// Boundary changes are computed on the mirror and written to the host end
/// first, then start, so no host ever sees a start past its end. Host
/// comparison and content removal are only trusted as far as the feature
/// probe found them to be conformant.
#[derive(Debug)]
pub struct WrappedRange {
    native: Box<dyn NativeRange>,
    mirror: Range,
    compare_constants_swapped: bool,
    native_contents: bool,
}

impl WrappedRange {
    pub fn new(doc: &Document, native: Box<dyn NativeRange>, features: &Features) -> Self {
        let mut wrapped = Self {
            native,
            mirror: Range::new(doc),
            compare_constants_swapped: features.compare_constants_swapped,
            native_contents: features.native_contents_conformant,
        };
        wrapped.refresh(doc);
        wrapped
    }

    /// Overrides the subtree depth limit of the generic fallbacks.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.mirror.max_depth = max_depth;
        self
    }

    /// Re-reads the host boundaries into the mirror.
    pub fn refresh(&mut self, doc: &Document) {
        let (start, end) = (self.native.start(), self.native.end());
        self.mirror.update_boundaries(doc, start, end);
    }

    pub fn native(&self) -> &dyn NativeRange {
        &*self.native
    }

    pub fn into_native(self) -> Box<dyn NativeRange> {
        self.native
    }

    fn write_native(
        &mut self,
        doc: &Document,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> DomResult<()> {
        self.native.set_end(doc, end)?;
        self.native.set_start(doc, start)?;
        self.refresh(doc);
        log::trace!(target: "range.adapter", "native range now {}", self.mirror.inspect(doc));
        Ok(())
    }
}

impl RangeLike for WrappedRange {
    fn range(&self) -> &Range {
        &self.mirror
    }

    fn set_boundaries(
        &mut self,
        doc: &Document,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> DomResult<()> {
        let mut checked = self.mirror.clone();
        checked.set_start_and_end(doc, (start, end))?;
        self.write_native(doc, checked.start(), checked.end())
    }

    fn delete_contents(&mut self, doc: &mut Document) -> DomResult<()> {
        self.mirror.ensure_valid(doc)?;
        if self.native_contents {
            self.native.delete_contents(doc)?;
            self.refresh(doc);
            return Ok(());
        }
        log::debug!(target: "range.adapter", "deleting with the generic algorithm");
        let mut generic = self.mirror.clone();
        generic.delete_contents(doc)?;
        self.write_native(doc, generic.start(), generic.end())
    }

    fn extract_contents(&mut self, doc: &mut Document) -> DomResult<NodeId> {
        self.mirror.ensure_valid(doc)?;
        if self.native_contents {
            let fragment = self.native.extract_contents(doc)?;
            self.refresh(doc);
            return Ok(fragment);
        }
        log::debug!(target: "range.adapter", "extracting with the generic algorithm");
        let mut generic = self.mirror.clone();
        let fragment = generic.extract_contents(doc)?;
        self.write_native(doc, generic.start(), generic.end())?;
        Ok(fragment)
    }

    fn compare_boundary_points(
        &self,
        doc: &Document,
        how: How,
        other: &Range,
    ) -> DomResult<Ordering> {
        self.mirror.ensure_valid(doc)?;
        other.ensure_valid(doc)?;
        let how = if self.compare_constants_swapped {
            how.swapped()
        } else {
            how
        };
        self.native
            .compare_boundary_points(doc, how.raw(), other.start(), other.end())
    }

    fn inspect(&self, doc: &Document) -> String {
        self.mirror.inspect(doc).replacen("DomRange", "WrappedRange", 1)
    }
}
