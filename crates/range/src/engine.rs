use crate::features::{Features, Implementation};
use crate::host::Host;
use crate::range::{MAX_SUBTREE_DEPTH, Range};
use crate::range_like::RangeLike;
use crate::wrapped::WrappedRange;
use dom::{Document, DomError, DomResult};
use std::cell::OnceCell;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Use legacy text ranges even when structural ranges exist.
    pub prefer_text_range: bool,
    /// Re-check selection ranges against the host after every change.
    pub check_selection_ranges: bool,
    pub max_subtree_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefer_text_range: false,
            check_selection_ranges: true,
            max_subtree_depth: MAX_SUBTREE_DEPTH,
        }
    }
}

/// Probes the host once and hands out ranges built on what it found.
///
/// A failed probe is remembered: every later call fails with the same
/// error instead of probing again.
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    features: OnceCell<Result<Features, DomError>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            features: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Probes on first call; later calls return the cached outcome.
    pub fn init(&self, host: &mut dyn Host) -> DomResult<Features> {
        self.features
            .get_or_init(|| {
                let probed = Features::probe(host, self.config.prefer_text_range);
                if let Err(err) = &probed {
                    log::warn!(target: "range", "range support disabled: {err}");
                }
                probed
            })
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.features.get().is_some()
    }

    /// The probed features. Fails before [`init`](Self::init) and after a
    /// failed probe.
    pub fn features(&self) -> DomResult<Features> {
        match self.features.get() {
            Some(outcome) => outcome.clone(),
            None => Err(DomError::invalid_state("range engine is not initialized")),
        }
    }

    /// A host-backed range where the host has structural ranges, a plain
    /// [`Range`] otherwise.
    pub fn create_range(
        &self,
        doc: &Document,
        host: &mut dyn Host,
    ) -> DomResult<Box<dyn RangeLike>> {
        let features = self.init(host)?;
        if features.implementation == Implementation::Structural {
            if let Some(native) = host.create_native_range(doc) {
                let wrapped = WrappedRange::new(doc, native, &features)
                    .with_max_depth(self.config.max_subtree_depth);
                return Ok(Box::new(wrapped));
            }
        }
        Ok(Box::new(self.create_generic_range(doc)))
    }

    /// A plain range, independent of the host.
    pub fn create_generic_range(&self, doc: &Document) -> Range {
        Range::new(doc).with_max_depth(self.config.max_subtree_depth)
    }
}
