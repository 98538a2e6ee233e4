//! Selections cached per browsing context.
use crate::selection::Selection;
use core_types::ContextId;
use dom::{Document, DomResult};
use range::{Engine, Host};
use std::collections::HashMap;

/// Owner of every [`Selection`], keyed by the context it belongs to.
///
/// Entries live until [`dispose`](Self::dispose) is called for their
/// context; a context whose document changed gets a fresh selection.
#[derive(Debug, Default)]
pub struct SelectionRegistry {
    selections: HashMap<ContextId, Selection>,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self {
            selections: HashMap::new(),
        }
    }

    pub fn has(&self, context: ContextId) -> bool {
        self.selections.contains_key(&context)
    }

    pub fn get(&self, context: ContextId) -> Option<&Selection> {
        self.selections.get(&context)
    }

    /// The selection of `context`, read back from the host unless it is
    /// already synchronized.
    pub fn get_or_create(
        &mut self,
        context: ContextId,
        doc: &mut Document,
        host: &mut dyn Host,
        engine: &Engine,
    ) -> DomResult<&mut Selection> {
        let features = engine.init(host)?;
        let selection = self
            .selections
            .entry(context)
            .and_modify(|existing| {
                if existing.document_id() != doc.id() {
                    log::debug!(target: "selection", "context {} changed document", context.0);
                    *existing = Selection::new(context, doc, features, engine.config());
                }
            })
            .or_insert_with(|| Selection::new(context, doc, features, engine.config()));
        if selection.state() != crate::SyncState::Synchronized {
            selection.refresh(doc, host)?;
        }
        Ok(selection)
    }

    /// Re-reads the selection of `context` from the host, if it is cached.
    pub fn refresh(
        &mut self,
        context: ContextId,
        doc: &mut Document,
        host: &mut dyn Host,
    ) -> DomResult<bool> {
        match self.selections.get_mut(&context) {
            Some(selection) => selection.refresh(doc, host).map(|()| true),
            None => Ok(false),
        }
    }

    /// Flags the cached selection of `context` for a refresh on next access.
    pub fn mark_stale(&mut self, context: ContextId) {
        if let Some(selection) = self.selections.get_mut(&context) {
            selection.mark_stale();
        }
    }

    /// Drops the selection of `context`. Returns whether one was cached.
    pub fn dispose(&mut self, context: ContextId) -> bool {
        match self.selections.remove(&context) {
            Some(mut selection) => {
                selection.detach();
                log::trace!(target: "selection", "disposed context {}", context.0);
                true
            }
            None => false,
        }
    }

    pub fn dispose_all(&mut self) {
        for (_, mut selection) in self.selections.drain() {
            selection.detach();
        }
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncState;
    use core_types::Direction;
    use range::{NativeSelection, Range};
    use range::sim::{Quirks, SimHost};

    #[test]
    fn caches_per_context() {
        let mut doc = Document::parse_html("<p>abc</p>").unwrap();
        let t = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();
        let mut host = SimHost::new(Quirks::default());
        let engine = Engine::default();
        let mut registry = SelectionRegistry::new();

        let sel = registry
            .get_or_create(ContextId::MAIN, &mut doc, &mut host, &engine)
            .unwrap();
        assert_eq!(sel.state(), SyncState::Synchronized);
        let r = Range::from_points(&doc, (t, 0).into(), (t, 2).into()).unwrap();
        sel.add_range(&mut doc, &mut host, &r, Direction::Forward).unwrap();

        let again = registry
            .get_or_create(ContextId::MAIN, &mut doc, &mut host, &engine)
            .unwrap();
        assert_eq!(again.range_count(), 1);
        assert_eq!(registry.len(), 1);

        let frame = ContextId(7);
        host.open_context(frame);
        registry.get_or_create(frame, &mut doc, &mut host, &engine).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get(frame).unwrap().is_collapsed());
    }

    #[test]
    fn stale_selection_is_refreshed_on_access() {
        let mut doc = Document::parse_html("<p>abc</p>").unwrap();
        let t = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();
        let mut host = SimHost::new(Quirks::default());
        let engine = Engine::default();
        let mut registry = SelectionRegistry::new();
        registry
            .get_or_create(ContextId::MAIN, &mut doc, &mut host, &engine)
            .unwrap();

        // The user selects something behind the cache's back.
        host.selection(ContextId::MAIN)
            .unwrap()
            .add_range((t, 1).into(), (t, 3).into());
        assert_eq!(registry.get(ContextId::MAIN).unwrap().range_count(), 0);
        registry.mark_stale(ContextId::MAIN);
        let sel = registry
            .get_or_create(ContextId::MAIN, &mut doc, &mut host, &engine)
            .unwrap();
        assert_eq!(sel.text(&doc).unwrap(), "bc");
    }

    #[test]
    fn dispose_and_document_change() {
        let mut doc = Document::parse_html("<p>abc</p>").unwrap();
        let mut host = SimHost::new(Quirks::default());
        let engine = Engine::default();
        let mut registry = SelectionRegistry::new();
        registry
            .get_or_create(ContextId::MAIN, &mut doc, &mut host, &engine)
            .unwrap();

        let mut other = Document::parse_html("<p>xyz</p>").unwrap();
        let sel = registry
            .get_or_create(ContextId::MAIN, &mut other, &mut host, &engine)
            .unwrap();
        assert_eq!(sel.document_id(), other.id());

        assert!(registry.dispose(ContextId::MAIN));
        assert!(!registry.dispose(ContextId::MAIN));
        assert!(registry.is_empty());
        assert!(!registry.refresh(ContextId::MAIN, &mut doc, &mut host).unwrap());
    }

    #[test]
    fn closed_context_fails_to_refresh() {
        let mut doc = Document::new();
        let mut host = SimHost::new(Quirks::default());
        let engine = Engine::default();
        let mut registry = SelectionRegistry::new();
        let err = registry
            .get_or_create(ContextId(3), &mut doc, &mut host, &engine)
            .unwrap_err();
        assert!(matches!(err, dom::DomError::InvalidState(_)), "{err:?}");
        assert!(registry.has(ContextId(3)));
        registry.dispose_all();
        assert!(registry.is_empty());
    }
}
