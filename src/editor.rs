use crate::content::sanitize_with;
use core_types::ContextId;
use dom::{Document, DomResult};
use html::{Sanitizer, default_sanitizer};
use range::{Engine, EngineConfig, Features, Host, RangeLike};
use selection::{SavedSelection, Selection, SelectionRegistry};

/// Everything an editing widget needs around one document: the range engine,
/// the selections of each context showing the document, and the last content
/// that passed the sanitizer.
#[derive(Debug)]
pub struct EditorSession {
    doc: Document,
    engine: Engine,
    selections: SelectionRegistry,
    sanitizer: Option<Sanitizer>,
    last_good: String,
}

impl EditorSession {
    pub fn new(doc: Document, config: EngineConfig) -> Self {
        Self {
            doc,
            engine: Engine::new(config),
            selections: SelectionRegistry::new(),
            sanitizer: None,
            last_good: String::new(),
        }
    }

    /// A session over sanitized `markup`.
    pub fn from_html(markup: &str, config: EngineConfig) -> DomResult<Self> {
        let mut session = Self::new(Document::new(), config);
        session.set_content(markup)?;
        Ok(session)
    }

    /// Replaces the default whitelist.
    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Probes the host on first use.
    pub fn init(&self, host: &mut dyn Host) -> DomResult<Features> {
        self.engine.init(host)
    }

    pub fn get_selection(
        &mut self,
        host: &mut dyn Host,
        context: ContextId,
    ) -> DomResult<&mut Selection> {
        self.selections
            .get_or_create(context, &mut self.doc, host, &self.engine)
    }

    /// Runs `f` on the selection of `context` with the document it points
    /// into.
    pub fn with_selection<R>(
        &mut self,
        host: &mut dyn Host,
        context: ContextId,
        f: impl FnOnce(&mut Selection, &mut Document, &mut dyn Host) -> DomResult<R>,
    ) -> DomResult<R> {
        let selection = self
            .selections
            .get_or_create(context, &mut self.doc, host, &self.engine)?;
        f(selection, &mut self.doc, host)
    }

    /// Forces the next [`get_selection`](Self::get_selection) of `context`
    /// to read the host again.
    pub fn selection_changed(&mut self, context: ContextId) {
        self.selections.mark_stale(context);
    }

    /// Forgets the selection of a closed context.
    pub fn close_context(&mut self, context: ContextId) -> bool {
        self.selections.dispose(context)
    }

    pub fn create_range(&self, host: &mut dyn Host) -> DomResult<Box<dyn RangeLike>> {
        self.engine.create_range(&self.doc, host)
    }

    /// Marks the selection of `context` in the document so it survives the
    /// edits that follow.
    pub fn save_selection(
        &mut self,
        host: &mut dyn Host,
        context: ContextId,
    ) -> DomResult<SavedSelection> {
        let sel = self
            .selections
            .get_or_create(context, &mut self.doc, host, &self.engine)?;
        selection::save_selection(&mut self.doc, host, sel)
    }

    pub fn restore_selection(
        &mut self,
        host: &mut dyn Host,
        context: ContextId,
        saved: &mut SavedSelection,
    ) -> DomResult<()> {
        let sel = self
            .selections
            .get_or_create(context, &mut self.doc, host, &self.engine)?;
        selection::restore_selection(&mut self.doc, host, sel, saved, true)
    }

    /// Sanitizes `unsafe_html`, falling back to the last accepted content.
    pub fn sanitize_content(&self, unsafe_html: &str) -> String {
        let sanitizer = self.sanitizer.as_ref().unwrap_or_else(|| default_sanitizer());
        sanitize_with(sanitizer, unsafe_html, &self.last_good)
    }

    /// Sanitizes `unsafe_html` and makes it the document content.
    ///
    /// Cached selections point into the old content and are dropped; hosts
    /// report the new selection on the next access.
    pub fn set_content(&mut self, unsafe_html: &str) -> DomResult<&str> {
        let clean = self.sanitize_content(unsafe_html);
        let root = self.doc.root();
        let fragment = self.doc.parse_fragment(&clean)?;
        self.doc.clear_children(root);
        self.doc.append_child(root, fragment)?;
        self.selections.dispose_all();
        log::debug!(target: "richtext", "content replaced ({} bytes)", clean.len());
        self.last_good = clean;
        Ok(&self.last_good)
    }

    /// The last content accepted by [`set_content`](Self::set_content).
    pub fn content(&self) -> &str {
        &self.last_good
    }

    /// Serializes the document as it is now, edits included.
    pub fn current_html(&self) -> String {
        self.doc.inner_html(self.doc.root())
    }
}
