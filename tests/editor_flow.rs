use range::{Host, NativeSelection};
use range::sim::{Quirks, SimHost};
use richtext::{ContextId, Direction, EditorSession, EngineConfig, Range};

fn text_of(session: &EditorSession, nth: usize) -> richtext::NodeId {
    let doc = session.document();
    doc.first_child(doc.child_at(doc.root(), nth).unwrap()).unwrap()
}

#[test]
fn bookmark_survives_rebuilding_the_content() {
    let mut host = SimHost::new(Quirks::default());
    let mut session =
        EditorSession::from_html("<p>abc</p><p>def</p>", EngineConfig::default()).unwrap();
    let (t1, t2) = (text_of(&session, 0), text_of(&session, 1));
    let range = Range::from_points(session.document(), (t1, 1).into(), (t2, 2).into()).unwrap();

    let root = session.document().root();
    let bookmarks = session
        .with_selection(&mut host, ContextId::MAIN, |sel, doc, host| {
            sel.set_single_range(doc, host, &range, Direction::Forward)?;
            sel.get_bookmark(doc, root)
        })
        .unwrap();
    assert_eq!((bookmarks[0].start, bookmarks[0].end), (1, 5));

    // Re-parse the content: every text node is replaced.
    host.selection(ContextId::MAIN).unwrap().remove_all_ranges();
    let html = session.current_html();
    session.set_content(&html).unwrap();
    assert_ne!(text_of(&session, 0), t1);

    let text = session
        .with_selection(&mut host, ContextId::MAIN, |sel, doc, host| {
            assert_eq!(sel.range_count(), 0);
            sel.move_to_bookmark(doc, host, &bookmarks)?;
            sel.text(doc)
        })
        .unwrap();
    assert_eq!(text, "bcde");
}

#[test]
fn formatting_edit_keeps_the_user_selection() {
    let mut host = SimHost::new(Quirks {
        multi_range: false,
        ..Quirks::default()
    });
    let mut session =
        EditorSession::from_html("<p>make this bold</p>", EngineConfig::default()).unwrap();
    let t = text_of(&session, 0);
    host.selection(ContextId::MAIN)
        .unwrap()
        .add_range((t, 5).into(), (t, 9).into());
    session.selection_changed(ContextId::MAIN);

    let mut saved = session.save_selection(&mut host, ContextId::MAIN).unwrap();

    // Toolbar action: wrap everything between the markers in <b>.
    let doc = session.document_mut();
    let p = doc.parent(t).unwrap();
    let mut between = Range::new(doc);
    let start = doc.child_at(p, 1).unwrap();
    let end = doc.child_at(p, 3).unwrap();
    between.set_start_after(doc, start).unwrap();
    between.set_end_before(doc, end).unwrap();
    let bold = doc.create_element("b");
    between.surround_contents(doc, bold).unwrap();

    session
        .restore_selection(&mut host, ContextId::MAIN, &mut saved)
        .unwrap();
    assert_eq!(session.current_html(), "<p>make <b>this</b> bold</p>");
    let clean = session.sanitize_content(&session.current_html());
    assert_eq!(clean, "<p>make <b>this</b> bold</p>");
}

#[test]
fn unsupported_host_is_reported() {
    let mut host = SimHost::new(Quirks::bare());
    let mut session = EditorSession::from_html("<p>x</p>", EngineConfig::default()).unwrap();
    let err = session.get_selection(&mut host, ContextId::MAIN).unwrap_err();
    assert!(matches!(err, richtext::DomError::UnsupportedEnvironment(_)), "{err:?}");
    assert!(session.create_range(&mut host).is_err());
}
