use dom::Document;
use dom::traverse::text_nodes;

#[test]
fn sanitizer_output_builds_the_same_tree() {
    let clean =
        html::sanitize_default("<p>caf\u{e9}<br>x &amp; y</p><ul><li>one<li>two</ul>").unwrap();
    assert_eq!(clean, "<p>caf&#233;<br/>x &amp; y</p><ul><li>one</li><li>two</li></ul>");

    let doc = Document::parse_html(&clean).unwrap();
    let root = doc.root();
    assert_eq!(doc.child_count(root), 2);
    assert_eq!(doc.inner_html(root), "<p>café<br>x &amp; y</p><ul><li>one</li><li>two</li></ul>");
    let texts: Vec<&str> = text_nodes(&doc, root).filter_map(|t| doc.data(t)).collect();
    assert_eq!(texts, ["café", "x & y", "one", "two"]);
}

#[test]
fn fragment_content_can_replace_a_document_body() {
    let mut doc = Document::parse_html("<p>old</p>").unwrap();
    let root = doc.root();
    let old = doc.first_child(root).unwrap();
    let fragment = doc.parse_fragment("<h1>new</h1><p>text</p>").unwrap();
    doc.clear_children(root);
    doc.append_child(root, fragment).unwrap();

    assert_eq!(doc.inner_html(root), "<h1>new</h1><p>text</p>");
    assert_eq!(doc.child_count(fragment), 0);
    assert!(!doc.is_connected(old));
}
