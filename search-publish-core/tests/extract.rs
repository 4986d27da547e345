use search_publish_core::content::{ContentNode, MemoryPad};
use search_publish_core::extract::{extract, extract_with_warnings, parse_fields, DocumentRecord};

fn record_for(contents: &str) -> (DocumentRecord, ContentNode) {
    let node = ContentNode::from_path("/blog/first-post");
    let root = ContentNode::from_path("/");
    let mut pad = MemoryPad::new(root.clone(), "page", "");
    pad.insert(&root, node.clone(), "post", contents);
    (extract(&pad, &node), node)
}

fn underscore_keys(record: &DocumentRecord) -> Vec<&str> {
    record.keys().filter(|key| key.starts_with('_')).collect()
}

#[test]
fn test_extract_reads_single_line_fields() {
    let (record, node) = record_for("title:Hello\nbody:World");

    assert_eq!(record.get("title"), Some("Hello"));
    assert_eq!(record.get("body"), Some("World"));
    assert_eq!(record.gid(), node.gid);
    assert_eq!(record.path(), "/blog/first-post");
    assert_eq!(record.len(), 4);
}

#[test]
fn test_extract_reads_lektor_sections_and_blocks() {
    let contents = "title: Hello World\n---\nbody:\n\nFirst paragraph.\n\nSecond: with a colon.\n---\ntags: rust, search\n";
    let (record, _) = record_for(contents);

    assert_eq!(record.get("title"), Some("Hello World"));
    assert_eq!(
        record.get("body"),
        Some("First paragraph.\n\nSecond: with a colon.")
    );
    assert_eq!(record.get("tags"), Some("rust, search"));
}

#[test]
fn test_extract_keeps_separator_characters_inside_values() {
    let (record, _) = record_for("url: https://example.com:8080/path\ntime: 12:30");

    assert_eq!(record.get("url"), Some("https://example.com:8080/path"));
    assert_eq!(record.get("time"), Some("12:30"));
}

#[test]
fn test_extract_unescapes_dashes_inside_blocks() {
    let (record, _) = record_for("body:\n\nabove\n----\nbelow\n---\nsummary: done");

    assert_eq!(record.get("body"), Some("above\n---\nbelow"));
    assert_eq!(record.get("summary"), Some("done"));
}

#[test]
fn test_extract_drops_system_fields_and_injects_identity() {
    let (record, node) = record_for("_model: post\n---\n_hidden: yes\n---\n_gid: forged\n---\ntitle: Hi");

    assert_eq!(underscore_keys(&record), vec!["_gid", "_path"]);
    assert_eq!(record.get("_gid"), Some(node.gid.as_str()));
    assert_eq!(record.get("title"), Some("Hi"));
}

#[test]
fn test_extract_never_fails_on_malformed_contents() {
    let inputs = [
        "",
        "\n\n\n",
        "no separator anywhere",
        "---\n---\n---",
        ":orphan value",
        "key:",
        "key:\n---",
        "weird key: value",
        "a:b:c:d",
        "\r\ntitle: crlf\r\n---\r\nbody: ok\r\n",
        "----\n-----",
        "üñí: cödé",
    ];

    for contents in inputs {
        let (record, node) = record_for(contents);
        assert_eq!(
            underscore_keys(&record),
            vec!["_gid", "_path"],
            "identity fields for {contents:?}"
        );
        assert_eq!(record.gid(), node.gid);
        assert_eq!(record.path(), node.path);
    }
}

#[test]
fn test_extract_stores_empty_values_as_empty_strings() {
    let (record, _) = record_for("summary:\n---\ntitle: set");

    assert_eq!(record.get("summary"), Some(""));
    assert_eq!(record.get("title"), Some("set"));
}

#[test]
fn test_extract_reports_unreadable_lines_as_warnings() {
    let node = ContentNode::from_path("/");
    let pad = MemoryPad::new(node.clone(), "page", "title: ok\nthis line has no key\n:empty");

    let extraction = extract_with_warnings(&pad, &node);

    assert_eq!(extraction.record.get("title"), Some("ok"));
    assert_eq!(extraction.warnings.len(), 2);
    assert_eq!(extraction.warnings[0].line, 2);
    assert_eq!(extraction.warnings[1].line, 3);
}

#[test]
fn test_parse_fields_keeps_system_fields_in_order() {
    let parsed = parse_fields("_model: post\n---\ntitle: Hi\n---\n_template: post.html");

    let keys: Vec<&str> = parsed.fields.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["_model", "title", "_template"]);
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_document_record_serialises_as_flat_object() {
    let (record, node) = record_for("title: Hi");

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "title": "Hi", "_gid": node.gid, "_path": node.path })
    );
}
