//! Integration tests: SVG text → document → SVG text.

use fp_core::document::XmlNode;
use fp_core::emitter::{ExportConfig, emit_document, export_document};
use fp_core::parser::parse_document;
use fp_core::{FloorplanError, SvgDocument};
use pretty_assertions::assert_eq;

const PLANT_ROOM: &str = include_str!("fixtures/plant_room.svg");

// ─── Helpers ─────────────────────────────────────────────────────────────

fn element_ids(doc: &SvgDocument) -> Vec<String> {
    doc.descendants(doc.root)
        .into_iter()
        .filter_map(|idx| doc.attr(idx, "id").map(str::to_string))
        .collect()
}

/// Parse, emit, re-parse, and compare structure.
fn assert_roundtrip_preserves(input: &str) {
    let first = parse_document(input).expect("first parse failed");
    let emitted = emit_document(&first);
    let second = parse_document(&emitted).expect("re-parse failed");

    assert_eq!(
        first.graph.node_count(),
        second.graph.node_count(),
        "node count mismatch after round-trip.\nEmitted:\n{emitted}"
    );
    assert_eq!(element_ids(&first), element_ids(&second));
    assert_eq!(first.prolog, second.prolog);
    assert_eq!(first.view_box, second.view_box);
}

// ─── Round-trip ──────────────────────────────────────────────────────────

#[test]
fn fixture_roundtrips() {
    assert_roundtrip_preserves(PLANT_ROOM);
}

#[test]
fn fixture_is_stable_after_one_pass() {
    let once = emit_document(&parse_document(PLANT_ROOM).unwrap());
    let twice = emit_document(&parse_document(&once).unwrap());
    assert_eq!(once, twice);
}

#[test]
fn entities_survive_roundtrip() {
    let doc = parse_document(PLANT_ROOM).unwrap();
    let group = doc.find_by_id("device_12").unwrap();
    let title = doc.find_child(group, "title").unwrap();
    assert_eq!(doc.text_content(title), "Boiler & Pump");

    let emitted = emit_document(&doc);
    assert!(emitted.contains("<title>Boiler &amp; Pump</title>"));
    assert!(emitted.contains("Plant Room \u{2013} L2"));
}

// ─── Structure ───────────────────────────────────────────────────────────

#[test]
fn prolog_and_viewbox_are_read() {
    let doc = parse_document(PLANT_ROOM).unwrap();
    assert!(doc.prolog.starts_with("<?xml"));
    assert!(doc.prolog.contains("<!DOCTYPE svg"));
    assert!(doc.prolog.ends_with("<!-- Plant room, level 2 -->"));
    assert_eq!(doc.view_box.width, 800.0);
    assert_eq!(doc.view_box.height, 600.0);
}

#[test]
fn device_groups_are_found_by_id_pattern() {
    let doc = parse_document(PLANT_ROOM).unwrap();
    let groups = doc.elements_with_id(|id| fp_core::DeviceId::from_group_element_id(id).is_some());
    let ids: Vec<_> = groups
        .iter()
        .filter(|&&g| doc.element(g).is_some_and(|el| el.tag == "g"))
        .filter_map(|&g| doc.attr(g, "id"))
        .collect();
    assert_eq!(ids, vec!["device_12", "dev_7"]);
}

#[test]
fn whitespace_text_is_kept() {
    let doc = parse_document(PLANT_ROOM).unwrap();
    let first = doc.children(doc.root)[0];
    assert!(matches!(doc.node(first), Some(XmlNode::Text(t)) if t.trim().is_empty()));
}

// ─── Export ──────────────────────────────────────────────────────────────

#[test]
fn export_is_responsive_and_padded() {
    let doc = parse_document(PLANT_ROOM).unwrap();
    let out = export_document(&doc, &ExportConfig::default());
    let exported = parse_document(&out).unwrap();
    let root = exported.element(exported.root).unwrap();
    assert_eq!(root.attr("viewBox"), Some("-20 -20 840 640"));
    assert_eq!(root.attr("width"), Some("100%"));
    assert_eq!(root.attr("height"), None);
    // The source document is untouched.
    assert_eq!(doc.attr(doc.root, "height"), Some("600"));
}

// ─── Errors ──────────────────────────────────────────────────────────────

#[test]
fn malformed_documents_are_rejected() {
    let cases = [
        "",
        "<svg>",
        "<svg><g></svg>",
        "<svg></svg><svg></svg>",
        "<html/>",
        "<svg><rect x=1/></svg>",
    ];
    for case in cases {
        assert!(
            matches!(parse_document(case), Err(FloorplanError::InvalidDocument { .. })),
            "accepted {case:?}"
        );
    }
}
