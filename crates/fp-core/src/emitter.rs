//! Emitter: [`SvgDocument`] → SVG text.
//!
//! `emit_document` reproduces the tree as-is; `export_document` produces
//! the cleaned file a user downloads.

use crate::document::{SvgDocument, XmlNode};
use petgraph::graph::NodeIndex;
use serde::Deserialize;
use std::fmt::Write;

/// Class carried by interactive-only affordances.
pub const INTERACTIVE_CLASS: &str = "resize-handle";
/// Class carried by the highlighted device group.
pub const SELECTED_CLASS: &str = "selected";

/// Options for [`export_document`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Margin added around the original viewBox on every side.
    pub padding: f32,
    /// Drop resize handles and the selection class.
    pub strip_interactive: bool,
    /// `width="100%"` and no `height`, so the host container sizes the drawing.
    pub responsive: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            padding: 20.0,
            strip_interactive: true,
            responsive: true,
        }
    }
}

/// Serialize the tree verbatim.
#[must_use]
pub fn emit_document(doc: &SvgDocument) -> String {
    let mut out = String::with_capacity(4096);
    if !doc.prolog.is_empty() {
        out.push_str(&doc.prolog);
        out.push('\n');
    }
    emit_node(&mut out, doc, doc.root);
    out
}

/// Serialize a cleaned copy for download.
#[must_use]
pub fn export_document(doc: &SvgDocument, config: &ExportConfig) -> String {
    let mut clean = doc.clone();
    let root = clean.root;

    if config.strip_interactive {
        let handles: Vec<NodeIndex> = clean
            .descendants(root)
            .into_iter()
            .filter(|&idx| {
                clean
                    .element(idx)
                    .is_some_and(|el| el.has_class(INTERACTIVE_CLASS))
            })
            .collect();
        for handle in handles {
            clean.remove(handle);
        }
        for idx in clean.descendants(root) {
            if let Some(el) = clean.element_mut(idx) {
                el.remove_class(SELECTED_CLASS);
            }
        }
    }

    let vb = doc.view_box.padded(config.padding);
    clean.set_attr(
        root,
        "viewBox",
        format!(
            "{} {} {} {}",
            format_num(vb.x),
            format_num(vb.y),
            format_num(vb.width),
            format_num(vb.height)
        ),
    );
    if config.responsive
        && let Some(el) = clean.element_mut(root)
    {
        el.set_attr("width", "100%");
        el.remove_attr("height");
    }

    log::debug!("exporting document with viewBox {vb:?}");
    emit_document(&clean)
}

fn emit_node(out: &mut String, doc: &SvgDocument, idx: NodeIndex) {
    match doc.node(idx) {
        Some(XmlNode::Element(el)) => {
            let _ = write!(out, "<{}", el.tag);
            for (name, value) in &el.attrs {
                let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
            }
            let children = doc.children(idx);
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in children {
                emit_node(out, doc, child);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
        Some(XmlNode::Text(text)) => out.push_str(&escape_text(text)),
        Some(XmlNode::Comment(text)) => {
            let _ = write!(out, "<!--{text}-->");
        }
        Some(XmlNode::CData(text)) => {
            let _ = write!(out, "<![CDATA[{text}]]>");
        }
        None => {}
    }
}

/// Escape character data.
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compact number formatting for attributes: at most three decimals,
/// no trailing zeros, never `-0`.
pub fn format_num(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 || !rounded.is_finite() {
        return "0".to_string();
    }
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_reproduces_markup() {
        let src = r#"<svg viewBox="0 0 10 10"><g id="a"><title>A &amp; B</title><rect width="3"/></g><!--note--></svg>"#;
        let doc = parse_document(src).unwrap();
        assert_eq!(emit_document(&doc), src);
    }

    #[test]
    fn export_strips_affordances_and_pads() {
        let src = r#"<svg viewBox="0 0 400 300" width="400" height="300"><g id="device_1" class="device selected"><rect id="dev_1_p1"/><rect class="resize-handle"/></g></svg>"#;
        let doc = parse_document(src).unwrap();
        let out = export_document(&doc, &ExportConfig::default());
        assert_eq!(
            out,
            r#"<svg viewBox="-20 -20 440 340" width="100%"><g id="device_1" class="device"><rect id="dev_1_p1"/></g></svg>"#
        );
    }

    #[test]
    fn export_keeps_affordances_when_asked() {
        let src = r#"<svg viewBox="0 0 10 10"><rect class="resize-handle"/></svg>"#;
        let doc = parse_document(src).unwrap();
        let config = ExportConfig {
            padding: 0.0,
            strip_interactive: false,
            responsive: false,
        };
        assert_eq!(export_document(&doc, &config), src);
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(format_num(30.0), "30");
        assert_eq!(format_num(52.5), "52.5");
        assert_eq!(format_num(-0.0001), "0");
        assert_eq!(format_num(1.0 / 3.0), "0.333");
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("a<b & c>"), "a&lt;b &amp; c&gt;");
        assert_eq!(escape_attr(r#"say "hi" & <go>"#), "say &quot;hi&quot; &amp; &lt;go>");
    }
}
