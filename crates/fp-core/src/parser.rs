//! SVG text → [`SvgDocument`].
//!
//! Built on `winnow` 0.7. This is a pragmatic XML tokenizer, not a
//! validating parser: it understands the constructs drawing tools emit
//! (declaration, doctype, comments, CDATA, elements, text, entity
//! references) and checks tag balance.

use crate::document::{Element, SvgDocument, ViewBox, XmlNode};
use crate::error::{FloorplanError, Result};
use petgraph::graph::NodeIndex;
use std::borrow::Cow;
use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{alt, delimited, preceded, repeat};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// Parse SVG text into a document.
///
/// # Errors
/// `InvalidDocument` when the markup is malformed or the root element is
/// not `<svg>`.
pub fn parse_document(input: &str) -> Result<SvgDocument> {
    let mut rest = input;
    let mut doc: Option<SvgDocument> = None;
    let mut stack: Vec<(NodeIndex, &str)> = Vec::new();

    while !rest.is_empty() {
        let offset = input.len() - rest.len();
        let token = parse_token
            .parse_next(&mut rest)
            .map_err(|_| FloorplanError::invalid_document(format!("malformed markup at byte {offset}")))?;

        let Some(current) = doc.as_mut() else {
            // Before the root element.
            match token {
                Token::Start {
                    name,
                    attrs,
                    self_closing,
                } => {
                    if name != "svg" {
                        return Err(FloorplanError::invalid_document(format!(
                            "root element is <{name}>, expected <svg>"
                        )));
                    }
                    let mut svg = SvgDocument::new(build_element(name, &attrs));
                    svg.prolog = input[..offset].trim().to_string();
                    if !self_closing {
                        stack.push((svg.root, name));
                    }
                    doc = Some(svg);
                }
                Token::End(name) => {
                    return Err(FloorplanError::invalid_document(format!(
                        "unexpected </{name}> before the root element"
                    )));
                }
                _ => {}
            }
            continue;
        };

        let Some(&(parent, open_name)) = stack.last() else {
            // Only comments and whitespace may follow the root.
            match token {
                Token::Start { name, .. } | Token::End(name) => {
                    return Err(FloorplanError::invalid_document(format!(
                        "unexpected <{name}> after the root element"
                    )));
                }
                Token::Text(text) if !text.trim().is_empty() => {
                    return Err(FloorplanError::invalid_document(
                        "text after the root element",
                    ));
                }
                _ => continue,
            }
        };

        match token {
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                let idx = current.append_element(parent, build_element(name, &attrs));
                if !self_closing {
                    stack.push((idx, name));
                }
            }
            Token::End(name) => {
                if name != open_name {
                    return Err(FloorplanError::invalid_document(format!(
                        "mismatched </{name}>, expected </{open_name}>"
                    )));
                }
                stack.pop();
            }
            Token::Text(text) => {
                current.append(parent, XmlNode::Text(unescape(text).into_owned()));
            }
            Token::CData(text) => {
                current.append(parent, XmlNode::CData(text.to_string()));
            }
            Token::Comment(text) => {
                current.append(parent, XmlNode::Comment(text.to_string()));
            }
            Token::Declaration(_) | Token::Doctype(_) => {}
        }
    }

    let Some(mut doc) = doc else {
        return Err(FloorplanError::invalid_document("no <svg> root element"));
    };
    if let Some((_, name)) = stack.last() {
        return Err(FloorplanError::invalid_document(format!("unclosed <{name}>")));
    }
    if let Some(root) = doc.element(doc.root) {
        doc.view_box = ViewBox::from_root(root);
    }
    log::debug!(
        "parsed SVG: {} nodes, viewBox {:?}",
        doc.graph.node_count(),
        doc.view_box
    );
    Ok(doc)
}

fn build_element(name: &str, attrs: &[(&str, &str)]) -> Element {
    let mut el = Element::new(name);
    for (key, value) in attrs {
        el.attrs.push((key.to_string(), unescape(value).into_owned()));
    }
    el
}

// ─── Tokens ─────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Token<'a> {
    /// `<?xml … ?>` or any processing instruction.
    Declaration(&'a str),
    /// `<!DOCTYPE …>`.
    Doctype(&'a str),
    Comment(&'a str),
    CData(&'a str),
    Start {
        name: &'a str,
        attrs: Vec<(&'a str, &'a str)>,
        self_closing: bool,
    },
    End(&'a str),
    Text(&'a str),
}

fn parse_token<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    alt((
        parse_comment.map(Token::Comment),
        parse_cdata.map(Token::CData),
        parse_declaration.map(Token::Declaration),
        parse_end_tag.map(Token::End),
        parse_doctype.map(Token::Doctype),
        parse_start_tag,
        parse_text.map(Token::Text),
    ))
    .parse_next(input)
}

fn parse_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<!--", take_until(0.., "-->"), "-->").parse_next(input)
}

fn parse_cdata<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<![CDATA[", take_until(0.., "]]>"), "]]>").parse_next(input)
}

fn parse_declaration<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<?", take_until(0.., "?>"), "?>").parse_next(input)
}

fn parse_doctype<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("<!", take_till(0.., '>'), '>').parse_next(input)
}

fn parse_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
    })
    .parse_next(input)
}

fn parse_attr_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn parse_attribute<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let name = parse_name.parse_next(input)?;
    let _ = (multispace0, '=', multispace0).parse_next(input)?;
    let value = parse_attr_value.parse_next(input)?;
    Ok((name, value))
}

fn parse_start_tag<'a>(input: &mut &'a str) -> ModalResult<Token<'a>> {
    let _ = '<'.parse_next(input)?;
    let name = parse_name.parse_next(input)?;
    let attrs: Vec<(&'a str, &'a str)> =
        repeat(0.., preceded(multispace1, parse_attribute)).parse_next(input)?;
    let _ = multispace0.parse_next(input)?;
    let self_closing = alt(("/>".value(true), '>'.value(false))).parse_next(input)?;
    Ok(Token::Start {
        name,
        attrs,
        self_closing,
    })
}

fn parse_end_tag<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited("</", parse_name, (multispace0, '>')).parse_next(input)
}

fn parse_text<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., '<').parse_next(input)
}

// ─── Entities ───────────────────────────────────────────────────────────

/// Decode the five predefined entities and numeric character references.
/// Unknown references are kept literally.
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenizes_start_tag_with_mixed_quotes() {
        let mut input = r#"<rect id="a" fill='#fff' data-x = "1"/>rest"#;
        let token = parse_token.parse_next(&mut input).unwrap();
        assert_eq!(
            token,
            Token::Start {
                name: "rect",
                attrs: vec![("id", "a"), ("fill", "#fff"), ("data-x", "1")],
                self_closing: true,
            }
        );
        assert_eq!(input, "rest");
    }

    #[test]
    fn parses_nested_document() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
<!-- exported -->
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 300">
  <g id="device_7" transform="translate(10,20)">
    <title>Boiler &amp; Pump</title>
    <rect id="dev_7_p1" width="30" height="30"/>
  </g>
  <![CDATA[ raw <data> ]]>
</svg>
"#,
        )
        .unwrap();

        assert!(doc.prolog.starts_with("<?xml"));
        assert_eq!(doc.view_box.width, 400.0);
        let group = doc.find_by_id("device_7").unwrap();
        let title = doc.find_child(group, "title").unwrap();
        assert_eq!(doc.text_content(title), "Boiler & Pump");
        assert!(doc.find_by_id("dev_7_p1").is_some());
    }

    #[test]
    fn rejects_non_svg_root() {
        let err = parse_document("<html><body/></html>").unwrap_err();
        assert!(matches!(err, FloorplanError::InvalidDocument { .. }));
    }

    #[test]
    fn rejects_unbalanced_tags() {
        assert!(parse_document("<svg><g></svg>").is_err());
        assert!(parse_document("<svg><g>").is_err());
        assert!(parse_document("").is_err());
        assert!(parse_document("just text").is_err());
    }

    #[test]
    fn unescape_entities() {
        assert_eq!(unescape("a &lt; b &amp;&amp; c"), "a < b && c");
        assert_eq!(unescape("&#65;&#x42;"), "AB");
        assert_eq!(unescape("&nbsp; & x"), "&nbsp; & x");
        assert!(matches!(unescape("plain"), Cow::Borrowed(_)));
    }
}
