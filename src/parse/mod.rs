//! Document import/export.
//!
//! Builds a [`Document`] tree from XHTML/HTML bytes and serializes one back
//! out. `iframe` elements become frame nodes (with no attached
//! sub-document; a parsed file cannot carry live frame content).
//!
//! Parsing is lenient where HTML commonly deviates from XML: end-tag name
//! checking is off and text outside the root element is dropped.

use crate::models::{Document, NodeId, NodeKind};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

/// Errors from document import.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed markup: {0}")]
    Malformed(String),

    #[error("document contains no root element")]
    NoRoot,
}

/// Parse XHTML/HTML bytes into a document tree.
pub fn parse_document(content: &[u8]) -> Result<Document, ParseError> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut buf = Vec::with_capacity(64);
    let mut doc: Option<Document> = None;
    let mut stack: Vec<NodeId> = Vec::with_capacity(8);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = decode_name(&reader, e.name().as_ref())?;
                let node = open_element(&reader, &mut doc, &stack, &tag, &e)?;
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                let tag = decode_name(&reader, e.name().as_ref())?;
                open_element(&reader, &mut doc, &stack, &tag, &e)?;
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .decode()
                    .map_err(|err| ParseError::Malformed(err.to_string()))?;
                append_text(&mut doc, &stack, text.as_ref());
            }
            Ok(Event::CData(e)) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|err| ParseError::Malformed(err.to_string()))?;
                append_text(&mut doc, &stack, text.as_ref());
            }
            Ok(Event::GeneralRef(e)) => {
                let name = e
                    .decode()
                    .map_err(|err| ParseError::Malformed(err.to_string()))?;
                match quick_xml::escape::unescape(&format!("&{name};")) {
                    Ok(resolved) => append_text(&mut doc, &stack, resolved.as_ref()),
                    Err(err) => {
                        // Unknown entity: keep going, content-shaped problems
                        // are not fatal.
                        tracing::debug!("Skipping unresolvable entity &{};: {}", name, err);
                    }
                }
            }
            Ok(Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(err) => return Err(ParseError::Malformed(err.to_string())),
        }
        buf.clear();
    }

    doc.ok_or(ParseError::NoRoot)
}

/// Create an element (or frame) node for a start/empty tag.
fn open_element(
    reader: &Reader<&[u8]>,
    doc: &mut Option<Document>,
    stack: &[NodeId],
    tag: &str,
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<NodeId, ParseError> {
    let node = match doc {
        None => {
            let document = Document::with_root(tag);
            let root = document.root();
            *doc = Some(document);
            root
        }
        Some(document) => {
            let parent = stack.last().copied().unwrap_or(document.root());
            if tag.eq_ignore_ascii_case("iframe") {
                document.append_frame(parent, None, false)
            } else {
                document.append_element(parent, tag)
            }
        }
    };

    let document = doc.as_mut().expect("document exists after open");
    for attr in e.attributes().flatten() {
        let key = decode_name(reader, attr.key.as_ref())?;
        let raw_value = reader
            .decoder()
            .decode(&attr.value)
            .map_err(|err| ParseError::Malformed(err.to_string()))?;
        let value = quick_xml::escape::unescape(raw_value.as_ref())
            .map_err(|err| ParseError::Malformed(err.to_string()))?;
        document.set_attr(node, &key, value.as_ref());
    }

    Ok(node)
}

/// Append text under the open element, merging into a preceding text
/// sibling so entity references don't fragment the node.
fn append_text(doc: &mut Option<Document>, stack: &[NodeId], text: &str) {
    let Some(document) = doc else {
        return; // text before the root element
    };
    let Some(parent) = stack.last().copied() else {
        return; // text after the root element closed
    };

    if let Some(last) = document.children(parent).last().copied() {
        if let Some(existing) = document.text(last) {
            let merged = format!("{existing}{text}");
            document.set_text(last, &merged);
            return;
        }
    }
    document.append_text(parent, text);
}

fn decode_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Result<String, ParseError> {
    reader
        .decoder()
        .decode(raw)
        .map(|name| name.into_owned())
        .map_err(|err| ParseError::Malformed(err.to_string()))
}

/// Serialize a document back to markup.
pub fn write_document(doc: &Document) -> String {
    let mut out = String::new();
    serialize_node(doc, doc.root(), &mut out);
    out
}

fn serialize_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Text(content) => {
            // Text only needs & < > escaped; quotes stay literal.
            out.push_str(quick_xml::escape::partial_escape(content.as_str()).as_ref());
        }
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (key, value) in &el.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(quick_xml::escape::escape(value.as_str()).as_ref());
                out.push('"');
            }

            if doc.children(node).is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in doc.children(node) {
                    serialize_node(doc, *child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
        NodeKind::Frame(_) => {
            if doc.children(node).is_empty() {
                out.push_str("<iframe/>");
            } else {
                out.push_str("<iframe>");
                for child in doc.children(node) {
                    serialize_node(doc, *child, out);
                }
                out.push_str("</iframe>");
            }
        }
    }
}
