//! Indented HTML serialization and the final file write.

use crate::document::PageDocument;
use crate::{Error, Result};
use kuchikiki::{ElementData, NodeData, NodeRef};
use log::info;
use std::path::{Path, PathBuf};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

// Raw text: children written unescaped
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script", "iframe", "noembed", "noframes", "xmp"];

// Whitespace-sensitive or short: kept on one line
const SINGLE_LINE_ELEMENTS: &[&str] = &["pre", "textarea", "title"];

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

fn open_tag(el: &ElementData) -> String {
    let mut tag = format!("<{}", el.name.local);
    for (name, attr) in el.attributes.borrow().map.iter() {
        tag.push(' ');
        if let Some(prefix) = &attr.prefix {
            tag.push_str(prefix);
            tag.push(':');
        }
        tag.push_str(&name.local);
        tag.push_str("=\"");
        tag.push_str(&escape_attr(&attr.value));
        tag.push('"');
    }
    tag.push('>');
    tag
}

fn is_html(el: &ElementData) -> bool {
    &*el.name.ns == HTML_NS
}

struct Pretty {
    out: String,
}

impl Pretty {
    fn line(&mut self, depth: usize, content: &str) {
        for _ in 0..depth {
            self.out.push(' ');
        }
        self.out.push_str(content);
        self.out.push('\n');
    }

    fn node(&mut self, node: &NodeRef, depth: usize) {
        match node.data() {
            NodeData::Document(_) | NodeData::DocumentFragment => {
                for child in node.children() {
                    self.node(&child, depth);
                }
            }
            NodeData::Doctype(doctype) => {
                self.line(depth, &format!("<!DOCTYPE {}>", doctype.name));
            }
            NodeData::Comment(comment) => {
                self.line(depth, &format!("<!--{}-->", comment.borrow()));
            }
            NodeData::Text(text) => {
                let text = text.borrow();
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.line(depth, &escape_text(trimmed));
                }
            }
            NodeData::ProcessingInstruction(_) => {}
            NodeData::Element(el) => self.element(node, el, depth),
        }
    }

    fn element(&mut self, node: &NodeRef, el: &ElementData, depth: usize) {
        let name: &str = &el.name.local;
        let open = open_tag(el);
        let close = format!("</{}>", name);

        if is_html(el) && VOID_ELEMENTS.contains(&name) {
            self.line(depth, &open);
            return;
        }

        if is_html(el) && RAW_TEXT_ELEMENTS.contains(&name) {
            let inner: String = node
                .children()
                .filter_map(|c| c.as_text().map(|t| t.borrow().clone()))
                .collect();
            self.line(depth, &format!("{}{}{}", open, inner, close));
            return;
        }

        if is_html(el) && SINGLE_LINE_ELEMENTS.contains(&name) {
            let inner: String = node.children().map(|c| c.to_string()).collect();
            self.line(depth, &format!("{}{}{}", open, inner, close));
            return;
        }

        if node.first_child().is_none() {
            self.line(depth, &format!("{}{}", open, close));
            return;
        }

        self.line(depth, &open);
        for child in node.children() {
            self.node(&child, depth + 1);
        }
        self.line(depth, &close);
    }
}

/// Serialize `doc` with one node per line, indented one space per level.
pub fn to_pretty_html(doc: &PageDocument) -> String {
    let mut pretty = Pretty { out: String::new() };
    pretty.node(doc.root(), 0);
    pretty.out
}

/// Write `doc` to `path` as UTF-8 and return the path.
///
/// The markup is fully serialized before the file is opened.
pub fn write_document(doc: &PageDocument, path: &Path) -> Result<PathBuf> {
    let html = to_pretty_html(doc);
    std::fs::write(path, html.as_bytes()).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("\u{2713} Job posting saved to: {}", path.display());
    Ok(path.to_path_buf())
}
