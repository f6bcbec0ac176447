//! Mutable page document shared by every pipeline stage.

use crate::{Error, Result};
use kuchikiki::traits::TendrilSink;
use kuchikiki::{ElementData, NodeDataRef, NodeRef, ParseOpts};

/// An owned, mutable HTML tree.
///
/// Stages mutate the tree in place; nodes are moved between documents by
/// detaching and re-appending them, never copied.
#[derive(Clone, Debug)]
pub struct PageDocument {
    root: NodeRef,
}

impl PageDocument {
    /// Parse a full HTML document.
    ///
    /// Scripting is off while parsing so `<noscript>` content becomes
    /// elements that later stages can see and rewrite.
    pub fn parse(markup: &str) -> Self {
        let mut opts = ParseOpts::default();
        opts.tree_builder.scripting_enabled = false;
        Self {
            root: kuchikiki::parse_html_with_options(opts).one(markup),
        }
    }

    /// The empty shell every snapshot is rebuilt into.
    pub fn empty_shell() -> Self {
        Self::parse("<!DOCTYPE html><html><head></head><body></body></html>")
    }

    /// The document node
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn head(&self) -> Option<NodeRef> {
        self.first("head").map(|h| h.as_node().clone())
    }

    pub fn body(&self) -> Option<NodeRef> {
        self.first("body").map(|b| b.as_node().clone())
    }

    /// All elements matching `selector`, collected so callers may detach them.
    pub fn select_all(&self, selector: &str) -> Result<Vec<NodeRef>> {
        select_within(&self.root, selector)
    }

    /// First element matching `selector`, if any.
    pub fn select_first(&self, selector: &str) -> Result<Option<NodeRef>> {
        select_first_within(&self.root, selector)
    }

    // Only used with selectors known to be valid.
    fn first(&self, selector: &str) -> Option<NodeDataRef<ElementData>> {
        self.root.select_first(selector).ok()
    }

    /// Serialize without extra formatting.
    pub fn to_html(&self) -> String {
        self.root.to_string()
    }
}

/// Descendants of `scope` (inclusive) matching `selector`, in document order.
pub fn select_within(scope: &NodeRef, selector: &str) -> Result<Vec<NodeRef>> {
    let matches = scope
        .select(selector)
        .map_err(|_| Error::Config(format!("invalid selector: {}", selector)))?;
    Ok(matches.map(|m| m.as_node().clone()).collect())
}

pub fn select_first_within(scope: &NodeRef, selector: &str) -> Result<Option<NodeRef>> {
    let mut matches = scope
        .select(selector)
        .map_err(|_| Error::Config(format!("invalid selector: {}", selector)))?;
    Ok(matches.next().map(|m| m.as_node().clone()))
}

/// Create a detached element with the given attributes.
///
/// The element is stamped out by the HTML parser so it carries the proper
/// HTML namespace. `html`, `head` and `body` cannot be created this way.
pub fn create_element(tag: &str, attributes: &[(&str, &str)]) -> Result<NodeRef> {
    let scratch = kuchikiki::parse_html().one(format!("<{tag}></{tag}>"));
    let element = select_first_within(&scratch, tag)?
        .ok_or_else(|| Error::Config(format!("cannot create <{}> element", tag)))?;
    element.detach();
    for (name, value) in attributes {
        set_attr(&element, name, value);
    }
    Ok(element)
}

/// Local tag name of an element node.
pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|el| el.name.local.to_string())
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|el| el.attributes.borrow().get(name).map(str::to_string))
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().insert(name, value.to_string());
    }
}

/// Whitespace-separated tokens of the `class` attribute.
pub fn class_tokens(node: &NodeRef) -> Vec<String> {
    attr(node, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Put `replacement` where `target` is and drop `target` from the tree.
pub fn replace_node(target: &NodeRef, replacement: NodeRef) {
    target.insert_before(replacement);
    target.detach();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_element_sets_attributes() {
        let a = create_element("a", &[("href", "https://example.com"), ("target", "_blank")]).unwrap();
        assert_eq!(tag_name(&a).as_deref(), Some("a"));
        assert_eq!(attr(&a, "href").as_deref(), Some("https://example.com"));
        assert_eq!(attr(&a, "target").as_deref(), Some("_blank"));
        assert!(a.parent().is_none());
    }

    #[test]
    fn create_style_element() {
        let style = create_element("style", &[]).unwrap();
        style.append(NodeRef::new_text("p{margin:0}"));
        assert_eq!(style.to_string(), "<style>p{margin:0}</style>");
    }

    #[test]
    fn replace_node_keeps_position() {
        let doc = PageDocument::parse("<body><p id=a>1</p><p id=b>2</p><p id=c>3</p></body>");
        let b = doc.select_first("#b").unwrap().unwrap();
        replace_node(&b, create_element("hr", &[]).unwrap());
        let body = doc.body().unwrap();
        let tags: Vec<_> = body.children().filter_map(|n| tag_name(&n)).collect();
        assert_eq!(tags, vec!["p", "hr", "p"]);
    }

    #[test]
    fn class_tokens_split_on_whitespace() {
        let doc = PageDocument::parse(r#"<div class="  a  SearchForm b "></div>"#);
        let div = doc.select_first("div").unwrap().unwrap();
        assert_eq!(class_tokens(&div), vec!["a", "SearchForm", "b"]);
    }

    #[test]
    fn invalid_selector_is_config_error() {
        let doc = PageDocument::empty_shell();
        assert!(matches!(doc.select_all("div[["), Err(Error::Config(_))));
    }

    #[test]
    fn noscript_children_are_elements() {
        let doc = PageDocument::parse(
            r#"<body><noscript><img src="https://t.example/px.gif"></noscript></body>"#,
        );
        let img = doc.select_first("noscript > img").unwrap().expect("img inside noscript");
        assert_eq!(attr(&img, "src").as_deref(), Some("https://t.example/px.gif"));
    }

    #[test]
    fn empty_shell_has_head_and_body() {
        let doc = PageDocument::empty_shell();
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
    }
}
