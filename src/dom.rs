//! HTML parser – converts an HTML string into a simple DOM tree.
//!
//! We support the subset of elements a markdown renderer emits plus the
//! document shell around it:
//! - Shell: html, head, body, title, meta, link, style
//! - Blocks: div, p, h1-h6, ul, ol, li, table, thead, tbody, tr, td, th,
//!   pre, blockquote, hr, img
//! - Inline: span, a, strong, b, em, i, code, del, br
//!
//! Void elements never take children, and the contents of `<style>`,
//! `<title>` and `<script>` are read as raw text.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Title,
    Meta,
    Link,
    Style,
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Table,
    Thead,
    Tbody,
    Tr,
    Td,
    Th,
    Pre,
    Blockquote,
    Hr,
    Img,
    Br,
    Span,
    A,
    Strong,
    B,
    Em,
    I,
    Code,
    Del,
    /// Catch-all for unknown tags – kept, but not rendered.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            "link" => Tag::Link,
            "style" => Tag::Style,
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" => Tag::Tbody,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "pre" => Tag::Pre,
            "blockquote" => Tag::Blockquote,
            "hr" => Tag::Hr,
            "img" => Tag::Img,
            "br" => Tag::Br,
            "span" => Tag::Span,
            "a" => Tag::A,
            "strong" => Tag::Strong,
            "b" => Tag::B,
            "em" => Tag::Em,
            "i" => Tag::I,
            "code" => Tag::Code,
            "del" | "s" => Tag::Del,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Lower-case tag name, as matched by CSS type selectors.
    pub fn name(&self) -> &str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Body => "body",
            Tag::Title => "title",
            Tag::Meta => "meta",
            Tag::Link => "link",
            Tag::Style => "style",
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Pre => "pre",
            Tag::Blockquote => "blockquote",
            Tag::Hr => "hr",
            Tag::Img => "img",
            Tag::Br => "br",
            Tag::Span => "span",
            Tag::A => "a",
            Tag::Strong => "strong",
            Tag::B => "b",
            Tag::Em => "em",
            Tag::I => "i",
            Tag::Code => "code",
            Tag::Del => "del",
            Tag::Unknown(name) => name,
        }
    }

    /// Elements that never have children or a closing tag.
    fn is_void(&self) -> bool {
        match self {
            Tag::Meta | Tag::Link | Tag::Br | Tag::Hr | Tag::Img => true,
            Tag::Unknown(name) => matches!(name.as_str(), "input" | "source" | "wbr" | "col"),
            _ => false,
        }
    }

    /// Elements whose content is raw text up to the matching end tag.
    fn is_raw_text(&self) -> bool {
        match self {
            Tag::Style | Tag::Title => true,
            Tag::Unknown(name) => name == "script",
            _ => false,
        }
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attributes.get("style").map(|s| s.as_str())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }

    /// The `dir` attribute, lower-cased.
    pub fn dir(&self) -> Option<String> {
        self.attributes.get("dir").map(|d| d.trim().to_ascii_lowercase())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
///
/// The parser is tolerant: stray end tags at the top level are skipped and
/// unterminated elements are closed at end of input.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    let mut nodes = Vec::new();
    loop {
        nodes.extend(parser.parse_nodes());
        if parser.eof() {
            break;
        }
        // A closing tag nobody opened.
        parser.skip_end_tag();
    }
    nodes
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            if let Some(ws) = self.skip_block_whitespace() {
                nodes.push(DomNode::Text(ws));
            }
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_comment();
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            // Skip doctype / processing instructions
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") && self.peek_is_tag_start() {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        // A lone '<' that does not open a tag is literal text.
        if self.starts_with("<") {
            self.advance(1);
        }
        while !self.eof() && !self.starts_with("<") {
            self.advance(1);
        }
        let text = &self.input[start..self.pos];
        DomNode::Text(decode_entities(text))
    }

    fn parse_element(&mut self) -> DomNode {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_tag_name();
        let tag = Tag::from_name(&tag_name);
        let mut elem = ElementNode::new(tag.clone());

        // Parse attributes
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            if key.is_empty() {
                // Garbage inside the tag – drop one char and carry on.
                self.advance(1);
                continue;
            }
            elem.attributes.insert(key.to_ascii_lowercase(), value);
        }

        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if tag.is_void() {
            return DomNode::Element(elem);
        }

        if tag.is_raw_text() {
            let raw = self.read_raw_text(&tag_name);
            let text = if tag == Tag::Style { raw } else { decode_entities(&raw) };
            elem.children.push(DomNode::Text(text));
            return DomNode::Element(elem);
        }

        // Parse children
        elem.children = self.parse_nodes();

        // Consume closing tag
        if self.starts_with("</") {
            self.skip_end_tag();
        }

        DomNode::Element(elem)
    }

    /// Read everything up to `</name` (case-insensitive) and consume the end tag.
    fn read_raw_text(&mut self, name: &str) -> String {
        let rest = &self.input[self.pos..];
        let needle = format!("</{}", name.to_ascii_lowercase());
        let end = rest.to_ascii_lowercase().find(&needle).unwrap_or(rest.len());
        let raw = rest[..end].to_string();
        self.pos += end;
        if !self.eof() {
            self.skip_end_tag();
        }
        raw
    }

    fn skip_end_tag(&mut self) {
        self.advance(2);
        self.parse_tag_name();
        self.skip_past(">");
    }

    fn peek_is_tag_start(&self) -> bool {
        self.input[self.pos..]
            .chars()
            .nth(1)
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false)
    }

    fn parse_tag_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_tag_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance(1);
                }
                let val = self.input[start..self.pos].to_string();
                if !self.eof() {
                    self.advance(1);
                }
                return decode_entities(&val);
            }
        }
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance(1);
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance(1);
        }
    }

    /// Skip a whitespace-only run that sits between two tags.
    ///
    /// Runs containing a newline are formatting between block elements and
    /// are dropped. A run without a newline separates inline siblings
    /// (`<b>a</b> <i>b</i>`) and is returned so the caller keeps it.
    fn skip_block_whitespace(&mut self) -> Option<String> {
        let saved = self.pos;
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance(1);
        }
        if self.pos == saved {
            return None;
        }
        // If we reached text, this whitespace belongs to that text node.
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
            return None;
        }
        let run = &self.input[saved..self.pos];
        if run.contains('\n') || self.eof() {
            None
        } else {
            Some(run.to_string())
        }
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        self.skip_past("-->");
    }

    /// Advance past the next occurrence of `pat`, or to end of input.
    fn skip_past(&mut self, pat: &str) {
        match self.input[self.pos..].find(pat) {
            Some(i) => self.pos += i + pat.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.current_char() {
                self.pos += c.len_utf8();
            }
        }
    }
}

/// Decode the named entities a markdown renderer emits plus numeric
/// character references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let name = &after[..semi];
            let c = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{00A0}'),
                _ => {
                    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                    } else if let Some(dec) = name.strip_prefix('#') {
                        dec.parse::<u32>().ok().and_then(char::from_u32)
                    } else {
                        None
                    }
                }
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Find the first element with the given tag anywhere in the tree.
pub fn find_element<'a>(nodes: &'a [DomNode], tag: &Tag) -> Option<&'a ElementNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == *tag {
                return Some(e);
            }
            if let Some(found) = find_element(&e.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    if let Some(body) = find_element(nodes, &Tag::Body) {
        return body.children.clone();
    }
    let mut out = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) if e.tag == Tag::Html => out.extend(body_children(&e.children)),
            DomNode::Element(e) if e.tag == Tag::Head => {}
            other => out.push(other.clone()),
        }
    }
    out
}

/// Concatenate the contents of every `<style>` element in document order.
pub fn collect_stylesheets(nodes: &[DomNode]) -> String {
    let mut css = String::new();
    collect_style_text(nodes, &mut css);
    css
}

fn collect_style_text(nodes: &[DomNode], css: &mut String) {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Style {
                css.push_str(&e.text_content());
                css.push('\n');
            } else {
                collect_style_text(&e.children, css);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_div() {
        let html = r#"<div class="note wide"><p>Hello</p></div>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(e) = &nodes[0] {
            assert_eq!(e.tag, Tag::Div);
            assert_eq!(e.classes(), vec!["note", "wide"]);
            assert_eq!(e.children.len(), 1);
        } else {
            panic!("Expected element");
        }
    }

    #[test]
    fn parse_self_closing_img() {
        let html = r#"<img src="logo.png" />"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(e) = &nodes[0] {
            assert_eq!(e.tag, Tag::Img);
            assert_eq!(e.src(), Some("logo.png"));
        } else {
            panic!("Expected img element");
        }
    }

    #[test]
    fn void_meta_does_not_swallow_siblings() {
        let html = r#"<head><meta charset="UTF-8"><title>T</title></head>"#;
        let nodes = parse_html(html);
        let head = find_element(&nodes, &Tag::Head).unwrap();
        assert_eq!(head.children.len(), 2);
    }

    #[test]
    fn parse_nested_spans() {
        let html = r#"<p>Hello <strong>world</strong>!</p>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(e) = &nodes[0] {
            assert_eq!(e.tag, Tag::P);
            assert_eq!(e.children.len(), 3); // "Hello ", <strong>, "!"
        } else {
            panic!("Expected p element");
        }
    }

    #[test]
    fn space_between_inline_siblings_is_kept() {
        let nodes = parse_html("<p><b>a</b> <i>b</i></p>");
        if let DomNode::Element(p) = &nodes[0] {
            assert_eq!(p.text_content(), "a b");
        } else {
            panic!("Expected p element");
        }
    }

    #[test]
    fn parse_table_with_sections() {
        let html = "<table>\n<thead>\n<tr>\n<th>Name</th>\n</tr>\n</thead>\n<tbody>\n<tr>\n<td>Alice</td>\n</tr>\n</tbody>\n</table>";
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(table) = &nodes[0] {
            assert_eq!(table.tag, Tag::Table);
            assert_eq!(table.children.len(), 2);
        } else {
            panic!("Expected table");
        }
    }

    #[test]
    fn style_content_is_raw() {
        let html = "<style>a > b { content: \"<x>\"; }</style><p>after</p>";
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 2);
        assert!(collect_stylesheets(&nodes).contains("content: \"<x>\""));
    }

    #[test]
    fn dir_attribute_is_exposed() {
        let nodes = parse_html(r#"<p dir="RTL">שלום</p>"#);
        if let DomNode::Element(p) = &nodes[0] {
            assert_eq!(p.dir().as_deref(), Some("rtl"));
        } else {
            panic!("Expected p element");
        }
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#1513;&#x5DC;"), "של");
        assert_eq!(decode_entities("AT&T; x"), "AT&T; x");
    }

    #[test]
    fn stray_end_tag_does_not_truncate() {
        let nodes = parse_html("</div><p>kept</p>");
        assert!(find_element(&nodes, &Tag::P).is_some());
    }

    #[test]
    fn body_children_skips_shell() {
        let html = "<!DOCTYPE html><html><head><title>x</title></head><body><p>a</p><p>b</p></body></html>";
        let nodes = parse_html(html);
        assert_eq!(body_children(&nodes).len(), 2);
    }
}
