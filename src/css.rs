//! Stylesheet parser – the CSS subset the print stylesheet is written in.
//!
//! Supported:
//! - style rules with selector lists; type, `*`, `.class`, `#id`,
//!   `[attr]` / `[attr="value"]`, `:first-child`, `:last-child`,
//!   `:first-of-type`, `:nth-child(even|odd|N)`, descendant and child
//!   combinators
//! - `@page` / `@page :first` with `size`, `margin` and the six
//!   top/bottom margin boxes
//!
//! Selectors using anything else (pseudo-elements, sibling combinators,
//! dynamic pseudo-classes) are dropped, as are other at-rules.
//!
//! `cssparser` tokenises the text into statements and nested blocks; the
//! selector and `@page` semantics are interpreted here.

use std::collections::HashMap;

use cssparser::{Delimiter, ParseError, Parser, ParserInput, ToCss, Token};

use crate::style::{BorderSide, Color, TextAlign};

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// A style rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub page: PageRules,
}

/// Everything a selector can be matched against for one element.
#[derive(Debug, Clone, Default)]
pub struct ElementInfo {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    /// 1-based position among element siblings.
    pub index: usize,
    pub last_child: bool,
    pub first_of_type: bool,
}

impl ElementInfo {
    fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq)]
enum Nth {
    Even,
    Odd,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Pseudo {
    FirstChild,
    LastChild,
    FirstOfType,
    NthChild(Nth),
}

#[derive(Debug, Clone, PartialEq)]
struct AttrSelector {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    pseudos: Vec<Pseudo>,
}

impl Compound {
    fn matches(&self, el: &ElementInfo) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != el.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        let attrs_ok = self.attrs.iter().all(|a| match (&a.value, el.attributes.get(&a.name)) {
            (None, found) => found.is_some(),
            (Some(want), Some(got)) => want.eq_ignore_ascii_case(got.trim()),
            (Some(_), None) => false,
        });
        if !attrs_ok {
            return false;
        }
        self.pseudos.iter().all(|p| match p {
            Pseudo::FirstChild => el.index == 1,
            Pseudo::LastChild => el.last_child,
            Pseudo::FirstOfType => el.first_of_type,
            Pseudo::NthChild(Nth::Even) => el.index % 2 == 0,
            Pseudo::NthChild(Nth::Odd) => el.index % 2 == 1,
            Pseudo::NthChild(Nth::Index(n)) => el.index == *n,
        })
    }

    fn specificity(&self) -> (u32, u32, u32) {
        (
            self.id.is_some() as u32,
            (self.classes.len() + self.attrs.len() + self.pseudos.len()) as u32,
            self.tag.is_some() as u32,
        )
    }
}

/// A complex selector: compounds joined by combinators.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` to `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

impl Selector {
    /// Parse a single complex selector; `None` if it uses unsupported syntax.
    pub fn parse(text: &str) -> Option<Self> {
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut pending: Option<Combinator> = None;

        for token in tokenize_selector(text)? {
            match token.as_str() {
                ">" => {
                    if compounds.is_empty() || pending == Some(Combinator::Child) {
                        return None;
                    }
                    pending = Some(Combinator::Child);
                }
                _ => {
                    let compound = parse_compound(&token)?;
                    if !compounds.is_empty() {
                        combinators.push(pending.take().unwrap_or(Combinator::Descendant));
                    }
                    compounds.push(compound);
                }
            }
        }
        if compounds.is_empty() || pending.is_some() {
            return None;
        }
        Some(Self {
            compounds,
            combinators,
        })
    }

    pub fn specificity(&self) -> (u32, u32, u32) {
        self.compounds.iter().fold((0, 0, 0), |acc, c| {
            let s = c.specificity();
            (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
        })
    }

    /// Match against `subject`, whose ancestors are listed root first.
    pub fn matches(&self, subject: &ElementInfo, ancestors: &[ElementInfo]) -> bool {
        let last = self.compounds.len() - 1;
        self.compounds[last].matches(subject) && self.match_ancestors(last, ancestors)
    }

    fn match_ancestors(&self, i: usize, ancestors: &[ElementInfo]) -> bool {
        if i == 0 {
            return true;
        }
        let want = &self.compounds[i - 1];
        match self.combinators[i - 1] {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, rest)) => want.matches(parent) && self.match_ancestors(i - 1, rest),
                None => false,
            },
            Combinator::Descendant => (0..ancestors.len()).rev().any(|k| {
                want.matches(&ancestors[k]) && self.match_ancestors(i - 1, &ancestors[..k])
            }),
        }
    }
}

/// Split a selector into compound tokens and `>` combinators.
fn tokenize_selector(text: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    for c in text.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                bracket_depth += 1;
                current.push(c);
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(c);
            }
            '(' => {
                paren_depth += 1;
                current.push(c);
            }
            ')' => {
                paren_depth = paren_depth.saturating_sub(1);
                current.push(c);
            }
            '+' | '~' if bracket_depth == 0 && paren_depth == 0 => return None,
            '>' if bracket_depth == 0 && paren_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            }
            c if c.is_whitespace() && bracket_depth == 0 && paren_depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if quote.is_some() || bracket_depth != 0 || paren_depth != 0 {
        return None;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Some(tokens)
}

fn parse_compound(text: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && (chars[*i].is_alphanumeric() || chars[*i] == '-' || chars[*i] == '_') {
            *i += 1;
        }
        chars[start..*i].iter().collect::<String>()
    };

    if i < chars.len() && chars[i] == '*' {
        i += 1;
    } else if i < chars.len() && chars[i].is_alphabetic() {
        compound.tag = Some(read_ident(&mut i).to_ascii_lowercase());
    }

    while i < chars.len() {
        match chars[i] {
            '.' => {
                i += 1;
                let class = read_ident(&mut i);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
            }
            '#' => {
                i += 1;
                let id = read_ident(&mut i);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
            }
            '[' => {
                let close = chars[i..].iter().position(|&c| c == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attr_selector(&inner)?);
                i = close + 1;
            }
            ':' => {
                i += 1;
                if i < chars.len() && chars[i] == ':' {
                    return None; // pseudo-element
                }
                let name = read_ident(&mut i).to_ascii_lowercase();
                let pseudo = match name.as_str() {
                    "first-child" => Pseudo::FirstChild,
                    "last-child" => Pseudo::LastChild,
                    "first-of-type" => Pseudo::FirstOfType,
                    "nth-child" => {
                        if i >= chars.len() || chars[i] != '(' {
                            return None;
                        }
                        let close = chars[i..].iter().position(|&c| c == ')')? + i;
                        let arg: String = chars[i + 1..close].iter().collect();
                        i = close + 1;
                        Pseudo::NthChild(parse_nth(&arg)?)
                    }
                    _ => return None,
                };
                compound.pseudos.push(pseudo);
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn parse_attr_selector(inner: &str) -> Option<AttrSelector> {
    match inner.split_once('=') {
        None => {
            let name = inner.trim().to_ascii_lowercase();
            (!name.is_empty()).then_some(AttrSelector { name, value: None })
        }
        Some((name, value)) => {
            let name = name.trim();
            // Only exact match (`=`), not `~=`, `^=`, ...
            if name.is_empty() || name.ends_with(|c: char| "~|^$*".contains(c)) {
                return None;
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Some(AttrSelector {
                name: name.to_ascii_lowercase(),
                value: Some(value.to_string()),
            })
        }
    }
}

fn parse_nth(arg: &str) -> Option<Nth> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "even" | "2n" => Some(Nth::Even),
        "odd" | "2n+1" => Some(Nth::Odd),
        n => n.parse::<usize>().ok().filter(|&n| n > 0).map(Nth::Index),
    }
}

// ---------------------------------------------------------------------------
// @page
// ---------------------------------------------------------------------------

/// Declarations of one `@page` rule and its margin boxes.
#[derive(Debug, Clone, Default)]
pub struct PageStyle {
    pub declarations: Vec<Declaration>,
    pub margin_boxes: HashMap<String, Vec<Declaration>>,
}

impl PageStyle {
    fn merge(&mut self, other: PageStyle) {
        self.declarations.extend(other.declarations);
        for (name, decls) in other.margin_boxes {
            self.margin_boxes.entry(name).or_default().extend(decls);
        }
    }
}

/// All `@page` rules of a stylesheet.
#[derive(Debug, Clone, Default)]
pub struct PageRules {
    /// `@page { ... }`
    pub all: PageStyle,
    /// `@page :first { ... }`
    pub first: PageStyle,
}

/// Where a margin box sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarginBoxPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl MarginBoxPosition {
    pub const ALL: [MarginBoxPosition; 6] = [
        MarginBoxPosition::TopLeft,
        MarginBoxPosition::TopCenter,
        MarginBoxPosition::TopRight,
        MarginBoxPosition::BottomLeft,
        MarginBoxPosition::BottomCenter,
        MarginBoxPosition::BottomRight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MarginBoxPosition::TopLeft => "top-left",
            MarginBoxPosition::TopCenter => "top-center",
            MarginBoxPosition::TopRight => "top-right",
            MarginBoxPosition::BottomLeft => "bottom-left",
            MarginBoxPosition::BottomCenter => "bottom-center",
            MarginBoxPosition::BottomRight => "bottom-right",
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(
            self,
            MarginBoxPosition::TopLeft | MarginBoxPosition::TopCenter | MarginBoxPosition::TopRight
        )
    }

    pub fn align(&self) -> TextAlign {
        match self {
            MarginBoxPosition::TopLeft | MarginBoxPosition::BottomLeft => TextAlign::Left,
            MarginBoxPosition::TopCenter | MarginBoxPosition::BottomCenter => TextAlign::Center,
            MarginBoxPosition::TopRight | MarginBoxPosition::BottomRight => TextAlign::Right,
        }
    }
}

/// One piece of a `content` value.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    Text(String),
    PageNumber,
    PageCount,
}

/// A resolved running header/footer box.
#[derive(Debug, Clone)]
pub struct MarginBox {
    pub position: MarginBoxPosition,
    pub content: Vec<ContentItem>,
    pub font_size: f32,
    pub color: Color,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub border_top: Option<BorderSide>,
    pub border_bottom: Option<BorderSide>,
}

impl MarginBox {
    /// The box text for `page` (1-based) of `pages`.
    pub fn resolve(&self, page: usize, pages: usize) -> String {
        self.content
            .iter()
            .map(|item| match item {
                ContentItem::Text(t) => t.clone(),
                ContentItem::PageNumber => page.to_string(),
                ContentItem::PageCount => pages.to_string(),
            })
            .collect()
    }

    fn from_declarations(position: MarginBoxPosition, decls: &[Declaration]) -> Option<Self> {
        let mut mbox = MarginBox {
            position,
            content: Vec::new(),
            font_size: 9.0,
            color: Color::BLACK,
            padding_top: 0.0,
            padding_bottom: 0.0,
            border_top: None,
            border_bottom: None,
        };
        // font-size first so em-based lengths resolve against it.
        for d in decls.iter().filter(|d| d.property == "font-size") {
            if let Some(size) = parse_length(&d.value, mbox.font_size) {
                mbox.font_size = size;
            }
        }
        for d in decls {
            let v = d.value.as_str();
            match d.property.as_str() {
                "content" => mbox.content = parse_content(v),
                "color" => {
                    if let Some(c) = Color::parse(v) {
                        mbox.color = c;
                    }
                }
                "padding-top" => mbox.padding_top = parse_length(v, mbox.font_size).unwrap_or(0.0),
                "padding-bottom" => {
                    mbox.padding_bottom = parse_length(v, mbox.font_size).unwrap_or(0.0)
                }
                "border-top" => mbox.border_top = BorderSide::parse(v, mbox.font_size),
                "border-bottom" => mbox.border_bottom = BorderSide::parse(v, mbox.font_size),
                _ => {}
            }
        }
        (!mbox.content.is_empty()).then_some(mbox)
    }
}

impl PageRules {
    fn effective(&self, page_index: usize) -> PageStyle {
        let mut style = self.all.clone();
        if page_index == 0 {
            style.merge(self.first.clone());
        }
        style
    }

    /// Page size in points from the `size` descriptor.
    pub fn size(&self) -> Option<(f32, f32)> {
        last_value(&self.all.declarations, "size").and_then(parse_page_size)
    }

    /// Page margins in points as `[top, right, bottom, left]`.
    pub fn margins(&self) -> Option<[f32; 4]> {
        let mut margins = last_value(&self.all.declarations, "margin")
            .and_then(|v| parse_box_shorthand(v, 12.0));
        for (i, side) in ["margin-top", "margin-right", "margin-bottom", "margin-left"]
            .iter()
            .enumerate()
        {
            if let Some(v) = last_value(&self.all.declarations, side).and_then(|v| parse_length(v, 12.0)) {
                margins.get_or_insert([0.0; 4])[i] = v;
            }
        }
        margins
    }

    /// Margin boxes with content for the page at `page_index` (0-based).
    pub fn margin_boxes(&self, page_index: usize) -> Vec<MarginBox> {
        let style = self.effective(page_index);
        MarginBoxPosition::ALL
            .iter()
            .filter_map(|pos| {
                style
                    .margin_boxes
                    .get(pos.name())
                    .and_then(|decls| MarginBox::from_declarations(*pos, decls))
            })
            .collect()
    }
}

fn last_value<'a>(decls: &'a [Declaration], property: &str) -> Option<&'a str> {
    decls
        .iter()
        .rev()
        .find(|d| d.property == property)
        .map(|d| d.value.as_str())
}

/// Parse a `content` value into text and page counters. `none`/`normal`
/// yield an empty list.
pub fn parse_content(value: &str) -> Vec<ContentItem> {
    let mut items = Vec::new();
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '"' || c == '\'' {
            let mut text = String::new();
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    i += 1;
                    match chars[i] {
                        'A' | 'a' => {
                            text.push('\n');
                            // A single space terminates a CSS hex escape.
                            if chars.get(i + 1) == Some(&' ') {
                                i += 1;
                            }
                        }
                        other => text.push(other),
                    }
                } else {
                    text.push(chars[i]);
                }
                i += 1;
            }
            i += 1;
            items.push(ContentItem::Text(text));
        } else if value[char_offset(&chars, i)..].starts_with("counter(") {
            let rest: String = chars[i..].iter().collect();
            let close = rest.find(')').unwrap_or(rest.len());
            match rest["counter(".len()..close].trim() {
                "page" => items.push(ContentItem::PageNumber),
                "pages" => items.push(ContentItem::PageCount),
                _ => {}
            }
            i += rest[..close.min(rest.len())].chars().count() + 1;
        } else {
            i += 1;
        }
    }
    items
}

fn char_offset(chars: &[char], i: usize) -> usize {
    chars[..i].iter().map(|c| c.len_utf8()).sum()
}

/// Parse a page `size` value into `(width, height)` points.
pub fn parse_page_size(value: &str) -> Option<(f32, f32)> {
    let lower = value.trim().to_ascii_lowercase();
    let mut words: Vec<&str> = lower.split_whitespace().collect();
    let landscape = words.contains(&"landscape");
    words.retain(|w| *w != "landscape" && *w != "portrait");

    let (w, h) = match words.as_slice() {
        ["a3"] => (841.89, 1190.55),
        ["a4"] => (595.28, 841.89),
        ["a5"] => (419.53, 595.28),
        ["letter"] => (612.0, 792.0),
        ["legal"] => (612.0, 1008.0),
        [side] => {
            let s = parse_length(side, 12.0)?;
            (s, s)
        }
        [w, h] => (parse_length(w, 12.0)?, parse_length(h, 12.0)?),
        _ => return None,
    };
    Some(if landscape { (h.max(w), h.min(w)) } else { (w, h) })
}

/// Parse a CSS length into points. Unitless numbers are taken as px.
/// Percentages are context-dependent and return `None`.
pub fn parse_length(value: &str, font_size: f32) -> Option<f32> {
    let v = value.trim().to_ascii_lowercase();
    if v == "0" {
        return Some(0.0);
    }
    let units: [(&str, f32); 8] = [
        ("rem", 12.0),
        ("em", font_size),
        ("pt", 1.0),
        ("px", 0.75),
        ("cm", 28.346_457),
        ("mm", 2.834_645_7),
        ("in", 72.0),
        ("pc", 12.0),
    ];
    for (suffix, factor) in units {
        if let Some(num) = v.strip_suffix(suffix) {
            return num.trim().parse::<f32>().ok().map(|n| n * factor);
        }
    }
    if v.ends_with('%') {
        return None;
    }
    v.parse::<f32>().ok().map(|n| n * 0.75)
}

/// Parse a 1–4 value box shorthand (`margin`, `padding`) into
/// `[top, right, bottom, left]`. `auto` counts as zero.
pub fn parse_box_shorthand(value: &str, font_size: f32) -> Option<[f32; 4]> {
    let parts: Vec<f32> = value
        .split_whitespace()
        .map(|p| if p == "auto" { Some(0.0) } else { parse_length(p, font_size) })
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [a] => Some([*a, *a, *a, *a]),
        [v, h] => Some([*v, *h, *v, *h]),
        [t, h, b] => Some([*t, *h, *b, *h]),
        [t, r, b, l] => Some([*t, *r, *b, *l]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Stylesheet parsing
// ---------------------------------------------------------------------------

impl Stylesheet {
    /// Parse stylesheet text. Never fails; malformed parts are skipped.
    pub fn parse(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut sheet = Stylesheet::default();

        for item in parse_items(&mut parser) {
            let Item::Block { prelude, body } = item else {
                continue; // `@import ...;` and similar statements
            };
            if let Some(page_selector) = prelude.strip_prefix("@page") {
                let page = page_style(&body);
                match page_selector.trim() {
                    "" => sheet.page.all.merge(page),
                    ":first" => sheet.page.first.merge(page),
                    other => log::debug!("Ignoring @page {other} rule"),
                }
            } else if prelude.starts_with('@') {
                log::debug!("Ignoring at-rule {prelude}");
            } else {
                let selectors: Vec<Selector> =
                    prelude.split(',').filter_map(Selector::parse).collect();
                if selectors.is_empty() {
                    log::debug!("Dropping rule with unsupported selector '{prelude}'");
                    continue;
                }
                sheet.rules.push(Rule {
                    selectors,
                    declarations: declarations(&body),
                });
            }
        }
        log::debug!(
            "Parsed stylesheet: {} rules, {} @page margin boxes",
            sheet.rules.len(),
            sheet.page.all.margin_boxes.len()
        );
        sheet
    }

    /// Declarations matching the element, lowest precedence first.
    pub fn matching_declarations(
        &self,
        subject: &ElementInfo,
        ancestors: &[ElementInfo],
    ) -> Vec<&Declaration> {
        let mut matched: Vec<((u32, u32, u32), usize, &Rule)> = Vec::new();
        for (order, rule) in self.rules.iter().enumerate() {
            let best = rule
                .selectors
                .iter()
                .filter(|s| s.matches(subject, ancestors))
                .map(Selector::specificity)
                .max();
            if let Some(spec) = best {
                matched.push((spec, order, rule));
            }
        }
        // Stable sort keeps source order within equal specificity.
        matched.sort_by_key(|(spec, order, _)| (*spec, *order));
        matched
            .into_iter()
            .flat_map(|(_, _, rule)| rule.declarations.iter())
            .collect()
    }
}

/// A statement or block at one nesting level of a stylesheet.
#[derive(Debug, Clone, PartialEq)]
enum Item {
    /// Text up to a `;`: a declaration, or an at-rule without a block.
    Statement(String),
    /// `prelude { body }`
    Block { prelude: String, body: Vec<Item> },
}

/// Split the tokens of one nesting level into statements and blocks.
fn parse_items<'i>(parser: &mut Parser<'i, '_>) -> Vec<Item> {
    let mut items = Vec::new();
    while !parser.is_exhausted() {
        let mut prelude = String::new();
        let _ = parser.parse_until_before(Delimiter::Semicolon | Delimiter::CurlyBracketBlock, |p| {
            serialize_tokens(p, &mut prelude);
            Ok::<_, ParseError<'i, ()>>(())
        });
        let prelude = prelude.trim().to_string();

        let opens_block = matches!(parser.next(), Ok(Token::CurlyBracketBlock));
        if opens_block {
            let body = parser
                .parse_nested_block(|p| Ok::<_, ParseError<'i, ()>>(parse_items(p)))
                .unwrap_or_default();
            items.push(Item::Block { prelude, body });
        } else if !prelude.is_empty() {
            items.push(Item::Statement(prelude));
        }
    }
    items
}

/// Write the remaining tokens back out as CSS text, comments dropped and
/// whitespace runs collapsed to one space.
fn serialize_tokens<'i>(parser: &mut Parser<'i, '_>, out: &mut String) {
    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let close = match &token {
            Token::WhiteSpace(_) => {
                out.push(' ');
                continue;
            }
            Token::Function(_) | Token::ParenthesisBlock => Some(')'),
            Token::SquareBracketBlock => Some(']'),
            Token::CurlyBracketBlock => Some('}'),
            _ => None,
        };
        out.push_str(&token.to_css_string());
        if let Some(close) = close {
            let _ = parser.parse_nested_block(|p| {
                serialize_tokens(p, out);
                Ok::<_, ParseError<'i, ()>>(())
            });
            out.push(close);
        }
    }
}

fn page_style(body: &[Item]) -> PageStyle {
    let mut style = PageStyle {
        declarations: declarations(body),
        ..PageStyle::default()
    };
    for item in body {
        if let Item::Block { prelude, body } = item {
            let name = prelude.trim_start_matches('@').to_ascii_lowercase();
            style
                .margin_boxes
                .entry(name)
                .or_default()
                .extend(declarations(body));
        }
    }
    style
}

fn declarations(items: &[Item]) -> Vec<Declaration> {
    items
        .iter()
        .filter_map(|item| match item {
            Item::Statement(text) => split_declaration(text),
            Item::Block { .. } => None,
        })
        .collect()
}

/// Parse a declaration block such as an inline `style` attribute.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(block);
    let mut parser = Parser::new(&mut input);
    declarations(&parse_items(&mut parser))
}

fn split_declaration(text: &str) -> Option<Declaration> {
    let (prop, value) = text.split_once(':')?;
    let property = prop.trim().to_ascii_lowercase();
    let value = value.trim();
    let value = value
        .strip_suffix("!important")
        .map(str::trim_end)
        .unwrap_or(value);
    if property.is_empty() || value.is_empty() {
        return None;
    }
    Some(Declaration {
        property,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(tag: &str, attrs: &[(&str, &str)], index: usize) -> ElementInfo {
        ElementInfo {
            tag: tag.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            index,
            last_child: false,
            first_of_type: index == 1,
        }
    }

    #[test]
    fn parses_rules_and_selector_lists() {
        let sheet = Stylesheet::parse("h1, h2 { color: #0f2cbd; } p { margin: 0.5em 0 }");
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].selectors.len(), 2);
        assert_eq!(
            sheet.rules[1].declarations,
            vec![Declaration {
                property: "margin".into(),
                value: "0.5em 0".into()
            }]
        );
    }

    #[test]
    fn attribute_selector_beats_type_selector() {
        let sheet = Stylesheet::parse(
            "[dir=\"rtl\"] { text-align: right; } td { text-align: left; }",
        );
        let td = info("td", &[("dir", "rtl")], 1);
        let decls = sheet.matching_declarations(&td, &[]);
        assert_eq!(decls.last().unwrap().value, "right");
    }

    #[test]
    fn first_of_type_and_nth_child() {
        let h1 = Selector::parse("h1:first-of-type").unwrap();
        assert!(h1.matches(&info("h1", &[], 1), &[]));
        let mut second = info("h1", &[], 3);
        second.first_of_type = false;
        assert!(!h1.matches(&second, &[]));

        let even = Selector::parse("tr:nth-child(even)").unwrap();
        assert!(even.matches(&info("tr", &[], 2), &[]));
        assert!(!even.matches(&info("tr", &[], 3), &[]));
    }

    #[test]
    fn descendant_and_child_combinators() {
        let pre = info("pre", &[], 1);
        let body = info("body", &[], 2);
        let code = info("code", &[], 1);
        let desc = Selector::parse("pre code").unwrap();
        assert!(desc.matches(&code, &[body.clone(), pre.clone()]));
        assert!(!desc.matches(&code, &[body.clone()]));

        let child = Selector::parse("body > code").unwrap();
        assert!(!child.matches(&code, &[body.clone(), pre]));
        assert!(child.matches(&code, &[body]));
    }

    #[test]
    fn unsupported_selectors_are_dropped() {
        assert!(Selector::parse("p::first-line").is_none());
        assert!(Selector::parse("h1 + p").is_none());
        assert!(Selector::parse("a:hover").is_none());
        let sheet = Stylesheet::parse("a:hover { color: red } p { color: blue }");
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn class_selector_specificity() {
        let s = Selector::parse("[dir=\"rtl\"], .rtl").is_none();
        assert!(s, "a list is not a single selector");
        assert_eq!(Selector::parse(".rtl").unwrap().specificity(), (0, 1, 0));
        assert_eq!(Selector::parse("pre code").unwrap().specificity(), (0, 0, 2));
    }

    #[test]
    fn page_rules_and_margin_boxes() {
        let css = r#"
            @page {
                size: A4;
                margin: 2cm 1.5cm;
                @top-center { content: "Guide; v2"; font-size: 9pt; color: #666; border-bottom: 1px solid #ddd; }
                @bottom-center { content: "Page " counter(page) " of " counter(pages); font-size: 9pt; }
            }
            @page :first { @top-center { content: none; } }
            body { font-size: 11pt; }
        "#;
        let sheet = Stylesheet::parse(css);
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.page.size(), Some((595.28, 841.89)));

        let m = sheet.page.margins().unwrap();
        assert!((m[0] - 56.69).abs() < 0.01);
        assert!((m[1] - 42.52).abs() < 0.01);

        let first = sheet.page.margin_boxes(0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].position, MarginBoxPosition::BottomCenter);
        assert_eq!(first[0].resolve(1, 3), "Page 1 of 3");

        let second = sheet.page.margin_boxes(1);
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].resolve(2, 3), "Guide; v2");
        assert!(second[0].border_bottom.is_some());
    }

    #[test]
    fn content_escapes() {
        assert_eq!(
            parse_content(r#""say \"hi\"""#),
            vec![ContentItem::Text("say \"hi\"".into())]
        );
        assert!(parse_content("none").is_empty());
    }

    #[test]
    fn lengths_convert_to_points() {
        assert_eq!(parse_length("11pt", 12.0), Some(11.0));
        assert_eq!(parse_length("8px", 12.0), Some(6.0));
        assert_eq!(parse_length("0.5em", 11.0), Some(5.5));
        assert!((parse_length("2cm", 12.0).unwrap() - 56.69).abs() < 0.01);
        assert_eq!(parse_length("100%", 12.0), None);
        assert_eq!(parse_length("0", 12.0), Some(0.0));
    }

    #[test]
    fn page_sizes() {
        assert_eq!(parse_page_size("A4 landscape"), Some((841.89, 595.28)));
        assert_eq!(parse_page_size("letter"), Some((612.0, 792.0)));
        assert!(parse_page_size("auto").is_none());
    }

    #[test]
    fn inline_declarations_keep_quoted_semicolons() {
        let decls = parse_declarations("content: \"a;b\"; margin: 0 auto;; color:red");
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[0].value, "\"a;b\"");
        assert_eq!(decls[1].value, "0 auto");
        assert_eq!(decls[2].value, "red");
    }

    #[test]
    fn other_at_rules_are_skipped_whole() {
        let sheet = Stylesheet::parse(
            "@import url(x.css); @media print { p { color: red } } h1 { color: blue }",
        );
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value, "blue");
    }

    #[test]
    fn comments_and_important() {
        let sheet = Stylesheet::parse("/* x { } */ p { color: red !important; }");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value, "red");
    }
}
