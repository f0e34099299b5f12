//! Style resolver – cascades user-agent defaults, the document stylesheet,
//! `dir` attributes and inline styles into a flat [`ComputedStyle`] struct
//! consumed by the layout engine.

use std::collections::{HashMap, HashSet};

use crate::css::{self, parse_declarations, parse_length, Declaration, ElementInfo, Stylesheet};
use crate::dom::{DomNode, ElementNode, Tag};
use crate::fonts;

/// Fully resolved style for a single element. Lengths are in points.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_top: Option<BorderSide>,
    pub border_right: Option<BorderSide>,
    pub border_bottom: Option<BorderSide>,
    pub border_left: Option<BorderSide>,

    // Typography (inherited)
    pub font_size: f32,
    pub font_weight: FontWeight,
    /// Generic family, see [`fonts::generic_family`].
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub direction: Direction,
    pub line_height: f32,
    pub font_style: FontStyle,
    pub white_space: WhiteSpace,
    pub text_decoration: TextDecoration,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_after_avoid: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_top: None,
            border_right: None,
            border_bottom: None,
            border_left: None,
            font_size: 12.0,
            font_weight: FontWeight::Normal,
            font_family: fonts::SANS.to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Start,
            direction: Direction::Ltr,
            line_height: 1.2,
            font_style: FontStyle::Normal,
            white_space: WhiteSpace::Normal,
            text_decoration: TextDecoration::None,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_after_avoid: false,
            page_break_inside_avoid: false,
        }
    }
}

impl ComputedStyle {
    /// A fresh style carrying only the inherited properties of `parent`.
    pub fn inherit_from(parent: Option<&ComputedStyle>) -> Self {
        let mut s = Self::default();
        if let Some(p) = parent {
            s.font_size = p.font_size;
            s.font_weight = p.font_weight;
            s.font_family = p.font_family.clone();
            s.color = p.color;
            s.text_align = p.text_align;
            s.direction = p.direction;
            s.line_height = p.line_height;
            s.font_style = p.font_style;
            s.white_space = p.white_space;
            // Decorations propagate to inline descendants.
            s.text_decoration = p.text_decoration;
        }
        s
    }

    /// Style of an anonymous text run inside `parent`: text properties only,
    /// no box.
    pub fn for_text(parent: &ComputedStyle) -> Self {
        let mut s = Self::inherit_from(Some(parent));
        s.display = Display::Inline;
        s
    }

    /// `left`/`right`/`center` after resolving `start` and `justify`
    /// against the direction.
    pub fn effective_align(&self) -> TextAlign {
        match self.text_align {
            TextAlign::Start | TextAlign::Justify => match self.direction {
                Direction::Ltr => TextAlign::Left,
                Direction::Rtl => TextAlign::Right,
            },
            other => other,
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.direction == Direction::Rtl
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }

    pub fn has_border(&self) -> bool {
        self.border_top.is_some()
            || self.border_right.is_some()
            || self.border_bottom.is_some()
            || self.border_left.is_some()
    }

    fn border_width(side: &Option<BorderSide>) -> f32 {
        side.map(|b| b.width).unwrap_or(0.0)
    }

    pub fn border_top_width(&self) -> f32 {
        Self::border_width(&self.border_top)
    }

    pub fn border_right_width(&self) -> f32 {
        Self::border_width(&self.border_right)
    }

    pub fn border_bottom_width(&self) -> f32 {
        Self::border_width(&self.border_bottom)
    }

    pub fn border_left_width(&self) -> f32 {
        Self::border_width(&self.border_left)
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    InlineBlock,
    ListItem,
    Table,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Left for LTR, right for RTL.
    Start,
    Left,
    Center,
    Right,
    /// Drawn start-aligned; lines are not stretched.
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    Normal,
    /// Keep line breaks and spaces (`<pre>`).
    Pre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
    LineThrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

/// One edge of a border box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSide {
    pub width: f32,
    pub color: Color,
}

impl BorderSide {
    /// Parse a `border` shorthand (`1px solid #ddd`). `None` for `none`,
    /// `hidden` or a zero width.
    pub fn parse(value: &str, font_size: f32) -> Option<Self> {
        // `medium` per CSS: 3px.
        let mut side = BorderSide {
            width: 2.25,
            color: Color::BLACK,
        };
        for token in value.split_whitespace() {
            match token {
                "none" | "hidden" => return None,
                "solid" | "dashed" | "dotted" | "double" | "groove" | "ridge" | "inset"
                | "outset" => {}
                "thin" => side.width = 0.75,
                "medium" => side.width = 2.25,
                "thick" => side.width = 3.75,
                t => {
                    if let Some(w) = parse_length(t, font_size) {
                        side.width = w;
                    } else if let Some(c) = Color::parse(t) {
                        side.color = c;
                    }
                }
            }
        }
        (side.width > 0.0).then_some(side)
    }
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Self::rgb(r, g, b))
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Self::rgb(r, g, b))
        } else {
            None
        }
    }

    /// Parse a CSS colour: hex, `rgb()`/`rgba()`, or a basic named colour.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        if v.starts_with('#') {
            return Self::from_hex(&v);
        }
        if let Some(args) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                return None;
            }
            let channel = |p: &str| p.parse::<f32>().ok().map(|n| n.clamp(0.0, 255.0) / 255.0);
            let alpha = match parts.get(3) {
                Some(a) => a.parse::<f32>().ok()?.clamp(0.0, 1.0),
                None => 1.0,
            };
            return Some(Self {
                r: channel(parts[0])?,
                g: channel(parts[1])?,
                b: channel(parts[2])?,
                a: alpha,
            });
        }
        let named = match v.as_str() {
            "transparent" | "none" => Self::TRANSPARENT,
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "navy" => Self::rgb(0, 0, 128),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "silver" => Self::rgb(192, 192, 192),
            "orange" => Self::rgb(255, 165, 0),
            "yellow" => Self::rgb(255, 255, 0),
            "purple" => Self::rgb(128, 0, 128),
            _ => return None,
        };
        Some(named)
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Default presentation of each element, applied before the stylesheet.
fn user_agent_css(tag: &Tag) -> &'static str {
    match tag {
        Tag::Html | Tag::Body | Tag::Div | Tag::Thead | Tag::Tbody => "",
        Tag::Head | Tag::Title | Tag::Meta | Tag::Link | Tag::Style => "display: none",
        Tag::P => "margin: 1em 0",
        Tag::H1 => "font-size: 2em; font-weight: bold; margin: 0.67em 0",
        Tag::H2 => "font-size: 1.5em; font-weight: bold; margin: 0.83em 0",
        Tag::H3 => "font-size: 1.17em; font-weight: bold; margin: 1em 0",
        Tag::H4 => "font-weight: bold; margin: 1.33em 0",
        Tag::H5 => "font-size: 0.83em; font-weight: bold; margin: 1.67em 0",
        Tag::H6 => "font-size: 0.67em; font-weight: bold; margin: 2.33em 0",
        Tag::Ul | Tag::Ol => "margin: 1em 0; padding-left: 40px",
        Tag::Li => "display: list-item",
        Tag::Table => "display: table",
        Tag::Tr => "display: table-row",
        Tag::Td => "display: table-cell; padding: 1px",
        Tag::Th => "display: table-cell; padding: 1px; font-weight: bold; text-align: center",
        Tag::Pre => "white-space: pre; font-family: monospace; margin: 1em 0",
        Tag::Blockquote => "margin: 1em 40px",
        Tag::Hr => "border-top: 1px solid #808080; margin: 0.5em 0",
        Tag::Img => "display: inline-block",
        Tag::Br | Tag::Span => "display: inline",
        Tag::Code => "display: inline; font-family: monospace",
        Tag::A => "display: inline; color: #0000ee; text-decoration: underline",
        Tag::Strong | Tag::B => "display: inline; font-weight: bold",
        Tag::Em | Tag::I => "display: inline; font-style: italic",
        Tag::Del => "display: inline; text-decoration: line-through",
        Tag::Unknown(name) => match name.as_str() {
            "script" | "template" => "display: none",
            "u" | "ins" => "display: inline; text-decoration: underline",
            "sup" | "sub" | "small" | "mark" | "kbd" | "abbr" | "cite" | "q" | "samp" | "var"
            | "label" | "time" => "display: inline",
            _ => "",
        },
    }
}

/// Resolve the style for an element.
///
/// Precedence, lowest first: user-agent defaults, the `dir` attribute,
/// matching stylesheet declarations (already in cascade order), the
/// `style` attribute. `font-size` is resolved before everything else so
/// `em` lengths see the element's own size.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    author: &[&Declaration],
) -> ComputedStyle {
    let mut style = ComputedStyle::inherit_from(parent);

    let user_agent = parse_declarations(user_agent_css(&element.tag));
    let dir_hint: Vec<Declaration> = element
        .dir()
        .filter(|d| d == "rtl" || d == "ltr")
        .map(|d| Declaration {
            property: "direction".to_string(),
            value: d,
        })
        .into_iter()
        .collect();
    let inline = element
        .inline_style()
        .map(parse_declarations)
        .unwrap_or_default();

    let cascade: Vec<&Declaration> = user_agent
        .iter()
        .chain(dir_hint.iter())
        .chain(author.iter().copied())
        .chain(inline.iter())
        .collect();

    let parent_size = style.font_size;
    for decl in cascade.iter().filter(|d| d.property == "font-size") {
        if let Some(size) = parse_font_size(&decl.value, parent_size) {
            style.font_size = size;
        }
    }
    for decl in cascade.iter().filter(|d| d.property != "font-size") {
        apply_css_property(&mut style, &decl.property, &decl.value);
    }
    style
}

fn parse_font_size(value: &str, parent_size: f32) -> Option<f32> {
    let v = value.trim();
    if let Some(pct) = v.strip_suffix('%') {
        return pct.trim().parse::<f32>().ok().map(|p| parent_size * p / 100.0);
    }
    match v {
        "smaller" => Some(parent_size / 1.2),
        "larger" => Some(parent_size * 1.2),
        "small" => Some(9.75),
        "medium" => Some(12.0),
        "large" => Some(13.5),
        _ => parse_length(v, parent_size),
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let val = val.trim();
    match prop {
        "display" => {
            s.display = match val {
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" => Display::InlineBlock,
                "list-item" => Display::ListItem,
                "table" => Display::Table,
                "table-row" => Display::TableRow,
                "table-cell" => Display::TableCell,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" => FontWeight::Bold,
                "normal" | "lighter" => FontWeight::Normal,
                n => match n.parse::<u32>() {
                    Ok(w) if w >= 600 => FontWeight::Bold,
                    Ok(_) => FontWeight::Normal,
                    Err(_) => s.font_weight,
                },
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => s.font_family = fonts::generic_family(val).to_string(),
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "background" => {
            // Shorthand: take the first token that is a colour.
            if let Some(c) = val.split_whitespace().find_map(Color::parse) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                "left" => TextAlign::Left,
                "justify" => TextAlign::Justify,
                "start" => TextAlign::Start,
                "end" => match s.direction {
                    Direction::Ltr => TextAlign::Right,
                    Direction::Rtl => TextAlign::Left,
                },
                _ => s.text_align,
            }
        }
        "direction" => {
            s.direction = match val.to_ascii_lowercase().as_str() {
                "rtl" => Direction::Rtl,
                "ltr" => Direction::Ltr,
                _ => s.direction,
            }
        }
        "white-space" => {
            s.white_space = match val {
                "pre" | "pre-wrap" | "pre-line" | "break-spaces" => WhiteSpace::Pre,
                _ => WhiteSpace::Normal,
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.text_decoration = if val.contains("underline") {
                TextDecoration::Underline
            } else if val.contains("line-through") {
                TextDecoration::LineThrough
            } else {
                TextDecoration::None
            }
        }
        "width" => s.width = parse_dimension(val, s.font_size),
        "height" => s.height = parse_dimension(val, s.font_size),
        "min-width" => s.min_width = parse_dimension(val, s.font_size),
        "max-width" => {
            s.max_width = match val {
                "none" => Dimension::Auto,
                v => parse_dimension(v, s.font_size),
            }
        }
        "margin" => {
            if let Some([t, r, b, l]) = css::parse_box_shorthand(val, s.font_size) {
                s.margin_top = t;
                s.margin_right = r;
                s.margin_bottom = b;
                s.margin_left = l;
            }
        }
        "margin-top" => set_length(&mut s.margin_top, val, s.font_size),
        "margin-right" => set_length(&mut s.margin_right, val, s.font_size),
        "margin-bottom" => set_length(&mut s.margin_bottom, val, s.font_size),
        "margin-left" => set_length(&mut s.margin_left, val, s.font_size),
        "padding" => {
            if let Some([t, r, b, l]) = css::parse_box_shorthand(val, s.font_size) {
                s.padding_top = t;
                s.padding_right = r;
                s.padding_bottom = b;
                s.padding_left = l;
            }
        }
        "padding-top" => set_length(&mut s.padding_top, val, s.font_size),
        "padding-right" => set_length(&mut s.padding_right, val, s.font_size),
        "padding-bottom" => set_length(&mut s.padding_bottom, val, s.font_size),
        "padding-left" => set_length(&mut s.padding_left, val, s.font_size),
        "border" => {
            let side = BorderSide::parse(val, s.font_size);
            s.border_top = side;
            s.border_right = side;
            s.border_bottom = side;
            s.border_left = side;
        }
        "border-top" => s.border_top = BorderSide::parse(val, s.font_size),
        "border-right" => s.border_right = BorderSide::parse(val, s.font_size),
        "border-bottom" => s.border_bottom = BorderSide::parse(val, s.font_size),
        "border-left" => s.border_left = BorderSide::parse(val, s.font_size),
        "border-width" => {
            if let Some(w) = parse_length(val, s.font_size) {
                for side in [
                    &mut s.border_top,
                    &mut s.border_right,
                    &mut s.border_bottom,
                    &mut s.border_left,
                ] {
                    let color = side.map(|b| b.color).unwrap_or(Color::BLACK);
                    *side = (w > 0.0).then_some(BorderSide { width: w, color });
                }
            }
        }
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                for b in [
                    &mut s.border_top,
                    &mut s.border_right,
                    &mut s.border_bottom,
                    &mut s.border_left,
                ]
                .into_iter()
                .flatten()
                {
                    b.color = c;
                }
            }
        }
        "line-height" => {
            if val == "normal" {
                s.line_height = 1.2;
            } else if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(pct) = val.strip_suffix('%') {
                if let Ok(p) = pct.parse::<f32>() {
                    s.line_height = p / 100.0;
                }
            } else if let Some(pt) = parse_length(val, s.font_size) {
                if s.font_size > 0.0 {
                    s.line_height = pt / s.font_size;
                }
            }
        }
        "break-before" | "page-break-before" => s.page_break_before = is_forced_break(val),
        "break-after" | "page-break-after" => {
            s.page_break_after = is_forced_break(val);
            s.page_break_after_avoid = val == "avoid" || val == "avoid-page";
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = val == "avoid" || val == "avoid-page";
        }
        _ => {}
    }
}

fn is_forced_break(val: &str) -> bool {
    matches!(val, "always" | "page" | "left" | "right")
}

fn set_length(target: &mut f32, val: &str, font_size: f32) {
    if val == "auto" {
        *target = 0.0;
    } else if let Some(v) = parse_length(val, font_size) {
        *target = v;
    }
}

fn parse_dimension(s: &str, font_size: f32) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.trim()
            .parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s, font_size)
            .map(Dimension::Px)
            .unwrap_or(Dimension::Auto)
    }
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn style(&self) -> &ComputedStyle {
        match self {
            StyledNode::Element { style, .. } | StyledNode::Text { style, .. } => style,
        }
    }
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
///
/// `ancestors` describes the elements enclosing `nodes`, root first; pass
/// the chain down to `<body>` so descendant selectors see it.
pub fn build_styled_tree(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    sheet: &Stylesheet,
    ancestors: &[ElementInfo],
) -> Vec<StyledNode> {
    let mut chain = ancestors.to_vec();
    build_children(nodes, parent_style, sheet, &mut chain)
}

/// Style a whole parsed document. The result is rooted at `<body>`, so
/// body styles reach every block; a fragment without a document shell is
/// styled from its top-level nodes.
pub fn style_document(dom: &[DomNode], sheet: &Stylesheet) -> Vec<StyledNode> {
    let mut ancestors: Vec<ElementInfo> = Vec::new();
    let mut parent: Option<ComputedStyle> = None;
    let mut level: &[DomNode] = dom;

    for wanted in [Tag::Html, Tag::Body] {
        let infos = sibling_infos(level);
        let found = level
            .iter()
            .filter_map(|n| match n {
                DomNode::Element(e) => Some(e),
                DomNode::Text(_) => None,
            })
            .zip(infos)
            .find(|(e, _)| e.tag == wanted);
        let Some((element, info)) = found else {
            continue;
        };

        let matched = sheet.matching_declarations(&info, &ancestors);
        let style = resolve_style(element, parent.as_ref(), &matched);
        ancestors.push(info);

        if wanted == Tag::Body {
            let children = build_styled_tree(&element.children, Some(&style), sheet, &ancestors);
            return vec![StyledNode::Element {
                tag: Tag::Body,
                style,
                children,
                attrs: element.attributes.clone(),
            }];
        }
        parent = Some(style);
        level = &element.children;
    }
    build_styled_tree(level, parent.as_ref(), sheet, &ancestors)
}

/// Selector-matching facts for each element child of a parent.
pub fn sibling_infos(nodes: &[DomNode]) -> Vec<ElementInfo> {
    let elements: Vec<&ElementNode> = nodes
        .iter()
        .filter_map(|n| match n {
            DomNode::Element(e) => Some(e),
            DomNode::Text(_) => None,
        })
        .collect();
    let total = elements.len();
    let mut seen: HashSet<&str> = HashSet::new();
    elements
        .iter()
        .enumerate()
        .map(|(i, e)| ElementInfo {
            tag: e.tag.name().to_string(),
            attributes: e.attributes.clone(),
            index: i + 1,
            last_child: i + 1 == total,
            first_of_type: seen.insert(e.tag.name()),
        })
        .collect()
}

fn build_children(
    nodes: &[DomNode],
    parent_style: Option<&ComputedStyle>,
    sheet: &Stylesheet,
    ancestors: &mut Vec<ElementInfo>,
) -> Vec<StyledNode> {
    let mut infos = sibling_infos(nodes).into_iter();
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let Some(info) = infos.next() else { break };
                let matched = sheet.matching_declarations(&info, ancestors);
                let style = resolve_style(e, parent_style, &matched);

                ancestors.push(info);
                let mut children = build_children(&e.children, Some(&style), sheet, ancestors);
                ancestors.pop();

                if e.tag == Tag::Table {
                    children = flatten_table_sections(children);
                }
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                let style = match parent_style {
                    Some(p) => ComputedStyle::for_text(p),
                    None => ComputedStyle::for_text(&ComputedStyle::default()),
                };
                result.push(StyledNode::Text {
                    text: text.clone(),
                    style,
                });
            }
        }
    }
    result
}

/// Hoist the rows of `<thead>`/`<tbody>` into the table itself.
fn flatten_table_sections(children: Vec<StyledNode>) -> Vec<StyledNode> {
    let mut rows = Vec::new();
    for child in children {
        match child {
            StyledNode::Element {
                tag: Tag::Thead | Tag::Tbody,
                children,
                ..
            } => rows.extend(children),
            other => rows.push(other),
        }
    }
    rows
}
