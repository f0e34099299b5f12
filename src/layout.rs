//! Layout engine – uses Taffy to compute block flow from a styled DOM tree,
//! then converts the result into a tree of positioned boxes.
//!
//! Runs of consecutive inline content (text, `<strong>`, `<code>`, `<br>`,
//! ...) inside a block become one anonymous, pre-wrapped text leaf. The run
//! takes the text style of its block, or of its only inline element when
//! the run consists of a single one.

use std::collections::HashMap;
use taffy::prelude::*;
use taffy::TaffyError;

use crate::dom::Tag;
use crate::fonts::{wrap_preformatted, wrap_text, FontManager};
use crate::style::{self, ComputedStyle, StyledNode};

/// Stands in for `<br>` while whitespace is collapsed.
const LINE_BREAK: char = '\u{2028}';

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

impl PositionedBox {
    /// A table whose rows may be split across pages.
    pub fn is_table(&self) -> bool {
        self.style.display == style::Display::Table && !self.children.is_empty()
    }

    /// True when the box paints something of its own.
    pub fn is_decorated(&self) -> bool {
        !self.style.background_color.is_transparent() || self.style.has_border()
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text {
        text: String,
        lines: Vec<String>,
    },
    Image {
        src: String,
    },
    /// List item marker
    ListItem {
        marker: String,
    },
}

type BuildResult<T> = Result<T, TaffyError>;

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    /// True for nodes that flow inside a line rather than stacking.
    fn is_inline_content(node: &StyledNode) -> bool {
        match node {
            StyledNode::Text { .. } => true,
            StyledNode::Element { style, .. } => style.display == style::Display::Inline,
        }
    }

    /// Append the raw text of an inline subtree, marking `<br>`.
    fn collect_inline_text(node: &StyledNode, out: &mut String) {
        match node {
            StyledNode::Text { text, .. } => out.push_str(text),
            StyledNode::Element { tag: Tag::Br, .. } => out.push(LINE_BREAK),
            StyledNode::Element {
                style, children, ..
            } => {
                if style.display != style::Display::None {
                    for child in children {
                        Self::collect_inline_text(child, out);
                    }
                }
            }
        }
    }

    /// Text of an inline run with whitespace handled per `white-space`.
    fn run_text(run: &[&StyledNode], white_space: style::WhiteSpace) -> String {
        let mut raw = String::new();
        for node in run {
            Self::collect_inline_text(node, &mut raw);
        }
        match white_space {
            style::WhiteSpace::Pre => raw.replace(LINE_BREAK, "\n"),
            style::WhiteSpace::Normal => {
                let mut segments: Vec<String> = raw
                    .split(LINE_BREAK)
                    .map(|seg| seg.split_whitespace().collect::<Vec<_>>().join(" "))
                    .collect();
                while segments.last().is_some_and(|s| s.is_empty()) {
                    segments.pop();
                }
                segments.join("\n")
            }
        }
    }

    fn is_blank(node: &StyledNode) -> bool {
        matches!(node, StyledNode::Text { text, .. } if text.trim().is_empty())
    }

    /// Style of the element a run consists of, if it is a single one
    /// (e.g. `<pre><code>…</code></pre>` or `<p><strong>…</strong></p>`).
    fn uniform_style<'n>(run: &[&'n StyledNode]) -> Option<&'n ComputedStyle> {
        let mut significant = run.iter().copied().filter(|n| !Self::is_blank(n));
        let single: &'n StyledNode = significant.next()?;
        if significant.next().is_some() {
            return None;
        }
        match single {
            StyledNode::Element {
                tag,
                style,
                children,
                ..
            } if *tag != Tag::Br => {
                let inner: Vec<&'n StyledNode> = children.iter().collect();
                Some(Self::uniform_style(&inner).unwrap_or(style))
            }
            _ => None,
        }
    }

    /// Turn a pending inline run into a text leaf.
    fn flush_run(
        &mut self,
        run: &mut Vec<&StyledNode>,
        container: &ComputedStyle,
        width: f32,
    ) -> BuildResult<Option<NodeId>> {
        if run.is_empty() {
            return Ok(None);
        }
        let items = std::mem::take(run);
        let text = Self::run_text(&items, container.white_space);
        if text.trim().is_empty() {
            return Ok(None);
        }
        let source = Self::uniform_style(&items).unwrap_or(container);
        let mut style = ComputedStyle::for_text(source);
        // Alignment and direction belong to the block.
        style.text_align = container.text_align;
        style.direction = container.direction;
        style.white_space = container.white_space;
        self.build_text_node(&text, &style, width).map(Some)
    }

    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        width: f32,
    ) -> BuildResult<NodeId> {
        let bold = style.is_bold();
        let italic = style.is_italic();
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height = self.fonts.line_height_pt(font_size, style.line_height);

        let lines = match style.white_space {
            style::WhiteSpace::Pre => {
                wrap_preformatted(text, font_size, bold, italic, family, width, self.fonts)
            }
            style::WhiteSpace::Normal => {
                wrap_text(text, font_size, bold, italic, family, width, self.fonts)
            }
        };

        let text_width = lines
            .iter()
            .map(|l| {
                self.fonts
                    .measure_text_width(l, font_size, bold, italic, family)
            })
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height;

        // Width stretches to the block; the min-width keeps the text visible
        // inside table rows.
        let taffy_style = Style {
            size: Size {
                width: Dimension::Auto,
                height: Dimension::Length(text_height),
            },
            min_size: Size {
                width: Dimension::Length(text_width.min(width.max(0.0))),
                height: Dimension::Auto,
            },
            flex_shrink: 0.0,
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(
            node,
            BoxContent::Text {
                text: text.to_string(),
                lines,
            },
        );
        Ok(node)
    }

    /// Build the children of a block, grouping inline runs and collapsing
    /// vertical margins between block siblings.
    fn build_children(
        &mut self,
        container_tag: Option<&Tag>,
        container: &ComputedStyle,
        attrs: Option<&HashMap<String, String>>,
        children: &[StyledNode],
        child_width: f32,
        is_row: bool,
    ) -> BuildResult<Vec<NodeId>> {
        let mut child_nodes = Vec::new();
        let mut run: Vec<&StyledNode> = Vec::new();
        let mut prev_margin_bottom = 0.0f32;
        let mut list_counter = list_start(container_tag, attrs) - 1;

        for child in children {
            if Self::is_inline_content(child) {
                run.push(child);
                continue;
            }
            if let Some(id) = self.flush_run(&mut run, container, child_width)? {
                child_nodes.push(id);
                prev_margin_bottom = 0.0;
            }
            let StyledNode::Element {
                tag: child_tag,
                style: child_style,
                ..
            } = child
            else {
                continue;
            };
            if child_style.display == style::Display::None {
                continue;
            }

            // For list items, compute and record the marker string so it can
            // be rendered as a bullet / number in the gutter.
            let li_marker = (*child_tag == Tag::Li).then(|| {
                list_counter += 1;
                if container_tag == Some(&Tag::Ol) {
                    format!("{list_counter}. ")
                } else {
                    "\u{2022} ".to_string()
                }
            });

            let collapse = if is_row {
                0.0
            } else {
                prev_margin_bottom.min(child_style.margin_top).max(0.0)
            };
            if let Some(child_id) = self.build_node(child, child_width, collapse)? {
                // Attach the marker to the taffy node so pagination can render it.
                if let Some(marker) = li_marker {
                    self.node_content
                        .insert(child_id, BoxContent::ListItem { marker });
                }
                child_nodes.push(child_id);
                prev_margin_bottom = child_style.margin_bottom;
            }
        }
        if let Some(id) = self.flush_run(&mut run, container, child_width)? {
            child_nodes.push(id);
        }
        Ok(child_nodes)
    }

    fn build_node(
        &mut self,
        styled: &StyledNode,
        parent_width: f32,
        collapse: f32,
    ) -> BuildResult<Option<NodeId>> {
        match styled {
            StyledNode::Text { .. } => {
                let mut run = vec![styled];
                let parent = styled.style().clone();
                self.flush_run(&mut run, &parent, parent_width)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => {
                if style.display == style::Display::None {
                    return Ok(None);
                }
                self.build_element_node(tag, style, children, attrs, parent_width, collapse)
                    .map(Some)
            }
        }
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
        collapse: f32,
    ) -> BuildResult<NodeId> {
        // Compute the width available for children
        let my_width = match style.width {
            style::Dimension::Px(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width - style.margin_left - style.margin_right,
        };
        let inner_width = (my_width
            - style.padding_left
            - style.padding_right
            - style.border_left_width()
            - style.border_right_width())
        .max(1.0);

        // Cells share the row equally, so their text is wrapped to that
        // column width at build time.
        let is_table_row = style.display == style::Display::TableRow;

        let elem_child_count = children
            .iter()
            .filter(|c| matches!(c, StyledNode::Element { style, .. } if style.display != style::Display::None))
            .count()
            .max(1);

        let child_build_width = if is_table_row {
            (inner_width / elem_child_count as f32).max(1.0)
        } else {
            inner_width
        };

        let child_nodes = self.build_children(
            Some(tag),
            style,
            Some(attrs),
            children,
            child_build_width,
            is_table_row,
        )?;

        // For <img> elements, resolve Auto width/height to concrete dimensions
        // using the image's intrinsic size decoded from the base64 data URI.
        // A childless box with Auto dimensions would otherwise be 0×0.
        let style_override: Option<ComputedStyle> = if *tag == Tag::Img {
            let src = attrs.get("src").map(|s| s.as_str()).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let mut taffy_style = computed_to_taffy(effective_style);
        if collapse > 0.0 {
            taffy_style.margin.top =
                LengthPercentageAuto::Length(effective_style.margin_top - collapse);
        }
        let node = self.taffy.new_with_children(taffy_style, &child_nodes)?;
        self.node_styles.insert(node, effective_style.clone());

        // Handle images
        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> BuildResult<PositionedBox> {
        let layout = self.taffy.layout(node)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)?
            .iter()
            .map(|&child| self.extract(child, x, y))
            .collect::<BuildResult<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style,
            content,
            children,
        })
    }
}

/// First ordinal of a list (`<ol start="N">`).
fn list_start(tag: Option<&Tag>, attrs: Option<&HashMap<String, String>>) -> i64 {
    match (tag, attrs) {
        (Some(Tag::Ol), Some(attrs)) => attrs
            .get("start")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(1),
        _ => 1,
    }
}

fn spacing(s: &ComputedStyle) -> (Rect<LengthPercentageAuto>, Rect<LengthPercentage>, Rect<LengthPercentage>) {
    let margin = Rect {
        top: LengthPercentageAuto::Length(s.margin_top),
        right: LengthPercentageAuto::Length(s.margin_right),
        bottom: LengthPercentageAuto::Length(s.margin_bottom),
        left: LengthPercentageAuto::Length(s.margin_left),
    };
    let padding = Rect {
        top: LengthPercentage::Length(s.padding_top),
        right: LengthPercentage::Length(s.padding_right),
        bottom: LengthPercentage::Length(s.padding_bottom),
        left: LengthPercentage::Length(s.padding_left),
    };
    let border = Rect {
        top: LengthPercentage::Length(s.border_top_width()),
        right: LengthPercentage::Length(s.border_right_width()),
        bottom: LengthPercentage::Length(s.border_bottom_width()),
        left: LengthPercentage::Length(s.border_left_width()),
    };
    (margin, padding, border)
}

fn computed_to_taffy(s: &ComputedStyle) -> Style {
    let mut ts = Style::default();
    let (margin, padding, border) = spacing(s);
    ts.margin = margin;
    ts.padding = padding;
    ts.border = border;

    // -----------------------------------------------------------------
    // HTML table model: always flex, equal-width cells.
    // -----------------------------------------------------------------
    match s.display {
        style::Display::Table => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
            ts.size.width = dim_to_taffy(s.width);
            ts.size.height = dim_to_taffy(s.height);
            ts.min_size.width = taffy::Dimension::Length(0.0);
            return ts;
        }
        style::Display::TableRow => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.align_items = Some(taffy::AlignItems::Stretch);
            ts.min_size.width = taffy::Dimension::Length(0.0);
            return ts;
        }
        style::Display::TableCell => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
            ts.flex_grow = 1.0;
            ts.flex_shrink = 1.0;
            ts.flex_basis = taffy::Dimension::Length(0.0); // equal columns
            ts.min_size.width = taffy::Dimension::Length(0.0);
            return ts;
        }
        _ => {}
    }

    // Display / layout mode
    match s.display {
        style::Display::None => {
            ts.display = taffy::Display::None;
        }
        _ => {
            // Use flex column for block-level elements (vertical stacking)
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
    }

    // Sizing
    ts.size = Size {
        width: dim_to_taffy(s.width),
        height: dim_to_taffy(s.height),
    };
    ts.min_size = Size {
        width: dim_to_taffy(s.min_width),
        height: taffy::Dimension::Auto,
    };
    ts.max_size = Size {
        width: dim_to_taffy(s.max_width),
        height: taffy::Dimension::Auto,
    };
    ts
}

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Px(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Attempt to decode a base64 data-URI image and return a cloned
/// [`ComputedStyle`] with any `Auto` width/height replaced by concrete values
/// derived from the image's intrinsic dimensions, scaled down to fit
/// `parent_width`.
///
/// Returns `None` when the src is not a parseable base64 data URI, when image
/// decoding fails, or when both dimensions are already specified.
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

    if !src.starts_with("data:") || !src.contains(";base64,") {
        return None;
    }
    let comma = src.find(',')?;
    let b64 = src[comma + 1..].trim();
    let bytes = BASE64_STD.decode(b64).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    // 1 image pixel = 1 CSS px = 0.75 pt.
    let (w, h) = (img.width() as f32 * 0.75, img.height() as f32 * 0.75);
    if w == 0.0 || h == 0.0 {
        return None;
    }
    let aspect = w / h;

    let known_w: Option<f32> = match style.width {
        style::Dimension::Px(v) => Some(v),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    };
    let known_h: Option<f32> = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let (mut out_w, mut out_h) = match (known_w, known_h) {
        // Width known → derive height from aspect ratio.
        (Some(w), None) => (w, (w / aspect).max(1.0)),
        // Height known → derive width from aspect ratio.
        (None, Some(h)) => ((h * aspect).max(1.0), h),
        (None, None) => (w, h),
        // Both already resolved.
        (Some(_), Some(_)) => return None,
    };
    if parent_width > 0.0 && out_w > parent_width {
        out_h *= parent_width / out_w;
        out_w = parent_width;
    }

    let mut s = style.clone();
    s.width = style::Dimension::Px(out_w);
    s.height = style::Dimension::Px(out_h);
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree, returning the top-level positioned
/// boxes in document coordinates. `origin_x` is the left page margin.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    content_width: f32,
    origin_x: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, String> {
    build_and_extract(styled_nodes, content_width, origin_x, fonts).map_err(|e| e.to_string())
}

fn build_and_extract(
    styled_nodes: &[StyledNode],
    content_width: f32,
    origin_x: f32,
    fonts: &FontManager,
) -> BuildResult<Vec<PositionedBox>> {
    let mut builder = LayoutBuilder::new(fonts);
    let root_style = ComputedStyle::default();
    let child_ids = builder.build_children(
        None,
        &root_style,
        None,
        styled_nodes,
        content_width,
        false,
    )?;

    // Wrap all nodes in a root flex-column container
    let root = builder.taffy.new_with_children(
        Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Column,
            size: Size {
                width: taffy::Dimension::Length(content_width),
                height: taffy::Dimension::Auto,
            },
            ..Default::default()
        },
        &child_ids,
    )?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(content_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let root_box = builder.extract(root, origin_x, 0.0)?;
    log::debug!(
        "Layout: {} top-level boxes, document height {:.1}pt",
        root_box.children.len(),
        root_box.height
    );
    Ok(root_box.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str, css: &str) -> Vec<PositionedBox> {
        let sheet = Stylesheet::parse(css);
        let styled = build_styled_tree(&parse_html(html), None, &sheet, &[]);
        let fonts = FontManager::default();
        compute_layout(&styled, 515.0, 40.0, &fonts).unwrap()
    }

    fn text_lines(b: &PositionedBox) -> Vec<String> {
        let mut out = Vec::new();
        if let BoxContent::Text { lines, .. } = &b.content {
            out.extend(lines.iter().cloned());
        }
        for c in &b.children {
            out.extend(text_lines(c));
        }
        out
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>", "");
        assert!(!boxes.is_empty(), "Should produce at least one box");
        let first = &boxes[0];
        assert!(first.width > 0.0, "Box should have width");
        assert!(first.height > 0.0, "Box should have height");
        assert_eq!(first.x, 40.0);
        assert_eq!(text_lines(first), vec!["Hello world"]);
    }

    #[test]
    fn inline_children_merge_into_one_run() {
        let boxes = layout("<p>Hello <strong>bold</strong> and <em>it</em></p>", "");
        assert_eq!(boxes[0].children.len(), 1);
        assert_eq!(text_lines(&boxes[0]), vec!["Hello bold and it"]);
    }

    #[test]
    fn line_break_forces_new_line() {
        let boxes = layout("<p>first line<br />\nsecond line</p>", "");
        assert_eq!(text_lines(&boxes[0]), vec!["first line", "second line"]);
    }

    #[test]
    fn pre_keeps_lines() {
        let boxes = layout("<pre><code>a  b\n  c\n</code></pre>", "");
        assert_eq!(text_lines(&boxes[0]), vec!["a  b", "  c"]);
    }

    #[test]
    fn list_items_get_markers() {
        let boxes = layout("<ol start=\"3\">\n<li>x</li>\n<li>y</li>\n</ol>\n<ul>\n<li>z</li>\n</ul>", "");
        let marker = |b: &PositionedBox| match &b.content {
            BoxContent::ListItem { marker } => marker.clone(),
            _ => String::new(),
        };
        assert_eq!(marker(&boxes[0].children[0]), "3. ");
        assert_eq!(marker(&boxes[0].children[1]), "4. ");
        assert_eq!(marker(&boxes[1].children[0]), "\u{2022} ");
    }

    #[test]
    fn table_cells_share_the_row() {
        let html = "<table style=\"width: 100%\"><tr><td>a</td><td>b</td></tr></table>";
        let boxes = layout(html, "");
        let row = &boxes[0].children[0];
        assert_eq!(row.children.len(), 2);
        let (a, b) = (&row.children[0], &row.children[1]);
        // Taffy rounds to whole points, so an odd remainder lands in one cell.
        assert!((a.width + b.width - row.width).abs() < 0.01);
        assert!((a.width - b.width).abs() <= 1.0);
        assert!(b.x > a.x);
    }

    #[test]
    fn vertical_margins_collapse() {
        let boxes = layout("<p>a</p><p>b</p>", "p { margin: 10pt 0; line-height: 1; font-size: 10pt; }");
        let gap = boxes[1].y - boxes[0].bottom();
        assert!((gap - 10.0).abs() < 0.01, "gap was {gap}");
    }

    #[test]
    fn hidden_elements_produce_no_boxes() {
        let boxes = layout("<p style=\"display: none\">x</p><p>y</p>", "");
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn three_cells_fill_the_row() {
        let html = "<table style=\"width: 100%\"><tr><td>a</td><td>b</td><td>c</td></tr></table>";
        let boxes = layout(html, "");
        let row = &boxes[0].children[0];
        let widths: Vec<f32> = row.children.iter().map(|c| c.width).collect();
        assert_eq!(widths.len(), 3);
        assert!((widths.iter().sum::<f32>() - row.width).abs() < 0.01);
        let (min, max) = widths
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), w| (lo.min(*w), hi.max(*w)));
        assert!(max - min <= 1.0, "widths {widths:?}");
    }

    #[test]
    fn flex_display_lays_out_as_block() {
        let html = r#"<div style="display: flex"><div>A</div><div>B</div></div>"#;
        let boxes = layout(html, "");
        let (a, b) = (&boxes[0].children[0], &boxes[0].children[1]);
        assert_eq!(a.x, b.x);
        assert!(b.y >= a.bottom());
    }
}
