//! Pagination – splits a flat list of positioned boxes into pages.
//!
//! Handles:
//! - page size and per-side margins from `@page`
//! - page-break-before / page-break-after hints
//! - keeping headings with the block that follows them
//! - table row splitting and line splitting of oversized text
//! - running headers and footers from the `@page` margin boxes

use std::ops::Range;

use crate::css::{MarginBox, PageRules};
use crate::fonts::{FontManager, SANS};
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::style::{BorderSide, ComputedStyle, TextAlign, TextDecoration};

/// Default page margins in points: 2cm top/bottom, 1.5cm left/right.
pub const DEFAULT_MARGINS_PT: [f32; 4] = [56.692_913, 42.519_685, 56.692_913, 42.519_685];

/// Page size and margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// `[top, right, bottom, left]`
    pub margins: [f32; 4],
}

impl PageGeometry {
    /// A4 portrait with the default margins.
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margins: DEFAULT_MARGINS_PT,
        }
    }

    pub fn content_width(&self) -> f32 {
        (self.width - self.margins[1] - self.margins[3]).max(1.0)
    }

    pub fn content_height(&self) -> f32 {
        (self.height - self.margins[0] - self.margins[2]).max(1.0)
    }
}

/// A box scheduled for placement, carrying the break hints of any wrapper
/// it was lifted out of.
struct Unit<'a> {
    pbox: &'a PositionedBox,
    break_before: bool,
    break_after: bool,
    keep_with_next: bool,
}

impl<'a> Unit<'a> {
    fn new(pbox: &'a PositionedBox) -> Self {
        Self {
            pbox,
            break_before: pbox.style.page_break_before,
            break_after: pbox.style.page_break_after,
            keep_with_next: pbox.style.page_break_after_avoid,
        }
    }
}

/// Containers that only group other blocks and draw nothing themselves.
fn is_wrapper(pbox: &PositionedBox) -> bool {
    matches!(pbox.content, BoxContent::None)
        && !pbox.is_table()
        && !pbox.is_decorated()
        && !pbox.style.page_break_inside_avoid
        && pbox
            .children
            .iter()
            .any(|c| !matches!(c.content, BoxContent::Text { .. }))
}

/// Expand wrappers, and any container taller than a page, so their children
/// can be placed individually.
fn flatten_for_pagination(boxes: &[PositionedBox], content_height: f32) -> Vec<Unit<'_>> {
    let mut result = Vec::new();
    for pbox in boxes {
        let oversized = pbox.height > content_height
            && !pbox.children.is_empty()
            && !pbox.is_table()
            && matches!(pbox.content, BoxContent::None | BoxContent::ListItem { .. });
        if !(oversized || is_wrapper(pbox)) {
            result.push(Unit::new(pbox));
            continue;
        }
        let outer = Unit::new(pbox);
        let mut inner = flatten_for_pagination(&pbox.children, content_height);
        if let Some(first) = inner.first_mut() {
            first.break_before |= outer.break_before;
        }
        if let Some(last) = inner.last_mut() {
            last.break_after |= outer.break_after;
            last.keep_with_next |= outer.keep_with_next;
        }
        if inner.is_empty() {
            result.push(outer);
        } else {
            result.extend(inner);
        }
    }
    result
}

/// Accumulates pages while walking the document top to bottom.
struct Paginator<'f> {
    geometry: PageGeometry,
    fonts: &'f FontManager,
    pages: Vec<PageLayout>,
    current: Vec<LayoutBox>,
    // Document-space y at which the current page begins. All PositionedBox.y
    // values are absolute document coordinates, so `y - page_start` gives
    // the y-on-page for any box.
    page_start: f32,
}

impl<'f> Paginator<'f> {
    fn new(geometry: PageGeometry, fonts: &'f FontManager) -> Self {
        Self {
            geometry,
            fonts,
            pages: Vec::new(),
            current: Vec::new(),
            page_start: 0.0,
        }
    }

    fn content_height(&self) -> f32 {
        self.geometry.content_height()
    }

    fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    fn y_on_page(&self, doc_y: f32) -> f32 {
        (doc_y - self.page_start).max(0.0)
    }

    /// Whether the document range `[top, top + height)` fits on this page.
    fn fits(&self, top: f32, height: f32) -> bool {
        self.y_on_page(top) + height <= self.content_height() + 0.01
    }

    fn new_page(&mut self, doc_y: f32) {
        let boxes = std::mem::take(&mut self.current);
        self.pages.push(PageLayout {
            page_index: self.pages.len(),
            boxes,
        });
        self.page_start = doc_y;
    }

    fn page_y(&self, doc_y: f32) -> f32 {
        self.geometry.margins[0] + self.y_on_page(doc_y)
    }

    fn place(&mut self, pbox: &PositionedBox) {
        let y = self.page_y(pbox.y);
        let lb = build_layout_box(pbox, pbox.x, y, self.fonts);
        self.current.push(lb);
    }

    fn place_table(&mut self, pbox: &PositionedBox) {
        for row in &pbox.children {
            if !self.fits(row.y, row.height) && !self.is_empty() {
                self.new_page(row.y);
            }
            self.place(row);
        }
    }

    /// Place a text box, continuing its lines on following pages.
    fn place_text(&mut self, pbox: &PositionedBox) {
        let line_height = self
            .fonts
            .line_height_pt(pbox.style.font_size, pbox.style.line_height);
        let line_count = match &pbox.content {
            BoxContent::Text { lines, .. } => lines.len(),
            _ => 0,
        };
        if line_count == 0 || line_height <= 0.0 {
            self.place(pbox);
            return;
        }

        let mut start = 0;
        while start < line_count {
            let top = pbox.y + start as f32 * line_height;
            let room = self.content_height() - self.y_on_page(top);
            let mut count = (((room + 0.01) / line_height).floor().max(0.0) as usize)
                .min(line_count - start);
            if count == 0 {
                if self.is_empty() {
                    // A single line taller than the page.
                    count = 1;
                } else {
                    self.new_page(top);
                    continue;
                }
            }
            let y = self.page_y(top);
            let slice = text_slice(pbox, start..start + count, y, line_height, self.fonts);
            self.current.push(slice);
            start += count;
            if start < line_count {
                self.new_page(pbox.y + start as f32 * line_height);
            }
        }
    }

    /// Place a box that is allowed to split if it does not fit.
    fn place_split(&mut self, pbox: &PositionedBox) {
        if pbox.is_table() {
            self.place_table(pbox);
        } else if matches!(pbox.content, BoxContent::Text { .. }) {
            self.place_text(pbox);
        } else {
            self.place(pbox);
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if !self.current.is_empty() || self.pages.is_empty() {
            let y = self.page_start;
            self.new_page(y);
        }
        self.pages
    }
}

/// Height of the part of a box that must share a page with the box before it.
fn leading_height(pbox: &PositionedBox, fonts: &FontManager) -> f32 {
    match &pbox.content {
        BoxContent::Text { .. } => fonts
            .line_height_pt(pbox.style.font_size, pbox.style.line_height)
            .min(pbox.height),
        _ if pbox.is_table() => pbox.children.first().map_or(pbox.height, |row| row.bottom() - pbox.y),
        _ => pbox.height,
    }
}

fn is_splittable(pbox: &PositionedBox) -> bool {
    pbox.is_table() || matches!(pbox.content, BoxContent::Text { .. })
}

/// Convert positioned boxes into a paginated LayoutConfig.
pub fn paginate(
    boxes: &[PositionedBox],
    geometry: &PageGeometry,
    fonts: &FontManager,
) -> LayoutConfig {
    let content_height = geometry.content_height();

    // Expand wrapper divs so their children can paginate individually.
    let units = flatten_for_pagination(boxes, content_height);
    let mut paginator = Paginator::new(*geometry, fonts);

    for (i, unit) in units.iter().enumerate() {
        let pbox = unit.pbox;

        // Page break before
        if unit.break_before && !paginator.is_empty() {
            paginator.new_page(pbox.y);
        }

        if paginator.fits(pbox.y, pbox.height) {
            // Keep with next: move to a new page when the start of the
            // following box would not fit here.
            if unit.keep_with_next && !paginator.is_empty() {
                if let Some(next) = units.get(i + 1) {
                    let lead = leading_height(next.pbox, fonts);
                    if lead <= content_height && !paginator.fits(next.pbox.y, lead) {
                        paginator.new_page(pbox.y);
                    }
                }
            }
            paginator.place(pbox);
        } else {
            let avoid_inside = pbox.style.page_break_inside_avoid && pbox.height <= content_height;
            if is_splittable(pbox) && !avoid_inside {
                paginator.place_split(pbox);
            } else {
                if !paginator.is_empty() {
                    paginator.new_page(pbox.y);
                }
                paginator.place_split(pbox);
            }
        }

        // Page break after
        if unit.break_after {
            paginator.new_page(pbox.bottom());
        }
    }

    let pages = paginator.finish();
    log::debug!("Paginated {} boxes into {} page(s)", units.len(), pages.len());

    LayoutConfig {
        page_width_pt: geometry.width,
        page_height_pt: geometry.height,
        pages,
        ..LayoutConfig::a4()
    }
}

/// Add the `@page` margin boxes (running header and footer) to every page,
/// with page counters resolved.
pub fn decorate_pages(
    config: &mut LayoutConfig,
    rules: &PageRules,
    geometry: &PageGeometry,
    fonts: &FontManager,
) {
    let total = config.pages.len();
    for (i, page) in config.pages.iter_mut().enumerate() {
        for mbox in rules.margin_boxes(i) {
            let text = mbox.resolve(i + 1, total);
            page.boxes.push(margin_box_layout(&mbox, &text, geometry, fonts));
        }
    }
}

fn margin_box_layout(
    mbox: &MarginBox,
    text: &str,
    geometry: &PageGeometry,
    fonts: &FontManager,
) -> LayoutBox {
    let x = geometry.margins[3];
    let width = geometry.content_width();
    let (y, height) = if mbox.position.is_top() {
        (0.0, geometry.margins[0])
    } else {
        (geometry.height - geometry.margins[2], geometry.margins[2])
    };
    let mut lb = LayoutBox::new(x, y, width, height);

    let font_size = mbox.font_size;
    let line_height = fonts.line_height_pt(font_size, 1.2);
    let edge_width = |side: Option<BorderSide>| side.map_or(0.0, |b| b.width);
    let inner_top = mbox.padding_top + edge_width(mbox.border_top);
    let inner_bottom = height - mbox.padding_bottom - edge_width(mbox.border_bottom);
    // Vertically centred in the margin area.
    let y_offset = ((inner_top + inner_bottom - line_height) / 2.0).max(0.0);

    let align = mbox.position.align();
    let line_width = fonts.measure_text_width(text, font_size, false, false, SANS);
    let baseline = (line_height - font_size) / 2.0 + fonts.ascender_pt(font_size, false, false, SANS);

    lb.text = Some(TextContent {
        lines: vec![TextLine {
            text: text.to_string(),
            x_offset: align_offset(align, width, line_width),
            y_offset,
        }],
        font_family: SANS.to_string(),
        font_size,
        bold: false,
        italic: false,
        color: mbox.color.to_array(),
        line_height,
        baseline,
        text_align: align_name(align).to_string(),
        rtl: false,
        underline: false,
        line_through: false,
        list_marker: None,
    });

    let border = BorderStyle {
        top: mbox.border_top.map(border_edge),
        bottom: mbox.border_bottom.map(border_edge),
        ..BorderStyle::default()
    };
    if !border.is_empty() {
        lb.border = Some(border);
    }
    lb
}

fn align_name(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Center => "center",
        TextAlign::Right => "right",
        _ => "left",
    }
}

fn align_offset(align: TextAlign, box_width: f32, line_width: f32) -> f32 {
    match align {
        TextAlign::Center => ((box_width - line_width) / 2.0).max(0.0),
        TextAlign::Right => (box_width - line_width).max(0.0),
        _ => 0.0,
    }
}

fn border_edge(side: BorderSide) -> BorderEdge {
    BorderEdge {
        width: side.width,
        color: side.color.to_array(),
    }
}

fn text_content(
    style: &ComputedStyle,
    lines: Vec<TextLine>,
    list_marker: Option<String>,
    fonts: &FontManager,
) -> TextContent {
    let line_height = fonts.line_height_pt(style.font_size, style.line_height);
    let ascender = fonts.ascender_pt(
        style.font_size,
        style.is_bold(),
        style.is_italic(),
        &style.font_family,
    );
    TextContent {
        lines,
        font_family: style.font_family.clone(),
        font_size: style.font_size,
        bold: style.is_bold(),
        italic: style.is_italic(),
        color: style.color.to_array(),
        line_height,
        baseline: (line_height - style.font_size) / 2.0 + ascender,
        text_align: align_name(style.effective_align()).to_string(),
        rtl: style.is_rtl(),
        underline: style.text_decoration == TextDecoration::Underline,
        line_through: style.text_decoration == TextDecoration::LineThrough,
        list_marker,
    }
}

/// Lines `range` of a text box, placed at page-absolute `abs_y`.
fn text_slice(
    pbox: &PositionedBox,
    range: Range<usize>,
    abs_y: f32,
    line_height: f32,
    fonts: &FontManager,
) -> LayoutBox {
    let shift = range.start as f32 * line_height;
    let mut lb = build_layout_box(pbox, pbox.x, abs_y, fonts);
    lb.height = range.len() as f32 * line_height;
    if let Some(text) = lb.text.as_mut() {
        let kept: Vec<TextLine> = text
            .lines
            .drain(range)
            .map(|mut line| {
                line.y_offset -= shift;
                line
            })
            .collect();
        text.lines = kept;
    }
    lb
}

/// Recursively build a LayoutBox tree where every box carries *page-absolute*
/// x/y coordinates (origin = top-left of the physical page).
///
/// For each child, its absolute y is derived by:
///   `child_abs_y = parent_abs_y + (child.y − parent.y)`
/// because PositionedBox.y values are accumulated document-space absolutes,
/// so the difference gives the child's position relative to its parent.
fn build_layout_box(pbox: &PositionedBox, abs_x: f32, abs_y: f32, fonts: &FontManager) -> LayoutBox {
    let style = &pbox.style;
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);

    // Background
    if !style.background_color.is_transparent() {
        lb.background_color = Some(style.background_color.to_array());
    }

    // Border
    let border = BorderStyle {
        top: style.border_top.map(border_edge),
        right: style.border_right.map(border_edge),
        bottom: style.border_bottom.map(border_edge),
        left: style.border_left.map(border_edge),
    };
    if !border.is_empty() {
        lb.border = Some(border);
    }

    // Content
    match &pbox.content {
        BoxContent::Text { lines, .. } => {
            let line_height = fonts.line_height_pt(style.font_size, style.line_height);
            let align = style.effective_align();
            let text_lines: Vec<TextLine> = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    let width = fonts.measure_text_width(
                        line,
                        style.font_size,
                        style.is_bold(),
                        style.is_italic(),
                        &style.font_family,
                    );
                    TextLine {
                        text: line.clone(),
                        x_offset: align_offset(align, pbox.width, width),
                        y_offset: i as f32 * line_height,
                    }
                })
                .collect();
            lb.text = Some(text_content(style, text_lines, None, fonts));
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::ListItem { marker } => {
            // `lines` is empty – the bullet / number is rendered via
            // `list_marker` in the gutter on the start side, while the li's
            // actual text content comes from its child boxes.
            let mut text = text_content(style, Vec::new(), Some(marker.clone()), fonts);
            text.underline = false;
            text.line_through = false;
            lb.text = Some(text);
        }
        BoxContent::None => {}
    }

    // Recurse into children, propagating absolute coordinates.
    for child in &pbox.children {
        let child_abs_x = child.x; // already page-absolute (extract added the left margin)
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children
            .push(build_layout_box(child, child_abs_x, child_abs_y, fonts));
    }

    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;
    use crate::dom::parse_html;
    use crate::layout::compute_layout;
    use crate::style::build_styled_tree;

    fn paginate_html(html: &str, css: &str) -> LayoutConfig {
        let sheet = Stylesheet::parse(css);
        let styled = build_styled_tree(&parse_html(html), None, &sheet, &[]);
        let fonts = FontManager::default();
        let geometry = PageGeometry::a4();
        let boxes =
            compute_layout(&styled, geometry.content_width(), geometry.margins[3], &fonts).unwrap();
        paginate(&boxes, &geometry, &fonts)
    }

    fn page_text(page: &PageLayout) -> String {
        let config = LayoutConfig {
            pages: vec![page.clone()],
            ..LayoutConfig::a4()
        };
        config.plain_text()
    }

    #[test]
    fn single_page() {
        let config = paginate_html("<p>Short text</p>", "");
        assert_eq!(config.pages.len(), 1);
        let lb = &config.pages[0].boxes[0];
        assert!((lb.y - DEFAULT_MARGINS_PT[0] - 12.0).abs() < 0.5, "y = {}", lb.y);
    }

    #[test]
    fn empty_document_has_one_page() {
        let config = paginate_html("", "");
        assert_eq!(config.pages.len(), 1);
        assert!(config.pages[0].boxes.is_empty());
    }

    #[test]
    fn multiple_pages() {
        // Generate enough content to fill multiple pages
        let mut html = String::new();
        for i in 0..60 {
            html.push_str(&format!("<p>Paragraph {} with some text</p>", i));
        }
        let config = paginate_html(&html, "");
        assert!(
            config.pages.len() > 1,
            "Expected multiple pages, got {}",
            config.pages.len()
        );
        let bottom_limit = 841.89 - DEFAULT_MARGINS_PT[2] + 0.1;
        for page in &config.pages {
            for lb in &page.boxes {
                assert!(lb.y + lb.height <= bottom_limit);
            }
        }
    }

    #[test]
    fn forced_break_starts_new_page() {
        let config = paginate_html(
            "<p>one</p><p style=\"page-break-before: always\">two</p>",
            "",
        );
        assert_eq!(config.pages.len(), 2);
        assert_eq!(page_text(&config.pages[1]), "two\n");
    }

    #[test]
    fn list_wrapper_is_split_between_items() {
        let mut html = String::from("<ul>");
        for i in 0..80 {
            html.push_str(&format!("<li>item {i}</li>"));
        }
        html.push_str("</ul>");
        let config = paginate_html(&html, "");
        assert!(config.pages.len() > 1);
        let first = page_text(&config.pages[0]);
        assert!(first.starts_with("item 0\n"));
    }

    #[test]
    fn heading_moves_with_following_paragraph() {
        let css = "p { margin: 0; font-size: 10pt; line-height: 1; } \
                   h2 { margin: 0; font-size: 10pt; line-height: 1; page-break-after: avoid; }";
        let mut html = String::new();
        // Fill the page to leave room for the heading but not the paragraph.
        let per_page = (PageGeometry::a4().content_height() / 10.0).floor() as usize;
        for i in 0..per_page - 1 {
            html.push_str(&format!("<p>filler {i}</p>"));
        }
        html.push_str("<h2>Heading</h2><div style=\"page-break-inside: avoid\"><p>a</p><p>b</p></div>");
        let config = paginate_html(&html, css);
        assert_eq!(config.pages.len(), 2);
        assert!(page_text(&config.pages[1]).starts_with("Heading\n"));
    }

    #[test]
    fn oversized_preformatted_block_splits_by_lines() {
        let code: Vec<String> = (0..120).map(|i| format!("line {i}")).collect();
        let html = format!("<pre>{}</pre>", code.join("\n"));
        let config = paginate_html(&html, "pre { page-break-inside: avoid; }");
        assert!(config.pages.len() >= 2);
        let all = config.plain_text();
        assert_eq!(all.lines().count(), 120);
        assert!(page_text(&config.pages[1]).lines().next().is_some());
    }

    #[test]
    fn margin_boxes_resolve_counters() {
        let css = "@page { @top-center { content: \"Title\"; } \
                   @bottom-center { content: \"Page \" counter(page) \" of \" counter(pages); } } \
                   @page :first { @top-center { content: none; } }";
        let sheet = Stylesheet::parse(css);
        let mut config = paginate_html("<p>a</p><p style=\"break-before: page\">b</p>", "");
        let fonts = FontManager::default();
        decorate_pages(&mut config, &sheet.page, &PageGeometry::a4(), &fonts);

        let texts = |page: &PageLayout| -> Vec<String> {
            page.boxes
                .iter()
                .filter(|b| b.y < DEFAULT_MARGINS_PT[0] || b.y >= 841.89 - DEFAULT_MARGINS_PT[2])
                .filter_map(|b| b.text.as_ref())
                .map(|t| t.lines[0].text.clone())
                .collect()
        };
        assert_eq!(texts(&config.pages[0]), vec!["Page 1 of 2"]);
        assert_eq!(texts(&config.pages[1]), vec!["Title", "Page 2 of 2"]);
    }

    #[test]
    fn rtl_text_is_right_aligned() {
        let config = paginate_html("<p dir=\"rtl\">שלום</p>", "");
        let text = config.pages[0].boxes[0].children[0].text.as_ref().unwrap();
        assert!(text.rtl);
        assert_eq!(text.text_align, "right");
        assert!(text.lines[0].x_offset > 0.0);
    }
}
