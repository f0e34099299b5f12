//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Text is drawn with the TrueType faces held by the [`FontManager`] when
//! it has them, so Hebrew renders; otherwise the builtin Helvetica/Courier
//! faces are used with WinAnsi encoding. Lines are stored in logical order
//! and reordered for display here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;
use unicode_bidi::{bidi_class, BidiClass, BidiInfo, Level};

use crate::fonts::{FontKey, FontManager, MONO};
use crate::layout_config::*;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Font used for one text run.
#[derive(Clone)]
enum PdfFace {
    Embedded(FontId),
    Builtin(BuiltinFont),
}

/// Everything shared by the boxes of a document while drawing.
struct RenderContext<'a> {
    page_height: f32,
    images: HashMap<String, ImageResource>,
    /// Embedded faces keyed by the address of their shared bytes, so the
    /// same file registered under several keys is embedded once.
    faces: HashMap<usize, FontId>,
    fonts: &'a FontManager,
}

impl RenderContext<'_> {
    fn face(&self, family: &str, bold: bool, italic: bool) -> PdfFace {
        let key = FontKey::new(family, bold, italic);
        self.fonts
            .font_bytes(&key)
            .and_then(|bytes| self.faces.get(&(Arc::as_ptr(&bytes) as usize)))
            .map(|id| PdfFace::Embedded(id.clone()))
            .unwrap_or_else(|| PdfFace::Builtin(builtin_font(family, bold, italic)))
    }

    fn measure(&self, text: &TextContent, s: &str) -> f32 {
        self.fonts
            .measure_text_width(s, text.font_size, text.bold, text.italic, &text.font_family)
    }
}

fn builtin_font(family: &str, bold: bool, italic: bool) -> BuiltinFont {
    match (family == MONO, bold, italic) {
        (true, true, true) => BuiltinFont::CourierBoldOblique,
        (true, true, false) => BuiltinFont::CourierBold,
        (true, false, true) => BuiltinFont::CourierOblique,
        (true, false, false) => BuiltinFont::Courier,
        (false, true, true) => BuiltinFont::HelveticaBoldOblique,
        (false, true, false) => BuiltinFont::HelveticaBold,
        (false, false, true) => BuiltinFont::HelveticaOblique,
        (false, false, false) => BuiltinFont::Helvetica,
    }
}

/// Render a LayoutConfig into PDF bytes.
///
/// `<img>` elements whose `src` is not a base64 data URI, or whose bytes
/// cannot be decoded, are silently skipped (a `log::warn` is emitted).
pub fn render_pdf(config: &LayoutConfig, fonts: &FontManager) -> Result<Vec<u8>, String> {
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    // ── Register TrueType faces ───────────────────────────────────────────
    let mut faces: HashMap<usize, FontId> = HashMap::new();
    for key in fonts.keys() {
        let Some(bytes) = fonts.font_bytes(&key) else {
            continue;
        };
        let addr = Arc::as_ptr(&bytes) as usize;
        if faces.contains_key(&addr) {
            continue;
        }
        match ParsedFont::from_bytes(&bytes, 0, &mut warnings) {
            Some(parsed) => {
                faces.insert(addr, doc.add_font(&parsed));
            }
            None => log::warn!("Could not parse font for {:?}; using builtin face", key),
        }
    }
    if faces.is_empty() && config.plain_text().chars().any(|c| c as u32 > 0xFF) {
        log::warn!(
            "No TrueType font loaded; falling back to builtin fonts, \
             non-Latin text (e.g. Hebrew) will not render"
        );
    }

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    for src in &all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };

        // Decode with the `image` crate to obtain pixel dimensions.
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image, decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        // Register with printpdf as a reusable XObject.
        let raw = match RawImage::decode_from_bytes(&bytes, &mut warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image, PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    let ctx = RenderContext {
        page_height: config.page_height_pt,
        images: image_resources,
        faces,
        fonts,
    };

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();
    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, &ctx);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    // Builtin-font text is written as raw `Tj` operators, which the
    // default (secure) save options would drop.
    let options = PdfSaveOptions {
        secure: false,
        ..PdfSaveOptions::default()
    };
    let bytes = doc.save(&options, &mut warnings);
    log::debug!(
        "Rendered {} page(s), {} bytes, {} printpdf warning(s)",
        config.pages.len().max(1),
        bytes.len(),
        warnings.len()
    );

    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Bidirectional text
// ---------------------------------------------------------------------------

fn is_strong_rtl(c: char) -> bool {
    matches!(bidi_class(c), BidiClass::R | BidiClass::AL)
}

/// Hebrew points and cantillation marks, plus generic combining marks.
fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'
        | '\u{0591}'..='\u{05BD}'
        | '\u{05BF}'
        | '\u{05C1}'
        | '\u{05C2}'
        | '\u{05C4}'
        | '\u{05C5}'
        | '\u{05C7}')
}

fn mirror(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '\u{00AB}' => '\u{00BB}',
        '\u{00BB}' => '\u{00AB}',
        other => other,
    }
}

/// Reverse a right-to-left run, keeping combining marks after their base
/// and mirroring brackets.
fn push_reversed(run: &str, out: &mut String) {
    let mut clusters: Vec<String> = Vec::new();
    for c in run.chars() {
        match clusters.last_mut() {
            Some(cluster) if is_combining_mark(c) => cluster.push(c),
            _ => clusters.push(mirror(c).to_string()),
        }
    }
    for cluster in clusters.iter().rev() {
        out.push_str(cluster);
    }
}

/// Reorder one logical line into display order. `rtl` sets the paragraph
/// direction.
pub fn visual_line(text: &str, rtl: bool) -> String {
    if !rtl && !text.chars().any(is_strong_rtl) {
        return text.to_string();
    }
    let level = if rtl { Level::rtl() } else { Level::ltr() };
    let info = BidiInfo::new(text, Some(level));
    let mut out = String::with_capacity(text.len());
    for para in &info.paragraphs {
        let (levels, runs) = info.visual_runs(para, para.range.clone());
        for run in runs {
            let slice = &text[run.clone()];
            if levels[run.start].is_rtl() {
                push_reversed(slice, &mut out);
            } else {
                out.push_str(slice);
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Encode `s` as WinAnsi (Windows-1252) bytes, one per glyph. Characters
/// outside the encoding become `?`.
fn winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Show WinAnsi `bytes` in a builtin font.
///
/// printpdf writes builtin text as the UTF-8 bytes of a `String`, which
/// cannot carry bytes 0x80-0xFF on their own, so the string goes out as a
/// hex `Tj` operand instead. The empty `WriteTextBuiltinFont` emits nothing
/// but registers the font in the page resources.
fn builtin_text_ops(font: BuiltinFont, bytes: &[u8]) -> [Op; 2] {
    [
        Op::WriteTextBuiltinFont {
            items: Vec::new(),
            font,
        },
        Op::Unknown {
            key: "Tj".to_string(),
            value: vec![DictItem::String {
                data: bytes.to_vec(),
                literal: false,
            }],
        },
    ]
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
///
/// Returns `Err` if `src` is not a data URI or does not use base64 encoding.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    if !src.starts_with("data:") {
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "Image src must be a base64 data URI \
             (e.g. `data:image/png;base64,...`). Got: {preview:?}"
        ));
    }
    let rest = &src["data:".len()..];
    let comma_pos = rest.find(',').ok_or_else(|| {
        "Invalid data URI: missing `,` separator between header and data".to_string()
    })?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("Only base64-encoded data URIs are supported. \
             The header must contain `;base64` (e.g. `data:image/png;base64,...`)."
            .to_string());
    }
    let b64_data = rest[comma_pos + 1..].trim();
    BASE64_STD
        .decode(b64_data)
        .map_err(|e| format!("Base64 decode error: {e}"))
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Filled rectangle in PDF coordinates (origin bottom-left).
fn fill_rect(ops: &mut Vec<Op>, x: f32, y: f32, w: f32, h: f32, color: &[f32; 4]) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: vec![
                    point(x, y),
                    point(x + w, y),
                    point(x + w, y + h),
                    point(x, y + h),
                ],
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

fn draw_hline(ops: &mut Vec<Op>, x1: f32, x2: f32, y: f32, thickness: f32, color: &[f32; 4]) {
    ops.push(Op::SetOutlineThickness { pt: Pt(thickness) });
    ops.push(Op::SetOutlineColor { col: rgb(color) });
    ops.push(Op::DrawLine {
        line: Line {
            points: vec![point(x1, y), point(x2, y)],
            is_closed: false,
        },
    });
}

fn write_text(ops: &mut Vec<Op>, face: &PdfFace, x: f32, y: f32, size: f32, color: &[f32; 4], s: &str) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFillColor { col: rgb(color) });
    match face {
        PdfFace::Embedded(id) => {
            ops.push(Op::SetFontSize {
                size: Pt(size),
                font: id.clone(),
            });
            ops.push(Op::WriteText {
                items: vec![TextItem::Text(s.to_string())],
                font: id.clone(),
            });
        }
        PdfFace::Builtin(font) => {
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font: *font,
            });
            ops.extend(builtin_text_ops(*font, &winansi_bytes(s)));
        }
    }
    ops.push(Op::EndTextSection);
}

// ---------------------------------------------------------------------------
// Boxes
// ---------------------------------------------------------------------------

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(ops: &mut Vec<Op>, lbox: &LayoutBox, ctx: &RenderContext<'_>) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let pdf_top = ctx.page_height - lbox.y;
    let pdf_bottom = pdf_top - lbox.height;

    // Background
    if let Some(bg) = &lbox.background_color {
        fill_rect(ops, lbox.x, pdf_bottom, lbox.width, lbox.height, bg);
    }

    // Border: each edge is a filled strip inside the border box.
    if let Some(border) = &lbox.border {
        if let Some(e) = &border.top {
            fill_rect(ops, lbox.x, pdf_top - e.width, lbox.width, e.width, &e.color);
        }
        if let Some(e) = &border.bottom {
            fill_rect(ops, lbox.x, pdf_bottom, lbox.width, e.width, &e.color);
        }
        if let Some(e) = &border.left {
            fill_rect(ops, lbox.x, pdf_bottom, e.width, lbox.height, &e.color);
        }
        if let Some(e) = &border.right {
            fill_rect(ops, lbox.x + lbox.width - e.width, pdf_bottom, e.width, lbox.height, &e.color);
        }
    }

    if let Some(text) = &lbox.text {
        render_text(ops, lbox, text, ctx);
    }

    // Image – embed from pre-registered XObject
    if let Some(img) = &lbox.image {
        if let Some(res) = ctx.images.get(&img.src) {
            // translate_y = bottom edge of image in PDF coordinates.
            let img_bottom_y = pdf_top - img.height;

            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    // Children
    for child in &lbox.children {
        render_box(ops, child, ctx);
    }
}

fn render_text(ops: &mut Vec<Op>, lbox: &LayoutBox, text: &TextContent, ctx: &RenderContext<'_>) {
    let pdf_top = ctx.page_height - lbox.y;
    let face = ctx.face(&text.font_family, text.bold, text.italic);
    // Older layouts carry no baseline; approximate with the ascender.
    let baseline = if text.baseline > 0.0 {
        text.baseline
    } else {
        text.font_size * 0.75
    };

    for tline in &text.lines {
        if tline.text.trim().is_empty() {
            continue;
        }
        let visual = visual_line(&tline.text, text.rtl);
        let text_x = lbox.x + tline.x_offset;
        let text_y = pdf_top - tline.y_offset - baseline;
        write_text(ops, &face, text_x, text_y, text.font_size, &text.color, &visual);

        if text.underline || text.line_through {
            let width = ctx.measure(text, &tline.text);
            let thickness = (text.font_size / 18.0).max(0.5);
            if text.underline {
                let y = text_y - text.font_size * 0.1;
                draw_hline(ops, text_x, text_x + width, y, thickness, &text.color);
            }
            if text.line_through {
                let y = text_y + text.font_size * 0.3;
                draw_hline(ops, text_x, text_x + width, y, thickness, &text.color);
            }
        }
    }

    // List marker, in the gutter on the start side of the item.
    if let Some(marker) = &text.list_marker {
        let marker = visual_line(marker.trim(), text.rtl);
        let width = ctx.measure(text, &marker);
        let marker_x = if text.rtl {
            lbox.x + lbox.width + 6.0
        } else {
            lbox.x - width - 6.0
        };
        let marker_y = pdf_top - baseline;
        write_text(ops, &face, marker_x, marker_y, text.font_size, &text.color, &marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_box(line: &str, rtl: bool) -> LayoutBox {
        let mut lb = LayoutBox::new(40.0, 60.0, 500.0, 20.0);
        lb.text = Some(TextContent {
            lines: vec![TextLine {
                text: line.to_string(),
                x_offset: 0.0,
                y_offset: 0.0,
            }],
            font_family: "sans-serif".to_string(),
            font_size: 11.0,
            bold: false,
            italic: false,
            color: [0.2, 0.2, 0.2, 1.0],
            line_height: 17.6,
            baseline: 12.0,
            text_align: if rtl { "right" } else { "left" }.to_string(),
            rtl,
            underline: true,
            line_through: false,
            list_marker: Some("1. ".to_string()),
        });
        lb
    }

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::a4();
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn render_text_with_builtin_fallback() {
        let mut config = LayoutConfig::a4();
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![text_box("Hello", false), text_box("שלום עולם", true)],
        });
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn winansi_maps_bullets_and_accents_to_single_bytes() {
        assert_eq!(winansi_bytes("\u{2022} caf\u{e9}"), vec![0x95, b' ', b'c', b'a', b'f', 0xE9]);
        assert_eq!(winansi_bytes("\u{05E9}"), vec![b'?']);
    }

    #[test]
    fn builtin_text_goes_out_as_hex_string() {
        let ops = builtin_text_ops(BuiltinFont::Helvetica, &winansi_bytes("\u{2022} x"));
        assert!(matches!(
            &ops[0],
            Op::WriteTextBuiltinFont { items, font: BuiltinFont::Helvetica } if items.is_empty()
        ));
        match &ops[1] {
            Op::Unknown { key, value } => {
                assert_eq!(key, "Tj");
                assert!(matches!(
                    value.as_slice(),
                    [DictItem::String { data, literal: false }] if data == &vec![0x95, b' ', b'x']
                ));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn ltr_text_is_unchanged() {
        assert_eq!(visual_line("Plain English (text)", false), "Plain English (text)");
    }

    #[test]
    fn hebrew_is_reversed_for_display() {
        assert_eq!(visual_line("אבג", true), "גבא");
    }

    #[test]
    fn embedded_latin_keeps_its_order() {
        // Logical: hebrew word, space, "PDF", space, hebrew word.
        let visual = visual_line("אב PDF גד", true);
        assert_eq!(visual, "דג PDF בא");
    }

    #[test]
    fn brackets_mirror_in_rtl_runs() {
        assert_eq!(visual_line("(אב)", true), "(בא)");
    }

    #[test]
    fn points_stay_after_their_letter() {
        // bet + dagesh, then alef
        let visual = visual_line("\u{05D1}\u{05BC}\u{05D0}", true);
        assert_eq!(visual, "\u{05D0}\u{05D1}\u{05BC}");
    }

    #[test]
    fn data_uri_rejects_remote_urls() {
        assert!(parse_data_uri("https://example.com/a.png").is_err());
        assert!(parse_data_uri("data:image/png,raw").is_err());
        assert_eq!(parse_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
    }
}
