//! Pipeline – ties together parsing, styling, layout, pagination, and
//! rendering into a single function call.

use std::path::PathBuf;

use crate::css::Stylesheet;
use crate::dom::{collect_stylesheets, find_element, parse_html, Tag};
use crate::error::RenderError;
use crate::fonts::{FontManager, SANS};
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::pagination::{decorate_pages, paginate, PageGeometry, DEFAULT_MARGINS_PT};
use crate::render::render_pdf;
use crate::style::style_document;

/// Configuration for the PDF generation pipeline. The document's `@page`
/// rule, when present, overrides the page size and margins.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata when the document has
    /// no `<title>` (default: "Document").
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page margins in points, `[top, right, bottom, left]` (default: 2cm 1.5cm).
    pub margins: [f32; 4],
    /// TrueType font used for all text instead of the discovered one.
    pub font_path: Option<PathBuf>,
    /// Look for a Unicode TrueType font in the usual system locations.
    pub system_fonts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Document".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            margins: DEFAULT_MARGINS_PT,
            font_path: None,
            system_fonts: true,
        }
    }
}

impl PipelineConfig {
    /// Page geometry after the stylesheet's `@page` rule is applied.
    pub fn geometry(&self, sheet: &Stylesheet) -> PageGeometry {
        let (width, height) = sheet
            .page
            .size()
            .unwrap_or((self.page_width, self.page_height));
        PageGeometry {
            width,
            height,
            margins: sheet.page.margins().unwrap_or(self.margins),
        }
    }
}

/// Load the fonts text is measured and drawn with.
pub fn load_fonts(config: &PipelineConfig) -> Result<FontManager, RenderError> {
    let mut fonts = FontManager::new();
    if config.system_fonts && !fonts.discover_system_fonts() {
        log::debug!("No system TrueType font found");
    }
    if let Some(path) = &config.font_path {
        fonts.load_font_file(SANS, path).map_err(RenderError::Pdf)?;
    }
    fonts.ensure_default();
    Ok(fonts)
}

/// Full pipeline: HTML string → PDF bytes.
///
/// Returns the PDF bytes together with the paginated layout.
pub fn generate_pdf(
    html: &str,
    config: &PipelineConfig,
) -> Result<(Vec<u8>, LayoutConfig), RenderError> {
    let fonts = load_fonts(config)?;
    let layout_config = compute_layout_config(html, config, &fonts)?;
    let pdf_bytes = render_pdf(&layout_config, &fonts).map_err(RenderError::Pdf)?;
    Ok((pdf_bytes, layout_config))
}

/// Convenience: render HTML to PDF bytes with the default config.
pub fn render(html: &str) -> Result<Vec<u8>, RenderError> {
    let (bytes, _) = generate_pdf(html, &PipelineConfig::default())?;
    Ok(bytes)
}

/// Generate only the layout config (no PDF rendering) – useful for testing.
pub fn compute_layout_config(
    html: &str,
    config: &PipelineConfig,
    fonts: &FontManager,
) -> Result<LayoutConfig, RenderError> {
    // 1. Parse HTML and its stylesheets
    let dom = parse_html(html);
    let sheet = Stylesheet::parse(&collect_stylesheets(&dom));
    log::debug!(
        "Parsed {} style rule(s) from {} top-level node(s)",
        sheet.rules.len(),
        dom.len()
    );

    // 2. Build styled tree
    let styled = style_document(&dom, &sheet);

    // 3. Compute layout
    let geometry = config.geometry(&sheet);
    let boxes = compute_layout(
        &styled,
        geometry.content_width(),
        geometry.margins[3],
        fonts,
    )
    .map_err(|e| RenderError::Pdf(format!("layout failed: {e}")))?;

    // 4. Paginate and add running headers/footers
    let mut layout_config = paginate(&boxes, &geometry, fonts);
    decorate_pages(&mut layout_config, &sheet.page, &geometry, fonts);
    layout_config.title = find_element(&dom, &Tag::Title)
        .map(|t| t.text_content().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| config.title.clone());

    for page in &layout_config.pages {
        log::trace!("Page {}: {} box(es)", page.page_index + 1, page.boxes.len());
    }
    Ok(layout_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> PipelineConfig {
        PipelineConfig {
            system_fonts: false,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn pipeline_basic() {
        let html = "<h1>Hello</h1><p>World</p>";
        let (bytes, config) = generate_pdf(html, &offline()).unwrap();
        assert!(!bytes.is_empty());
        assert!(!config.pages.is_empty());
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn page_rule_overrides_defaults() {
        let html = "<html><head><title>Guide</title><style>\
                    @page { size: A5 landscape; margin: 1cm; }\
                    </style></head><body><p>x</p></body></html>";
        let fonts = FontManager::default();
        let layout = compute_layout_config(html, &offline(), &fonts).unwrap();
        assert_eq!(layout.title, "Guide");
        assert!(layout.page_width_pt > layout.page_height_pt);
        assert!((layout.page_height_pt - 419.53).abs() < 0.5);
        let first = &layout.pages[0].boxes[0];
        assert!((first.x - 28.35).abs() < 0.1);
    }

    #[test]
    fn config_page_applies_without_page_rule() {
        let config = PipelineConfig {
            page_width: 612.0,
            page_height: 792.0,
            ..offline()
        };
        let layout =
            compute_layout_config("<p>x</p>", &config, &FontManager::default()).unwrap();
        assert_eq!(layout.page_width_pt, 612.0);
        assert_eq!(layout.page_height_pt, 792.0);
        assert_eq!(layout.title, "Document");
        let first = &layout.pages[0].boxes[0];
        assert!((first.x - DEFAULT_MARGINS_PT[3]).abs() < 0.01);
    }

    #[test]
    fn unreadable_font_path_is_a_render_error() {
        let config = PipelineConfig {
            font_path: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..offline()
        };
        let err = generate_pdf("<p>x</p>", &config).unwrap_err();
        assert!(matches!(err, RenderError::Pdf(_)));
    }
}
