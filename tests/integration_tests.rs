//! Integration tests for the markdown → PDF pipeline.
//!
//! These tests validate:
//! - RTL tagging of the composed document
//! - The stylesheet reaches the rendered layout (page size, header, footer)
//! - PDF output exists and has valid format
//! - End-to-end conversion through the filesystem

use std::fs;

use bilingual_pdf::convert::{build_html, convert, ConvertConfig, Document};
use bilingual_pdf::error::{Error, LoadError};
use bilingual_pdf::fonts::FontManager;
use bilingual_pdf::layout_config::{LayoutBox, LayoutConfig};
use bilingual_pdf::markdown::Extensions;
use bilingual_pdf::pipeline::{compute_layout_config, generate_pdf, PipelineConfig};
use bilingual_pdf::render::render_pdf;
use bilingual_pdf::rtl::tag_rtl;
use bilingual_pdf::samples;
use bilingual_pdf::template::TemplateConfig;

// =====================================================================
// Helper
// =====================================================================

fn offline_pipeline() -> PipelineConfig {
    PipelineConfig {
        system_fonts: false,
        ..PipelineConfig::default()
    }
}

fn offline_convert() -> ConvertConfig {
    ConvertConfig {
        system_fonts: false,
        ..ConvertConfig::default()
    }
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn layout_for(markdown: &str) -> LayoutConfig {
    let html = build_html(markdown, &offline_convert());
    compute_layout_config(&html, &offline_pipeline(), &FontManager::default()).unwrap()
}

fn visit_box(lbox: &LayoutBox, f: &mut dyn FnMut(&LayoutBox)) {
    f(lbox);
    for child in &lbox.children {
        visit_box(child, f);
    }
}

fn page_lines(config: &LayoutConfig, page: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for lbox in &config.pages[page].boxes {
        visit_box(lbox, &mut |b| {
            if let Some(text) = &b.text {
                lines.extend(text.lines.iter().map(|l| l.text.clone()));
            }
        });
    }
    lines
}

// =====================================================================
// RTL tagging through the HTML stages
// =====================================================================

#[test]
fn hebrew_line_is_tagged_in_final_html() {
    let doc = Document::from_markdown(
        samples::minimal_bilingual(),
        &Extensions::default(),
        &TemplateConfig::default(),
    );
    assert!(doc.tagged.contains("<h1>Title</h1>"));
    assert!(doc.tagged.contains("<p dir=\"rtl\">כותרת בעברית</p>"));
}

#[test]
fn english_document_is_not_tagged() {
    let doc = Document::from_markdown(
        samples::english_only(),
        &Extensions::default(),
        &TemplateConfig::default(),
    );
    assert_eq!(doc.tagged, doc.composed);
    assert!(!doc.has_rtl_blocks());
}

#[test]
fn table_cells_are_tagged_line_by_line() {
    // One cell per line in the rendered table, so only Hebrew cells change.
    let html = build_html(samples::meeting_guide(), &offline_convert());
    assert!(html.contains("<td>Chapters</td>"));
    assert!(html.contains("<td dir=\"rtl\">פרקים</td>"));
    assert!(html.contains("<th dir=\"rtl\">נושא</th>"));
    assert!(html.contains("<h2 dir=\"rtl\">1. Budget Module / מודול תקציב</h2>"));
}

#[test]
fn tagging_is_idempotent_and_keeps_line_count() {
    let html = build_html(samples::meeting_guide(), &offline_convert());
    assert_eq!(tag_rtl(&html), html);
    let doc = Document::from_markdown(
        samples::meeting_guide(),
        &Extensions::default(),
        &TemplateConfig::default(),
    );
    assert_eq!(doc.composed.split('\n').count(), doc.tagged.split('\n').count());
}

#[test]
fn raw_html_passes_through() {
    let html = build_html(samples::raw_html(), &offline_convert());
    assert!(html.contains("<div class=\"section-divider\"></div>"));
    assert!(html.contains("<strong>inline HTML</strong>"));
}

// =====================================================================
// Stylesheet applied by the renderer
// =====================================================================

#[test]
fn layout_uses_a4_and_template_margins() {
    let config = layout_for(samples::minimal_bilingual());
    assert!((config.page_width_pt - 595.28).abs() < 0.5);
    assert!((config.page_height_pt - 841.89).abs() < 0.5);
    assert_eq!(config.title, "ABcon System Review - Management Decisions Guide");

    // 1.5cm side margins.
    let first = &config.pages[0].boxes[0];
    assert!((first.x - 42.52).abs() < 0.1, "x = {}", first.x);
}

#[test]
fn hebrew_paragraph_is_rtl_and_right_aligned() {
    let config = layout_for(samples::minimal_bilingual());
    let mut found = false;
    for lbox in &config.pages[0].boxes {
        visit_box(lbox, &mut |b| {
            if let Some(text) = &b.text {
                if text.lines.iter().any(|l| l.text == "כותרת בעברית") {
                    assert!(text.rtl);
                    assert_eq!(text.text_align, "right");
                    found = true;
                }
            }
        });
    }
    assert!(found, "Hebrew paragraph not found in layout");
}

#[test]
fn first_heading_is_centered() {
    let config = layout_for(samples::minimal_bilingual());
    let mut align = None;
    for lbox in &config.pages[0].boxes {
        visit_box(lbox, &mut |b| {
            if let Some(text) = &b.text {
                if text.lines.iter().any(|l| l.text == "Title") {
                    align = Some(text.text_align.clone());
                    assert_eq!(text.font_size, 26.0);
                }
            }
        });
    }
    assert_eq!(align.as_deref(), Some("center"));
}

#[test]
fn running_header_skips_first_page_and_footer_counts_pages() {
    let config = layout_for(&samples::multi_page());
    let pages = config.pages.len();
    assert!(pages >= 2, "Expected several pages, got {pages}");

    let first = page_lines(&config, 0);
    assert!(first.contains(&format!("Page 1 of {pages}")));
    assert!(!first.contains(&config.title));

    let second = page_lines(&config, 1);
    assert!(second.contains(&format!("Page 2 of {pages}")));
    assert!(second.contains(&config.title));
}

#[test]
fn content_stays_inside_the_page_margins() {
    let config = layout_for(&samples::multi_page());
    let bottom = config.page_height_pt - 56.69;
    for page in &config.pages {
        for lbox in &page.boxes {
            if lbox.y < 56.69 || lbox.y >= bottom {
                continue; // margin boxes
            }
            assert!(
                lbox.y + lbox.height <= bottom + 0.5,
                "box at y={} h={} overflows the page",
                lbox.y,
                lbox.height
            );
        }
    }
}

#[test]
fn section_heading_is_not_left_at_page_bottom() {
    let config = layout_for(&samples::multi_page());
    for page in 0..config.pages.len() {
        let lines = page_lines(&config, page);
        let body: Vec<&String> = lines
            .iter()
            .filter(|l| !l.starts_with("Page ") && **l != config.title)
            .collect();
        if let Some(last) = body.last() {
            assert!(!last.starts_with("Section "), "page {page} ends with heading {last}");
        }
    }
}

// =====================================================================
// PDF generation
// =====================================================================

#[test]
fn generate_pdf_from_meeting_guide() {
    let html = build_html(samples::meeting_guide(), &offline_convert());
    let (bytes, config) = generate_pdf(&html, &offline_pipeline()).unwrap();
    assert_valid_pdf(&bytes);
    assert!(!config.pages.is_empty());
}

#[test]
fn generate_pdf_with_system_fonts() {
    // Uses a Hebrew-capable system font when one is installed, builtin
    // fonts otherwise; either way a PDF comes out.
    let html = build_html(samples::minimal_bilingual(), &ConvertConfig::default());
    let (bytes, _) = generate_pdf(&html, &PipelineConfig::default()).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn render_from_layout_config_json() {
    let config = layout_for(samples::meeting_guide());
    let parsed = LayoutConfig::from_json(&config.to_json()).unwrap();
    assert_eq!(config.pages.len(), parsed.pages.len());
    let bytes = render_pdf(&parsed, &FontManager::default()).unwrap();
    assert_valid_pdf(&bytes);
}

// =====================================================================
// End to end through the filesystem
// =====================================================================

#[test]
fn convert_writes_pdf_and_reports_size() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("guide.md");
    fs::write(&input, samples::meeting_guide()).unwrap();

    let config = ConvertConfig {
        input_path: input,
        output_path: dir.path().join("out/guide.pdf"),
        ..offline_convert()
    };
    let report = convert(&config).unwrap();

    let written = fs::read(&config.output_path).unwrap();
    assert_valid_pdf(&written);
    assert_eq!(report.bytes_written, written.len());
    assert!(report.pages >= 1);
    assert!(report.size_kb() > 0.0);
}

#[test]
fn convert_overwrites_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.md");
    let output = dir.path().join("out.pdf");
    fs::write(&input, samples::minimal_bilingual()).unwrap();
    fs::write(&output, b"stale").unwrap();

    let config = ConvertConfig {
        input_path: input,
        output_path: output.clone(),
        ..offline_convert()
    };
    convert(&config).unwrap();
    assert_valid_pdf(&fs::read(&output).unwrap());
}

#[test]
fn convert_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConvertConfig {
        input_path: dir.path().join("absent.md"),
        output_path: dir.path().join("absent.pdf"),
        ..offline_convert()
    };
    let err = convert(&config).unwrap_err();
    assert!(matches!(err, Error::Load(LoadError::NotFound { .. })));
    assert!(err.to_string().contains("absent.md"));
}

#[test]
fn convert_reports_unwritable_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.md");
    fs::write(&input, "# x").unwrap();
    // A regular file used as a directory.
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"").unwrap();

    let config = ConvertConfig {
        input_path: input,
        output_path: blocker.join("out.pdf"),
        ..offline_convert()
    };
    let err = convert(&config).unwrap_err();
    assert!(matches!(err, Error::Write(_)));
}
