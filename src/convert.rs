//! Conversion – runs the whole markdown → PDF pipeline for one document.
//!
//! The HTML-producing stages are pure: [`Document::from_markdown`] needs no
//! filesystem and exposes every intermediate string. [`convert`] adds the
//! loader in front and the PDF renderer and file write behind.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WriteError};
use crate::loader;
use crate::markdown::{self, Extensions};
use crate::pipeline::{generate_pdf, PipelineConfig};
use crate::rtl;
use crate::template::{self, TemplateConfig};

/// Input file used when none is given.
pub const DEFAULT_INPUT: &str = "ABcon_Client_Meeting_Guide.md";
/// Output file used when none is given.
pub const DEFAULT_OUTPUT: &str = "ABcon_Client_Meeting_Guide.pdf";
/// Running-header and metadata title used when none is given.
pub const DEFAULT_TITLE: &str = "ABcon System Review - Management Decisions Guide";

/// Everything one conversion run needs.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Running-header title and PDF metadata title.
    pub title: String,
    pub extensions: Extensions,
    /// TrueType font to draw text with instead of a discovered one.
    pub font_path: Option<PathBuf>,
    /// Look for a Hebrew-capable font in the usual system locations.
    pub system_fonts: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            title: DEFAULT_TITLE.to_string(),
            extensions: Extensions::default(),
            font_path: None,
            system_fonts: true,
        }
    }
}

impl ConvertConfig {
    fn template(&self) -> TemplateConfig {
        TemplateConfig {
            title: self.title.clone(),
            ..TemplateConfig::default()
        }
    }

    fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            title: self.title.clone(),
            font_path: self.font_path.clone(),
            system_fonts: self.system_fonts,
            ..PipelineConfig::default()
        }
    }
}

/// A document at every stage of the HTML pipeline.
#[derive(Debug, Clone)]
pub struct Document {
    /// Markdown source.
    pub source: String,
    /// HTML fragment rendered from the source.
    pub fragment: String,
    /// Fragment embedded in the print template.
    pub composed: String,
    /// Composed document after RTL tagging; this is what gets rendered.
    pub tagged: String,
}

impl Document {
    /// Run the markdown, template and RTL stages.
    pub fn from_markdown(source: &str, extensions: &Extensions, template: &TemplateConfig) -> Self {
        let fragment = markdown::render(source, extensions);
        let composed = template::compose(&fragment, template);
        let tagged = rtl::tag_rtl(&composed);
        Self {
            source: source.to_string(),
            fragment,
            composed,
            tagged,
        }
    }

    /// True when the rendered HTML carries any RTL-tagged block.
    pub fn has_rtl_blocks(&self) -> bool {
        self.tagged.contains(rtl::RTL_ATTRIBUTE)
    }
}

/// Final HTML for `markdown` with the given settings.
pub fn build_html(markdown: &str, config: &ConvertConfig) -> String {
    Document::from_markdown(markdown, &config.extensions, &config.template()).tagged
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub bytes_written: usize,
    pub pages: usize,
}

impl ConversionReport {
    /// Output size in kilobytes.
    pub fn size_kb(&self) -> f64 {
        self.bytes_written as f64 / 1024.0
    }
}

/// Create `path` (and missing parent directories) holding `bytes`.
/// An existing file is overwritten.
pub fn write_output(path: &Path, bytes: &[u8]) -> std::result::Result<(), WriteError> {
    let to_error = |source| WriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
    }
    fs::write(path, bytes).map_err(to_error)
}

/// Convert the configured markdown file into a PDF.
pub fn convert(config: &ConvertConfig) -> Result<ConversionReport> {
    let source = loader::read(&config.input_path)?;
    let document = Document::from_markdown(&source, &config.extensions, &config.template());
    log::debug!(
        "Composed HTML: {} bytes, RTL blocks: {}",
        document.tagged.len(),
        document.has_rtl_blocks()
    );

    let (bytes, layout) = generate_pdf(&document.tagged, &config.pipeline())?;
    write_output(&config.output_path, &bytes)?;
    log::info!(
        "Wrote '{}' ({} bytes, {} page(s))",
        config.output_path.display(),
        bytes.len(),
        layout.pages.len()
    );

    Ok(ConversionReport {
        output_path: config.output_path.clone(),
        bytes_written: bytes.len(),
        pages: layout.pages.len(),
    })
}
