//! # bilingual-pdf – bilingual markdown → PDF pipeline
//!
//! Converts a mixed English/Hebrew markdown document into a print-styled,
//! paginated PDF. The stages are:
//!
//! 1. **Load** – read the UTF-8 source ([`loader`])
//! 2. **Markdown** – markdown → HTML fragment with comrak ([`markdown`])
//! 3. **Template** – embed the fragment in the print stylesheet shell ([`template`])
//! 4. **RTL** – mark Hebrew lines right-to-left ([`rtl`])
//! 5. **Render** – HTML → PDF through an in-crate paged-media engine:
//!    parse ([`dom`]), stylesheet ([`css`]), style ([`style`]),
//!    layout with Taffy ([`layout`]), paginate ([`pagination`]) and emit
//!    PDF bytes via printpdf ([`render`]), tied together in [`pipeline`].
//!
//! [`convert`] runs all of them for one file.

pub mod convert;
pub mod css;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod loader;
pub mod markdown;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod rtl;
pub mod samples;
pub mod style;
pub mod template;

// Re-exports for convenience
pub use convert::{build_html, convert, ConvertConfig, ConversionReport, Document};
pub use error::{Error, LoadError, RenderError, Result, WriteError};
pub use markdown::Extensions;
pub use pipeline::{generate_pdf, PipelineConfig};
pub use rtl::tag_rtl;
pub use template::{compose, TemplateConfig};
