//! Markdown renderer – converts markdown text into an HTML fragment with
//! `comrak`.
//!
//! Fenced code blocks and "sane" list handling (an ordered list never
//! absorbs an adjacent bullet list) are part of CommonMark itself, so only
//! the non-core behaviour is switchable.

use comrak::{markdown_to_html, Options};

/// The markdown extension set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions {
    /// GFM pipe tables.
    pub tables: bool,
    /// Every newline inside a paragraph becomes `<br />`.
    pub nl2br: bool,
    /// Pass raw HTML in the source through unchanged.
    pub raw_html: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            tables: true,
            nl2br: true,
            raw_html: true,
        }
    }
}

impl Extensions {
    fn to_options(&self) -> Options {
        let mut options = Options::default();
        options.extension.table = self.tables;
        options.render.hardbreaks = self.nl2br;
        options.render.unsafe_ = self.raw_html;
        options
    }
}

/// Render `markdown` to an HTML fragment.
///
/// Deterministic: the same input and extension set always produce the same
/// output.
pub fn render(markdown: &str, extensions: &Extensions) -> String {
    let html = markdown_to_html(markdown, &extensions.to_options());
    log::debug!(
        "Rendered markdown ({} bytes) to HTML fragment ({} bytes)",
        markdown.len(),
        html.len()
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_table_one_cell_per_line() {
        let md = "| Name | שם |\n|---|---|\n| Alice | אליס |\n";
        let html = render(md, &Extensions::default());
        assert!(html.contains("<table>"));
        assert!(html.lines().any(|l| l == "<th>שם</th>"));
        assert!(html.lines().any(|l| l == "<td>Alice</td>"));
    }

    #[test]
    fn tables_can_be_disabled() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let ext = Extensions {
            tables: false,
            ..Extensions::default()
        };
        assert!(!render(md, &ext).contains("<table>"));
    }

    #[test]
    fn newlines_become_line_breaks() {
        let html = render("first line\nsecond line", &Extensions::default());
        assert!(html.contains("<br />"));
    }

    #[test]
    fn fenced_code_is_preserved() {
        let html = render("```\nlet x = 1;\n```\n", &Extensions::default());
        assert!(html.contains("<pre><code>let x = 1;\n</code></pre>"));
    }

    #[test]
    fn bullet_after_ordered_list_starts_new_list() {
        let html = render("1. one\n2. two\n- three\n", &Extensions::default());
        assert!(html.contains("<ol>"));
        assert!(html.contains("<ul>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let md = "# Title\n\nכותרת בעברית\n";
        let ext = Extensions::default();
        assert_eq!(render(md, &ext), render(md, &ext));
    }
}
