//! Template composer – wraps an HTML fragment into a complete print-ready
//! document with the embedded stylesheet.

/// Placeholder in [`PRINT_STYLESHEET`] replaced by the running-header title.
const TITLE_SLOT: &str = "%RUNNING_TITLE%";

/// The print stylesheet. Every presentational constant lives here.
pub const PRINT_STYLESHEET: &str = r##"
        @page {
            size: A4;
            margin: 2cm 1.5cm;

            @top-center {
                content: "%RUNNING_TITLE%";
                font-size: 9pt;
                color: #666;
                padding-bottom: 5px;
                border-bottom: 1px solid #ddd;
            }

            @bottom-center {
                content: "Page " counter(page) " of " counter(pages);
                font-size: 9pt;
                color: #666;
            }
        }

        @page :first {
            @top-center { content: none; }
        }

        body {
            font-family: 'Segoe UI', Tahoma, Arial, sans-serif;
            font-size: 11pt;
            line-height: 1.6;
            color: #333;
            max-width: 100%;
        }

        /* Headings */
        h1 {
            font-size: 24pt;
            color: #0f2cbd;
            border-bottom: 3px solid #0f2cbd;
            padding-bottom: 0.3em;
            margin-top: 1.5em;
            margin-bottom: 0.8em;
            page-break-after: avoid;
        }

        h1:first-of-type {
            margin-top: 0;
            font-size: 26pt;
            text-align: center;
            border-bottom: none;
        }

        h2 {
            font-size: 18pt;
            color: #1a3a8a;
            margin-top: 1.5em;
            margin-bottom: 0.6em;
            page-break-after: avoid;
            border-bottom: 2px solid #e5e7eb;
            padding-bottom: 0.2em;
        }

        h3 {
            font-size: 14pt;
            color: #2563eb;
            margin-top: 1.2em;
            margin-bottom: 0.5em;
            page-break-after: avoid;
        }

        h4 {
            font-size: 12pt;
            color: #4b5563;
            margin-top: 1em;
            margin-bottom: 0.5em;
            font-weight: 600;
            page-break-after: avoid;
        }

        /* Paragraphs */
        p {
            margin: 0.5em 0;
            text-align: justify;
        }

        /* Lists */
        ul, ol {
            margin: 0.5em 0;
            padding-left: 2em;
        }

        li {
            margin: 0.3em 0;
        }

        /* Code blocks */
        pre {
            background: #f5f5f5;
            padding: 1em;
            border-left: 4px solid #0f2cbd;
            border-radius: 4px;
            overflow-x: auto;
            font-family: 'Courier New', Consolas, monospace;
            font-size: 9pt;
            line-height: 1.4;
            margin: 1em 0;
            page-break-inside: avoid;
        }

        code {
            background: #f0f0f0;
            padding: 2px 6px;
            border-radius: 3px;
            font-family: 'Courier New', Consolas, monospace;
            font-size: 10pt;
            color: #d63384;
        }

        pre code {
            background: none;
            padding: 0;
            color: #333;
        }

        /* Tables */
        table {
            border-collapse: collapse;
            width: 100%;
            margin: 1em 0;
            font-size: 10pt;
            page-break-inside: avoid;
        }

        th, td {
            border: 1px solid #d1d5db;
            padding: 8px 12px;
            text-align: left;
        }

        th {
            background: #f3f4f6;
            font-weight: 600;
            color: #1f2937;
        }

        tr:nth-child(even) {
            background: #f9fafb;
        }

        /* Horizontal rules */
        hr {
            border: none;
            border-top: 2px solid #e5e7eb;
            margin: 2em 0;
        }

        /* Blockquotes */
        blockquote {
            border-left: 4px solid #9ca3af;
            margin: 1em 0;
            padding-left: 1em;
            color: #6b7280;
            font-style: italic;
        }

        .emoji {
            font-size: 1.2em;
        }

        /* Hebrew text */
        [dir="rtl"], .rtl {
            direction: rtl;
            text-align: right;
            font-family: 'Arial', 'Times New Roman', sans-serif;
        }

        strong, b {
            font-weight: 600;
            color: #1f2937;
        }

        em, i {
            font-style: italic;
        }

        a {
            color: #0f2cbd;
            text-decoration: none;
        }

        .section-divider {
            text-align: center;
            margin: 2em 0;
            color: #9ca3af;
            font-size: 14pt;
        }

        h1, h2, h3, h4, h5, h6 {
            page-break-inside: avoid;
        }

        table, figure, img, pre {
            page-break-inside: avoid;
        }

        li {
            page-break-inside: avoid;
        }

        .cover-title {
            text-align: center;
            padding: 2em 0;
            margin-bottom: 1em;
        }
"##;

/// Parameters of the document shell.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Running-header title, also used as the HTML `<title>`.
    pub title: String,
    /// Value of the `<html lang>` attribute.
    pub lang: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            title: "ABcon System Review - Management Decisions Guide".to_string(),
            lang: "en".to_string(),
        }
    }
}

/// The stylesheet with the running-header title filled in.
pub fn stylesheet(title: &str) -> String {
    PRINT_STYLESHEET.replace(TITLE_SLOT, &escape_css_string(title))
}

/// Embed `fragment` verbatim into a full HTML document.
pub fn compose(fragment: &str, config: &TemplateConfig) -> String {
    let mut html = String::with_capacity(PRINT_STYLESHEET.len() + fragment.len() + 512);
    html.push_str("\n<!DOCTYPE html>\n");
    html.push_str(&format!(
        "<html lang=\"{}\">\n",
        html_escape::encode_double_quoted_attribute(&config.lang)
    ));
    html.push_str("<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!(
        "    <title>{}</title>\n",
        html_escape::encode_text(&config.title)
    ));
    html.push_str("    <style>");
    html.push_str(&stylesheet(&config.title));
    html.push_str("    </style>\n");
    html.push_str("</head>\n<body>\n");
    html.push_str(fragment);
    html.push_str("\n</body>\n</html>\n");
    html
}

/// Escape a value for use inside a double-quoted CSS string.
fn escape_css_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\A "),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_is_embedded_verbatim() {
        let fragment = "<p>a &amp; <b>b</b></p>\n<p>שלום</p>";
        let html = compose(fragment, &TemplateConfig::default());
        assert!(html.contains(&format!("<body>\n{fragment}\n</body>")));
    }

    #[test]
    fn head_carries_title_and_stylesheet() {
        let config = TemplateConfig {
            title: "Q&A <Guide>".to_string(),
            ..TemplateConfig::default()
        };
        let html = compose("", &config);
        assert!(html.contains("<title>Q&amp;A &lt;Guide&gt;</title>"));
        assert!(html.contains("content: \"Q&A <Guide>\";"));
        assert!(html.contains("@page :first"));
        assert!(html.contains("counter(pages)"));
    }

    #[test]
    fn title_quotes_are_escaped_in_css() {
        let css = stylesheet(r#"The "Plan""#);
        assert!(css.contains(r#"content: "The \"Plan\"";"#));
        assert!(!css.contains(TITLE_SLOT));
    }

    #[test]
    fn stylesheet_appears_once() {
        let html = compose("<p>x</p>", &TemplateConfig::default());
        assert_eq!(html.matches("@bottom-center").count(), 1);
    }
}
