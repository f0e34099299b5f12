//! Layout config – the intermediate representation between layout computation
//! and PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page, running headers and footers included.

use serde::{Deserialize, Serialize};

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    /// Visual styling
    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    /// Children (nested boxes)
    pub children: Vec<LayoutBox>,
}

/// Per-edge borders; a missing edge is not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderStyle {
    pub top: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub left: Option<BorderEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderEdge {
    pub width: f32,
    pub color: [f32; 4],
}

impl BorderStyle {
    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines of text, in logical order.
    pub lines: Vec<TextLine>,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    /// Distance from the top of a line to its baseline.
    #[serde(default)]
    pub baseline: f32,
    /// Resolved alignment: "left", "center" or "right".
    pub text_align: String,
    /// Paragraph direction; lines are reordered for display when set.
    #[serde(default)]
    pub rtl: bool,
    pub underline: bool,
    #[serde(default)]
    pub line_through: bool,
    /// List bullet/number prefix (e.g. "• " or "1. ")
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the layout box (for alignment)
    pub x_offset: f32,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// Create an empty A4 layout config.
    pub fn a4() -> Self {
        Self {
            title: Self::default_title(),
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Document".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// All text of every page, lines joined by `\n`, in page order.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            for b in &page.boxes {
                b.collect_text(&mut out);
            }
        }
        out
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            for line in &text.lines {
                out.push_str(&line.text);
                out.push('\n');
            }
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_keeps_rtl_text() {
        let mut config = LayoutConfig::a4();
        let mut lb = LayoutBox::new(10.0, 20.0, 100.0, 14.0);
        lb.text = Some(TextContent {
            lines: vec![TextLine {
                text: "שלום world".to_string(),
                x_offset: 3.0,
                y_offset: 0.0,
            }],
            font_family: "sans-serif".to_string(),
            font_size: 11.0,
            bold: false,
            italic: false,
            color: [0.2, 0.2, 0.2, 1.0],
            line_height: 17.6,
            baseline: 12.0,
            text_align: "right".to_string(),
            rtl: true,
            underline: false,
            line_through: false,
            list_marker: None,
        });
        lb.border = Some(BorderStyle {
            bottom: Some(BorderEdge {
                width: 1.0,
                color: [0.0, 0.0, 0.0, 1.0],
            }),
            ..BorderStyle::default()
        });
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lb],
        });

        let back = LayoutConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(back.pages.len(), 1);
        let text = back.pages[0].boxes[0].text.as_ref().unwrap();
        assert!(text.rtl);
        assert_eq!(text.lines[0].text, "שלום world");
        assert_eq!(back.plain_text(), "שלום world\n");
    }

    #[test]
    fn missing_title_uses_default() {
        let json = r#"{"page_width_pt": 595.28, "page_height_pt": 841.89, "pages": []}"#;
        let config = LayoutConfig::from_json(json).unwrap();
        assert_eq!(config.title, "Document");
    }
}
