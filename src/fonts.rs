//! Font loading and text measurement using `ttf-parser`.
//!
//! Two generic families are known: [`SANS`] for body text and [`MONO`] for
//! code. Each maps to a TrueType face when one is loaded (explicitly or from
//! the system font directories) and to builtin PDF font metrics otherwise.
//! Only TrueType faces can draw Hebrew.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SANS: &str = "sans-serif";
pub const MONO: &str = "monospace";

/// Map a CSS `font-family` list to one of the generic families.
pub fn generic_family(css_value: &str) -> &'static str {
    let lower = css_value.to_ascii_lowercase();
    let is_mono = lower.split(',').any(|name| {
        let name = name.trim().trim_matches(|c| c == '"' || c == '\'');
        name.contains("mono") || name.contains("courier") || name == "consolas"
    });
    if is_mono {
        MONO
    } else {
        SANS
    }
}

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for builtin metrics.
    pub bytes: Arc<Vec<u8>>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

impl FontData {
    fn builtin() -> Self {
        Self {
            bytes: Arc::new(Vec::new()),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
            line_gap: 0.0,
        }
    }

    fn parse(bytes: Vec<u8>) -> Result<Self, String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("Failed to parse font: {e}"))?;
        Ok(Self {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes: Arc::new(bytes),
        })
    }

    pub fn is_builtin(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

/// Manages loaded fonts.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    /// Fallback face when a key is missing.
    default_key: FontKey,
}

/// Regular/bold file pairs tried for the sans family, Hebrew-capable first.
const SANS_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    ("C:\\Windows\\Fonts\\arial.ttf", "C:\\Windows\\Fonts\\arialbd.ttf"),
    (
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    ),
    ("/Library/Fonts/Arial.ttf", "/Library/Fonts/Arial Bold.ttf"),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
        "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/noto/NotoSansHebrew-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSansHebrew-Bold.ttf",
    ),
];

const MONO_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
        "/usr/share/fonts/dejavu/DejaVuSansMono-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
        "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
    ),
    ("C:\\Windows\\Fonts\\cour.ttf", "C:\\Windows\\Fonts\\courbd.ttf"),
    (
        "/System/Library/Fonts/Supplemental/Courier New.ttf",
        "/System/Library/Fonts/Supplemental/Courier New Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
    ),
];

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            default_key: FontKey::new(SANS, false, false),
        }
    }

    /// Register a regular face (and optionally a bold one) for all four
    /// style slots of `family`. Italic slots reuse the upright faces.
    pub fn load_font_family(
        &mut self,
        family: &str,
        regular: Vec<u8>,
        bold: Option<Vec<u8>>,
    ) -> Result<(), String> {
        let regular = FontData::parse(regular)?;
        let bold = match bold {
            Some(bytes) => FontData::parse(bytes)?,
            None => regular.clone(),
        };
        for italic in [false, true] {
            self.fonts
                .insert(FontKey::new(family, false, italic), regular.clone());
            self.fonts
                .insert(FontKey::new(family, true, italic), bold.clone());
        }
        Ok(())
    }

    /// Load `path` as the face of every style of `family`.
    pub fn load_font_file(&mut self, family: &str, path: &Path) -> Result<(), String> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Cannot read font '{}': {e}", path.display()))?;
        self.load_font_family(family, bytes, None)?;
        log::debug!("Loaded font '{}' for {family}", path.display());
        Ok(())
    }

    /// Look for TrueType fonts in the usual system locations. Returns true
    /// when a sans face was found.
    pub fn discover_system_fonts(&mut self) -> bool {
        let found_sans = self.load_first_candidate(SANS, SANS_CANDIDATES);
        if !self.load_first_candidate(MONO, MONO_CANDIDATES) && found_sans {
            log::debug!("No monospace system font; code falls back to the sans face");
        }
        found_sans
    }

    fn load_first_candidate(&mut self, family: &str, candidates: &[(&str, &str)]) -> bool {
        let existing: Vec<(PathBuf, PathBuf)> = candidates
            .iter()
            .map(|(r, b)| (PathBuf::from(r), PathBuf::from(b)))
            .filter(|(r, _)| r.is_file())
            .collect();
        // Prefer a face that covers Hebrew.
        let ordered = existing
            .iter()
            .filter(|(r, _)| file_covers_hebrew(r))
            .chain(existing.iter().filter(|(r, _)| !file_covers_hebrew(r)));

        for (regular, bold) in ordered {
            let Ok(regular_bytes) = std::fs::read(regular) else {
                continue;
            };
            let bold_bytes = std::fs::read(bold).ok();
            match self.load_font_family(family, regular_bytes, bold_bytes) {
                Ok(()) => {
                    log::info!("Using system font '{}' for {family}", regular.display());
                    return true;
                }
                Err(e) => log::debug!("Skipping '{}': {e}", regular.display()),
            }
        }
        false
    }

    /// Fill every empty style slot. Sans slots get builtin Helvetica-like
    /// metrics; mono slots borrow the sans TrueType face when there is one
    /// (so code can still draw Hebrew) and Courier-like metrics otherwise.
    pub fn ensure_default(&mut self) {
        for bold in [false, true] {
            for italic in [false, true] {
                let sans = self
                    .fonts
                    .entry(FontKey::new(SANS, bold, italic))
                    .or_insert_with(FontData::builtin)
                    .clone();
                let mono = if sans.is_builtin() {
                    FontData::builtin()
                } else {
                    sans
                };
                self.fonts
                    .entry(FontKey::new(MONO, bold, italic))
                    .or_insert(mono);
            }
        }
    }

    /// Font data for a key, falling back to the upright face of the same
    /// family, then to the default.
    pub fn get(&self, key: &FontKey) -> Option<&FontData> {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&FontKey::new(&key.family, key.bold, false)))
            .or_else(|| self.fonts.get(&self.default_key))
    }

    /// Measure the width of a string at a given font size (in pt).
    /// If we have actual font bytes, we parse glyph advances. Otherwise we
    /// use an average character width heuristic.
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> f32 {
        let key = FontKey::new(family, bold, italic);
        let data = match self.get(&key) {
            Some(d) if !d.is_builtin() => d,
            _ => return builtin_width(text, font_size, bold, family),
        };

        // Parse the font and sum horizontal advances
        if let Ok(face) = ttf_parser::Face::parse(&data.bytes, 0) {
            let scale = font_size / data.units_per_em;
            let mut width = 0.0f32;
            for ch in text.chars() {
                if let Some(gid) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                    width += advance as f32 * scale;
                } else {
                    // Fallback for missing glyph
                    width += font_size * 0.5;
                }
            }
            width
        } else {
            builtin_width(text, font_size, bold, family)
        }
    }

    /// Line height in pt.
    pub fn line_height_pt(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender in pt for the given font.
    pub fn ascender_pt(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        match self.get(&FontKey::new(family, bold, italic)) {
            Some(data) => data.ascender * font_size / data.units_per_em,
            None => font_size * 0.75,
        }
    }

    /// True when the face for `key` is builtin (or absent).
    pub fn is_builtin(&self, key: &FontKey) -> bool {
        self.get(key).map_or(true, FontData::is_builtin)
    }

    /// Check if real font bytes are loaded for the default font.
    pub fn has_real_fonts(&self) -> bool {
        self.fonts
            .get(&self.default_key)
            .map(|d| !d.is_builtin())
            .unwrap_or(false)
    }

    /// Get all loaded font keys.
    pub fn keys(&self) -> Vec<FontKey> {
        self.fonts.keys().cloned().collect()
    }

    /// Shared font bytes for embedding in the PDF; `None` for builtin faces.
    pub fn font_bytes(&self, key: &FontKey) -> Option<Arc<Vec<u8>>> {
        self.get(key)
            .filter(|d| !d.is_builtin())
            .map(|d| Arc::clone(&d.bytes))
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

fn builtin_width(text: &str, font_size: f32, bold: bool, family: &str) -> f32 {
    // Courier is fixed-pitch at 600 units; Helvetica averages ~0.5 em,
    // bold ~10 % wider.
    let avg = if family == MONO {
        0.6
    } else if bold {
        0.55
    } else {
        0.5
    };
    text.chars().count() as f32 * font_size * avg
}

fn file_covers_hebrew(path: &Path) -> bool {
    std::fs::read(path)
        .ok()
        .and_then(|bytes| {
            ttf_parser::Face::parse(&bytes, 0)
                .ok()
                .map(|face| face.glyph_index('\u{05D0}').is_some())
        })
        .unwrap_or(false)
}

/// Word-wrap text to fit within `max_width` points. Returns a vec of lines.
///
/// `\n` in the input forces a break. Words wider than the line are broken
/// between characters.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }
    let measure = |s: &str| fonts.measure_text_width(s, font_size, bold, italic, family);

    let mut lines: Vec<String> = Vec::new();
    // Split on existing newlines first
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            if measure(&candidate) <= max_width {
                current_line = candidate;
                continue;
            }
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            if measure(word) > max_width {
                let mut pieces = break_chars(word, max_width, &measure);
                current_line = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            } else {
                current_line = word.to_string();
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Wrap preformatted text: line breaks and spaces are kept, tabs expand to
/// four spaces, and over-long lines break between characters.
pub fn wrap_preformatted(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    let measure = |s: &str| fonts.measure_text_width(s, font_size, bold, italic, family);
    let body = text.strip_suffix('\n').unwrap_or(text);
    let mut lines = Vec::new();
    for raw in body.split('\n') {
        let line = raw.trim_end_matches('\r').replace('\t', "    ");
        if max_width > 0.0 && measure(&line) > max_width {
            lines.extend(break_chars(&line, max_width, &measure));
        } else {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn break_chars(text: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if measure(&current) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    pieces.push(current);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false, false, SANS);
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
        let mono = mgr.measure_text_width("Hello", 10.0, false, false, MONO);
        assert!((mono - 30.0).abs() < 0.1);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, SANS, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn forced_breaks_are_kept() {
        let mgr = FontManager::default();
        let lines = wrap_text("one\ntwo", 10.0, false, false, SANS, 500.0, &mgr);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn long_word_is_broken() {
        let mgr = FontManager::default();
        // 10 pt × 0.5 = 5 pt per char; 20 pt fits 4 chars.
        let lines = wrap_text("abcdefghij", 10.0, false, false, SANS, 20.0, &mgr);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn preformatted_keeps_spaces() {
        let mgr = FontManager::default();
        let text = "fn main() {\n\tlet x = 1;\n}\n";
        let lines = wrap_preformatted(text, 9.0, false, false, MONO, 400.0, &mgr);
        assert_eq!(lines, vec!["fn main() {", "    let x = 1;", "}"]);
    }

    #[test]
    fn generic_families() {
        assert_eq!(generic_family("'Courier New', Consolas, monospace"), MONO);
        assert_eq!(generic_family("'Segoe UI', Tahoma, Arial, sans-serif"), SANS);
    }

    #[test]
    fn builtin_fonts_are_not_embeddable() {
        let mgr = FontManager::default();
        assert!(!mgr.has_real_fonts());
        assert!(mgr.font_bytes(&FontKey::new(SANS, false, false)).is_none());
        assert!(mgr.is_builtin(&FontKey::new(MONO, true, true)));
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let mut mgr = FontManager::new();
        assert!(mgr.load_font_family(SANS, vec![0, 1, 2, 3], None).is_err());
    }
}
