//! RTL tagger – marks Hebrew-bearing lines of an HTML document as
//! right-to-left.
//!
//! This works on physical lines of the HTML text, not on a parsed tree.
//! Every line that contains at least one Hebrew-block code point
//! (U+0590–U+05FF) has each *bare* opening tag from a fixed list rewritten
//! to carry `dir="rtl"`. Consequences that callers rely on:
//!
//! - a tag whose content continues on the next line is only tagged if the
//!   Hebrew text sits on the same line as the opening tag;
//! - every eligible tag on a Hebrew line is tagged, including cells of the
//!   same table row that hold only English;
//! - tags that already carry attributes are never touched, which also makes
//!   the transformation idempotent.
//!
//! A DOM walk keyed on text content would give different (arguably more
//! precise) output, so switching to one is a behaviour change.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening tags eligible for tagging, in application order.
pub const RTL_TAGS: [&str; 8] = ["p", "h1", "h2", "h3", "h4", "li", "td", "th"];

/// The attribute inserted into eligible tags.
pub const RTL_ATTRIBUTE: &str = r#"dir="rtl""#;

static BARE_TAG: Lazy<Regex> = Lazy::new(|| {
    let alternatives = RTL_TAGS.join("|");
    Regex::new(&format!("<({alternatives})>")).expect("static tag pattern is valid")
});

/// True if `c` lies in the Hebrew Unicode block.
pub fn is_hebrew(c: char) -> bool {
    ('\u{0590}'..='\u{05FF}').contains(&c)
}

/// True if the line contains any Hebrew-block character.
pub fn contains_hebrew(line: &str) -> bool {
    line.chars().any(is_hebrew)
}

/// Tag a single line. Lines without Hebrew come back unchanged.
pub fn tag_line(line: &str) -> String {
    if !contains_hebrew(line) {
        return line.to_string();
    }
    BARE_TAG
        .replace_all(line, |caps: &regex::Captures| {
            format!("<{} {RTL_ATTRIBUTE}>", &caps[1])
        })
        .into_owned()
}

/// Tag every Hebrew-bearing line of `html`.
///
/// Lines are split on `\n` only; a trailing `\r` stays part of its line.
/// The output has exactly as many lines as the input.
pub fn tag_rtl(html: &str) -> String {
    let mut tagged_lines = 0usize;
    let lines: Vec<String> = html
        .split('\n')
        .map(|line| {
            let out = tag_line(line);
            if out != line {
                tagged_lines += 1;
            }
            out
        })
        .collect();
    log::debug!("RTL tagger rewrote {tagged_lines} of {} lines", lines.len());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_with_hebrew_is_tagged() {
        assert_eq!(
            tag_rtl("<p>שלום world</p>"),
            r#"<p dir="rtl">שלום world</p>"#
        );
    }

    #[test]
    fn mixed_row_tags_every_cell() {
        assert_eq!(
            tag_rtl("<table><tr><td>Hello</td><td>שלום</td></tr></table>"),
            r#"<table><tr><td dir="rtl">Hello</td><td dir="rtl">שלום</td></tr></table>"#
        );
    }

    #[test]
    fn attributed_tag_is_left_alone() {
        let line = r#"<h2 class="x">שלום</h2>"#;
        assert_eq!(tag_rtl(line), line);
    }

    #[test]
    fn ineligible_tags_are_left_alone() {
        let line = "<ul><ol><table><a><em><h5>שלום</h5></em></a></table></ol></ul>";
        assert_eq!(tag_rtl(line), line);
    }

    #[test]
    fn every_eligible_tag_is_tagged() {
        let line = "<p><h1><h2><h3><h4><li><td><th>ש";
        let expected = RTL_TAGS
            .iter()
            .map(|t| format!(r#"<{t} dir="rtl">"#))
            .collect::<String>()
            + "ש";
        assert_eq!(tag_line(line), expected);
    }

    #[test]
    fn repeated_tags_on_one_line_are_all_tagged() {
        assert_eq!(
            tag_line("<li>א</li><li>ב</li>"),
            r#"<li dir="rtl">א</li><li dir="rtl">ב</li>"#
        );
    }

    #[test]
    fn english_lines_are_unchanged() {
        let html = "<p>Hello</p>\n<h1>Title</h1>\n<td>cell</td>";
        assert_eq!(tag_rtl(html), html);
    }

    #[test]
    fn split_tag_is_not_tagged() {
        let html = "<p>\nשלום</p>";
        assert_eq!(tag_rtl(html), html);
    }

    #[test]
    fn block_boundaries() {
        assert!(is_hebrew('\u{0590}'));
        assert!(is_hebrew('\u{05FF}'));
        assert!(!is_hebrew('\u{058F}'));
        assert!(!is_hebrew('\u{0600}'));
        // Hebrew presentation forms live outside the block.
        assert!(!contains_hebrew("<p>\u{FB1D}</p>"));
    }

    #[test]
    fn tagging_is_idempotent() {
        let html = "<p>שלום</p>\n<table><tr><td>a</td><td>ב</td></tr></table>\n<li>English</li>";
        let once = tag_rtl(html);
        assert_eq!(tag_rtl(&once), once);
        assert!(!once.contains(r#"dir="rtl" dir="rtl""#));
    }

    #[test]
    fn line_count_is_preserved() {
        let html = "\n<p>א</p>\r\n\n<p>b</p>\n";
        let out = tag_rtl(html);
        assert_eq!(out.split('\n').count(), html.split('\n').count());
        assert!(out.contains("<p dir=\"rtl\">א</p>\r"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(tag_rtl(""), "");
    }
}
