//! Sample bilingual markdown documents for testing and demonstration.
//!
//! Each sample exercises a different part of the pipeline.

/// Meeting-guide style document: headings, mixed-language paragraphs,
/// lists, a table and a code fence.
pub fn meeting_guide() -> &'static str {
    r##"# ABcon System Review
## סקירת מערכת ABcon

Management decisions guide for the client meeting.
מדריך החלטות הנהלה לפגישה עם הלקוח.

---

## 1. Budget Module / מודול תקציב

The budget module tracks chapters, tenders and approvals.
המודול עוקב אחר פרקים, מכרזים ואישורים.

### Decisions required

1. Approve the new chapter structure
2. אישור מבנה הפרקים החדש
3. Confirm the tender workflow

- **Owner:** finance team
- **אחראי:** צוות כספים

| Topic | נושא | Status |
|-------|------|--------|
| Chapters | פרקים | Approved |
| Tenders | מכרזים | Pending |
| Reports | דוחות | Draft |

```
budget --chapter 12 --approve
```

> Note: all amounts are in NIS.

## 2. Next steps / הצעדים הבאים

Schedule a follow-up review within two weeks.
"##
}

/// One English heading followed by one Hebrew line.
pub fn minimal_bilingual() -> &'static str {
    "# Title\nכותרת בעברית\n"
}

/// English only; no line is tagged.
pub fn english_only() -> &'static str {
    r##"# Quarterly Report

Revenue grew by *12%* compared to last quarter.

- North region
- South region

| Region | Revenue |
|--------|---------|
| North  | 1.2M    |
| South  | 0.8M    |
"##
}

/// Long document that spans several pages.
pub fn multi_page() -> String {
    let mut md = String::from("# Long Document\n\n");
    for section in 1..=12 {
        md.push_str(&format!("## Section {section} / פרק {section}\n\n"));
        for para in 1..=4 {
            md.push_str(&format!(
                "Paragraph {para} of section {section} describes the review process in detail, \
                 covering scope, owners and timelines for each deliverable.\n\
                 פסקה {para} בפרק {section} מתארת את תהליך הסקירה.\n\n"
            ));
        }
    }
    md
}

/// Raw HTML mixed into markdown; passed through unchanged.
pub fn raw_html() -> &'static str {
    r##"<div class="section-divider"></div>

<p class="cover-title">Cover</p>

Plain paragraph with <strong>inline HTML</strong>.
"##
}
