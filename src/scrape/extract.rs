//! Extraction helpers
//!
//! Text normalization, outbound-link handling, content-container selection,
//! and contact-field extraction shared by every fetcher use.

use crate::scrape::record::ContactFields;

/// Known "main content" container selectors, tried in order.
///
/// The first selector with any text wins; the list covers the LMS widget
/// markup, SharePoint web parts, and generic page layouts.
pub const CONTENT_SELECTORS: &[&str] = &[
    "div.d2l-widget-content",
    "div.d2l-page-main",
    "div[data-automation-id=contentScrollRegion]",
    "main",
    "article",
    "#content",
    "div.content",
    "body",
];

/// Normalize extracted page text: trim every line, collapse runs of blank
/// lines to a single one, and trim the result.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_pending = false;
    let mut wrote_any = false;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_pending = wrote_any;
            continue;
        }
        if blank_pending {
            out.push_str("\n\n");
            blank_pending = false;
        } else if wrote_any {
            out.push('\n');
        }
        out.push_str(line);
        wrote_any = true;
    }

    out
}

/// Deduplicate links by URL, preserving first-seen order, and cap the list.
pub fn dedup_links(links: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for link in links {
        if out.len() >= cap {
            break;
        }
        let trimmed = link.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Pull contact fields out of normalized page text.
///
/// Emails and phone numbers are matched structurally; office designations
/// are taken from lines mentioning an office or room followed by a
/// word/number token.
pub fn extract_contact(text: &str) -> ContactFields {
    let email_re = regex::Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
    let phone_re =
        regex::Regex::new(r"(?:\+?1[\s.-]?)?\(?\d{3}\)?[\s.-]\d{3}[\s.-]\d{4}").unwrap();
    let office_re =
        regex::Regex::new(r"(?i)\b(?:office|room|sala)\s*:?\s*([A-Za-z]?-?\d[\w.-]*)").unwrap();

    let mut contact = ContactFields::default();

    for m in email_re.find_iter(text) {
        let email = m.as_str().to_string();
        if !contact.emails.contains(&email) {
            contact.emails.push(email);
        }
    }

    for m in phone_re.find_iter(text) {
        let phone = m.as_str().trim().to_string();
        if !contact.phones.contains(&phone) {
            contact.phones.push(phone);
        }
    }

    for caps in office_re.captures_iter(text) {
        if let Some(office) = caps.get(1) {
            let office = office.as_str().to_string();
            if !contact.offices.contains(&office) {
                contact.offices.push(office);
            }
        }
    }

    contact
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_collapses_blank_lines() {
        let raw = "  Title  \n\n\n\n  body line one\nbody line two  \n\n";
        let normalized = normalize_text(raw);
        assert_eq!(normalized, "Title\n\nbody line one\nbody line two");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("\n\n  \n"), "");
    }

    #[test]
    fn test_normalize_single_line() {
        assert_eq!(normalize_text("  hello  "), "hello");
    }

    #[test]
    fn test_dedup_links_preserves_order_and_caps() {
        let links = vec![
            "https://x/a".to_string(),
            "https://x/b".to_string(),
            "https://x/a".to_string(),
            "https://x/c".to_string(),
        ];
        let out = dedup_links(links, 2);
        assert_eq!(out, vec!["https://x/a".to_string(), "https://x/b".to_string()]);
    }

    #[test]
    fn test_dedup_links_skips_blank_entries() {
        let links = vec!["  ".to_string(), "https://x/a".to_string()];
        let out = dedup_links(links, 50);
        assert_eq!(out, vec!["https://x/a".to_string()]);
    }

    #[test]
    fn test_extract_contact_email_and_phone() {
        let text = "Prof. Garcia\nEmail: maria.garcia@college.edu\nPhone: (631) 555-2368";
        let contact = extract_contact(text);
        assert_eq!(contact.emails, vec!["maria.garcia@college.edu".to_string()]);
        assert_eq!(contact.phones, vec!["(631) 555-2368".to_string()]);
    }

    #[test]
    fn test_extract_contact_office() {
        let text = "Office: L-205\nDrop-in hours Tuesday";
        let contact = extract_contact(text);
        assert_eq!(contact.offices, vec!["L-205".to_string()]);
    }

    #[test]
    fn test_extract_contact_deduplicates() {
        let text = "a@b.edu something a@b.edu";
        let contact = extract_contact(text);
        assert_eq!(contact.emails.len(), 1);
    }

    #[test]
    fn test_extract_contact_empty_text() {
        assert!(extract_contact("").is_empty());
    }

    #[test]
    fn test_content_selectors_start_with_lms_widget() {
        assert_eq!(CONTENT_SELECTORS[0], "div.d2l-widget-content");
        assert_eq!(*CONTENT_SELECTORS.last().unwrap(), "body");
    }
}
