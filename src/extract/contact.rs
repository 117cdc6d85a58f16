//! Emails, phone numbers and street addresses
//!
//! Patterns run over the visible text of the page only, so addresses hidden in
//! scripts or markup attributes are not reported. `mailto:` and `tel:` links are
//! read directly. The policy favors recall; the confidence score reflects how
//! strict the matching pattern was.

use super::{compiled, selector, ContactItem, ContactKind, ExtractionError, Pattern};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static EMAIL_REGEX: Pattern =
    LazyLock::new(|| Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b"));

// Optional country code, then an area code with or without parentheses
static PHONE_REGEX: Pattern = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{2,4}\)|\b\d{2,4})[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b")
});

static ADDRESS_REGEX: Pattern = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,6}\s+(?:[A-Z0-9][A-Z0-9.'-]*\s+){1,5}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl|Parkway|Pkwy|Highway|Hwy|Square|Sq)\b\.?(?:,?\s+(?:Suite|Ste|Apt|Unit)\.?\s*[A-Z0-9-]+)?(?:,\s*[A-Z][A-Z .'-]*[A-Z])?(?:,\s*[A-Z]{2})?(?:\s+(?P<zip>\d{5}(?:-\d{4})?))?",
    )
});

/// Elements whose text never renders
const HIDDEN_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;
// `tel:` links may hold local numbers without an area code
const MIN_TEL_DIGITS: usize = 7;

pub(super) fn extract(document: &Html, page_url: &Url) -> Result<Vec<ContactItem>, ExtractionError> {
    let mut collector = Collector::new(page_url);

    let links = selector(r#"a[href^="mailto:"], a[href^="tel:"]"#)?;
    for link in document.select(&links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if let Some(address) = href.strip_prefix("mailto:") {
            let email = address.split('?').next().unwrap_or_default().trim();
            if email.contains('@') {
                collector.push(ContactKind::Email, email.to_lowercase(), 0.98, "mailto_link");
            }
        } else if let Some(number) = href.strip_prefix("tel:") {
            let number = number.trim();
            if phone_digits(number).len() >= MIN_TEL_DIGITS {
                collector.push(ContactKind::Phone, number.to_string(), 0.98, "tel_link");
            }
        }
    }

    let text = visible_text(document);

    for found in compiled(&EMAIL_REGEX)?.find_iter(&text) {
        collector.push(ContactKind::Email, found.as_str().to_lowercase(), 0.95, "regex");
    }

    for found in compiled(&PHONE_REGEX)?.find_iter(&text) {
        let raw = found.as_str().trim();
        let digits = phone_digits(raw).len();
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
            continue;
        }
        let confidence = if raw.starts_with('+') { 0.85 } else { 0.8 };
        collector.push(ContactKind::Phone, raw.to_string(), confidence, "regex");
    }

    for captures in compiled(&ADDRESS_REGEX)?.captures_iter(&text) {
        let raw = captures.get(0).map(|m| m.as_str().trim()).unwrap_or_default();
        let confidence = if captures.name("zip").is_some() { 0.75 } else { 0.6 };
        collector.push(ContactKind::Address, raw.to_string(), confidence, "regex");
    }

    Ok(collector.items)
}

/// Deduplicates by kind and canonical value, keeping the first occurrence
struct Collector<'a> {
    page_url: &'a Url,
    seen: HashSet<(ContactKind, String)>,
    items: Vec<ContactItem>,
}

impl<'a> Collector<'a> {
    fn new(page_url: &'a Url) -> Self {
        Self {
            page_url,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, kind: ContactKind, value: String, confidence: f64, method: &str) {
        if value.is_empty() || !self.seen.insert((kind, canonical(kind, &value))) {
            return;
        }
        self.items.push(ContactItem {
            contact_type: kind,
            value,
            page_url: self.page_url.to_string(),
            confidence_score: confidence,
            extraction_method: method.to_string(),
        });
    }
}

fn canonical(kind: ContactKind, value: &str) -> String {
    match kind {
        ContactKind::Email => value.to_lowercase(),
        ContactKind::Phone => phone_digits(value),
        ContactKind::Address => value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    }
}

fn phone_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Concatenates rendered text nodes, one space between nodes
fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| HIDDEN_TAGS.contains(&ancestor.value().name()));
        if hidden {
            continue;
        }
        text.push_str(fragment);
        text.push(' ');
    }
    text
}
