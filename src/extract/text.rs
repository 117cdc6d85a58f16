//! Headings and paragraph-level content blocks

use super::{collapsed_text, selector, within, ExtractionError, TextItem};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

const BLOCK_TAGS: &[&str] = &["p", "li", "blockquote", "td"];
const PRIMARY_TAGS: &[&str] = &["main", "article"];
const BOILERPLATE_TAGS: &[&str] = &["nav", "footer", "header", "aside"];
const BOILERPLATE_PHRASES: &[&str] = &[
    "cookie",
    "copyright",
    "\u{a9}",
    "all rights reserved",
    "privacy policy",
];

const MIN_HEADING_CHARS: usize = 4;
const MIN_BLOCK_CHARS: usize = 20;
const MAX_BLOCK_CHARS: usize = 1000;
const MAX_BLOCKS: usize = 50;

pub(super) fn extract(document: &Html, page_url: &Url) -> Result<Vec<TextItem>, ExtractionError> {
    let headings = selector("h1, h2, h3, h4, h5, h6")?;
    let blocks = selector("p, li, blockquote, td")?;
    let mut items = Vec::new();

    for heading in document.select(&headings) {
        let content = collapsed_text(&heading);
        if content.chars().count() < MIN_HEADING_CHARS {
            continue;
        }
        items.push(text_item(
            content,
            heading.value().name(),
            page_url,
            0.95,
            "heading_extraction",
        ));
    }

    let mut seen = HashSet::new();
    let mut block_count = 0;
    for block in document.select(&blocks) {
        if block_count >= MAX_BLOCKS {
            break;
        }
        // The enclosing block already carries this text
        if has_block_ancestor(&block) {
            continue;
        }

        let mut content = collapsed_text(&block);
        if content.chars().count() < MIN_BLOCK_CHARS {
            continue;
        }
        if content.chars().count() > MAX_BLOCK_CHARS {
            content = content.chars().take(MAX_BLOCK_CHARS).collect();
        }
        if !seen.insert(content.clone()) {
            continue;
        }

        let confidence = block_confidence(&block, &content);
        items.push(text_item(
            content,
            block.value().name(),
            page_url,
            confidence,
            "content_block",
        ));
        block_count += 1;
    }

    Ok(items)
}

fn text_item(content: String, tag: &str, page_url: &Url, confidence: f64, method: &str) -> TextItem {
    TextItem {
        word_count: content.split_whitespace().count(),
        content,
        tag: tag.to_string(),
        page_url: page_url.to_string(),
        confidence_score: confidence,
        extraction_method: method.to_string(),
    }
}

fn has_block_ancestor(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| BLOCK_TAGS.contains(&ancestor.value().name()))
}

fn block_confidence(element: &ElementRef<'_>, content: &str) -> f64 {
    let mut score: f64 = 0.7;

    if within(element, PRIMARY_TAGS) {
        score += 0.15;
    }
    if matches!(element.value().name(), "p" | "blockquote") {
        score += 0.05;
    }
    if within(element, BOILERPLATE_TAGS) {
        score -= 0.3;
    }
    if content.split_whitespace().count() < 5 {
        score -= 0.15;
    }

    let lowered = content.to_lowercase();
    if BOILERPLATE_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        score -= 0.3;
    }

    score.clamp(0.1, 1.0)
}
