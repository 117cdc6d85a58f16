//! Document-level metadata

use super::{collapsed_text, selector, ExtractionError, MetadataItem};
use scraper::Html;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

/// Hex SHA-256 of a page's raw HTML
pub fn content_hash(html: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(html.as_bytes());
    hex::encode(hasher.finalize())
}

/// Reads head metadata; depth and content hash are filled in by the crawl task
pub(super) fn extract(document: &Html, page_url: &Url) -> Result<Option<MetadataItem>, ExtractionError> {
    let title_sel = selector("title")?;
    let meta_sel = selector("meta")?;
    let canonical_sel = selector(r#"link[rel="canonical"][href]"#)?;
    let html_sel = selector("html[lang]")?;

    let mut item = MetadataItem {
        page_url: page_url.to_string(),
        confidence_score: 1.0,
        extraction_method: "meta_tags".to_string(),
        ..Default::default()
    };

    item.title = document
        .select(&title_sel)
        .next()
        .map(|el| collapsed_text(&el))
        .filter(|t| !t.is_empty());

    let mut open_graph = BTreeMap::new();
    for meta in document.select(&meta_sel) {
        let meta = meta.value();

        if let Some(charset) = meta.attr("charset") {
            item.charset.get_or_insert_with(|| charset.trim().to_lowercase());
            continue;
        }

        let content = meta.attr("content").map(str::trim).unwrap_or_default();

        if let Some(property) = meta.attr("property").filter(|p| p.starts_with("og:")) {
            open_graph
                .entry(property.to_string())
                .or_insert_with(|| content.to_string());
            continue;
        }

        if let Some(equiv) = meta.attr("http-equiv") {
            if equiv.eq_ignore_ascii_case("content-type") {
                if let Some((_, charset)) = content.split_once("charset=") {
                    item.charset.get_or_insert_with(|| charset.trim().to_lowercase());
                }
            }
            continue;
        }

        let Some(name) = meta.attr("name") else {
            continue;
        };
        match name.to_lowercase().as_str() {
            "description" if !content.is_empty() => {
                item.description.get_or_insert_with(|| content.to_string());
            }
            "keywords" => {
                item.keywords.extend(
                    content
                        .split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string),
                );
            }
            "robots" if !content.is_empty() => {
                item.robots.get_or_insert_with(|| content.to_string());
            }
            _ => {}
        }
    }
    item.open_graph = open_graph;

    item.canonical_url = document
        .select(&canonical_sel)
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| page_url.join(href.trim()).ok())
        .map(String::from);

    item.language = document
        .select(&html_sel)
        .filter_map(|el| el.value().attr("lang"))
        .map(str::trim)
        .find(|lang| !lang.is_empty())
        .map(str::to_string);

    Ok(Some(item))
}
