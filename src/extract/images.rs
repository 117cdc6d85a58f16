//! Image references, including lazy-loaded ones

use super::{absolute_url, selector, ExtractionError, ImageItem};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

pub(super) fn extract(document: &Html, page_url: &Url) -> Result<Vec<ImageItem>, ExtractionError> {
    let images = selector("img[src], img[data-src]")?;
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for img in document.select(&images) {
        let Some((url, method)) = image_source(&img, page_url) else {
            continue;
        };
        if !seen.insert(url.to_string()) {
            continue;
        }

        let element = img.value();
        let alt_text = non_empty(element.attr("alt"));
        let confidence = if alt_text.is_some() { 0.9 } else { 0.7 };

        items.push(ImageItem {
            url: url.to_string(),
            alt_text,
            title: non_empty(element.attr("title")),
            width: dimension(element.attr("width")),
            height: dimension(element.attr("height")),
            css_class: element.classes().next().map(str::to_string),
            page_url: page_url.to_string(),
            confidence_score: confidence,
            extraction_method: method.to_string(),
        });
    }

    Ok(items)
}

/// Picks the real image URL: `data-src` wins since `src` is then usually a placeholder
fn image_source(img: &ElementRef<'_>, page_url: &Url) -> Option<(Url, &'static str)> {
    let element = img.value();
    element
        .attr("data-src")
        .and_then(|src| absolute_url(src, page_url))
        .map(|url| (url, "lazy_load"))
        .or_else(|| {
            element
                .attr("src")
                .and_then(|src| absolute_url(src, page_url))
                .map(|url| (url, "img_tag"))
        })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn dimension(value: Option<&str>) -> Option<u32> {
    value
        .map(|v| v.trim().trim_end_matches("px"))
        .and_then(|v| v.parse().ok())
}
