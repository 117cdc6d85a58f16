//! Per-category payloads handed to the persistence layer

use crate::output::types::{Category, CrawlMetadata, SiteResult};
use serde::Serialize;
use serde_json::{json, Value};

/// Counts and content kinds for one stored category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub data_type: String,
    pub total_items: usize,
    pub has_content: bool,
    /// Distinct extraction methods, contact types or error types in first-seen order
    pub content_types: Vec<String>,
}

/// Builds the JSON payload stored for `category`
///
/// Shape: `{metadata, data, data_type, company_name, extraction_summary}`.
pub fn build_payload(site: &SiteResult, category: Category) -> Result<Value, serde_json::Error> {
    let data = category_data(site, category)?;
    let summary = summarize(category, &data);

    Ok(json!({
        "metadata": serde_json::to_value(&site.metadata)?,
        "data": data,
        "data_type": category.as_str(),
        "company_name": site.metadata.company_name,
        "extraction_summary": serde_json::to_value(summary)?,
    }))
}

/// Payload written when the whole scrape fails
pub fn error_payload(
    metadata: &CrawlMetadata,
    error_type: &str,
    error_message: &str,
) -> Result<Value, serde_json::Error> {
    let data = json!([{
        "url": metadata.source_url,
        "error_type": error_type,
        "message": error_message,
    }]);
    let summary = summarize(Category::Errors, &data);

    Ok(json!({
        "metadata": serde_json::to_value(metadata)?,
        "data": data,
        "data_type": Category::Errors.as_str(),
        "company_name": metadata.company_name,
        "extraction_summary": serde_json::to_value(summary)?,
    }))
}

fn category_data(site: &SiteResult, category: Category) -> Result<Value, serde_json::Error> {
    match category {
        Category::Text => serde_json::to_value(&site.data.text),
        Category::Images => serde_json::to_value(&site.data.images),
        Category::Contact => serde_json::to_value(&site.data.contact),
        Category::Products => serde_json::to_value(&site.data.products),
        Category::SocialMedia => serde_json::to_value(&site.data.social_media),
        Category::Metadata => serde_json::to_value(&site.data.metadata_list),
        Category::RawHtml => serde_json::to_value(&site.raw_html),
        Category::Sitemap => serde_json::to_value(&site.sitemap),
        Category::Errors => serde_json::to_value(&site.errors),
    }
}

fn summarize(category: Category, data: &Value) -> ExtractionSummary {
    let (total_items, content_types) = match (category, data) {
        (Category::Sitemap, Value::Object(map)) => {
            let pages = map
                .get("crawl_structure")
                .and_then(Value::as_object)
                .map_or(0, |pages| pages.len());
            (pages, map.keys().cloned().collect())
        }
        (Category::RawHtml, Value::Object(map)) => {
            let kinds = if map.is_empty() { Vec::new() } else { vec!["html".to_string()] };
            (map.len(), kinds)
        }
        (_, Value::Array(items)) => (items.len(), distinct_field(items, type_field(category))),
        (_, Value::Object(map)) => (map.len(), Vec::new()),
        _ => (0, Vec::new()),
    };

    ExtractionSummary {
        data_type: category.as_str().to_string(),
        total_items,
        has_content: total_items > 0,
        content_types,
    }
}

fn type_field(category: Category) -> &'static str {
    match category {
        Category::Contact => "type",
        Category::Errors => "error_type",
        _ => "extraction_method",
    }
}

fn distinct_field(items: &[Value], field: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for value in items.iter().filter_map(|item| item.get(field)).filter_map(Value::as_str) {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}
