//! Structured data extraction from parsed pages
//!
//! Six independent extractors run against every fetched document. Each one is
//! pure: it reads the parsed [`Html`] and the page URL and returns typed records.
//! A failing extractor is logged and contributes nothing for its category.

mod contact;
mod images;
mod metadata;
mod products;
mod social;
mod text;
mod types;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub use metadata::content_hash;
pub use products::parse_price;
pub use types::{
    ContactItem, ContactKind, ImageItem, MetadataItem, Price, ProductItem, SocialItem, TextItem,
};

/// Errors raised by a single extractor
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

/// The fixed family of extractors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extractor {
    Text,
    Images,
    Contact,
    Products,
    Social,
    Metadata,
}

/// Records produced by one extractor
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedItems {
    Text(Vec<TextItem>),
    Images(Vec<ImageItem>),
    Contact(Vec<ContactItem>),
    Products(Vec<ProductItem>),
    Social(Vec<SocialItem>),
    Metadata(Option<MetadataItem>),
}

impl ExtractedItems {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(items) => items.len(),
            Self::Images(items) => items.len(),
            Self::Contact(items) => items.len(),
            Self::Products(items) => items.len(),
            Self::Social(items) => items.len(),
            Self::Metadata(item) => usize::from(item.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extractor {
    pub const ALL: [Extractor; 6] = [
        Self::Text,
        Self::Images,
        Self::Contact,
        Self::Products,
        Self::Social,
        Self::Metadata,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Images => "images",
            Self::Contact => "contact",
            Self::Products => "products",
            Self::Social => "social",
            Self::Metadata => "metadata",
        }
    }

    /// Runs this extractor against a parsed document
    pub fn extract(&self, document: &Html, page_url: &Url) -> Result<ExtractedItems, ExtractionError> {
        Ok(match self {
            Self::Text => ExtractedItems::Text(text::extract(document, page_url)?),
            Self::Images => ExtractedItems::Images(images::extract(document, page_url)?),
            Self::Contact => ExtractedItems::Contact(contact::extract(document, page_url)?),
            Self::Products => ExtractedItems::Products(products::extract(document, page_url)?),
            Self::Social => ExtractedItems::Social(social::extract(document, page_url)?),
            Self::Metadata => ExtractedItems::Metadata(metadata::extract(document, page_url)?),
        })
    }
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageExtraction {
    pub text: Vec<TextItem>,
    pub images: Vec<ImageItem>,
    pub contact: Vec<ContactItem>,
    pub products: Vec<ProductItem>,
    pub social: Vec<SocialItem>,
    pub page_metadata: Option<MetadataItem>,
}

impl PageExtraction {
    fn absorb(&mut self, items: ExtractedItems) {
        match items {
            ExtractedItems::Text(items) => self.text = items,
            ExtractedItems::Images(items) => self.images = items,
            ExtractedItems::Contact(items) => self.contact = items,
            ExtractedItems::Products(items) => self.products = items,
            ExtractedItems::Social(items) => self.social = items,
            ExtractedItems::Metadata(item) => self.page_metadata = item,
        }
    }

    /// Attributes every record to `page_url`
    pub fn attribute_to(&mut self, page_url: &str) {
        self.text.iter_mut().for_each(|item| item.page_url = page_url.to_string());
        self.images.iter_mut().for_each(|item| item.page_url = page_url.to_string());
        self.contact.iter_mut().for_each(|item| item.page_url = page_url.to_string());
        self.products.iter_mut().for_each(|item| item.page_url = page_url.to_string());
        self.social.iter_mut().for_each(|item| item.page_url = page_url.to_string());
        if let Some(metadata) = self.page_metadata.as_mut() {
            metadata.page_url = page_url.to_string();
        }
    }
}

/// Runs every extractor against a parsed document
///
/// Extractor failures are logged and leave their category empty.
pub fn extract_page(document: &Html, page_url: &Url) -> PageExtraction {
    let mut extraction = PageExtraction::default();

    for extractor in Extractor::ALL {
        match extractor.extract(document, page_url) {
            Ok(items) => extraction.absorb(items),
            Err(e) => warn!("{} extractor failed on {}: {}", extractor, page_url, e),
        }
    }

    extraction
}

/// Parses a selector, turning a parse failure into an [`ExtractionError`]
pub(crate) fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// A lazily compiled regular expression
pub(crate) type Pattern = LazyLock<Result<Regex, regex::Error>>;

/// Borrows a compiled pattern, surfacing a compile failure as an [`ExtractionError`]
pub(crate) fn compiled(pattern: &'static Pattern) -> Result<&'static Regex, ExtractionError> {
    pattern
        .as_ref()
        .map_err(|e| ExtractionError::Pattern(e.to_string()))
}

/// Element text with whitespace runs collapsed to single spaces
pub(crate) fn collapsed_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if the element or one of its ancestors has the given tag name
pub(crate) fn within(element: &ElementRef<'_>, tags: &[&str]) -> bool {
    if tags.contains(&element.value().name()) {
        return true;
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| tags.contains(&ancestor.value().name()))
}

/// Resolves an attribute value against the page URL into an absolute http(s) URL
pub(crate) fn absolute_url(raw: &str, page_url: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") || raw.starts_with("javascript:") {
        return None;
    }
    page_url
        .join(raw)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
