//! Record types produced by the extractors
//!
//! Every record carries the page it came from, a confidence score in `[0, 1]`
//! and the name of the heuristic that produced it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A heading or paragraph-level block of page text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    pub content: String,
    /// Element the text came from (`h2`, `p`, `li`, ...)
    pub tag: String,
    pub word_count: usize,
    pub page_url: String,
    pub confidence_score: f64,
    pub extraction_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageItem {
    /// Absolute image URL
    pub url: String,
    pub alt_text: Option<String>,
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub css_class: Option<String>,
    pub page_url: String,
    pub confidence_score: f64,
    pub extraction_method: String,
}

/// Kind of contact detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Email,
    Phone,
    Address,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for ContactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactItem {
    #[serde(rename = "type")]
    pub contact_type: ContactKind,
    /// The value as it appeared on the page (emails lowercased)
    pub value: String,
    pub page_url: String,
    pub confidence_score: f64,
    pub extraction_method: String,
}

/// A parsed price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Price {
    /// Text as matched on the page
    pub raw: String,
    pub amount: f64,
    /// ISO code when the symbol or code identified one
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductItem {
    pub name: String,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub page_url: String,
    pub confidence_score: f64,
    pub extraction_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialItem {
    pub platform: String,
    pub url: String,
    pub link_text: Option<String>,
    /// Account name taken from the URL path, when there is one
    pub handle: Option<String>,
    pub is_share_link: bool,
    pub page_url: String,
    pub confidence_score: f64,
    pub extraction_method: String,
}

/// Document-level metadata for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataItem {
    pub page_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub open_graph: BTreeMap<String, String>,
    pub canonical_url: Option<String>,
    pub language: Option<String>,
    pub charset: Option<String>,
    pub robots: Option<String>,
    pub depth: u32,
    /// Hex SHA-256 of the raw HTML
    pub content_hash: String,
    pub confidence_score: f64,
    pub extraction_method: String,
}
