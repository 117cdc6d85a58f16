//! Links to social media profiles

use super::{absolute_url, collapsed_text, selector, ExtractionError, SocialItem};
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// Known platform hosts, matched against the link host and its parents
const PLATFORMS: &[(&str, &str)] = &[
    ("facebook.com", "facebook"),
    ("fb.com", "facebook"),
    ("twitter.com", "twitter"),
    ("x.com", "x"),
    ("linkedin.com", "linkedin"),
    ("instagram.com", "instagram"),
    ("youtube.com", "youtube"),
    ("youtu.be", "youtube"),
    ("tiktok.com", "tiktok"),
    ("pinterest.com", "pinterest"),
    ("github.com", "github"),
    ("snapchat.com", "snapchat"),
];

/// Leading path segments that mark share buttons rather than profiles
const SHARE_PATHS: &[&[&str]] = &[
    &["sharer"],
    &["sharer.php"],
    &["share"],
    &["sharing"],
    &["intent"],
    &["shareArticle"],
    &["pin", "create"],
    &["dialog"],
];

/// Share endpoints that may sit below other segments
const SHARE_SEGMENTS: &[&str] = &["share", "sharer.php", "share-offsite"];

/// First path segments that are never an account name
const NON_HANDLE_SEGMENTS: &[&str] = &[
    "company", "in", "channel", "c", "user", "pages", "watch", "p", "reel", "groups", "school",
];

pub(super) fn extract(document: &Html, page_url: &Url) -> Result<Vec<SocialItem>, ExtractionError> {
    let links = selector("a[href]")?;
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for link in document.select(&links) {
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(|href| absolute_url(href, page_url))
        else {
            continue;
        };
        let Some(platform) = url.host_str().and_then(platform_for) else {
            continue;
        };
        if !seen.insert(url.to_string()) {
            continue;
        }

        let is_share_link = is_share_link(&url);
        let link_text = collapsed_text(&link);

        items.push(SocialItem {
            platform: platform.to_string(),
            handle: if is_share_link { None } else { handle(&url) },
            url: url.to_string(),
            link_text: (!link_text.is_empty()).then_some(link_text),
            is_share_link,
            page_url: page_url.to_string(),
            confidence_score: if is_share_link { 0.6 } else { 0.95 },
            extraction_method: "link_analysis".to_string(),
        });
    }

    Ok(items)
}

fn platform_for(host: &str) -> Option<&'static str> {
    let host = host.to_lowercase();
    PLATFORMS.iter().find_map(|(domain, platform)| {
        let matches = host == *domain || host.ends_with(&format!(".{}", domain));
        matches.then_some(*platform)
    })
}

fn is_share_link(url: &Url) -> bool {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    SHARE_PATHS.iter().any(|prefix| segments.starts_with(prefix))
        || segments.iter().any(|segment| SHARE_SEGMENTS.contains(segment))
}

/// Account name from the URL path, skipping structural segments like `/company/`
fn handle(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;
    let candidate = if NON_HANDLE_SEGMENTS.contains(&first) {
        segments.next()?
    } else {
        first
    };
    let candidate = candidate.trim_start_matches('@');
    (!candidate.is_empty()).then(|| candidate.to_string())
}
