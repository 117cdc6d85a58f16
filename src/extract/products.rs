//! Product listings
//!
//! Two signals mark a product: repeated sibling structures (same tag and class
//! signature) that carry a name and a price or a product-like class, and single
//! elements with a `product` class. Candidates are visited in document order and
//! nothing inside an accepted product is considered again.

use super::{
    absolute_url, collapsed_text, compiled, selector, ExtractionError, Pattern, Price, ProductItem,
};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static PRICE_REGEX: Pattern = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<pre>[$£€¥₹]|\b(?:USD|EUR|GBP|JPY|CAD|AUD|INR|CHF)\b)\s?(?P<lead>\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?)|(?P<trail>\d{1,3}(?:[.,\s]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?)\s?(?P<post>[$£€¥₹]|\b(?:USD|EUR|GBP|JPY|CAD|AUD|INR|CHF)\b)",
    )
});

const PRODUCT_HINTS: &[&str] = &["product", "item", "card", "listing", "offer"];
const MIN_NAME_CHARS: usize = 3;
const MAX_DESCRIPTION_CHARS: usize = 300;

struct Selectors {
    name: Vec<Selector>,
    price: Selector,
    description: Selector,
    image: Selector,
    link: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ExtractionError> {
        Ok(Self {
            name: vec![
                selector("h1, h2, h3, h4, h5, h6")?,
                selector(r#"[itemprop="name"]"#)?,
                selector(r#"[class*="title"], [class*="name"]"#)?,
            ],
            price: selector(r#"[class*="price"], [itemprop="price"]"#)?,
            description: selector(r#"p, [class*="desc"], [itemprop="description"]"#)?,
            image: selector("img[src], img[data-src]")?,
            link: selector("a[href]")?,
        })
    }
}

pub(super) fn extract(document: &Html, page_url: &Url) -> Result<Vec<ProductItem>, ExtractionError> {
    let selectors = Selectors::new()?;
    let price_regex = compiled(&PRICE_REGEX)?;
    let mut accepted = HashSet::new();
    let mut items = Vec::new();

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        if element.ancestors().any(|a| accepted.contains(&a.id())) {
            continue;
        }

        let repeated = in_repeated_group(&element);
        let product_class = has_product_class(&element) && !is_wrapper(&element);
        if !repeated && !product_class {
            continue;
        }

        let Some(mut item) = build_item(&element, &selectors, price_regex, page_url) else {
            continue;
        };

        let method = if repeated && (item.price.is_some() || has_hint_class(&element)) {
            "repeated_structure"
        } else if product_class {
            "product_class"
        } else {
            continue;
        };

        item.extraction_method = method.to_string();
        accepted.insert(element.id());
        items.push(item);
    }

    Ok(items)
}

fn build_item(
    element: &ElementRef<'_>,
    selectors: &Selectors,
    price_regex: &Regex,
    page_url: &Url,
) -> Option<ProductItem> {
    let name = selectors
        .name
        .iter()
        .flat_map(|sel| element.select(sel))
        .map(|el| collapsed_text(&el))
        .find(|text| text.chars().count() >= MIN_NAME_CHARS)?;

    let price = element
        .select(&selectors.price)
        .find_map(|el| find_price(price_regex, &collapsed_text(&el)))
        .or_else(|| find_price(price_regex, &collapsed_text(element)));

    let description = element
        .select(&selectors.description)
        .map(|el| collapsed_text(&el))
        .find(|text| !text.is_empty() && *text != name)
        .map(|text| text.chars().take(MAX_DESCRIPTION_CHARS).collect::<String>());

    let image_url = element.select(&selectors.image).find_map(|img| {
        let img = img.value();
        img.attr("data-src")
            .or_else(|| img.attr("src"))
            .and_then(|src| absolute_url(src, page_url))
            .map(String::from)
    });

    let product_url = element
        .select(&selectors.link)
        .find_map(|a| a.value().attr("href").and_then(|href| absolute_url(href, page_url)))
        .map(String::from);

    let confidence = match (&price, &description) {
        (Some(_), Some(_)) => 0.9,
        (Some(_), None) => 0.8,
        (None, _) => 0.4,
    };

    Some(ProductItem {
        name,
        price,
        description,
        image_url,
        product_url,
        page_url: page_url.to_string(),
        confidence_score: confidence,
        extraction_method: String::new(),
    })
}

/// Tag name plus sorted class list
fn signature(element: &ElementRef<'_>) -> (String, Vec<String>) {
    let mut classes: Vec<String> = element.value().classes().map(str::to_string).collect();
    classes.sort();
    (element.value().name().to_string(), classes)
}

fn in_repeated_group(element: &ElementRef<'_>) -> bool {
    let Some(parent) = element.parent().and_then(ElementRef::wrap) else {
        return false;
    };
    let own = signature(element);
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| signature(sibling) == own)
        .count()
        >= 2
}

fn has_hint_class(element: &ElementRef<'_>) -> bool {
    element.value().classes().any(|class| {
        let class = class.to_lowercase();
        PRODUCT_HINTS.iter().any(|hint| class.contains(hint))
    })
}

fn has_product_class(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| class.to_lowercase().contains("product"))
}

/// A product-classed container holding several product-classed children
fn is_wrapper(element: &ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(has_product_class)
        .take(2)
        .count()
        >= 2
}

fn find_price(price_regex: &Regex, text: &str) -> Option<Price> {
    let captures = price_regex.captures(text)?;
    let number = captures.name("lead").or_else(|| captures.name("trail"))?;
    let marker = captures.name("pre").or_else(|| captures.name("post"))?;

    Some(Price {
        raw: captures.get(0)?.as_str().trim().to_string(),
        amount: parse_amount(number.as_str())?,
        currency: currency_code(marker.as_str()),
    })
}

/// Finds and parses the first price in a piece of text
///
/// Currency symbols and ISO codes are accepted before or after the number, and
/// both `1,299.99` and `1.299,99` style separators are understood.
///
/// # Examples
///
/// ```
/// use siteharvest::extract::parse_price;
///
/// let price = parse_price("Now only €1.299,99!").unwrap();
/// assert_eq!(price.amount, 1299.99);
/// assert_eq!(price.currency.as_deref(), Some("EUR"));
/// ```
pub fn parse_price(text: &str) -> Option<Price> {
    let regex = compiled(&PRICE_REGEX).ok()?;
    find_price(regex, text)
}

fn parse_amount(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let is_separator = |c: char| c == '.' || c == ',';

    let normalized = match compact.rfind(is_separator) {
        None => compact,
        Some(idx) => {
            let separator = compact[idx..].chars().next()?;
            let decimals = compact.len() - idx - 1;
            let mixed = compact[..idx].contains(|c: char| is_separator(c) && c != separator);
            let integer: String = compact[..idx].chars().filter(|c| !is_separator(*c)).collect();
            if decimals == 3 && !mixed {
                format!("{}{}", integer, &compact[idx + 1..])
            } else {
                format!("{}.{}", integer, &compact[idx + 1..])
            }
        }
    };

    normalized.parse().ok()
}

fn currency_code(marker: &str) -> Option<String> {
    let code = match marker {
        "$" => "USD",
        "£" => "GBP",
        "€" => "EUR",
        "¥" => "JPY",
        "₹" => "INR",
        other => return Some(other.to_uppercase()),
    };
    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Vec<ProductItem> {
        let url = Url::parse("https://shop.example.com/catalog").unwrap();
        extract(&Html::parse_document(html), &url).unwrap()
    }

    #[test]
    fn test_parse_price_formats() {
        let cases = [
            ("$1,299.99", 1299.99, "USD"),
            ("€1.299,99", 1299.99, "EUR"),
            ("1 299 EUR", 1299.0, "EUR"),
            ("£19.99", 19.99, "GBP"),
            ("Price: USD 45", 45.0, "USD"),
            ("$12999", 12999.0, "USD"),
        ];
        for (text, amount, currency) in cases {
            let price = parse_price(text).unwrap_or_else(|| panic!("no price in {}", text));
            assert_eq!(price.amount, amount, "{}", text);
            assert_eq!(price.currency.as_deref(), Some(currency), "{}", text);
        }
        assert!(parse_price("Call 555 1234").is_none());

        // Space grouping only counts when the currency follows the number
        let price = parse_price("$5 100 units in stock").unwrap();
        assert_eq!(price.amount, 5.0);
        assert_eq!(price.raw, "$5");
        assert_eq!(parse_price("2 450 000 EUR").unwrap().amount, 2450000.0);
    }

    #[test]
    fn test_repeated_cards() {
        let items = run(
            r#"<div class="grid">
                 <div class="card"><h3>Blue Widget</h3><span class="price">$19.99</span><p>A blue one.</p>
                   <a href="/p/blue">View</a><img src="/img/blue.png"></div>
                 <div class="card"><h3>Red Widget</h3><span class="price">$24.50</span></div>
               </div>"#,
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Blue Widget");
        assert_eq!(items[0].price.as_ref().map(|p| p.amount), Some(19.99));
        assert_eq!(items[0].description.as_deref(), Some("A blue one."));
        assert_eq!(items[0].product_url.as_deref(), Some("https://shop.example.com/p/blue"));
        assert_eq!(items[0].image_url.as_deref(), Some("https://shop.example.com/img/blue.png"));
        assert_eq!(items[0].extraction_method, "repeated_structure");
        assert!(items[0].confidence_score > items[1].confidence_score);
    }

    #[test]
    fn test_single_product_class_without_price() {
        let items = run(r#"<div class="product-detail"><h1>Deluxe Kit</h1><p>Everything you need.</p></div>"#);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].extraction_method, "product_class");
        assert!(items[0].price.is_none());
        assert_eq!(items[0].confidence_score, 0.4);
    }

    #[test]
    fn test_nested_cards_reported_once() {
        let items = run(
            r#"<ul>
                 <li class="product"><h3>Outer One</h3><span>$10</span>
                   <div class="product"><h4>Inner</h4><span>$1</span></div></li>
                 <li class="product"><h3>Outer Two</h3><span>$12</span></li>
               </ul>"#,
        );
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Outer One", "Outer Two"]);
    }

    #[test]
    fn test_plain_lists_are_not_products() {
        let items = run(
            r#"<nav><ul><li><a href="/">Home</a></li><li><a href="/about">About</a></li></ul></nav>
               <section><h2>Mission</h2></section><section><h2>Values</h2></section>"#,
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_wrapper_is_not_a_product() {
        let items = run(
            r#"<div class="products"><h2>Our Range</h2>
                 <div class="product-tile"><h3>Alpha</h3><b>$5.00</b></div>
                 <div class="product-tile"><h3>Beta</h3><b>$6.00</b></div>
               </div>"#,
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "Beta");
    }
}
