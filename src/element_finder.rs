use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::scraper::{FetchedPage, is_structured_api};
use crate::utils::error::{AppError, Result};

pub const DEFAULT_PRICE_TEST_ID: &str = "Text_single-price-whole-value";

/// A fetched body, parsed once and shared by every strategy.
pub enum Document<'a> {
    Json(Value),
    Html { raw: &'a str, parsed: Html },
}

impl<'a> Document<'a> {
    pub fn parse(page: &'a FetchedPage) -> Self {
        let looks_like_json = page.is_json()
            || is_structured_api(&page.url)
            || page.body.trim_start().starts_with('{');

        if looks_like_json {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&page.body) {
                return Document::Json(value);
            }
        }

        Document::Html {
            raw: &page.body,
            parsed: Html::parse_document(&page.body),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Document::Json(_))
    }
}

/// One self-contained way of locating a price in a document.
pub trait PriceStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Raw price strings in preference order. Empty when the strategy does not apply.
    fn candidates(&self, document: &Document) -> Vec<String>;
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_path<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Nested fields of a structured price API response.
pub struct ApiPriceField {
    paths: Vec<Vec<String>>,
}

impl Default for ApiPriceField {
    fn default() -> Self {
        Self::new(&[
            "priceData.displayPrice.onlinePrice",
            "priceData.displayPrice.deliveredPrice",
            "displayPrice",
        ])
    }
}

impl ApiPriceField {
    /// `paths` are dotted field paths, tried in order.
    pub fn new(paths: &[&str]) -> Self {
        Self {
            paths: paths
                .iter()
                .map(|p| p.split('.').map(str::to_string).collect())
                .collect(),
        }
    }
}

impl PriceStrategy for ApiPriceField {
    fn name(&self) -> &str {
        "api field"
    }

    fn candidates(&self, document: &Document) -> Vec<String> {
        let Document::Json(value) = document else {
            return Vec::new();
        };

        self.paths
            .iter()
            .filter_map(|path| {
                let keys: Vec<&str> = path.iter().map(String::as_str).collect();
                json_path(value, &keys).and_then(json_scalar)
            })
            .collect()
    }
}

fn test_id_selector(test_id: &str) -> Result<Selector> {
    let escaped = test_id.replace('\\', "\\\\").replace('"', "\\\"");
    Selector::parse(&format!("[data-testid=\"{}\"]", escaped))
        .map_err(|e| AppError::InvalidConfig(format!("invalid test id '{}': {:?}", test_id, e)))
}

/// Text content of the element carrying a stable `data-testid`.
pub struct TestIdElement {
    selector: Selector,
}

impl TestIdElement {
    pub fn new(test_id: &str) -> Result<Self> {
        Ok(Self {
            selector: test_id_selector(test_id)?,
        })
    }
}

impl PriceStrategy for TestIdElement {
    fn name(&self) -> &str {
        "test id element"
    }

    fn candidates(&self, document: &Document) -> Vec<String> {
        let Document::Html { parsed, .. } = document else {
            return Vec::new();
        };

        parsed
            .select(&self.selector)
            .map(|element| element.text().collect::<Vec<_>>().join("").trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }
}

/// `price` of Product offers in embedded JSON-LD blocks.
pub struct JsonLdOffer {
    selector: Selector,
}

impl JsonLdOffer {
    pub fn new() -> Result<Self> {
        let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
            .map_err(|e| AppError::Internal(format!("JSON-LD selector: {:?}", e)))?;
        Ok(Self { selector })
    }

    fn is_product(node: &Value) -> bool {
        match node.get("@type") {
            Some(Value::String(t)) => t == "Product",
            Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
            _ => false,
        }
    }

    fn offer_prices(offer: &Value, out: &mut Vec<String>) {
        for key in ["price", "lowPrice"] {
            if let Some(price) = offer.get(key).and_then(json_scalar) {
                out.push(price);
                return;
            }
        }
    }

    fn collect(node: &Value, out: &mut Vec<String>) {
        match node {
            Value::Array(nodes) => nodes.iter().for_each(|n| Self::collect(n, out)),
            Value::Object(map) => {
                if let Some(graph) = map.get("@graph") {
                    Self::collect(graph, out);
                }
                if Self::is_product(node) {
                    match map.get("offers") {
                        Some(Value::Array(offers)) => {
                            offers.iter().for_each(|o| Self::offer_prices(o, out))
                        }
                        Some(offer @ Value::Object(_)) => Self::offer_prices(offer, out),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

impl PriceStrategy for JsonLdOffer {
    fn name(&self) -> &str {
        "json-ld offer"
    }

    fn candidates(&self, document: &Document) -> Vec<String> {
        let Document::Html { parsed, .. } = document else {
            return Vec::new();
        };

        let mut prices = Vec::new();
        for script in parsed.select(&self.selector) {
            let text = script.text().collect::<String>();
            // Malformed blocks are common; skip them
            if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
                Self::collect(&value, &mut prices);
            }
        }
        prices
    }
}

/// Regex scan of raw markup for the test id followed by a dollar amount.
///
/// Catches markup the HTML parser never turns into elements, such as
/// templates embedded in script strings.
pub struct MarkupPattern {
    pattern: Regex,
}

impl MarkupPattern {
    pub fn new(test_id: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r#"data-testid="{}"[^>]*>\s*\$?([\d,]+\.?\d*)"#,
            regex::escape(test_id)
        ))
        .map_err(|e| AppError::InvalidConfig(format!("invalid test id '{}': {}", test_id, e)))?;
        Ok(Self { pattern })
    }
}

impl PriceStrategy for MarkupPattern {
    fn name(&self) -> &str {
        "markup pattern"
    }

    fn candidates(&self, document: &Document) -> Vec<String> {
        let Document::Html { raw, .. } = document else {
            return Vec::new();
        };

        self.pattern
            .captures_iter(raw)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// The standard fallback order: API field, test id element, JSON-LD, raw markup.
pub fn default_price_strategies(test_id: &str) -> Result<Vec<Box<dyn PriceStrategy>>> {
    Ok(vec![
        Box::new(ApiPriceField::default()),
        Box::new(TestIdElement::new(test_id)?),
        Box::new(JsonLdOffer::new()?),
        Box::new(MarkupPattern::new(test_id)?),
    ])
}
