//! Conversion of loosely-typed backend rows into [`DisplayListing`]s.
//!
//! Normalization is total: malformed fields fall back to safe defaults so
//! one bad row can never fail a whole catalog render.

use crate::models::{Category, DisplayListing, ListingStatus, RawCatalogRecord};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

pub const PRICE_ON_REQUEST: &str = "Price on Request";
pub const DEFAULT_API_BASE_URL: &str = "https://api.graygoldrealty.com";
pub const DEFAULT_UPLOADS_PATH: &str = "uploads/properties";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/propertiesImages/property.jpeg";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₦";

/// Maps [`RawCatalogRecord`]s to [`DisplayListing`]s
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    asset_base_url: String,
    uploads_path: String,
    placeholder_image: String,
    currency_symbol: String,
}

impl Normalizer {
    /// Create a normalizer resolving relative image names against `asset_base_url`
    pub fn new(asset_base_url: impl Into<String>) -> Self {
        Self {
            asset_base_url: asset_base_url.into(),
            uploads_path: DEFAULT_UPLOADS_PATH.to_string(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }

    pub fn with_uploads_path(mut self, path: impl Into<String>) -> Self {
        self.uploads_path = path.into();
        self
    }

    pub fn with_placeholder_image(mut self, path: impl Into<String>) -> Self {
        self.placeholder_image = path.into();
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn placeholder_image(&self) -> &str {
        &self.placeholder_image
    }

    pub fn normalize(&self, raw: &RawCatalogRecord) -> DisplayListing {
        let images = self.images(raw.images.as_ref());
        let image = images
            .first()
            .cloned()
            .unwrap_or_else(|| self.placeholder_image.clone());

        DisplayListing {
            id: text(raw.id.as_ref()),
            title: text(raw.title.as_ref()),
            location: text(raw.location.as_ref()),
            city: text(raw.city.as_ref()),
            price: self.price(raw.price.as_ref()),
            beds: count(raw.bedrooms.as_ref()),
            baths: number(raw.bathrooms.as_ref())
                .filter(|n| *n >= 0.0)
                .unwrap_or(0.0),
            garage: count(raw.garage.as_ref()),
            sqm: number(raw.sqm.as_ref()).filter(|n| *n >= 0.0),
            sqft: number(raw.sqft.as_ref()).filter(|n| *n >= 0.0),
            year_built: number(raw.year_built.as_ref())
                .filter(|n| *n >= 1.0 && *n <= f64::from(u32::MAX))
                .map(|n| n as u32),
            property_type: text(raw.property_type.as_ref()),
            category: Category::parse(&text(raw.category.as_ref())).unwrap_or_default(),
            status: ListingStatus::parse(&text(raw.status.as_ref())).unwrap_or_default(),
            featured: truthy(raw.featured.as_ref()),
            description: text(raw.description.as_ref()),
            tags: string_list(raw.tags.as_ref()),
            image,
            images,
        }
    }

    pub fn normalize_all(&self, records: &[RawCatalogRecord]) -> Vec<DisplayListing> {
        records.iter().map(|raw| self.normalize(raw)).collect()
    }

    fn price(&self, value: Option<&Value>) -> String {
        match number(value) {
            Some(amount) if amount > 0.0 && amount.is_finite() => {
                format!("{}{}", self.currency_symbol, group_thousands(amount))
            }
            _ => PRICE_ON_REQUEST.to_string(),
        }
    }

    fn images(&self, value: Option<&Value>) -> Vec<String> {
        let images: Vec<String> = image_list(value)
            .iter()
            .map(|entry| self.resolve_image(entry))
            .collect();

        if images.is_empty() {
            vec![self.placeholder_image.clone()]
        } else {
            images
        }
    }

    fn resolve_image(&self, entry: &str) -> String {
        if is_absolute_url(entry) {
            return entry.to_string();
        }
        format!(
            "{}/{}/{}",
            self.asset_base_url.trim_end_matches('/'),
            self.uploads_path.trim_matches('/'),
            entry.trim_start_matches('/')
        )
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

fn is_absolute_url(entry: &str) -> bool {
    Url::parse(entry)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Render a positive amount with `,` thousands separators and at most three
/// fraction digits, e.g. `1500000.5` -> `1,500,000.5`.
fn group_thousands(amount: f64) -> String {
    let fixed = format!("{amount:.3}");
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut out = String::with_capacity(whole.len() + whole.len() / 3 + 4);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }

    let fraction = fraction.trim_end_matches('0');
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn text(value: Option<&Value>) -> String {
    scalar_text(value.unwrap_or(&Value::Null)).unwrap_or_default()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn count(value: Option<&Value>) -> u32 {
    number(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        _ => false,
    }
}

/// Accepts either a JSON array or a string holding a JSON-encoded array.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => collect_strings(items),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => collect_strings(&items),
            Ok(_) | Err(_) => {
                debug!("Ignoring non-array list value: {:?}", encoded);
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}

/// Like [`string_list`], but a string that is not an encoded array is taken
/// as a single filename.
fn image_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::String(raw)) = value else {
        return string_list(value);
    };
    let raw = raw.trim();
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => collect_strings(&items),
        Ok(Value::Null) => Vec::new(),
        _ if raw.is_empty() => Vec::new(),
        _ => vec![raw.to_string()],
    }
}

fn collect_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(scalar_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
