use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Construction stage of a property
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Ready,
    OffPlan,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ready => "ready",
            Category::OffPlan => "off-plan",
        }
    }

    /// Case-insensitive lookup; `None` for anything the backend is not known to send.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ready" => Some(Category::Ready),
            "off-plan" | "off_plan" | "offplan" => Some(Category::OffPlan),
            _ => None,
        }
    }
}

/// Sale status of a property
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Available,
    Sold,
    Reserved,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
            ListingStatus::Reserved => "reserved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "available" => Some(ListingStatus::Available),
            "sold" => Some(ListingStatus::Sold),
            "reserved" => Some(ListingStatus::Reserved),
            _ => None,
        }
    }
}

/// A property row exactly as the backend sends it.
///
/// The PHP backend is loose about types (numbers arrive as strings, flags as
/// `"1"`, tags as JSON text), so every field is kept as raw JSON here and only
/// [`Normalizer`](crate::catalog::Normalizer) decides what it means.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawCatalogRecord {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub location: Option<Value>,
    pub city: Option<Value>,
    pub price: Option<Value>,
    pub bedrooms: Option<Value>,
    pub bathrooms: Option<Value>,
    pub garage: Option<Value>,
    pub sqm: Option<Value>,
    pub sqft: Option<Value>,
    pub year_built: Option<Value>,
    pub property_type: Option<Value>,
    pub category: Option<Value>,
    pub status: Option<Value>,
    pub featured: Option<Value>,
    pub description: Option<Value>,
    pub tags: Option<Value>,
    pub images: Option<Value>,
}

/// Canonical, UI-ready property listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayListing {
    pub id: String,
    pub title: String,
    pub location: String,
    pub city: String,
    /// Formatted currency string or "Price on Request", never empty
    pub price: String,
    pub beds: u32,
    pub baths: f64,
    pub garage: u32,
    pub sqm: Option<f64>,
    pub sqft: Option<f64>,
    pub year_built: Option<u32>,
    #[serde(rename = "type")]
    pub property_type: String,
    pub category: Category,
    pub status: ListingStatus,
    pub featured: bool,
    pub description: String,
    pub tags: Vec<String>,
    /// Card thumbnail, always `images[0]`
    pub image: String,
    /// Never empty; holds the placeholder when the backend has no images
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_parses_backend_spellings() {
        assert_eq!(Category::parse("off-plan"), Some(Category::OffPlan));
        assert_eq!(Category::parse(" Ready "), Some(Category::Ready));
        assert_eq!(Category::parse("land"), None);
    }

    #[test]
    fn raw_record_accepts_loose_types() {
        let raw: RawCatalogRecord = serde_json::from_value(json!({
            "id": "12",
            "price": "450000000.00",
            "featured": "1",
            "tags": "[\"Hot Offer\"]",
            "unknown_column": true
        }))
        .unwrap();

        assert_eq!(raw.id, Some(json!("12")));
        assert_eq!(raw.featured, Some(json!("1")));
        assert!(raw.images.is_none());
    }

    #[test]
    fn display_listing_serializes_type_field() {
        let listing = DisplayListing {
            id: "1".to_string(),
            title: String::new(),
            location: String::new(),
            city: String::new(),
            price: "Price on Request".to_string(),
            beds: 0,
            baths: 0.0,
            garage: 0,
            sqm: None,
            sqft: None,
            year_built: None,
            property_type: "Penthouse".to_string(),
            category: Category::OffPlan,
            status: ListingStatus::Sold,
            featured: false,
            description: String::new(),
            tags: vec![],
            image: "/p.jpeg".to_string(),
            images: vec!["/p.jpeg".to_string()],
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["type"], json!("Penthouse"));
        assert_eq!(value["category"], json!("off-plan"));
        assert_eq!(value["status"], json!("sold"));
    }
}
