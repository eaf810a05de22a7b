use crate::models::{Category, DisplayListing, ListingStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Listings fetched for the listings page
pub const DEFAULT_LISTINGS_LIMIT: u32 = 100;
/// Listings fetched for the homepage carousel
pub const DEFAULT_FEATURED_LIMIT: u32 = 10;
/// Cards per page on the listings page
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Category tab selection; `All` sends no category at all
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryFilter {
    #[default]
    All,
    OffPlan,
    Ready,
}

impl CategoryFilter {
    pub fn category(&self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::OffPlan => Some(Category::OffPlan),
            CategoryFilter::Ready => Some(Category::Ready),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") || s.trim().is_empty() {
            return Ok(CategoryFilter::All);
        }
        match Category::parse(s) {
            Some(Category::OffPlan) => Ok(CategoryFilter::OffPlan),
            Some(Category::Ready) => Ok(CategoryFilter::Ready),
            None => Err(format!("unknown category `{s}` (expected all, off-plan or ready)")),
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingStatus::parse(s)
            .ok_or_else(|| format!("unknown status `{s}` (expected available, sold or reserved)"))
    }
}

/// Parameters of one catalog request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogParams {
    pub category: CategoryFilter,
    pub status: Option<ListingStatus>,
    /// Restrict to featured listings
    pub featured: bool,
    /// Maximum rows the backend should return
    pub limit: u32,
}

impl CatalogParams {
    /// Full catalog for the listings page
    pub fn listings(category: CategoryFilter, status: Option<ListingStatus>) -> Self {
        Self {
            category,
            status,
            featured: false,
            limit: DEFAULT_LISTINGS_LIMIT,
        }
    }

    /// Featured subset for the homepage
    pub fn featured(status: Option<ListingStatus>) -> Self {
        Self {
            category: CategoryFilter::All,
            status,
            featured: true,
            limit: DEFAULT_FEATURED_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Query string pairs. Unset filters are left out entirely so the
    /// backend never sees an empty-string filter.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if self.featured {
            pairs.push(("featured", "1".to_string()));
        }
        if let Some(category) = self.category.category() {
            pairs.push(("category", category.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs.push(("limit", self.limit.max(1).to_string()));
        pairs
    }
}

impl Default for CatalogParams {
    fn default() -> Self {
        Self::listings(CategoryFilter::All, None)
    }
}

/// Sort order applied in memory
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep backend order, which is newest first
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortKey::Newest),
            "price_asc" | "price-asc" => Ok(SortKey::PriceAsc),
            "price_desc" | "price-desc" => Ok(SortKey::PriceDesc),
            _ => Err(format!(
                "unknown sort `{s}` (expected newest, price_asc or price_desc)"
            )),
        }
    }
}

/// What the listings page is currently asking for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Category tab; a change requires a new fetch
    pub category: CategoryFilter,
    /// Status filter; a change requires a new fetch
    pub status: Option<ListingStatus>,
    /// Free-text search, applied in memory
    pub search: String,
    pub sort: SortKey,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
}

impl QueryState {
    /// Fetch parameters this query depends on
    pub fn catalog_params(&self) -> CatalogParams {
        CatalogParams::listings(self.category, self.status)
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            status: None,
            search: String::new(),
            sort: SortKey::Newest,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of query output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub page: Vec<DisplayListing>,
    /// Matches after search, across all pages
    pub total_count: usize,
    pub total_pages: usize,
    /// Page actually served after clamping
    pub page_number: usize,
}
