pub mod client;
pub mod error;
pub mod normalize;
pub mod query;
pub mod store;
pub mod traits;
pub mod types;

pub use client::{CatalogClient, ClientOptions};
pub use error::CatalogError;
pub use normalize::Normalizer;
pub use query::query;
pub use store::{CatalogSnapshot, CatalogStore, CatalogView, FetchState, ReloadOutcome};
pub use traits::CatalogSource;
pub use types::{CatalogParams, CategoryFilter, QueryResult, QueryState, SortKey};
