use crate::catalog::error::CatalogError;
use crate::catalog::types::CatalogParams;
use crate::models::RawCatalogRecord;
use async_trait::async_trait;

/// Anything that can serve raw catalog rows.
/// The HTTP client is the real one; tests plug in fakes.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one batch of rows matching `params`
    async fn fetch_catalog(
        &self,
        params: &CatalogParams,
    ) -> Result<Vec<RawCatalogRecord>, CatalogError>;

    /// Name used in logs
    fn source_name(&self) -> &'static str;
}
