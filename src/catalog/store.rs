use crate::catalog::error::CatalogError;
use crate::catalog::normalize::Normalizer;
use crate::catalog::query::query;
use crate::catalog::traits::CatalogSource;
use crate::catalog::types::{CatalogParams, QueryResult, QueryState};
use crate::models::DisplayListing;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One successful, normalized fetch
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub listings: Arc<Vec<DisplayListing>>,
    /// Parameters the listings were fetched with
    pub params: CatalogParams,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum FetchState {
    Loading,
    Failed(CatalogError),
    Loaded(CatalogSnapshot),
}

/// Whether a finished reload was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied,
    /// A newer reload was started meanwhile; this result was dropped
    Superseded,
}

/// What the page should render
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogView {
    Loading,
    Error { message: String },
    /// The fetch succeeded but nothing matches
    Empty,
    Page(QueryResult),
}

struct Inner {
    state: FetchState,
    /// Bumped by every reload; only the newest may commit
    generation: u64,
    last_params: Option<CatalogParams>,
}

/// Holds the most recent catalog fetch and serves queries over it.
///
/// Fetches run only through [`reload`](Self::reload); search, sort and page
/// changes are answered from the current snapshot. When reloads overlap, the
/// last one started wins regardless of completion order.
pub struct CatalogStore<S> {
    source: S,
    normalizer: Normalizer,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl<S: CatalogSource> CatalogStore<S> {
    pub fn new(source: S, normalizer: Normalizer) -> Self {
        Self {
            source,
            normalizer,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            inner: Mutex::new(Inner {
                state: FetchState::Loading,
                generation: 0,
                last_params: None,
            }),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch `params` and replace the snapshot, unless a newer reload was
    /// started before this one finished.
    pub async fn reload(&self, params: CatalogParams) -> ReloadOutcome {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.state = FetchState::Loading;
            inner.last_params = Some(params.clone());
            inner.generation
        };
        info!(
            "Reloading catalog from {} (generation {})",
            self.source.source_name(),
            generation
        );

        let fetched =
            match tokio::time::timeout(self.timeout, self.source.fetch_catalog(&params)).await {
                Ok(result) => result,
                Err(_) => Err(CatalogError::Network(format!(
                    "request timed out after {:?}",
                    self.timeout
                ))),
            };

        let state = match fetched {
            Ok(rows) => FetchState::Loaded(CatalogSnapshot {
                listings: Arc::new(self.normalizer.normalize_all(&rows)),
                params,
                fetched_at: Utc::now(),
            }),
            Err(err) => {
                warn!("Catalog reload failed: {}", err);
                FetchState::Failed(err)
            }
        };

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(
                "Dropping result of generation {} (current is {})",
                generation, inner.generation
            );
            return ReloadOutcome::Superseded;
        }
        if let FetchState::Loaded(snapshot) = &state {
            info!("Loaded {} listings", snapshot.listings.len());
        }
        inner.state = state;
        ReloadOutcome::Applied
    }

    /// Re-run the last started reload once
    pub async fn retry(&self) -> ReloadOutcome {
        let params = self.lock().last_params.clone().unwrap_or_default();
        self.reload(params).await
    }

    /// True when `query` asks for a different category or status than the
    /// last reload, when the last reload fetched only the featured subset,
    /// or when nothing was loaded yet.
    pub fn needs_reload(&self, query: &QueryState) -> bool {
        let wanted = query.catalog_params();
        match &self.lock().last_params {
            None => true,
            Some(params) => {
                params.featured != wanted.featured
                    || params.category != wanted.category
                    || params.status != wanted.status
            }
        }
    }

    pub fn state(&self) -> FetchState {
        self.lock().state.clone()
    }

    pub fn snapshot(&self) -> Option<CatalogSnapshot> {
        match &self.lock().state {
            FetchState::Loaded(snapshot) => Some(snapshot.clone()),
            _ => None,
        }
    }

    /// Run `query` over the current snapshot
    pub fn view(&self, query_state: &QueryState) -> CatalogView {
        let listings = match self.state() {
            FetchState::Loading => return CatalogView::Loading,
            FetchState::Failed(err) => {
                return CatalogView::Error {
                    message: err.to_string(),
                }
            }
            FetchState::Loaded(snapshot) => snapshot.listings,
        };

        let result = query(&listings, query_state);
        if result.total_count == 0 {
            CatalogView::Empty
        } else {
            CatalogView::Page(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::CategoryFilter;
    use crate::models::{ListingStatus, RawCatalogRecord};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    type Reply = (Duration, Result<Vec<RawCatalogRecord>, CatalogError>);

    struct ScriptedSource {
        reply: Box<dyn Fn(&CatalogParams) -> Reply + Send + Sync>,
        calls: Arc<Mutex<Vec<CatalogParams>>>,
    }

    impl ScriptedSource {
        fn new(reply: impl Fn(&CatalogParams) -> Reply + Send + Sync + 'static) -> Self {
            Self {
                reply: Box::new(reply),
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn fetch_catalog(
            &self,
            params: &CatalogParams,
        ) -> Result<Vec<RawCatalogRecord>, CatalogError> {
            self.calls.lock().unwrap().push(params.clone());
            let (delay, result) = (self.reply)(params);
            tokio::time::sleep(delay).await;
            result
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn row(title: &str) -> RawCatalogRecord {
        serde_json::from_value(json!({ "id": title, "title": title, "price": 1000 })).unwrap()
    }

    fn titles(store: &CatalogStore<ScriptedSource>) -> Vec<String> {
        store
            .snapshot()
            .unwrap()
            .listings
            .iter()
            .map(|l| l.title.clone())
            .collect()
    }

    #[tokio::test]
    async fn starts_loading_until_first_reload() {
        let store = CatalogStore::new(
            ScriptedSource::new(|_| (Duration::ZERO, Ok(vec![]))),
            Normalizer::default(),
        );
        assert_eq!(store.view(&QueryState::default()), CatalogView::Loading);
        assert!(store.needs_reload(&QueryState::default()));
    }

    #[tokio::test]
    async fn reload_normalizes_rows() {
        let store = CatalogStore::new(
            ScriptedSource::new(|_| (Duration::ZERO, Ok(vec![row("Villa"), row("Duplex")]))),
            Normalizer::default(),
        );

        assert_eq!(
            store.reload(CatalogParams::default()).await,
            ReloadOutcome::Applied
        );

        let CatalogView::Page(result) = store.view(&QueryState::default()) else {
            panic!("expected a page");
        };
        assert_eq!(result.total_count, 2);
        assert_eq!(result.page[0].price, "₦1,000");
        assert_eq!(titles(&store), vec!["Villa", "Duplex"]);
    }

    #[tokio::test]
    async fn last_initiated_reload_wins() {
        let store = CatalogStore::new(
            ScriptedSource::new(|params| match params.category {
                CategoryFilter::OffPlan => (Duration::from_millis(200), Ok(vec![row("stale")])),
                _ => (Duration::from_millis(10), Ok(vec![row("fresh")])),
            }),
            Normalizer::default(),
        );

        let (first, second) = tokio::join!(
            store.reload(CatalogParams::listings(CategoryFilter::OffPlan, None)),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                store
                    .reload(CatalogParams::listings(CategoryFilter::Ready, None))
                    .await
            }
        );

        assert_eq!(first, ReloadOutcome::Superseded);
        assert_eq!(second, ReloadOutcome::Applied);
        assert_eq!(titles(&store), vec!["fresh"]);
        assert_eq!(
            store.snapshot().unwrap().params.category,
            CategoryFilter::Ready
        );
    }

    #[tokio::test]
    async fn stale_failure_does_not_replace_newer_result() {
        let store = CatalogStore::new(
            ScriptedSource::new(|params| match params.status {
                Some(ListingStatus::Sold) => (
                    Duration::from_millis(150),
                    Err(CatalogError::api(Some("DB down"))),
                ),
                _ => (Duration::ZERO, Ok(vec![row("fresh")])),
            }),
            Normalizer::default(),
        );

        let (first, second) = tokio::join!(
            store.reload(CatalogParams::listings(
                CategoryFilter::All,
                Some(ListingStatus::Sold)
            )),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                store.reload(CatalogParams::default()).await
            }
        );

        assert_eq!((first, second), (ReloadOutcome::Superseded, ReloadOutcome::Applied));
        assert!(matches!(store.state(), FetchState::Loaded(_)));
    }

    #[tokio::test]
    async fn slow_source_times_out_as_network_error() {
        let store = CatalogStore::new(
            ScriptedSource::new(|_| (Duration::from_secs(5), Ok(vec![]))),
            Normalizer::default(),
        )
        .with_timeout(Duration::from_millis(50));

        store.reload(CatalogParams::default()).await;

        match store.state() {
            FetchState::Failed(CatalogError::Network(message)) => {
                assert!(message.contains("timed out"), "{message}")
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_and_error_views_are_distinct() {
        let empty = CatalogStore::new(
            ScriptedSource::new(|_| (Duration::ZERO, Ok(vec![]))),
            Normalizer::default(),
        );
        empty.reload(CatalogParams::default()).await;
        assert_eq!(empty.view(&QueryState::default()), CatalogView::Empty);

        let failing = CatalogStore::new(
            ScriptedSource::new(|_| {
                (Duration::ZERO, Err(CatalogError::api(Some("DB down"))))
            }),
            Normalizer::default(),
        );
        failing.reload(CatalogParams::default()).await;
        assert_eq!(
            failing.view(&QueryState::default()),
            CatalogView::Error {
                message: "DB down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn search_without_matches_is_empty() {
        let store = CatalogStore::new(
            ScriptedSource::new(|_| (Duration::ZERO, Ok(vec![row("Villa")]))),
            Normalizer::default(),
        );
        store.reload(CatalogParams::default()).await;

        let state = QueryState {
            search: "castle".to_string(),
            ..QueryState::default()
        };
        assert_eq!(store.view(&state), CatalogView::Empty);
    }

    #[tokio::test]
    async fn only_filter_changes_need_reload() {
        let source = ScriptedSource::new(|_| (Duration::ZERO, Ok(vec![row("Villa")])));
        let calls = source.calls.clone();
        let store = CatalogStore::new(source, Normalizer::default());

        let mut state = QueryState::default();
        store.reload(state.catalog_params()).await;

        state.search = "villa".to_string();
        state.page = 3;
        state.sort = crate::catalog::types::SortKey::PriceDesc;
        assert!(!store.needs_reload(&state));

        state.category = CategoryFilter::OffPlan;
        assert!(store.needs_reload(&state));

        state.category = CategoryFilter::All;
        state.status = Some(ListingStatus::Available);
        assert!(store.needs_reload(&state));

        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn featured_subset_is_not_reused_for_listings() {
        let store = CatalogStore::new(
            ScriptedSource::new(|_| (Duration::ZERO, Ok(vec![row("Villa")]))),
            Normalizer::default(),
        );
        store.reload(CatalogParams::featured(None)).await;

        assert!(store.needs_reload(&QueryState::default()));

        store.reload(QueryState::default().catalog_params()).await;
        assert!(!store.needs_reload(&QueryState::default()));
    }

    #[tokio::test]
    async fn retry_repeats_last_params_once() {
        let source = ScriptedSource::new(|_| {
            (Duration::ZERO, Err(CatalogError::Network("refused".into())))
        });
        let calls = source.calls.clone();
        let store = CatalogStore::new(source, Normalizer::default());

        let params = CatalogParams::featured(Some(ListingStatus::Available));
        store.reload(params.clone()).await;
        store.retry().await;

        assert_eq!(*calls.lock().unwrap(), vec![params.clone(), params]);
        assert!(matches!(store.view(&QueryState::default()), CatalogView::Error { .. }));
    }
}
