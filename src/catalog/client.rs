use crate::catalog::error::{CatalogError, MALFORMED_ENVELOPE_MESSAGE};
use crate::catalog::traits::CatalogSource;
use crate::catalog::types::CatalogParams;
use crate::models::RawCatalogRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

const PROPERTIES_ENDPOINT: &str = "controllers/properties.php";
const DEFAULT_USER_AGENT: &str = concat!("realty-catalog/", env!("CARGO_PKG_VERSION"));

/// Connection options for [`CatalogClient`]
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Sent as `Authorization: Bearer <token>` when present
    pub auth_token: Option<String>,
    pub user_agent: Option<String>,
}

/// HTTP client for the backend's property catalog endpoint.
///
/// Cheap to clone: [`reqwest::Client`] is reference counted internally.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client without credentials
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, ClientOptions::default())
    }

    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = options.auth_token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("Auth token is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .user_agent(options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), PROPERTIES_ENDPOINT)
    }

    /// Issue one GET for `params` and unwrap the `{success, data, message}` envelope
    pub async fn fetch_catalog(
        &self,
        params: &CatalogParams,
    ) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        let url = self.endpoint();
        let query = params.query_pairs();
        debug!("Fetching {} with {:?}", url, query);

        let response = self.http.get(&url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Catalog endpoint returned status: {}", status);
            return Err(CatalogError::Transport {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await?;
        debug!("Downloaded {} bytes of catalog JSON", body.len());

        let records = parse_envelope(&body)?;
        info!("Fetched {} catalog records", records.len());
        Ok(records)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_catalog(
        &self,
        params: &CatalogParams,
    ) -> Result<Vec<RawCatalogRecord>, CatalogError> {
        CatalogClient::fetch_catalog(self, params).await
    }

    fn source_name(&self) -> &'static str {
        "properties.php"
    }
}

/// Decode a 2xx body. Rows that are not JSON objects are skipped.
fn parse_envelope(body: &[u8]) -> Result<Vec<RawCatalogRecord>, CatalogError> {
    let malformed = || CatalogError::Api {
        message: MALFORMED_ENVELOPE_MESSAGE.to_string(),
    };

    let envelope: Value = serde_json::from_slice(body).map_err(|err| {
        warn!("Catalog response is not JSON: {}", err);
        malformed()
    })?;
    let Value::Object(mut envelope) = envelope else {
        return Err(malformed());
    };

    let success = envelope
        .get("success")
        .and_then(success_flag)
        .ok_or_else(malformed)?;
    if !success {
        let message = envelope.get("message").and_then(Value::as_str);
        warn!("Catalog API reported failure: {:?}", message);
        return Err(CatalogError::api(message));
    }

    let rows = match envelope.remove("data") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            warn!("Catalog `data` is not an array: {}", other);
            return Err(malformed());
        }
    };

    let total = rows.len();
    let records: Vec<RawCatalogRecord> = rows
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if records.len() < total {
        warn!("Skipped {} malformed catalog rows", total - records.len());
    }
    Ok(records)
}

fn success_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
