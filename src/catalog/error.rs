use thiserror::Error;

/// Fallback shown when the backend reports failure without a message
pub const DEFAULT_API_MESSAGE: &str = "Failed to load listings.";

/// Shown when a 2xx body is not the `{success, data, message}` envelope
pub const MALFORMED_ENVELOPE_MESSAGE: &str = "Malformed response from catalog service.";

/// Everything that can go wrong while loading the catalog.
///
/// `Display` is the message shown to the user next to the retry action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The request never got a response
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-2xx status
    #[error("Server error {status}: {status_text}")]
    Transport { status: u16, status_text: String },
    /// The server answered 2xx but reported failure or sent garbage
    #[error("{message}")]
    Api { message: String },
}

impl CatalogError {
    pub fn api(message: Option<&str>) -> Self {
        let message = match message.map(str::trim) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => DEFAULT_API_MESSAGE.to_string(),
        };
        CatalogError::Api { message }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return CatalogError::Transport {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            };
        }
        CatalogError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_is_shown_verbatim() {
        assert_eq!(CatalogError::api(Some("DB down")).to_string(), "DB down");
    }

    #[test]
    fn api_message_falls_back_when_blank() {
        assert_eq!(CatalogError::api(None).to_string(), DEFAULT_API_MESSAGE);
        assert_eq!(CatalogError::api(Some("  ")).to_string(), DEFAULT_API_MESSAGE);
    }

    #[test]
    fn transport_mentions_status() {
        let err = CatalogError::Transport {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "Server error 500: Internal Server Error");
    }
}
