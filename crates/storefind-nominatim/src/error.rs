use thiserror::Error;

/// Errors returned by the Nominatim geocoding client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status; the body is kept for
    /// diagnostics (Nominatim puts throttling hints there).
    #[error("geocoding provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The configured search URL could not be parsed.
    #[error("invalid geocoder URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
