//! HTTP client for the Nominatim search API.
//!
//! Wraps `reqwest` with typed error handling and the query shapes the finder
//! needs: free-text search with an optional country hint, and structured
//! address search for the relaxation ladder. Non-2xx responses surface as
//! [`GeocodeError::Status`] carrying the response body.

use std::time::Duration;

use reqwest::{header, Client, Url};

use crate::error::GeocodeError;
use crate::types::{AddressQuery, Place};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Client for the Nominatim search endpoint.
///
/// Use [`NominatimClient::new`] for the public service or
/// [`NominatimClient::with_base_url`] to point at a self-hosted instance or a
/// mock server in tests.
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    /// Creates a client pointed at the public Nominatim service.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom search URL (configured endpoint
    /// override, or wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidUrl`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            // Nominatim's usage policy requires an identifying user agent.
            .user_agent("storefind/0.1 (merchant-finder)")
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| GeocodeError::InvalidUrl(format!("'{base_url}': {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Free-text place search (`q=`), with `addressdetails=1` so results can
    /// be turned into cache rows.
    ///
    /// When `country_hint` is given it is appended to the query text, the
    /// way the storefront sends "10115 de" for a single allowed country.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Http`] on network failure.
    /// - [`GeocodeError::Status`] on a non-2xx response.
    /// - [`GeocodeError::Deserialize`] if the body is not a place array.
    pub async fn search_free(
        &self,
        term: &str,
        country_hint: Option<&str>,
    ) -> Result<Vec<Place>, GeocodeError> {
        let query = match country_hint {
            Some(hint) => format!("{term} {hint}"),
            None => term.to_string(),
        };
        let url = self.build_url(&[("q", query.as_str()), ("addressdetails", "1")]);
        let body = self.request_json(&url).await?;

        serde_json::from_value(body).map_err(|e| GeocodeError::Deserialize {
            context: format!("search(q={query})"),
            source: e,
        })
    }

    /// Structured address search used by the relaxation ladder. Empty
    /// fragments are omitted from the query.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`NominatimClient::search_free`].
    pub async fn search_address(&self, address: &AddressQuery) -> Result<Vec<Place>, GeocodeError> {
        let street_line = address.street_line();
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(street) = street_line.as_deref() {
            params.push(("street", street));
        }
        if let Some(zipcode) = address.zipcode.as_deref() {
            params.push(("postalcode", zipcode));
        }
        if let Some(city) = address.city.as_deref() {
            params.push(("city", city));
        }
        if let Some(country) = address.country_iso.as_deref() {
            params.push(("country", country));
        }

        let url = self.build_url(&params);
        let body = self.request_json(&url).await?;

        serde_json::from_value(body).map_err(|e| GeocodeError::Deserialize {
            context: format!("search(address={address:?})"),
            source: e,
        })
    }

    /// Builds the full request URL with percent-encoded query parameters.
    /// `format=json` is always appended.
    fn build_url(&self, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("format", "json");
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET request with a JSON accept header and parses the body.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] on network failure,
    /// [`GeocodeError::Status`] on a non-2xx status (body preserved), and
    /// [`GeocodeError::Deserialize`] if the body is not valid JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, GeocodeError> {
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}
