//! Reverse-geocoding fallback
//!
//! Queries a Nominatim-compatible `/reverse` endpoint for a human-readable
//! place name when no intersection lies within the search radius.

use crossroads_core::config::GeocoderConfig;
use crossroads_core::{Error, ErrorCode, Result};
use crossroads_geo::Coordinate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Reverse geocoder client
#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    inner: Client,
    endpoint: String,
}

/// Subset of the `format=jsonv2` reverse response that we read
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ReverseGeocoder {
    /// Create a client from the `[geocoder]` configuration section
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            Error::invalid_config("geocoder.user_agent", "not a valid header value").with_source(e)
        })?;
        default_headers.insert(USER_AGENT, agent);

        let inner = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| Error::network("Failed to build HTTP client").with_source(e))?;

        Ok(Self {
            inner,
            endpoint: reverse_endpoint(&config.base_url),
        })
    }

    /// The `/reverse` URL this client queries
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Look up a place name for `at`. `Ok(None)` when the service knows
    /// nothing there.
    #[instrument(skip(self, at), fields(lat = at.latitude, lng = at.longitude))]
    pub async fn lookup(&self, at: &Coordinate) -> Result<Option<String>> {
        let start = Instant::now();

        let response = self
            .inner
            .get(&self.endpoint)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| request_error(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::new(
                ErrorCode::RequestFailed,
                format!("Reverse geocoder returned HTTP {}", status),
            )
            .with_context(self.endpoint.clone()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(&self.endpoint, e))?;

        let name = parse_response(&body)?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            found = name.is_some(),
            "Reverse geocoding finished"
        );
        Ok(name)
    }
}

fn reverse_endpoint(base_url: &str) -> String {
    format!("{}/reverse", base_url.trim().trim_end_matches('/'))
}

fn request_error(endpoint: &str, err: reqwest::Error) -> Error {
    let code = if err.is_timeout() {
        ErrorCode::Timeout
    } else {
        ErrorCode::RequestFailed
    };
    Error::new(code, format!("Reverse geocoding request failed: {}", err))
        .with_context(endpoint.to_string())
        .with_suggestion(
            "Check network access or disable the fallback with `[geocoder] enabled = false`",
        )
        .with_source(err)
}

/// Extract the display name. Nominatim answers `{"error": "..."}` with
/// HTTP 200 when it has nothing at the location.
fn parse_response(body: &str) -> Result<Option<String>> {
    let response: ReverseResponse = serde_json::from_str(body).map_err(|e| {
        Error::new(
            ErrorCode::UnexpectedResponse,
            "Reverse geocoder returned an unexpected body",
        )
        .with_source(e)
    })?;

    if let Some(error) = response.error {
        debug!(%error, "Reverse geocoder has no result");
        return Ok(None);
    }

    Ok(response
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty()))
}
