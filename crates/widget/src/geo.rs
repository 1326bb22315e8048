//! Visitor geolocation over HTTP.
//!
//! Resolution is two steps: find the visitor's public IP, then look the IP
//! up in a geolocation service. In [`DeployMode::Live`] the connecting
//! address is the IP; in development the server asks an "what is my IP"
//! service for its own public address instead.

use async_trait::async_trait;
use messenger_core::engage::Location;
use serde::Deserialize;

use crate::config::{DeployMode, WidgetConfig};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// The HTTP request failed (network, DNS, timeout, body decode).
    #[error("Geolocation request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The lookup service answered with a non-2xx status.
    #[error("Geolocation service returned HTTP {0}")]
    HttpStatus(u16),

    /// Live mode without a connecting address.
    #[error("Visitor address is unknown")]
    MissingAddress,

    /// The IP lookup answered without an address.
    #[error("Malformed lookup response: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// LocationResolver
// ---------------------------------------------------------------------------

/// Resolves a visitor's coarse location.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, remote_address: Option<&str>) -> Result<Location, GeoError>;
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoLookupResponse {
    city: Option<String>,
    country: Option<String>,
}

impl From<GeoLookupResponse> for Location {
    fn from(response: GeoLookupResponse) -> Self {
        Self {
            city: response.city,
            country: response.country,
        }
    }
}

/// [`LocationResolver`] calling public HTTP services.
pub struct HttpLocationResolver {
    client: reqwest::Client,
    deploy_mode: DeployMode,
    ip_lookup_url: String,
    geo_lookup_url: String,
}

impl HttpLocationResolver {
    /// Build a resolver whose every request is bounded by
    /// `config.geo_timeout()`.
    pub fn new(config: &WidgetConfig) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder()
            .timeout(config.geo_timeout())
            .build()?;
        Ok(Self {
            client,
            deploy_mode: config.deploy_mode,
            ip_lookup_url: config.ip_lookup_url.clone(),
            geo_lookup_url: config.geo_lookup_url.clone(),
        })
    }

    fn geo_url(&self, ip: &str) -> String {
        format!("{}/{}/json", self.geo_lookup_url.trim_end_matches('/'), ip)
    }

    async fn public_ip(&self, remote_address: Option<&str>) -> Result<String, GeoError> {
        match self.deploy_mode {
            DeployMode::Live => remote_address
                .map(str::to_string)
                .ok_or(GeoError::MissingAddress),
            DeployMode::Development => {
                let response = self.client.get(&self.ip_lookup_url).send().await?;
                if !response.status().is_success() {
                    return Err(GeoError::HttpStatus(response.status().as_u16()));
                }
                let body: IpLookupResponse = response.json().await?;
                body.ip
                    .filter(|ip| !ip.is_empty())
                    .ok_or_else(|| GeoError::Malformed("missing `ip` field".to_string()))
            }
        }
    }
}

#[async_trait]
impl LocationResolver for HttpLocationResolver {
    async fn resolve(&self, remote_address: Option<&str>) -> Result<Location, GeoError> {
        let ip = self.public_ip(remote_address).await?;
        let response = self.client.get(self.geo_url(&ip)).send().await?;
        if !response.status().is_success() {
            return Err(GeoError::HttpStatus(response.status().as_u16()));
        }
        let body: GeoLookupResponse = response.json().await?;
        tracing::debug!(ip = %ip, city = ?body.city, country = ?body.country, "Resolved visitor location");
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn resolver(mode: DeployMode) -> HttpLocationResolver {
        let config = WidgetConfig {
            deploy_mode: mode,
            geo_lookup_url: "http://geo.example/".to_string(),
            ..Default::default()
        };
        HttpLocationResolver::new(&config).unwrap()
    }

    #[test]
    fn geo_url_appends_ip_and_json_suffix() {
        let r = resolver(DeployMode::Development);
        assert_eq!(r.geo_url("1.2.3.4"), "http://geo.example/1.2.3.4/json");
    }

    #[tokio::test]
    async fn live_mode_uses_connecting_address() {
        let r = resolver(DeployMode::Live);
        assert_eq!(r.public_ip(Some("203.0.113.7")).await.unwrap(), "203.0.113.7");
    }

    #[tokio::test]
    async fn live_mode_without_address_fails() {
        let r = resolver(DeployMode::Live);
        assert_matches!(r.public_ip(None).await, Err(GeoError::MissingAddress));
    }

    #[test]
    fn geo_response_ignores_extra_fields() {
        let body: GeoLookupResponse = serde_json::from_str(
            r#"{"ip":"1.2.3.4","city":"Ulaanbaatar","country":"MN","org":"AS1"}"#,
        )
        .unwrap();
        let location = Location::from(body);
        assert_eq!(location.city.as_deref(), Some("Ulaanbaatar"));
        assert_eq!(location.country.as_deref(), Some("MN"));
    }

    #[test]
    fn http_status_error_display() {
        assert_eq!(
            GeoError::HttpStatus(429).to_string(),
            "Geolocation service returned HTTP 429"
        );
    }
}
