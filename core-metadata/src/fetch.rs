//! # Fenced HTTP Fetching
//!
//! Every lookup in this crate goes through [`HttpFetcher`]. Requests use a
//! single attempt with the configured timeout; non-2xx statuses, empty bodies
//! and undecodable payloads all become errors that callers treat as "no
//! data here" and move on.
//!
//! ## Relays
//!
//! Streaming hosts and podcast sites rarely send CORS headers, so some
//! documents are fetched through public relays. A relay is described by a
//! [`RelayConfig`] template and returns the document either verbatim or inside
//! a `{"contents": ...}` JSON envelope.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use core_runtime::config::{MetadataApiConfig, RelayConfig, RelayFormat};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// Envelope returned by JSON relays such as allorigins
#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    #[serde(default)]
    contents: Option<String>,
}

/// Build the relay URL that fetches `target`.
pub fn relay_url(relay: &RelayConfig, target: &str) -> String {
    if relay.template.contains("{url}") {
        relay
            .template
            .replace("{url}", &urlencoding::encode(target))
    } else {
        relay.template.replace("{raw_url}", target)
    }
}

/// Single-attempt GET helper shared by all resolvers
#[derive(Clone)]
pub struct HttpFetcher {
    client: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(client: Arc<dyn HttpClient>, config: &MetadataApiConfig) -> Self {
        Self::new(client, Duration::from_millis(config.request_timeout_ms))
    }

    /// GET `url`, failing on any non-2xx status.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let request = HttpRequest::get(url).timeout(self.timeout);
        let response = self
            .client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?;

        if !response.is_success() {
            return Err(MetadataError::HttpStatus {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// GET `url` as text. An empty body is an error.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let text = self.get(url).await?.text();
        if text.trim().is_empty() {
            return Err(MetadataError::EmptyResponse(url.to_string()));
        }
        Ok(text)
    }

    /// GET `url` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(url).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Fetch `target` through `relay`, unwrapping JSON envelopes.
    pub async fn via_relay(&self, relay: &RelayConfig, target: &str) -> Result<String> {
        let url = relay_url(relay, target);
        debug!(relay = %relay.name, target = %target, "Fetching through relay");

        let contents = match relay.format {
            RelayFormat::Raw => self
                .get_text(&url)
                .await
                .map_err(|e| MetadataError::relay(&relay.name, e))?,
            RelayFormat::JsonContents => {
                let envelope: RelayEnvelope = self
                    .get_json(&url)
                    .await
                    .map_err(|e| MetadataError::relay(&relay.name, e))?;
                envelope.contents.unwrap_or_default()
            }
        };

        if contents.trim().is_empty() {
            return Err(MetadataError::relay(&relay.name, "empty contents"));
        }
        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_url_encodes_target() {
        let relay = RelayConfig::allorigins();
        assert_eq!(
            relay_url(&relay, "https://host/7.html?x=1"),
            "https://api.allorigins.win/get?url=https%3A%2F%2Fhost%2F7.html%3Fx%3D1"
        );
    }

    #[test]
    fn test_relay_url_raw_target() {
        let relay = RelayConfig::new(
            "thingproxy",
            "https://thingproxy.freeboard.io/fetch/{raw_url}",
            RelayFormat::Raw,
        );
        assert_eq!(
            relay_url(&relay, "https://feed/rss"),
            "https://thingproxy.freeboard.io/fetch/https://feed/rss"
        );
    }
}
