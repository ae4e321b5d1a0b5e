//! # Core Configuration Module
//!
//! Provides configuration management for the focus radio core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and settings the core needs. It enforces
//! fail-fast validation so a missing capability is reported at startup and not
//! at the first network call.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Metadata, cover art and podcast lookups (desktop default: reqwest)
//! - `SettingsStore` - Favorites, custom podcasts and preferences (desktop default: SQLite)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for both
//! are injected automatically if not provided. The SQLite store needs a
//! `settings_path`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, MetadataApiConfig};
//!
//! let config = CoreConfig::builder()
//!     .settings_path("/home/me/.config/focus-radio/settings.db")
//!     .enable_directory_lookup(false)
//!     .metadata_api_config(MetadataApiConfig::default().with_artwork_size(300))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // Without desktop shims and without bridges this fails with an actionable message
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Core configuration for the focus radio core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Location of the desktop settings database, if one was configured
    pub settings_path: Option<PathBuf>,

    /// HTTP client for every outbound lookup
    pub http_client: Arc<dyn HttpClient>,

    /// Durable key-value storage for user data
    pub settings_store: Arc<dyn SettingsStore>,

    /// Feature flags
    pub features: FeatureFlags,

    /// Endpoints and limits for metadata, artwork and podcast lookups
    pub metadata_api_config: MetadataApiConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("settings_path", &self.settings_path)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("features", &self.features)
            .field("metadata_api_config", &self.metadata_api_config)
            .finish()
    }
}

/// Feature flags control optional network behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Probe the radio-browser directory before generic ICY lookups
    pub enable_directory_lookup: bool,

    /// Look up cover art for resolved tracks
    pub enable_cover_art: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_directory_lookup: true,
            enable_cover_art: true,
        }
    }
}

/// How a relay returns the proxied document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayFormat {
    /// The body is the upstream document.
    Raw,
    /// The body is a JSON envelope with the document in `contents`.
    JsonContents,
}

/// A CORS relay that fetches a URL on our behalf.
///
/// `template` contains `{url}` (replaced by the percent-encoded target) or
/// `{raw_url}` (replaced by the target verbatim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub name: String,
    pub template: String,
    pub format: RelayFormat,
}

impl RelayConfig {
    pub fn new(name: impl Into<String>, template: impl Into<String>, format: RelayFormat) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            format,
        }
    }

    /// allorigins, which wraps the document in `{"contents": ...}`
    pub fn allorigins() -> Self {
        Self::new(
            "allorigins",
            "https://api.allorigins.win/get?url={url}",
            RelayFormat::JsonContents,
        )
    }

    fn validate(&self) -> Result<()> {
        if !self.template.contains("{url}") && !self.template.contains("{raw_url}") {
            return Err(Error::Config(format!(
                "Relay '{}' template must contain {{url}} or {{raw_url}}",
                self.name
            )));
        }
        Ok(())
    }
}

/// Configuration for external lookups.
///
/// Defaults point at the public services the player has always used. Hosts can
/// swap any base URL, e.g. to route through their own relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataApiConfig {
    /// laut.fm API base
    pub laut_fm_api_base: String,

    /// radio-browser directory base
    pub radio_browser_api_base: String,

    /// iTunes search endpoint
    pub itunes_search_url: String,

    /// Relay used for streaming-host status pages
    pub metadata_relay: RelayConfig,

    /// Relays tried in order when fetching podcast feeds and pages
    pub podcast_relays: Vec<RelayConfig>,

    /// Timeout for each outbound request in milliseconds
    pub request_timeout_ms: u64,

    /// Edge length of the artwork requested from iTunes, in pixels
    pub artwork_size: u32,

    /// Number of cover art lookups kept in memory
    pub artwork_cache_capacity: usize,
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self {
            laut_fm_api_base: "https://api.laut.fm".to_string(),
            radio_browser_api_base: "https://de1.api.radio-browser.info".to_string(),
            itunes_search_url: "https://itunes.apple.com/search".to_string(),
            metadata_relay: RelayConfig::allorigins(),
            podcast_relays: vec![
                RelayConfig::new("corsproxy", "https://corsproxy.io/?url={url}", RelayFormat::Raw),
                RelayConfig::allorigins(),
                RelayConfig::new(
                    "codetabs",
                    "https://api.codetabs.com/v1/proxy?url={url}",
                    RelayFormat::Raw,
                ),
                RelayConfig::new(
                    "thingproxy",
                    "https://thingproxy.freeboard.io/fetch/{raw_url}",
                    RelayFormat::Raw,
                ),
            ],
            request_timeout_ms: 10_000,
            artwork_size: 600,
            artwork_cache_capacity: 256,
        }
    }
}

impl MetadataApiConfig {
    /// Sets the metadata relay
    pub fn with_metadata_relay(mut self, relay: RelayConfig) -> Self {
        self.metadata_relay = relay;
        self
    }

    /// Replaces the podcast relay list
    pub fn with_podcast_relays(mut self, relays: Vec<RelayConfig>) -> Self {
        self.podcast_relays = relays;
        self
    }

    /// Sets the per-request timeout in milliseconds
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Sets the artwork edge length in pixels
    pub fn with_artwork_size(mut self, size: u32) -> Self {
        self.artwork_size = size;
        self
    }

    /// Sets the artwork cache capacity
    pub fn with_artwork_cache_capacity(mut self, capacity: usize) -> Self {
        self.artwork_cache_capacity = capacity;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        for (label, base) in [
            ("laut.fm API base", &self.laut_fm_api_base),
            ("radio-browser API base", &self.radio_browser_api_base),
            ("iTunes search URL", &self.itunes_search_url),
        ] {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    label, base
                )));
            }
        }

        self.metadata_relay.validate()?;

        if self.podcast_relays.is_empty() {
            return Err(Error::Config(
                "At least one podcast relay is required".to_string(),
            ));
        }
        for relay in &self.podcast_relays {
            relay.validate()?;
        }

        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than 0ms".to_string(),
            ));
        }

        if self.artwork_size == 0 || self.artwork_size > 3000 {
            return Err(Error::Config(
                "Artwork size must be between 1 and 3000 pixels".to_string(),
            ));
        }

        if self.artwork_cache_capacity == 0 {
            return Err(Error::Config(
                "Artwork cache capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.settings_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Settings path cannot be empty".to_string()));
            }
        }

        self.metadata_api_config.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for metadata and podcast lookups. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Mobile: inject the platform HTTP stack. \
                 Web: inject a fetch-based client."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for favorites and preferences. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore). \
                 Web: inject localStorage-based settings store."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout_ms: u64) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(std::time::Duration::from_millis(timeout_ms))
        .map_err(|e| Error::Internal(format!("Failed to create default HTTP client: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout_ms: u64) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(settings_path: Option<&PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let path = settings_path.cloned().ok_or_else(|| {
        Error::Config(
            "Settings path is required when no SettingsStore is provided. \
             Use .settings_path() to set it."
                .to_string(),
        )
    })?;

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // A runtime cannot block_on inside another runtime
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(
    _settings_path: Option<&PathBuf>,
) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    settings_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    features: FeatureFlags,
    metadata_api_config: Option<MetadataApiConfig>,
}

impl CoreConfigBuilder {
    /// Sets the location of the desktop settings database.
    ///
    /// Only used when no settings store is injected.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .settings_path("/path/to/settings.db");
    /// ```
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Enables or disables the radio-browser directory probe.
    ///
    /// Default: true
    pub fn enable_directory_lookup(mut self, enabled: bool) -> Self {
        self.features.enable_directory_lookup = enabled;
        self
    }

    /// Enables or disables cover art lookups.
    ///
    /// Default: true
    pub fn enable_cover_art(mut self, enabled: bool) -> Self {
        self.features.enable_cover_art = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Sets the lookup endpoints and limits.
    pub fn metadata_api_config(mut self, config: MetadataApiConfig) -> Self {
        self.metadata_api_config = Some(config);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing and no desktop default applies
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let metadata_api_config = self.metadata_api_config.unwrap_or_default();
        metadata_api_config.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(metadata_api_config.request_timeout_ms)?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path.as_ref())?,
        };

        let config = CoreConfig {
            settings_path: self.settings_path,
            http_client,
            settings_store,
            features: self.features,
            metadata_api_config,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> std::result::Result<Option<String>, BridgeError> {
            Ok(None)
        }

        async fn set_bool(&self, _key: &str, _value: bool) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_bool(&self, _key: &str) -> std::result::Result<Option<bool>, BridgeError> {
            Ok(None)
        }

        async fn set_f64(&self, _key: &str, _value: f64) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_f64(&self, _key: &str) -> std::result::Result<Option<f64>, BridgeError> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn has_key(&self, _key: &str) -> std::result::Result<bool, BridgeError> {
            Ok(false)
        }

        async fn list_keys(&self) -> std::result::Result<Vec<String>, BridgeError> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    fn builder_with_bridges() -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client() {
        let result = CoreConfig::builder()
            .settings_store(Arc::new(MockSettingsStore))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("HttpClient"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("SettingsStore"));
        assert!(err_msg.contains("favorites"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_need_settings_path() {
        let result = CoreConfig::builder().build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Settings path is required"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&base).unwrap();

        let config = CoreConfig::builder()
            .settings_path(base.join("settings.db"))
            .build()
            .expect("desktop defaults should succeed");

        let settings = config.settings_store.clone();
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async {
            settings.set_bool("darkMode", true).await.unwrap();
            assert_eq!(settings.get_bool("darkMode").await.unwrap(), Some(true));
        });

        drop(config);
        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn test_builder_with_bridges() {
        let config = builder_with_bridges().build().unwrap();

        assert!(config.settings_path.is_none());
        assert_eq!(config.features, FeatureFlags::default());
        assert_eq!(config.metadata_api_config, MetadataApiConfig::default());
    }

    #[test]
    fn test_builder_with_feature_flags() {
        let config = builder_with_bridges()
            .enable_directory_lookup(false)
            .build()
            .unwrap();

        assert!(!config.features.enable_directory_lookup);
        assert!(config.features.enable_cover_art);
    }

    #[test]
    fn test_default_metadata_config() {
        let config = MetadataApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.metadata_relay.name, "allorigins");
        let names: Vec<&str> = config.podcast_relays.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["corsproxy", "allorigins", "codetabs", "thingproxy"]);
        assert_eq!(config.artwork_size, 600);
    }

    #[test]
    fn test_validate_rejects_empty_relay_list() {
        let result = builder_with_bridges()
            .metadata_api_config(MetadataApiConfig::default().with_podcast_relays(Vec::new()))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("At least one podcast relay"));
    }

    #[test]
    fn test_validate_rejects_relay_without_placeholder() {
        let relay = RelayConfig::new("broken", "https://relay.example/fetch", RelayFormat::Raw);
        let config = MetadataApiConfig::default().with_metadata_relay(relay);

        let err_msg = config.validate().unwrap_err().to_string();
        assert!(err_msg.contains("broken"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = MetadataApiConfig::default().with_request_timeout_ms(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_artwork_size() {
        assert!(MetadataApiConfig::default()
            .with_artwork_size(0)
            .validate()
            .is_err());
        assert!(MetadataApiConfig::default()
            .with_artwork_cache_capacity(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_empty_settings_path() {
        let result = builder_with_bridges().settings_path("").build();
        assert!(result.is_err());
    }
}
