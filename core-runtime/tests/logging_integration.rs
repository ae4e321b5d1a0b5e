//! Integration tests for logging system

use bridge_traits::log::LogLevel;
use core_runtime::logging::{strip_query, LogFormat, LoggingConfig};

#[test]
fn test_logging_config_builder() {
    // Logging can only be installed once per process, so only the builder is covered here
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(config.enable_spans);
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_query_stripping() {
    assert_eq!(
        strip_query("https://regiocast.streamabc.net/regc-radiopsrlive-mp3-192?sABC=abc;&aw_0_1st.playerid=web"),
        "https://regiocast.streamabc.net/regc-radiopsrlive-mp3-192"
    );
    assert_eq!(strip_query("https://stream.laut.fm/lofi"), "https://stream.laut.fm/lofi");
}

#[test]
fn test_custom_filter_is_kept() {
    let config = LoggingConfig::default().with_filter("core_metadata=debug,core_tones=trace");
    assert_eq!(
        config.filter.as_deref(),
        Some("core_metadata=debug,core_tones=trace")
    );
}
