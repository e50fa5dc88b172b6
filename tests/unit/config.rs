//! Configuration Validation Unit Tests

use tyt_edge::config::{Config, ConfigError};
use url::Url;

fn valid_config() -> Config {
    Config {
        host: "0.0.0.0".to_string(),
        port: 8787,
        backend_url: Url::parse("http://localhost:54321").unwrap(),
        service_role_key: "service-role-key".to_string(),
        anon_key: "anon-key".to_string(),
        request_timeout_secs: 10,
        shutdown_timeout_secs: 30,
        sweep_interval_secs: 60,
    }
}

#[test]
fn valid_config_passes_validation() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn port_zero_is_rejected() {
    let mut config = valid_config();
    config.port = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidPort)));
}

#[test]
fn zero_timeouts_are_rejected() {
    let mut config = valid_config();
    config.request_timeout_secs = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTimeout(_))
    ));

    let mut config = valid_config();
    config.sweep_interval_secs = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTimeout(_))
    ));
}

#[test]
fn empty_credentials_are_rejected() {
    let mut config = valid_config();
    config.service_role_key = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingRequired(_))
    ));

    let mut config = valid_config();
    config.anon_key = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingRequired(_))
    ));
}

#[test]
fn backend_url_round_trips_as_str() {
    let config = valid_config();
    assert_eq!(config.backend_url_str(), "http://localhost:54321/");
}

#[test]
fn config_error_messages_name_the_field() {
    let err = ConfigError::MissingRequired("SUPABASE_ANON_KEY".into());
    assert!(err.to_string().contains("SUPABASE_ANON_KEY"));

    let err = ConfigError::InvalidTimeout("REQUEST_TIMEOUT".into());
    assert!(err.to_string().contains("REQUEST_TIMEOUT"));
}
