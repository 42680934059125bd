//! Integration tests for logging and configuration

use bridge_traits::time::LogLevel;
use core_runtime::config::{env, EngineConfig};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_second_initialization_is_rejected() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug);

    // Only the first global initialization in this test binary may succeed.
    let first = init_logging(config.clone());
    let second = init_logging(config);

    assert!(first.is_ok());
    assert!(matches!(second, Err(Error::Config(_))));
}

#[test]
fn test_redaction_of_credentials() {
    assert_eq!(redact_if_sensitive("password", "my_password"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("x_auth_token", "gAAAA"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("container", "photos"), "photos");
}

#[test]
fn test_env_loading_end_to_end() {
    let lookup = |name: &str| -> Option<String> {
        match name {
            n if n == env::STORAGE_AUTH_URL => Some("https://identity.example.com".into()),
            n if n == env::STORAGE_USER_ID => Some("user".into()),
            n if n == env::STORAGE_PASSWORD => Some("pw".into()),
            n if n == env::STORAGE_PROJECT_ID => Some("proj".into()),
            n if n == env::TRAINER_URL => Some("https://nlc.example.com/api/".into()),
            n if n == env::TRAINER_USERNAME => Some("nlc".into()),
            n if n == env::TRAINER_PASSWORD => Some("nlc-pw".into()),
            n if n == env::CLASSIFIER_NAME => Some("my-classifier".into()),
            n if n == env::CORPUS_DIR => Some("/tmp/corpora".into()),
            _ => None,
        }
    };

    let config = EngineConfig::from_lookup(lookup).unwrap();
    assert_eq!(config.trainer.url, "https://nlc.example.com/api");
    assert_eq!(config.trainer.classifier_name, "my-classifier");
    assert_eq!(
        config.corpus_dir.as_deref(),
        Some(std::path::Path::new("/tmp/corpora"))
    );
}
