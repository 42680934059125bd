//! # Engine Configuration
//!
//! Settings for the storage connector, the trainer connector and the indexing
//! engine, built once at startup and validated before anything is wired.
//!
//! ## Usage
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//!
//! let config = EngineConfig::from_env()?;
//! ```
//!
//! Variables read (a Cloud Foundry `VCAP_SERVICES` binding for `Object-Storage`
//! or `natural_language_classifier` overrides the matching credentials):
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `HUBOT_OBJECT_STORAGE_AUTH_URL` | Keystone base URL |
//! | `HUBOT_OBJECT_STORAGE_USER_ID` | Storage user id |
//! | `HUBOT_OBJECT_STORAGE_PASSWORD` | Storage password |
//! | `HUBOT_OBJECT_STORAGE_PROJECT_ID` | Storage project id |
//! | `HUBOT_OBJECT_STORAGE_BLUEMIX_REGION` | Region, default `dallas` |
//! | `HUBOT_WATSON_NLC_URL` | Classifier service URL |
//! | `HUBOT_WATSON_NLC_USERNAME` | Classifier username |
//! | `HUBOT_WATSON_NLC_PASSWORD` | Classifier password |
//! | `HUBOT_WATSON_NLC_OJBECTSTORAGE_CLASSIFIER_NAME` | Classifier name |
//! | `HUBOT_OBJECT_STORAGE_CORPUS_DIR` | Directory for stored corpora |
//! | `HUBOT_LOG_LEVEL` | Log level, default `info` |
//!
//! ### With the builder
//!
//! ```ignore
//! let config = EngineConfig::builder()
//!     .storage_auth_url("https://identity.open.softlayer.com")
//!     .storage_user_id("user")
//!     .storage_password("secret")
//!     .storage_project_id("project")
//!     .trainer_url("https://gateway.watsonplatform.net/natural-language-classifier/api")
//!     .trainer_username("nlc-user")
//!     .trainer_password("nlc-secret")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::{parse_log_level, redact_if_sensitive};
use bridge_traits::time::LogLevel;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "dallas";
pub const DEFAULT_CLASSIFIER_NAME: &str = "cloudbot-obj-storage-classifier";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_SCAN_CONCURRENCY: usize = 10;
pub const DEFAULT_INDEX_CONCURRENCY: usize = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Environment variable names
pub mod env {
    pub const STORAGE_AUTH_URL: &str = "HUBOT_OBJECT_STORAGE_AUTH_URL";
    pub const STORAGE_USER_ID: &str = "HUBOT_OBJECT_STORAGE_USER_ID";
    pub const STORAGE_PASSWORD: &str = "HUBOT_OBJECT_STORAGE_PASSWORD";
    pub const STORAGE_PROJECT_ID: &str = "HUBOT_OBJECT_STORAGE_PROJECT_ID";
    pub const STORAGE_REGION: &str = "HUBOT_OBJECT_STORAGE_BLUEMIX_REGION";
    pub const TRAINER_URL: &str = "HUBOT_WATSON_NLC_URL";
    pub const TRAINER_USERNAME: &str = "HUBOT_WATSON_NLC_USERNAME";
    pub const TRAINER_PASSWORD: &str = "HUBOT_WATSON_NLC_PASSWORD";
    pub const CLASSIFIER_NAME: &str = "HUBOT_WATSON_NLC_OJBECTSTORAGE_CLASSIFIER_NAME";
    pub const CORPUS_DIR: &str = "HUBOT_OBJECT_STORAGE_CORPUS_DIR";
    pub const LOG_LEVEL: &str = "HUBOT_LOG_LEVEL";
    pub const VCAP_SERVICES: &str = "VCAP_SERVICES";
}

/// Object storage (Swift + Keystone v3) credentials
#[derive(Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub auth_url: String,
    pub user_id: String,
    pub password: String,
    pub project_id: String,
    pub region: String,
}

/// Classifier trainer credentials and job settings
#[derive(Clone, PartialEq, Eq)]
pub struct TrainerSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Jobs are filtered by this name; only our own classifiers are considered
    pub classifier_name: String,
    pub language: String,
    /// How often a running training job is polled
    pub poll_interval: Duration,
}

/// Fan-out windows for scan and index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexingSettings {
    /// Concurrent metadata fetches per container during scan
    pub scan_concurrency: usize,
    /// Concurrent objects being tagged during index
    pub index_concurrency: usize,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            scan_concurrency: DEFAULT_SCAN_CONCURRENCY,
            index_concurrency: DEFAULT_INDEX_CONCURRENCY,
        }
    }
}

/// Complete, validated configuration
#[derive(Clone)]
pub struct EngineConfig {
    pub storage: StorageSettings,
    pub trainer: TrainerSettings,
    pub indexing: IndexingSettings,
    /// Where submitted corpora are kept; `None` uses the platform data directory
    pub corpus_dir: Option<PathBuf>,
    pub log_level: LogLevel,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut builder = EngineConfigBuilder {
            storage_auth_url: get(env::STORAGE_AUTH_URL),
            storage_user_id: get(env::STORAGE_USER_ID),
            storage_password: get(env::STORAGE_PASSWORD),
            storage_project_id: get(env::STORAGE_PROJECT_ID),
            storage_region: get(env::STORAGE_REGION),
            trainer_url: get(env::TRAINER_URL),
            trainer_username: get(env::TRAINER_USERNAME),
            trainer_password: get(env::TRAINER_PASSWORD),
            classifier_name: get(env::CLASSIFIER_NAME),
            corpus_dir: get(env::CORPUS_DIR).map(PathBuf::from),
            ..EngineConfigBuilder::default()
        };

        if let Some(level) = get(env::LOG_LEVEL) {
            let parsed = parse_log_level(&level).ok_or_else(|| {
                Error::Config(format!("{} has unknown level {:?}", env::LOG_LEVEL, level))
            })?;
            builder = builder.log_level(parsed);
        }

        if let Some(vcap) = get(env::VCAP_SERVICES) {
            builder.apply_vcap_services(&vcap)?;
        }

        builder.build()
    }

    /// Check every required setting, reporting the first one missing.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (env::STORAGE_AUTH_URL, &self.storage.auth_url),
            (env::STORAGE_USER_ID, &self.storage.user_id),
            (env::STORAGE_PASSWORD, &self.storage.password),
            (env::STORAGE_PROJECT_ID, &self.storage.project_id),
            (env::STORAGE_REGION, &self.storage.region),
            (env::TRAINER_URL, &self.trainer.url),
            (env::TRAINER_USERNAME, &self.trainer.username),
            (env::TRAINER_PASSWORD, &self.trainer.password),
            (env::CLASSIFIER_NAME, &self.trainer.classifier_name),
        ];

        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(Error::MissingSetting {
                name: (*name).to_string(),
            });
        }

        for (name, url) in [
            (env::STORAGE_AUTH_URL, &self.storage.auth_url),
            (env::TRAINER_URL, &self.trainer.url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }

        if self.indexing.scan_concurrency == 0 || self.indexing.index_concurrency == 0 {
            return Err(Error::Config(
                "Scan and index concurrency must be at least 1".to_string(),
            ));
        }

        if self.trainer.poll_interval.is_zero() {
            return Err(Error::Config(
                "Training poll interval must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("auth_url", &self.auth_url)
            .field("user_id", &redact_if_sensitive("user_id", &self.user_id))
            .field("password", &redact_if_sensitive("password", &self.password))
            .field("project_id", &self.project_id)
            .field("region", &self.region)
            .finish()
    }
}

impl fmt::Debug for TrainerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainerSettings")
            .field("url", &self.url)
            .field("username", &redact_if_sensitive("username", &self.username))
            .field("password", &redact_if_sensitive("password", &self.password))
            .field("classifier_name", &self.classifier_name)
            .field("language", &self.language)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("storage", &self.storage)
            .field("trainer", &self.trainer)
            .field("indexing", &self.indexing)
            .field("corpus_dir", &self.corpus_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Builder for [`EngineConfig`]
#[derive(Debug, Default, Clone)]
pub struct EngineConfigBuilder {
    storage_auth_url: Option<String>,
    storage_user_id: Option<String>,
    storage_password: Option<String>,
    storage_project_id: Option<String>,
    storage_region: Option<String>,
    trainer_url: Option<String>,
    trainer_username: Option<String>,
    trainer_password: Option<String>,
    classifier_name: Option<String>,
    language: Option<String>,
    poll_interval: Option<Duration>,
    indexing: IndexingSettings,
    corpus_dir: Option<PathBuf>,
    log_level: Option<LogLevel>,
}

impl EngineConfigBuilder {
    pub fn storage_auth_url(mut self, value: impl Into<String>) -> Self {
        self.storage_auth_url = Some(value.into());
        self
    }

    pub fn storage_user_id(mut self, value: impl Into<String>) -> Self {
        self.storage_user_id = Some(value.into());
        self
    }

    pub fn storage_password(mut self, value: impl Into<String>) -> Self {
        self.storage_password = Some(value.into());
        self
    }

    pub fn storage_project_id(mut self, value: impl Into<String>) -> Self {
        self.storage_project_id = Some(value.into());
        self
    }

    pub fn storage_region(mut self, value: impl Into<String>) -> Self {
        self.storage_region = Some(value.into());
        self
    }

    pub fn trainer_url(mut self, value: impl Into<String>) -> Self {
        self.trainer_url = Some(value.into());
        self
    }

    pub fn trainer_username(mut self, value: impl Into<String>) -> Self {
        self.trainer_username = Some(value.into());
        self
    }

    pub fn trainer_password(mut self, value: impl Into<String>) -> Self {
        self.trainer_password = Some(value.into());
        self
    }

    pub fn classifier_name(mut self, value: impl Into<String>) -> Self {
        self.classifier_name = Some(value.into());
        self
    }

    pub fn language(mut self, value: impl Into<String>) -> Self {
        self.language = Some(value.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn scan_concurrency(mut self, limit: usize) -> Self {
        self.indexing.scan_concurrency = limit;
        self
    }

    pub fn index_concurrency(mut self, limit: usize) -> Self {
        self.indexing.index_concurrency = limit;
        self
    }

    pub fn corpus_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.corpus_dir = Some(dir.into());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Overlay credentials from a Cloud Foundry `VCAP_SERVICES` document.
    fn apply_vcap_services(&mut self, raw: &str) -> Result<()> {
        let services: Value = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("{} is not valid JSON: {}", env::VCAP_SERVICES, e)))?;

        let credentials = |service: &str| services.get(service)?.get(0)?.get("credentials");
        let field = |creds: &Value, key: &str| creds.get(key)?.as_str().map(str::to_string);

        if let Some(creds) = credentials("Object-Storage") {
            self.storage_auth_url = field(creds, "auth_url").or(self.storage_auth_url.take());
            self.storage_user_id = field(creds, "userId").or(self.storage_user_id.take());
            self.storage_password = field(creds, "password").or(self.storage_password.take());
            self.storage_project_id = field(creds, "projectId").or(self.storage_project_id.take());
            self.storage_region = field(creds, "region").or(self.storage_region.take());
        }

        if let Some(creds) = credentials("natural_language_classifier") {
            self.trainer_url = field(creds, "url").or(self.trainer_url.take());
            self.trainer_username = field(creds, "username").or(self.trainer_username.take());
            self.trainer_password = field(creds, "password").or(self.trainer_password.take());
        }

        Ok(())
    }

    pub fn build(self) -> Result<EngineConfig> {
        let config = EngineConfig {
            storage: StorageSettings {
                auth_url: trim_trailing_slash(self.storage_auth_url.unwrap_or_default()),
                user_id: self.storage_user_id.unwrap_or_default(),
                password: self.storage_password.unwrap_or_default(),
                project_id: self.storage_project_id.unwrap_or_default(),
                region: self
                    .storage_region
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            },
            trainer: TrainerSettings {
                url: trim_trailing_slash(self.trainer_url.unwrap_or_default()),
                username: self.trainer_username.unwrap_or_default(),
                password: self.trainer_password.unwrap_or_default(),
                classifier_name: self
                    .classifier_name
                    .unwrap_or_else(|| DEFAULT_CLASSIFIER_NAME.to_string()),
                language: self
                    .language
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            },
            indexing: self.indexing,
            corpus_dir: self.corpus_dir,
            log_level: self.log_level.unwrap_or(LogLevel::Info),
        };

        config.validate()?;
        Ok(config)
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (env::STORAGE_AUTH_URL, "https://identity.example.com/".to_string()),
            (env::STORAGE_USER_ID, "user-1".to_string()),
            (env::STORAGE_PASSWORD, "storage-secret".to_string()),
            (env::STORAGE_PROJECT_ID, "project-1".to_string()),
            (env::TRAINER_URL, "https://nlc.example.com/api".to_string()),
            (env::TRAINER_USERNAME, "nlc-user".to_string()),
            (env::TRAINER_PASSWORD, "nlc-secret".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<EngineConfig> {
        EngineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_from_lookup_applies_defaults() {
        let config = load(&complete_env()).unwrap();

        assert_eq!(config.storage.auth_url, "https://identity.example.com");
        assert_eq!(config.storage.region, DEFAULT_REGION);
        assert_eq!(config.trainer.classifier_name, DEFAULT_CLASSIFIER_NAME);
        assert_eq!(config.trainer.language, "en");
        assert_eq!(config.indexing.scan_concurrency, 10);
        assert_eq!(config.indexing.index_concurrency, 5);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.corpus_dir.is_none());
    }

    #[test]
    fn test_missing_setting_names_variable() {
        let mut vars = complete_env();
        vars.remove(env::TRAINER_URL);

        match load(&vars) {
            Err(Error::MissingSetting { name }) => assert_eq!(name, "HUBOT_WATSON_NLC_URL"),
            other => panic!("expected missing setting, got {:?}", other),
        }
    }

    #[test]
    fn test_storage_settings_checked_first() {
        let mut vars = complete_env();
        vars.remove(env::STORAGE_PASSWORD);
        vars.remove(env::TRAINER_PASSWORD);

        match load(&vars) {
            Err(Error::MissingSetting { name }) => {
                assert_eq!(name, "HUBOT_OBJECT_STORAGE_PASSWORD")
            }
            other => panic!("expected missing setting, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut vars = complete_env();
        vars.insert(env::STORAGE_USER_ID, "   ".to_string());

        assert!(matches!(load(&vars), Err(Error::MissingSetting { .. })));
    }

    #[test]
    fn test_vcap_services_override() {
        let mut vars = complete_env();
        vars.insert(
            env::VCAP_SERVICES,
            r#"{
                "Object-Storage": [{"credentials": {
                    "auth_url": "https://vcap-identity.example.com",
                    "userId": "vcap-user", "password": "vcap-pass",
                    "projectId": "vcap-project", "region": "london"}}],
                "natural_language_classifier": [{"credentials": {
                    "url": "https://vcap-nlc.example.com",
                    "username": "vcap-nlc", "password": "vcap-nlc-pass"}}]
            }"#
            .to_string(),
        );

        let config = load(&vars).unwrap();
        assert_eq!(config.storage.user_id, "vcap-user");
        assert_eq!(config.storage.region, "london");
        assert_eq!(config.trainer.url, "https://vcap-nlc.example.com");
        assert_eq!(config.trainer.username, "vcap-nlc");
    }

    #[test]
    fn test_invalid_vcap_services() {
        let mut vars = complete_env();
        vars.insert(env::VCAP_SERVICES, "{not json".to_string());
        assert!(matches!(load(&vars), Err(Error::Config(_))));
    }

    #[test]
    fn test_log_level_parsing() {
        let mut vars = complete_env();
        vars.insert(env::LOG_LEVEL, "debug".to_string());
        assert_eq!(load(&vars).unwrap().log_level, LogLevel::Debug);

        vars.insert(env::LOG_LEVEL, "chatty".to_string());
        assert!(matches!(load(&vars), Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_zero_concurrency() {
        let result = EngineConfig::builder()
            .storage_auth_url("https://identity.example.com")
            .storage_user_id("u")
            .storage_password("p")
            .storage_project_id("proj")
            .trainer_url("https://nlc.example.com")
            .trainer_username("u")
            .trainer_password("p")
            .scan_concurrency(0)
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_non_http_url() {
        let result = EngineConfig::builder()
            .storage_auth_url("identity.example.com")
            .storage_user_id("u")
            .storage_password("p")
            .storage_project_id("proj")
            .trainer_url("https://nlc.example.com")
            .trainer_username("u")
            .trainer_password("p")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&complete_env()).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("storage-secret"));
        assert!(!debug.contains("nlc-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("project-1"));
    }
}
