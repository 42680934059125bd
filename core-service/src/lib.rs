//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, corpus
//! storage, optional image and document analysis) and a validated
//! [`EngineConfig`] into a ready [`SearchEngine`]. Desktop hosts typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`) and
//! call [`bootstrap_desktop`].
//!
//! ```text
//! EngineConfig ─┐                 ┌─> SwiftConnector (ObjectStorage)
//!               ├─> bootstrap() ──┼─> NlcConnector   (Trainer)
//! Dependencies ─┘                 ├─> TagGeneratorRegistry
//!                                 └─> SearchEngine + EventBus
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, storage::ObjectStorage, trainer::CorpusStore};
use core_index::SearchEngine;
use core_runtime::config::EngineConfig;
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::{init_logging, LoggingConfig};
use core_tagging::{
    DocumentConverter, DocumentTagGenerator, FrequencyKeywordExtractor, ImageAnalyzer,
    ImageTagGenerator, KeywordExtractor, TagGeneratorRegistry,
};
use provider_nlc::NlcConnector;
use provider_swift::SwiftConnector;
use tracing::{debug, info};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub corpus_store: Arc<dyn CorpusStore>,
    /// Enables image tagging
    pub image_analyzer: Option<Arc<dyn ImageAnalyzer>>,
    /// Enables tagging of HTML, PDF and Word documents
    pub document_converter: Option<Arc<dyn DocumentConverter>>,
    /// Enables document tagging; defaults to [`FrequencyKeywordExtractor`]
    pub keyword_extractor: Option<Arc<dyn KeywordExtractor>>,
}

impl CoreDependencies {
    /// Construct a dependency bundle with local keyword extraction and no
    /// image analysis.
    pub fn new(http_client: Arc<dyn HttpClient>, corpus_store: Arc<dyn CorpusStore>) -> Self {
        Self {
            http_client,
            corpus_store,
            image_analyzer: None,
            document_converter: None,
            keyword_extractor: Some(Arc::new(FrequencyKeywordExtractor::default())),
        }
    }

    pub fn with_image_analyzer(mut self, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        self.image_analyzer = Some(analyzer);
        self
    }

    pub fn with_document_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.document_converter = Some(converter);
        self
    }

    pub fn with_keyword_extractor(mut self, extractor: Arc<dyn KeywordExtractor>) -> Self {
        self.keyword_extractor = Some(extractor);
        self
    }

    /// Disable document tagging entirely
    pub fn without_document_tagging(mut self) -> Self {
        self.keyword_extractor = None;
        self
    }

    fn build_registry(&self, storage: &Arc<dyn ObjectStorage>) -> TagGeneratorRegistry {
        let mut registry = TagGeneratorRegistry::new();

        if let Some(analyzer) = &self.image_analyzer {
            registry.register(Arc::new(ImageTagGenerator::new(
                Arc::clone(storage),
                Arc::clone(analyzer),
            )));
        }

        if let Some(extractor) = &self.keyword_extractor {
            let mut generator = DocumentTagGenerator::new(Arc::clone(storage), Arc::clone(extractor));
            if let Some(converter) = &self.document_converter {
                generator = generator.with_converter(Arc::clone(converter));
            }
            registry.register(Arc::new(generator));
        }

        registry
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    engine: Arc<SearchEngine>,
    event_bus: EventBus,
}

impl CoreService {
    /// Shared engine handle; clone it into request handlers.
    pub fn engine(&self) -> Arc<SearchEngine> {
        Arc::clone(&self.engine)
    }

    /// Stream of scan and training events.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

/// Build the engine from configuration and explicit bridges.
///
/// ```ignore
/// let deps = CoreDependencies::new(http_client, corpus_store)
///     .with_image_analyzer(analyzer);
/// let core = bootstrap(EngineConfig::from_env()?, deps)?;
/// let summary = core.engine().scan().await?;
/// ```
///
/// # Errors
///
/// `CoreError::Config` when the configuration is incomplete, and
/// `CoreError::NoTagGenerators` when the dependencies enable no tagging.
pub fn bootstrap(config: EngineConfig, deps: CoreDependencies) -> Result<CoreService> {
    config.validate()?;

    let storage: Arc<dyn ObjectStorage> = Arc::new(SwiftConnector::new(
        Arc::clone(&deps.http_client),
        config.storage.clone(),
    ));
    let trainer = Arc::new(NlcConnector::new(
        Arc::clone(&deps.http_client),
        config.trainer.clone(),
        Arc::clone(&deps.corpus_store),
    ));

    let registry = deps.build_registry(&storage);
    if registry.is_empty() {
        return Err(CoreError::NoTagGenerators);
    }
    info!(generators = ?registry.names(), region = %config.storage.region, "Search engine ready");

    let event_bus = EventBus::default();
    let engine = SearchEngine::new(storage, trainer, registry, config.indexing)
        .with_event_bus(event_bus.clone());

    Ok(CoreService {
        engine: Arc::new(engine),
        event_bus,
    })
}

/// Install the global `tracing` subscriber at `config.log_level`.
///
/// Returns `false` when a subscriber is already installed; the existing one
/// is kept.
pub fn init_host_logging(config: &EngineConfig) -> bool {
    match init_logging(logging_config(config)) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Keeping existing log subscriber");
            false
        }
    }
}

fn logging_config(config: &EngineConfig) -> LoggingConfig {
    LoggingConfig::default().with_level(config.log_level)
}

/// Convenience bootstrapper for desktop hosts: reqwest for HTTP and a
/// file-backed corpus store under `config.corpus_dir` or the platform data
/// directory.
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: EngineConfig) -> Result<CoreService> {
    use bridge_desktop::{FileCorpusStore, ReqwestHttpClient};

    init_host_logging(&config);

    let corpus_store = match &config.corpus_dir {
        Some(dir) => FileCorpusStore::with_directory(dir),
        None => FileCorpusStore::new(),
    };
    info!(directory = ?corpus_store.directory(), "Using file corpus store");

    let deps = CoreDependencies::new(Arc::new(ReqwestHttpClient::new()?), Arc::new(corpus_store));
    bootstrap(config, deps)
}
