//! # Host Bridge Traits
//!
//! Abstraction traits between the indexing core and the outside world.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the concrete
//! connectors and host adapters. The core never talks to a network service or
//! the filesystem directly; it receives trait objects built by `core-service`.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with auth helpers and retry
//!
//! ### Remote Services
//! - [`ObjectStorage`](storage::ObjectStorage) - Container/object listing, metadata, downloads
//! - [`Trainer`](trainer::Trainer) - Classifier training jobs and classification
//! - [`CorpusStore`](trainer::CorpusStore) - Durable copy of submitted training data
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Implementations
//!
//! | Trait | Implementation Crate |
//! |-------|---------------------|
//! | `HttpClient`, `CorpusStore` | `bridge-desktop` |
//! | `ObjectStorage` | `provider-swift` |
//! | `Trainer` | `provider-nlc` |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Connectors
//! convert their own error enums into it so the core sees one error surface.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds; the engine shares them
//! across spawned tasks behind `Arc`.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;
pub mod trainer;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{ContainerRef, ObjectEntry, ObjectMetadata, ObjectRef, ObjectStorage};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
pub use trainer::{
    ClassScore, ClassifyResponse, CorpusLabels, CorpusRow, CorpusStore, JobStatus, Trainer,
    TrainingCorpus, TrainingJob,
};
