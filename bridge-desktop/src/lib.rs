//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `CorpusStore` using `tokio::fs`, one CSV file per training job
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileCorpusStore, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let corpus_store = FileCorpusStore::with_directory("/var/lib/os-search");
//!
//!     // Hand both to core_service::CoreDependencies
//!     Ok(())
//! }
//! ```

mod corpus_store;
mod http;

pub use corpus_store::FileCorpusStore;
pub use http::ReqwestHttpClient;
