//! # Natural Language Classifier Provider
//!
//! Implements `Trainer` for a natural-language-classifier REST service.
//!
//! ## Overview
//!
//! This module provides:
//! - Basic-auth access to the classifier API
//! - Classifier listing scoped to the configured classifier name
//! - Multipart training submission and polling until training ends
//! - Classification against the newest available classifier
//! - A `CorpusStore` copy of each submission, since the service never returns
//!   training data

pub mod connector;
pub mod corpus_store;
pub mod error;
pub mod types;

pub use connector::NlcConnector;
pub use corpus_store::InMemoryCorpusStore;
pub use error::{NlcError, Result};
