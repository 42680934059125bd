//! # Tag Generation
//!
//! Turns stored objects into searchable tags. The indexing engine only sees
//! the [`TagGenerator`] trait and a [`TagGeneratorRegistry`] built at startup.
//!
//! ## Generators
//!
//! - [`ImageTagGenerator`]: `image/jpeg`, `image/png` through an [`ImageAnalyzer`]
//! - [`DocumentTagGenerator`]: `text/plain` directly; HTML, PDF and Word when a
//!   [`DocumentConverter`] is configured; keywords via a [`KeywordExtractor`]
//!
//! Content types are compared on their lowercased essence, so
//! `text/plain; charset=UTF-8` matches `text/plain`.

pub mod content_type;
pub mod document;
pub mod error;
pub mod generator;
pub mod image;
pub mod keywords;

#[cfg(test)]
mod test_support;

pub use document::{DocumentConverter, DocumentTagGenerator, KeywordExtractor};
pub use error::{Result, TaggingError};
pub use generator::{GeneratedTags, ObjectInfo, TagGenerator, TagGeneratorRegistry};
pub use image::{DetectedFace, ImageAnalyzer, ImageTagGenerator};
pub use keywords::FrequencyKeywordExtractor;
