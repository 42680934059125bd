//! # OpenStack Swift Provider
//!
//! Implements `ObjectStorage` for OpenStack Swift object storage.
//!
//! ## Overview
//!
//! This module provides:
//! - Keystone v3 password authentication scoped to a project
//! - Endpoint discovery from the service catalog (public interface, configured region)
//! - Token caching with periodic invalidation
//! - Container and paginated object listings
//! - Object metadata via `HEAD` and streamed downloads

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{SwiftConnector, DEFAULT_TOKEN_TTL};
pub use error::{Result, SwiftError};
