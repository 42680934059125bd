//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the indexing crates:
//! - Logging and tracing infrastructure
//! - Configuration loading and validation
//! - Event bus for scan/training notifications
//!
//! ## Overview
//!
//! Nothing in here talks to a remote service. `core-service` reads an
//! [`EngineConfig`](config::EngineConfig), initializes logging, and hands an
//! [`EventBus`](events::EventBus) to the engine.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
