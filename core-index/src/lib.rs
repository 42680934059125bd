//! # Incremental Indexing Engine
//!
//! Keeps a text classifier's notion of "known objects" in step with the
//! contents of an object store.
//!
//! ## Overview
//!
//! The trainer's most recent job is the only record of what was indexed
//! before. A scan diffs that record against live storage; an index run tags
//! the new objects, reuses the labels of unchanged ones and submits the
//! result as a new training job.
//!
//! ## Components
//!
//! - **Run-State Gate** (`state`): `Idle` / `Scanning` / `Indexing`, reset by an RAII guard
//! - **Job Selection** (`selection`): the shared "most recent usable job" rule
//! - **Scan / Diff** (`scan`): added, deleted and unchanged paths
//! - **Corpus Assembly** (`corpus`): bounded tag-generation fan-out
//! - **Summaries** (`summary`): structured results and limitation reasons
//! - **Search Engine** (`engine`): the public entry point

pub mod corpus;
pub mod engine;
pub mod error;
pub mod scan;
pub mod selection;
pub mod state;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use corpus::CorpusReport;
pub use engine::{CompletionCallback, SearchEngine};
pub use error::{IndexError, Result};
pub use scan::ScanResult;
pub use state::{EngineStatus, RunState};
pub use summary::{
    ClassMatch, ClassifyResult, ClassifySummary, IndexSummary, LimitReason, ScanSummary,
};
