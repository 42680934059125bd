//! # Run-State Gate
//!
//! One engine runs at most one long operation at a time:
//!
//! ```text
//!            scan()                index()
//!   Idle ────────────> Scanning     Idle ────────────> Indexing
//!    ^                    │          ^                    │
//!    └────── guard drop ──┘          └────── guard drop ──┘
//! ```
//!
//! The check and the transition happen under one `std::sync::Mutex` lock with
//! no `.await` in between. The transition hands out a [`RunGuard`]; dropping
//! it returns the engine to `Idle`, whether the operation finished, failed,
//! panicked or its future was dropped.

use crate::scan::ScanResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What the engine is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Scanning,
    Indexing,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Scanning => "scanning",
            RunState::Indexing => "indexing",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the last scan and index began.
///
/// Filled in by this process, or estimated from the trainer's most recent
/// job when the process has not indexed yet. The estimate uses the job's
/// creation time for both fields; the real scan time is not stored anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub scan_started_at: Option<DateTime<Utc>>,
    pub index_started_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub(crate) struct EngineState {
    pub run_state: RunState,
    pub status: EngineStatus,
    /// Pending diff waiting for `index()`
    pub scan_result: Option<Arc<ScanResult>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            run_state: RunState::Idle,
            status: EngineStatus::default(),
            scan_result: None,
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<EngineState>>;

/// Lock the engine state, recovering from poisoning.
///
/// Every critical section only assigns fields, so a panic while holding the
/// lock cannot leave the state half-written.
pub(crate) fn lock_state(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resets the run state to `Idle` when dropped.
///
/// Must not be dropped while the state lock is held by the same thread.
#[derive(Debug)]
pub(crate) struct RunGuard {
    state: SharedState,
}

impl RunGuard {
    /// Move an idle engine into `target`. The caller holds the lock and has
    /// already checked that `locked.run_state` is `Idle`.
    pub fn enter(state: &SharedState, locked: &mut EngineState, target: RunState) -> Self {
        debug_assert_eq!(locked.run_state, RunState::Idle);
        locked.run_state = target;
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock_state(&self.state).run_state = RunState::Idle;
    }
}
