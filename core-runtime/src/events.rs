//! # Event Bus System
//!
//! Typed notifications about scan and training progress, published over
//! `tokio::sync::broadcast` so hosts (chat adapters, dashboards) can react to
//! a training job finishing without polling the engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   emit    ┌──────────┐  subscribe  ┌────────────┐
//! │ SearchEngine ├──────────>│ EventBus ├────────────>│ Subscriber │
//! └──────────────┘           └──────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, TrainingEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(16);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Training(TrainingEvent::Submitted {
//!         job_id: "job-1".to_string(),
//!         rows: 12,
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Training job submitted");
//! # }
//! ```
//!
//! `emit` fails only when nobody is subscribed; publishers ignore that case.
//! Slow subscribers receive `RecvError::Lagged(n)` and may keep reading.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Scan(ScanEvent),
    Training(TrainingEvent),
}

impl CoreEvent {
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Scan(e) => e.description(),
            CoreEvent::Training(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Scan(ScanEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Training(TrainingEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Scan(ScanEvent::Completed { .. })
            | CoreEvent::Training(TrainingEvent::Completed { .. })
            | CoreEvent::Training(TrainingEvent::Submitted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Scan lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ScanEvent {
    Started,
    Completed {
        additions: usize,
        deletions: usize,
        unchanged: usize,
    },
    Failed {
        message: String,
    },
}

impl ScanEvent {
    pub fn description(&self) -> &str {
        match self {
            ScanEvent::Started => "Scan started",
            ScanEvent::Completed { .. } => "Scan completed",
            ScanEvent::Failed { .. } => "Scan failed",
        }
    }
}

/// Index and training lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TrainingEvent {
    /// Tag generation for a new corpus began
    IndexStarted,
    /// The trainer accepted the corpus and started a job
    Submitted { job_id: String, rows: usize },
    /// The job left the training state
    Completed { job_id: String, status: String },
    /// Watching the job failed
    Failed { job_id: String, message: String },
}

impl TrainingEvent {
    pub fn description(&self) -> &str {
        match self {
            TrainingEvent::IndexStarted => "Indexing started",
            TrainingEvent::Submitted { .. } => "Training job submitted",
            TrainingEvent::Completed { .. } => "Training job finished",
            TrainingEvent::Failed { .. } => "Training job monitoring failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel for [`CoreEvent`]s. Cloning shares the channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// `capacity` is the per-subscriber backlog before `Lagged` is reported.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers, returning how many received it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// New independent receiver; past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::default();
/// let training_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Training(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Next event passing the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv); `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
