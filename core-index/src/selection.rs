//! Choosing which trainer job represents "what was last indexed".
//!
//! Scan and status reconstruction share this rule so they always agree on
//! the reference job.

use bridge_traits::trainer::{JobStatus, TrainingJob};

/// Most recently created job that is `Training` or `Available`.
///
/// Jobs in any other status are ignored. On equal creation times the job
/// listed last wins.
pub fn most_recent_usable(jobs: &[TrainingJob]) -> Option<&TrainingJob> {
    jobs.iter()
        .filter(|job| job.status.is_usable())
        .max_by_key(|job| job.created)
}

/// A job the trainer is still training, if any
pub fn training_in_progress(jobs: &[TrainingJob]) -> Option<&TrainingJob> {
    jobs.iter().find(|job| job.status == JobStatus::Training)
}
