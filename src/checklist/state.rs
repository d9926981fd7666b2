// ABOUTME: Persisted state of a single upgrade step.
// ABOUTME: Serialized into the per-step status record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a step: `Pending -> Running -> Complete | Failed`.
///
/// A reset returns any state to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepState {
    #[default]
    Pending,
    Running,
    Complete,
    Failed,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::Pending => "PENDING",
            StepState::Running => "RUNNING",
            StepState::Complete => "COMPLETE",
            StepState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// On-disk record for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub state: StepState,
    pub updated_at: DateTime<Utc>,
}

impl StepRecord {
    pub fn now(state: StepState) -> Self {
        Self {
            state,
            updated_at: Utc::now(),
        }
    }
}
