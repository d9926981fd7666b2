// ABOUTME: File-backed store of upgrade step state.
// ABOUTME: One directory per step holding a single status.json record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::durable::{create_private_dir, remove_if_exists, write_atomic};
use crate::error::Result;
use crate::types::StepName;

use super::state::{StepRecord, StepState};

/// Name of the structured record inside each step directory.
pub const RECORD_FILE: &str = "status.json";

/// Marker files written by earlier layouts. Read for compatibility and
/// removed on every write.
pub const LEGACY_IN_PROGRESS: &str = "in.progress";
pub const LEGACY_COMPLETED: &str = "completed";
pub const LEGACY_FAILED: &str = "failed";

const LEGACY_MARKERS: [&str; 3] = [LEGACY_IN_PROGRESS, LEGACY_COMPLETED, LEGACY_FAILED];

/// Durable per-step state rooted at a state directory.
///
/// Writes for one step must come from a single writer at a time. Distinct
/// steps live in distinct directories and never contend.
#[derive(Debug, Clone)]
pub struct StepStore {
    root: PathBuf,
}

impl StepStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn step_dir(&self, step: &StepName) -> PathBuf {
        self.root.join(step.as_str())
    }

    /// Return `step` to `Pending` by removing everything it persisted.
    pub fn reset(&self, step: &StepName) -> Result<()> {
        match fs::remove_dir_all(self.step_dir(step)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    pub fn mark_running(&self, step: &StepName) -> Result<()> {
        self.write(step, StepState::Running)
    }

    pub fn mark_complete(&self, step: &StepName) -> Result<()> {
        self.write(step, StepState::Complete)
    }

    pub fn mark_failed(&self, step: &StepName) -> Result<()> {
        self.write(step, StepState::Failed)
    }

    /// Current state of `step`.
    ///
    /// Reads the record if present, otherwise falls back to legacy markers
    /// with precedence FAILED > COMPLETE > RUNNING.
    pub fn state(&self, step: &StepName) -> Result<StepState> {
        let dir = self.step_dir(step);

        match fs::read(dir.join(RECORD_FILE)) {
            Ok(bytes) => {
                let record: StepRecord = serde_json::from_slice(&bytes)?;
                return Ok(record.state);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let failed = marker_exists(&dir, LEGACY_FAILED)?;
        let completed = marker_exists(&dir, LEGACY_COMPLETED)?;

        if failed && completed {
            tracing::warn!(
                "Step {} has both completed and failed markers; reporting FAILED",
                step
            );
        }

        if failed {
            Ok(StepState::Failed)
        } else if completed {
            Ok(StepState::Complete)
        } else if marker_exists(&dir, LEGACY_IN_PROGRESS)? {
            Ok(StepState::Running)
        } else {
            Ok(StepState::Pending)
        }
    }

    fn write(&self, step: &StepName, state: StepState) -> Result<()> {
        let dir = self.step_dir(step);
        create_private_dir(&dir)?;

        // The record wins over markers, so it goes first
        let record = serde_json::to_vec(&StepRecord::now(state))?;
        write_atomic(&dir.join(RECORD_FILE), &record)?;

        for marker in LEGACY_MARKERS {
            remove_if_exists(&dir.join(marker))?;
        }

        tracing::debug!("Step {} is now {}", step, state);
        Ok(())
    }
}

fn marker_exists(dir: &Path, marker: &str) -> Result<bool> {
    match fs::metadata(dir.join(marker)) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
