// ABOUTME: Checklist manager owning the ordered set of known upgrade steps.
// ABOUTME: Hands out step writers and builds the operator status report.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::types::StepName;

use super::state::StepState;
use super::step::{StepDef, UpgradeStep};
use super::store::StepStore;

/// One line of the status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    pub step: UpgradeStep,
    pub status: StepState,
}

/// Ordered collection of steps for one upgrade run.
///
/// The list lives for the life of the process; only the per-step state
/// persists.
#[derive(Debug)]
pub struct ChecklistManager {
    store: Arc<StepStore>,
    steps: RwLock<Vec<StepDef>>,
}

impl ChecklistManager {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(StepStore::new(state_dir)),
            steps: RwLock::new(Vec::new()),
        }
    }

    /// Add `steps` to the checklist, keeping load order.
    ///
    /// Names already loaded are skipped, so loading the same list twice is
    /// a no-op.
    pub fn load_steps(&self, steps: &[StepDef]) {
        let mut loaded = self.steps.write();
        for step in steps {
            if !loaded.iter().any(|s| s.name == step.name) {
                loaded.push(step.clone());
            }
        }
    }

    /// Handle for mutating one step's state.
    pub fn get_step_writer(&self, name: &StepName) -> StepWriter {
        StepWriter {
            name: name.clone(),
            store: Arc::clone(&self.store),
        }
    }

    pub fn is_pending(&self, name: &StepName) -> bool {
        self.state_or_pending(name) == StepState::Pending
    }

    pub fn is_running(&self, name: &StepName) -> bool {
        self.state_or_pending(name) == StepState::Running
    }

    pub fn is_complete(&self, name: &StepName) -> bool {
        self.state_or_pending(name) == StepState::Complete
    }

    pub fn is_failed(&self, name: &StepName) -> bool {
        self.state_or_pending(name) == StepState::Failed
    }

    /// Status of every loaded step, in load order.
    pub fn status_report(&self) -> Vec<StepStatus> {
        self.steps
            .read()
            .iter()
            .map(|def| StepStatus {
                step: def.code,
                status: self.state_or_pending(&def.name),
            })
            .collect()
    }

    fn state_or_pending(&self, name: &StepName) -> StepState {
        match self.store.state(name) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Unable to read state of step {}, reporting PENDING: {}", name, e);
                StepState::Pending
            }
        }
    }
}

/// Mutation handle bound to a single step name.
#[derive(Debug, Clone)]
pub struct StepWriter {
    name: StepName,
    store: Arc<StepStore>,
}

impl StepWriter {
    pub fn mark_in_progress(&self) -> Result<()> {
        self.store.mark_running(&self.name)
    }

    pub fn mark_complete(&self) -> Result<()> {
        self.store.mark_complete(&self.name)
    }

    pub fn mark_failed(&self) -> Result<()> {
        self.store.mark_failed(&self.name)
    }

    pub fn reset(&self) -> Result<()> {
        self.store.reset(&self.name)
    }
}
