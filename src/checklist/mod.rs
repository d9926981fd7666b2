// ABOUTME: Durable upgrade step tracking.
// ABOUTME: Exports the step store, checklist manager, and step state types.

mod manager;
mod state;
mod step;
pub mod store;

pub use manager::{ChecklistManager, StepStatus, StepWriter};
pub use state::{StepRecord, StepState};
pub use step::{StepDef, UpgradeStep};
pub use store::StepStore;
