// ABOUTME: Validated domain types shared by hub and agent.
// ABOUTME: Step names are checked once at construction.

mod step_name;

pub use step_name::{StepName, StepNameError};
