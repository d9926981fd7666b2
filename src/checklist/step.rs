// ABOUTME: Wire-level upgrade step codes and the default step list.
// ABOUTME: Each code pairs with a stable directory name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::StepName;

/// Enumerated step identifier used in status replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeStep {
    Config,
    InitCluster,
    Seginstall,
    ShutdownClusters,
    ConvertMaster,
    StartAgents,
    ShareOids,
    ValidateStartCluster,
    ConvertPrimaries,
    ReconfigurePorts,
}

impl UpgradeStep {
    /// Every step, in the order an upgrade runs them.
    pub const ALL: [UpgradeStep; 10] = [
        UpgradeStep::Config,
        UpgradeStep::InitCluster,
        UpgradeStep::Seginstall,
        UpgradeStep::ShutdownClusters,
        UpgradeStep::ConvertMaster,
        UpgradeStep::StartAgents,
        UpgradeStep::ShareOids,
        UpgradeStep::ValidateStartCluster,
        UpgradeStep::ConvertPrimaries,
        UpgradeStep::ReconfigurePorts,
    ];

    /// Directory name of this step under the state dir.
    pub fn dir_name(&self) -> &'static str {
        match self {
            UpgradeStep::Config => "config",
            UpgradeStep::InitCluster => "init-cluster",
            UpgradeStep::Seginstall => "seginstall",
            UpgradeStep::ShutdownClusters => "shutdown-clusters",
            UpgradeStep::ConvertMaster => "convert-master",
            UpgradeStep::StartAgents => "start-agents",
            UpgradeStep::ShareOids => "share-oids",
            UpgradeStep::ValidateStartCluster => "validate-start-cluster",
            UpgradeStep::ConvertPrimaries => "convert-primaries",
            UpgradeStep::ReconfigurePorts => "reconfigure-ports",
        }
    }

    pub fn step_name(&self) -> StepName {
        StepName::new(self.dir_name()).expect("built-in step names are valid")
    }
}

impl fmt::Display for UpgradeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A step known to the checklist: its name and wire code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
    pub name: StepName,
    pub code: UpgradeStep,
}

impl StepDef {
    pub fn new(name: StepName, code: UpgradeStep) -> Self {
        Self { name, code }
    }

    /// The built-in step list, one entry per [`UpgradeStep`].
    pub fn defaults() -> Vec<StepDef> {
        UpgradeStep::ALL
            .iter()
            .map(|code| StepDef::new(code.step_name(), *code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_name_is_valid() {
        for step in UpgradeStep::ALL {
            assert_eq!(step.step_name().as_str(), step.dir_name());
        }
    }

    #[test]
    fn wire_code_is_screaming_snake_case() {
        let json = serde_json::to_string(&UpgradeStep::ValidateStartCluster).unwrap();
        assert_eq!(json, "\"VALIDATE_START_CLUSTER\"");
    }

    #[test]
    fn defaults_follow_upgrade_order() {
        let defaults = StepDef::defaults();
        assert_eq!(defaults.len(), UpgradeStep::ALL.len());
        assert_eq!(defaults[0].code, UpgradeStep::Config);
        assert_eq!(defaults[9].code, UpgradeStep::ReconfigurePorts);
    }
}
