// ABOUTME: Integration tests for the step store and checklist manager.
// ABOUTME: Tests state transitions, persistence, and status report order.

use clusterup::checklist::store::{LEGACY_FAILED, RECORD_FILE};
use clusterup::checklist::*;
use clusterup::types::StepName;
use proptest::prelude::*;
use tempfile::TempDir;

fn name(s: &str) -> StepName {
    StepName::new(s).unwrap()
}

mod transitions {
    use super::*;

    #[test]
    fn reset_yields_pending() {
        let tmp = TempDir::new().unwrap();
        let store = StepStore::new(tmp.path());
        let step = name("config");

        store.mark_running(&step).unwrap();
        store.mark_complete(&step).unwrap();
        store.reset(&step).unwrap();

        assert_eq!(store.state(&step).unwrap(), StepState::Pending);
        assert!(!store.step_dir(&step).exists());
    }

    #[test]
    fn running_then_complete() {
        let tmp = TempDir::new().unwrap();
        let store = StepStore::new(tmp.path());
        let step = name("init-cluster");

        store.mark_running(&step).unwrap();
        assert_eq!(store.state(&step).unwrap(), StepState::Running);
        store.mark_complete(&step).unwrap();
        assert_eq!(store.state(&step).unwrap(), StepState::Complete);
    }

    #[test]
    fn running_then_failed() {
        let tmp = TempDir::new().unwrap();
        let store = StepStore::new(tmp.path());
        let step = name("init-cluster");

        store.mark_running(&step).unwrap();
        store.mark_failed(&step).unwrap();
        assert_eq!(store.state(&step).unwrap(), StepState::Failed);
    }

    #[test]
    fn complete_after_failed_leaves_no_failure_behind() {
        let tmp = TempDir::new().unwrap();
        let store = StepStore::new(tmp.path());
        let step = name("seginstall");

        store.mark_running(&step).unwrap();
        store.mark_failed(&step).unwrap();
        store.mark_running(&step).unwrap();
        store.mark_complete(&step).unwrap();

        assert_eq!(store.state(&step).unwrap(), StepState::Complete);
        assert!(!store.step_dir(&step).join(LEGACY_FAILED).exists());
    }

    #[test]
    fn record_is_the_only_file_in_the_step_dir() {
        let tmp = TempDir::new().unwrap();
        let store = StepStore::new(tmp.path());
        let step = name("config");

        store.mark_running(&step).unwrap();
        store.mark_complete(&step).unwrap();

        let entries: Vec<String> = std::fs::read_dir(store.step_dir(&step))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![RECORD_FILE.to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn step_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = StepStore::new(tmp.path());
        let step = name("config");
        store.mark_running(&step).unwrap();

        let mode = std::fs::metadata(store.step_dir(&step)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}

mod manager {
    use super::*;

    fn three_steps() -> Vec<StepDef> {
        vec![
            StepDef::new(name("config"), UpgradeStep::Config),
            StepDef::new(name("init-cluster"), UpgradeStep::InitCluster),
            StepDef::new(name("seginstall"), UpgradeStep::Seginstall),
        ]
    }

    #[test]
    fn status_report_scenario() {
        let tmp = TempDir::new().unwrap();
        let manager = ChecklistManager::new(tmp.path());
        manager.load_steps(&three_steps());

        let config = manager.get_step_writer(&name("config"));
        config.mark_in_progress().unwrap();
        config.mark_complete().unwrap();

        let init = manager.get_step_writer(&name("init-cluster"));
        init.mark_in_progress().unwrap();
        init.mark_failed().unwrap();

        assert_eq!(
            manager.status_report(),
            vec![
                StepStatus {
                    step: UpgradeStep::Config,
                    status: StepState::Complete
                },
                StepStatus {
                    step: UpgradeStep::InitCluster,
                    status: StepState::Failed
                },
                StepStatus {
                    step: UpgradeStep::Seginstall,
                    status: StepState::Pending
                },
            ]
        );
    }

    #[test]
    fn report_follows_load_order_not_write_order() {
        let tmp = TempDir::new().unwrap();
        let manager = ChecklistManager::new(tmp.path());
        let mut steps = three_steps();
        steps.reverse();
        manager.load_steps(&steps);

        manager.get_step_writer(&name("config")).mark_complete().unwrap();
        manager.get_step_writer(&name("seginstall")).mark_in_progress().unwrap();

        let codes: Vec<UpgradeStep> = manager.status_report().iter().map(|s| s.step).collect();
        assert_eq!(
            codes,
            vec![UpgradeStep::Seginstall, UpgradeStep::InitCluster, UpgradeStep::Config]
        );
    }

    #[test]
    fn loading_twice_keeps_one_entry_per_step() {
        let tmp = TempDir::new().unwrap();
        let manager = ChecklistManager::new(tmp.path());
        manager.load_steps(&three_steps());
        manager.load_steps(&three_steps());

        assert_eq!(manager.status_report().len(), 3);
    }

    #[test]
    fn predicates_match_state() {
        let tmp = TempDir::new().unwrap();
        let manager = ChecklistManager::new(tmp.path());
        let step = name("config");

        assert!(manager.is_pending(&step));
        manager.get_step_writer(&step).mark_in_progress().unwrap();
        assert!(manager.is_running(&step));
        manager.get_step_writer(&step).mark_failed().unwrap();
        assert!(manager.is_failed(&step));
        manager.get_step_writer(&step).mark_complete().unwrap();
        assert!(manager.is_complete(&step));
    }

    #[test]
    fn writer_reset_returns_the_step_to_pending() {
        let tmp = TempDir::new().unwrap();
        let manager = ChecklistManager::new(tmp.path());
        let writer = manager.get_step_writer(&name("init-cluster"));

        writer.mark_in_progress().unwrap();
        writer.mark_failed().unwrap();
        writer.reset().unwrap();

        assert!(manager.is_pending(&name("init-cluster")));
    }

    #[test]
    fn corrupt_record_reports_pending() {
        let tmp = TempDir::new().unwrap();
        let manager = ChecklistManager::new(tmp.path());
        manager.load_steps(&three_steps());

        let dir = tmp.path().join("config");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(RECORD_FILE), b"not json").unwrap();

        assert!(manager.is_pending(&name("config")));
        assert_eq!(manager.status_report()[0].status, StepState::Pending);
    }

    #[test]
    fn state_survives_a_new_manager() {
        let tmp = TempDir::new().unwrap();
        {
            let manager = ChecklistManager::new(tmp.path());
            manager.get_step_writer(&name("config")).mark_complete().unwrap();
        }

        let manager = ChecklistManager::new(tmp.path());
        manager.load_steps(&StepDef::defaults());
        assert!(manager.is_complete(&name("config")));
        assert_eq!(manager.status_report().len(), UpgradeStep::ALL.len());
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Running,
    Complete,
    Failed,
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Running),
        Just(Op::Complete),
        Just(Op::Failed),
        Just(Op::Reset),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn state_reflects_last_write(ops in prop::collection::vec(op(), 1..12)) {
        let tmp = TempDir::new().unwrap();
        let store = StepStore::new(tmp.path());
        let step = name("convert-master");

        for op in &ops {
            match op {
                Op::Running => store.mark_running(&step).unwrap(),
                Op::Complete => store.mark_complete(&step).unwrap(),
                Op::Failed => store.mark_failed(&step).unwrap(),
                Op::Reset => store.reset(&step).unwrap(),
            }
        }

        let expected = match ops.last() {
            Some(Op::Running) => StepState::Running,
            Some(Op::Complete) => StepState::Complete,
            Some(Op::Failed) => StepState::Failed,
            Some(Op::Reset) | None => StepState::Pending,
        };
        prop_assert_eq!(store.state(&step).unwrap(), expected);
    }
}
