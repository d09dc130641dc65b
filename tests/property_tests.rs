//! Property-based tests for the navigation stack.
//!
//! These tests use proptest to drive the machine with random push/pop
//! sequences and check the stack against a simple model.

mod common;

use chrono::Utc;
use common::*;
use navstack::core::{Bindings, NavigationHistory, NavigationRecord, Scope, TransitionKind};
use navstack::{StateMachine, StateMachineBuilder};
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Op {
    Push,
    FailingPush,
    Pop,
}

prop_compose! {
    fn arbitrary_op()(variant in 0..3u8) -> Op {
        match variant {
            0 => Op::Push,
            1 => Op::FailingPush,
            _ => Op::Pop,
        }
    }
}

struct Outcome {
    names: Vec<String>,
    expected_depth: usize,
    live_cancelled: Vec<bool>,
    popped_cancelled: Vec<bool>,
    app_cancelled: bool,
}

fn run(ops: &[Op]) -> Outcome {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    runtime.block_on(async {
        let log = new_log();
        let tokens = new_tokens();
        let mut machine = StateMachine::new();
        let app = start(&mut machine, &log).await;

        // Indices into `tokens` of the states the model expects on the stack.
        let mut model: Vec<usize> = Vec::new();
        let mut popped: Vec<usize> = Vec::new();

        for op in ops {
            match op {
                Op::Push => {
                    top_requester(&machine).push(tracked_probe("S", &log, &tokens));
                    machine.run_pending().await.unwrap();
                    model.push(tokens.lock().unwrap().len() - 1);
                }
                Op::FailingPush => {
                    top_requester(&machine).push(unbuildable("Broken"));
                    machine.run_pending().await.unwrap();
                }
                Op::Pop => {
                    machine.pop().await.unwrap();
                    if let Some(index) = model.pop() {
                        popped.push(index);
                    }
                }
            }
        }

        let captured = tokens.lock().unwrap();
        Outcome {
            names: machine
                .state_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            expected_depth: model.len() + 1,
            live_cancelled: model.iter().map(|&i| captured[i].1.is_cancelled()).collect(),
            popped_cancelled: popped
                .iter()
                .map(|&i| captured[i].1.is_cancelled())
                .collect(),
            app_cancelled: app.is_cancelled(),
        }
    })
}

proptest! {
    #[test]
    fn root_is_never_removed(ops in prop::collection::vec(arbitrary_op(), 0..24)) {
        let outcome = run(&ops);
        prop_assert_eq!(outcome.names.first().map(String::as_str), Some("A"));
    }

    #[test]
    fn depth_matches_model(ops in prop::collection::vec(arbitrary_op(), 0..24)) {
        let outcome = run(&ops);
        prop_assert_eq!(outcome.names.len(), outcome.expected_depth);
        prop_assert!(outcome.names.iter().skip(1).all(|name| name == "S"));
    }

    #[test]
    fn popped_tokens_are_cancelled_and_live_ones_are_not(
        ops in prop::collection::vec(arbitrary_op(), 0..24)
    ) {
        let outcome = run(&ops);
        prop_assert!(outcome.popped_cancelled.iter().all(|&cancelled| cancelled));
        prop_assert!(outcome.live_cancelled.iter().all(|&cancelled| !cancelled));
        prop_assert!(!outcome.app_cancelled);
    }

    #[test]
    fn later_bindings_win(values in prop::collection::vec(any::<u32>(), 1..8)) {
        let mut bindings = Bindings::new();
        for value in &values {
            bindings.bind(*value);
        }
        let scope = Scope::root("root").with_bindings(bindings);

        prop_assert_eq!(scope.resolve::<u32>().ok(), values.last().copied());
    }

    #[test]
    fn child_scope_shadows_parent(parent in any::<u32>(), child in any::<u32>()) {
        let root = std::sync::Arc::new(Scope::root("root").with_bindings(Bindings::new().with(parent)));
        let scope = Scope::child(std::sync::Arc::clone(&root), "child", Bindings::new().with(child));

        prop_assert_eq!(scope.resolve::<u32>().ok(), Some(child));
        prop_assert_eq!(root.resolve::<u32>().ok(), Some(parent));
    }

    #[test]
    fn history_respects_limit(limit in 1..16usize, pushes in 0..40usize) {
        let mut history = NavigationHistory::limited(limit);
        for depth in 0..pushes {
            history = history.record(NavigationRecord {
                kind: TransitionKind::Push,
                from: Some(format!("S{depth}")),
                to: Some(format!("S{}", depth + 1)),
                depth: depth + 2,
                timestamp: Utc::now(),
            });
        }

        prop_assert_eq!(history.len(), pushes.min(limit));
        if pushes > 0 {
            let newest = history.records().last().map(|r| r.depth);
            prop_assert_eq!(newest, Some(pushes + 1));
        }
    }

    #[test]
    fn history_record_is_pure(from in "[A-Z][a-z]{1,8}", to in "[A-Z][a-z]{1,8}") {
        let history = NavigationHistory::new();

        let updated = history.record(NavigationRecord {
            kind: TransitionKind::Pop,
            from: Some(from),
            to: Some(to),
            depth: 1,
            timestamp: Utc::now(),
        });

        // Original history unchanged
        prop_assert_eq!(history.len(), 0);
        prop_assert_eq!(updated.len(), 1);
    }

    #[test]
    fn machine_history_never_exceeds_configured_limit(
        limit in 1..6usize,
        cycles in 0..12usize,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let len = runtime.block_on(async {
            let log = new_log();
            let mut machine = StateMachineBuilder::new()
                .history_limit(limit)
                .build()
                .unwrap();
            start(&mut machine, &log).await;
            for _ in 0..cycles {
                top_requester(&machine).push(probe("S", &log));
                machine.run_pending().await.unwrap();
                machine.pop().await.unwrap();
            }
            machine.history().len()
        });

        prop_assert_eq!(len, (cycles * 2).min(limit));
    }
}
