//! Flag state decisions over mixed condition sets.

use flagpole_config::{ConditionEntry, FlagSettings};
use flagpole_features::condition::{BOOLEAN, PATH_MATCHES, USER};
use flagpole_features::*;
use std::sync::Arc;

/// Every combination of (required, holds) for up to three conditions.
fn condition_sets() -> Vec<Vec<(bool, bool)>> {
    let cases = [(false, false), (false, true), (true, false), (true, true)];
    let mut sets = vec![Vec::new()];
    for len in 1..=3 {
        let mut next = Vec::new();
        for set in sets.iter().filter(|s| s.len() == len - 1) {
            for case in cases {
                let mut grown = set.clone();
                grown.push(case);
                next.push(grown);
            }
        }
        sets.extend(next);
    }
    sets
}

fn build_flag(set: &[(bool, bool)]) -> Flag {
    set.iter().fold(Flag::new("F"), |flag, &(required, holds)| {
        let condition = Condition::boolean(holds);
        flag.with_condition(if required { condition.required() } else { condition })
    })
}

#[test]
fn test_decision_table() {
    let registry = ConditionRegistry::new();
    let ctx = EvaluationContext::new();

    for set in condition_sets() {
        let enabled = build_flag(&set).check_state(&registry, &ctx);

        if set.is_empty() {
            assert!(!enabled, "no conditions must be off");
        } else if set.iter().any(|&(required, holds)| required && !holds) {
            assert!(!enabled, "failed required condition must be off: {:?}", set);
        } else if set.iter().all(|&(required, _)| !required) {
            assert_eq!(enabled, set.iter().any(|&(_, holds)| holds), "{:?}", set);
        } else {
            assert!(enabled, "all required held: {:?}", set);
        }
    }
}

#[tokio::test]
async fn test_request_conditions_through_evaluator() {
    let settings = FlagSettings::new()
        .with_condition("STAFF_ONLY", ConditionEntry::new(USER, "liberty"))
        .with_condition("STAFF_ONLY", ConditionEntry::new(PATH_MATCHES, "^/staff").required());
    let store = Arc::new(MemoryFlagStore::new());
    let flags = FlagEvaluator::new(settings, store.clone());

    let staff_page = EvaluationContext::new().with_user("liberty").with_path("/staff/x");
    let public_page = EvaluationContext::new().with_user("liberty").with_path("/public");
    let other_user = EvaluationContext::new().with_user("justice").with_path("/staff/x");
    let other_public = EvaluationContext::new().with_user("justice").with_path("/public");

    assert!(flags.is_enabled("STAFF_ONLY", &staff_page).await);
    // The required gate fails, so the matching user does not help.
    assert!(!flags.is_enabled("STAFF_ONLY", &public_page).await);
    // The required gate holds and counts as the true condition.
    assert!(flags.is_enabled("STAFF_ONLY", &other_user).await);
    assert!(!flags.is_enabled("STAFF_ONLY", &other_public).await);

    // An optional stored `True` cannot open a failed gate.
    set_boolean(store.as_ref(), "STAFF_ONLY", true).await.unwrap();
    assert!(!flags.is_enabled("STAFF_ONLY", &public_page).await);
    assert!(!flags.is_enabled("STAFF_ONLY", &other_public).await);
    assert!(flags.is_enabled("STAFF_ONLY", &other_user).await);
}

#[tokio::test]
async fn test_enable_then_disable_keeps_one_row() {
    let store = Arc::new(MemoryFlagStore::new());
    let flags = FlagEvaluator::new(FlagSettings::new(), store.clone());
    let ctx = EvaluationContext::new();

    set_boolean(store.as_ref(), "FLAG_DISABLED", true).await.unwrap();
    assert!(flags.is_enabled("FLAG_DISABLED", &ctx).await);

    set_boolean(store.as_ref(), "FLAG_DISABLED", false).await.unwrap();
    assert!(!flags.is_enabled("FLAG_DISABLED", &ctx).await);

    let rows = store.by_name("FLAG_DISABLED").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].condition, BOOLEAN);
    assert_eq!(rows[0].value, "False");
}

#[tokio::test]
async fn test_deleting_a_condition_touches_one_flag() {
    let store = Arc::new(MemoryFlagStore::new());
    store.create(NewFlagState::initial("A")).await.unwrap();
    let doomed = store.create(NewFlagState::new("A", USER, "liberty")).await.unwrap();
    store.create(NewFlagState::new("B", USER, "liberty")).await.unwrap();

    store.delete(doomed.id).await.unwrap();

    assert_eq!(store.by_name("A").await.unwrap().len(), 1);
    assert_eq!(store.by_name("B").await.unwrap().len(), 1);
}
