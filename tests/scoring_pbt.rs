//! Property-Based Tests for the scoring and resolution layer
//!
//! Tests the following invariants:
//! - Score bounds: compute_score always lands in [0, 1]
//! - Window invariance: attempts older than the scoring window never move the score
//! - Ledger consistency: the stored score always matches the stored history
//! - Resolver totality: arbitrary free text never panics and only maps to known concepts
//! - Serialization consistency: JSON round-trip for persisted mastery state

use proptest::prelude::*;

use tutor_analytics::config::{AnalyticsConfig, MistakeConfig, ScoringConfig};
use tutor_analytics::graph::seed::{keyword_table, physics_graph};
use tutor_analytics::mastery::{compute_score, MasteryLedger, StudentMasteryState};
use tutor_analytics::mistakes::classify_trend;
use tutor_analytics::resolver::ConceptResolver;
use tutor_analytics::storage::MemoryStore;
use tutor_analytics::types::{Attempt, MistakeEvent};

use std::sync::Arc;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_attempt() -> impl Strategy<Value = Attempt> {
    (
        (0i32..=5i32),          // hint_level
        (0i64..=10_000_000i64), // time_spent
        any::<bool>(),          // success
        (0i64..=i64::MAX / 2),  // timestamp
    )
        .prop_map(|(hint_level, time_spent, success, timestamp)| Attempt {
            attempt_id: format!("a-{timestamp}"),
            problem_id: "p-1".to_string(),
            timestamp,
            hint_level,
            time_spent,
            success,
        })
}

fn arb_history() -> impl Strategy<Value = Vec<Attempt>> {
    prop::collection::vec(arb_attempt(), 0..20)
}

fn arb_mistake_event() -> impl Strategy<Value = MistakeEvent> {
    (
        (0i32..=5i32),         // max_hint_level_used
        (0i64..=600_000i64),   // time_spent
        (0i64..=i64::MAX / 2), // timestamp
        proptest::option::of("[a-z ]{1,80}"),
    )
        .prop_map(
            |(max_hint_level_used, time_spent, timestamp, common_mistake)| MistakeEvent {
                concept_id: "momentum".to_string(),
                concept_name: "Momentum".to_string(),
                problem_type: "collision".to_string(),
                struggled_steps: vec![],
                max_hint_level_used,
                time_spent,
                timestamp,
                common_mistake,
            },
        )
}

fn resolver() -> ConceptResolver {
    let graph = physics_graph().unwrap();
    ConceptResolver::new(&graph, keyword_table())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// PBT-1: compute_score stays in [0, 1] for any sanitized history
    #[test]
    fn score_is_bounded(history in arb_history()) {
        let score = compute_score(&history, &ScoringConfig::default());
        prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
    }

    /// PBT-2: attempts that fall outside the scoring window never change the score
    #[test]
    fn old_attempts_are_inert(history in arb_history()) {
        let config = ScoringConfig::default();
        if history.len() < config.window {
            return Ok(());
        }
        let tail = &history[history.len() - config.window..];
        let full = compute_score(&history, &config);
        let windowed = compute_score(tail, &config);
        prop_assert!((full - windowed).abs() < 1e-12);
    }

    /// PBT-3: the ledger's stored score always matches its stored history
    #[test]
    fn ledger_score_matches_history(history in arb_history()) {
        let config = AnalyticsConfig::default();
        let ledger = MasteryLedger::new(Arc::new(MemoryStore::new()), config.clone());

        let mut last = None;
        for attempt in history {
            last = Some(ledger.record_attempt("s1", "momentum", "Momentum", attempt));
        }
        if let Some(record) = last {
            prop_assert!(record.attempts.len() <= config.scoring.history_cap);
            let expected = compute_score(&record.attempts, &config.scoring);
            prop_assert!((record.score - expected).abs() < 1e-12);
        }
    }

    /// PBT-4: the resolver is total over arbitrary input and only returns known ids
    #[test]
    fn resolver_never_panics(mention in "\\PC{0,120}") {
        let graph = physics_graph().unwrap();
        let resolver = ConceptResolver::new(&graph, keyword_table());
        if let Some(id) = resolver.resolve(&mention) {
            prop_assert!(graph.contains(&id), "resolved to unknown concept {}", id);
        }
    }

    /// PBT-5: resolution is deterministic
    #[test]
    fn resolver_is_deterministic(mention in "[a-zA-Z '!,]{0,60}") {
        let resolver = resolver();
        prop_assert_eq!(resolver.resolve(&mention), resolver.resolve(&mention));
    }

    /// PBT-6: trend classification is total over arbitrary event histories
    #[test]
    fn trend_is_total(events in prop::collection::vec(arb_mistake_event(), 0..12)) {
        // Just has to return without panicking for any input shape.
        let _ = classify_trend(&events, &MistakeConfig::default());
    }

    /// PBT-7: persisted mastery state JSON round-trips
    #[test]
    fn mastery_state_json_roundtrip(history in arb_history()) {
        let config = AnalyticsConfig::default();
        let ledger = MasteryLedger::new(Arc::new(MemoryStore::new()), config);
        for attempt in history {
            ledger.record_attempt("s1", "friction", "Friction", attempt);
        }

        let state = ledger.load_state("s1");
        let json = serde_json::to_string(&state).unwrap();
        let restored: StudentMasteryState = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(&state.student_id, &restored.student_id);
        prop_assert_eq!(state.version, restored.version);
        prop_assert_eq!(state.mastery_data.len(), restored.mastery_data.len());
        for (id, record) in &state.mastery_data {
            let rest = restored.mastery_data.get(id).unwrap();
            prop_assert_eq!(record.attempts.len(), rest.attempts.len());
            prop_assert!((record.score - rest.score).abs() < 1e-12);
            prop_assert_eq!(record.last_updated, rest.last_updated);
        }
    }
}

// ============================================================================
// Additional Unit Tests for Edge Cases
// ============================================================================

#[test]
fn perfect_window_scores_one() {
    let config = ScoringConfig::default();
    let attempts: Vec<Attempt> = (0..config.window)
        .map(|i| Attempt {
            attempt_id: format!("a-{i}"),
            problem_id: "p-1".to_string(),
            timestamp: i as i64,
            hint_level: 0,
            time_spent: 0,
            success: true,
        })
        .collect();
    assert!((compute_score(&attempts, &config) - 1.0).abs() < 1e-12);
}

#[test]
fn worst_window_scores_zero() {
    let config = ScoringConfig::default();
    let attempts: Vec<Attempt> = (0..config.window)
        .map(|i| Attempt {
            attempt_id: format!("a-{i}"),
            problem_id: "p-1".to_string(),
            timestamp: i as i64,
            hint_level: config.max_hint_level,
            time_spent: config.target_time_ms,
            success: false,
        })
        .collect();
    assert!(compute_score(&attempts, &config).abs() < 1e-12);
}

#[test]
fn empty_history_scores_zero() {
    assert_eq!(compute_score(&[], &ScoringConfig::default()), 0.0);
}
