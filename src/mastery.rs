//! Mastery ledger: per-student, per-concept attempt history and the
//! derived rolling mastery score.
//!
//! Scoring deliberately privileges recent performance: only the trailing
//! window of 5 attempts contributes, so the estimate reflects current
//! understanding rather than decayed early struggles. Up to 10 attempts
//! stay in storage for history display without influencing the score.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{AnalyticsConfig, ScoringConfig};
use crate::storage::{load_json, store_json, KvStore};
use crate::types::{Attempt, MasteryLevel, MasteryRecord};

pub const MASTERY_STATE_VERSION: i32 = 1;

const DAY_MS: i64 = 86_400_000;

/// Persisted per-student envelope. On version mismatch the whole envelope
/// resets to empty rather than migrating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMasteryState {
    pub version: i32,
    pub student_id: String,
    pub mastery_data: HashMap<String, MasteryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cleanup: Option<i64>,
}

impl StudentMasteryState {
    fn empty(student_id: &str) -> Self {
        Self {
            version: MASTERY_STATE_VERSION,
            student_id: student_id.to_string(),
            mastery_data: HashMap::new(),
            last_cleanup: None,
        }
    }
}

/// Result of a cleanup pass over one student's mastery data.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryCleanupOutcome {
    pub removed_attempts: usize,
    pub dropped_concepts: usize,
}

pub fn mastery_key(student_id: &str) -> String {
    format!("mastery:{student_id}")
}

/// Pure scoring function over an attempt history. Only the trailing
/// `window` attempts contribute:
///
/// - hint score   = 1 − avg(hintLevel) / maxHintLevel
/// - success rate = successes / window size
/// - time score   = 1 − min(avg(timeSpent) / targetTime, 1)
///
/// blended 0.5/0.3/0.2 and clamped to [0, 1]. Empty history scores 0.
pub fn compute_score(attempts: &[Attempt], config: &ScoringConfig) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }
    let start = attempts.len().saturating_sub(config.window);
    let recent = &attempts[start..];
    let n = recent.len() as f64;

    let avg_hint: f64 = recent.iter().map(|a| a.hint_level as f64).sum::<f64>() / n;
    let hint_score = 1.0 - avg_hint / config.max_hint_level as f64;

    let success_rate = recent.iter().filter(|a| a.success).count() as f64 / n;

    let avg_time: f64 = recent.iter().map(|a| a.time_spent as f64).sum::<f64>() / n;
    let time_score = 1.0 - (avg_time / config.target_time_ms as f64).min(1.0);

    let score = config.hint_weight * hint_score
        + config.success_weight * success_rate
        + config.time_weight * time_score;
    score.clamp(0.0, 1.0)
}

fn sanitize_attempt(mut attempt: Attempt, config: &ScoringConfig) -> Attempt {
    attempt.hint_level = attempt.hint_level.clamp(0, config.max_hint_level);
    attempt.time_spent = attempt.time_spent.max(0);
    attempt
}

/// Ledger over the backing store. All operations are synchronous; the
/// store serializes concurrent writes to the same student key.
pub struct MasteryLedger {
    store: Arc<dyn KvStore>,
    config: AnalyticsConfig,
}

impl MasteryLedger {
    pub fn new(store: Arc<dyn KvStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn load_state(&self, student_id: &str) -> StudentMasteryState {
        let key = mastery_key(student_id);
        match load_json::<StudentMasteryState>(self.store.as_ref(), &key) {
            Some(state) if state.version == MASTERY_STATE_VERSION => state,
            Some(state) => {
                tracing::warn!(
                    student_id,
                    found = state.version,
                    expected = MASTERY_STATE_VERSION,
                    "mastery state version mismatch, resetting to empty"
                );
                StudentMasteryState::empty(student_id)
            }
            None => StudentMasteryState::empty(student_id),
        }
    }

    fn save_state(&self, state: &StudentMasteryState) {
        store_json(self.store.as_ref(), &mastery_key(&state.student_id), state);
    }

    /// Appends an attempt, trims history to the retention cap, recomputes
    /// the rolling score, and persists. Malformed numeric fields are
    /// clamped, never rejected.
    pub fn record_attempt(
        &self,
        student_id: &str,
        concept_id: &str,
        concept_name: &str,
        attempt: Attempt,
    ) -> MasteryRecord {
        let attempt = sanitize_attempt(attempt, &self.config.scoring);
        let mut state = self.load_state(student_id);

        let record = state
            .mastery_data
            .entry(concept_id.to_string())
            .or_insert_with(|| MasteryRecord {
                concept_id: concept_id.to_string(),
                concept_name: concept_name.to_string(),
                attempts: Vec::new(),
                score: 0.0,
                last_updated: 0,
            });

        record.attempts.push(attempt);
        let cap = self.config.scoring.history_cap;
        if record.attempts.len() > cap {
            let excess = record.attempts.len() - cap;
            record.attempts.drain(..excess);
        }
        record.score = compute_score(&record.attempts, &self.config.scoring);
        record.last_updated = Utc::now().timestamp_millis();

        let snapshot = record.clone();
        self.save_state(&state);
        snapshot
    }

    pub fn get_record(&self, student_id: &str, concept_id: &str) -> Option<MasteryRecord> {
        self.load_state(student_id).mastery_data.remove(concept_id)
    }

    pub fn mastery_level(&self, student_id: &str, concept_id: &str) -> MasteryLevel {
        match self.get_record(student_id, concept_id) {
            Some(record) => MasteryLevel::from_score(record.score),
            None => MasteryLevel::None,
        }
    }

    /// Concepts with at least one attempt and a score below the weak
    /// threshold, weakest first. Feeds the repair-mode recommender.
    pub fn weak_concepts(&self, student_id: &str) -> Vec<MasteryRecord> {
        let mut records: Vec<MasteryRecord> = self
            .load_state(student_id)
            .mastery_data
            .into_values()
            .filter(|r| !r.attempts.is_empty() && r.score < self.config.thresholds.weak)
            .collect();
        records.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.concept_id.cmp(&b.concept_id))
        });
        records
    }

    /// Concepts at or above the strong threshold, strongest first.
    pub fn strong_concepts(&self, student_id: &str) -> Vec<MasteryRecord> {
        let mut records: Vec<MasteryRecord> = self
            .load_state(student_id)
            .mastery_data
            .into_values()
            .filter(|r| r.score >= self.config.thresholds.strong)
            .collect();
        records.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.concept_id.cmp(&b.concept_id))
        });
        records
    }

    /// Removes attempts older than the cutoff, recomputes scores for
    /// concepts with remaining attempts, and drops concept records that
    /// end up empty. Other concepts for the student are untouched.
    pub fn cleanup(&self, student_id: &str, cutoff_days: i64) -> MasteryCleanupOutcome {
        let now = Utc::now().timestamp_millis();
        let cutoff = now - cutoff_days * DAY_MS;

        let mut state = self.load_state(student_id);
        let mut outcome = MasteryCleanupOutcome::default();

        state.mastery_data.retain(|_, record| {
            let before = record.attempts.len();
            record.attempts.retain(|a| a.timestamp >= cutoff);
            let removed = before - record.attempts.len();
            outcome.removed_attempts += removed;

            if record.attempts.is_empty() {
                outcome.dropped_concepts += 1;
                return false;
            }
            if removed > 0 {
                record.score = compute_score(&record.attempts, &self.config.scoring);
            }
            true
        });

        state.last_cleanup = Some(now);
        self.save_state(&state);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const TS: i64 = 1_700_000_000_000;

    fn ledger() -> MasteryLedger {
        MasteryLedger::new(Arc::new(MemoryStore::new()), AnalyticsConfig::default())
    }

    fn attempt(hint_level: i32, time_spent: i64, success: bool) -> Attempt {
        Attempt {
            attempt_id: format!("a-{hint_level}-{time_spent}"),
            problem_id: "p1".to_string(),
            timestamp: TS,
            hint_level,
            time_spent,
            success,
        }
    }

    fn attempt_at(timestamp: i64) -> Attempt {
        Attempt {
            timestamp,
            ..attempt(0, 60_000, true)
        }
    }

    #[test]
    fn empty_history_scores_zero() {
        assert_eq!(compute_score(&[], &ScoringConfig::default()), 0.0);
        assert_eq!(MasteryLevel::from_score(0.0), MasteryLevel::None);
    }

    #[test]
    fn worked_example_blends_all_three_components() {
        // 3 clean fast successes, then 2 slow fully-hinted failures:
        // avgHint 2.0 -> hint 0.6; success 3/5 = 0.6; avgTime 96000 -> time 0.2
        // score = 0.5*0.6 + 0.3*0.6 + 0.2*0.2 = 0.52 -> medium
        let mut attempts = vec![attempt(0, 60_000, true); 3];
        attempts.extend(vec![attempt(5, 150_000, false); 2]);

        let score = compute_score(&attempts, &ScoringConfig::default());
        assert!((score - 0.52).abs() < 1e-9, "score was {score}");
        assert_eq!(MasteryLevel::from_score(score), MasteryLevel::Medium);
    }

    #[test]
    fn single_attempt_scores_on_its_own_components() {
        let score = compute_score(&[attempt(0, 0, true)], &ScoringConfig::default());
        // Perfect attempt: 0.5*1 + 0.3*1 + 0.2*1 = 1.0
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn only_last_five_attempts_influence_score() {
        let config = ScoringConfig::default();
        let window: Vec<Attempt> = vec![
            attempt(1, 30_000, true),
            attempt(2, 90_000, false),
            attempt(0, 45_000, true),
            attempt(3, 120_000, false),
            attempt(1, 60_000, true),
        ];

        let mut with_prefix = vec![attempt(5, 400_000, false); 4];
        with_prefix.extend(window.clone());

        assert_eq!(
            compute_score(&with_prefix, &config),
            compute_score(&window, &config)
        );
    }

    #[test]
    fn recording_sixth_attempt_drops_first_from_scoring() {
        let l = ledger();
        for _ in 0..5 {
            l.record_attempt("s1", "momentum", "Momentum", attempt(5, 150_000, false));
        }
        let before = l.get_record("s1", "momentum").unwrap().score;

        // Six perfect attempts push every bad one out of the window.
        let mut after = before;
        for _ in 0..6 {
            after = l
                .record_attempt("s1", "momentum", "Momentum", attempt(0, 0, true))
                .score;
        }
        assert!((after - 1.0).abs() < 1e-9, "after was {after}");
    }

    #[test]
    fn history_is_trimmed_to_retention_cap() {
        let l = ledger();
        for i in 0..15 {
            l.record_attempt("s1", "friction", "Friction", attempt_at(TS + i));
        }
        let record = l.get_record("s1", "friction").unwrap();
        assert_eq!(record.attempts.len(), 10);
        assert_eq!(record.attempts.first().unwrap().timestamp, TS + 5);
    }

    #[test]
    fn out_of_range_fields_are_clamped_not_rejected() {
        let l = ledger();
        let record = l.record_attempt("s1", "sound", "Sound", attempt(99, -500, true));
        let stored = &record.attempts[0];
        assert_eq!(stored.hint_level, 5);
        assert_eq!(stored.time_spent, 0);
        assert!(record.score >= 0.0 && record.score <= 1.0);
    }

    #[test]
    fn weak_and_strong_concepts_sort_by_score() {
        let l = ledger();
        // Weak: all hints, failures.
        l.record_attempt("s1", "magnetism", "Magnetism", attempt(5, 150_000, false));
        l.record_attempt("s1", "circuits", "Circuits", attempt(4, 150_000, false));
        // Strong: clean fast successes.
        l.record_attempt("s1", "vectors", "Vectors", attempt(0, 10_000, true));

        let weak = l.weak_concepts("s1");
        assert_eq!(weak.len(), 2);
        assert!(weak[0].score <= weak[1].score);
        assert_eq!(weak[0].concept_id, "magnetism");

        let strong = l.strong_concepts("s1");
        assert_eq!(strong.len(), 1);
        assert_eq!(strong[0].concept_id, "vectors");
    }

    #[test]
    fn cleanup_drops_stale_attempts_and_empty_records() {
        let l = ledger();
        let now = Utc::now().timestamp_millis();
        let stale = now - 120 * DAY_MS;

        l.record_attempt("s1", "momentum", "Momentum", attempt_at(stale));
        l.record_attempt("s1", "friction", "Friction", attempt_at(stale));
        l.record_attempt("s1", "friction", "Friction", attempt_at(now));

        let outcome = l.cleanup("s1", 90);
        assert_eq!(outcome.removed_attempts, 2);
        assert_eq!(outcome.dropped_concepts, 1);

        let state = l.load_state("s1");
        assert!(!state.mastery_data.contains_key("momentum"));
        assert_eq!(state.mastery_data["friction"].attempts.len(), 1);
        assert!(state.last_cleanup.is_some());
    }

    #[test]
    fn cleanup_leaves_other_students_untouched() {
        let store = Arc::new(MemoryStore::new());
        let l = MasteryLedger::new(store, AnalyticsConfig::default());
        let stale = Utc::now().timestamp_millis() - 120 * DAY_MS;

        l.record_attempt("s1", "momentum", "Momentum", attempt_at(stale));
        l.record_attempt("s2", "momentum", "Momentum", attempt_at(stale));

        l.cleanup("s1", 90);
        assert!(l.get_record("s1", "momentum").is_none());
        assert!(l.get_record("s2", "momentum").is_some());
    }

    #[test]
    fn version_mismatch_resets_to_empty() {
        let store = Arc::new(MemoryStore::new());
        let l = MasteryLedger::new(store.clone(), AnalyticsConfig::default());
        l.record_attempt("s1", "momentum", "Momentum", attempt(0, 1000, true));

        let key = mastery_key("s1");
        let raw = store.read(&key).unwrap().unwrap();
        store
            .write(&key, &raw.replace("\"version\":1", "\"version\":99"))
            .unwrap();

        let state = l.load_state("s1");
        assert!(state.mastery_data.is_empty());
        assert_eq!(state.version, MASTERY_STATE_VERSION);
    }
}
