//! Mistake pattern tracker.
//!
//! Accumulates structured mistake events per concept and turns them into
//! actionable signals: struggle statistics, recurring free-text patterns,
//! a trend classification, and warnings for the concepts a student is
//! currently working on. A single struggling attempt never triggers a
//! warning; the 2-attempt minimum avoids false positives on first-time
//! difficulty.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{AnalyticsConfig, MistakeConfig};
use crate::storage::{load_json, store_json, KvStore};
use crate::types::{MistakeEvent, MistakeTrend, Warning, WarningSeverity};

pub const MISTAKE_STATE_VERSION: i32 = 1;

const DAY_MS: i64 = 86_400_000;

/// Persisted per-student envelope; same version-reset contract as the
/// mastery envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMistakeState {
    pub version: i32,
    pub student_id: String,
    pub mistake_patterns: HashMap<String, Vec<MistakeEvent>>,
}

impl StudentMistakeState {
    fn empty(student_id: &str) -> Self {
        Self {
            version: MISTAKE_STATE_VERSION,
            student_id: student_id.to_string(),
            mistake_patterns: HashMap::new(),
        }
    }
}

/// A recurring free-text mistake, grouped by its leading characters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternCount {
    pub pattern: String,
    pub count: usize,
}

/// Aggregated mistake statistics for one concept.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMistakeStats {
    pub concept_id: String,
    pub concept_name: String,
    pub total_attempts: usize,
    pub struggled_attempts: usize,
    pub average_hint_level: f64,
    pub common_patterns: Vec<PatternCount>,
    pub last_seen: i64,
    pub trend: MistakeTrend,
}

/// Result of a cleanup pass over one student's mistake data.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeCleanupOutcome {
    pub removed_events: usize,
    pub dropped_concepts: usize,
}

pub fn mistake_key(student_id: &str) -> String {
    format!("mistakes:{student_id}")
}

/// Classifies the direction of a concept's mistakes by comparing struggle
/// density between the older and newer half of the event timeline. Fewer
/// than 4 events is too little signal and classifies as `Persistent`.
pub fn classify_trend(events: &[MistakeEvent], config: &MistakeConfig) -> MistakeTrend {
    if events.len() < 4 {
        return MistakeTrend::Persistent;
    }

    let mut ordered: Vec<&MistakeEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);

    let mid = ordered.len() / 2;
    let density = |half: &[&MistakeEvent]| {
        let struggled = half
            .iter()
            .filter(|e| e.max_hint_level_used >= config.struggle_hint_level)
            .count();
        struggled as f64 / half.len() as f64
    };

    let change = density(&ordered[mid..]) - density(&ordered[..mid]);
    if change <= -0.1 {
        MistakeTrend::Improving
    } else if change >= 0.1 {
        MistakeTrend::Worsening
    } else {
        MistakeTrend::Persistent
    }
}

/// Tracker over the backing store, keyed per student.
pub struct MistakeTracker {
    store: Arc<dyn KvStore>,
    config: AnalyticsConfig,
}

impl MistakeTracker {
    pub fn new(store: Arc<dyn KvStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn load_state(&self, student_id: &str) -> StudentMistakeState {
        let key = mistake_key(student_id);
        match load_json::<StudentMistakeState>(self.store.as_ref(), &key) {
            Some(state) if state.version == MISTAKE_STATE_VERSION => state,
            Some(state) => {
                tracing::warn!(
                    student_id,
                    found = state.version,
                    expected = MISTAKE_STATE_VERSION,
                    "mistake state version mismatch, resetting to empty"
                );
                StudentMistakeState::empty(student_id)
            }
            None => StudentMistakeState::empty(student_id),
        }
    }

    fn save_state(&self, state: &StudentMistakeState) {
        store_json(self.store.as_ref(), &mistake_key(&state.student_id), state);
    }

    /// Appends an event to its concept's history, keeping only the most
    /// recent entries by timestamp. Events may arrive out of order from
    /// the upstream detection flow.
    pub fn record_pattern(&self, student_id: &str, event: MistakeEvent) {
        let mut state = self.load_state(student_id);
        let events = state
            .mistake_patterns
            .entry(event.concept_id.clone())
            .or_default();

        events.push(event);
        events.sort_by_key(|e| e.timestamp);
        let cap = self.config.mistakes.history_cap;
        if events.len() > cap {
            let excess = events.len() - cap;
            events.drain(..excess);
        }
        self.save_state(&state);
    }

    /// Aggregated stats for one concept, or `None` when no events exist.
    pub fn concept_stats(
        &self,
        student_id: &str,
        concept_id: &str,
        concept_name: &str,
    ) -> Option<ConceptMistakeStats> {
        let state = self.load_state(student_id);
        let events = state.mistake_patterns.get(concept_id)?;
        if events.is_empty() {
            return None;
        }
        Some(self.stats_from_events(concept_id, concept_name, events))
    }

    fn stats_from_events(
        &self,
        concept_id: &str,
        concept_name: &str,
        events: &[MistakeEvent],
    ) -> ConceptMistakeStats {
        let config = &self.config.mistakes;
        let total = events.len();
        let struggled = events
            .iter()
            .filter(|e| e.max_hint_level_used >= config.struggle_hint_level)
            .count();
        let average_hint_level =
            events.iter().map(|e| e.max_hint_level_used as f64).sum::<f64>() / total as f64;
        let last_seen = events.iter().map(|e| e.timestamp).max().unwrap_or(0);

        ConceptMistakeStats {
            concept_id: concept_id.to_string(),
            concept_name: concept_name.to_string(),
            total_attempts: total,
            struggled_attempts: struggled,
            average_hint_level,
            common_patterns: common_patterns(events, config),
            last_seen,
            trend: classify_trend(events, config),
        }
    }

    /// Emits warnings for the concepts in the student's current working
    /// set. A warning fires only when the struggle rate exceeds the
    /// configured rate over at least the minimum number of events.
    pub fn generate_warnings(
        &self,
        student_id: &str,
        current_concepts: &[String],
        problem_type: &str,
    ) -> Vec<Warning> {
        let state = self.load_state(student_id);
        let config = &self.config.mistakes;
        let now = Utc::now().timestamp_millis();
        let mut warnings = Vec::new();

        for concept_id in current_concepts {
            let Some(events) = state.mistake_patterns.get(concept_id) else {
                continue;
            };
            if events.is_empty() {
                continue;
            }
            let concept_name = events
                .last()
                .map(|e| e.concept_name.clone())
                .unwrap_or_else(|| concept_id.clone());
            let stats = self.stats_from_events(concept_id, &concept_name, events);

            if stats.total_attempts < config.min_attempts {
                continue;
            }
            let rate = stats.struggled_attempts as f64 / stats.total_attempts as f64;
            if rate <= config.warn_rate {
                continue;
            }

            let severity = if rate >= config.high_rate {
                WarningSeverity::High
            } else if rate > config.medium_rate {
                WarningSeverity::Medium
            } else {
                WarningSeverity::Low
            };

            let mut suggestions = Vec::new();
            if stats.average_hint_level >= config.struggle_hint_level as f64 {
                suggestions.push(format!(
                    "Review the definitions behind {concept_name} and sketch the setup before solving"
                ));
            }
            if let Some(top) = stats.common_patterns.first() {
                suggestions.push(format!("Watch for a recurring mistake: {}", top.pattern));
            }
            if now - stats.last_seen <= config.recency_days * DAY_MS {
                suggestions.push(format!(
                    "You struggled with {concept_name} recently; take the first step slowly"
                ));
            }

            warnings.push(Warning {
                message: format!(
                    "You have struggled with {concept_name} in {:.0}% of recent {problem_type} problems",
                    rate * 100.0
                ),
                severity,
                related_concepts: vec![concept_id.clone()],
                suggestions,
            });
        }

        warnings
    }

    /// Removes events older than the cutoff and drops concepts left empty.
    pub fn cleanup(&self, student_id: &str, cutoff_days: i64) -> MistakeCleanupOutcome {
        let cutoff = Utc::now().timestamp_millis() - cutoff_days * DAY_MS;
        let mut state = self.load_state(student_id);
        let mut outcome = MistakeCleanupOutcome::default();

        state.mistake_patterns.retain(|_, events| {
            let before = events.len();
            events.retain(|e| e.timestamp >= cutoff);
            outcome.removed_events += before - events.len();
            if events.is_empty() {
                outcome.dropped_concepts += 1;
                false
            } else {
                true
            }
        });

        self.save_state(&state);
        outcome
    }
}

/// Groups free-text mistakes by their leading characters, keeps groups
/// seen at least twice, and reports the most frequent few.
fn common_patterns(events: &[MistakeEvent], config: &MistakeConfig) -> Vec<PatternCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for event in events {
        let Some(text) = event.common_mistake.as_deref() else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let key: String = text.chars().take(config.pattern_prefix_len).collect();
        *counts.entry(key).or_default() += 1;
    }

    let mut patterns: Vec<PatternCount> = counts
        .into_iter()
        .filter(|(_, count)| *count >= config.pattern_min_count)
        .map(|(pattern, count)| PatternCount { pattern, count })
        .collect();
    patterns.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.pattern.cmp(&b.pattern)));
    patterns.truncate(config.pattern_top);
    patterns
}
