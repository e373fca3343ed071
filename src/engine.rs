//! Analytics engine facade.
//!
//! Owns the graph, resolver, ledger and tracker and wires them together
//! the way the attempt-processing flow uses them: free-text concept
//! mentions are resolved to canonical ids, resolved attempts land in the
//! ledger, structured mistake events land in the tracker. Also hosts the
//! cleanup sweep, guarded so a second invocation while one runs is a
//! no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::config::AnalyticsConfig;
use crate::graph::{seed, GraphError, KnowledgeGraph};
use crate::mastery::{MasteryCleanupOutcome, MasteryLedger};
use crate::mistakes::{MistakeCleanupOutcome, MistakeTracker};
use crate::resolver::{ConceptKeywords, ConceptResolver};
use crate::snapshot::{self, MasterySnapshot};
use crate::storage::KvStore;
use crate::types::{Attempt, MasteryRecord, MistakeEvent, Warning};

/// Per-attempt metrics reported by the external reasoning service.
#[derive(Debug, Clone)]
pub struct AttemptMetrics {
    pub problem_id: String,
    pub hint_level: i32,
    pub time_spent_ms: i64,
    pub success: bool,
    /// Defaults to now when absent.
    pub timestamp: Option<i64>,
}

/// Outcome of processing one reported attempt. An unresolved mention is a
/// normal outcome, not an error.
#[derive(Debug, Clone)]
pub struct ProcessedAttempt {
    pub concept_id: Option<String>,
    pub record: Option<MasteryRecord>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupOutcome {
    pub removed_attempts: usize,
    pub removed_events: usize,
    pub dropped_concepts: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepStats {
    pub students: usize,
    pub removed_attempts: usize,
    pub removed_events: usize,
    pub dropped_concepts: usize,
}

pub struct AnalyticsEngine {
    graph: KnowledgeGraph,
    resolver: ConceptResolver,
    ledger: MasteryLedger,
    tracker: MistakeTracker,
    config: AnalyticsConfig,
    cleanup_running: AtomicBool,
}

impl AnalyticsEngine {
    pub fn new(
        graph: KnowledgeGraph,
        keyword_table: Vec<ConceptKeywords>,
        store: Arc<dyn KvStore>,
        config: AnalyticsConfig,
    ) -> Self {
        let resolver = ConceptResolver::new(&graph, keyword_table);
        let ledger = MasteryLedger::new(Arc::clone(&store), config.clone());
        let tracker = MistakeTracker::new(store, config.clone());
        Self {
            graph,
            resolver,
            ledger,
            tracker,
            config,
            cleanup_running: AtomicBool::new(false),
        }
    }

    /// Engine over the built-in physics concept bank and keyword table.
    pub fn with_default_graph(
        store: Arc<dyn KvStore>,
        config: AnalyticsConfig,
    ) -> Result<Self, GraphError> {
        let graph = seed::physics_graph()?;
        Ok(Self::new(graph, seed::keyword_table(), store, config))
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn resolver(&self) -> &ConceptResolver {
        &self.resolver
    }

    pub fn ledger(&self) -> &MasteryLedger {
        &self.ledger
    }

    pub fn tracker(&self) -> &MistakeTracker {
        &self.tracker
    }

    /// Resolves a free-text concept mention and, when it maps to a graph
    /// node, records the attempt against that concept.
    pub fn process_attempt(
        &self,
        student_id: &str,
        concept_mention: &str,
        metrics: AttemptMetrics,
    ) -> ProcessedAttempt {
        let Some(concept_id) = self.resolver.resolve(concept_mention) else {
            tracing::debug!(student_id, mention = concept_mention, "concept mention unresolved");
            return ProcessedAttempt {
                concept_id: None,
                record: None,
            };
        };

        // Resolution only returns ids present in the graph.
        let concept_name = self
            .graph
            .node(&concept_id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| concept_id.clone());

        let attempt = Attempt {
            attempt_id: Uuid::new_v4().to_string(),
            problem_id: metrics.problem_id,
            timestamp: metrics.timestamp.unwrap_or_else(|| Utc::now().timestamp_millis()),
            hint_level: metrics.hint_level,
            time_spent: metrics.time_spent_ms,
            success: metrics.success,
        };

        let record = self
            .ledger
            .record_attempt(student_id, &concept_id, &concept_name, attempt);
        tracing::debug!(
            student_id,
            concept_id = %concept_id,
            score = record.score,
            "attempt recorded"
        );

        ProcessedAttempt {
            concept_id: Some(concept_id),
            record: Some(record),
        }
    }

    /// Records a structured mistake event; the concept id was resolved
    /// upstream in the same attempt-processing call.
    pub fn process_mistake(&self, student_id: &str, event: MistakeEvent) {
        self.tracker.record_pattern(student_id, event);
    }

    pub fn warnings(
        &self,
        student_id: &str,
        current_concepts: &[String],
        problem_type: &str,
    ) -> Vec<Warning> {
        self.tracker
            .generate_warnings(student_id, current_concepts, problem_type)
    }

    pub fn weak_concepts(&self, student_id: &str) -> Vec<MasteryRecord> {
        self.ledger.weak_concepts(student_id)
    }

    pub fn strong_concepts(&self, student_id: &str) -> Vec<MasteryRecord> {
        self.ledger.strong_concepts(student_id)
    }

    pub fn mastery_map(&self, student_id: &str) -> MasterySnapshot {
        snapshot::mastery_map(&self.graph, &self.ledger, student_id)
    }

    /// Cleanup pass for one student: removes attempts and mistake events
    /// older than the configured cutoff.
    pub fn cleanup_student(&self, student_id: &str) -> CleanupOutcome {
        let days = self.config.cleanup.cutoff_days;
        let mastery = self.ledger.cleanup(student_id, days);
        let mistakes = self.tracker.cleanup(student_id, days);
        merge_outcomes(mastery, mistakes)
    }

    /// Batch cleanup over a set of students. The sweep is never concurrent
    /// with itself: a second call while one runs returns `None` without
    /// touching any data.
    pub fn cleanup_sweep(&self, student_ids: &[String]) -> Option<SweepStats> {
        if self.cleanup_running.swap(true, Ordering::SeqCst) {
            tracing::debug!("cleanup sweep already running, skipping");
            return None;
        }

        let mut stats = SweepStats {
            students: student_ids.len(),
            ..SweepStats::default()
        };
        for student_id in student_ids {
            let outcome = self.cleanup_student(student_id);
            stats.removed_attempts += outcome.removed_attempts;
            stats.removed_events += outcome.removed_events;
            stats.dropped_concepts += outcome.dropped_concepts;
        }

        self.cleanup_running.store(false, Ordering::SeqCst);
        tracing::info!(
            students = stats.students,
            removed_attempts = stats.removed_attempts,
            removed_events = stats.removed_events,
            dropped_concepts = stats.dropped_concepts,
            "cleanup sweep completed"
        );
        Some(stats)
    }
}

fn merge_outcomes(
    mastery: MasteryCleanupOutcome,
    mistakes: MistakeCleanupOutcome,
) -> CleanupOutcome {
    CleanupOutcome {
        removed_attempts: mastery.removed_attempts,
        removed_events: mistakes.removed_events,
        dropped_concepts: mastery.dropped_concepts + mistakes.dropped_concepts,
    }
}
