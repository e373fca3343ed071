//! Read-only export for the mastery map visualization.
//!
//! Combines the static graph topology with each node's current score and
//! mastery level so the consumer can color and group nodes. Nothing here
//! mutates core state.

use chrono::Utc;
use serde::Serialize;

use crate::graph::KnowledgeGraph;
use crate::mastery::MasteryLedger;
use crate::types::{ConceptCategory, ConceptDifficulty, ConceptEdge, MasteryLevel};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptSnapshot {
    pub id: String,
    pub name: String,
    pub category: ConceptCategory,
    pub difficulty: ConceptDifficulty,
    pub score: f64,
    pub mastery_level: MasteryLevel,
    pub attempt_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterySnapshot {
    pub student_id: String,
    pub generated_at: i64,
    pub nodes: Vec<ConceptSnapshot>,
    pub edges: Vec<ConceptEdge>,
}

/// Builds the visualization snapshot for one student. Concepts without any
/// recorded attempt appear with score 0 and level `none`.
pub fn mastery_map(
    graph: &KnowledgeGraph,
    ledger: &MasteryLedger,
    student_id: &str,
) -> MasterySnapshot {
    let state = ledger.load_state(student_id);

    let nodes = graph
        .nodes()
        .iter()
        .map(|node| {
            let record = state.mastery_data.get(&node.id);
            let score = record.map(|r| r.score).unwrap_or(0.0);
            ConceptSnapshot {
                id: node.id.clone(),
                name: node.name.clone(),
                category: node.category,
                difficulty: node.difficulty,
                score,
                mastery_level: MasteryLevel::from_score(score),
                attempt_count: record.map(|r| r.attempts.len()).unwrap_or(0),
            }
        })
        .collect();

    MasterySnapshot {
        student_id: student_id.to_string(),
        generated_at: Utc::now().timestamp_millis(),
        nodes,
        edges: graph.edges().to_vec(),
    }
}
