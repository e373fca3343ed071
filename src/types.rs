//! Shared data model for the analytics core.
//!
//! Everything that crosses a component boundary or gets persisted lives
//! here: the static concept graph types, per-attempt signals, derived
//! mastery records, mistake events and the warnings composed from them.

use serde::{Deserialize, Serialize};

/// Physics domain a concept belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConceptCategory {
    Mechanics,
    Waves,
    Thermodynamics,
    Electromagnetism,
    Optics,
    ModernPhysics,
}

impl ConceptCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mechanics => "mechanics",
            Self::Waves => "waves",
            Self::Thermodynamics => "thermodynamics",
            Self::Electromagnetism => "electromagnetism",
            Self::Optics => "optics",
            Self::ModernPhysics => "modern-physics",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptDifficulty {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

impl ConceptDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

/// How two concepts relate in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    Prerequisite,
    Related,
    BuildsOn,
    AppliesTo,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prerequisite => "prerequisite",
            Self::Related => "related",
            Self::BuildsOn => "builds-on",
            Self::AppliesTo => "applies-to",
        }
    }
}

/// Static node of the concept graph. Loaded once at startup, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptNode {
    pub id: String,
    pub name: String,
    pub category: ConceptCategory,
    pub difficulty: ConceptDifficulty,
    /// Ids of concepts that should be mastered before this one.
    pub prerequisites: Vec<String>,
}

/// Static relationship edge between two graph nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptEdge {
    pub source: String,
    pub target: String,
    pub relationship: RelationshipKind,
    /// Relationship strength in [0, 1].
    pub strength: f64,
}

/// One problem attempt as reported by the upstream attempt-processing flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub attempt_id: String,
    pub problem_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// 0-5; out-of-range values are clamped when recorded, never rejected.
    pub hint_level: i32,
    /// Milliseconds spent on the problem; negative values are clamped to 0.
    pub time_spent: i64,
    pub success: bool,
}

/// Per-student, per-concept attempt history with its derived rolling score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub concept_id: String,
    pub concept_name: String,
    /// Append-ordered history; at most the retention cap is kept, and only
    /// the trailing scoring window influences `score`.
    pub attempts: Vec<Attempt>,
    /// Always clamped to [0, 1].
    pub score: f64,
    pub last_updated: i64,
}

/// Derived mastery band; a pure function of the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    High,
    Medium,
    Low,
    None,
}

impl MasteryLevel {
    /// Threshold mapping: >= 0.75 high, >= 0.4 medium, > 0 low, else none.
    /// Zero attempts always score 0.0, so they land on `None` here too.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else if score > 0.0 {
            Self::Low
        } else {
            Self::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::None => "none",
        }
    }
}

/// Structured mistake event from the upstream mistake-detection flow.
///
/// Concept resolution happens before these are recorded, so `concept_id`
/// is always a canonical graph id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeEvent {
    pub concept_id: String,
    pub concept_name: String,
    pub problem_type: String,
    pub struggled_steps: Vec<String>,
    pub max_hint_level_used: i32,
    pub time_spent: i64,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_mistake: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Low,
    Medium,
    High,
}

impl WarningSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Actionable warning emitted by the mistake pattern tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub message: String,
    pub severity: WarningSeverity,
    pub related_concepts: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Direction a concept's mistake pattern is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MistakeTrend {
    Improving,
    Persistent,
    Worsening,
}

impl MistakeTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Persistent => "persistent",
            Self::Worsening => "worsening",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastery_level_threshold_boundaries() {
        assert_eq!(MasteryLevel::from_score(0.75), MasteryLevel::High);
        assert_eq!(MasteryLevel::from_score(0.7499), MasteryLevel::Medium);
        assert_eq!(MasteryLevel::from_score(0.4), MasteryLevel::Medium);
        assert_eq!(MasteryLevel::from_score(0.399), MasteryLevel::Low);
        assert_eq!(MasteryLevel::from_score(0.0001), MasteryLevel::Low);
        assert_eq!(MasteryLevel::from_score(0.0), MasteryLevel::None);
        assert_eq!(MasteryLevel::from_score(1.0), MasteryLevel::High);
    }

    #[test]
    fn relationship_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&RelationshipKind::BuildsOn).unwrap();
        assert_eq!(json, "\"builds-on\"");
        let json = serde_json::to_string(&RelationshipKind::AppliesTo).unwrap();
        assert_eq!(json, "\"applies-to\"");
    }

    #[test]
    fn mistake_event_omits_absent_common_mistake() {
        let event = MistakeEvent {
            concept_id: "momentum".to_string(),
            concept_name: "Momentum".to_string(),
            problem_type: "collision".to_string(),
            struggled_steps: vec![],
            max_hint_level_used: 2,
            time_spent: 40_000,
            timestamp: 1_700_000_000_000,
            common_mistake: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("commonMistake"));
    }
}
