//! Concept identity resolution.
//!
//! The external reasoning service tags outcomes with free-text concept
//! names ("Newton's Laws!!", "conservation of momentum problems"...).
//! This module maps those mentions onto canonical graph ids with three
//! ordered strategies (exact match, then substring, then keyword overlap)
//! and reports "unresolved" rather than guessing when none applies. Every
//! function here is pure given the graph and the keyword table.

use serde::Serialize;

use crate::graph::KnowledgeGraph;

/// Curated keyword set for one concept. Table order is the tie-break
/// priority: when two concepts match the same number of keywords, the
/// earlier entry wins.
#[derive(Debug, Clone)]
pub struct ConceptKeywords {
    pub concept_id: String,
    pub keywords: Vec<String>,
}

/// Lowercases, strips punctuation, and collapses whitespace.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            pending_space = true;
        }
        // Punctuation is dropped entirely: "Newton's" == "Newtons".
    }
    out
}

/// One resolved (or unresolved) batch input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMention {
    pub external_id: String,
    pub input_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
}

/// Summary statistics for a batch resolution, for diagnostic reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingReport {
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
    /// Percentage of inputs that resolved, 0-100.
    pub mapping_rate: f64,
}

#[derive(Debug, Clone)]
struct NameEntry {
    normalized: String,
    concept_id: String,
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    concept_id: String,
    normalized_keywords: Vec<String>,
}

/// Stateless resolver over precomputed normalized tables.
#[derive(Debug, Clone)]
pub struct ConceptResolver {
    names: Vec<NameEntry>,
    keywords: Vec<KeywordEntry>,
}

impl ConceptResolver {
    /// Builds the lookup tables from the graph's node list and a keyword
    /// table. Keyword entries for unknown concepts are skipped with a
    /// diagnostic rather than rejected; the graph is the identity source.
    pub fn new(graph: &KnowledgeGraph, keyword_table: Vec<ConceptKeywords>) -> Self {
        let names = graph
            .nodes()
            .iter()
            .map(|node| NameEntry {
                normalized: normalize(&node.name),
                concept_id: node.id.clone(),
            })
            .collect();

        let keywords = keyword_table
            .into_iter()
            .filter(|entry| {
                let known = graph.contains(&entry.concept_id);
                if !known {
                    tracing::warn!(
                        concept_id = %entry.concept_id,
                        "keyword table references unknown concept, skipping entry"
                    );
                }
                known
            })
            .map(|entry| KeywordEntry {
                concept_id: entry.concept_id,
                normalized_keywords: entry
                    .keywords
                    .iter()
                    .map(|k| normalize(k))
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();

        Self { names, keywords }
    }

    /// Maps a free-text mention onto a canonical concept id. Accepts any
    /// string and never fails; `None` means no confident mapping exists.
    pub fn resolve(&self, mention: &str) -> Option<String> {
        let normalized = normalize(mention);
        if normalized.is_empty() {
            return None;
        }

        // Strategy 1: exact match on normalized names.
        if let Some(entry) = self.names.iter().find(|e| e.normalized == normalized) {
            return Some(entry.concept_id.clone());
        }

        // Strategy 2: substring containment in either direction.
        if let Some(entry) = self.names.iter().find(|e| {
            !e.normalized.is_empty()
                && (normalized.contains(&e.normalized) || e.normalized.contains(&normalized))
        }) {
            return Some(entry.concept_id.clone());
        }

        // Strategy 3: keyword overlap. Strictly-greater comparison keeps
        // the first-declared concept on ties, which makes the result
        // deterministic regardless of input.
        let mut best: Option<(&KeywordEntry, usize)> = None;
        for entry in &self.keywords {
            let count = entry
                .normalized_keywords
                .iter()
                .filter(|k| normalized.contains(k.as_str()))
                .count();
            if count > 0 && best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((entry, count));
            }
        }
        best.map(|(entry, _)| entry.concept_id.clone())
    }

    /// Resolves a batch of (externalId, name) pairs and summarizes the
    /// outcome for diagnostics.
    pub fn resolve_batch<I, S>(&self, pairs: I) -> (Vec<ResolvedMention>, MappingReport)
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mentions: Vec<ResolvedMention> = pairs
            .into_iter()
            .map(|(external_id, name)| {
                let input_name = name.into();
                let concept_id = self.resolve(&input_name);
                ResolvedMention {
                    external_id: external_id.into(),
                    input_name,
                    concept_id,
                }
            })
            .collect();

        let total = mentions.len();
        let mapped = mentions.iter().filter(|m| m.concept_id.is_some()).count();
        let report = MappingReport {
            total,
            mapped,
            unmapped: total - mapped,
            mapping_rate: if total > 0 {
                mapped as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        };
        (mentions, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::seed;

    fn resolver() -> ConceptResolver {
        let graph = seed::physics_graph().unwrap();
        ConceptResolver::new(&graph, seed::keyword_table())
    }

    #[test]
    fn normalize_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize("Newton's   Laws!!"), "newtons laws");
        assert_eq!(normalize("  Work & Energy  "), "work energy");
        assert_eq!(normalize("??!"), "");
    }

    #[test]
    fn exact_match_survives_punctuation_and_case() {
        let r = resolver();
        assert_eq!(r.resolve("Newton's Laws!!").as_deref(), Some("newtons-laws"));
        assert_eq!(r.resolve("NEWTONS LAWS").as_deref(), Some("newtons-laws"));
    }

    #[test]
    fn substring_match_works_both_directions() {
        let r = resolver();
        // Input contains the node name.
        assert_eq!(
            r.resolve("problems about circular motion on a track").as_deref(),
            Some("circular-motion")
        );
        // Node name contains the input.
        assert_eq!(r.resolve("harmonic motion").as_deref(), Some("simple-harmonic-motion"));
    }

    #[test]
    fn keyword_match_picks_highest_overlap() {
        let r = resolver();
        // "impulse" and "collision" both belong to the momentum keyword set.
        assert_eq!(
            r.resolve("impulse during a collision between carts").as_deref(),
            Some("momentum")
        );
    }

    #[test]
    fn keyword_tie_breaks_by_table_order() {
        let r = resolver();
        // "velocity" (kinematics) and "inertia" (newtons-laws) give one
        // keyword each; kinematics is declared first.
        assert_eq!(r.resolve("velocity and inertia").as_deref(), Some("kinematics"));
    }

    #[test]
    fn unmatchable_input_is_unresolved() {
        let r = resolver();
        assert_eq!(r.resolve("Quantum Entanglement Foo"), None);
        assert_eq!(r.resolve(""), None);
        assert_eq!(r.resolve("!!!"), None);
    }

    #[test]
    fn batch_report_counts_mapped_and_unmapped() {
        let r = resolver();
        let (mentions, report) = r.resolve_batch(vec![
            ("e1", "Newton's Laws"),
            ("e2", "Quantum Entanglement Foo"),
            ("e3", "momentum and impulse"),
            ("e4", "totally unrelated gibberish xyzzy"),
        ]);

        assert_eq!(mentions.len(), 4);
        assert_eq!(report.total, 4);
        assert_eq!(report.mapped, 2);
        assert_eq!(report.unmapped, 2);
        assert!((report.mapping_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn resolution_is_deterministic() {
        let r = resolver();
        let a = r.resolve("energy and momentum in collisions");
        for _ in 0..10 {
            assert_eq!(r.resolve("energy and momentum in collisions"), a);
        }
    }
}
