//! # tutor-analytics
//!
//! Adaptive-learning analytics core for a physics tutoring application.
//! Students attempt problems tagged with physics concepts; this crate
//! turns the noisy per-attempt signals into stable, queryable state:
//!
//! - [`graph`]: immutable concept graph with prerequisite queries,
//!   validated (duplicates, dangling edges, DAG) at load time
//! - [`mastery`]: per-student rolling mastery scores over a fixed
//!   window of recent attempts
//! - [`resolver`]: fuzzy mapping from free-text concept mentions to
//!   canonical graph ids (exact → substring → keyword)
//! - [`mistakes`]: mistake pattern accumulation, trend classification
//!   and warning generation
//! - [`engine`]: facade wiring the pieces together over a pluggable
//!   [`storage::KvStore`]
//!
//! The core is synchronous and local. Every computation is bounded by
//! fixed window sizes, and there are no background threads; hosts drive
//! the optional periodic cleanup sweep themselves.
//!
//! ```rust
//! use std::sync::Arc;
//! use tutor_analytics::config::AnalyticsConfig;
//! use tutor_analytics::engine::{AnalyticsEngine, AttemptMetrics};
//! use tutor_analytics::storage::MemoryStore;
//!
//! let engine = AnalyticsEngine::with_default_graph(
//!     Arc::new(MemoryStore::new()),
//!     AnalyticsConfig::default(),
//! )
//! .expect("seed graph is valid");
//!
//! let outcome = engine.process_attempt(
//!     "student-1",
//!     "Newton's Laws!!",
//!     AttemptMetrics {
//!         problem_id: "p-17".to_string(),
//!         hint_level: 1,
//!         time_spent_ms: 45_000,
//!         success: true,
//!         timestamp: None,
//!     },
//! );
//! assert_eq!(outcome.concept_id.as_deref(), Some("newtons-laws"));
//! ```

pub mod config;
pub mod engine;
pub mod graph;
pub mod mastery;
pub mod mistakes;
pub mod resolver;
pub mod snapshot;
pub mod storage;
pub mod types;

pub use config::AnalyticsConfig;
pub use engine::{AnalyticsEngine, AttemptMetrics, ProcessedAttempt};
pub use graph::{GraphError, KnowledgeGraph};
pub use mastery::{compute_score, MasteryLedger};
pub use mistakes::{ConceptMistakeStats, MistakeTracker};
pub use resolver::{ConceptResolver, MappingReport};
pub use snapshot::MasterySnapshot;
pub use storage::{JsonFileStore, KvStore, MemoryStore, StorageError};
pub use types::*;
