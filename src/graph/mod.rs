//! Knowledge graph store.
//!
//! The concept graph is configuration, not runtime state: it is validated
//! and frozen at load time, and every other component assumes it is valid.
//! Storage is a flat node vector plus an id→index map, which keeps the
//! read queries allocation-light and avoids any cyclic ownership.

pub mod seed;

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::types::{ConceptCategory, ConceptEdge, ConceptNode, RelationshipKind};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate concept id: {0}")]
    DuplicateNode(String),
    #[error("edge {edge_source} -> {target} references unknown concept: {missing}")]
    DanglingEdge {
        edge_source: String,
        target: String,
        missing: String,
    },
    #[error("concept {node} lists unknown prerequisite: {prerequisite}")]
    UnknownPrerequisite { node: String, prerequisite: String },
    #[error("prerequisite cycle detected involving: {0}")]
    PrerequisiteCycle(String),
}

/// Immutable, process-wide concept graph. Construct once via [`KnowledgeGraph::build`].
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    nodes: Vec<ConceptNode>,
    edges: Vec<ConceptEdge>,
    index: HashMap<String, usize>,
}

impl KnowledgeGraph {
    /// Validates and freezes a graph. Fails fast on duplicate ids, dangling
    /// references, or a cycle in the prerequisite relation; a partial graph
    /// must never be served.
    pub fn build(nodes: Vec<ConceptNode>, edges: Vec<ConceptEdge>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        for node in &nodes {
            for prereq in &node.prerequisites {
                if !index.contains_key(prereq) {
                    return Err(GraphError::UnknownPrerequisite {
                        node: node.id.clone(),
                        prerequisite: prereq.clone(),
                    });
                }
            }
        }

        for edge in &edges {
            for endpoint in [&edge.source, &edge.target] {
                if !index.contains_key(endpoint) {
                    return Err(GraphError::DanglingEdge {
                        edge_source: edge.source.clone(),
                        target: edge.target.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        let graph = Self {
            nodes,
            edges,
            index,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Kahn topological sort over the prerequisite relation (node
    /// prerequisite lists plus explicit prerequisite edges).
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let n = self.nodes.len();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];

        for (i, node) in self.nodes.iter().enumerate() {
            for prereq in &node.prerequisites {
                dependents[self.index[prereq]].push(i);
                in_degree[i] += 1;
            }
        }
        for edge in &self.edges {
            if edge.relationship == RelationshipKind::Prerequisite {
                let target = self.index[&edge.target];
                dependents[self.index[&edge.source]].push(target);
                in_degree[target] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0usize;
        while let Some(i) = queue.pop_front() {
            visited += 1;
            for &dep in &dependents[i] {
                in_degree[dep] -= 1;
                if in_degree[dep] == 0 {
                    queue.push_back(dep);
                }
            }
        }

        if visited < n {
            let stuck = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, node)| node.id.clone())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GraphError::PrerequisiteCycle(stuck));
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&ConceptNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[ConceptEdge] {
        &self.edges
    }

    pub fn direct_prerequisites(&self, id: &str) -> Vec<&ConceptNode> {
        match self.node(id) {
            Some(node) => node
                .prerequisites
                .iter()
                .filter_map(|p| self.node(p))
                .collect(),
            None => Vec::new(),
        }
    }

    /// All prerequisites reachable from `id`, breadth-first, deduplicated,
    /// excluding `id` itself. Bounded by the node count; the DAG invariant
    /// guarantees termination.
    pub fn transitive_prerequisites(&self, id: &str) -> Vec<&ConceptNode> {
        let Some(start) = self.node(id) else {
            return Vec::new();
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = start.prerequisites.iter().map(String::as_str).collect();
        let mut out = Vec::new();

        while let Some(pid) = queue.pop_front() {
            if !seen.insert(pid) {
                continue;
            }
            if let Some(node) = self.node(pid) {
                out.push(node);
                queue.extend(node.prerequisites.iter().map(String::as_str));
            }
        }
        out
    }

    pub fn by_category(&self, category: ConceptCategory) -> Vec<&ConceptNode> {
        self.nodes.iter().filter(|n| n.category == category).collect()
    }

    /// Edges connecting `a` and `b` in either direction.
    pub fn edges_between(&self, a: &str, b: &str) -> Vec<&ConceptEdge> {
        self.edges
            .iter()
            .filter(|e| {
                (e.source == a && e.target == b) || (e.source == b && e.target == a)
            })
            .collect()
    }
}
