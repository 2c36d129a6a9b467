use crate::item_validation::ItemValidationError;
use crate::work_item::RelationshipKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod analyzer;
pub mod dependency_graph;

pub use analyzer::GraphAnalyzer;
pub use dependency_graph::DependencyGraph;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("invalid work item: {0}")]
    InvalidItem(#[from] ItemValidationError),
    #[error("work item {item} declares a dependency on itself")]
    SelfDependency { item: String },
    #[error("work item {item} references unregistered work item {target}")]
    UnknownWorkItem { item: String, target: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EdgeKind {
    Explicit {
        relationship: RelationshipKind,
    },
    Implicit {
        strength: f64,
        pattern: String,
    },
}

/// `from -> to`: `to` must complete before (or informs) `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

impl DependencyEdge {
    pub fn explicit(
        from: impl Into<String>,
        to: impl Into<String>,
        relationship: RelationshipKind,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Explicit { relationship },
        }
    }

    pub fn implicit(
        from: impl Into<String>,
        to: impl Into<String>,
        strength: f64,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: EdgeKind::Implicit {
                strength,
                pattern: pattern.into(),
            },
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self.kind, EdgeKind::Explicit { .. })
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self.kind, EdgeKind::Implicit { .. })
    }

    /// Related-to links are kept for reference but never constrain ordering.
    pub fn is_ordering(&self) -> bool {
        match &self.kind {
            EdgeKind::Explicit { relationship } => relationship.is_ordering(),
            EdgeKind::Implicit { .. } => true,
        }
    }

    pub fn strength(&self) -> Option<f64> {
        match &self.kind {
            EdgeKind::Implicit { strength, .. } => Some(*strength),
            EdgeKind::Explicit { .. } => None,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match &self.kind {
            EdgeKind::Implicit { pattern, .. } => Some(pattern.as_str()),
            EdgeKind::Explicit { .. } => None,
        }
    }
}

/// Read-only snapshot produced by [`DependencyGraph::analyze`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphAnalysisResult {
    /// Dependencies before dependents; items caught in a cycle are appended
    /// last in input order.
    pub execution_order: Vec<String>,
    /// Longest dependency chain through the acyclic part, first step first.
    pub critical_path: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    /// Items at the same dependency depth. This is a heuristic partition,
    /// not a maximum antichain cover, and leaves cyclic items out.
    pub parallel_groups: Vec<Vec<String>>,
    pub orphans: Vec<String>,
    pub leaves: Vec<String>,
    pub cyclic_items: Vec<String>,
    pub edge_count: usize,
}

impl GraphAnalysisResult {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("items={}", self.execution_order.len()));
        parts.push(format!("edges={}", self.edge_count));
        parts.push(format!("groups={}", self.parallel_groups.len()));
        if !self.cycles.is_empty() {
            parts.push(format!("cycles={}", self.cycles.len()));
        }
        if !self.orphans.is_empty() {
            parts.push(format!("orphans={}", self.orphans.len()));
        }
        if !self.critical_path.is_empty() {
            parts.push(format!("crit_path={}", self.critical_path.join("->")));
        }
        parts.join(", ")
    }
}
