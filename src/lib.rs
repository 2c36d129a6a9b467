pub mod config;
pub mod confidence;
pub mod estimation;
pub mod graph;
pub mod item_validation;
pub mod keywords;
pub mod persistence;
pub mod plan;
pub mod work_item;

pub use config::{ConfigError, PlanningConfig};
pub use confidence::{
    AggregateConfidence, ConfidenceAssessment, ConfidenceScorer, ConfidenceTier, SectionInput,
};
pub use estimation::{ComplexityBand, Estimate, EstimationCalibrator, EstimationRecord};
pub use graph::{DependencyEdge, DependencyGraph, EdgeKind, GraphAnalysisResult, GraphError};
pub use keywords::{DependencyMatch, KeywordExtractor};
pub use persistence::{EstimationStore, InMemoryEstimationStore, PersistenceError};
pub use plan::{PlanAnalyzer, PlanReport};
pub use work_item::{DependencyDeclaration, RelationshipKind, WorkItem, WorkItemStatus};
