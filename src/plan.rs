use crate::config::PlanningConfig;
use crate::confidence::{AggregateConfidence, ConfidenceAssessment, ConfidenceScorer, SectionInput};
use crate::estimation::{Estimate, EstimationCalibrator};
use crate::graph::{DependencyEdge, DependencyGraph, GraphAnalysisResult, GraphError};
use crate::persistence::{EstimationStore, PersistenceResult};
use crate::work_item::WorkItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEstimate {
    pub item_id: String,
    pub complexity: u8,
    pub estimate: Estimate,
}

/// Everything one planning pass derives from a batch of work items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub analysis: GraphAnalysisResult,
    pub implicit_edges: Vec<DependencyEdge>,
    pub estimates: Vec<ItemEstimate>,
    /// One assessment per inferred dependency.
    pub dependency_confidence: Vec<ConfidenceAssessment>,
    pub overall: AggregateConfidence,
    pub total_points: u32,
    pub critical_path_points: u32,
}

impl PlanReport {
    pub fn estimate_for(&self, item_id: &str) -> Option<&Estimate> {
        self.estimates
            .iter()
            .find(|e| e.item_id == item_id)
            .map(|e| &e.estimate)
    }

    pub fn to_cli_summary(&self) -> String {
        format!(
            "{}; points total={} critical={}; implicit={}; {}",
            self.analysis.to_cli_summary(),
            self.total_points,
            self.critical_path_points,
            self.implicit_edges.len(),
            self.overall.to_cli_summary()
        )
    }
}

/// Runs the graph, the calibrator and the scorer over one batch of items.
pub struct PlanAnalyzer<S: EstimationStore> {
    config: PlanningConfig,
    calibrator: EstimationCalibrator<S>,
    scorer: ConfidenceScorer,
}

impl<S: EstimationStore> PlanAnalyzer<S> {
    pub fn new(config: PlanningConfig, store: S) -> Self {
        Self {
            calibrator: EstimationCalibrator::new(store, config.estimation.clone()),
            scorer: ConfidenceScorer::new(config.confidence.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    pub fn calibrator(&self) -> &EstimationCalibrator<S> {
        &self.calibrator
    }

    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    pub fn analyze(&self, items: Vec<WorkItem>) -> Result<PlanReport, GraphError> {
        let mut graph = DependencyGraph::from_config(&self.config.dependency);
        graph.add_items(items)?;
        let implicit_edges =
            graph.detect_implicit_dependencies(self.config.dependency.implicit_threshold);
        let analysis = graph.analyze();

        let estimates: Vec<ItemEstimate> = graph
            .items()
            .iter()
            .map(|item| ItemEstimate {
                item_id: item.id.clone(),
                complexity: item.complexity,
                estimate: self.calibrator.estimate(item.complexity),
            })
            .collect();

        let points: HashMap<&str, u32> = estimates
            .iter()
            .map(|e| (e.item_id.as_str(), e.estimate.points))
            .collect();
        let total_points: u32 = points.values().sum();
        let critical_path_points: u32 = analysis
            .critical_path
            .iter()
            .filter_map(|id| points.get(id.as_str()))
            .sum();

        let dependency_confidence: Vec<ConfidenceAssessment> = implicit_edges
            .iter()
            .map(|edge| {
                self.scorer
                    .calculate_section_confidence(&dependency_claim(&graph, edge))
            })
            .collect();
        let overall = self.scorer.aggregate_confidence(&dependency_confidence);

        info!(
            items = graph.len(),
            implicit = implicit_edges.len(),
            total_points,
            "plan analyzed"
        );

        Ok(PlanReport {
            analysis,
            implicit_edges,
            estimates,
            dependency_confidence,
            overall,
            total_points,
            critical_path_points,
        })
    }

    /// Stores every estimate of the report as pending history. Returns the
    /// number of records written.
    pub fn record_estimates(&self, report: &PlanReport) -> PersistenceResult<usize> {
        for item in &report.estimates {
            self.calibrator
                .record_estimate(item.item_id.as_str(), item.estimate.points, item.estimate.band)?;
        }
        Ok(report.estimates.len())
    }
}

fn dependency_claim(graph: &DependencyGraph, edge: &DependencyEdge) -> SectionInput {
    let pattern = edge.pattern().unwrap_or("implicit");
    let mut input = SectionInput::new(
        format!("{}->{}", edge.from, edge.to),
        format!("{} depends on {} ({pattern})", edge.from, edge.to),
    );
    if let Some(strength) = edge.strength() {
        input = input.with_pattern_match(strength);
    }
    if let Some(item) = graph.item(&edge.from) {
        if !item.description.trim().is_empty() {
            input = input.with_description(item.description.clone());
        }
    }
    if let Some(item) = graph.item(&edge.to) {
        input = input.with_context(item.combined_text());
    }
    input
}
