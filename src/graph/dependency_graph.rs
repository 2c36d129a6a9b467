use super::{DependencyEdge, GraphAnalysisResult, GraphAnalyzer, GraphError};
use crate::config::DependencyConfig;
use crate::item_validation;
use crate::keywords::{DependencyMatch, KeywordExtractor};
use crate::work_item::{RelationshipKind, WorkItem};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub const DEFAULT_IMPLICIT_THRESHOLD: f64 = 0.5;

/// Directed graph over registered work items.
///
/// Explicit edges are derived from the registered items' declarations on
/// demand; implicit edges are stored once inferred.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    items: Vec<WorkItem>,
    index: HashMap<String, usize>,
    implicit: Vec<DependencyEdge>,
    extractor: KeywordExtractor,
    strongest_direction_only: bool,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extractor(extractor: KeywordExtractor) -> Self {
        Self {
            extractor,
            ..Self::default()
        }
    }

    pub fn from_config(config: &DependencyConfig) -> Self {
        Self::with_extractor(KeywordExtractor::new(config.minimum_score))
            .with_strongest_direction_only(config.strongest_direction_only)
    }

    /// Keeps at most one inferred direction per pair and skips pairs already
    /// ordered the other way round.
    pub fn with_strongest_direction_only(mut self, enabled: bool) -> Self {
        self.strongest_direction_only = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&WorkItem> {
        self.index.get(id).map(|&idx| &self.items[idx])
    }

    /// Registers a batch of items. An id that is already registered has its
    /// data replaced; if the data changed it loses any implicit edges
    /// touching it.
    ///
    /// The whole batch is validated before anything changes: every declared
    /// target must be registered already or be part of the batch.
    pub fn add_items<I>(&mut self, items: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = WorkItem>,
    {
        let batch: Vec<WorkItem> = items.into_iter().collect();
        item_validation::validate_item_collection(&batch)?;

        let batch_ids: HashSet<&str> = batch.iter().map(|item| item.id.as_str()).collect();
        for item in &batch {
            for declaration in &item.dependencies {
                if declaration.target == item.id {
                    return Err(GraphError::SelfDependency {
                        item: item.id.clone(),
                    });
                }
                let known = batch_ids.contains(declaration.target.as_str())
                    || self.index.contains_key(&declaration.target);
                if !known {
                    return Err(GraphError::UnknownWorkItem {
                        item: item.id.clone(),
                        target: declaration.target.clone(),
                    });
                }
            }
        }

        for item in batch {
            match self.index.get(&item.id) {
                Some(&idx) => {
                    if self.items[idx] == item {
                        continue;
                    }
                    let id = item.id.clone();
                    self.items[idx] = item;
                    self.implicit.retain(|edge| edge.from != id && edge.to != id);
                    debug!(item = %id, "work item replaced");
                }
                None => {
                    self.index.insert(item.id.clone(), self.items.len());
                    self.items.push(item);
                }
            }
        }
        Ok(())
    }

    /// Edges declared on the registered items, deduplicated per direction.
    pub fn explicit_edges(&self) -> Vec<DependencyEdge> {
        let mut seen: HashSet<(String, String, bool)> = HashSet::new();
        let mut edges = Vec::new();
        for item in &self.items {
            for declaration in &item.dependencies {
                let (from, to) = match declaration.kind {
                    RelationshipKind::Blocks => (&declaration.target, &item.id),
                    RelationshipKind::DependsOn | RelationshipKind::RelatedTo => {
                        (&item.id, &declaration.target)
                    }
                };
                let key = (from.clone(), to.clone(), declaration.kind.is_ordering());
                if seen.insert(key) {
                    edges.push(DependencyEdge::explicit(
                        from.clone(),
                        to.clone(),
                        declaration.kind,
                    ));
                }
            }
        }
        edges
    }

    pub fn implicit_edges(&self) -> &[DependencyEdge] {
        &self.implicit
    }

    /// All edges, explicit first.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let mut edges = self.explicit_edges();
        edges.extend(self.implicit.iter().cloned());
        edges
    }

    /// Infers dependencies from item text and adds every match scoring at
    /// least `threshold`. Returns the edges added by this call.
    ///
    /// Both directions of a pair are tried; a direction already covered by an
    /// explicit or inferred edge is left alone. With
    /// `strongest_direction_only` set, only the stronger direction of a pair
    /// is considered (ties: the later-listed item depends on the
    /// earlier-listed one) and pairs already ordered the other way are
    /// skipped as well.
    pub fn detect_implicit_dependencies(&mut self, threshold: f64) -> Vec<DependencyEdge> {
        let explicit = self.explicit_edges();
        let declared: HashSet<(&str, &str)> = explicit
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        let ordering: HashSet<(&str, &str)> = explicit
            .iter()
            .filter(|e| e.is_ordering())
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        let inferred: HashSet<(&str, &str)> = self
            .implicit
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();

        let mut added = Vec::new();
        for (i, earlier) in self.items.iter().enumerate() {
            for later in &self.items[i + 1..] {
                let forward = self.extractor.score_items(later, earlier);
                let backward = self.extractor.score_items(earlier, later);
                let candidates: Vec<(&WorkItem, &WorkItem, DependencyMatch)> =
                    if self.strongest_direction_only {
                        Self::pick_direction(later, earlier, forward, backward, threshold)
                            .into_iter()
                            .collect()
                    } else {
                        [(later, earlier, forward), (earlier, later, backward)]
                            .into_iter()
                            .filter(|(_, _, found)| qualifies(found, threshold))
                            .collect()
                    };

                for (dependent, dependency, found) in candidates {
                    let pair = (dependent.id.as_str(), dependency.id.as_str());
                    let reverse = (dependency.id.as_str(), dependent.id.as_str());
                    let covered = declared.contains(&pair)
                        || inferred.contains(&pair)
                        || (self.strongest_direction_only
                            && (ordering.contains(&reverse) || inferred.contains(&reverse)));
                    if covered {
                        debug!(from = pair.0, to = pair.1, "implicit dependency already covered");
                        continue;
                    }

                    let Some(pattern) = found.pattern else {
                        continue;
                    };
                    added.push(DependencyEdge::implicit(
                        dependent.id.clone(),
                        dependency.id.clone(),
                        found.score,
                        pattern,
                    ));
                }
            }
        }

        info!(
            added = added.len(),
            threshold, "implicit dependencies detected"
        );
        self.implicit.extend(added.iter().cloned());
        added
    }

    fn pick_direction<'a>(
        later: &'a WorkItem,
        earlier: &'a WorkItem,
        forward: DependencyMatch,
        backward: DependencyMatch,
        threshold: f64,
    ) -> Option<(&'a WorkItem, &'a WorkItem, DependencyMatch)> {
        match (qualifies(&forward, threshold), qualifies(&backward, threshold)) {
            (true, true) if backward.score > forward.score => Some((earlier, later, backward)),
            (true, _) => Some((later, earlier, forward)),
            (false, true) => Some((earlier, later, backward)),
            (false, false) => None,
        }
    }

    /// Whether `from` depends on `to`, directly or transitively, through
    /// ordering edges.
    pub fn depends_on(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.analyzer().has_path(a, b),
            _ => false,
        }
    }

    pub fn analyze(&self) -> GraphAnalysisResult {
        self.analyzer().analyze()
    }

    fn analyzer(&self) -> GraphAnalyzer {
        let edges: Vec<(usize, usize)> = self
            .edges()
            .iter()
            .filter(|edge| edge.is_ordering())
            .filter_map(|edge| Some((*self.index.get(&edge.from)?, *self.index.get(&edge.to)?)))
            .collect();
        let ids = self.items.iter().map(|item| item.id.clone()).collect();
        GraphAnalyzer::build(ids, &edges)
    }
}

fn qualifies(found: &DependencyMatch, threshold: f64) -> bool {
    found.is_match() && found.score >= threshold
}
