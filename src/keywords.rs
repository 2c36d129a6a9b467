//! Keyword-based inference of implicit dependencies between work items.
//!
//! The catalog below is ordered; when two patterns score the same the earlier
//! one wins. A pattern matches when the dependent item mentions one of the
//! pattern's downstream keywords and the dependency mentions one of its
//! upstream keywords. Keywords match case-insensitively anywhere in the text,
//! so "microservice" counts as a `service` mention.

use crate::work_item::WorkItem;
use serde::Serialize;
use std::collections::HashSet;

const INFRASTRUCTURE: &[&str] = &["setup", "infrastructure", "database", "environment"];
const DATA_MODEL: &[&str] = &["schema", "model", "migration"];
const INTERFACE: &[&str] = &["api", "endpoint"];
const SERVICE: &[&str] = &["api", "endpoint", "service"];
const PRESENTATION: &[&str] = &["ui", "frontend", "component"];
const DESIGN: &[&str] = &["design", "architecture", "requirements", "specification"];
const IMPLEMENTATION: &[&str] = &["implement", "build", "develop"];
const VERIFICATION: &[&str] = &["test", "testing", "qa"];
const DEPLOYMENT: &[&str] = &["deploy", "release", "launch"];

const BUILD_CATEGORIES: &[&[&str]] = &[
    INFRASTRUCTURE,
    DATA_MODEL,
    SERVICE,
    PRESENTATION,
    DESIGN,
    IMPLEMENTATION,
];

const SHIP_CATEGORIES: &[&[&str]] = &[
    INFRASTRUCTURE,
    DATA_MODEL,
    SERVICE,
    PRESENTATION,
    DESIGN,
    IMPLEMENTATION,
    VERIFICATION,
];

/// Bonus per keyword hit beyond the first upstream/downstream pair.
const EXTRA_HIT_BONUS: f64 = 0.05;
const MAX_EXTRA_BONUS: f64 = 0.15;

pub const DEFAULT_MINIMUM_SCORE: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
pub struct KeywordPattern {
    pub name: &'static str,
    pub upstream: &'static [&'static [&'static str]],
    pub downstream: &'static [&'static str],
    pub strength: f64,
}

pub const CATALOG: &[KeywordPattern] = &[
    KeywordPattern {
        name: "infrastructure->interface",
        upstream: &[INFRASTRUCTURE],
        downstream: INTERFACE,
        strength: 0.80,
    },
    KeywordPattern {
        name: "data-model->interface",
        upstream: &[DATA_MODEL],
        downstream: SERVICE,
        strength: 0.75,
    },
    KeywordPattern {
        name: "interface->presentation",
        upstream: &[INTERFACE],
        downstream: PRESENTATION,
        strength: 0.70,
    },
    KeywordPattern {
        name: "design->implementation",
        upstream: &[DESIGN],
        downstream: IMPLEMENTATION,
        strength: 0.60,
    },
    KeywordPattern {
        name: "any->verification",
        upstream: BUILD_CATEGORIES,
        downstream: VERIFICATION,
        strength: 0.60,
    },
    KeywordPattern {
        name: "any->deployment",
        upstream: SHIP_CATEGORIES,
        downstream: DEPLOYMENT,
        strength: 0.65,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyMatch {
    /// Likelihood in [0, 1] that the dependent needs the dependency first.
    pub score: f64,
    pub pattern: Option<&'static str>,
}

impl DependencyMatch {
    pub fn none() -> Self {
        Self {
            score: 0.0,
            pattern: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.pattern.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    minimum_score: f64,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_SCORE)
    }
}

impl KeywordExtractor {
    pub fn new(minimum_score: f64) -> Self {
        Self {
            minimum_score: minimum_score.clamp(0.0, 1.0),
        }
    }

    pub fn minimum_score(&self) -> f64 {
        self.minimum_score
    }

    pub fn catalog(&self) -> &'static [KeywordPattern] {
        CATALOG
    }

    pub fn score_items(&self, dependent: &WorkItem, dependency: &WorkItem) -> DependencyMatch {
        self.score(&dependent.combined_text(), &dependency.combined_text())
    }

    /// Scores how strongly `dependent_text` implies it needs `dependency_text`
    /// done first.
    pub fn score(&self, dependent_text: &str, dependency_text: &str) -> DependencyMatch {
        let dependent_text = dependent_text.to_lowercase();
        let dependency_text = dependency_text.to_lowercase();

        let mut best = DependencyMatch::none();
        for pattern in CATALOG {
            let downstream_hits = count_hits(&dependent_text, pattern.downstream);
            if downstream_hits == 0 {
                continue;
            }
            let upstream_hits: usize = pattern
                .upstream
                .iter()
                .flat_map(|group| group.iter())
                .copied()
                .collect::<HashSet<_>>()
                .into_iter()
                .filter(|keyword| dependency_text.contains(*keyword))
                .count();
            if upstream_hits == 0 {
                continue;
            }

            let extra = (downstream_hits + upstream_hits - 2) as f64 * EXTRA_HIT_BONUS;
            let score = (pattern.strength + extra.min(MAX_EXTRA_BONUS)).min(1.0);
            if score > best.score {
                best = DependencyMatch {
                    score,
                    pattern: Some(pattern.name),
                };
            }
        }

        if best.score < self.minimum_score {
            return DependencyMatch::none();
        }
        best
    }
}

/// `text` must already be lowercased.
fn count_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}
