//! Confidence scoring for generated planning artifacts.
//!
//! A section is scored from three signals in `[0, 1]`: how complete its input
//! was, the generator's own self-assessment, and how well it matched a known
//! pattern. The weighted composite becomes a 0-100 score and a tier; low-tier
//! sections carry a short list of clarifying questions.

use crate::config::ConfidenceConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

mod questions;

const COMPLETENESS_STEP: f64 = 0.25;

/// Upper bound on clarifying questions per section, whatever the config says.
pub const MAX_CLARIFYING_QUESTIONS: usize = 5;

/// What a generated section was produced from, plus the optional signals
/// reported alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionInput {
    pub section_id: String,
    pub section_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub ai_self_assessment: Option<f64>,
    #[serde(default)]
    pub pattern_match: Option<f64>,
}

impl SectionInput {
    pub fn new(section_id: impl Into<String>, section_name: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            section_name: section_name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_ai_self_assessment(mut self, value: f64) -> Self {
        self.ai_self_assessment = Some(value);
        self
    }

    pub fn with_pattern_match(mut self, value: f64) -> Self {
        self.pattern_match = Some(value);
        self
    }

    fn has_description(&self) -> bool {
        present(self.description.as_deref())
    }

    fn has_examples(&self) -> bool {
        self.examples.iter().any(|e| !e.trim().is_empty())
    }

    fn has_constraints(&self) -> bool {
        self.constraints.iter().any(|c| !c.trim().is_empty())
    }

    fn has_context(&self) -> bool {
        present(self.context.as_deref())
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective signal values after clamping and neutral substitution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub input_completeness: f64,
    pub ai_self_assessment: f64,
    pub pattern_match: f64,
}

/// Which of the three signals a factor value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    InputCompleteness,
    AiSelfAssessment,
    PatternMatch,
}

impl Factor {
    pub fn label(&self) -> &'static str {
        match self {
            Factor::InputCompleteness => "input completeness",
            Factor::AiSelfAssessment => "self-assessment",
            Factor::PatternMatch => "pattern match",
        }
    }
}

impl ConfidenceFactors {
    /// Factors from weakest to strongest; equal values keep declaration order.
    pub fn weakest_first(&self) -> [(Factor, f64); 3] {
        let mut ranked = [
            (Factor::InputCompleteness, self.input_completeness),
            (Factor::AiSelfAssessment, self.ai_self_assessment),
            (Factor::PatternMatch, self.pattern_match),
        ];
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceAssessment {
    pub section_id: String,
    pub section_name: String,
    pub score: u8,
    pub tier: ConfidenceTier,
    pub factors: ConfidenceFactors,
    pub reasoning: String,
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarifying_questions: Option<Vec<String>>,
}

/// Headline confidence over several assessed sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfidence {
    pub score: u8,
    pub tier: ConfidenceTier,
    pub needs_review: bool,
    pub section_count: usize,
    pub low_sections: Vec<String>,
}

impl AggregateConfidence {
    pub fn to_cli_summary(&self) -> String {
        format!(
            "confidence {} ({}) over {} section(s), {} low{}",
            self.score,
            self.tier,
            self.section_count,
            self.low_sections.len(),
            if self.needs_review { ", review needed" } else { "" }
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    config: ConfidenceConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    /// 0.25 for each of description, examples, constraints and context.
    pub fn calculate_input_completeness(&self, input: &SectionInput) -> f64 {
        let parts = [
            input.has_description(),
            input.has_examples(),
            input.has_constraints(),
            input.has_context(),
        ];
        let filled = parts.iter().filter(|&&p| p).count() as f64;
        (filled * COMPLETENESS_STEP).min(1.0)
    }

    pub fn calculate_section_confidence(&self, input: &SectionInput) -> ConfidenceAssessment {
        let factors = ConfidenceFactors {
            input_completeness: self.calculate_input_completeness(input),
            ai_self_assessment: self.signal(input.ai_self_assessment),
            pattern_match: self.signal(input.pattern_match),
        };
        let score = self.composite_score(&factors);
        let tier = self.tier_for(score);
        let needs_review = self.needs_review(score);
        let questions = self.generate_clarifying_questions(input, &factors, tier);

        debug!(
            section = %input.section_id,
            score,
            tier = tier.as_str(),
            "section confidence scored"
        );

        ConfidenceAssessment {
            section_id: input.section_id.clone(),
            section_name: input.section_name.clone(),
            score,
            tier,
            reasoning: reasoning(input, &factors, score, tier),
            factors,
            needs_review,
            clarifying_questions: (!questions.is_empty()).then_some(questions),
        }
    }

    /// Questions for a low-tier section about factors below the neutral
    /// signal, weakest first. Empty for any other tier.
    pub fn generate_clarifying_questions(
        &self,
        input: &SectionInput,
        factors: &ConfidenceFactors,
        tier: ConfidenceTier,
    ) -> Vec<String> {
        if tier != ConfidenceTier::Low {
            return Vec::new();
        }
        questions::for_weakest_factors(
            input,
            factors,
            self.config.neutral_signal,
            self.config.max_clarifying_questions.min(MAX_CLARIFYING_QUESTIONS),
        )
    }

    pub fn tier_for(&self, score: u8) -> ConfidenceTier {
        if score >= self.config.warning_threshold {
            ConfidenceTier::High
        } else if score >= self.config.error_threshold {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn needs_review(&self, score: u8) -> bool {
        score < self.config.warning_threshold
    }

    /// Mean score over the assessments. An empty slice scores 0.
    pub fn aggregate_confidence(&self, assessments: &[ConfidenceAssessment]) -> AggregateConfidence {
        let score = if assessments.is_empty() {
            0
        } else {
            let sum: u32 = assessments.iter().map(|a| u32::from(a.score)).sum();
            (f64::from(sum) / assessments.len() as f64).round() as u8
        };
        let tier = self.tier_for(score);
        AggregateConfidence {
            score,
            tier,
            needs_review: self.needs_review(score),
            section_count: assessments.len(),
            low_sections: assessments
                .iter()
                .filter(|a| a.tier == ConfidenceTier::Low)
                .map(|a| a.section_id.clone())
                .collect(),
        }
    }

    fn signal(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => self.config.neutral_signal.clamp(0.0, 1.0),
        }
    }

    fn composite_score(&self, factors: &ConfidenceFactors) -> u8 {
        let weights = &self.config.weights;
        let total = weights.total();
        if !(total.is_finite() && total > 0.0) {
            return 0;
        }
        let weighted = weights.input_completeness * factors.input_completeness
            + weights.ai_self_assessment * factors.ai_self_assessment
            + weights.pattern_match * factors.pattern_match;
        (100.0 * weighted / total).round().clamp(0.0, 100.0) as u8
    }
}

fn reasoning(
    input: &SectionInput,
    factors: &ConfidenceFactors,
    score: u8,
    tier: ConfidenceTier,
) -> String {
    let mut text = format!(
        "{} scored {score} ({tier}): input completeness {:.0}%, self-assessment {:.0}%{}, pattern match {:.0}%{}",
        input.section_name,
        factors.input_completeness * 100.0,
        factors.ai_self_assessment * 100.0,
        if input.ai_self_assessment.is_none() { " (not reported)" } else { "" },
        factors.pattern_match * 100.0,
        if input.pattern_match.is_none() { " (not reported)" } else { "" },
    );
    let (weakest, _) = factors.weakest_first()[0];
    text.push_str(&format!("; weakest signal is {}", weakest.label()));
    text
}
