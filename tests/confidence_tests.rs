use plan_core::config::{ConfidenceConfig, ConfidenceWeights};
use plan_core::{ConfidenceScorer, ConfidenceTier, SectionInput};

fn sparse(id: &str) -> SectionInput {
    SectionInput::new(id, "Architecture")
}

#[test]
fn score_rises_with_self_assessment() {
    let scorer = ConfidenceScorer::default();
    let mut previous = 0;
    for step in 0..=10 {
        let input = sparse("s")
            .with_description("service layout")
            .with_pattern_match(0.6)
            .with_ai_self_assessment(step as f64 / 10.0);
        let score = scorer.calculate_section_confidence(&input).score;
        assert!(score >= previous, "step {step}: {score} < {previous}");
        previous = score;
    }
}

#[test]
fn low_tier_gets_bounded_unique_questions() {
    let scorer = ConfidenceScorer::default();
    let input = sparse("s")
        .with_ai_self_assessment(0.1)
        .with_pattern_match(0.0);
    let assessment = scorer.calculate_section_confidence(&input);

    assert_eq!(assessment.tier, ConfidenceTier::Low);
    assert!(assessment.needs_review);
    let questions = assessment.clarifying_questions.unwrap();
    assert!(!questions.is_empty() && questions.len() <= 5);
    let mut unique = questions.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), questions.len());
}

#[test]
fn weakest_factor_is_asked_about_first() {
    let scorer = ConfidenceScorer::default();
    let input = sparse("s")
        .with_description("d")
        .with_example("e")
        .with_constraint("c")
        .with_context("x")
        .with_ai_self_assessment(0.2)
        .with_pattern_match(0.0);
    // 0.3 + 0.08 + 0 = 38, low tier
    let assessment = scorer.calculate_section_confidence(&input);
    assert_eq!(assessment.score, 38);
    let questions = assessment.clarifying_questions.unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions[0].contains("structure or template"));
}

#[test]
fn questions_only_for_low_tier() {
    let scorer = ConfidenceScorer::default();
    let input = sparse("s");
    let factors = scorer.calculate_section_confidence(&input).factors;
    assert!(
        scorer
            .generate_clarifying_questions(&input, &factors, ConfidenceTier::Medium)
            .is_empty()
    );
    assert!(
        scorer
            .generate_clarifying_questions(&input, &factors, ConfidenceTier::High)
            .is_empty()
    );
    assert!(
        !scorer
            .generate_clarifying_questions(&input, &factors, ConfidenceTier::Low)
            .is_empty()
    );
}

#[test]
fn question_limit_is_configurable() {
    let config = ConfidenceConfig {
        max_clarifying_questions: 2,
        ..ConfidenceConfig::default()
    };
    let scorer = ConfidenceScorer::new(config);
    let assessment = scorer.calculate_section_confidence(&sparse("s").with_ai_self_assessment(0.0));
    assert_eq!(assessment.clarifying_questions.unwrap().len(), 2);
}

#[test]
fn question_limit_never_exceeds_five() {
    let config = ConfidenceConfig {
        max_clarifying_questions: 10,
        ..ConfidenceConfig::default()
    };
    assert!(config.validate().is_err());

    let scorer = ConfidenceScorer::new(config);
    let input = sparse("s")
        .with_ai_self_assessment(0.0)
        .with_pattern_match(0.0);
    let assessment = scorer.calculate_section_confidence(&input);
    assert_eq!(assessment.tier, ConfidenceTier::Low);
    assert_eq!(assessment.clarifying_questions.unwrap().len(), 5);
}

#[test]
fn confident_self_assessment_is_not_questioned() {
    let scorer = ConfidenceScorer::default();
    let input = sparse("s")
        .with_ai_self_assessment(0.9)
        .with_pattern_match(0.0);
    // 0 + 0.36 + 0 = 36, low tier
    let assessment = scorer.calculate_section_confidence(&input);
    assert_eq!(assessment.tier, ConfidenceTier::Low);
    let questions = assessment.clarifying_questions.unwrap();
    assert!(!questions.is_empty());
    assert!(questions.iter().all(|q| !q.contains("uncertain")));
}

#[test]
fn weights_are_normalized() {
    let config = ConfidenceConfig {
        weights: ConfidenceWeights {
            input_completeness: 0.0,
            ai_self_assessment: 2.0,
            pattern_match: 2.0,
        },
        ..ConfidenceConfig::default()
    };
    let scorer = ConfidenceScorer::new(config);
    let input = sparse("s").with_ai_self_assessment(0.9).with_pattern_match(0.7);
    assert_eq!(scorer.calculate_section_confidence(&input).score, 80);
}

#[test]
fn thresholds_come_from_config() {
    let config = ConfidenceConfig {
        warning_threshold: 90,
        error_threshold: 80,
        ..ConfidenceConfig::default()
    };
    let scorer = ConfidenceScorer::new(config);
    assert_eq!(scorer.tier_for(85), ConfidenceTier::Medium);
    assert_eq!(scorer.tier_for(75), ConfidenceTier::Low);
    assert!(scorer.needs_review(89));
}

#[test]
fn aggregate_takes_the_mean() {
    let scorer = ConfidenceScorer::default();
    let strong = scorer.calculate_section_confidence(
        &sparse("strong")
            .with_description("d")
            .with_example("e")
            .with_constraint("c")
            .with_context("x")
            .with_ai_self_assessment(1.0)
            .with_pattern_match(1.0),
    );
    let weak = scorer.calculate_section_confidence(
        &sparse("weak").with_ai_self_assessment(0.0).with_pattern_match(0.0),
    );
    assert_eq!(strong.score, 100);
    assert_eq!(weak.score, 0);

    let aggregate = scorer.aggregate_confidence(&[strong, weak]);
    assert_eq!(aggregate.score, 50);
    assert_eq!(aggregate.tier, ConfidenceTier::Medium);
    assert!(aggregate.needs_review);
    assert_eq!(aggregate.section_count, 2);
    assert_eq!(aggregate.low_sections, vec!["weak"]);
}
