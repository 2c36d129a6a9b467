use super::{ConfidenceFactors, Factor, SectionInput};

/// Walks the factors weakest first and asks about each one scoring below
/// `cutoff`, stopping at `limit` questions. When no factor is below the
/// cutoff only the weakest factor that has a question is asked about.
pub(super) fn for_weakest_factors(
    input: &SectionInput,
    factors: &ConfidenceFactors,
    cutoff: f64,
    limit: usize,
) -> Vec<String> {
    let name = section_label(input);
    let ranked = factors.weakest_first();
    let weak: Vec<Factor> = ranked
        .iter()
        .filter(|(_, value)| *value < cutoff)
        .map(|(factor, _)| *factor)
        .collect();
    if weak.is_empty() {
        return ranked
            .iter()
            .map(|(factor, _)| questions_for(*factor, input, &name))
            .find(|questions| !questions.is_empty())
            .map(|questions| questions.into_iter().take(limit).collect())
            .unwrap_or_default();
    }

    let mut questions: Vec<String> = Vec::new();
    for factor in weak {
        for question in questions_for(factor, input, &name) {
            if questions.len() >= limit {
                return questions;
            }
            if !questions.contains(&question) {
                questions.push(question);
            }
        }
    }
    questions
}

fn section_label(input: &SectionInput) -> String {
    if input.section_name.trim().is_empty() {
        format!("section {}", input.section_id)
    } else {
        format!("the {} section", input.section_name)
    }
}

fn questions_for(factor: Factor, input: &SectionInput, name: &str) -> Vec<String> {
    match factor {
        Factor::InputCompleteness => {
            let mut missing = Vec::new();
            if !input.has_description() {
                missing.push(format!("Can you describe what {name} should cover?"));
            }
            if !input.has_examples() {
                missing.push(format!("Can you give an example of the expected content for {name}?"));
            }
            if !input.has_constraints() {
                missing.push(format!(
                    "Are there technical, budget or timeline constraints that apply to {name}?"
                ));
            }
            if !input.has_context() {
                missing.push(format!("What background should inform {name}?"));
            }
            missing
        }
        Factor::PatternMatch => vec![format!(
            "Should {name} follow a known structure or template?"
        )],
        Factor::AiSelfAssessment => vec![format!(
            "Which parts of {name} are uncertain and need confirmation?"
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weakest_factor_drives_first_question() {
        let input = SectionInput::new("s1", "Scope")
            .with_description("d")
            .with_example("e")
            .with_constraint("c")
            .with_context("x");
        let factors = ConfidenceFactors {
            input_completeness: 1.0,
            ai_self_assessment: 0.6,
            pattern_match: 0.1,
        };
        let questions = for_weakest_factors(&input, &factors, 0.5, 5);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].contains("structure or template"));
    }

    #[test]
    fn strong_factors_are_not_asked_about() {
        let input = SectionInput::new("s1", "Scope").with_description("d");
        let factors = ConfidenceFactors {
            input_completeness: 0.25,
            ai_self_assessment: 0.9,
            pattern_match: 0.2,
        };
        let questions = for_weakest_factors(&input, &factors, 0.5, 5);
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| !q.contains("uncertain")));
    }

    #[test]
    fn falls_back_to_weakest_factor_above_cutoff() {
        let input = SectionInput::new("s1", "Scope")
            .with_description("d")
            .with_example("e")
            .with_constraint("c")
            .with_context("x");
        let factors = ConfidenceFactors {
            input_completeness: 1.0,
            ai_self_assessment: 0.7,
            pattern_match: 0.6,
        };
        let questions = for_weakest_factors(&input, &factors, 0.5, 5);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].contains("structure or template"));
    }

    #[test]
    fn respects_limit() {
        let input = SectionInput::new("s1", "Scope");
        let factors = ConfidenceFactors {
            input_completeness: 0.0,
            ai_self_assessment: 0.1,
            pattern_match: 0.1,
        };
        assert_eq!(for_weakest_factors(&input, &factors, 0.5, 3).len(), 3);
        assert_eq!(for_weakest_factors(&input, &factors, 0.5, 5).len(), 5);
        assert!(for_weakest_factors(&input, &factors, 0.5, 0).is_empty());
    }
}
