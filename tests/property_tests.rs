use plan_core::config::ConfidenceConfig;
use plan_core::estimation::{ComplexityBand, EstimationCalibrator};
use plan_core::persistence::InMemoryEstimationStore;
use plan_core::{ConfidenceScorer, ConfidenceTier, DependencyGraph, SectionInput, WorkItem};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn build_items(n: usize, edges: &[(usize, usize)]) -> Vec<WorkItem> {
    let mut items: Vec<WorkItem> = (0..n)
        .map(|i| WorkItem::new(format!("n{i}"), format!("Step {i}"), 1))
        .collect();
    for &(from, to) in edges {
        if from != to {
            items[from] = items[from].clone().depends_on(format!("n{to}"));
        }
    }
    items
}

fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..30)))
}

fn arb_dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    arb_graph().prop_map(|(n, edges)| {
        let edges = edges
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.max(b), a.min(b)))
            .collect();
        (n, edges)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn execution_order_respects_every_acyclic_edge((n, edges) in arb_graph()) {
        let mut graph = DependencyGraph::new();
        graph.add_items(build_items(n, &edges)).unwrap();
        let result = graph.analyze();

        let position: HashMap<&str, usize> = result
            .execution_order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        prop_assert_eq!(position.len(), n);

        let cyclic: HashSet<&str> = result.cyclic_items.iter().map(String::as_str).collect();
        prop_assert_eq!(result.cycles.is_empty(), cyclic.is_empty());
        for edge in graph.edges() {
            if cyclic.contains(edge.from.as_str()) || cyclic.contains(edge.to.as_str()) {
                continue;
            }
            prop_assert!(position[edge.to.as_str()] < position[edge.from.as_str()]);
        }
    }

    #[test]
    fn reported_cycles_are_real((n, edges) in arb_graph()) {
        let mut graph = DependencyGraph::new();
        graph.add_items(build_items(n, &edges)).unwrap();
        let declared: HashSet<(String, String)> = graph
            .edges()
            .into_iter()
            .map(|e| (e.from, e.to))
            .collect();

        for cycle in graph.analyze().cycles {
            prop_assert!(cycle.len() >= 3);
            prop_assert_eq!(cycle.first(), cycle.last());
            for pair in cycle.windows(2) {
                prop_assert!(declared.contains(&(pair[0].clone(), pair[1].clone())));
            }
        }
    }

    #[test]
    fn dags_have_no_cycles_and_independent_groups((n, edges) in arb_dag()) {
        let mut graph = DependencyGraph::new();
        graph.add_items(build_items(n, &edges)).unwrap();
        let result = graph.analyze();

        prop_assert!(result.cycles.is_empty());
        prop_assert_eq!(result.execution_order.len(), n);
        for group in &result.parallel_groups {
            for a in group {
                for b in group {
                    prop_assert!(a == b || !graph.depends_on(a, b));
                }
            }
        }
    }

    #[test]
    fn re_registration_does_not_change_analysis((n, edges) in arb_graph()) {
        let items = build_items(n, &edges);
        let mut graph = DependencyGraph::new();
        graph.add_items(items.clone()).unwrap();
        let first = graph.analyze();
        graph.add_items(items).unwrap();
        prop_assert_eq!(first, graph.analyze());
    }

    #[test]
    fn calibration_converges_to_integer_ratio(
        estimated in 1u32..20,
        multiplier in 1u32..4,
        samples in 3usize..8,
    ) {
        let calibrator = EstimationCalibrator::with_defaults(InMemoryEstimationStore::new());
        for idx in 0..samples {
            let id = format!("item-{idx}");
            calibrator.record_estimate(id.as_str(), estimated, ComplexityBand::High).unwrap();
            calibrator.record_actual(&id, estimated * multiplier).unwrap();
        }
        let factor = calibrator.calibration_factor(ComplexityBand::High);
        prop_assert!(factor.calibrated);
        prop_assert!((factor.factor - f64::from(multiplier)).abs() < 1e-9);
        prop_assert_eq!(calibrator.estimate(10).points, 13 * multiplier);
    }

    #[test]
    fn confidence_is_monotonic_in_self_assessment(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        pattern in 0.0f64..=1.0,
        described in any::<bool>(),
    ) {
        let scorer = ConfidenceScorer::new(ConfidenceConfig::default());
        let mut input = SectionInput::new("s", "Section").with_pattern_match(pattern);
        if described {
            input = input.with_description("text");
        }
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let low = scorer.calculate_section_confidence(&input.clone().with_ai_self_assessment(lo));
        let high = scorer.calculate_section_confidence(&input.with_ai_self_assessment(hi));
        prop_assert!(low.score <= high.score);
    }

    #[test]
    fn clarifying_questions_are_bounded(
        ai in prop::option::of(0.0f64..=1.0),
        pattern in prop::option::of(0.0f64..=1.0),
        described in any::<bool>(),
        examples in 0usize..3,
    ) {
        let scorer = ConfidenceScorer::default();
        let mut input = SectionInput::new("s", "Section");
        input.ai_self_assessment = ai;
        input.pattern_match = pattern;
        if described {
            input = input.with_description("text");
        }
        for idx in 0..examples {
            input = input.with_example(format!("example {idx}"));
        }
        let assessment = scorer.calculate_section_confidence(&input);
        match assessment.clarifying_questions {
            Some(questions) => {
                prop_assert_eq!(assessment.tier, ConfidenceTier::Low);
                prop_assert!(questions.len() <= 5);
            }
            None => prop_assert_ne!(assessment.tier, ConfidenceTier::Low),
        }
    }
}
