use plan_core::KeywordExtractor;
use plan_core::work_item::WorkItem;

#[test]
fn catalog_is_ordered_by_category() {
    let extractor = KeywordExtractor::default();
    let names: Vec<&str> = extractor.catalog().iter().map(|p| p.name).collect();
    assert_eq!(
        names,
        vec![
            "infrastructure->interface",
            "data-model->interface",
            "interface->presentation",
            "design->implementation",
            "any->verification",
            "any->deployment",
        ]
    );
}

#[test]
fn matching_ignores_case() {
    let extractor = KeywordExtractor::default();
    let m = extractor.score("EXPOSE REST ENDPOINT", "provision the DATABASE");
    assert_eq!(m.pattern, Some("infrastructure->interface"));
    assert!((m.score - 0.80).abs() < 1e-9);
}

#[test]
fn extra_hits_raise_the_score_up_to_a_cap() {
    let extractor = KeywordExtractor::default();
    let single = extractor.score("Deploy", "Implement parser");
    let many = extractor.score(
        "Deploy and release",
        "Implement and test the api service, design the ui",
    );
    assert_eq!(single.pattern, Some("any->deployment"));
    assert!((single.score - 0.65).abs() < 1e-9);
    assert_eq!(many.pattern, Some("any->deployment"));
    assert!((many.score - 0.80).abs() < 1e-9);
}

#[test]
fn unrelated_texts_score_zero() {
    let extractor = KeywordExtractor::default();
    let m = extractor.score("Buy office chairs", "Plan the team offsite");
    assert_eq!(m.score, 0.0);
    assert!(m.pattern.is_none());
}

#[test]
fn item_scoring_reads_description_too() {
    let extractor = KeywordExtractor::default();
    let dependent = WorkItem::new("ui", "Account page", 3).with_description("frontend for login");
    let dependency = WorkItem::new("api", "Auth", 5).with_description("token endpoint");
    let m = extractor.score_items(&dependent, &dependency);
    assert_eq!(m.pattern, Some("interface->presentation"));
}
