use plan_core::confidence::SectionInput;
use plan_core::persistence::{self, InMemoryEstimationStore};
use plan_core::{
    ComplexityBand, ConfidenceScorer, DependencyGraph, EstimationCalibrator, PlanAnalyzer,
    PlanningConfig, WorkItem,
};
use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

struct Session {
    config: PlanningConfig,
    items: Vec<WorkItem>,
    store: Arc<InMemoryEstimationStore>,
}

impl Session {
    fn calibrator(&self) -> EstimationCalibrator<Arc<InMemoryEstimationStore>> {
        EstimationCalibrator::new(self.store.clone(), self.config.estimation.clone())
    }

    fn graph(&self) -> Result<DependencyGraph, plan_core::GraphError> {
        let mut graph = DependencyGraph::from_config(&self.config.dependency);
        graph.add_items(self.items.clone())?;
        Ok(graph)
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if ci < widths.len() && cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str).take(widths.len())));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_items(items: &[WorkItem]) -> String {
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            let deps = item
                .dependencies
                .iter()
                .map(|d| format!("{}:{}", d.kind, d.target))
                .collect::<Vec<_>>()
                .join(",");
            vec![
                item.id.clone(),
                item.title.clone(),
                item.complexity.to_string(),
                item.status.as_str().to_string(),
                deps,
            ]
        })
        .collect();
    render_table(&["id", "title", "complexity", "status", "dependencies"], &rows)
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  items load <json>                  Load work items from a JSON array\n  items show                         Show loaded work items\n  implicit [threshold]               Infer implicit dependencies\n  analyze                            Order, critical path, cycles, parallel groups\n  plan [record]                      Full planning pass (record: store estimates)\n  estimate <complexity>              Calibrated estimate for a complexity 1-10\n  record <id> <points> <band>        Record a pending estimate (band low|medium|high)\n  actual <id> <points>               Record the actual effort of an item\n  calibration                        Show per-band calibration factors\n  history save <json|csv> <path>     Export estimation history\n  history load <json|csv> <path>     Replace estimation history from a file\n  config load <json>                 Load planning configuration\n  config show                        Print the active configuration\n  confidence <id> <ai> <pattern> [description...]\n                                     Score one section\n  quit|exit                          Exit"
    );
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_items(path: &str) -> Result<Vec<WorkItem>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    serde_json::from_reader(file).map_err(|e| e.to_string())
}

fn main() {
    init_tracing();

    let mut session = Session {
        config: PlanningConfig::default(),
        items: Vec::new(),
        store: Arc::new(InMemoryEstimationStore::new()),
    };

    println!("Plan Core (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "items" => match (parts.next(), parts.next()) {
                (Some("load"), Some(path)) => match load_items(path) {
                    Ok(items) => {
                        let mut graph = DependencyGraph::from_config(&session.config.dependency);
                        match graph.add_items(items.clone()) {
                            Ok(()) => {
                                println!("Loaded {} item(s).", items.len());
                                session.items = items;
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                },
                (Some("show"), _) => println!("{}", render_items(&session.items)),
                _ => println!("Usage: items load <json> | items show"),
            },
            "implicit" => {
                let threshold = match parts.next() {
                    Some(s) => match s.parse::<f64>() {
                        Ok(v) => v,
                        Err(_) => {
                            println!("Invalid threshold");
                            continue;
                        }
                    },
                    None => session.config.dependency.implicit_threshold,
                };
                match session.graph() {
                    Ok(mut graph) => {
                        let added = graph.detect_implicit_dependencies(threshold);
                        println!("Implicit dependencies: {}", added.len());
                        for edge in &added {
                            println!(
                                "  {} -> {} ({}, {:.2})",
                                edge.from,
                                edge.to,
                                edge.pattern().unwrap_or("-"),
                                edge.strength().unwrap_or(0.0)
                            );
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "analyze" => match session.graph() {
                Ok(mut graph) => {
                    graph.detect_implicit_dependencies(session.config.dependency.implicit_threshold);
                    let result = graph.analyze();
                    println!("Analyzed ({})", result.to_cli_summary());
                    println!("order: {}", result.execution_order.join(", "));
                    for (depth, group) in result.parallel_groups.iter().enumerate() {
                        println!("group {}: {}", depth, group.join(", "));
                    }
                    for cycle in &result.cycles {
                        println!("cycle: {}", cycle.join(" -> "));
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            "plan" => {
                let record = parts.next() == Some("record");
                let planner = PlanAnalyzer::new(session.config.clone(), session.store.clone());
                match planner.analyze(session.items.clone()) {
                    Ok(report) => {
                        println!("Planned ({})", report.to_cli_summary());
                        let rows: Vec<Vec<String>> = report
                            .estimates
                            .iter()
                            .map(|e| {
                                vec![
                                    e.item_id.clone(),
                                    e.complexity.to_string(),
                                    e.estimate.points.to_string(),
                                    format!("{}-{}", e.estimate.range.low, e.estimate.range.high),
                                    format!("{:.2}", e.estimate.confidence),
                                ]
                            })
                            .collect();
                        println!(
                            "{}",
                            render_table(&["id", "complexity", "points", "range", "confidence"], &rows)
                        );
                        if record {
                            match planner.record_estimates(&report) {
                                Ok(n) => println!("Recorded {} estimate(s).", n),
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "estimate" => match parts.next().map(str::parse::<u8>) {
                Some(Ok(complexity)) => {
                    let estimate = session.calibrator().estimate(complexity);
                    println!(
                        "points={} range={}-{} band={} factor={:.2} calibrated={} confidence={:.2}",
                        estimate.points,
                        estimate.range.low,
                        estimate.range.high,
                        estimate.band,
                        estimate.factor,
                        estimate.calibrated,
                        estimate.confidence
                    );
                }
                Some(Err(_)) => println!("Invalid complexity"),
                None => println!("Usage: estimate <complexity>"),
            },
            "record" => match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(points_s), Some(band_s)) => {
                    let points: u32 = match points_s.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            println!("Invalid points");
                            continue;
                        }
                    };
                    let Ok(band) = band_s.parse::<ComplexityBand>() else {
                        println!("Invalid band (low|medium|high)");
                        continue;
                    };
                    match session.calibrator().record_estimate(id, points, band) {
                        Ok(()) => println!("Estimate recorded."),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: record <id> <points> <band>"),
            },
            "actual" => match (parts.next(), parts.next()) {
                (Some(id), Some(points_s)) => {
                    let points: u32 = match points_s.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            println!("Invalid points");
                            continue;
                        }
                    };
                    match session.calibrator().record_actual(id, points) {
                        Ok(true) => println!("Actual recorded."),
                        Ok(false) => println!("No pending estimate for {}", id),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: actual <id> <points>"),
            },
            "calibration" => {
                let rows: Vec<Vec<String>> = session
                    .calibrator()
                    .calibration_report()
                    .iter()
                    .map(|f| {
                        vec![
                            f.band.to_string(),
                            format!("{:.2}", f.factor),
                            f.sample_size.to_string(),
                            f.calibrated.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_table(&["band", "factor", "samples", "calibrated"], &rows)
                );
            }
            "history" => match (parts.next(), parts.next(), parts.next()) {
                (Some("save"), Some(format), Some(path)) => {
                    let res = match format {
                        "json" => persistence::save_history_to_json(&*session.store, path),
                        "csv" => persistence::save_history_to_csv(&*session.store, path),
                        _ => {
                            println!("Invalid format (json|csv)");
                            continue;
                        }
                    };
                    match res {
                        Ok(()) => println!("History saved ({} record(s)).", session.store.len()),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                (Some("load"), Some(format), Some(path)) => {
                    let res = match format {
                        "json" => persistence::load_history_from_json(path),
                        "csv" => persistence::load_history_from_csv(path),
                        _ => {
                            println!("Invalid format (json|csv)");
                            continue;
                        }
                    };
                    match res {
                        Ok(store) => {
                            println!("History loaded ({} record(s)).", store.len());
                            session.store = Arc::new(store);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: history <save|load> <json|csv> <path>"),
            },
            "config" => match (parts.next(), parts.next()) {
                (Some("load"), Some(path)) => match PlanningConfig::from_json_file(path) {
                    Ok(config) => {
                        session.config = config;
                        println!("Config loaded.");
                    }
                    Err(e) => println!("Error: {}", e),
                },
                (Some("show"), _) => match serde_json::to_string_pretty(&session.config) {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: config load <json> | config show"),
            },
            "confidence" => match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(ai_s), Some(pattern_s)) => {
                    let (ai, pattern) = match (ai_s.parse::<f64>(), pattern_s.parse::<f64>()) {
                        (Ok(ai), Ok(pattern)) => (ai, pattern),
                        _ => {
                            println!("Invalid signal (expected 0-1)");
                            continue;
                        }
                    };
                    let rest: Vec<&str> = parts.collect();
                    let mut section = SectionInput::new(id, id)
                        .with_ai_self_assessment(ai)
                        .with_pattern_match(pattern);
                    if !rest.is_empty() {
                        section = section.with_description(rest.join(" "));
                    }
                    let scorer = ConfidenceScorer::new(session.config.confidence.clone());
                    let assessment = scorer.calculate_section_confidence(&section);
                    println!(
                        "score={} tier={} review={}",
                        assessment.score, assessment.tier, assessment.needs_review
                    );
                    println!("{}", assessment.reasoning);
                    for question in assessment.clarifying_questions.iter().flatten() {
                        println!("  ? {}", question);
                    }
                }
                _ => println!("Usage: confidence <id> <ai> <pattern> [description...]"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
