/// Preview — interactive shell for generating and poking at a session.
///
/// Usage: preview [--config <path>] [--seed <n>] [--width <n>] [--height <n>]
///
/// Commands:
///   generate <difficulty> <title...>  — build a story-driven level
///   map                               — print the level as ASCII
///   story                             — list elements, plot points and the timeline
///   quests                            — list every quest with its objectives
///   start <quest#>                    — move a quest to Active
///   complete <quest#> <objective#>    — complete an objective
///   report                            — print the session validation report
///   variations                        — print alternative layouts
///   save <path>                       — write the session snapshot as RON
///   seed <n>                          — start a fresh session with a new seed
///   help                              — list commands
///   quit                              — exit

use narrative_graph::core::config::SessionConfig;
use narrative_graph::core::pipeline::NarrativeGenerator;
use narrative_graph::schema::quest::QuestState;
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let mut config_path = None;
    let mut seed = None;
    let mut width = None;
    let mut height = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().ok();
            }
            "--width" if i + 1 < args.len() => {
                i += 1;
                width = args[i].parse().ok();
            }
            "--height" if i + 1 < args.len() => {
                i += 1;
                height = args[i].parse().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(ref path) => match SessionConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => SessionConfig {
            width: 32,
            height: 16,
            ..SessionConfig::default()
        },
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let (Some(w), Some(h)) = (width, height) {
        config.width = w;
        config.height = h;
    }

    let mut session = match build_session(config.clone()) {
        Some(session) => session,
        None => std::process::exit(1),
    };

    println!("Grid: {}x{}, seed: {}", config.width, config.height, config.seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "generate" => {
                if parts.len() < 3 {
                    println!("Usage: generate <difficulty> <title...>");
                    continue;
                }
                let difficulty: i32 = match parts[1].parse() {
                    Ok(d) => d,
                    Err(_) => {
                        println!("Invalid difficulty: {}", parts[1]);
                        continue;
                    }
                };
                let title = parts[2..].join(" ");
                session = match build_session(config.clone()) {
                    Some(s) => s,
                    None => continue,
                };
                match session.generate_story_driven_level(&title, "", difficulty) {
                    Some(main) => {
                        println!("Generated '{}' (main quest {})", title, main);
                        print_summary(&session);
                    }
                    None => println!("Generation stopped early; the session is partial."),
                }
            }
            "map" => {
                println!("{}", session.level().render_ascii());
            }
            "story" => {
                print_story(&session);
            }
            "quests" => {
                print_quests(&session);
            }
            "start" => {
                let Some(quest_id) = parts.get(1).and_then(|n| quest_at(&session, n)) else {
                    println!("Usage: start <quest#>");
                    continue;
                };
                match session
                    .quest_generator_mut()
                    .transition(quest_id, QuestState::Active)
                {
                    Ok(()) => println!("Quest started."),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "complete" => {
                let quest_id = parts.get(1).and_then(|n| quest_at(&session, n));
                let index: Option<usize> = parts.get(2).and_then(|n| n.parse().ok());
                let (Some(quest_id), Some(index)) = (quest_id, index) else {
                    println!("Usage: complete <quest#> <objective#>");
                    continue;
                };
                let objective = session
                    .quest_generator()
                    .quest(quest_id)
                    .and_then(|q| q.objectives.get(index.wrapping_sub(1)))
                    .map(|o| o.id);
                let Some(objective) = objective else {
                    println!("No objective #{} on that quest", index);
                    continue;
                };
                if session
                    .quest_generator_mut()
                    .complete_objective(quest_id, objective)
                {
                    let state = session
                        .quest_generator()
                        .quest(quest_id)
                        .map(|q| q.state.name())
                        .unwrap_or("?");
                    println!("Objective completed. Quest is now {}.", state);
                } else {
                    println!("Objective not found.");
                }
            }
            "report" => {
                print_report(&session);
            }
            "variations" => {
                let variations = session.layout_variations();
                for (n, layout) in variations.iter().enumerate() {
                    println!("--- Variation {} ---", n + 1);
                    println!("{}", layout.render_ascii());
                }
                if variations.is_empty() {
                    println!("No variations configured.");
                }
            }
            "save" => {
                if parts.len() < 2 {
                    println!("Usage: save <path>");
                    continue;
                }
                match session.snapshot().save_to_ron(Path::new(parts[1])) {
                    Ok(()) => println!("Saved to {}", parts[1]),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", config.seed);
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        config.seed = s;
                        if let Some(fresh) = build_session(config.clone()) {
                            session = fresh;
                            println!("Seed set to {}. Session cleared.", s);
                        }
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn build_session(config: SessionConfig) -> Option<NarrativeGenerator> {
    match NarrativeGenerator::builder().with_config(config).build() {
        Ok(session) => Some(session),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            None
        }
    }
}

/// Quests are addressed by their 1-based position in the quest log.
fn quest_at(
    session: &NarrativeGenerator,
    number: &str,
) -> Option<narrative_graph::schema::ids::QuestId> {
    let n: usize = number.parse().ok()?;
    session.all_quests().get(n.checked_sub(1)?).map(|q| q.id)
}

fn print_summary(session: &NarrativeGenerator) {
    let story = session.story();
    println!(
        "  {} elements, {} plot points, {} timeline events, {} branches",
        story.elements.len(),
        story.plot_points.len(),
        story.timeline.events.len(),
        story.timeline.branches.len()
    );
    println!(
        "  {} points of interest, {} connections",
        session.level().points_of_interest.len(),
        session.level().connections.len()
    );
    println!(
        "  {} quests ({} available)",
        session.all_quests().len(),
        session.quests().len()
    );
}

fn print_story(session: &NarrativeGenerator) {
    let story = session.story();
    println!("\n=== {} ===", story.title);
    if !story.synopsis.is_empty() {
        println!("{}", story.synopsis);
    }
    println!("\nElements:");
    for element in &story.elements {
        println!("  [{}] {} — {}", element.kind.name(), element.name, element.description);
    }
    println!("\nPlot:");
    for point in session.story_generator().plot_points_in_order() {
        println!("  {}. {}", point.order + 1, point.title);
    }
    println!("\nTimeline (no branch conditions):");
    for event in story.timeline.resolve(&FxHashSet::default()) {
        let title = session
            .story_generator()
            .plot_point(event.plot_point_id)
            .map(|p| p.title.as_str())
            .unwrap_or("<missing>");
        println!("  t={:<5} {}", event.timestamp, title);
    }
    for branch in &story.timeline.branches {
        println!(
            "  if '{}': {} alternative event(s)",
            branch.condition,
            branch.alternative_events.len()
        );
    }
    println!();
}

fn print_quests(session: &NarrativeGenerator) {
    if session.all_quests().is_empty() {
        println!("No quests. Use 'generate' first.");
        return;
    }
    for (n, quest) in session.all_quests().iter().enumerate() {
        let (done, total) = quest.required_progress();
        println!(
            "{}. {} [{:?}, {}, difficulty {}] {}/{}",
            n + 1,
            quest.title,
            quest.kind,
            quest.state.name(),
            quest.difficulty,
            done,
            total
        );
        for (m, objective) in quest.objectives.iter().enumerate() {
            let location = objective
                .location
                .and_then(|id| session.level().poi(id))
                .map(|p| format!(" @ {} ({}, {})", p.name, p.position.x, p.position.y))
                .unwrap_or_default();
            println!(
                "   {}.{} [{}] {}{}{}",
                n + 1,
                m + 1,
                if objective.completed { "x" } else { " " },
                objective.description,
                if objective.optional { " (optional)" } else { "" },
                location
            );
        }
    }
}

fn print_report(session: &NarrativeGenerator) {
    let report = session.validation_report();
    if report.is_empty() {
        println!("All checks passed!");
        return;
    }
    for issue in report.warnings() {
        println!("{}", issue);
    }
    for issue in report.errors() {
        println!("{}", issue);
    }
    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors().count(),
        report.warnings().count()
    );
}

fn print_usage() {
    println!("Usage: preview [--config <path>] [--seed <n>] [--width <n>] [--height <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  generate <difficulty> <title...>  — build a story-driven level");
    println!("  map                               — print the level as ASCII");
    println!("  story                             — list elements, plot points and the timeline");
    println!("  quests                            — list every quest with its objectives");
    println!("  start <quest#>                    — move a quest to Active");
    println!("  complete <quest#> <objective#>    — complete an objective");
    println!("  report                            — print the session validation report");
    println!("  variations                        — print alternative layouts");
    println!("  save <path>                       — write the session snapshot as RON");
    println!("  seed <n>                          — start a fresh session with a new seed");
    println!("  help                              — list commands");
    println!("  quit                              — exit");
}
