/// Session Linter — checks a saved session snapshot for broken references.
///
/// Usage: session_linter <snapshot.ron | dir> [--strict]
///
/// Exits with status 1 when any snapshot has errors, or warnings under `--strict`.

use narrative_graph::core::pipeline::SessionSnapshot;
use narrative_graph::core::validation::ValidationReport;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: session_linter <snapshot.ron | dir> [--strict]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let strict = args[2..].iter().any(|a| a == "--strict");

    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else if target.is_dir() {
        let mut files = Vec::new();
        collect_ron_files(target, &mut files);
        files.sort();
        files
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        println!("\n=== {} ===\n", file.display());
        let snapshot = match SessionSnapshot::load_from_ron(file) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                println!("ERROR: Failed to load snapshot: {}", e);
                total_errors += 1;
                continue;
            }
        };
        let report = snapshot.validation_report();
        print_report(&snapshot, &report);
        total_errors += report.errors().count();
        total_warnings += report.warnings().count();
    }

    println!(
        "\nSummary: {} file(s), {} errors, {} warnings",
        files.len(),
        total_errors,
        total_warnings
    );

    if total_errors > 0 || (strict && total_warnings > 0) {
        process::exit(1);
    }
}

fn print_report(snapshot: &SessionSnapshot, report: &ValidationReport) {
    println!(
        "Story '{}': {} elements, {} plot points, {} events",
        snapshot.story.title,
        snapshot.story.elements.len(),
        snapshot.story.plot_points.len(),
        snapshot.story.timeline.events.len()
    );
    println!(
        "Level '{}': {}x{}, {} points of interest, {} connections",
        snapshot.level.name,
        snapshot.level.width(),
        snapshot.level.height(),
        snapshot.level.points_of_interest.len(),
        snapshot.level.connections.len()
    );
    println!("Quests: {}\n", snapshot.quests.len());

    if report.is_empty() {
        println!("All checks passed!");
        return;
    }
    for warning in report.warnings() {
        println!("{}", warning);
    }
    for error in report.errors() {
        println!("{}", error);
    }
}

fn collect_ron_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("WARNING: Cannot read directory '{}': {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_ron_files(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
}
