//! Snapshot comparison CLI
//!
//! Usage:
//!   cargo run --bin compare                          # Compare every scenario
//!   cargo run --bin compare -- camera-pan            # Compare one scenario
//!   cargo run --bin compare -- --strategy perceptual --tolerance 2
//!   cargo run --bin compare -- --no-diff             # Skip diff images

use std::env;

use visreg::compare::{
    CompareOptions, ComparisonSummary, DiffOutcome, FileStatus, compare_all, select_scenarios,
};
use visreg::settings::{HarnessSettings, init_logging};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match HarnessSettings::from_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: compare [scenario] [--baselines <dir>] [--staging <dir>] [--strategy byte-exact|perceptual]");
            std::process::exit(1);
        }
    };
    init_logging(cli.verbose);

    let names = match select_scenarios(&cli.settings, cli.positional.first().map(String::as_str)) {
        Ok(names) => names,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if names.is_empty() {
        println!("No scenarios to compare.");
        std::process::exit(1);
    }

    let options = CompareOptions::from_settings(&cli.settings);
    let summary = ComparisonSummary::from_results(compare_all(&names, &options));

    for result in &summary.results {
        println!("{}", result.scenario);
        if result.missing_capture_dir {
            println!("  ✗ missing-capture-dir: no completed run in {}", options.staging_root.join(&result.scenario).display());
        }
        if result.missing_baseline_dir {
            println!(
                "  ✗ missing-baseline-dir: create it with `update-baseline {}`",
                result.scenario
            );
        }
        for file in &result.files {
            match &file.status {
                FileStatus::Matching => println!("  ✓ {}", file.filename),
                FileStatus::Different { diff } => {
                    let detail = match diff {
                        Some(DiffOutcome::Written(path)) => format!("diff: {}", path.display()),
                        Some(DiffOutcome::Unavailable(reason)) => format!("no diff: {}", reason),
                        None => String::new(),
                    };
                    println!("  ✗ {} different {}", file.filename, detail);
                }
                FileStatus::MissingBaseline => println!("  ✗ {} missing-baseline", file.filename),
                FileStatus::MissingCapture => {
                    println!("  - {} missing-capture (stale baseline)", file.filename)
                }
            }
        }
    }
    for (name, e) in &summary.errors {
        println!("{}", name);
        println!("  ✗ error: {}", e);
    }

    print!("{}", summary.format_table());

    if summary.passed() {
        println!("\nPASS");
    } else {
        println!("\nFAIL");
        std::process::exit(1);
    }
}
