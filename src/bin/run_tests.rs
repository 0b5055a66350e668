//! Scenario runner CLI
//!
//! Usage:
//!   cargo run --bin run-tests                     # Run every scenario
//!   cargo run --bin run-tests -- camera-pan       # Run one scenario by name
//!   cargo run --bin run-tests -- --staging /tmp/x # Write captures elsewhere
//!   cargo run --bin run-tests -- --verbose        # Debug logging

use std::env;

use visreg::settings::{HarnessSettings, init_logging};
use visreg::testing::{TestResult, load_scenarios, run_test};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match HarnessSettings::from_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: run-tests [scenario] [--scenarios <dir>] [--staging <dir>] [-v]");
            std::process::exit(1);
        }
    };
    init_logging(cli.verbose);

    let settings = cli.settings;
    let filter = cli.positional.first().cloned();

    println!("Scenario Runs");
    println!("=============\n");

    if !settings.scenarios_dir.exists() {
        println!(
            "No scenarios directory found at {}",
            settings.scenarios_dir.display()
        );
        std::process::exit(1);
    }

    let scenarios = load_scenarios(&settings.scenarios_dir, filter.as_deref());
    if scenarios.is_empty() {
        println!("No scenario files found.");
        if let Some(f) = filter {
            println!("Filter: {}", f);
        }
        std::process::exit(1);
    }

    let mut passed = 0;
    let mut failed = 0;

    for loaded in &scenarios {
        let scenario = match &loaded.scenario {
            Ok(scenario) => scenario,
            Err(e) => {
                print_failure(&loaded.name, e.kind(), &e.to_string());
                println!("    in {}", loaded.path.display());
                failed += 1;
                continue;
            }
        };

        let result = run_test(scenario, &settings);
        match &result {
            TestResult::Pass { frames, captures } => {
                let dots = ".".repeat(40 - loaded.name.len().min(39));
                println!(
                    "  {} {} PASS ({} frames, {} captures)",
                    loaded.name, dots, frames, captures
                );
                passed += 1;
            }
            TestResult::Fail { error } => {
                print_failure(&loaded.name, error.kind(), &error.to_string());
                failed += 1;
            }
        }
    }

    println!("\n=============");
    println!("Results: {} ran, {} failed", passed, failed);
    println!("Captures written to {}", settings.staging_root.display());

    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_failure(name: &str, kind: &str, message: &str) {
    let dots = ".".repeat(40 - name.len().min(39));
    println!("  {} {} FAIL [{}]", name, dots, kind);
    println!("    {}", message);
}
