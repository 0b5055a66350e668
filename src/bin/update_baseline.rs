//! Baseline promotion CLI
//!
//! Usage:
//!   cargo run --bin update-baseline                  # Promote every scenario's latest run
//!   cargo run --bin update-baseline -- camera-pan    # Promote one scenario

use std::env;

use visreg::baseline::BaselineStore;
use visreg::compare::select_scenarios;
use visreg::settings::{HarnessSettings, init_logging};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match HarnessSettings::from_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: update-baseline [scenario] [--baselines <dir>] [--staging <dir>]");
            std::process::exit(1);
        }
    };
    init_logging(cli.verbose);

    let settings = cli.settings;
    let names = match select_scenarios(&settings, cli.positional.first().map(String::as_str)) {
        Ok(names) => names,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let store = BaselineStore::new(&settings.baseline_root);
    let mut total = 0;
    let mut failures = 0;

    for name in &names {
        match store.promote(&settings.staging_root, name) {
            Ok(summary) => {
                let created = if summary.created_dir { " (new baseline)" } else { "" };
                println!("  {}: {} file(s) updated{}", name, summary.updated.len(), created);
                for file in &summary.updated {
                    println!("    {}", file);
                }
                if !summary.stale.is_empty() {
                    println!("    kept stale: {}", summary.stale.join(", "));
                }
                total += summary.updated.len();
            }
            Err(e) => {
                println!("  {}: FAILED [{}]", name, e.kind());
                println!("    {}", e);
                failures += 1;
            }
        }
    }

    println!(
        "\nUpdated {} file(s) in {}",
        total,
        store.root().display()
    );

    if failures > 0 {
        std::process::exit(1);
    }
}
