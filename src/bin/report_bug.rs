//! Bug report CLI
//!
//! Usage:
//!   cargo run --bin report-bug -- camera-pan grid is offset after panning

use std::env;

use visreg::report::report_bug;
use visreg::settings::{HarnessSettings, init_logging};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match HarnessSettings::from_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(cli.verbose);

    let (scenario, words) = match cli.positional.split_first() {
        Some((scenario, words)) if !words.is_empty() => (scenario, words),
        _ => {
            eprintln!("Usage: report-bug <scenario> <description...>");
            std::process::exit(1);
        }
    };
    let description = words.join(" ");

    match report_bug(scenario, &description, &cli.settings) {
        Ok(path) => println!("Report written: {}", path.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
