//! Headless driver for the character-creation wizard.
//!
//! Reads one command per line on stdin and answers with tagged lines on
//! stdout, so a script or another program can walk the wizard:
//!
//! ```bash
//! cargo run -p sheet -- --seed 42 --save-dir ./sheets
//! ```

mod headless;

use std::path::PathBuf;

use sheet_core::WizardConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line options on top of the environment configuration.
struct Options {
    config: WizardConfig,
    resume: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = match WizardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let options = match parse_args(&args, config) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    // Logs go to stderr; stdout carries the protocol only.
    let filter = EnvFilter::try_new(&options.config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting sheet, saves in {}", options.config.save_dir.display());

    headless::run_headless(options.config, options.resume)
        .await
        .map_err(|e| e.into())
}

fn parse_args(args: &[String], mut config: WizardConfig) -> Result<Options, String> {
    let mut resume = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .cloned()
            .ok_or_else(|| format!("{flag} needs a value"));
        match flag {
            "--save-dir" => {
                config = config.with_save_dir(value?);
                i += 1;
            }
            "--seed" => {
                let raw = value?;
                let seed = raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("--seed expects a whole number, got '{raw}'"))?;
                config = config.with_roll_seed(seed);
                i += 1;
            }
            "--resume" => {
                resume = Some(PathBuf::from(value?));
                i += 1;
            }
            "--autosave" => {
                config = config.with_autosave(true);
            }
            other => return Err(format!("unknown option '{other}'")),
        }
        i += 1;
    }

    Ok(Options { config, resume })
}

fn print_help() {
    println!("sheet - guided character creation, driven line by line");
    println!();
    println!("USAGE:");
    println!("  sheet [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help          Show this help message");
    println!("  --save-dir <DIR>    Directory for saved sheets (default: sheets)");
    println!("  --seed <N>          Seed attribute rolls");
    println!("  --resume <FILE>     Start from a saved sheet");
    println!("  --autosave          Save after every accepted step");
    println!();
    println!("ENVIRONMENT:");
    println!("  SHEET_SAVE_DIR, SHEET_ROLL_SEED, SHEET_LOG, SHEET_AUTOSAVE");
    println!("  (a .env file is read first; flags override the environment)");
    println!();
    println!("Type #help once running for the line protocol.");
}
