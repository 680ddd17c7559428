//! Schemy CLI.
//!
//! `schemy FILE` evaluates a file and prints its final value; with no
//! file (or a path that does not exist) it runs the REPL on stdin/stdout.
//! Before either mode, `./.init.ss` is evaluated into the interpreter if
//! present.

mod config;

use clap::Parser;
use config::ReplConfig;
use schemy::{Interpreter, Value};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "schemy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Embeddable Scheme-dialect interpreter", long_about = None)]
struct Args {
    /// Source file to evaluate (runs the REPL if not given)
    file: Option<PathBuf>,

    /// Skip loading ./.init.ss
    #[arg(long)]
    no_init: bool,

    /// Configuration file (defaults to ./schemy.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config_path = args.config.clone().unwrap_or_else(|| PathBuf::from("schemy.toml"));
    let config = ReplConfig::load(&config_path)?;

    let interp = Interpreter::new();

    if !args.no_init && config.load_init_script {
        load_init_script(&interp, Path::new(".init.ss"))?;
    }

    match &args.file {
        Some(file) if file.exists() => run_file(&interp, file),
        _ => run_repl(&interp, &config),
    }
}

/// Evaluate an init script and print a confirmation line.
fn load_init_script(interp: &Interpreter, path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    debug!(path = %path.display(), "loading init script");
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    match interp.evaluate(BufReader::new(file)) {
        Ok(_) => {
            println!("Loaded {}", path.display());
            Ok(())
        }
        Err(e) => Err(format!("{}: {e}", path.display())),
    }
}

/// Evaluate `path` to exhaustion and print the final value, if any.
fn run_file(interp: &Interpreter, path: &Path) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    match interp.evaluate(BufReader::new(file)) {
        Ok(Some(value)) if !matches!(value, Value::None) => {
            println!("{value}");
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

fn run_repl(interp: &Interpreter, config: &ReplConfig) -> Result<(), String> {
    let banner = format!("schemy {}", env!("CARGO_PKG_VERSION"));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    interp
        .repl(
            stdin.lock(),
            &mut stdout,
            Some(&config.prompt),
            config.banner.then_some(banner.as_str()),
        )
        .map_err(|e| e.to_string())
}
