use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use kotlite::{parse, EvaluationContext, InterpreterConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Run a script: declarations first, then `main()`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Script to run
    path: PathBuf,

    /// JSON file with interpreter settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the loop iteration cap from the config
    #[arg(long)]
    iteration_limit: Option<usize>,

    /// Overrides the call depth cap from the config
    #[arg(long)]
    call_depth_limit: Option<usize>,

    /// Print the parsed tree to stderr before running
    #[arg(long)]
    dump_ast: bool,
}

fn load_config(args: &Args) -> anyhow::Result<InterpreterConfig> {
    let config = match &args.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config {}", path.display()))?;
            InterpreterConfig::from_json_str(&source)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => InterpreterConfig::default(),
    };

    let config = match args.iteration_limit {
        Some(limit) => config.with_iteration_limit(limit),
        None => config,
    };
    Ok(match args.call_depth_limit {
        Some(limit) => config.with_call_depth_limit(limit),
        None => config,
    })
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::builder()
            .with_default_directive(LevelFilter::ERROR.into())
            .from_env_lossy())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let source = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Could not read {}", args.path.display()))?;

    let parsed = parse(&source);
    for error in &parsed.errors {
        eprintln!("{}", error);
    }
    if args.dump_ast {
        eprintln!("{:#?}", parsed.script);
    }

    let mut context = EvaluationContext::stdio().with_config(config);
    match context.evaluate_script(&parsed.script) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            eprintln!("{}: {}", error.name(), error);
            Ok(ExitCode::FAILURE)
        }
    }
}
