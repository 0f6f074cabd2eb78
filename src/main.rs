//! frame-bounds - Decorative frame detection for RGBA artwork
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use frame_bounds::{
    // Batch
    process_all, LineSink, PathSource,
    // CLI
    Cli, Commands, DetectArgs, ExitCode, ShowConfigArgs,
    // Config
    Config, ConfigError,
};
use tracing_subscriber::EnvFilter;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Detect(args) => args.verbose,
        Commands::ShowConfig(_) => 0,
    };
    init_tracing(verbose);

    let result = match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::ShowConfig(args) => run_show_config(&args),
    };

    match result {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e).into()
        }
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over `-v` flags
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Invalid configuration values map to InvalidArgs, everything else is general
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<ConfigError>() {
        Some(ConfigError::Invalid(_)) => ExitCode::InvalidArgs,
        _ => ExitCode::GeneralError,
    }
}

fn run_detect(args: &DetectArgs) -> anyhow::Result<ExitCode> {
    let missing: Vec<_> = args.images.iter().filter(|p| !p.exists()).collect();
    if !missing.is_empty() {
        for path in &missing {
            eprintln!("Input not found: {}", path.display());
        }
        return Ok(ExitCode::InputNotFound);
    }

    let file_config = Config::resolve(args.config.as_deref()).context("loading configuration")?;
    let options = file_config.merge_with_cli(&args.overrides())?;
    tracing::debug!(?options, "effective options");

    let mut source = PathSource::new(args.images.iter().cloned());
    let mut sink = LineSink::new(std::io::stdout().lock());
    let report = process_all(&mut source, &mut sink, &options).context("writing results")?;

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "processed {} image(s)",
        report.total()
    );

    Ok(if report.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::ProcessingError
    })
}

fn run_show_config(args: &ShowConfigArgs) -> anyhow::Result<ExitCode> {
    let file_config = Config::resolve(args.config.as_deref()).context("loading configuration")?;
    let options = file_config.to_options()?;

    let toml = Config::from_options(&options)
        .to_toml()
        .context("serializing configuration")?;
    print!("{toml}");

    Ok(ExitCode::Success)
}
