// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2. This is
// the only layer that prints to stdout; everything else logs.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;

use crate::application::config::PrepareConfig;
use crate::application::prepare_use_case::PrepareUseCase;
use crate::application::scan_use_case::ScanUseCase;
use crate::data::normalizer::TextNormalizer;
use crate::infra::config_store::ConfigStore;
use commands::{Commands, InitConfigArgs, NormalizeArgs, PrepareArgs, ScanArgs};

#[derive(Parser, Debug)]
#[command(
    name = "corpus-prep",
    version,
    about = "Clean, deduplicate, split and merge dialogue and instruction corpora for fine-tuning."
)]
pub struct Cli {
    /// Default log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case for the chosen subcommand.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args)    => run_prepare(args),
            Commands::Scan(args)       => run_scan(args),
            Commands::Normalize(args)  => run_normalize(args),
            Commands::InitConfig(args) => run_init_config(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let mut config = ConfigStore::load(Path::new(&args.config))?;
    args.apply(&mut config);

    tracing::info!("Preparing corpus into '{}'", config.output.base_dir);
    let summary = PrepareUseCase::new(config).execute()?;

    println!("Preparation complete.");
    print!("{summary}");
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let outcome = ScanUseCase::new(&args.input, args.kind.into(), args.clean, args.verbose).execute()?;

    println!("Scanned {} records", outcome.records);
    println!("Issues: {}", outcome.before);
    if let (Some(after), Some(delta)) = (&outcome.after, outcome.delta()) {
        println!("After cleaning: {after}");
        for (kind, change) in delta {
            println!("  {kind:<20} {change:+}");
        }
    }
    Ok(())
}

fn run_normalize(args: NormalizeArgs) -> Result<()> {
    let normalizer = TextNormalizer::default();
    println!("{}", normalizer.normalize(&args.text, args.profile.into()));
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    let path = Path::new(&args.path);
    if path.exists() && !args.force {
        bail!("'{}' already exists (use --force to replace it)", path.display());
    }
    ConfigStore::save(&PrepareConfig::default(), path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
