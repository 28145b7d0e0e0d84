// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Four subcommands:
//
//   prepare      run the whole pipeline from a config file
//   scan         audit a canonical JSON file
//   normalize    clean one piece of text and print it
//   init-config  write the default config
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::config::PrepareConfig;
use crate::application::scan_use_case::RecordKind;
use crate::data::normalizer::Profile;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, clean, deduplicate, split and merge all configured sources
    Prepare(PrepareArgs),

    /// Count text quality issues in a canonical JSON file
    Scan(ScanArgs),

    /// Print the normalized form of a piece of text
    Normalize(NormalizeArgs),

    /// Write the default configuration file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Pipeline configuration (JSON)
    #[arg(long, default_value = "config/prepare.json")]
    pub config: String,

    /// Override output.base_dir
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Override splitting.random_state
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log every scan hit with its text
    #[arg(long)]
    pub verbose_scan: bool,

    /// Skip the before/after issue scans
    #[arg(long, conflicts_with = "verbose_scan")]
    pub no_scan: bool,
}

impl PrepareArgs {
    /// Apply command line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut PrepareConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.base_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.splitting.random_state = seed;
        }
        if self.verbose_scan {
            config.scanning.verbose = true;
        }
        if self.no_scan {
            config.scanning.enabled = false;
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Dialogue,
    Instruction,
}

impl From<KindArg> for RecordKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Dialogue    => RecordKind::Dialogue,
            KindArg::Instruction => RecordKind::Instruction,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileArg {
    Dialogue,
    Instruction,
}

impl From<ProfileArg> for Profile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Dialogue    => Profile::Dialogue,
            ProfileArg::Instruction => Profile::Instruction,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Canonical JSON file to audit
    #[arg(long)]
    pub input: String,

    /// Record shape stored in the file
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Also clean the records and report the before/after delta
    #[arg(long)]
    pub clean: bool,

    /// Log every hit with its text
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Cleaning profile
    #[arg(long, value_enum, default_value_t = ProfileArg::Dialogue)]
    pub profile: ProfileArg,

    /// Text to normalize
    pub text: String,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the config
    #[arg(long, default_value = "config/prepare.json")]
    pub path: String,

    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}
