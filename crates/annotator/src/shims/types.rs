// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use clap::{crate_version, ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::Level;
use url::Url;

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::config::{ServiceConfig, DEFAULT_PREDICTOR_URL};
use crate::pipeline::Backend;

#[derive(Debug, Parser)]
#[clap(
    name = "annotator",
    about = "Per-residue secondary structure annotation of proteins",
    version = crate_version!()
)]
pub struct Opts {
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress non-error output and set the log level to WARN."
    )]
    pub quiet: bool,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase verbosity level, can be used multiple times."
    )]
    pub verbose: u8,

    #[command(flatten)]
    pub services: ServiceArgs,

    #[command(flatten)]
    pub history: HistoryStoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Opts {
    pub fn log_level(&self) -> Level {
        match (self.quiet, self.verbose) {
            (true, _) => Level::WARN,
            (false, 0) => Level::INFO,
            (false, 1) => Level::DEBUG,
            (false, _) => Level::TRACE,
        }
    }
}

#[derive(Debug, Args)]
pub struct ServiceArgs {
    #[clap(
        long,
        help = "Base URL of the secondary structure predictor.",
        default_value = DEFAULT_PREDICTOR_URL,
        env = "ANNOTATOR_PREDICTOR_URL",
        global = true
    )]
    pub predictor_url: Url,

    #[clap(
        long,
        help = "Base URL of the structure catalog (RCSB data API).",
        default_value = DEFAULT_CATALOG_URL,
        env = "ANNOTATOR_CATALOG_URL",
        global = true
    )]
    pub catalog_url: Url,

    #[clap(
        long,
        help = "Refuse to talk to any service over plain http.",
        env = "ANNOTATOR_REQUIRE_SECURE_TRANSPORT",
        global = true
    )]
    pub require_secure_transport: bool,
}

impl ServiceArgs {
    pub fn to_config(&self) -> ServiceConfig {
        ServiceConfig {
            predictor_url: self.predictor_url.clone(),
            catalog_url: self.catalog_url.clone(),
            require_secure_transport: self.require_secure_transport,
        }
    }
}

#[derive(Debug, Args)]
pub struct HistoryStoreArgs {
    #[clap(
        long,
        help = "SQLite file the submission history is kept in.",
        default_value = "annotator-history.db",
        env = "ANNOTATOR_HISTORY_DB",
        global = true
    )]
    pub history_db: PathBuf,

    #[clap(
        long,
        help = "Don't read or write the history file.",
        global = true
    )]
    pub no_history: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Annotate a sequence or a PDB entry.
    Predict(PredictArgs),
    /// Show or clear the recent submissions.
    History(HistoryArgs),
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    #[arg(short, long, help = "One-letter amino acid sequence.")]
    pub sequence: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Read the sequence from a file. FASTA header lines are ignored."
    )]
    pub sequence_file: Option<PathBuf>,

    #[arg(short = 'i', long, help = "4-character PDB ID, e.g. 1CRN.")]
    pub pdb_id: Option<String>,

    #[arg(
        long,
        value_name = "NAME",
        help = "Submit one of the built-in samples (see `history --presets`)."
    )]
    pub sample: Option<String>,

    #[arg(long, value_enum, default_value_t = BackendArg::Remote)]
    pub backend: BackendArg,

    #[arg(
        long,
        help = "Seed for the random source, for reproducible confidence jitter and synthetic labels."
    )]
    pub seed: Option<u64>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Write the 8-state and 3-state CSV files into this directory."
    )]
    pub csv_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(long, help = "Forget all recorded submissions.")]
    pub clear: bool,

    #[arg(long, help = "List the built-in samples instead.")]
    pub presets: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Remote,
    Synthetic,
}

impl From<BackendArg> for Backend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Remote => Backend::Remote,
            BackendArg::Synthetic => Backend::Synthetic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Opts::command().debug_assert();
    }

    #[test]
    fn parses_predict_with_defaults() {
        let opts = Opts::try_parse_from(["annotator", "predict", "--pdb-id", "1crn"]).unwrap();
        assert_eq!(opts.log_level(), Level::INFO);
        assert_eq!(opts.services.predictor_url.as_str(), "http://127.0.0.1:8000/");
        assert!(!opts.services.require_secure_transport);
        let Command::Predict(args) = opts.command else {
            panic!("expected predict");
        };
        assert_eq!(args.pdb_id.as_deref(), Some("1crn"));
        assert_eq!(args.backend, BackendArg::Remote);
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let opts = Opts::try_parse_from([
            "annotator",
            "history",
            "-vv",
            "--no-history",
            "--predictor-url",
            "https://predict.example.org",
        ])
        .unwrap();
        assert_eq!(opts.log_level(), Level::TRACE);
        assert!(opts.history.no_history);
        assert_eq!(
            opts.services.to_config().predictor_url.as_str(),
            "https://predict.example.org/"
        );
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(Opts::try_parse_from([
            "annotator",
            "--catalog-url",
            "not a url",
            "history"
        ])
        .is_err());
    }
}
