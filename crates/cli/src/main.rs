// Patchwork CLI - reconcile two CSV datasets into a quilt

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;
use recon::{KeyOrderArg, NullKeysArg, OrphanLabelArg};

#[derive(Parser)]
#[command(name = "patchwork")]
#[command(about = "Reconcile two tabular datasets by key and fuzzy field similarity")]
#[command(version)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  patchwork run customers.patchwork.toml
  patchwork run customers.patchwork.toml --json
  patchwork run customers.patchwork.toml --output result.json --csv quilt.csv")]
    Run {
        /// Path to the .patchwork.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of the quilt CSV
        #[arg(long)]
        json: bool,

        /// Write JSON output to file (overrides [output].json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the quilt as CSV to file (overrides [output].csv)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  patchwork validate customers.patchwork.toml")]
    Validate {
        /// Path to the .patchwork.toml config file
        config: PathBuf,
    },

    /// Reconcile two CSV files given on the command line
    #[command(after_help = "\
Examples:
  patchwork stitch --left a.csv --right b.csv --key id --fuzzy name --threshold 80
  patchwork stitch --left a.csv --right b.csv --fuzzy name --fuzzy city --csv quilt.csv
  patchwork stitch --left a.csv --right b.csv --key id --json")]
    Stitch {
        /// Left CSV file
        #[arg(long)]
        left: PathBuf,

        /// Right CSV file
        #[arg(long)]
        right: PathBuf,

        /// Exact-match key column present in both files
        #[arg(long)]
        key: Option<String>,

        /// Column compared by fuzzy similarity (repeatable)
        #[arg(long = "fuzzy", value_name = "FIELD")]
        fuzzy: Vec<String>,

        /// Minimum similarity score (0-100) to accept a fuzzy pairing
        #[arg(long, default_value_t = patchwork_recon::config::DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Label for one-sided rows of the key pass
        #[arg(long, value_enum, default_value_t = OrphanLabelArg::Unmatched)]
        orphan_label: OrphanLabelArg,

        /// Whether null keys join each other
        #[arg(long, value_enum, default_value_t = NullKeysArg::Match)]
        null_keys: NullKeysArg,

        /// Row order of the key pass
        #[arg(long, value_enum, default_value_t = KeyOrderArg::Input)]
        key_order: KeyOrderArg,

        /// Field delimiter of both input files
        #[arg(long, short = 'd', default_value = ",")]
        delimiter: char,

        /// Write the quilt as CSV to file instead of stdout
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output JSON (meta, summary, quilt) to stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("patchwork_recon=debug,patchwork=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Run { config, json, output, csv } => recon::cmd_run(config, json, output, csv),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Stitch {
            left,
            right,
            key,
            fuzzy,
            threshold,
            orphan_label,
            null_keys,
            key_order,
            delimiter,
            csv,
            json,
        } => recon::cmd_stitch(recon::StitchArgs {
            left,
            right,
            key,
            fuzzy,
            threshold,
            orphan_label,
            null_keys,
            key_order,
            delimiter,
            csv,
            json,
        }),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
