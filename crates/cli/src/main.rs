// rosterjoin CLI - reconcile two player datasets from a TOML config

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};
use rosterjoin_recon::ReconError;

#[derive(Parser)]
#[command(name = "rosterjoin")]
#[command(about = "Join two player datasets on fuzzy-matched names within canonical teams")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both datasets, match, merge and write the results
    #[command(after_help = "\
Exit code 5 with --strict means some primary records found no partner.

Examples:
  rosterjoin run season.recon.toml
  rosterjoin run season.recon.toml --json | jq .summary
  rosterjoin run season.recon.toml --csv merged.csv --matches matches.csv
  rosterjoin run season.recon.toml --strict")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the full JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file (overrides [output].json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write the merged table as CSV (overrides [output].csv)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the match table as CSV (overrides [output].matches_csv)
        #[arg(long)]
        matches: Option<PathBuf>,

        /// Fail (exit 5) when any primary record is left unmatched
        #[arg(long)]
        strict: bool,
    },

    /// Parse and validate a config without loading data
    #[command(after_help = "\
Examples:
  rosterjoin validate season.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Score two player names
    #[command(after_help = "\
Examples:
  rosterjoin score 'Bruno Fernandes' 'Fernandes, Bruno'
  rosterjoin score 'Sadio Mane' 'Sadio Mané' --json")]
    Score {
        a: String,
        b: String,

        /// Print the breakdown as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical form of raw team labels
    #[command(after_help = "\
Examples:
  rosterjoin teams Tottenham 'Manchester United,Everton'
  rosterjoin teams Leicester --config season.recon.toml")]
    Teams {
        #[arg(required = true)]
        labels: Vec<String>,

        /// Use the alias table from this config instead of the built-in one
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            csv,
            matches,
            strict,
        } => recon::cmd_run(recon::RunArgs {
            config,
            json,
            output,
            csv,
            matches,
            strict,
        }),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Score { a, b, json } => recon::cmd_score(&a, &b, json),
        Commands::Teams { labels, config } => recon::cmd_teams(&labels, config),
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

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { dataset, .. } => {
                Some(format!("check [{dataset}.columns] against the file header"))
            }
            ReconError::FieldParse { dataset, .. } => {
                Some(format!("check the [[{dataset}.derived]] operand columns"))
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}
