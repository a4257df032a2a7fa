// casematrix - compare labeled test-run exports

mod exit_codes;
mod logging;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use casematrix_compare::{CompareError, JoinKey, MinorRule};
use casematrix_io::IoError;
use exit_codes::{compare_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "casematrix")]
#[command(about = "Compare test-run exports: exclusive sets per combination and pairwise similarity")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Log engine progress to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a comparison described by a TOML config file
    #[command(after_help = "\
Examples:
  casematrix run release.compare.toml
  casematrix run release.compare.toml --json
  casematrix run release.compare.toml --xlsx out.xlsx --output out.json")]
    Run {
        /// Path to the .compare.toml config file
        config: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file (overrides [output].json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write XLSX workbook to file (overrides [output].xlsx)
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },

    /// Compare CSV exports given on the command line
    #[command(after_help = "\
Examples:
  casematrix compare nightly.csv rc1.csv
  casematrix compare a.csv b.csv c.csv --label A --label B --label C --xlsx cmp.xlsx
  casematrix compare old.csv new.csv --minor-join-key title --minor minor-or-bypass")]
    Compare {
        /// CSV files, at least two
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Dataset label, once per file in order (default: file stem)
        #[arg(long = "label", short = 'l')]
        labels: Vec<String>,

        /// Field identifying a case across datasets
        #[arg(long, value_enum, default_value_t = JoinKeyArg::CaseId)]
        join_key: JoinKeyArg,

        /// Join key for the Minor category only
        #[arg(long, value_enum)]
        minor_join_key: Option<JoinKeyArg>,

        /// Built-in minor-issue pattern
        #[arg(long, value_enum, default_value_t = MinorArg::Minor)]
        minor: MinorArg,

        /// Custom minor-issue regex (case-insensitive), replaces --minor
        #[arg(long)]
        minor_regex: Option<String>,

        /// Stop and report partial results after this many milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,

        /// Compute categories on one thread
        #[arg(long)]
        sequential: bool,

        /// Write XLSX workbook to file
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  casematrix validate release.compare.toml")]
    Validate {
        /// Path to the .compare.toml config file
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum JoinKeyArg {
    CaseId,
    Title,
}

impl From<JoinKeyArg> for JoinKey {
    fn from(arg: JoinKeyArg) -> Self {
        match arg {
            JoinKeyArg::CaseId => JoinKey::CaseId,
            JoinKeyArg::Title => JoinKey::Title,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MinorArg {
    Minor,
    MinorOrBypass,
}

fn minor_rule(minor: MinorArg, regex: Option<String>) -> MinorRule {
    match (regex, minor) {
        (Some(re), _) => MinorRule::Custom(re),
        (None, MinorArg::Minor) => MinorRule::Minor,
        (None, MinorArg::MinorOrBypass) => MinorRule::MinorOrBypass,
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  casematrix-compare ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  casematrix-compare ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, output, xlsx } => run::cmd_run(config, json, output, xlsx),
        Commands::Compare {
            files,
            labels,
            join_key,
            minor_join_key,
            minor,
            minor_regex,
            deadline_ms,
            sequential,
            xlsx,
            json,
            output,
        } => {
            let options = casematrix_compare::CompareOptions {
                join_key: join_key.into(),
                minor_join_key: minor_join_key.map(Into::into),
                minor: minor_rule(minor, minor_regex),
                deadline: deadline_ms.map(std::time::Duration::from_millis),
                parallel: !sequential,
            };
            run::cmd_compare(files, labels, options, json, output, xlsx)
        }
        Commands::Validate { config } => run::cmd_validate(config),
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

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<CompareError> for CliError {
    fn from(err: CompareError) -> Self {
        let hint = match &err {
            CompareError::MissingField { .. } => {
                Some("accepted headers include \"Case ID\", \"Title\", \"Status\", \"Comment\"".to_string())
            }
            CompareError::TooFewDatasets(_) => Some("pass at least two files".to_string()),
            _ => None,
        };
        Self { code: compare_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = match &err {
            IoError::SheetNameCollision { .. } => {
                Some("use shorter or more distinct dataset labels".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_IO, message: err.to_string(), hint }
    }
}
