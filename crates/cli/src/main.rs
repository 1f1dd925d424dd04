// newsmerge CLI - merge analyst news sheets, filter by tag, fuzzy search

mod batch;
mod exit_codes;
mod render;
mod shell;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;

use newsmerge_core::{Composition, EmptyTagPolicy, LabelRule};

use exit_codes::{EXIT_CONFIG, EXIT_DECODE, EXIT_ERROR, EXIT_NO_RESULTS, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "nmerge")]
#[command(about = "Merge analyst news spreadsheets, then filter by tag or fuzzy search")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file [default: ~/.config/newsmerge/settings.json]
    #[arg(long, env = "NMERGE_SETTINGS", global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge files and print the merged entries as cards
    #[command(after_help = "\
Examples:
  nmerge merge file1.xlsx file2.xlsx
  nmerge merge desk.csv night.csv --label desk.csv=\"Desk\" --label night.csv=\"Night shift\"
  nmerge merge file1.xlsx file2.xlsx --tag Acme
  nmerge merge file1.xlsx file2.xlsx --tag Acme --query merger --compose intersect
  nmerge merge file1.xlsx file2.xlsx --json
  nmerge merge file1.xlsx file2.xlsx --output merged.xlsx")]
    Merge {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        view: ViewArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the company and sector tags found across the files
    #[command(after_help = "\
Examples:
  nmerge tags file1.xlsx file2.xlsx
  nmerge tags *.csv --json")]
    Tags {
        #[command(flatten)]
        input: InputArgs,

        /// Output JSON to stdout instead of one tag per line
        #[arg(long)]
        json: bool,
    },

    /// Fuzzy-search the merged entries
    #[command(after_help = "\
Examples:
  nmerge search acme file1.xlsx file2.xlsx
  nmerge search \"globx earnings\" *.xlsx --scores
  nmerge search recall *.csv --json --fail-empty")]
    Search {
        /// Text to look for in title, notes, company and sector
        query: String,

        #[command(flatten)]
        input: InputArgs,

        /// Show each hit's match score (0 = exact)
        #[arg(long)]
        scores: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a batch manifest (.merge.toml)
    #[command(after_help = "\
Examples:
  nmerge run weekly.merge.toml
  nmerge run weekly.merge.toml --tag Energy --json
  nmerge run weekly.merge.toml --output digest.csv --strict")]
    Run {
        /// Path to the .merge.toml manifest
        manifest: PathBuf,

        /// Fail if any file cannot be decoded
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        view: ViewArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Validate a batch manifest and check that every file decodes
    #[command(after_help = "\
Examples:
  nmerge validate weekly.merge.toml")]
    Validate {
        /// Path to the .merge.toml manifest
        manifest: PathBuf,
    },

    /// Interactive session: each line is a search, `:tag NAME` filters by tag
    #[command(after_help = "\
Commands inside the shell:
  <text>        search (an empty line shows everything)
  :tag NAME     show entries tagged NAME
  :tags         list tags
  :clear        drop the tag and the query
  :load         re-read the files as a new batch
  :quit         leave

Examples:
  nmerge shell file1.xlsx file2.xlsx
  printf ':tag Acme\\nmerger\\n' | nmerge shell *.csv")]
    Shell {
        #[command(flatten)]
        input: InputArgs,
    },
}

// ---------------------------------------------------------------------------
// Shared argument groups
// ---------------------------------------------------------------------------

#[derive(Args)]
pub(crate) struct InputArgs {
    /// Spreadsheet files (xlsx, xlsm, xlsb, xls, ods, csv, tsv)
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Source label for one file, as FILE=LABEL (repeatable)
    #[arg(long = "label", value_name = "FILE=LABEL")]
    pub labels: Vec<String>,

    /// How files without --label are labeled
    #[arg(long, value_enum)]
    pub labeling: Option<LabelingArg>,

    /// Sheet to read from workbooks [default: first sheet]
    #[arg(long)]
    pub sheet: Option<String>,

    /// Blank company/sector values in the tag set
    #[arg(long, value_enum)]
    pub empty_tags: Option<EmptyTagsArg>,

    /// Fuzzy match threshold, from 0 (exact only) to 1 (anything)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Fail if any file cannot be decoded
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub(crate) struct ViewArgs {
    /// Show only entries carrying this company/sector tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Fuzzy search query
    #[arg(long)]
    pub query: Option<String>,

    /// How --tag and --query combine
    #[arg(long, value_enum)]
    pub compose: Option<ComposeArg>,
}

#[derive(Args)]
pub(crate) struct OutputArgs {
    /// Output JSON ({report, tags, entries}) to stdout instead of cards
    #[arg(long)]
    pub json: bool,

    /// Write the shown entries to a .json, .csv or .xlsx file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Exit with code 5 when no entries are shown
    #[arg(long)]
    pub fail_empty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum LabelingArg {
    /// "Analyst 1" if the file name contains 1, else "Analyst 2"
    FilenameDigit,
    /// The file name without its extension
    FileStem,
}

impl From<LabelingArg> for LabelRule {
    fn from(arg: LabelingArg) -> Self {
        match arg {
            LabelingArg::FilenameDigit => LabelRule::FilenameDigit,
            LabelingArg::FileStem => LabelRule::FileStem,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum EmptyTagsArg {
    Suppress,
    Preserve,
}

impl From<EmptyTagsArg> for EmptyTagPolicy {
    fn from(arg: EmptyTagsArg) -> Self {
        match arg {
            EmptyTagsArg::Suppress => EmptyTagPolicy::Suppress,
            EmptyTagsArg::Preserve => EmptyTagPolicy::Preserve,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ComposeArg {
    /// The last of tag/query wins
    Override,
    /// Search results restricted to the tag
    Intersect,
}

impl From<ComposeArg> for Composition {
    fn from(arg: ComposeArg) -> Self {
        match arg {
            ComposeArg::Override => Composition::Override,
            ComposeArg::Intersect => Composition::Intersect,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\ncore:    newsmerge-core ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\ncore:    newsmerge-core ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = cli.settings.as_deref();
    let result = match cli.command {
        Commands::Merge { input, view, output } => batch::cmd_merge(settings, input, view, output),
        Commands::Tags { input, json } => batch::cmd_tags(settings, input, json),
        Commands::Search { query, input, scores, output } => {
            batch::cmd_search(settings, query, input, scores, output)
        }
        Commands::Run { manifest, strict, view, output } => {
            batch::cmd_run(settings, manifest, strict, view, output)
        }
        Commands::Validate { manifest } => batch::cmd_validate(manifest),
        Commands::Shell { input } => shell::cmd_shell(settings, input),
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
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self { code: EXIT_DECODE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    /// Empty result under `--fail-empty`. Nothing is printed; the summary already said so.
    pub fn no_results() -> Self {
        Self { code: EXIT_NO_RESULTS, message: String::new(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
