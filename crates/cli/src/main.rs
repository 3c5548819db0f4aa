use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dex_fingerprint::commands::{
    features_command, history_command, methods_command, solve_command, ConfigOverrides,
    SolveOptions,
};

/// Minimal method fingerprints for a compiled bytecode corpus.
///
/// This CLI is a thin wrapper around `fingerprint-core` (exposed in code as
/// `fingerprint_core`). All substantive logic lives in the libraries so it can
/// be tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "dex-fingerprint",
    version,
    about = "Find minimal feature combinations that identify a method",
    long_about = None
)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// Only log errors.
    #[arg(long, global = true, default_value_t = false, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the method ids in a corpus file.
    Methods {
        /// Corpus file (.json, .yaml or .yml).
        #[arg(long)]
        corpus: PathBuf,

        /// Only show ids containing this substring.
        #[arg(long)]
        filter: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show every feature of a method and its full pattern.
    Features {
        /// Corpus file (.json, .yaml or .yml).
        #[arg(long)]
        corpus: PathBuf,

        /// Method id, e.g. `Lcom/example/Foo;bar(I)V`.
        #[arg(long)]
        method: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Compute minimal fingerprints for a method.
    ///
    /// By default every inclusion-minimal fingerprint is listed, smallest
    /// first. `--greedy` returns a single one much faster on large corpora.
    Solve(SolveArgs),

    /// List fingerprint runs recorded with `solve --record`.
    History {
        /// Run database path.
        #[arg(long)]
        db: PathBuf,

        /// Only show runs for this method id.
        #[arg(long)]
        method: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct SolveArgs {
    /// Corpus file (.json, .yaml or .yml).
    #[arg(long)]
    corpus: PathBuf,

    /// Method id, e.g. `Lcom/example/Foo;bar(I)V`.
    #[arg(long)]
    method: String,

    /// Solver config file (.json, .yaml or .yml). Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not use return types.
    #[arg(long, default_value_t = false)]
    no_return_type: bool,

    /// Do not use parameter types.
    #[arg(long, default_value_t = false)]
    no_parameters: bool,

    /// Do not use string constants.
    #[arg(long, default_value_t = false)]
    no_strings: bool,

    /// Do not use access flags.
    #[arg(long, default_value_t = false)]
    no_access_flags: bool,

    /// Stop after evaluating this many candidate extensions.
    #[arg(long)]
    max_branches: Option<u64>,

    /// Stop after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Return one minimal fingerprint via greedy selection.
    #[arg(long, default_value_t = false)]
    greedy: bool,

    /// Show at most this many fingerprints.
    #[arg(long)]
    limit: Option<usize>,

    /// Emit JSON instead of human-readable text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Record the run in this database.
    #[arg(long)]
    record: Option<PathBuf>,
}

impl From<SolveArgs> for SolveOptions {
    fn from(args: SolveArgs) -> Self {
        SolveOptions {
            corpus: args.corpus,
            method: args.method,
            config: args.config,
            overrides: ConfigOverrides {
                no_return_type: args.no_return_type,
                no_parameters: args.no_parameters,
                no_strings: args.no_strings,
                no_access_flags: args.no_access_flags,
                max_branches: args.max_branches,
                timeout_ms: args.timeout_ms,
            },
            greedy: args.greedy,
            limit: args.limit,
            json: args.json,
            record: args.record,
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Methods { corpus, filter, json } => {
            methods_command(&corpus, filter.as_deref(), json)?
        }
        Command::Features { corpus, method, json } => features_command(&corpus, &method, json)?,
        Command::Solve(args) => solve_command(&SolveOptions::from(args))?,
        Command::History { db, method, json } => history_command(&db, method.as_deref(), json)?,
    }

    Ok(())
}
