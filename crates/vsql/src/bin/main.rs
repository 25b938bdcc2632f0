//! vsql command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vsql::cli::compile::{CompileConfig, CompileOutput};
use vsql::cli::config::RequestArgs;
use vsql::cli::{compile, export, list, output, validate};
use vsql::compiler::MAX_RANGE_LEN;
use vsql::RangePadding;

/// Value-set to SQL compiler
#[derive(Parser)]
#[command(name = "vsql")]
#[command(author, version, about = "Compile clinical value-set documents into SQL", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a document into a UNION ALL query
    Compile {
        /// Document path or http(s) URL
        #[arg(env = "VSQL_DOCUMENT")]
        document: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print the entry-name to predicate mapping as JSON
    Predicates {
        /// Document path or http(s) URL
        #[arg(env = "VSQL_DOCUMENT")]
        document: String,

        /// Pretty-print output
        #[arg(short, long)]
        pretty: bool,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Write the flat reference CSV (one row per leaf code)
    Export {
        /// Document path or http(s) URL
        #[arg(env = "VSQL_DOCUMENT")]
        document: String,

        /// Range expansion padding (unpadded, preserve-width)
        #[arg(long, default_value = "unpadded")]
        range_padding: RangePadding,

        /// Most codes a single range may expand to
        #[arg(long, default_value_t = MAX_RANGE_LEN)]
        max_range_len: u64,
    },

    /// List the entries of a document
    List {
        /// Document path or http(s) URL
        #[arg(env = "VSQL_DOCUMENT")]
        document: String,
    },

    /// Check that documents load and compile under every domain
    Validate {
        /// Document paths or http(s) URLs
        #[arg(required = true)]
        documents: Vec<String>,

        /// Strict mode (warnings as errors)
        #[arg(short, long)]
        strict: bool,
    },
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Compile { document, request } => compile::compile(
            CompileConfig {
                document,
                request,
                output_file: cli.output.clone(),
            },
            CompileOutput::Sql,
        ),

        Commands::Predicates {
            document,
            pretty,
            request,
        } => compile::compile(
            CompileConfig {
                document,
                request,
                output_file: cli.output.clone(),
            },
            CompileOutput::Predicates { pretty },
        ),

        Commands::Export {
            document,
            range_padding,
            max_range_len,
        } => export::export(export::ExportConfig {
            document,
            range_padding,
            max_range_len,
            output_file: cli.output.clone(),
        }),

        Commands::List { document } => list::list(list::ListConfig {
            document,
            output_file: cli.output.clone(),
        }),

        Commands::Validate { documents, strict } => validate::validate(validate::ValidateConfig {
            documents,
            strict,
            verbose: cli.verbose,
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
