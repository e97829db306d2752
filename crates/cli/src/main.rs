//! sfac - learn specs from sample records and build synthetic records

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::build::{BuildArgs, handle_build};
use commands::create::{CreateArgs, handle_create};

#[derive(Parser, Debug)]
#[command(
    name = "sfac",
    version,
    about = "Learn a spec from sample JSON records and generate synthetic records from it",
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze sample records and write a spec
    Create {
        /// Sample file: a JSON array of records or JSON Lines
        #[arg(long = "in", value_name = "FILE")]
        input: PathBuf,

        /// Spec file to write
        #[arg(long = "out", value_name = "FILE")]
        output: PathBuf,

        /// JSON Schema marking open key/value mappings
        #[arg(long, value_name = "FILE")]
        schema: Option<PathBuf>,

        /// Records to analyze (0 = all)
        #[arg(long, default_value_t = 0)]
        sample_size: usize,

        /// Most distinct values a choice field may have
        #[arg(long)]
        max_choices: Option<usize>,
    },

    /// Generate records from a spec as JSON Lines
    Build {
        #[arg(long, value_name = "FILE")]
        spec: PathBuf,

        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Override as KEY=VALUE, e.g. items__0__name="x" (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Output file (stdout if not provided)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Create {
            input,
            output,
            schema,
            sample_size,
            max_choices,
        } => handle_create(&CreateArgs {
            input,
            output,
            schema,
            sample_size,
            max_choices,
        })?,
        Command::Build {
            spec,
            count,
            seed,
            set,
            output,
        } => handle_build(&BuildArgs {
            spec,
            count,
            seed,
            set,
            output,
        })?,
    }
    Ok(())
}
