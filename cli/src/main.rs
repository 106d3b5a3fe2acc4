//! errwire CLI — decode and inspect serialized error payloads from the terminal.
//!
//! # Commands
//! ```
//! errwire decode  [FILE|-] --schemas <catalogue.json> [--fallback-kind <KIND>]
//!                 [--strict-kinds] [--strict-fields] [--standard-sentinels] [--json]
//! errwire schemas --file <catalogue.json>
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd_decode;
mod cmd_schemas;
mod logging;

#[derive(Parser)]
#[command(
    name = "errwire",
    about = "Rebuild typed error trees from serialized error payloads",
    long_about = "
errwire CLI: decode JSON error payloads against a catalogue of error kinds,
print the rebuilt error tree, or re-encode it.

ENVIRONMENT VARIABLES:
  RUST_LOG    tracing filter directives (overrides --verbose)
",
    version
)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one error payload
    Decode {
        /// Payload file; `-` or absent reads stdin
        input: Option<PathBuf>,
        /// JSON catalogue of error kinds
        #[arg(long)]
        schemas: PathBuf,
        /// Kind from the catalogue substituted for unresolved kinds
        #[arg(long)]
        fallback_kind: Option<String>,
        /// Fail on kinds the catalogue does not declare
        #[arg(long)]
        strict_kinds: bool,
        /// Fail on fields the resolved kind does not declare
        #[arg(long)]
        strict_fields: bool,
        /// Restore standard library errors (I/O, formatting) as sentinels
        #[arg(long)]
        standard_sentinels: bool,
        /// Re-encode the rebuilt error as JSON instead of printing a tree
        #[arg(long)]
        json: bool,
    },

    /// List the kinds and fields of a catalogue
    Schemas {
        /// JSON catalogue of error kinds
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&logging::LogConfig::from_flags(cli.verbose, cli.log_json));

    match cli.command {
        Commands::Decode {
            input,
            schemas,
            fallback_kind,
            strict_kinds,
            strict_fields,
            standard_sentinels,
            json,
        } => cmd_decode::run(cmd_decode::DecodeArgs {
            input,
            schemas,
            fallback_kind,
            strict_kinds,
            strict_fields,
            standard_sentinels,
            json,
        }),
        Commands::Schemas { file } => cmd_schemas::run(&file),
    }
}
