use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Knowledge-base driven artifact path resolution.
///
/// Interpolates `%%attribute%%` patterns, expands Windows environment
/// variables, evaluates host conditions and plans artifact collection
/// for a single host described by a knowledge base file.
#[derive(Parser, Debug)]
#[command(name = "hostfacts", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Knowledge base input shared by every subcommand.
#[derive(Args, Debug)]
pub struct KbArgs {
    /// Knowledge base file (`.json`, `.yaml` or `.yml`).
    #[arg(long)]
    pub kb: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interpolate one or more `%%attribute%%` patterns, one result per line.
    Interpolate {
        #[command(flatten)]
        kb: KbArgs,

        /// Skip patterns that reference missing facts instead of failing
        /// (also enabled by `IGNORE_INTERPOLATION_ERRORS`).
        #[arg(long)]
        ignore_errors: bool,

        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Expand `%VAR%` Windows environment variables in TEXT.
    Expand {
        #[command(flatten)]
        kb: KbArgs,

        /// Resolve per-user variables for the user with this SID.
        #[arg(long)]
        sid: Option<String>,

        /// Resolve per-user variables for the user with this name.
        #[arg(long)]
        username: Option<String>,

        text: String,
    },

    /// Print the Windows environment variable map as JSON.
    Environ {
        #[command(flatten)]
        kb: KbArgs,
    },

    /// Evaluate a condition. Prints `true`/`false`; exits 1 when false.
    Condition {
        #[command(flatten)]
        kb: KbArgs,

        expression: String,
    },

    /// Plan artifact collection for the host and print it as JSON.
    Plan {
        #[command(flatten)]
        kb: KbArgs,

        /// Definitions directory (overrides `DEFINITIONS_DIR`).
        #[arg(long)]
        definitions: Option<PathBuf>,

        /// Skip patterns that reference missing facts instead of failing
        /// (also enabled by `IGNORE_INTERPOLATION_ERRORS`).
        #[arg(long)]
        ignore_errors: bool,
    },
}
