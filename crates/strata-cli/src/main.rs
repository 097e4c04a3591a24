use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Strata build-graph generator.
///
/// Strata turns a tree of meta-source and verifier-native files into a
/// deterministic make or ninja build description for a
/// translate/verify/extract pipeline. It only models what depends on what;
/// execution belongs to the backend that consumes the generated file.
///
/// EXAMPLES:
///     strata gen --make Makefile       Generate a Makefile
///     strata gen --ninja build.ninja   Generate a ninja file
///     strata modules                   List resolvable modules
///     strata order code/x.meta         Show a file's type-export order
///
/// ENVIRONMENT VARIABLES:
///     RUST_LOG    Log filter (e.g. 'strata_build=debug')
#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory containing the manifest
    #[arg(long, short = 'C', default_value = ".", global = true)]
    project_dir: PathBuf,

    /// Manifest file name inside the project directory
    #[arg(long, default_value = "strata.toml", global = true)]
    manifest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate build descriptions
    ///
    /// Runs the whole construction pass, including the external dependency
    /// analysis, then writes the requested backend files. Nothing is
    /// written unless the entire pass succeeds.
    ///
    /// EXAMPLES:
    ///     strata gen --make Makefile
    ///     strata gen --make Makefile --ninja build.ninja
    #[command(visible_alias = "g")]
    Gen {
        /// Write a Makefile at this path (relative to the project directory)
        #[arg(long)]
        make: Option<PathBuf>,
        /// Write a ninja file at this path
        #[arg(long)]
        ninja: Option<PathBuf>,
        /// Enable extraction rules regardless of the manifest
        #[arg(long)]
        extract: bool,
    },

    /// List resolvable modules and their interface artifacts
    Modules,

    /// Print the type-export order computed for one meta-source file
    Order {
        /// Meta-source file path, relative to the project directory
        file: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Gen {
            make,
            ninja,
            extract,
        } => commands::generate::run(&cli.project_dir, &cli.manifest, make, ninja, extract),
        Commands::Modules => commands::modules::run(&cli.project_dir, &cli.manifest),
        Commands::Order { file } => commands::order::run(&cli.project_dir, &cli.manifest, &file),
    }
}
