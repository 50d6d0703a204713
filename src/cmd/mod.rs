mod convert;
mod load;
mod seed;
mod setup;
mod verify;

use crate::config::PipelineConfig;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reurb-seed")]
#[command(version)]
#[command(
    about = "Convert REURB property dumps, seed the local DuckDB store and audit its integrity",
    long_about = None
)]
pub struct Cli {
    /// YAML config file overriding the default layout
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding dump, schema, seed files and store [default: database]
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Debug-level diagnostics (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Dump parsing flags shared by `convert` and `load`
#[derive(Args, Debug, Clone, Default)]
pub struct ParseArgs {
    /// Exported dump (supports .gz, .bz2, .xz, .zst) [default: <data-dir>/reurb_properties_rows.sql]
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Tuples per upsert statement [default: 100]
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Tuple scanning: quote-aware, legacy
    #[arg(long)]
    pub scan_mode: Option<String>,

    /// ARRAY[...] rewriting: json, verbatim
    #[arg(long)]
    pub array_mode: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert the exported dump into numbered seed files
    Convert {
        #[command(flatten)]
        parse: ParseArgs,

        /// Directory for the seed files [default: <data-dir>]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Parse and report without writing files
        #[arg(long)]
        dry_run: bool,

        /// Show progress while reading
        #[arg(short, long)]
        progress: bool,
    },

    /// Load the exported dump straight into the store in batches
    Load {
        #[command(flatten)]
        parse: ParseArgs,

        /// Store file [default: <data-dir>/sisreurb.duckdb]
        #[arg(long)]
        store: Option<PathBuf>,

        /// Delete this project's lots before loading
        #[arg(long)]
        replace_project: Option<String>,

        /// Show progress during loading
        #[arg(short, long)]
        progress: bool,
    },

    /// Recreate the store from the schema and seed files
    Seed {
        /// Store file [default: <data-dir>/sisreurb.duckdb]
        #[arg(long)]
        store: Option<PathBuf>,

        /// Seed on top of the existing store instead of recreating it
        #[arg(long)]
        keep_existing: bool,

        /// Show progress during seeding
        #[arg(short, long)]
        progress: bool,
    },

    /// Audit referential integrity and write the report
    Verify {
        /// Store file [default: <data-dir>/sisreurb.duckdb]
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Exit non-zero when orphans are found
        #[arg(long)]
        strict: bool,

        /// Do not write INTEGRITY_REPORT.md
        #[arg(long)]
        no_report: bool,
    },

    /// Convert, seed and verify in one go
    Setup {
        /// Skip conversion and seed from existing seed files
        #[arg(long)]
        skip_convert: bool,

        /// Seed on top of the existing store instead of recreating it
        #[arg(long)]
        keep_existing: bool,

        /// Exit non-zero when orphans are found
        #[arg(long)]
        strict: bool,

        /// Show progress
        #[arg(short, long)]
        progress: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Defaults, then the YAML file, then `--data-dir`.
fn resolve_config(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<PipelineConfig> {
    let mut resolved = match config {
        Some(path) => PipelineConfig::load(&path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = data_dir {
        resolved = resolved.with_data_dir(dir);
    }
    Ok(resolved)
}

/// Apply per-command parsing flags on top of the configuration.
fn apply_parse_args(config: &mut PipelineConfig, args: &ParseArgs) -> anyhow::Result<()> {
    if let Some(size) = args.batch_size {
        config.batch_size = size;
    }
    if let Some(mode) = &args.scan_mode {
        config.scan_mode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(mode) = &args.array_mode {
        config.array_mode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    config.validate()?;
    Ok(())
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        generate(
            shell,
            &mut Cli::command(),
            "reurb-seed",
            &mut io::stdout(),
        );
        return Ok(());
    }

    let mut config = resolve_config(cli.config, cli.data_dir)?;

    match cli.command {
        Commands::Convert {
            parse,
            output,
            dry_run,
            progress,
        } => {
            apply_parse_args(&mut config, &parse)?;
            convert::run(&config, parse.input, output, dry_run, progress)
        }
        Commands::Load {
            parse,
            store,
            replace_project,
            progress,
        } => {
            apply_parse_args(&mut config, &parse)?;
            load::run(&config, parse.input, store, replace_project, progress)
        }
        Commands::Seed {
            store,
            keep_existing,
            progress,
        } => seed::run(&config, store, !keep_existing, progress).map(|_| ()),
        Commands::Verify {
            store,
            json,
            strict,
            no_report,
        } => verify::run(&config, store, json, strict, !no_report),
        Commands::Setup {
            skip_convert,
            keep_existing,
            strict,
            progress,
        } => setup::run(&config, skip_convert, !keep_existing, strict, progress),
        Commands::Completions { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "reurb-seed",
            "verify",
            "--data-dir",
            "/tmp/data",
            "--strict",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        assert!(matches!(cli.command, Commands::Verify { strict: true, .. }));
    }

    #[test]
    fn test_parse_args_override_config() {
        let mut config = PipelineConfig::default();
        let args = ParseArgs {
            batch_size: Some(25),
            scan_mode: Some("legacy".to_string()),
            array_mode: Some("verbatim".to_string()),
            ..Default::default()
        };
        apply_parse_args(&mut config, &args).unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.scan_mode, crate::convert::ScanMode::Legacy);
        assert_eq!(config.array_mode, crate::convert::ArrayMode::Verbatim);
    }

    #[test]
    fn test_zero_batch_size_flag_rejected() {
        let mut config = PipelineConfig::default();
        let args = ParseArgs {
            batch_size: Some(0),
            ..Default::default()
        };
        assert!(apply_parse_args(&mut config, &args).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
