//! # cfg-cli
//!
//! `cfgpatch`: inspect struct configs, generate sparse override patches and
//! compare patches against their originals.

mod commands;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfgpatch")]
#[command(about = "Struct config inspection and patch generation")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a base struct and every struct inheriting from it
    Inheritors {
        /// Base struct name
        base: String,

        /// Root the files are relative to
        #[arg(long)]
        source_root: PathBuf,

        /// Config files to scan, relative to the source root
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Which declarations count as structs
        #[arg(long, value_enum, default_value_t = ScanMode::TopLevel)]
        scan_mode: ScanMode,

        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Print a struct, a nested section or a single field
    Show {
        /// Config file
        file: PathBuf,

        /// Struct name
        name: String,

        /// Nested section path, e.g. `BehaviorTypes/Newbie`
        #[arg(long)]
        section: Option<String>,

        /// Field to print instead of the whole block
        #[arg(long)]
        field: Option<String>,

        /// Follow refkey parents when the struct does not declare it
        #[arg(long)]
        inherited: bool,
    },

    /// Write a sparse override for a base struct and all its inheritors
    Override {
        /// Session config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Base struct name
        #[arg(long)]
        base: String,

        /// Only patch structs declared in this source file
        #[arg(long)]
        file: Option<String>,

        /// Nested section path the values go into
        #[arg(long)]
        section: Option<String>,

        /// `KEY=VALUE` to write (repeatable)
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        assignments: Vec<(String, String)>,

        /// Skip structs whose chain does not already define every key
        #[arg(long)]
        require_existing: bool,

        /// Write under this folder instead of the configured mod root
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the fragments instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare a patch file against the original config
    Diff {
        /// Original config file
        original: PathBuf,

        /// Patch file
        patch: PathBuf,

        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Maximum number of changed structs to report
        #[arg(long)]
        limit: Option<usize>,

        /// Leave unchanged fields out of the report
        #[arg(long)]
        changed_only: bool,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check patch file naming and placement in a mod folder
    Validate {
        /// Mod folder to scan
        mod_dir: PathBuf,

        /// Unpacked game `GameData` folder
        #[arg(long)]
        source: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScanMode {
    TopLevel,
    AnyDepth,
}

impl From<ScanMode> for cfg_text::Scope {
    fn from(mode: ScanMode) -> Self {
        match mode {
            ScanMode::TopLevel => cfg_text::Scope::TopLevel,
            ScanMode::AnyDepth => cfg_text::Scope::AnyDepth,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Csv,
    Json,
}

impl From<Format> for cfg_diff::ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => cfg_diff::ReportFormat::Text,
            Format::Csv => cfg_diff::ReportFormat::Csv,
            Format::Json => cfg_diff::ReportFormat::Json,
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Inheritors {
            base,
            source_root,
            files,
            scan_mode,
            json,
        } => commands::inheritors(&base, &source_root, &files, scan_mode.into(), json),
        Commands::Show {
            file,
            name,
            section,
            field,
            inherited,
        } => commands::show(
            &file,
            &name,
            section.as_deref(),
            field.as_deref(),
            inherited,
        ),
        Commands::Override {
            config,
            base,
            file,
            section,
            assignments,
            require_existing,
            output,
            dry_run,
        } => commands::override_values(&commands::OverrideArgs {
            config,
            base,
            file,
            section,
            assignments,
            require_existing,
            output,
            dry_run,
        }),
        Commands::Diff {
            original,
            patch,
            format,
            limit,
            changed_only,
            output,
        } => {
            let mut options = cfg_diff::CompareOptions::new().changed_only(changed_only);
            options.limit = limit;
            commands::diff(&original, &patch, &options, format.into(), output.as_deref())
        }
        Commands::Validate { mod_dir, source } => commands::validate(&mod_dir, &source),
    }
}
