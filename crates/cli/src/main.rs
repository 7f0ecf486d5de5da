// Estimate import CLI - parse contractor estimate spreadsheets, preview
// them, and convert them for the estimate builder.

mod exit_codes;
mod import;
mod logging;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use estimate_ingest::category::TAXONOMY;
use estimate_ingest::PipelineConfig;

use exit_codes::{EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "estimate")]
#[command(about = "Import contractor estimate spreadsheets")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Pipeline config file (defaults to the per-user config, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline decisions to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an estimate and show the preview
    #[command(after_help = "\
Examples:
  estimate parse claim-4411.xlsx
  estimate parse claim-4411.xlsx --sheet Exterior
  estimate parse export.csv --json > preview.json")]
    Parse {
        /// Spreadsheet file (.xlsx, .xls, .xlsb, .ods, .csv, .tsv)
        file: PathBuf,

        /// Sheet to parse (default: first sheet with an estimate header)
        #[arg(long)]
        sheet: Option<String>,

        /// Output the parse result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Also write the parse result JSON to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Convert an estimate to the builder's category/line-item JSON
    #[command(after_help = "\
Examples:
  estimate convert claim-4411.xlsx -o builder.json
  estimate convert claim-4411.xlsx --drop-row 17 --drop-row 18
  estimate convert claim-4411.xlsx --category 9=Gutters")]
    Convert {
        /// Spreadsheet file
        file: PathBuf,

        /// Sheet to parse (default: first sheet with an estimate header)
        #[arg(long)]
        sheet: Option<String>,

        /// Drop a sheet row (1-based) before converting. Repeatable.
        #[arg(long = "drop-row", value_name = "ROW")]
        drop_rows: Vec<usize>,

        /// Move a row to another category. Repeatable.
        #[arg(long = "category", value_name = "ROW=NAME")]
        categories: Vec<String>,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Write the blank estimate template
    #[command(after_help = "\
Examples:
  estimate template -o estimate-template.xlsx
  estimate template --csv > estimate-template.csv")]
    Template {
        /// CSV header row instead of an xlsx workbook
        #[arg(long)]
        csv: bool,

        /// Output file (required for xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the canonical categories and the labels that map to them
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pipeline config files
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate a config file without parsing anything
    Validate {
        /// Path to the config TOML
        file: PathBuf,
    },

    /// Print where the per-user config file is looked up
    Path,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  estimate-ingest ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Parse { file, sheet, json, output } => {
            load_config(cli.config).and_then(|config| import::cmd_parse(&config, file, sheet, json, output))
        }
        Commands::Convert { file, sheet, drop_rows, categories, output } => load_config(cli.config)
            .and_then(|config| import::cmd_convert(&config, file, sheet, drop_rows, categories, output)),
        Commands::Template { csv, output } => cmd_template(csv, output),
        Commands::Categories { json } => load_config(cli.config).and_then(|config| cmd_categories(&config, json)),
        Commands::Config(ConfigCommands::Validate { file }) => cmd_config_validate(file),
        Commands::Config(ConfigCommands::Path) => cmd_config_path(),
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
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// `--config` file, else the per-user config, else defaults.
fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig, CliError> {
    let config = match path {
        Some(path) => PipelineConfig::load(&path)?,
        None => PipelineConfig::load_default()?,
    };
    Ok(config)
}

// ============================================================================
// template
// ============================================================================

fn cmd_template(csv: bool, output: Option<PathBuf>) -> Result<(), CliError> {
    let bytes = if csv {
        estimate_io::generate_csv_template()
            .map_err(|e| CliError::io(e.to_string()))?
            .into_bytes()
    } else {
        if output.is_none() {
            return Err(CliError::args("the xlsx template is binary; pass --output <file>")
                .with_hint("estimate template -o estimate-template.xlsx, or --csv for text"));
        }
        estimate_ingest::generate_template().map_err(|e| CliError::io(e.to_string()))?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &bytes)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            io::stdout().write_all(&bytes).map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    Ok(())
}

// ============================================================================
// categories
// ============================================================================

#[derive(serde::Serialize)]
struct CategoryListing {
    name: String,
    labels: Vec<String>,
}

fn category_listing(config: &PipelineConfig) -> Vec<CategoryListing> {
    let mut listing: Vec<CategoryListing> = TAXONOMY
        .iter()
        .map(|(name, labels)| CategoryListing {
            name: name.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        })
        .collect();

    for (raw, canonical) in &config.categories.aliases {
        let canonical = estimate_ingest::label::tidy(canonical);
        match listing.iter_mut().find(|c| c.name.eq_ignore_ascii_case(&canonical)) {
            Some(entry) => entry.labels.push(raw.clone()),
            None => listing.push(CategoryListing {
                name: canonical,
                labels: vec![raw.clone()],
            }),
        }
    }
    listing
}

fn cmd_categories(config: &PipelineConfig, json: bool) -> Result<(), CliError> {
    let listing = category_listing(config);

    if json {
        let out = serde_json::to_string_pretty(&listing)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for entry in &listing {
        writeln!(handle, "{:<20} {}", entry.name, entry.labels.join(", ")).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config_validate(file: PathBuf) -> Result<(), CliError> {
    let config = PipelineConfig::load(&file)?;
    eprintln!(
        "config OK: scan {} rows, {} alias(es), declared total policy {:?}",
        config.header.scan_rows,
        config.categories.aliases.len(),
        config.reconcile.declared_total
    );
    Ok(())
}

fn cmd_config_path() -> Result<(), CliError> {
    match PipelineConfig::default_path() {
        Some(path) => {
            let state = if path.exists() { "present" } else { "not present, defaults apply" };
            println!("{} ({state})", path.display());
            Ok(())
        }
        None => Err(CliError::io("no config directory on this platform")),
    }
}
