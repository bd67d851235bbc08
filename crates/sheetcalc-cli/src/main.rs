//! sheetcalc CLI - evaluate and edit sheet documents

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sheetcalc::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetcalc")]
#[command(author, version, about = "Spreadsheet formula engine")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every stored cell as ADDR, raw input and value
    Eval {
        /// Sheet document (JSON)
        file: PathBuf,
    },

    /// Apply one edit and print the cells whose value changed
    Set {
        /// Sheet document (JSON)
        file: PathBuf,

        /// Cell address, e.g. B3
        address: String,

        /// Raw input; an empty string deletes the cell
        raw: String,

        /// Write the edited document back to FILE
        #[arg(short, long)]
        write: bool,
    },

    /// Print the values of a range, one row per line
    Range {
        /// Sheet document (JSON)
        file: PathBuf,

        /// Range such as A1:C10
        range: String,
    },

    /// Create an empty document
    New {
        /// Output file
        file: PathBuf,

        /// Row bound of the grid
        #[arg(long)]
        rows: Option<u32>,

        /// Column bound of the grid
        #[arg(long)]
        cols: Option<u16>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Eval { file } => eval(&file),
        Commands::Set {
            file,
            address,
            raw,
            write,
        } => set(&file, &address, &raw, write),
        Commands::Range { file, range } => print_range(&file, &range),
        Commands::New {
            file,
            rows,
            cols,
            force,
        } => create(&file, rows, cols, force),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open(file: &Path) -> Result<Engine> {
    Engine::open(file).with_context(|| format!("Failed to open '{}'", file.display()))
}

fn eval(file: &Path) -> Result<()> {
    let engine = open(file)?;
    let mut out = io::stdout().lock();

    for (addr, record) in engine.cells() {
        writeln!(
            out,
            "{}\t{}\t{}",
            addr,
            escape_field(&record.raw_input),
            escape_field(&record.computed_value.to_string())
        )
        .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn set(file: &Path, address: &str, raw: &str, write: bool) -> Result<()> {
    let mut engine = open(file)?;
    let addr = CellAddress::parse(&address.trim().to_uppercase())
        .with_context(|| format!("Invalid cell address '{}'", address))?;

    let recalc = engine.set_cell_input(addr, raw);
    tracing::debug!(
        evaluated = recalc.evaluated,
        changed = recalc.changed.len(),
        "edit applied"
    );

    let mut out = io::stdout().lock();
    for changed in &recalc.changed {
        writeln!(
            out,
            "{}\t{}",
            changed,
            escape_field(&engine.display_value(*changed))
        )
        .context("Failed to write to stdout")?;
    }

    if write {
        engine
            .save(file)
            .with_context(|| format!("Failed to write '{}'", file.display()))?;
    }

    Ok(())
}

fn print_range(file: &Path, range: &str) -> Result<()> {
    let engine = open(file)?;
    let range = CellRange::parse(&range.trim().to_uppercase())
        .with_context(|| format!("Invalid range '{}'", range))?;

    let values = engine
        .evaluate_range_values(range)
        .context("Failed to read range")?;

    let width = usize::from(range.col_count());
    let mut out = io::stdout().lock();
    for row in values.chunks(width.max(1)) {
        let line: Vec<String> = row
            .iter()
            .map(|value| escape_field(&value.to_string()))
            .collect();
        writeln!(out, "{}", line.join("\t")).context("Failed to write to stdout")?;
    }

    Ok(())
}

fn create(file: &Path, rows: Option<u32>, cols: Option<u16>, force: bool) -> Result<()> {
    if file.exists() && !force {
        bail!("'{}' already exists (use --force to overwrite)", file.display());
    }

    let defaults = EngineOptions::default();
    let options = defaults.clone().with_bounds(
        rows.unwrap_or(defaults.rows),
        cols.unwrap_or(defaults.cols),
    );

    Engine::with_options(options)
        .save(file)
        .with_context(|| format!("Failed to write '{}'", file.display()))?;
    eprintln!("Created '{}'", file.display());

    Ok(())
}

/// Keep one record per line: tabs and line breaks are escaped
fn escape_field(text: &str) -> String {
    if text.contains(&['\t', '\n', '\r'][..]) {
        text.replace('\t', "\\t")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
    } else {
        text.to_string()
    }
}
