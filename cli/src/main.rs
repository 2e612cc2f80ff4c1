use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anstyle::{AnsiColor, Style};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use process_structuredness::{
    analysis::structuredness::{
        batch::{classify_file, parse_file_name, SUMMARY_HEADERS},
        classify_directory, write_summary_csv, BatchEntry, ClassificationReport, SummaryRow,
    },
    core::relations::io::convert_ar_matrix_yaml_to_json,
    discovery::blocks::{build_super_blocks_named, detect_blocks},
    Block, Importable, RelationMatrix, StructurednessConfig, SuperBlock,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "structuredness", version)]
#[command(about = "Classify the structuredness of processes given as relation matrices")]
struct Cli {
    /// Log debug output (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify relation matrices and print a summary table
    Classify(ClassifyArgs),
    /// Print the detected blocks and super-blocks of a relation matrix as JSON
    Detect {
        /// Relation matrix (JSON or YAML)
        path: PathBuf,
        /// Parameter file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Convert a YAML relation-matrix export to a JSON relation matrix
    Convert {
        /// YAML export
        yaml: PathBuf,
        /// Output file (defaults to the input path with a .json extension)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the JSON schema of the parameter file
    Schema,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Relation matrices named `<log>_<class>.<json|yaml|yml>`
    #[arg(required_unless_present = "dir")]
    paths: Vec<PathBuf>,
    /// Classify all relation matrices in this directory
    #[arg(short, long, conflicts_with = "paths")]
    dir: Option<PathBuf>,
    /// Parameter file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Also write the summary table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write the full classification reports as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Classify(args) => classify(args),
        Command::Detect { path, config } => detect(&path, config.as_deref()),
        Command::Convert { yaml, out } => {
            let written = convert_ar_matrix_yaml_to_json(&yaml, out.as_deref())
                .with_context(|| format!("Could not convert {}", yaml.display()))?;
            println!("Wrote {}", written.display());
            Ok(())
        }
        Command::Schema => {
            let schema = schemars::schema_for!(StructurednessConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<StructurednessConfig> {
    match path {
        Some(path) => StructurednessConfig::from_path(path)
            .with_context(|| format!("Could not load parameters from {}", path.display())),
        None => Ok(StructurednessConfig::default()),
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    log: &'a str,
    class_real: &'a str,
    report: &'a ClassificationReport,
}

fn classify(args: ClassifyArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let entries = match &args.dir {
        Some(dir) => classify_directory(dir, &config)
            .with_context(|| format!("Could not classify directory {}", dir.display()))?,
        None => args
            .paths
            .iter()
            .map(|path| {
                let (log, class_real) = parse_file_name(path).with_context(|| {
                    format!("Expected a file name '<log>_<class>', got {}", path.display())
                })?;
                Ok(BatchEntry {
                    path: path.clone(),
                    log,
                    class_real,
                    result: classify_file(path, &config),
                })
            })
            .collect::<Result<Vec<_>>>()?,
    };

    let mut rows = Vec::new();
    for entry in &entries {
        match &entry.result {
            Ok(report) => rows.push(SummaryRow::new(&entry.log, &entry.class_real, report)),
            Err(e) => {
                tracing::error!(path = %entry.path.display(), error = %e, "Could not classify file")
            }
        }
    }
    print_table(&rows)?;
    let matched = rows.iter().filter(|r| r.matched).count();
    println!("\n{}/{} classes match", matched, rows.len());

    if let Some(csv_path) = &args.csv {
        let file = File::create(csv_path)
            .with_context(|| format!("Could not create {}", csv_path.display()))?;
        write_summary_csv(&rows, BufWriter::new(file))?;
        println!("Wrote summary to {}", csv_path.display());
    }
    if let Some(json_path) = &args.json {
        let reports: Vec<ReportOutput<'_>> = entries
            .iter()
            .filter_map(|e| {
                e.result.as_ref().ok().map(|report| ReportOutput {
                    log: &e.log,
                    class_real: &e.class_real,
                    report,
                })
            })
            .collect();
        let file = File::create(json_path)
            .with_context(|| format!("Could not create {}", json_path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &reports)?;
        println!("Wrote reports to {}", json_path.display());
    }

    if rows.len() < entries.len() {
        bail!("{} of {} files could not be classified", entries.len() - rows.len(), entries.len());
    }
    Ok(())
}

/// Print rows as a grid, coloring the match column
fn print_table(rows: &[SummaryRow]) -> std::io::Result<()> {
    let cells: Vec<[String; 13]> = rows.iter().map(|r| r.cells()).collect();
    let mut widths = SUMMARY_HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let separator = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let header = Style::new().bold();
    let line = |cells: Vec<String>| format!("|{}|", cells.join("|"));

    let mut out = std::io::stdout().lock();
    writeln!(out, "+{}+", separator)?;
    writeln!(
        out,
        "{}",
        line(
            SUMMARY_HEADERS
                .iter()
                .zip(widths)
                .map(|(h, w)| format!(" {header}{:<w$}{header:#} ", h))
                .collect()
        )
    )?;
    writeln!(out, "+{}+", separator.replace('-', "="))?;
    for (row, summary) in cells.iter().zip(rows) {
        let colored = if summary.matched {
            Style::new().fg_color(Some(AnsiColor::Green.into()))
        } else {
            Style::new().fg_color(Some(AnsiColor::Red.into())).bold()
        };
        let rendered = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == row.len() - 1 {
                    format!(" {colored}{:<w$}{colored:#} ", cell)
                } else {
                    format!(" {:<w$} ", cell)
                }
            })
            .collect();
        writeln!(out, "{}", line(rendered))?;
        writeln!(out, "+{}+", separator)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct DetectionOutput {
    blocks: Vec<Block>,
    super_blocks: Vec<SuperBlock>,
}

fn detect(path: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let matrix = RelationMatrix::import_from_path(path)
        .with_context(|| format!("Could not load relation matrix {}", path.display()))?;
    let blocks = detect_blocks(&matrix, &config.detection)?;
    let output = DetectionOutput {
        blocks: blocks
            .iter()
            .map(|b| b.map_activities(&|a: &usize| matrix.name(*a).to_string()))
            .collect(),
        super_blocks: build_super_blocks_named(&blocks, &matrix),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
