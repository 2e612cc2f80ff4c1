use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::core::{
    io::{Format, Importable},
    relations::RelationMatrix,
};

use super::{
    classification::{classify_process, ClassificationReport, StructurednessConfig},
    StructurednessError,
};

/// Column headers of the summary table
pub const SUMMARY_HEADERS: [&str; 13] = [
    "Log",
    "#SBs",
    "Insiders",
    "Outsiders",
    "Base-Score",
    "SB vs. SB",
    "Out vs. SB",
    "Out vs. Out",
    "Refinement",
    "Score",
    "Class Real",
    "Class Calculated",
    "Match",
];

///
/// Split a file name of the form `<log>_<class>.<ext>` into log name and expected class
///
/// The log name may itself contain underscores, the class is the part after the last one.
/// Returns `None` if the stem contains no underscore.
///
pub fn parse_file_name(path: &Path) -> Option<(String, String)> {
    let stem = path.file_stem()?.to_str()?;
    let (log, class) = stem.rsplit_once('_')?;
    Some((log.to_string(), class.to_string()))
}

/// Load a relation matrix from a file and classify it
pub fn classify_file<P: AsRef<Path>>(
    path: P,
    config: &StructurednessConfig,
) -> Result<ClassificationReport, StructurednessError> {
    let matrix = RelationMatrix::import_from_path(path)?;
    classify_process(&matrix, config)
}

///
/// Classification of one file of a directory
///
#[derive(Debug)]
pub struct BatchEntry {
    /// Path of the relation matrix
    pub path: PathBuf,
    /// Log name (from the file name)
    pub log: String,
    /// Expected class (from the file name)
    pub class_real: String,
    /// Classification, or the reason it failed
    pub result: Result<ClassificationReport, StructurednessError>,
}

impl BatchEntry {
    /// Summary of a successful classification
    pub fn summary_row(&self) -> Option<SummaryRow> {
        self.result
            .as_ref()
            .ok()
            .map(|report| SummaryRow::new(&self.log, &self.class_real, report))
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn join_or_dash(acts: &[String]) -> String {
    if acts.is_empty() {
        "-".to_string()
    } else {
        acts.join(",")
    }
}

///
/// One row of the summary table
///
/// Scores are rounded to three decimals, refinements are weighted.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Log name
    pub log: String,
    /// Number of super-blocks (e.g., `"2 SB"`)
    pub super_blocks: String,
    /// Comma-separated insiders (`"-"` if none)
    pub insiders: String,
    /// Comma-separated outsiders (`"-"` if none)
    pub outsiders: String,
    /// Base score
    pub base_score: f64,
    /// Weighted SB vs. SB refinement
    pub sb_sb: Option<f64>,
    /// Weighted Out vs. SB refinement
    pub out_sb: Option<f64>,
    /// Weighted Out vs. Out refinement
    pub out_out: Option<f64>,
    /// Sum of weighted refinements
    pub refinement: f64,
    /// Final score
    pub final_score: f64,
    /// Expected class
    pub class_real: String,
    /// Computed class
    pub class_calc: String,
    /// Expected and computed class agree
    pub matched: bool,
}

impl SummaryRow {
    /// Summarize a classification report
    pub fn new(log: &str, class_real: &str, report: &ClassificationReport) -> Self {
        let score = &report.score;
        let class_calc = report.class.as_str().to_string();
        Self {
            log: log.to_string(),
            super_blocks: score.super_block_label.clone(),
            insiders: join_or_dash(&score.insiders),
            outsiders: join_or_dash(&score.outsiders),
            base_score: round3(score.base.score),
            sb_sb: score.sb_to_sb.map(|t| round3(t.weighted)),
            out_sb: score.out_to_sb.map(|t| round3(t.weighted)),
            out_out: score.out_to_out.map(|t| round3(t.weighted)),
            refinement: round3(score.refinement),
            final_score: round3(score.final_score),
            matched: class_calc == class_real,
            class_real: class_real.to_string(),
            class_calc,
        }
    }

    /// `✅` if the classes agree, else `❌`
    pub fn match_symbol(&self) -> &'static str {
        if self.matched {
            "✅"
        } else {
            "❌"
        }
    }

    /// Cells in the order of [`SUMMARY_HEADERS`]
    pub fn cells(&self) -> [String; 13] {
        let opt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        [
            self.log.clone(),
            self.super_blocks.clone(),
            self.insiders.clone(),
            self.outsiders.clone(),
            self.base_score.to_string(),
            opt(self.sb_sb),
            opt(self.out_sb),
            opt(self.out_out),
            self.refinement.to_string(),
            self.final_score.to_string(),
            self.class_real.clone(),
            self.class_calc.clone(),
            self.match_symbol().to_string(),
        ]
    }
}

///
/// Classify all relation matrices in a directory
///
/// Considers every regular file named `<log>_<class>.<json|yaml|yml>` (subdirectories are
/// ignored, other files are skipped with a warning). Files are classified in parallel,
/// the result is sorted by path. A file that cannot be loaded or classified yields an
/// entry with an error instead of aborting the batch.
///
pub fn classify_directory<P: AsRef<Path>>(
    dir: P,
    config: &StructurednessConfig,
) -> Result<Vec<BatchEntry>, StructurednessError> {
    config.validate()?;
    let mut files: Vec<(PathBuf, String, String)> = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if Format::from_path(&path).is_none() {
            tracing::warn!(path = %path.display(), "Skipping file with unsupported extension");
            continue;
        }
        match parse_file_name(&path) {
            Some((log, class_real)) => files.push((path, log, class_real)),
            None => {
                tracing::warn!(path = %path.display(), "Skipping file (cannot parse '<log>_<class>')")
            }
        }
    }
    files.sort();
    tracing::info!(files = files.len(), dir = %dir.as_ref().display(), "Classifying relation matrices");

    Ok(files
        .into_par_iter()
        .map(|(path, log, class_real)| {
            let result = classify_file(&path, config);
            if let Err(e) = &result {
                tracing::warn!(path = %path.display(), error = %e, "Classification failed");
            }
            BatchEntry {
                path,
                log,
                class_real,
                result,
            }
        })
        .collect())
}

/// Write summary rows (with header) as CSV
pub fn write_summary_csv<W: Write>(rows: &[SummaryRow], writer: W) -> Result<(), StructurednessError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(SUMMARY_HEADERS)?;
    for row in rows {
        csv_writer.write_record(row.cells())?;
    }
    csv_writer.flush()?;
    Ok(())
}
