//! Import and export of [`RelationMatrix`]
//!
//! Supported formats:
//! * `json`: nested map `from -> to -> "<temporal>,<existential>"`
//! * `yaml`/`yml`: either the same nested map, or an activity relationship matrix
//!   export (`metadata.activities` + `dependencies`, see [`ArMatrixExport`])
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::io::{Exportable, Format, Importable, UnsupportedFormat};

use super::relation_matrix_struct::RawRelationMatrix;
use super::{Relation, RelationMatrix, RelationMatrixError};

///
/// Error encountered while importing or exporting a [`RelationMatrix`]
///
#[derive(Debug)]
pub enum RelationIOError {
    /// IO error
    IO(std::io::Error),
    /// JSON (de-)serialization error
    Json(serde_json::Error),
    /// YAML (de-)serialization error
    Yaml(serde_yaml::Error),
    /// The parsed content is not a valid relation matrix
    Matrix(RelationMatrixError),
    /// File format is not supported
    UnsupportedFormat(String),
}

impl Display for RelationIOError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationIOError::IO(e) => write!(f, "IO Error: {}", e),
            RelationIOError::Json(e) => write!(f, "JSON Error: {}", e),
            RelationIOError::Yaml(e) => write!(f, "YAML Error: {}", e),
            RelationIOError::Matrix(e) => write!(f, "Invalid relation matrix: {}", e),
            RelationIOError::UnsupportedFormat(s) => write!(f, "Unsupported format: {}", s),
        }
    }
}

impl std::error::Error for RelationIOError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelationIOError::IO(e) => Some(e),
            RelationIOError::Json(e) => Some(e),
            RelationIOError::Yaml(e) => Some(e),
            RelationIOError::Matrix(e) => Some(e),
            RelationIOError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<UnsupportedFormat> for RelationIOError {
    fn from(e: UnsupportedFormat) -> Self {
        Self::UnsupportedFormat(e.0)
    }
}

impl From<std::io::Error> for RelationIOError {
    fn from(e: std::io::Error) -> Self {
        Self::IO(e)
    }
}

impl From<serde_json::Error> for RelationIOError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<serde_yaml::Error> for RelationIOError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml(e)
    }
}

impl From<RelationMatrixError> for RelationIOError {
    fn from(e: RelationMatrixError) -> Self {
        Self::Matrix(e)
    }
}

/// Unicode symbols used by activity relationship matrix exports and their ASCII counterparts
const SYMBOL_MAP: &[(&str, &str)] = &[
    ("≺", "<"),
    ("≻", ">"),
    ("⇔", "<=>"),
    ("⇎", "</=>"),
    ("⇒", "=>"),
    ("⇐", "<="),
];

///
/// Activity relationship matrix as exported (YAML) by AR-matrix discovery tools
///
/// Only the fields needed for conversion are modeled, everything else is ignored.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArMatrixExport {
    /// Export metadata (listing all activities)
    #[serde(default)]
    pub metadata: ArMatrixMetadata,
    /// Pairwise dependencies
    #[serde(default)]
    pub dependencies: Vec<ArDependency>,
}

/// Metadata of an [`ArMatrixExport`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArMatrixMetadata {
    /// All activities of the matrix
    #[serde(default)]
    pub activities: Vec<String>,
}

/// A single dependency `(from, to)` of an [`ArMatrixExport`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArDependency {
    /// Source activity
    pub from: Option<String>,
    /// Target activity
    pub to: Option<String>,
    /// Temporal dependency
    #[serde(default)]
    pub temporal: ArSymbol,
    /// Existential dependency
    #[serde(default)]
    pub existential: ArSymbol,
}

/// Symbol of a dependency (e.g., `"≺d"` or `"⇔"`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArSymbol {
    /// The symbol; missing or empty means no dependency
    #[serde(default)]
    pub symbol: Option<String>,
}

///
/// Normalize a temporal or existential symbol of an AR-matrix export
///
/// Unicode symbols are replaced by their ASCII equivalent, for temporal symbols
/// the letter `t` is removed. Empty symbols become `"-"`.
///
pub fn normalize_symbol(symbol: &str, remove_t: bool) -> String {
    let mut s = symbol.trim().to_string();
    if remove_t {
        s = s.replace('t', "");
    }
    for (from, to) in SYMBOL_MAP {
        s = s.replace(from, to);
    }
    if s.is_empty() {
        "-".to_string()
    } else {
        s
    }
}

impl ArMatrixExport {
    ///
    /// Convert to the nested label map of the JSON exchange format
    ///
    /// All pairs default to `"-,-"`. Dependencies naming an activity that is not
    /// listed in the metadata are skipped.
    ///
    pub fn to_raw_matrix(&self) -> RawRelationMatrix {
        let unrelated = Relation::UNRELATED.to_string();
        let mut raw: RawRelationMatrix = self
            .metadata
            .activities
            .iter()
            .map(|a| {
                let row: BTreeMap<String, String> = self
                    .metadata
                    .activities
                    .iter()
                    .map(|b| (b.clone(), unrelated.clone()))
                    .collect();
                (a.clone(), row)
            })
            .collect();
        for dep in &self.dependencies {
            let (Some(from), Some(to)) = (&dep.from, &dep.to) else {
                continue;
            };
            let Some(entry) = raw.get_mut(from).and_then(|row| row.get_mut(to)) else {
                tracing::debug!("Skipping dependency ({}, {}) with unknown activity", from, to);
                continue;
            };
            let temporal = normalize_symbol(dep.temporal.symbol.as_deref().unwrap_or(""), true);
            let existential =
                normalize_symbol(dep.existential.symbol.as_deref().unwrap_or(""), false);
            *entry = format!("{},{}", temporal, existential);
        }
        raw
    }

    /// Convert to a validated [`RelationMatrix`]
    pub fn to_relation_matrix(&self) -> Result<RelationMatrix, RelationMatrixError> {
        RelationMatrix::from_raw(&self.to_raw_matrix())
    }
}

fn is_ar_matrix_export(value: &serde_yaml::Value) -> bool {
    value.get("metadata").is_some() || value.get("dependencies").is_some()
}

/// Import a [`RelationMatrix`] from YAML (either a nested map or an [`ArMatrixExport`])
pub fn import_relation_matrix_yaml(yaml: &str) -> Result<RelationMatrix, RelationIOError> {
    if yaml.trim().is_empty() {
        return Ok(ArMatrixExport::default().to_relation_matrix()?);
    }
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    if is_ar_matrix_export(&value) {
        let export: ArMatrixExport = serde_yaml::from_value(value)?;
        Ok(export.to_relation_matrix()?)
    } else {
        let raw: RawRelationMatrix = serde_yaml::from_value(value)?;
        Ok(RelationMatrix::from_raw(&raw)?)
    }
}

/// Import a [`RelationMatrix`] from the nested JSON map
pub fn import_relation_matrix_json(json: &str) -> Result<RelationMatrix, RelationIOError> {
    let raw: RawRelationMatrix = serde_json::from_str(json)?;
    Ok(RelationMatrix::from_raw(&raw)?)
}

///
/// Convert a YAML AR-matrix export into a JSON relation matrix file
///
/// If `out_path` is `None`, the output is written next to the input with a `.json` extension.
/// Returns the path of the written file.
///
pub fn convert_ar_matrix_yaml_to_json<P: AsRef<Path>>(
    yaml_path: P,
    out_path: Option<&Path>,
) -> Result<PathBuf, RelationIOError> {
    let yaml_path = yaml_path.as_ref();
    let out_path = match out_path {
        Some(p) => p.to_path_buf(),
        None => yaml_path.with_extension("json"),
    };
    let matrix = RelationMatrix::import_from_path(yaml_path)?;
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(&out_path)?;
    matrix.export_to_writer(std::io::BufWriter::new(file), Format::Json)?;
    Ok(out_path)
}

impl Importable for RelationMatrix {
    type Error = RelationIOError;

    fn import_from_reader<R: Read>(mut reader: R, format: Format) -> Result<Self, Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        match format {
            Format::Json => import_relation_matrix_json(&content),
            Format::Yaml => import_relation_matrix_yaml(&content),
        }
    }
}

impl Exportable for RelationMatrix {
    type Error = RelationIOError;

    fn export_to_writer<W: Write>(&self, writer: W, format: Format) -> Result<(), Self::Error> {
        match format {
            Format::Json => Ok(serde_json::to_writer_pretty(writer, &self.to_raw())?),
            Format::Yaml => Ok(serde_yaml::to_writer(writer, &self.to_raw())?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::get_test_data_path;

    const AR_EXPORT: &str = r#"
metadata:
  activities: [a, b, c]
  traces: 12
dependencies:
  - from: a
    to: b
    temporal: { symbol: "≺d" }
    existential: { symbol: "⇔" }
  - from: b
    to: a
    temporal: { symbol: "≻d" }
    existential: { symbol: "⇔" }
  - from: a
    to: c
    temporal: { symbol: "" }
    existential: { symbol: "⇎" }
  - from: c
    to: a
    temporal: { symbol: null }
    existential: { symbol: "⇎" }
  - from: a
    to: x
    temporal: { symbol: "≺" }
    existential: { symbol: "⇔" }
"#;

    #[test]
    fn normalize_symbols() {
        assert_eq!(normalize_symbol("≺t", true), "<");
        assert_eq!(normalize_symbol(" ≻d ", true), ">d");
        assert_eq!(normalize_symbol("⇎", false), "</=>");
        assert_eq!(normalize_symbol("", false), "-");
        assert_eq!(normalize_symbol("t", true), "-");
    }

    #[test]
    fn convert_ar_matrix_export() {
        let matrix = import_relation_matrix_yaml(AR_EXPORT).unwrap();
        assert_eq!(matrix.activities(), &["a", "b", "c"]);
        assert_eq!(matrix.relation_by_name("a", "b").unwrap().to_string(), "<d,<=>");
        assert_eq!(matrix.relation_by_name("c", "a").unwrap().to_string(), "-,</=>");
        assert_eq!(
            matrix.relation_by_name("b", "c").unwrap(),
            Relation::UNRELATED
        );
    }

    #[test]
    fn ar_matrix_export_is_validated() {
        // (b, a) is missing, so the default "-,-" is not the mirror of (a, b)
        let yaml = r#"
metadata:
  activities: [a, b]
dependencies:
  - from: a
    to: b
    temporal: { symbol: "≺" }
    existential: { symbol: "⇔" }
"#;
        let res = import_relation_matrix_yaml(yaml);
        assert!(matches!(
            res,
            Err(RelationIOError::Matrix(
                RelationMatrixError::InconsistentRelations { .. }
            ))
        ));
    }

    #[test]
    fn nested_yaml_map() {
        let yaml = "a: {a: '-,-', b: '<,=>'}\nb: {a: '>,<=', b: '-,-'}\n";
        let matrix = RelationMatrix::import_from_str(yaml, Format::Yaml).unwrap();
        assert_eq!(matrix.relation_by_name("a", "b").unwrap().to_string(), "<,=>");
    }

    #[test]
    fn self_relations_may_be_omitted() {
        let seq = RelationMatrix::import_from_str(
            r#"{"a": {"b": "<d,<=>"}, "b": {"a": ">d,<=>"}}"#,
            Format::Json,
        )
        .unwrap();
        assert_eq!(seq.relation_by_name("a", "a").unwrap(), Relation::UNRELATED);
        assert_eq!(seq.relation_by_name("a", "b").unwrap().to_string(), "<d,<=>");

        let choice = RelationMatrix::import_from_str(
            r#"{
                "a": {"b": "-,</=>", "c": "-,</=>"},
                "b": {"a": "-,</=>", "c": "-,</=>"},
                "c": {"a": "-,</=>", "b": "-,</=>"}
            }"#,
            Format::Json,
        )
        .unwrap();
        assert_eq!(choice.activities(), &["a", "b", "c"]);
        assert!(choice.never(0, 2));

        let independent =
            RelationMatrix::import_from_str(r#"{"a": {"b": "-,-"}, "b": {"a": "-,-"}}"#, Format::Json)
                .unwrap();
        assert_eq!(independent.len(), 2);

        // present self-relations are still checked, other pairs must not be missing
        assert!(matches!(
            RelationMatrix::import_from_str(r#"{"a": {"a": "<,-"}}"#, Format::Json),
            Err(RelationIOError::Matrix(
                RelationMatrixError::InvalidSelfRelation { .. }
            ))
        ));
        assert!(matches!(
            RelationMatrix::import_from_str(r#"{"a": {"b": "<d,<=>"}, "b": {}}"#, Format::Json),
            Err(RelationIOError::Matrix(RelationMatrixError::MissingRelation { .. }))
        ));
    }

    #[test]
    fn unsupported_format() {
        let res = RelationMatrix::import_from_path("Log01_structured.xes");
        assert!(
            matches!(res, Err(RelationIOError::UnsupportedFormat(f)) if f == "Log01_structured.xes")
        );
    }

    #[test]
    fn convert_yaml_file_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("Log07_semiStructured.yaml");
        std::fs::write(&yaml_path, AR_EXPORT).unwrap();
        let out = convert_ar_matrix_yaml_to_json(&yaml_path, None).unwrap();
        assert_eq!(out, dir.path().join("Log07_semiStructured.json"));

        let json = std::fs::read_to_string(&out).unwrap();
        let raw: RawRelationMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["b"]["a"], ">d,<=>");
        assert_eq!(raw["a"]["a"], "-,-");
    }

    #[test]
    fn import_ar_export_fixture() {
        let path = get_test_data_path().join("ar_export").join("Seq_structured.yaml");
        let matrix = RelationMatrix::import_from_path(path).unwrap();
        assert_eq!(matrix.activities(), &["archive", "check", "register"]);
        assert_eq!(
            matrix.relation_by_name("register", "archive").unwrap().to_string(),
            "<,<=>"
        );
        assert_eq!(
            matrix.relation_by_name("check", "register").unwrap().to_string(),
            ">d,<=>"
        );
    }
}
