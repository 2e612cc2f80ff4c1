use std::fmt::Display;
use std::io::{Read, Write};
use std::path::Path;

/// File formats relation data can be read from and written to
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Format {
    /// JSON (`.json`)
    Json,
    /// YAML (`.yaml`, `.yml`)
    Yaml,
}

impl Format {
    /// Parse a format name or file extension (case-insensitive, leading `.` allowed)
    ///
    /// e.g., `".YML"` -> [`Format::Yaml`]
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// Format of a file, given by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::parse_str)
    }

    /// Canonical file extension (without `.`)
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A path or format name that does not correspond to a supported [`Format`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedFormat(pub String);

impl Display for UnsupportedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unsupported format: {}", self.0)
    }
}

impl std::error::Error for UnsupportedFormat {}

/// Types that can be read in one of the supported [`Format`]s
pub trait Importable: Sized {
    /// The error type returned by import operations
    type Error: std::error::Error
        + Send
        + Sync
        + 'static
        + From<std::io::Error>
        + From<UnsupportedFormat>;

    /// Import from a reader in the given format
    fn import_from_reader<R: Read>(reader: R, format: Format) -> Result<Self, Self::Error>;

    /// Import from a file, choosing the format by the file extension
    fn import_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Self::Error> {
        let path = path.as_ref();
        let format = Format::from_path(path)
            .ok_or_else(|| UnsupportedFormat(path.display().to_string()))?;
        let file = std::fs::File::open(path)?;
        Self::import_from_reader(std::io::BufReader::new(file), format)
    }

    /// Import from a string in the given format
    fn import_from_str(content: &str, format: Format) -> Result<Self, Self::Error> {
        Self::import_from_reader(content.as_bytes(), format)
    }
}

/// Types that can be written in one of the supported [`Format`]s
pub trait Exportable {
    /// The error type returned by export operations
    type Error: std::error::Error
        + Send
        + Sync
        + 'static
        + From<std::io::Error>
        + From<UnsupportedFormat>;

    /// Export to a writer in the given format
    fn export_to_writer<W: Write>(&self, writer: W, format: Format) -> Result<(), Self::Error>;

    /// Export to a file, choosing the format by the file extension
    fn export_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::Error> {
        let path = path.as_ref();
        let format = Format::from_path(path)
            .ok_or_else(|| UnsupportedFormat(path.display().to_string()))?;
        let file = std::fs::File::create(path)?;
        self.export_to_writer(std::io::BufWriter::new(file), format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relations::{io::RelationIOError, RelationMatrix};

    #[test]
    fn formats_from_names_and_paths() {
        assert_eq!(
            Format::from_path(Path::new("dir/Log01_structured.JSON")),
            Some(Format::Json)
        );
        assert_eq!(Format::parse_str(".yml"), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("no_extension")), None);
        assert_eq!(Format::parse_str("xes"), None);
        assert_eq!(Format::Yaml.to_string(), "yaml");
    }

    #[test]
    fn export_then_import_path() {
        let matrix = RelationMatrix::from_pairs(["a", "b"], [("a", "b", "<d,<=>")]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        for name in ["m.json", "m.yaml"] {
            let path = dir.path().join(name);
            matrix.export_to_path(&path).unwrap();
            let imported = RelationMatrix::import_from_path(&path).unwrap();
            assert_eq!(imported, matrix);
        }
        assert!(matches!(
            RelationMatrix::import_from_path(dir.path().join("missing.json")),
            Err(RelationIOError::IO(_))
        ));
        assert!(matches!(
            matrix.export_to_path(dir.path().join("m.xml")),
            Err(RelationIOError::UnsupportedFormat(_))
        ));
    }
}
