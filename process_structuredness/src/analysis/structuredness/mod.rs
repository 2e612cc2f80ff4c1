//! Structuredness Score
//!
//! Scores how structured a process is based on its [`SuperBlock`](crate::core::SuperBlock)s:
//! a base score rewarding large, unfragmented coverage, refined by the relations between
//! super-blocks and the activities outside of them ("outsiders").
//! The final score is mapped to a [`StructureClass`].

use std::fmt::Display;

use crate::{core::relations::io::RelationIOError, discovery::blocks::BlockDetectionError};

/// Coverage and entropy based base score
pub mod base_score;
/// Classification of directories of relation matrices
pub mod batch;
/// Classes, thresholds and the full classification pipeline
pub mod classification;
/// Refinement terms
pub mod refinement;
/// Combination of base score and refinements
pub mod score_process;
/// Score tables of the refinement terms
pub mod tables;
/// Adaptive refinement weights
pub mod weights;

#[doc(inline)]
pub use batch::{classify_directory, write_summary_csv, BatchEntry, SummaryRow};
#[doc(inline)]
pub use classification::{
    classify_process, ClassThresholds, ClassificationReport, StructureClass, StructurednessConfig,
};
#[doc(inline)]
pub use score_process::{score_process, ScoringConfig, StructurednessScore};

///
/// Error encountered while classifying processes
///
#[derive(Debug)]
pub enum StructurednessError {
    /// Reading a file or directory failed
    IO(std::io::Error),
    /// The relation matrix could not be loaded
    Matrix(RelationIOError),
    /// Block detection failed
    Detection(BlockDetectionError),
    /// (De-)Serializing a configuration failed
    Json(serde_json::Error),
    /// Writing CSV failed
    Csv(csv::Error),
    /// A parameter is out of range
    InvalidConfig(String),
}

impl Display for StructurednessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructurednessError::IO(e) => write!(f, "IO error: {}", e),
            StructurednessError::Matrix(e) => write!(f, "Could not load relation matrix: {}", e),
            StructurednessError::Detection(e) => write!(f, "Block detection failed: {}", e),
            StructurednessError::Json(e) => write!(f, "JSON error: {}", e),
            StructurednessError::Csv(e) => write!(f, "CSV error: {}", e),
            StructurednessError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for StructurednessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StructurednessError::IO(e) => Some(e),
            StructurednessError::Matrix(e) => Some(e),
            StructurednessError::Detection(e) => Some(e),
            StructurednessError::Json(e) => Some(e),
            StructurednessError::Csv(e) => Some(e),
            StructurednessError::InvalidConfig(_) => None,
        }
    }
}

impl From<std::io::Error> for StructurednessError {
    fn from(e: std::io::Error) -> Self {
        Self::IO(e)
    }
}

impl From<RelationIOError> for StructurednessError {
    fn from(e: RelationIOError) -> Self {
        Self::Matrix(e)
    }
}

impl From<BlockDetectionError> for StructurednessError {
    fn from(e: BlockDetectionError) -> Self {
        Self::Detection(e)
    }
}

impl From<serde_json::Error> for StructurednessError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<csv::Error> for StructurednessError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}
