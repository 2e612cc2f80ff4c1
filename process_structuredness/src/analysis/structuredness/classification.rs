use std::fmt::Display;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        process_models::blocks::{Block, SuperBlock},
        relations::{ActivityIndex, RelationMatrix},
    },
    discovery::blocks::{build_super_blocks, detect_blocks, DetectionConfig},
};

use super::{
    score_process::{score_process, ScoringConfig, StructurednessScore},
    StructurednessError,
};

/// Structuredness class of a process
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum StructureClass {
    /// Hardly any control-flow structure
    Unstructured,
    /// Some structured fragments
    LooselyStructured,
    /// Mostly structured
    SemiStructured,
    /// Fully structured
    Structured,
}

impl StructureClass {
    /// Label of the class (e.g., `"semiStructured"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureClass::Unstructured => "unstructured",
            StructureClass::LooselyStructured => "looselyStructured",
            StructureClass::SemiStructured => "semiStructured",
            StructureClass::Structured => "structured",
        }
    }

    /// Parse a class label
    ///
    /// Returns `None` if the string is not a class label
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "unstructured" => Some(StructureClass::Unstructured),
            "looselyStructured" => Some(StructureClass::LooselyStructured),
            "semiStructured" => Some(StructureClass::SemiStructured),
            "structured" => Some(StructureClass::Structured),
            _ => None,
        }
    }
}

impl Display for StructureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
/// Upper (exclusive) score bounds of the structuredness classes
pub struct ClassThresholds {
    /// Scores below are [`StructureClass::Unstructured`]
    pub unstructured: f64,
    /// Scores below are [`StructureClass::LooselyStructured`]
    pub loosely_structured: f64,
    /// Scores below are [`StructureClass::SemiStructured`], all others [`StructureClass::Structured`]
    pub semi_structured: f64,
}

impl Default for ClassThresholds {
    fn default() -> Self {
        Self {
            unstructured: -0.4,
            loosely_structured: 0.25,
            semi_structured: 0.75,
        }
    }
}

impl ClassThresholds {
    /// Class of a final structuredness score
    pub fn classify(&self, score: f64) -> StructureClass {
        if score < self.unstructured {
            StructureClass::Unstructured
        } else if score < self.loosely_structured {
            StructureClass::LooselyStructured
        } else if score < self.semi_structured {
            StructureClass::SemiStructured
        } else {
            StructureClass::Structured
        }
    }

    /// Check that the thresholds are finite and strictly increasing
    pub fn validate(&self) -> Result<(), StructurednessError> {
        let t = [self.unstructured, self.loosely_structured, self.semi_structured];
        if t.iter().any(|v| !v.is_finite()) || !(t[0] < t[1] && t[1] < t[2]) {
            return Err(StructurednessError::InvalidConfig(format!(
                "Class thresholds must be finite and strictly increasing, got {:?}",
                t
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
/// All parameters of the structuredness classification
pub struct StructurednessConfig {
    /// Block detection
    pub detection: DetectionConfig,
    /// Scoring
    pub scoring: ScoringConfig,
    /// Class thresholds
    pub thresholds: ClassThresholds,
}

impl StructurednessConfig {
    /// Serialize parameters to JSON string
    pub fn to_json(&self) -> Result<String, StructurednessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize (and validate) parameters from JSON string
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, StructurednessError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load parameters from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StructurednessError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Validate scoring parameters and class thresholds
    pub fn validate(&self) -> Result<(), StructurednessError> {
        self.scoring.validate()?;
        self.thresholds.validate()
    }
}

///
/// Result of classifying one process
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Detected blocks
    pub blocks: Vec<Block>,
    /// Super-blocks built from the blocks
    pub super_blocks: Vec<SuperBlock>,
    /// Score with all intermediate results
    pub score: StructurednessScore,
    /// Computed class
    pub class: StructureClass,
}

///
/// Classify the structuredness of a process given by its relation matrix
///
/// Runs block detection, builds super-blocks, scores the process and maps the final
/// score to a [`StructureClass`].
///
/// ```
/// use process_structuredness::analysis::structuredness::{classify_process, StructureClass, StructurednessConfig};
/// use process_structuredness::core::relations::RelationMatrix;
///
/// let matrix = RelationMatrix::from_pairs(["a", "b"], [("a", "b", "<d,<=>")]).unwrap();
/// let report = classify_process(&matrix, &StructurednessConfig::default()).unwrap();
/// assert_eq!(report.score.final_score, 1.0);
/// assert_eq!(report.class, StructureClass::Structured);
/// ```
///
pub fn classify_process(
    matrix: &RelationMatrix,
    config: &StructurednessConfig,
) -> Result<ClassificationReport, StructurednessError> {
    config.validate()?;
    let blocks = detect_blocks(matrix, &config.detection)?;
    let super_blocks = build_super_blocks(&blocks, matrix);
    let score = score_process(matrix, &super_blocks, &config.scoring);
    let class = config.thresholds.classify(score.final_score);

    let name = |a: &ActivityIndex| matrix.name(*a).to_string();
    Ok(ClassificationReport {
        blocks: blocks.iter().map(|b| b.map_activities(&name)).collect(),
        super_blocks: super_blocks.iter().map(|sb| sb.map_activities(&name)).collect(),
        score,
        class,
    })
}
