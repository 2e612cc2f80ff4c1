//! Block Detection
//!
//! Infers XOR, PAR, OPTIONAL and SEQUENCE [`Block`](crate::core::Block)s from a
//! [`RelationMatrix`](crate::core::RelationMatrix) and chains them into
//! [`SuperBlock`](crate::core::SuperBlock)s.
//!
//! ```
//! use process_structuredness::core::relations::RelationMatrix;
//! use process_structuredness::discovery::blocks::{build_super_blocks, detect_blocks, DetectionConfig};
//!
//! let matrix = RelationMatrix::from_pairs(["a", "b"], [("a", "b", "<d,<=>")]).unwrap();
//! let blocks = detect_blocks(&matrix, &DetectionConfig::default()).unwrap();
//! let super_blocks = build_super_blocks(&blocks, &matrix);
//! assert_eq!(super_blocks.len(), 1);
//! ```
use std::fmt::Display;

/// (Direct) predecessor/successor sets and order queries
pub mod graph_utils;
/// Full block detection
pub mod detect;
/// Repair of XOR branches violating mutual exclusivity
pub mod exclusivity_repair;
/// Optional block detection
pub mod optional;
/// PAR block detection
pub mod par;
/// Filters removing duplicated and nested blocks
pub mod redundancy;
/// Sequence block detection
pub mod sequence;
/// Chaining blocks into super-blocks
pub mod super_blocks;
/// XOR block detection
pub mod xor;

#[doc(inline)]
pub use detect::{detect_blocks, detect_blocks_named, DetectionConfig, TraversalOrder};
#[doc(inline)]
pub use graph_utils::RelationGraph;
#[doc(inline)]
pub use super_blocks::{build_super_blocks, build_super_blocks_named};

///
/// Error encountered during block detection
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockDetectionError {
    /// The predecessor relation contains a cycle through the given activity
    PredecessorCycle {
        /// Activity that was visited twice
        activity: String,
    },
    /// An XOR candidate has more branches than the exclusivity repair may permute
    RepairLimitExceeded {
        /// Number of branches of the candidate
        branches: usize,
        /// Configured limit ([`DetectionConfig::max_repair_branches`])
        limit: usize,
    },
}

impl Display for BlockDetectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockDetectionError::PredecessorCycle { activity } => write!(
                f,
                "Predecessor relation contains a cycle through activity '{}'",
                activity
            ),
            BlockDetectionError::RepairLimitExceeded { branches, limit } => write!(
                f,
                "XOR exclusivity repair needed for {} branches, but at most {} branches are permuted (enable the greedy repair fallback or raise the limit)",
                branches, limit
            ),
        }
    }
}

impl std::error::Error for BlockDetectionError {}
