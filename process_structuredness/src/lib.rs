#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![doc = include_str!("../README.md")]

///
/// Core data structures: activity relations and blocks
///
pub mod core;

///
/// Discovery of control-flow blocks from activity relations
///
pub mod discovery;

///
/// Structuredness analysis of processes
///
pub mod analysis;

/// Util module with test helpers
pub mod utils;

#[doc(inline)]
pub use crate::core::{
    io::{Exportable, Format, Importable},
    relations::{Relation, RelationMatrix},
    Block, BlockEntry, BlockType, SuperBlock,
};

#[doc(inline)]
pub use discovery::blocks::{build_super_blocks, detect_blocks, DetectionConfig};

#[doc(inline)]
pub use analysis::structuredness::{
    classify_directory, classify_process, ClassificationReport, StructureClass,
    StructurednessConfig, StructurednessError,
};
