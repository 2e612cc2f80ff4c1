//! Core data structures: activity relations, relation matrices and inferred blocks

/// IO Traits
pub mod io;

pub mod process_models;
pub mod relations;

pub use process_models::blocks::{Block, BlockEntry, BlockType, SuperBlock};
pub use relations::{Existential, Relation, RelationMatrix, Temporal};
