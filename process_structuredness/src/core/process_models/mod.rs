//! Process model fragments inferred from activity relations

/// Control-flow [`blocks::Block`]s and [`blocks::SuperBlock`]s
pub mod blocks;
