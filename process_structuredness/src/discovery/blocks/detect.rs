use std::collections::BTreeSet;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::{
    process_models::blocks::Block,
    relations::{ActivityIndex, RelationMatrix},
};

use super::{
    graph_utils::RelationGraph,
    optional::get_optional_blocks,
    redundancy::remove_duplicate_blocks_from_nesting,
    sequence::get_sequences,
    BlockDetectionError,
};

///
/// Order in which candidate split activities are visited during XOR/PAR detection
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum TraversalOrder {
    /// Lexicographic order of activity labels
    #[default]
    Canonical,
    /// Pseudo-random order, reproducible for the same seed
    Shuffled {
        /// Seed of the random number generator
        seed: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
/// Parameters for block detection
pub struct DetectionConfig {
    /// Traversal order of activities
    pub traversal: TraversalOrder,
    /// Maximal number of XOR branches for which all orderings are tried during exclusivity repair
    pub max_repair_branches: usize,
    /// If the branch limit is exceeded, repair greedily in construction order instead of failing
    pub greedy_repair_fallback: bool,
    /// Maximal depth of XOR/PAR blocks nested into each other
    pub max_nesting_depth: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            traversal: TraversalOrder::Canonical,
            max_repair_branches: 8,
            greedy_repair_fallback: false,
            max_nesting_depth: 8,
        }
    }
}

/// Shared state of XOR and PAR detection (which call each other for nested blocks)
#[derive(Debug)]
pub(crate) struct Detector<'a> {
    pub(crate) graph: RelationGraph<'a>,
    pub(crate) config: &'a DetectionConfig,
    order: Vec<ActivityIndex>,
}

impl<'a> Detector<'a> {
    pub(crate) fn new(matrix: &'a RelationMatrix, config: &'a DetectionConfig) -> Self {
        let mut order: Vec<ActivityIndex> = matrix.indices().collect();
        if let TraversalOrder::Shuffled { seed } = config.traversal {
            let mut rng = StdRng::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }
        Self {
            graph: RelationGraph::new(matrix),
            config,
            order,
        }
    }

    /// All activities in traversal order
    pub(crate) fn order(&self) -> &[ActivityIndex] {
        &self.order
    }

    /// Activities of `acts` in traversal order
    pub(crate) fn restrict(&self, acts: &BTreeSet<ActivityIndex>) -> Vec<ActivityIndex> {
        self.order
            .iter()
            .copied()
            .filter(|a| acts.contains(a))
            .collect()
    }
}

///
/// Detect all blocks of a process given only its pairwise activity relations
///
/// XOR, PAR, OPTIONAL and SEQUENCE blocks are detected independently. Afterwards,
/// blocks that are already covered by a block of another type are removed:
/// * XOR blocks contained in a PAR block (and vice versa)
/// * sequences contained in an XOR or PAR block (including split and merge)
///
/// The result is sorted canonically (XOR, PAR, OPTIONAL, SEQUENCE, then by activities).
///
pub fn detect_blocks(
    matrix: &RelationMatrix,
    config: &DetectionConfig,
) -> Result<Vec<Block<ActivityIndex>>, BlockDetectionError> {
    let detector = Detector::new(matrix, config);
    let acts = detector.order().to_vec();

    let xor_blocks = detector.xor_blocks(&acts, 0)?;
    let par_blocks = detector.par_blocks(&acts, 0)?;
    let optional_blocks = get_optional_blocks(&detector.graph, &acts, &xor_blocks);
    let seq_blocks = get_sequences(&detector.graph, &acts);

    let xor_clean = remove_duplicate_blocks_from_nesting(xor_blocks.clone(), &par_blocks, false);
    let par_clean = remove_duplicate_blocks_from_nesting(par_blocks.clone(), &xor_blocks, false);
    let seq_clean = remove_duplicate_blocks_from_nesting(
        remove_duplicate_blocks_from_nesting(seq_blocks, &xor_blocks, true),
        &par_blocks,
        true,
    );

    let mut blocks: Vec<Block<ActivityIndex>> = xor_clean
        .into_iter()
        .chain(par_clean)
        .chain(optional_blocks)
        .chain(seq_clean)
        .collect();
    blocks.sort();
    tracing::debug!(
        activities = matrix.len(),
        blocks = blocks.len(),
        "Block detection finished"
    );
    Ok(blocks)
}

/// Same as [`detect_blocks`], but with activity labels instead of indices
pub fn detect_blocks_named(
    matrix: &RelationMatrix,
    config: &DetectionConfig,
) -> Result<Vec<Block>, BlockDetectionError> {
    Ok(detect_blocks(matrix, config)?
        .iter()
        .map(|b| b.map_activities(&|a: &ActivityIndex| matrix.name(*a).to_string()))
        .collect())
}
