use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::{
    process_models::blocks::SuperBlock,
    relations::{ActivityIndex, RelationMatrix},
};

use super::{
    base_score::{compute_base_score, super_block_label, BaseScore},
    refinement::{refine_out_to_out, refine_out_to_sb, refine_sb_to_sb, UnscoredRelation},
    weights::{compute_refinement_weights, RefinementWeightConfig, RefinementWeights},
    StructurednessError,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
/// Parameters of the structuredness score
pub struct ScoringConfig {
    /// Penalty factor for the normalized entropy (fragmentation) of the coverage
    pub entropy_penalty: f64,
    /// Exponent applied to the total coverage (penalizes outsiders)
    pub outsider_penalty_exponent: f64,
    /// Adaptive refinement weights
    pub weights: RefinementWeightConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            entropy_penalty: 0.4,
            outsider_penalty_exponent: 1.5,
            weights: RefinementWeightConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Check that all parameters are finite and non-negative
    pub fn validate(&self) -> Result<(), StructurednessError> {
        let w = &self.weights;
        let params = [
            ("entropy_penalty", self.entropy_penalty),
            ("outsider_penalty_exponent", self.outsider_penalty_exponent),
            ("weights.pair_sum", w.pair_sum),
            ("weights.imbalance_gamma", w.imbalance_gamma),
            ("weights.bridge_base", w.bridge_base),
            ("weights.bridge_strength", w.bridge_strength),
            ("weights.bridge_gamma", w.bridge_gamma),
        ];
        for (name, value) in params {
            if !value.is_finite() || value < 0.0 {
                return Err(StructurednessError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Weighted refinement term
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RefinementTerm {
    /// Average pair score
    pub raw: f64,
    /// Adaptive weight
    pub weight: f64,
    /// `weight * raw`
    pub weighted: f64,
}

impl RefinementTerm {
    fn new(raw: f64, weight: f64) -> Self {
        Self {
            raw,
            weight,
            weighted: weight * raw,
        }
    }
}

///
/// Structuredness score of a process with all intermediate results
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructurednessScore {
    /// Summary of the number of super-blocks (e.g., `"2 SB"`)
    pub super_block_label: String,
    /// Coverage/fragmentation score
    pub base: BaseScore,
    /// Refinement weights
    pub weights: RefinementWeights,
    /// SB vs. SB refinement (`None` for less than two super-blocks)
    pub sb_to_sb: Option<RefinementTerm>,
    /// Out vs. SB refinement (`None` without super-blocks or outsiders)
    pub out_to_sb: Option<RefinementTerm>,
    /// Out vs. Out refinement (`None` for less than two outsiders)
    pub out_to_out: Option<RefinementTerm>,
    /// Sum of all weighted refinements
    pub refinement: f64,
    /// Base score plus refinement
    pub final_score: f64,
    /// Activities covered by a super-block (sorted)
    pub insiders: Vec<String>,
    /// Activities not covered by any super-block (sorted)
    pub outsiders: Vec<String>,
    /// Activity pairs scored with 0 because their relation is not in the score table
    pub unscored: Vec<UnscoredRelation>,
}

///
/// Score the structuredness of a process given its super-blocks
///
/// The final score is the base score plus all computable weighted refinements.
///
pub fn score_process(
    matrix: &RelationMatrix,
    super_blocks: &[SuperBlock<ActivityIndex>],
    config: &ScoringConfig,
) -> StructurednessScore {
    let insiders: BTreeSet<ActivityIndex> = super_blocks
        .iter()
        .flat_map(|sb| sb.full_activities())
        .collect();
    let outsiders: Vec<ActivityIndex> = matrix.indices().filter(|a| !insiders.contains(a)).collect();

    let base = compute_base_score(super_blocks, matrix.len(), config);
    let weights = compute_refinement_weights(matrix.len(), super_blocks, &config.weights);

    let mut unscored = Vec::new();
    let sb_to_sb = refine_sb_to_sb(matrix, super_blocks, &mut unscored)
        .map(|raw| RefinementTerm::new(raw, weights.sb_sb));
    let out_to_sb = refine_out_to_sb(matrix, &outsiders, super_blocks, &mut unscored)
        .map(|raw| RefinementTerm::new(raw, weights.out_sb));
    let out_to_out = refine_out_to_out(matrix, &outsiders, &mut unscored)
        .map(|raw| RefinementTerm::new(raw, weights.out_out));

    let refinement: f64 = [sb_to_sb, out_to_sb, out_to_out]
        .iter()
        .flatten()
        .map(|t| t.weighted)
        .sum();
    let final_score = base.score + refinement;
    tracing::debug!(
        base = base.score,
        refinement,
        final_score,
        "Structuredness score computed"
    );

    StructurednessScore {
        super_block_label: super_block_label(super_blocks.len()),
        base,
        weights,
        sb_to_sb,
        out_to_sb,
        out_to_out,
        refinement,
        final_score,
        insiders: matrix.acts_to_names(&insiders),
        outsiders: matrix.acts_to_names(&outsiders),
        unscored,
    }
}
