use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::process_models::blocks::SuperBlock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
/// Parameters of the adaptive refinement weights
pub struct RefinementWeightConfig {
    /// Sum of the SB vs. SB and Out vs. Out weights
    pub pair_sum: f64,
    /// Sensitivity of the SB vs. SB / Out vs. Out trade-off to the imbalance
    pub imbalance_gamma: f64,
    /// Out vs. SB weight for perfectly balanced processes
    pub bridge_base: f64,
    /// Maximal relative shrinkage of the Out vs. SB weight (in `[0, 1]`)
    pub bridge_strength: f64,
    /// Sensitivity of the Out vs. SB weight to the imbalance
    pub bridge_gamma: f64,
}

impl Default for RefinementWeightConfig {
    fn default() -> Self {
        Self {
            pair_sum: 2.0,
            imbalance_gamma: 1.0,
            bridge_base: 2.0,
            bridge_strength: 1.0,
            bridge_gamma: 1.0,
        }
    }
}

/// Weights of the three refinement terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RefinementWeights {
    /// Weight of the SB vs. SB refinement
    pub sb_sb: f64,
    /// Weight of the Out vs. SB refinement
    pub out_sb: f64,
    /// Weight of the Out vs. Out refinement
    pub out_out: f64,
}

///
/// Compute the refinement weights of a process with `activity_count` activities
///
/// The imbalance `(covered - outsiders) / activity_count` shifts the weight budget
/// `pair_sum` towards SB vs. SB (mostly covered) or Out vs. Out (mostly outsiders).
/// The Out vs. SB weight is maximal for balanced processes.
///
/// Degenerate cases:
/// * no covered activities: only Out vs. Out (`pair_sum`)
/// * no outsiders: only SB vs. SB (`pair_sum`)
/// * one super-block and one outsider: only Out vs. SB (`bridge_base`)
///
pub fn compute_refinement_weights<A: Ord + Clone>(
    activity_count: usize,
    super_blocks: &[SuperBlock<A>],
    config: &RefinementWeightConfig,
) -> RefinementWeights {
    let covered: BTreeSet<A> = super_blocks
        .iter()
        .flat_map(|sb| sb.full_activities())
        .collect();
    let n_sb_acts = covered.len();
    let n_outs = activity_count.saturating_sub(n_sb_acts);

    if n_sb_acts == 0 {
        return RefinementWeights {
            sb_sb: 0.0,
            out_sb: 0.0,
            out_out: config.pair_sum,
        };
    }
    if n_outs == 0 {
        return RefinementWeights {
            sb_sb: config.pair_sum,
            out_sb: 0.0,
            out_out: 0.0,
        };
    }
    if n_outs == 1 && super_blocks.len() == 1 {
        return RefinementWeights {
            sb_sb: 0.0,
            out_sb: config.bridge_base,
            out_out: 0.0,
        };
    }

    let imbalance = (n_sb_acts as f64 - n_outs as f64) / activity_count as f64;
    // sign-preserving, so fractional gammas stay defined for negative imbalances
    let weighted_imbalance = imbalance.signum() * imbalance.abs().powf(config.imbalance_gamma);
    let sb_sb = config.pair_sum * ((weighted_imbalance + 1.0) / 2.0);
    let out_out = config.pair_sum - sb_sb;
    let bridge_shrinkage = config.bridge_strength * imbalance.abs().powf(config.bridge_gamma);
    let out_sb = config.bridge_base * (1.0 - bridge_shrinkage);

    RefinementWeights {
        sb_sb,
        out_sb,
        out_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covering(n: u32) -> SuperBlock<u32> {
        SuperBlock {
            start: None,
            end: None,
            activities: (0..n).collect(),
        }
    }

    #[test]
    fn degenerate_cases() {
        let config = RefinementWeightConfig::default();
        let none: Vec<SuperBlock<u32>> = Vec::new();
        assert_eq!(
            compute_refinement_weights(3, &none, &config),
            RefinementWeights { sb_sb: 0.0, out_sb: 0.0, out_out: 2.0 }
        );
        assert_eq!(
            compute_refinement_weights(3, &[covering(3)], &config),
            RefinementWeights { sb_sb: 2.0, out_sb: 0.0, out_out: 0.0 }
        );
        assert_eq!(
            compute_refinement_weights(4, &[covering(3)], &config),
            RefinementWeights { sb_sb: 0.0, out_sb: 2.0, out_out: 0.0 }
        );
    }

    #[test]
    fn balanced_process() {
        let config = RefinementWeightConfig::default();
        let w = compute_refinement_weights(4, &[covering(2)], &config);
        assert_eq!(w, RefinementWeights { sb_sb: 1.0, out_sb: 2.0, out_out: 1.0 });
    }

    #[test]
    fn mostly_outsiders() {
        let config = RefinementWeightConfig::default();
        // imbalance (1 - 3) / 4 = -0.5
        let w = compute_refinement_weights(4, &[covering(1)], &config);
        assert!((w.sb_sb - 0.5).abs() < 1e-12);
        assert!((w.out_out - 1.5).abs() < 1e-12);
        assert!((w.out_sb - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pair_weights_are_conserved() {
        for gamma in [0.5, 1.0, 2.0] {
            let config = RefinementWeightConfig {
                imbalance_gamma: gamma,
                ..Default::default()
            };
            for covered in 1..9 {
                let sbs = [covering(covered), covering(1)];
                let w = compute_refinement_weights(10, &sbs, &config);
                assert!((w.sb_sb + w.out_out - config.pair_sum).abs() < 1e-12);
                assert!(w.sb_sb >= 0.0 && w.out_out >= 0.0);
            }
        }
    }
}
