use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::process_models::blocks::SuperBlock;

use super::score_process::ScoringConfig;

///
/// Coverage and fragmentation part of the structuredness score
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseScore {
    /// Fraction of all activities newly covered by each super-block (in super-block order)
    pub coverage_fractions: Vec<f64>,
    /// Sum of [`BaseScore::coverage_fractions`]
    pub total_coverage: f64,
    /// Shannon entropy of the coverage distribution, normalized to `[0, 1]`
    pub normalized_entropy: f64,
    /// `1 - entropy_penalty * normalized_entropy`
    pub structure_factor: f64,
    /// `structure_factor * total_coverage^outsider_penalty_exponent`
    pub score: f64,
}

///
/// Compute the base score of a process with `activity_count` activities
///
/// Activities covered by several super-blocks only count for the first one.
/// The entropy only penalizes fragmentation into multiple super-blocks: it is 0
/// for less than two super-blocks (or no coverage at all).
///
pub fn compute_base_score<A: Ord + Clone>(
    super_blocks: &[SuperBlock<A>],
    activity_count: usize,
    config: &ScoringConfig,
) -> BaseScore {
    let mut already_covered: BTreeSet<A> = BTreeSet::new();
    let coverage_fractions: Vec<f64> = super_blocks
        .iter()
        .map(|sb| {
            let newly_covered = sb
                .full_activities()
                .into_iter()
                .filter(|a| already_covered.insert(a.clone()))
                .count();
            if activity_count == 0 {
                0.0
            } else {
                newly_covered as f64 / activity_count as f64
            }
        })
        .collect();
    let total_coverage: f64 = coverage_fractions.iter().sum();

    let n = coverage_fractions.len();
    let normalized_entropy = if n > 1 && total_coverage > 0.0 {
        let entropy: f64 = coverage_fractions
            .iter()
            .filter(|frac| **frac > 0.0)
            .map(|frac| {
                let p = frac / total_coverage;
                -p * p.ln()
            })
            .sum();
        entropy / (n as f64).ln()
    } else {
        0.0
    };

    let structure_factor = 1.0 - config.entropy_penalty * normalized_entropy;
    let score = structure_factor * total_coverage.powf(config.outsider_penalty_exponent);
    BaseScore {
        coverage_fractions,
        total_coverage,
        normalized_entropy,
        structure_factor,
        score,
    }
}

/// Short summary of the number of super-blocks (e.g., `"3 SB"`)
pub fn super_block_label(count: usize) -> String {
    format!("{} SB", count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sb(start: Option<u32>, end: Option<u32>, activities: Vec<u32>) -> SuperBlock<u32> {
        SuperBlock {
            start,
            end,
            activities,
        }
    }

    #[test]
    fn full_coverage_by_one_super_block() {
        let base = compute_base_score(&[sb(Some(0), Some(3), vec![1, 2])], 4, &ScoringConfig::default());
        assert_eq!(base.coverage_fractions, vec![1.0]);
        assert_eq!(base.normalized_entropy, 0.0);
        assert_eq!(base.score, 1.0);
    }

    #[test]
    fn fragmentation_is_penalized() {
        let base = compute_base_score(
            &[sb(None, None, vec![0, 1]), sb(None, None, vec![2, 3])],
            4,
            &ScoringConfig::default(),
        );
        assert_eq!(base.total_coverage, 1.0);
        assert!((base.normalized_entropy - 1.0).abs() < 1e-12);
        assert!((base.score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn shared_activities_count_once() {
        let base = compute_base_score(
            &[sb(None, Some(2), vec![0, 1]), sb(Some(2), None, vec![3])],
            5,
            &ScoringConfig::default(),
        );
        assert_eq!(base.coverage_fractions, vec![0.6, 0.2]);
        assert!((base.total_coverage - 0.8).abs() < 1e-12);
    }

    #[test]
    fn no_super_blocks() {
        let base = compute_base_score::<u32>(&[], 3, &ScoringConfig::default());
        assert_eq!(base.total_coverage, 0.0);
        assert_eq!(base.score, 0.0);
        let empty = compute_base_score::<u32>(&[], 0, &ScoringConfig::default());
        assert_eq!(empty.score, 0.0);
    }

    #[test]
    fn covered_duplicate_contributes_no_entropy() {
        // the second super-block adds nothing new, 0 * ln(0) is treated as 0
        let base = compute_base_score(
            &[sb(None, None, vec![0, 1]), sb(None, None, vec![1])],
            2,
            &ScoringConfig::default(),
        );
        assert_eq!(base.coverage_fractions, vec![1.0, 0.0]);
        assert_eq!(base.normalized_entropy, 0.0);
        assert_eq!(base.score, 1.0);
    }

    #[test]
    fn stronger_outsider_penalty_lowers_score() {
        let sbs = [sb(None, None, vec![0, 1, 2])];
        let mut config = ScoringConfig::default();
        let mut last = compute_base_score(&sbs, 4, &config).score;
        for exponent in [1.75, 2.0, 3.0] {
            config.outsider_penalty_exponent = exponent;
            let score = compute_base_score(&sbs, 4, &config).score;
            assert!(score < last);
            last = score;
        }
    }

    #[test]
    fn labels() {
        assert_eq!(super_block_label(0), "0 SB");
        assert_eq!(super_block_label(1), "1 SB");
        assert_eq!(super_block_label(4), "4 SB");
    }
}
