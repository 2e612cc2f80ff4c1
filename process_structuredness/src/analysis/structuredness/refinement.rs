use itertools::Itertools;
use serde::Serialize;

use crate::core::{
    process_models::blocks::SuperBlock,
    relations::{ActivityIndex, Relation, RelationMatrix},
};

use super::tables::{ScoreTable, OUT_TO_OUT, OUT_TO_SB, SB_TO_SB};

///
/// Activity pair whose relation is not listed in the score table of a refinement
///
/// The pair is scored with 0.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnscoredRelation {
    /// Name of the [`ScoreTable`]
    pub table: &'static str,
    /// First activity of the pair
    pub from: String,
    /// Second activity of the pair
    pub to: String,
    /// Relation from `from` to `to`
    pub relation: Relation,
}

/// Collects pair scores of one refinement term
struct PairScorer<'a> {
    matrix: &'a RelationMatrix,
    table: &'static ScoreTable,
    scores: Vec<f64>,
    unscored: &'a mut Vec<UnscoredRelation>,
}

impl<'a> PairScorer<'a> {
    fn new(
        matrix: &'a RelationMatrix,
        table: &'static ScoreTable,
        unscored: &'a mut Vec<UnscoredRelation>,
    ) -> Self {
        Self {
            matrix,
            table,
            scores: Vec::new(),
            unscored,
        }
    }

    fn score(&mut self, from: ActivityIndex, to: ActivityIndex) {
        let relation = self.matrix.relation(from, to);
        let score = match self.table.lookup(relation) {
            Some(score) => score,
            None => {
                tracing::warn!(
                    table = self.table.name,
                    from = self.matrix.name(from),
                    to = self.matrix.name(to),
                    %relation,
                    "Unknown relation, falling back to score 0"
                );
                self.unscored.push(UnscoredRelation {
                    table: self.table.name,
                    from: self.matrix.name(from).to_string(),
                    to: self.matrix.name(to).to_string(),
                    relation,
                });
                0.0
            }
        };
        tracing::debug!(
            table = self.table.name,
            from = self.matrix.name(from),
            to = self.matrix.name(to),
            %relation,
            score,
            "Scored activity pair"
        );
        self.scores.push(score);
    }

    /// Average score, `None` if no pair was scored
    fn average(self) -> Option<f64> {
        if self.scores.is_empty() {
            None
        } else {
            Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
        }
    }
}

/// Boundary activity if defined, else the inner activities
fn boundary_or_inner(boundary: Option<ActivityIndex>, sb: &SuperBlock<ActivityIndex>) -> Vec<ActivityIndex> {
    match boundary {
        Some(b) => vec![b],
        None => sb.activities.clone(),
    }
}

///
/// Average [`SB_TO_SB`] score from the end of each super-block to the start of every other one
///
/// If a super-block has no end (start), its inner activities are used instead.
/// `None` for less than two super-blocks.
///
pub fn refine_sb_to_sb(
    matrix: &RelationMatrix,
    super_blocks: &[SuperBlock<ActivityIndex>],
    unscored: &mut Vec<UnscoredRelation>,
) -> Option<f64> {
    if super_blocks.len() < 2 {
        return None;
    }
    let mut scorer = PairScorer::new(matrix, &SB_TO_SB, unscored);
    for (i, sb1) in super_blocks.iter().enumerate() {
        let ends = boundary_or_inner(sb1.end, sb1);
        for (j, sb2) in super_blocks.iter().enumerate() {
            if i == j {
                continue;
            }
            let starts = boundary_or_inner(sb2.start, sb2);
            for &end in &ends {
                for &start in &starts {
                    scorer.score(end, start);
                }
            }
        }
    }
    scorer.average()
}

///
/// Average [`OUT_TO_SB`] score from every outsider to every activity of every super-block
///
/// `None` without super-blocks or outsiders.
///
pub fn refine_out_to_sb(
    matrix: &RelationMatrix,
    outsiders: &[ActivityIndex],
    super_blocks: &[SuperBlock<ActivityIndex>],
    unscored: &mut Vec<UnscoredRelation>,
) -> Option<f64> {
    if super_blocks.is_empty() || outsiders.is_empty() {
        return None;
    }
    let mut scorer = PairScorer::new(matrix, &OUT_TO_SB, unscored);
    for &outsider in outsiders {
        for sb in super_blocks {
            for act in sb.full_activities() {
                scorer.score(outsider, act);
            }
        }
    }
    scorer.average()
}

///
/// Average [`OUT_TO_OUT`] score over all unordered pairs of outsiders
///
/// `None` for less than two outsiders.
///
pub fn refine_out_to_out(
    matrix: &RelationMatrix,
    outsiders: &[ActivityIndex],
    unscored: &mut Vec<UnscoredRelation>,
) -> Option<f64> {
    if outsiders.len() < 2 {
        return None;
    }
    let mut scorer = PairScorer::new(matrix, &OUT_TO_OUT, unscored);
    for (a, b) in outsiders.iter().tuple_combinations() {
        scorer.score(*a, *b);
    }
    scorer.average()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{idx, matrix};

    #[test]
    fn sb_to_sb_uses_boundaries() {
        let m = matrix(
            &["a", "b", "c", "d"],
            &[
                ("a", "b", "<d,<=>"),
                ("b", "c", "<d,<=>"),
                ("c", "d", "<d,<=>"),
                ("a", "c", "<,<=>"),
                ("a", "d", "<,<=>"),
                ("b", "d", "<,<=>"),
            ],
        );
        let (a, b, c, d) = (idx(&m, "a"), idx(&m, "b"), idx(&m, "c"), idx(&m, "d"));
        let sbs = vec![
            SuperBlock { start: Some(a), end: Some(b), activities: vec![] },
            SuperBlock { start: Some(c), end: Some(d), activities: vec![] },
        ];
        let mut unscored = Vec::new();
        // b -> c is "<d,<=>" (unscored), d -> a is ">,<=>" (+0.15)
        let res = refine_sb_to_sb(&m, &sbs, &mut unscored).unwrap();
        assert!((res - 0.075).abs() < 1e-12);
        assert_eq!(unscored.len(), 1);
        assert_eq!(unscored[0].from, "b");
        assert_eq!(unscored[0].to, "c");
        assert_eq!(unscored[0].table, "SB_TO_SB");

        assert_eq!(refine_sb_to_sb(&m, &sbs[..1], &mut unscored), None);
    }

    #[test]
    fn out_to_sb_compares_all_activities() {
        let m = matrix(
            &["a", "b", "o"],
            &[("a", "b", "<d,<=>"), ("o", "a", "-,<=>"), ("o", "b", "-,-")],
        );
        let (a, b, o) = (idx(&m, "a"), idx(&m, "b"), idx(&m, "o"));
        let sbs = vec![SuperBlock { start: Some(a), end: Some(b), activities: vec![] }];
        let mut unscored = Vec::new();
        let res = refine_out_to_sb(&m, &[o], &sbs, &mut unscored).unwrap();
        assert!((res - 0.0).abs() < 1e-12);
        assert!(unscored.is_empty());
        assert_eq!(refine_out_to_sb(&m, &[], &sbs, &mut unscored), None);
        assert_eq!(refine_out_to_sb(&m, &[o], &[], &mut unscored), None);
    }

    #[test]
    fn out_to_out_pairs() {
        let m = matrix(
            &["a", "b", "c"],
            &[("a", "b", "-,</=>"), ("a", "c", "-,-"), ("b", "c", "<,<=>")],
        );
        let mut unscored = Vec::new();
        let res = refine_out_to_out(&m, &[0, 1, 2], &mut unscored).unwrap();
        assert!((res - (0.10 - 0.25 + 0.25) / 3.0).abs() < 1e-12);
        assert_eq!(refine_out_to_out(&m, &[0], &mut unscored), None);
    }

    #[test]
    fn super_blocks_without_boundaries_or_inner_activities() {
        let m = matrix(&["a", "b"], &[]);
        let sbs = vec![
            SuperBlock { start: None, end: None, activities: vec![] },
            SuperBlock { start: None, end: None, activities: vec![] },
        ];
        let mut unscored = Vec::new();
        assert_eq!(refine_sb_to_sb(&m, &sbs, &mut unscored), None);
    }
}
