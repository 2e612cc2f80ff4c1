use std::collections::BTreeSet;

use crate::core::{
    process_models::blocks::{Block, BlockEntry, BlockType},
    relations::{ActivityIndex, Existential, Relation, Temporal},
};

use super::{
    detect::Detector,
    exclusivity_repair::TaggedBranch,
    graph_utils::BranchKind,
    redundancy::{remove_redundant_blocks, retain_entry_exclusive_blocks},
    xor::{drop_shared_activities, take_merge},
    BlockDetectionError,
};

/// Relation required between a PAR split and every (non-nested-XOR) activity of the block
const PAR_SPLIT_RELATION: Relation = Relation::new(Temporal::Before, Existential::Equivalence);

impl Detector<'_> {
    ///
    /// Detect PAR blocks among `acts`
    ///
    /// Every activity with at least one always co-occurring (unordered) partner yields a
    /// candidate block. The same filters as for XOR blocks apply.
    ///
    pub(crate) fn par_blocks(
        &self,
        acts: &[ActivityIndex],
        depth: usize,
    ) -> Result<Vec<Block<ActivityIndex>>, BlockDetectionError> {
        let matrix = self.graph.matrix;
        let mut candidates = Vec::new();
        for &x in acts {
            let partners: Vec<ActivityIndex> = acts
                .iter()
                .copied()
                .filter(|&y| matrix.always(x, y))
                .collect();
            if partners.is_empty() {
                continue;
            }
            if let Some(block) = self.par_candidate(acts, x, partners, depth)? {
                candidates.push(block);
            }
        }
        Ok(retain_entry_exclusive_blocks(remove_redundant_blocks(
            candidates,
        )))
    }

    fn par_candidate(
        &self,
        acts: &[ActivityIndex],
        x: ActivityIndex,
        partners: Vec<ActivityIndex>,
        depth: usize,
    ) -> Result<Option<Block<ActivityIndex>>, BlockDetectionError> {
        let graph = &self.graph;
        let matrix = graph.matrix;

        let mut branches: Vec<TaggedBranch> = Vec::new();
        let mut remaining: Vec<ActivityIndex> = std::iter::once(x).chain(partners).collect();
        while let Some(&first) = remaining.first() {
            let y = graph.find_first_allowed_pred(first, &remaining)?;
            let mut branch = graph.append_branch_succs(y, BranchKind::Par);
            for o in acts.iter().copied().filter(|&o| matrix.never(y, o)) {
                if !branch.contains(&o) {
                    branch.push(o);
                }
            }
            branches.push(TaggedBranch {
                kind: BranchKind::Par,
                acts: branch,
            });
            remaining.retain(|&z| matrix.always(y, z));
        }

        let branch_acts: BTreeSet<ActivityIndex> =
            branches.iter().flat_map(|b| b.acts.iter().copied()).collect();
        let nested_xor_acts: BTreeSet<ActivityIndex> = branch_acts
            .iter()
            .copied()
            .filter(|&a| branch_acts.iter().any(|&b| matrix.never(a, b)))
            .collect();

        let merge = take_merge(graph, &mut branches, |cands, cleaned| {
            cands.iter().copied().find(|&m| {
                cleaned.iter().flat_map(|b| b.acts.iter()).all(|&a| {
                    matches!(
                        matrix.existential(m, a),
                        Existential::ReverseImplication | Existential::Equivalence
                    )
                })
            })
        });
        drop_shared_activities(&mut branches);
        if branches.iter().any(|b| b.acts.is_empty()) {
            tracing::debug!(
                split_candidate = graph.name(x),
                "Discarding PAR candidate with empty branch"
            );
            return Ok(None);
        }

        let split = self.par_split(&branches, &nested_xor_acts);

        let inner: BTreeSet<ActivityIndex> =
            branches.iter().flat_map(|b| b.acts.iter().copied()).collect();
        let nested = if depth < self.config.max_nesting_depth {
            self.xor_blocks(&self.restrict(&inner), depth + 1)?
        } else {
            tracing::debug!(
                split_candidate = graph.name(x),
                depth,
                "Maximal nesting depth reached, skipping nested XOR detection"
            );
            Vec::new()
        };

        let mut block = Block::new(
            BlockType::Par,
            BlockEntry::canonical_entries(branches.into_iter().map(|b| b.acts).collect()),
            split,
            merge,
        );
        block.nested = nested;
        Ok(Some(block))
    }

    ///
    /// The unique latest predecessor shared by all branch heads
    ///
    /// There is no split if several shared predecessors are unordered among each other.
    /// The split is only valid if it is related by `(<, <=>)` to every activity of the block that is not
    /// part of a nested XOR.
    ///
    fn par_split(
        &self,
        branches: &[TaggedBranch],
        nested_xor_acts: &BTreeSet<ActivityIndex>,
    ) -> Option<ActivityIndex> {
        let graph = &self.graph;
        let pred_sets: Vec<&BTreeSet<ActivityIndex>> = branches
            .iter()
            .map(|b| &graph.preds[b.acts[0]])
            .collect();
        let first = pred_sets.first()?;
        if first.is_empty() || !pred_sets.iter().all(|p| p == first) {
            return None;
        }
        let latest = graph.latest_among(first);
        if latest.len() != 1 {
            tracing::debug!(
                candidates = ?latest.iter().map(|&a| graph.name(a)).collect::<Vec<_>>(),
                "No unique PAR split"
            );
            return None;
        }
        let candidate = latest.first().copied()?;
        let valid = branches
            .iter()
            .flat_map(|b| b.acts.iter())
            .filter(|a| !nested_xor_acts.contains(a))
            .all(|&a| graph.matrix.relation(candidate, a) == PAR_SPLIT_RELATION);
        valid.then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relations::RelationMatrix;
    use crate::discovery::blocks::DetectionConfig;
    use crate::utils::test_utils::{idx, matrix};

    #[test]
    fn parallel_block_with_split_and_merge() {
        let m = matrix(
            &["s", "b", "c", "j"],
            &[
                ("s", "b", "<,<=>"),
                ("s", "c", "<,<=>"),
                ("s", "j", "<,<=>"),
                ("b", "c", "-,<=>"),
                ("b", "j", "<,<=>"),
                ("c", "j", "<,<=>"),
            ],
        );
        let config = DetectionConfig::default();
        let detector = Detector::new(&m, &config);
        let blocks = detector.par_blocks(detector.order(), 0).unwrap();
        assert_eq!(
            blocks,
            vec![Block::new(
                BlockType::Par,
                vec![
                    BlockEntry::Single(idx(&m, "b")),
                    BlockEntry::Single(idx(&m, "c"))
                ],
                Some(idx(&m, "s")),
                Some(idx(&m, "j")),
            )]
        );
    }

    #[test]
    fn unordered_common_predecessors_give_no_split() {
        let pairs = |p_q: &'static str| {
            vec![
                ("p", "q", p_q),
                ("p", "b", "<,<=>"),
                ("p", "c", "<,<=>"),
                ("q", "b", "<,<=>"),
                ("q", "c", "<,<=>"),
                ("b", "c", "-,<=>"),
            ]
        };
        let branches = |m: &RelationMatrix| {
            ["b", "c"]
                .into_iter()
                .map(|a| TaggedBranch {
                    kind: BranchKind::Par,
                    acts: vec![idx(m, a)],
                })
                .collect::<Vec<_>>()
        };
        let config = DetectionConfig::default();

        let tied = matrix(&["b", "c", "p", "q"], &pairs("-,<=>"));
        let detector = Detector::new(&tied, &config);
        assert_eq!(detector.par_split(&branches(&tied), &BTreeSet::new()), None);

        let ordered = matrix(&["b", "c", "p", "q"], &pairs("<,<=>"));
        let detector = Detector::new(&ordered, &config);
        assert_eq!(
            detector.par_split(&branches(&ordered), &BTreeSet::new()),
            Some(idx(&ordered, "q"))
        );
    }

    #[test]
    fn split_requires_strict_parallel_signature() {
        // s only conditionally precedes c
        let m = matrix(
            &["s", "b", "c"],
            &[("s", "b", "<,<=>"), ("s", "c", "<,<="), ("b", "c", "-,<=>")],
        );
        let config = DetectionConfig::default();
        let detector = Detector::new(&m, &config);
        let blocks = detector.par_blocks(detector.order(), 0).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start, None);
        assert_eq!(blocks[0].end, None);
    }
}
