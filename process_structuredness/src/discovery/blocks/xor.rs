use std::collections::{BTreeMap, BTreeSet};

use crate::core::{
    process_models::blocks::{Block, BlockEntry, BlockType},
    relations::{ActivityIndex, Existential},
};

use super::{
    detect::Detector,
    exclusivity_repair::{reduce_branches_to_only_xor, TaggedBranch},
    graph_utils::{BranchKind, RelationGraph},
    redundancy::{remove_redundant_blocks, retain_entry_exclusive_blocks},
    BlockDetectionError,
};

impl Detector<'_> {
    ///
    /// Detect XOR blocks among `acts`
    ///
    /// Every activity with at least one mutually exclusive partner yields a candidate block.
    /// Duplicated and contained candidates are removed afterwards, as well as candidates
    /// sharing a branch entry with another candidate.
    ///
    pub(crate) fn xor_blocks(
        &self,
        acts: &[ActivityIndex],
        depth: usize,
    ) -> Result<Vec<Block<ActivityIndex>>, BlockDetectionError> {
        let matrix = self.graph.matrix;
        let mut candidates = Vec::new();
        for &x in acts {
            let partners: Vec<ActivityIndex> =
                acts.iter().copied().filter(|&y| matrix.never(x, y)).collect();
            if partners.is_empty() {
                continue;
            }
            if let Some(block) = self.xor_candidate(acts, x, partners, depth)? {
                candidates.push(block);
            }
        }
        Ok(retain_entry_exclusive_blocks(remove_redundant_blocks(
            candidates,
        )))
    }

    fn xor_candidate(
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
            let mut branch = graph.append_branch_succs(y, BranchKind::Xor);
            // Activities always co-occurring with the branch head indicate a nested PAR
            let par_acts: Vec<ActivityIndex> =
                acts.iter().copied().filter(|&o| matrix.always(y, o)).collect();
            let kind = if par_acts.is_empty() {
                BranchKind::Xor
            } else {
                BranchKind::Par
            };
            for a in par_acts {
                if !branch.contains(&a) {
                    branch.push(a);
                }
            }
            branches.push(TaggedBranch { kind, acts: branch });
            remaining.retain(|&z| matrix.never(y, z));
        }

        let branch_acts: BTreeSet<ActivityIndex> =
            branches.iter().flat_map(|b| b.acts.iter().copied()).collect();
        let nested = if depth < self.config.max_nesting_depth {
            self.par_blocks(&self.restrict(&branch_acts), depth + 1)?
        } else {
            tracing::debug!(
                split_candidate = graph.name(x),
                depth,
                "Maximal nesting depth reached, skipping nested PAR detection"
            );
            Vec::new()
        };

        let merge = take_merge(graph, &mut branches, |cands, _| {
            if cands.len() == 1 {
                cands.first().copied()
            } else {
                None
            }
        });
        drop_shared_activities(&mut branches);
        if branches.iter().any(|b| b.acts.is_empty()) {
            tracing::debug!(
                split_candidate = graph.name(x),
                "Discarding XOR candidate with empty branch"
            );
            return Ok(None);
        }

        if !branches_mutually_exclusive(self, &branches) {
            match reduce_branches_to_only_xor(self, branches)? {
                Some(reduced) => branches = reduced,
                None => {
                    tracing::debug!(
                        split_candidate = graph.name(x),
                        "No valid XOR assignment found, discarding candidate"
                    );
                    return Ok(None);
                }
            }
        }

        let split = self.xor_split(&branches, !nested.is_empty());

        let mut block = Block::new(
            BlockType::Xor,
            BlockEntry::canonical_entries(branches.into_iter().map(|b| b.acts).collect()),
            split,
            merge,
        );
        block.nested = nested;
        Ok(Some(block))
    }

    ///
    /// The unique direct predecessor shared by all branch heads
    ///
    /// If a PAR block is nested into the XOR, its branches are not directly preceded by the
    /// split. Then only the XOR-tagged branches need to share their direct predecessor.
    ///
    fn xor_split(&self, branches: &[TaggedBranch], has_nested_par: bool) -> Option<ActivityIndex> {
        let pred_sets: Vec<&BTreeSet<ActivityIndex>> = branches
            .iter()
            .map(|b| &self.graph.direct_preds[b.acts[0]])
            .collect();
        let first = pred_sets.first()?;
        if first.len() == 1 && pred_sets.iter().all(|p| p == first) {
            return first.first().copied();
        }
        if has_nested_par && pred_sets.iter().any(|p| !p.is_empty()) {
            let xor_sets: Vec<&BTreeSet<ActivityIndex>> = branches
                .iter()
                .zip(&pred_sets)
                .filter(|(b, _)| b.kind == BranchKind::Xor)
                .map(|(_, p)| *p)
                .collect();
            let first = xor_sets.first()?;
            if first.len() == 1 && xor_sets.iter().all(|p| p == first) {
                return first.first().copied();
            }
        }
        None
    }
}

///
/// Remove the activities shared by all branches and select a merge among them
///
/// `select` receives the earliest shared activities and the cleaned branches.
///
pub(crate) fn take_merge<F>(
    graph: &RelationGraph<'_>,
    branches: &mut [TaggedBranch],
    select: F,
) -> Option<ActivityIndex>
where
    F: FnOnce(&BTreeSet<ActivityIndex>, &[TaggedBranch]) -> Option<ActivityIndex>,
{
    let (first, rest) = branches.split_first()?;
    let joint: BTreeSet<ActivityIndex> = first
        .acts
        .iter()
        .copied()
        .filter(|a| rest.iter().all(|b| b.acts.contains(a)))
        .collect();
    if joint.is_empty() {
        return None;
    }
    for branch in branches.iter_mut() {
        branch.acts.retain(|a| !joint.contains(a));
    }
    select(&graph.earliest_among(&joint), branches)
}

///
/// Remove activities contained in more than one branch
///
/// Such activities follow several, but not all, alternatives. They are neither a merge
/// nor part of a single branch.
///
pub(crate) fn drop_shared_activities(branches: &mut [TaggedBranch]) {
    let mut counts: BTreeMap<ActivityIndex, usize> = BTreeMap::new();
    for branch in branches.iter() {
        for a in branch.acts.iter().collect::<BTreeSet<_>>() {
            *counts.entry(*a).or_insert(0) += 1;
        }
    }
    for branch in branches.iter_mut() {
        branch.acts.retain(|a| counts.get(a) == Some(&1));
    }
}

/// All activities of different branches are mutually exclusive
fn branches_mutually_exclusive(detector: &Detector<'_>, branches: &[TaggedBranch]) -> bool {
    let matrix = detector.graph.matrix;
    branches.iter().enumerate().all(|(i, b1)| {
        branches[i + 1..].iter().all(|b2| {
            b1.acts.iter().all(|&a1| {
                b2.acts.iter().all(|&a2| {
                    matrix.existential(a1, a2) == Existential::Exclusion
                        && matrix.existential(a2, a1) == Existential::Exclusion
                })
            })
        })
    })
}
