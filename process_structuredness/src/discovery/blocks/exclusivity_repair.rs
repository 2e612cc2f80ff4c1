use std::collections::{BTreeMap, BTreeSet, VecDeque};

use itertools::Itertools;

use crate::core::relations::{ActivityIndex, Existential, RelationMatrix};

use super::{detect::Detector, graph_utils::BranchKind, BlockDetectionError};

/// Branch of an XOR candidate, tagged with whether it contains a nested PAR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedBranch {
    /// Branch kind
    pub kind: BranchKind,
    /// Activities of the branch
    pub acts: Vec<ActivityIndex>,
}

///
/// Sort the activities of a branch topologically w.r.t. `preds`
///
/// Activities that cannot be ordered (because of cycles) are appended in their original order.
///
pub fn sort_branch_by_preds(
    branch: &[ActivityIndex],
    preds: &[BTreeSet<ActivityIndex>],
) -> Vec<ActivityIndex> {
    let mut in_degree: BTreeMap<ActivityIndex, usize> = branch
        .iter()
        .map(|&a| (a, preds[a].iter().filter(|p| branch.contains(p)).count()))
        .collect();
    let mut queue: VecDeque<ActivityIndex> = branch
        .iter()
        .copied()
        .filter(|a| in_degree.get(a) == Some(&0))
        .collect();
    let mut ordered = Vec::with_capacity(branch.len());
    while let Some(node) = queue.pop_front() {
        ordered.push(node);
        for &next in branch {
            if !preds[next].contains(&node) {
                continue;
            }
            if let Some(deg) = in_degree.get_mut(&next) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(next);
                }
            }
        }
    }
    let remaining: Vec<ActivityIndex> = branch
        .iter()
        .copied()
        .filter(|a| !ordered.contains(a))
        .collect();
    ordered.extend(remaining);
    ordered
}

///
/// Check that all activities of different branches are mutually exclusive
///
/// An activity contained in two branches makes the assignment invalid.
///
pub fn is_valid_xor_assignment(matrix: &RelationMatrix, branches: &[TaggedBranch]) -> bool {
    for (i, b1) in branches.iter().enumerate() {
        for b2 in &branches[i + 1..] {
            for &a1 in &b1.acts {
                for &a2 in &b2.acts {
                    if a1 == a2
                        || matrix.existential(a1, a2) != Existential::Exclusion
                        || matrix.existential(a2, a1) != Existential::Exclusion
                    {
                        return false;
                    }
                }
            }
        }
    }
    true
}

///
/// Trim branches from their end until all branches are mutually exclusive
///
/// Branches are first sorted topologically. Then, in the given branch order, the
/// current branch is trimmed until the assignment is valid.
/// Returns `None` if a branch had to be emptied.
///
pub fn find_best_xor_assignment(
    matrix: &RelationMatrix,
    preds: &[BTreeSet<ActivityIndex>],
    branches: &[&TaggedBranch],
) -> Option<Vec<TaggedBranch>> {
    let mut result: Vec<TaggedBranch> = branches
        .iter()
        .map(|b| TaggedBranch {
            kind: b.kind,
            acts: sort_branch_by_preds(&b.acts, preds),
        })
        .collect();
    for i in 0..result.len() {
        while !is_valid_xor_assignment(matrix, &result) && !result[i].acts.is_empty() {
            result[i].acts.pop();
        }
        if result[i].acts.is_empty() {
            return None;
        }
    }
    Some(result)
}

///
/// Repair an XOR candidate whose branches are not mutually exclusive
///
/// Tries [`find_best_xor_assignment`] for all branch orders and keeps the result
/// retaining the most activities (the first one on ties). `Ok(None)` means that no
/// order yields a valid assignment.
///
/// At most [`DetectionConfig::max_repair_branches`](super::DetectionConfig::max_repair_branches)
/// branches are permuted. Beyond that, the candidate is either repaired greedily in
/// construction order or the search fails with [`BlockDetectionError::RepairLimitExceeded`].
///
pub(crate) fn reduce_branches_to_only_xor(
    detector: &Detector<'_>,
    branches: Vec<TaggedBranch>,
) -> Result<Option<Vec<TaggedBranch>>, BlockDetectionError> {
    let matrix = detector.graph.matrix;
    let preds = &detector.graph.preds;
    let limit = detector.config.max_repair_branches;
    if branches.len() > limit {
        if detector.config.greedy_repair_fallback {
            tracing::debug!(
                branches = branches.len(),
                limit,
                "Too many branches for exhaustive XOR repair, repairing greedily"
            );
            let refs: Vec<&TaggedBranch> = branches.iter().collect();
            return Ok(find_best_xor_assignment(matrix, preds, &refs));
        }
        return Err(BlockDetectionError::RepairLimitExceeded {
            branches: branches.len(),
            limit,
        });
    }

    let mut best: Option<(usize, Vec<TaggedBranch>)> = None;
    for perm in branches.iter().permutations(branches.len()) {
        let Some(reduced) = find_best_xor_assignment(matrix, preds, &perm) else {
            continue;
        };
        let total: usize = reduced.iter().map(|b| b.acts.len()).sum();
        if best.as_ref().map_or(true, |(max, _)| total > *max) {
            best = Some((total, reduced));
        }
    }
    Ok(best.map(|(_, reduced)| reduced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::blocks::RelationGraph;
    use crate::utils::test_utils::{idx, matrix};

    fn xor_branch(acts: Vec<usize>) -> TaggedBranch {
        TaggedBranch {
            kind: BranchKind::Xor,
            acts,
        }
    }

    #[test]
    fn topological_branch_sort() {
        let m = matrix(
            &["a", "b", "c", "x"],
            &[("a", "b", "<,<=>"), ("b", "c", "<,<=>"), ("a", "c", "<,<=>")],
        );
        let g = RelationGraph::new(&m);
        let (a, b, c, x) = (idx(&m, "a"), idx(&m, "b"), idx(&m, "c"), idx(&m, "x"));
        assert_eq!(sort_branch_by_preds(&[c, x, a, b], &g.preds), vec![x, a, b, c]);
    }

    #[test]
    fn trims_until_exclusive() {
        let m = matrix(
            &["c", "d", "g"],
            &[("c", "d", "-,</=>"), ("c", "g", "<d,=>"), ("d", "g", "<d,-")],
        );
        let g = RelationGraph::new(&m);
        let (c, d, gg) = (idx(&m, "c"), idx(&m, "d"), idx(&m, "g"));
        let cg = xor_branch(vec![c, gg]);
        let only_d = xor_branch(vec![d]);
        assert!(!is_valid_xor_assignment(&m, &[cg.clone(), only_d.clone()]));

        let res = find_best_xor_assignment(&m, &g.preds, &[&cg, &only_d]).unwrap();
        assert_eq!(res, vec![xor_branch(vec![c]), xor_branch(vec![d])]);
        assert_eq!(find_best_xor_assignment(&m, &g.preds, &[&only_d, &cg]), None);
    }

    #[test]
    fn no_valid_assignment() {
        let m = matrix(&["a", "b"], &[]);
        let g = RelationGraph::new(&m);
        let branches = [xor_branch(vec![0]), xor_branch(vec![1])];
        assert_eq!(
            find_best_xor_assignment(&m, &g.preds, &[&branches[0], &branches[1]]),
            None
        );
        assert_eq!(
            find_best_xor_assignment(&m, &g.preds, &[&branches[1], &branches[0]]),
            None
        );
    }

    #[test]
    fn shared_activities_are_invalid() {
        let m = matrix(&["a", "b", "s"], &[("a", "b", "-,</=>")]);
        let (a, b, s) = (idx(&m, "a"), idx(&m, "b"), idx(&m, "s"));
        assert!(is_valid_xor_assignment(&m, &[xor_branch(vec![a]), xor_branch(vec![b])]));
        assert!(!is_valid_xor_assignment(
            &m,
            &[xor_branch(vec![a, s]), xor_branch(vec![b, s])]
        ));
    }
}
