use std::collections::{BTreeSet, VecDeque};

use crate::core::relations::{ActivityIndex, Existential, RelationMatrix, Temporal};

use super::BlockDetectionError;

///
/// Ordering information derived from a [`RelationMatrix`]
///
/// `succs`/`preds` contain every activity that is (directly or eventually) after/before
/// an activity, `direct_succs`/`direct_preds` only those related by `<d`.
///
#[derive(Debug, Clone)]
pub struct RelationGraph<'a> {
    /// Underlying relations
    pub matrix: &'a RelationMatrix,
    /// Predecessors per activity
    pub preds: Vec<BTreeSet<ActivityIndex>>,
    /// Successors per activity
    pub succs: Vec<BTreeSet<ActivityIndex>>,
    /// Direct predecessors per activity
    pub direct_preds: Vec<BTreeSet<ActivityIndex>>,
    /// Direct successors per activity
    pub direct_succs: Vec<BTreeSet<ActivityIndex>>,
}

/// Kind of branch that is grown by [`RelationGraph::append_branch_succs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// Branch of an exclusive choice
    Xor,
    /// Branch of a parallel block
    Par,
}

impl BranchKind {
    fn allows(&self, temporal: Temporal, existential: Existential) -> bool {
        match self {
            BranchKind::Xor => {
                temporal.is_before()
                    && matches!(
                        existential,
                        Existential::ReverseImplication
                            | Existential::Implication
                            | Existential::Equivalence
                    )
            }
            BranchKind::Par => {
                temporal == Temporal::Before
                    && matches!(
                        existential,
                        Existential::ReverseImplication | Existential::Equivalence
                    )
            }
        }
    }
}

impl<'a> RelationGraph<'a> {
    /// Derive (direct) predecessor and successor sets
    pub fn new(matrix: &'a RelationMatrix) -> Self {
        let n = matrix.len();
        let mut preds = vec![BTreeSet::new(); n];
        let mut succs = vec![BTreeSet::new(); n];
        let mut direct_preds = vec![BTreeSet::new(); n];
        let mut direct_succs = vec![BTreeSet::new(); n];
        for a in matrix.indices() {
            for b in matrix.indices() {
                let temporal = matrix.temporal(a, b);
                if a == b || !temporal.is_before() {
                    continue;
                }
                succs[a].insert(b);
                preds[b].insert(a);
                if temporal == Temporal::DirectlyBefore {
                    direct_succs[a].insert(b);
                    direct_preds[b].insert(a);
                }
            }
        }
        Self {
            matrix,
            preds,
            succs,
            direct_preds,
            direct_succs,
        }
    }

    /// Label of an activity (for diagnostics)
    pub fn name(&self, act: ActivityIndex) -> &str {
        self.matrix.name(act)
    }

    /// Activities of `nodes` that are not a successor of any other activity in `nodes`
    pub fn earliest_among(&self, nodes: &BTreeSet<ActivityIndex>) -> BTreeSet<ActivityIndex> {
        earliest_among(nodes, &self.succs)
    }

    /// Activities of `nodes` that have no other activity of `nodes` as successor
    pub fn latest_among(&self, nodes: &BTreeSet<ActivityIndex>) -> BTreeSet<ActivityIndex> {
        latest_among(nodes, &self.succs)
    }

    ///
    /// Walk backwards from `x` through predecessors contained in `allowed`
    ///
    /// At each step the first allowed predecessor (in index order) is taken. Returns the
    /// activity where no allowed predecessor exists anymore, which is `x` itself if `x`
    /// has no allowed predecessor.
    ///
    /// Fails with [`BlockDetectionError::PredecessorCycle`] if the walk revisits an activity.
    ///
    pub fn find_first_allowed_pred(
        &self,
        x: ActivityIndex,
        allowed: &[ActivityIndex],
    ) -> Result<ActivityIndex, BlockDetectionError> {
        let mut visited = BTreeSet::new();
        let mut current = x;
        loop {
            if !visited.insert(current) {
                return Err(BlockDetectionError::PredecessorCycle {
                    activity: self.name(current).to_string(),
                });
            }
            match self.preds[current].iter().find(|p| allowed.contains(p)) {
                Some(p) => current = *p,
                None => return Ok(current),
            }
        }
    }

    ///
    /// Grow a branch forward from `start`
    ///
    /// Follows successors whose relation to the current activity is allowed for the
    /// branch kind:
    /// * XOR: temporal `<`/`<d`, existential `<=`, `=>` or `<=>`
    /// * PAR: temporal `<`, existential `<=` or `<=>`
    ///
    /// Returns `start` followed by all reached activities in discovery order.
    ///
    pub fn append_branch_succs(&self, start: ActivityIndex, kind: BranchKind) -> Vec<ActivityIndex> {
        let mut branch = vec![start];
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(act) = queue.pop_front() {
            for &next in &self.succs[act] {
                let rel = self.matrix.relation(act, next);
                if kind.allows(rel.temporal, rel.existential) && seen.insert(next) {
                    branch.push(next);
                    queue.push_back(next);
                }
            }
        }
        branch
    }
}

///
/// Activities of `nodes` that are not reachable (via `succs`) from any other activity in `nodes`
///
/// Empty if `nodes` is empty. Multiple activities are returned if there is no unique earliest one.
///
pub fn earliest_among(
    nodes: &BTreeSet<ActivityIndex>,
    succs: &[BTreeSet<ActivityIndex>],
) -> BTreeSet<ActivityIndex> {
    nodes
        .iter()
        .copied()
        .filter(|n| !nodes.iter().any(|m| m != n && succs[*m].contains(n)))
        .collect()
}

///
/// Activities of `nodes` from which no other activity in `nodes` is reachable (via `succs`)
///
/// Empty if `nodes` is empty. Multiple activities are returned if there is no unique latest one.
///
pub fn latest_among(
    nodes: &BTreeSet<ActivityIndex>,
    succs: &[BTreeSet<ActivityIndex>],
) -> BTreeSet<ActivityIndex> {
    nodes
        .iter()
        .copied()
        .filter(|n| !nodes.iter().any(|m| m != n && succs[*n].contains(m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{idx, matrix};

    #[test]
    fn preds_and_succs() {
        let m = matrix(
            &["a", "b", "c"],
            &[("a", "b", "<d,<=>"), ("b", "c", "<d,=>"), ("a", "c", "<,=>")],
        );
        let g = RelationGraph::new(&m);
        let (a, b, c) = (idx(&m, "a"), idx(&m, "b"), idx(&m, "c"));
        assert_eq!(g.succs[a], BTreeSet::from([b, c]));
        assert_eq!(g.direct_succs[a], BTreeSet::from([b]));
        assert_eq!(g.preds[c], BTreeSet::from([a, b]));
        assert_eq!(g.direct_preds[c], BTreeSet::from([b]));
        assert!(g.preds[a].is_empty());

        let all = BTreeSet::from([a, b, c]);
        assert_eq!(g.earliest_among(&all), BTreeSet::from([a]));
        assert_eq!(g.latest_among(&all), BTreeSet::from([c]));
        assert!(g.earliest_among(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn no_unique_extremum() {
        let m = matrix(&["a", "b"], &[]);
        let g = RelationGraph::new(&m);
        let all = BTreeSet::from([0, 1]);
        assert_eq!(g.earliest_among(&all), all);
        assert_eq!(g.latest_among(&all), all);
    }

    #[test]
    fn first_allowed_pred() {
        let m = matrix(
            &["a", "b", "c", "d"],
            &[("a", "b", "<,<=>"), ("b", "c", "<,<=>"), ("a", "c", "<,<=>"), ("c", "d", "<,<=>")],
        );
        let g = RelationGraph::new(&m);
        let (a, b, c, d) = (idx(&m, "a"), idx(&m, "b"), idx(&m, "c"), idx(&m, "d"));
        assert_eq!(g.find_first_allowed_pred(c, &[b, c]).unwrap(), b);
        assert_eq!(g.find_first_allowed_pred(c, &[a, b, c]).unwrap(), a);
        assert_eq!(g.find_first_allowed_pred(c, &[c, d]).unwrap(), c);
        assert_eq!(g.find_first_allowed_pred(d, &[]).unwrap(), d);
    }

    #[test]
    fn first_allowed_pred_detects_cycles() {
        let m = matrix(
            &["a", "b", "c"],
            &[("a", "b", "<,-"), ("b", "c", "<,-"), ("c", "a", "<,-")],
        );
        let g = RelationGraph::new(&m);
        let res = g.find_first_allowed_pred(idx(&m, "a"), &[0, 1, 2]);
        assert!(matches!(
            res,
            Err(BlockDetectionError::PredecessorCycle { .. })
        ));
    }

    #[test]
    fn grow_branches() {
        let m = matrix(
            &["a", "b", "c", "d"],
            &[
                ("a", "b", "<d,=>"),
                ("a", "c", "<,<=>"),
                ("b", "c", "<d,<=>"),
                ("a", "d", "<,-"),
            ],
        );
        let g = RelationGraph::new(&m);
        let a = idx(&m, "a");
        let names = |acts: Vec<usize>| m.acts_to_names(&acts);
        assert_eq!(names(g.append_branch_succs(a, BranchKind::Xor)), vec!["a", "b", "c"]);
        assert_eq!(names(g.append_branch_succs(a, BranchKind::Par)), vec!["a", "c"]);
    }
}
