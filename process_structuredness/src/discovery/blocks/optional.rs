use std::collections::BTreeSet;

use crate::core::{
    process_models::blocks::{flatten_blocks, Block, BlockEntry, BlockType},
    relations::{ActivityIndex, Existential, Temporal},
};

use super::graph_utils::RelationGraph;

///
/// Detect OPTIONAL blocks among `acts`
///
/// An activity `z` is optional between `x` and `y` if `x` is always followed by `y`,
/// `x` precedes `z` and occurs whenever `z` occurs, and `z` precedes `y` and implies it.
/// Activities of (final, top-level) XOR blocks never take part in an OPTIONAL block.
///
/// If the same activity is optional between several pairs, the candidate with the
/// earliest merge is kept. Remaining ties are broken by the latest split.
///
pub fn get_optional_blocks(
    graph: &RelationGraph<'_>,
    acts: &[ActivityIndex],
    xor_blocks: &[Block<ActivityIndex>],
) -> Vec<Block<ActivityIndex>> {
    let matrix = graph.matrix;
    let xor_acts = flatten_blocks(xor_blocks, true);
    let mut acts: Vec<ActivityIndex> = acts
        .iter()
        .copied()
        .filter(|a| !xor_acts.contains(a))
        .collect();
    acts.sort_unstable();

    // (optional activity, split, merge)
    let mut candidates: Vec<(ActivityIndex, ActivityIndex, ActivityIndex)> = Vec::new();
    for &x in &acts {
        for &y in &acts {
            let rel = matrix.relation(x, y);
            if x == y || rel.temporal != Temporal::Before || rel.existential != Existential::Equivalence {
                continue;
            }
            for &z in &acts {
                if z == x || z == y {
                    continue;
                }
                let xz = matrix.relation(x, z);
                let zy = matrix.relation(z, y);
                if xz.temporal.is_before()
                    && xz.existential == Existential::ReverseImplication
                    && zy.temporal.is_before()
                    && zy.existential == Existential::Implication
                {
                    candidates.push((z, x, y));
                }
            }
        }
    }

    let mut optionals: Vec<ActivityIndex> = Vec::new();
    for (z, _, _) in &candidates {
        if !optionals.contains(z) {
            optionals.push(*z);
        }
    }

    optionals
        .into_iter()
        .filter_map(|z| {
            let group: Vec<(ActivityIndex, ActivityIndex)> = candidates
                .iter()
                .filter(|(o, _, _)| *o == z)
                .map(|(_, x, y)| (*x, *y))
                .collect();
            let (start, end) = select_boundaries(graph, &group)?;
            Some(Block::new(
                BlockType::Optional,
                vec![BlockEntry::Single(z)],
                Some(start),
                Some(end),
            ))
        })
        .collect()
}

/// Pick the (split, merge) pair with the earliest merge, then the latest split
fn select_boundaries(
    graph: &RelationGraph<'_>,
    group: &[(ActivityIndex, ActivityIndex)],
) -> Option<(ActivityIndex, ActivityIndex)> {
    if group.len() == 1 {
        return group.first().copied();
    }
    let ends: BTreeSet<ActivityIndex> = group.iter().map(|(_, y)| *y).collect();
    let earliest = graph.earliest_among(&ends);
    let by_end: Vec<(ActivityIndex, ActivityIndex)> = group
        .iter()
        .copied()
        .filter(|(_, y)| earliest.contains(y))
        .collect();
    if by_end.len() == 1 {
        return by_end.first().copied();
    }
    let starts: BTreeSet<ActivityIndex> = by_end.iter().map(|(x, _)| *x).collect();
    let latest = graph.latest_among(&starts);
    by_end.into_iter().find(|(x, _)| latest.contains(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{idx, matrix};

    #[test]
    fn optional_between_closest_boundaries() {
        // s < a < o < b < e, o is optional, all others always occur
        let m = matrix(
            &["a", "b", "e", "o", "s"],
            &[
                ("s", "a", "<d,<=>"),
                ("s", "o", "<,<="),
                ("s", "b", "<,<=>"),
                ("s", "e", "<,<=>"),
                ("a", "o", "<d,<="),
                ("a", "b", "<,<=>"),
                ("a", "e", "<,<=>"),
                ("o", "b", "<d,=>"),
                ("o", "e", "<,=>"),
                ("b", "e", "<d,<=>"),
            ],
        );
        let g = RelationGraph::new(&m);
        let acts: Vec<usize> = m.indices().collect();
        let blocks = get_optional_blocks(&g, &acts, &[]);
        assert_eq!(
            blocks,
            vec![Block::new(
                BlockType::Optional,
                vec![BlockEntry::Single(idx(&m, "o"))],
                Some(idx(&m, "a")),
                Some(idx(&m, "b")),
            )]
        );
    }

    #[test]
    fn xor_activities_are_excluded() {
        let m = matrix(
            &["a", "b", "c"],
            &[("a", "b", "<,<=>"), ("a", "c", "<d,<="), ("c", "b", "<d,=>")],
        );
        let g = RelationGraph::new(&m);
        let acts: Vec<usize> = m.indices().collect();
        assert_eq!(get_optional_blocks(&g, &acts, &[]).len(), 1);
        let xor = Block::new(
            BlockType::Xor,
            vec![BlockEntry::Single(idx(&m, "c"))],
            None,
            None,
        );
        assert!(get_optional_blocks(&g, &acts, &[xor]).is_empty());
    }
}
