use std::collections::BTreeSet;

use crate::core::{
    process_models::blocks::{Block, BlockEntry, BlockType},
    relations::{ActivityIndex, Existential},
};

use super::graph_utils::RelationGraph;

///
/// Detect SEQUENCE blocks among `acts`
///
/// A sequence is a maximal chain `a_1 <d a_2 <d ... <d a_k` (k >= 2) where every `a_i`
/// has `a_{i+1}` as its only direct successor and both always co-occur. The first and
/// last activity become split and merge, the interior activities are kept in chain order.
///
/// Sequences contained in a longer sequence are dropped.
///
pub fn get_sequences(graph: &RelationGraph<'_>, acts: &[ActivityIndex]) -> Vec<Block<ActivityIndex>> {
    let matrix = graph.matrix;
    let mut acts = acts.to_vec();
    acts.sort_unstable();

    let mut visited: BTreeSet<ActivityIndex> = BTreeSet::new();
    let mut sequences: Vec<Block<ActivityIndex>> = Vec::new();
    for &x in &acts {
        if visited.contains(&x) {
            continue;
        }
        let mut chain = vec![x];
        let mut current = x;
        loop {
            let succs = &graph.direct_succs[current];
            let Some(&next) = succs.first() else {
                break;
            };
            if succs.len() != 1
                || chain.contains(&next)
                || matrix.existential(current, next) != Existential::Equivalence
            {
                break;
            }
            chain.push(next);
            current = next;
        }
        if chain.len() < 2 {
            continue;
        }
        visited.extend(chain.iter().copied());
        let interior = chain[1..chain.len() - 1]
            .iter()
            .map(|a| BlockEntry::Single(*a))
            .collect();
        sequences.push(Block::new(
            BlockType::Sequence,
            interior,
            chain.first().copied(),
            chain.last().copied(),
        ));
    }

    let flattened: Vec<BTreeSet<ActivityIndex>> = sequences.iter().map(|s| s.flatten(true)).collect();
    sequences
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            !flattened
                .iter()
                .any(|other| flattened[*i].len() < other.len() && flattened[*i].is_subset(other))
        })
        .map(|(_, s)| s)
        .collect()
}
