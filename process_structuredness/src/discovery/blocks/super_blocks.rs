use std::collections::BTreeSet;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::{
    process_models::blocks::{Block, SuperBlock},
    relations::{ActivityIndex, RelationMatrix, Temporal},
};

/// Boundary activities of a block: the given boundary or, if undefined, all branch activities
fn boundary_or_inner(block: &Block<ActivityIndex>, boundary: Option<ActivityIndex>) -> Vec<ActivityIndex> {
    match boundary {
        Some(b) => vec![b],
        None => block.flatten_activities().into_iter().collect(),
    }
}

/// Some exit of `from` is (or directly precedes) some entry of `to`
fn connects(matrix: &RelationMatrix, from: &Block<ActivityIndex>, to: &Block<ActivityIndex>) -> bool {
    let ends = boundary_or_inner(from, from.end);
    let starts = boundary_or_inner(to, to.start);
    ends.iter().any(|&e| {
        starts
            .iter()
            .any(|&s| e == s || matrix.temporal(e, s) == Temporal::DirectlyBefore)
    })
}

/// Neighbor with the smallest block index in the given direction
fn first_neighbor(graph: &DiGraph<usize, ()>, node: NodeIndex, dir: Direction) -> Option<NodeIndex> {
    graph.neighbors_directed(node, dir).min_by_key(|n| n.index())
}

///
/// Chain blocks into super-blocks
///
/// Two blocks are connected if the merge (or, if undefined, any branch activity) of the
/// first one equals or directly precedes the split (or any branch activity) of the second one.
/// For every block not yet part of a chain, the connection graph is walked back to a root
/// and then forward, always following the connection to the lowest block index.
///
/// Every resulting [`SuperBlock`] starts at the split of its first block, ends at the merge
/// of its last block and contains all other activities of its blocks.
/// Identical super-blocks are only reported once.
///
pub fn build_super_blocks(
    blocks: &[Block<ActivityIndex>],
    matrix: &RelationMatrix,
) -> Vec<SuperBlock<ActivityIndex>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(blocks.len(), 0);
    let nodes: Vec<NodeIndex> = (0..blocks.len()).map(|i| graph.add_node(i)).collect();
    for i in 0..blocks.len() {
        for j in (i + 1)..blocks.len() {
            if connects(matrix, &blocks[i], &blocks[j]) {
                graph.update_edge(nodes[i], nodes[j], ());
            } else if connects(matrix, &blocks[j], &blocks[i]) {
                graph.update_edge(nodes[j], nodes[i], ());
            }
        }
    }

    let mut visited = vec![false; blocks.len()];
    let mut super_blocks: Vec<SuperBlock<ActivityIndex>> = Vec::new();
    for &node in &nodes {
        if visited[node.index()] {
            continue;
        }
        let mut root = node;
        let mut seen = BTreeSet::from([node]);
        while let Some(pred) = first_neighbor(&graph, root, Direction::Incoming) {
            if !seen.insert(pred) {
                break;
            }
            root = pred;
        }

        let mut chain = vec![root];
        let mut current = root;
        while let Some(succ) = first_neighbor(&graph, current, Direction::Outgoing) {
            if chain.contains(&succ) {
                break;
            }
            chain.push(succ);
            current = succ;
        }
        for n in &chain {
            visited[n.index()] = true;
        }

        let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
            continue;
        };
        let start = blocks[first.index()].start;
        let end = blocks[last.index()].end;
        let activities: Vec<ActivityIndex> = chain
            .iter()
            .flat_map(|n| blocks[n.index()].flatten(true))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|a| Some(*a) != start && Some(*a) != end)
            .collect();
        let super_block = SuperBlock {
            start,
            end,
            activities,
        };
        if !super_blocks.contains(&super_block) {
            super_blocks.push(super_block);
        }
    }
    tracing::debug!(
        blocks = blocks.len(),
        super_blocks = super_blocks.len(),
        "Super-blocks built"
    );
    super_blocks
}

/// Same as [`build_super_blocks`], but with activity labels instead of indices
pub fn build_super_blocks_named(
    blocks: &[Block<ActivityIndex>],
    matrix: &RelationMatrix,
) -> Vec<SuperBlock> {
    build_super_blocks(blocks, matrix)
        .iter()
        .map(|sb| sb.map_activities(&|a: &ActivityIndex| matrix.name(*a).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_models::blocks::{BlockEntry, BlockType};
    use crate::discovery::blocks::{detect_blocks, DetectionConfig};
    use crate::utils::test_utils::{idx, log01, matrix};

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chained_blocks_form_one_super_block() {
        let m = log01();
        let blocks = detect_blocks(&m, &DetectionConfig::default()).unwrap();
        let sbs = build_super_blocks_named(&blocks, &m);
        assert_eq!(
            sbs,
            vec![SuperBlock {
                start: Some("a".to_string()),
                end: Some("f".to_string()),
                activities: names(&["b", "c", "d", "e"]),
            }]
        );
    }

    #[test]
    fn unconnected_blocks_stay_separate() {
        let m = matrix(
            &["a", "b", "c", "d"],
            &[("a", "b", "-,</=>"), ("c", "d", "-,</=>")],
        );
        let (a, b, c, d) = (idx(&m, "a"), idx(&m, "b"), idx(&m, "c"), idx(&m, "d"));
        let blocks = vec![
            Block::new(BlockType::Xor, vec![BlockEntry::Single(a), BlockEntry::Single(b)], None, None),
            Block::new(BlockType::Xor, vec![BlockEntry::Single(c), BlockEntry::Single(d)], None, None),
        ];
        let sbs = build_super_blocks(&blocks, &m);
        assert_eq!(sbs.len(), 2);
        assert_eq!(sbs[0].activities, vec![a, b]);
        assert_eq!(sbs[1].activities, vec![c, d]);
        assert_eq!(sbs[1].start, None);
    }

    #[test]
    fn branch_activities_connect_blocks_without_boundaries() {
        // the XOR has no merge, but its branch c directly precedes the sequence start
        let m = matrix(
            &["b", "c", "x", "y"],
            &[
                ("b", "c", "-,</=>"),
                ("c", "x", "<d,=>"),
                ("b", "x", "<,=>"),
                ("x", "y", "<d,<=>"),
                ("b", "y", "<,=>"),
                ("c", "y", "<,=>"),
            ],
        );
        let (b, c, x, y) = (idx(&m, "b"), idx(&m, "c"), idx(&m, "x"), idx(&m, "y"));
        let blocks = vec![
            Block::new(BlockType::Xor, vec![BlockEntry::Single(b), BlockEntry::Single(c)], None, None),
            Block::new(BlockType::Sequence, vec![], Some(x), Some(y)),
        ];
        assert_eq!(
            build_super_blocks(&blocks, &m),
            vec![SuperBlock {
                start: None,
                end: Some(y),
                activities: vec![b, c, x],
            }]
        );
    }
}
