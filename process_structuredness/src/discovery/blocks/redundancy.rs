use std::collections::{BTreeMap, BTreeSet};

use crate::core::process_models::blocks::Block;

///
/// Remove duplicated blocks and blocks contained in other blocks
///
/// Of several blocks with identical entries, the one with more defined boundary
/// activities (split/merge) is kept at the position of the first one. Afterwards,
/// blocks whose activities (without split/merge) are a strict subset of another
/// block's activities are dropped.
///
pub fn remove_redundant_blocks<A: Ord + Clone>(blocks: Vec<Block<A>>) -> Vec<Block<A>> {
    let mut unique: Vec<Block<A>> = Vec::new();
    for block in blocks {
        match unique.iter_mut().find(|b| b.activities == block.activities) {
            Some(existing) => {
                if block.boundary_count() > existing.boundary_count() {
                    *existing = block;
                }
            }
            None => unique.push(block),
        }
    }

    let flattened: Vec<BTreeSet<A>> = unique.iter().map(|b| b.flatten(false)).collect();
    unique
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            !flattened.iter().enumerate().any(|(j, other)| {
                *i != j && flattened[*i].len() < other.len() && flattened[*i].is_subset(other)
            })
        })
        .map(|(_, b)| b)
        .collect()
}

///
/// Keep only blocks none of whose entries occurs in another block
///
/// Sharing an identical branch entry means that the blocks claim the same branch
/// for different choices, so neither of them is trustworthy.
///
pub fn retain_entry_exclusive_blocks<A: Ord + Clone>(blocks: Vec<Block<A>>) -> Vec<Block<A>> {
    let mut counts = BTreeMap::new();
    for entry in blocks.iter().flat_map(|b| b.activities.iter()) {
        *counts.entry(entry.clone()).or_insert(0usize) += 1;
    }
    blocks
        .into_iter()
        .filter(|b| b.activities.iter().all(|e| counts.get(e) == Some(&1)))
        .collect()
}

///
/// Remove blocks whose activities are all contained in one of the reference blocks
///
/// With `include_split_merge`, split and merge activities count as activities of a block.
///
pub fn remove_duplicate_blocks_from_nesting<A: Ord + Clone>(
    blocks: Vec<Block<A>>,
    ref_blocks: &[Block<A>],
    include_split_merge: bool,
) -> Vec<Block<A>> {
    let ref_acts: Vec<BTreeSet<A>> = ref_blocks
        .iter()
        .map(|b| b.flatten(include_split_merge))
        .collect();
    blocks
        .into_iter()
        .filter(|b| {
            let acts = b.flatten(include_split_merge);
            !ref_acts.iter().any(|r| acts.is_subset(r))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_models::blocks::{BlockEntry, BlockType};

    fn xor(branches: Vec<Vec<u32>>, start: Option<u32>, end: Option<u32>) -> Block<u32> {
        Block::new(
            BlockType::Xor,
            BlockEntry::canonical_entries(branches),
            start,
            end,
        )
    }

    #[test]
    fn prefers_more_informative_duplicate() {
        let blocks = vec![
            xor(vec![vec![1], vec![2]], None, None),
            xor(vec![vec![3], vec![4]], None, None),
            xor(vec![vec![2], vec![1]], Some(0), None),
            xor(vec![vec![1], vec![2]], None, Some(5)),
        ];
        let res = remove_redundant_blocks(blocks);
        assert_eq!(
            res,
            vec![
                xor(vec![vec![1], vec![2]], Some(0), None),
                xor(vec![vec![3], vec![4]], None, None)
            ]
        );
    }

    #[test]
    fn drops_strict_subsets() {
        let blocks = vec![
            xor(vec![vec![1], vec![2]], None, None),
            xor(vec![vec![1], vec![2, 3]], None, None),
        ];
        assert_eq!(
            remove_redundant_blocks(blocks),
            vec![xor(vec![vec![1], vec![2, 3]], None, None)]
        );
    }

    #[test]
    fn shared_entries() {
        let blocks = vec![
            xor(vec![vec![1], vec![2]], None, None),
            xor(vec![vec![1], vec![3]], None, None),
            xor(vec![vec![4], vec![5, 6]], None, None),
        ];
        assert_eq!(
            retain_entry_exclusive_blocks(blocks),
            vec![xor(vec![vec![4], vec![5, 6]], None, None)]
        );
    }

    #[test]
    fn nested_duplicates() {
        let seq = Block::new(
            BlockType::Sequence,
            vec![],
            Some(1),
            Some(2),
        );
        let par = Block::new(
            BlockType::Par,
            BlockEntry::canonical_entries(vec![vec![2], vec![3]]),
            Some(1),
            None,
        );
        assert!(remove_duplicate_blocks_from_nesting(vec![seq.clone()], &[par.clone()], true).is_empty());
        // without split/merge, the sequence has no activities and is trivially contained
        assert!(remove_duplicate_blocks_from_nesting(vec![seq.clone()], &[par], false).is_empty());
        assert_eq!(
            remove_duplicate_blocks_from_nesting(vec![seq.clone()], &[], true),
            vec![seq]
        );
    }
}
