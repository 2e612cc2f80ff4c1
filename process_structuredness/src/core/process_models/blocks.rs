use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

///
/// Type of a control-flow [`Block`]
///
/// The declaration order is also the canonical order of blocks.
///
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockType {
    /// Exclusive choice between branches
    #[serde(rename = "XOR")]
    Xor,
    /// Parallel (always co-occurring) branches
    #[serde(rename = "PAR")]
    Par,
    /// A single activity that may be skipped between a fixed split and merge
    #[serde(rename = "OPTIONAL")]
    Optional,
    /// Activities that always occur directly after each other
    #[serde(rename = "SEQUENCE")]
    Sequence,
}

impl BlockType {
    /// Name of the block type (e.g., `"XOR"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Xor => "XOR",
            BlockType::Par => "PAR",
            BlockType::Optional => "OPTIONAL",
            BlockType::Sequence => "SEQUENCE",
        }
    }

    /// Parse a block type name
    ///
    /// Returns `None` if the string cannot be parsed
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "XOR" => Some(BlockType::Xor),
            "PAR" => Some(BlockType::Par),
            "OPTIONAL" => Some(BlockType::Optional),
            "SEQUENCE" => Some(BlockType::Sequence),
            _ => None,
        }
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// Entry of [`Block::activities`]
///
/// Singles sort before branches, so a sorted entry list lists all single-activity
/// branches first.
///
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockEntry<A = String> {
    /// Branch consisting of a single activity
    Single(A),
    /// Branch with multiple activities (sorted)
    Branch(Vec<A>),
}

impl<A> BlockEntry<A> {
    /// Activities of this entry
    pub fn activities(&self) -> &[A] {
        match self {
            BlockEntry::Single(a) => std::slice::from_ref(a),
            BlockEntry::Branch(acts) => acts,
        }
    }

    /// Map the activity representation
    pub fn map_activities<B, F: Fn(&A) -> B>(&self, f: &F) -> BlockEntry<B> {
        match self {
            BlockEntry::Single(a) => BlockEntry::Single(f(a)),
            BlockEntry::Branch(acts) => BlockEntry::Branch(acts.iter().map(f).collect()),
        }
    }
}

impl<A: Ord> BlockEntry<A> {
    ///
    /// Turn branches into canonically ordered entries
    ///
    /// Branches with one activity become [`BlockEntry::Single`], all other branches are
    /// sorted internally. The resulting entries are sorted (singles first).
    /// Empty branches are dropped.
    ///
    pub fn canonical_entries(branches: Vec<Vec<A>>) -> Vec<BlockEntry<A>> {
        let mut entries: Vec<BlockEntry<A>> = branches
            .into_iter()
            .filter(|b| !b.is_empty())
            .map(|mut branch| {
                if branch.len() == 1 {
                    BlockEntry::Single(branch.remove(0))
                } else {
                    branch.sort();
                    BlockEntry::Branch(branch)
                }
            })
            .collect();
        entries.sort();
        entries
    }
}

///
/// Control-flow fragment inferred from pairwise activity relations
///
/// Generic over the activity representation: detection works on activity indices,
/// reports use labels ([`String`], the default).
///
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Block<A = String> {
    /// Block type
    pub block_type: BlockType,
    /// Branches of the block (canonically ordered, see [`BlockEntry::canonical_entries`])
    pub activities: Vec<BlockEntry<A>>,
    /// Split activity
    pub start: Option<A>,
    /// Merge activity
    pub end: Option<A>,
    /// Blocks contained in the branches of this block
    pub nested: Vec<Block<A>>,
}

impl<A: Ord + Clone> Block<A> {
    /// Create a new block without nested blocks
    pub fn new(
        block_type: BlockType,
        activities: Vec<BlockEntry<A>>,
        start: Option<A>,
        end: Option<A>,
    ) -> Self {
        Self {
            block_type,
            activities,
            start,
            end,
            nested: Vec::new(),
        }
    }

    /// Set of all activities in the branches of this block
    pub fn flatten_activities(&self) -> BTreeSet<A> {
        self.activities
            .iter()
            .flat_map(|e| e.activities().iter().cloned())
            .collect()
    }

    /// Set of all activities of this block, optionally including split and merge
    pub fn flatten(&self, include_split_merge: bool) -> BTreeSet<A> {
        let mut acts = self.flatten_activities();
        if include_split_merge {
            acts.extend(self.start.iter().cloned());
            acts.extend(self.end.iter().cloned());
        }
        acts
    }

    /// Number of defined boundary activities (split and merge)
    pub fn boundary_count(&self) -> usize {
        usize::from(self.start.is_some()) + usize::from(self.end.is_some())
    }
}

impl<A> Block<A> {
    /// Map the activity representation of this block and all nested blocks
    pub fn map_activities<B, F: Fn(&A) -> B>(&self, f: &F) -> Block<B> {
        Block {
            block_type: self.block_type,
            activities: self.activities.iter().map(|e| e.map_activities(f)).collect(),
            start: self.start.as_ref().map(f),
            end: self.end.as_ref().map(f),
            nested: self.nested.iter().map(|b| b.map_activities(f)).collect(),
        }
    }
}

/// Union of all (flattened) activities of the given blocks
pub fn flatten_blocks<A: Ord + Clone>(blocks: &[Block<A>], include_split_merge: bool) -> BTreeSet<A> {
    blocks
        .iter()
        .flat_map(|b| b.flatten(include_split_merge))
        .collect()
}

///
/// Maximal chain of [`Block`]s
///
/// `start` is the split of the first block, `end` the merge of the last block.
/// `activities` holds all other activities of the chain (sorted).
///
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock<A = String> {
    /// Start activity of the chain
    pub start: Option<A>,
    /// End activity of the chain
    pub end: Option<A>,
    /// Inner activities of the chain
    pub activities: Vec<A>,
}

impl<A: Clone> SuperBlock<A> {
    /// Inner activities followed by start and end (if defined)
    pub fn full_activities(&self) -> Vec<A> {
        self.activities
            .iter()
            .chain(self.start.iter())
            .chain(self.end.iter())
            .cloned()
            .collect()
    }
}

impl<A> SuperBlock<A> {
    /// Map the activity representation
    pub fn map_activities<B, F: Fn(&A) -> B>(&self, f: &F) -> SuperBlock<B> {
        SuperBlock {
            start: self.start.as_ref().map(f),
            end: self.end.as_ref().map(f),
            activities: self.activities.iter().map(f).collect(),
        }
    }
}
