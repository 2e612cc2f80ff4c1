//! Process Discovery
//!
//! Inference of control-flow structure from pairwise activity relations.
pub mod blocks;
