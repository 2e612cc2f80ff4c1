//! Process Analysis
//!
//! This module contains techniques for analyzing process models given by their pairwise
//! activity relations, most notably the structuredness score.

pub mod structuredness;
