//! Score tables for the refinement terms
//!
//! Each table maps the relation between two activities to a signed score. Relations that
//! are not listed (e.g., direct relations between outsiders and super-blocks) do not
//! occur in well-formed inputs and are scored with 0.

use std::fmt::Display;

use crate::core::relations::{Existential as E, Relation, Temporal as T};

/// Immutable mapping from [`Relation`]s to scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTable {
    /// Name used in diagnostics
    pub name: &'static str,
    /// Scored relations
    pub entries: &'static [(Relation, f64)],
}

impl ScoreTable {
    /// Score of `relation`, `None` if the table does not score it
    pub fn lookup(&self, relation: Relation) -> Option<f64> {
        self.entries
            .iter()
            .find(|(r, _)| *r == relation)
            .map(|(_, score)| *score)
    }
}

impl Display for ScoreTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

const fn rel(temporal: T, existential: E) -> Relation {
    Relation::new(temporal, existential)
}

/// End activities of one super-block vs. start activities of another one
pub static SB_TO_SB: ScoreTable = ScoreTable {
    name: "SB_TO_SB",
    entries: &[
        (rel(T::DirectlyAfter, E::Equivalence), 0.50),
        (rel(T::Before, E::Equivalence), 0.15),
        (rel(T::After, E::Equivalence), 0.15),
        (rel(T::Before, E::Implication), 0.15),
        (rel(T::After, E::ReverseImplication), 0.15),
        (rel(T::Before, E::Independent), 0.10),
        (rel(T::After, E::Independent), 0.10),
        (rel(T::Unordered, E::Equivalence), -0.05),
        (rel(T::Unordered, E::Implication), -0.05),
        (rel(T::Unordered, E::ReverseImplication), -0.05),
        (rel(T::Unordered, E::Independent), -0.25),
    ],
};

/// Outsider activities vs. all activities of a super-block
pub static OUT_TO_SB: ScoreTable = ScoreTable {
    name: "OUT_TO_SB",
    entries: &[
        (rel(T::Before, E::Equivalence), 0.25),
        (rel(T::After, E::Equivalence), 0.25),
        (rel(T::Unordered, E::Equivalence), 0.20),
        (rel(T::Before, E::Implication), 0.15),
        (rel(T::Before, E::ReverseImplication), 0.15),
        (rel(T::After, E::Implication), 0.15),
        (rel(T::After, E::ReverseImplication), 0.15),
        (rel(T::DirectlyAfter, E::Independent), 0.10),
        (rel(T::After, E::Independent), 0.05),
        (rel(T::Before, E::Independent), 0.05),
        (rel(T::Unordered, E::ReverseImplication), -0.10),
        (rel(T::Unordered, E::Implication), -0.10),
        (rel(T::Unordered, E::Independent), -0.20),
    ],
};

/// Pairs of outsider activities
pub static OUT_TO_OUT: ScoreTable = ScoreTable {
    name: "OUT_TO_OUT",
    entries: &[
        (rel(T::Before, E::Equivalence), 0.25),
        (rel(T::After, E::Equivalence), 0.25),
        (rel(T::DirectlyBefore, E::ReverseImplication), 0.20),
        (rel(T::DirectlyBefore, E::Implication), 0.20),
        (rel(T::DirectlyAfter, E::ReverseImplication), 0.20),
        (rel(T::DirectlyAfter, E::Implication), 0.20),
        (rel(T::Unordered, E::Exclusion), 0.10),
        (rel(T::Unordered, E::Equivalence), 0.10),
        (rel(T::Before, E::Implication), 0.10),
        (rel(T::After, E::Implication), 0.10),
        (rel(T::Before, E::ReverseImplication), 0.10),
        (rel(T::After, E::ReverseImplication), 0.10),
        (rel(T::Before, E::Independent), -0.05),
        (rel(T::After, E::Independent), -0.05),
        (rel(T::Unordered, E::ReverseImplication), -0.15),
        (rel(T::Unordered, E::Implication), -0.15),
        (rel(T::Unordered, E::Independent), -0.25),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> Relation {
        s.parse().unwrap()
    }

    #[test]
    fn lookups() {
        assert_eq!(SB_TO_SB.lookup(r(">d,<=>")), Some(0.50));
        assert_eq!(SB_TO_SB.lookup(r("<d,<=>")), None);
        assert_eq!(OUT_TO_SB.lookup(r("-,-")), Some(-0.20));
        assert_eq!(OUT_TO_SB.lookup(r("-,</=>")), None);
        assert_eq!(OUT_TO_OUT.lookup(r("-,</=>")), Some(0.10));
        assert_eq!(OUT_TO_OUT.lookup(r(">d,=>")), Some(0.20));
    }

    #[test]
    fn tables_have_unique_entries() {
        for table in [&SB_TO_SB, &OUT_TO_SB, &OUT_TO_OUT] {
            for (i, (a, _)) in table.entries.iter().enumerate() {
                assert!(
                    table.entries[i + 1..].iter().all(|(b, _)| a != b),
                    "{} lists {} twice",
                    table,
                    a
                );
            }
        }
    }
}
