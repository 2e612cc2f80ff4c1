//! Pairwise Activity Relations
//!
//! Temporal and existential relations between two activities, as exported by
//! activity relationship matrix discovery tools.
use std::fmt::Display;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod io;
pub mod relation_matrix_struct;

#[doc(inline)]
pub use relation_matrix_struct::{ActivityIndex, RelationMatrix, RelationMatrixError};

/// Temporal relation of an ordered activity pair `(a, b)`
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord, JsonSchema,
)]
pub enum Temporal {
    /// `<`: `a` occurs before `b` (not necessarily directly)
    Before,
    /// `<d`: `a` occurs directly before `b`
    DirectlyBefore,
    /// `>`: `a` occurs after `b`
    After,
    /// `>d`: `a` occurs directly after `b`
    DirectlyAfter,
    /// `-`: no temporal ordering
    Unordered,
}

/// All [`Temporal`] relations
pub const ALL_TEMPORAL_RELATIONS: &[Temporal] = &[
    Temporal::Before,
    Temporal::DirectlyBefore,
    Temporal::After,
    Temporal::DirectlyAfter,
    Temporal::Unordered,
];

impl Temporal {
    /// Parse a temporal symbol
    ///
    /// e.g., `"<d"` -> [`Temporal::DirectlyBefore`]
    ///
    /// Returns `None` if the string cannot be parsed
    pub fn parse_str(s: impl AsRef<str>) -> Option<Self> {
        match s.as_ref().trim() {
            "<" => Some(Self::Before),
            "<d" => Some(Self::DirectlyBefore),
            ">" => Some(Self::After),
            ">d" => Some(Self::DirectlyAfter),
            "-" => Some(Self::Unordered),
            _ => None,
        }
    }

    /// Symbol of this relation (e.g., `"<d"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Temporal::Before => "<",
            Temporal::DirectlyBefore => "<d",
            Temporal::After => ">",
            Temporal::DirectlyAfter => ">d",
            Temporal::Unordered => "-",
        }
    }

    /// The same relation seen from the other activity, i.e., the relation of `(b, a)`
    pub fn mirror(&self) -> Self {
        match self {
            Temporal::Before => Temporal::After,
            Temporal::DirectlyBefore => Temporal::DirectlyAfter,
            Temporal::After => Temporal::Before,
            Temporal::DirectlyAfter => Temporal::DirectlyBefore,
            Temporal::Unordered => Temporal::Unordered,
        }
    }

    /// `true` for `<` and `<d`
    pub fn is_before(&self) -> bool {
        matches!(self, Temporal::Before | Temporal::DirectlyBefore)
    }

    /// `true` for the directly-follows markers `<d` and `>d`
    pub fn is_direct(&self) -> bool {
        matches!(self, Temporal::DirectlyBefore | Temporal::DirectlyAfter)
    }
}

/// Existential relation of an ordered activity pair `(a, b)`
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord, JsonSchema,
)]
pub enum Existential {
    /// `<=>`: `a` and `b` always co-occur
    Equivalence,
    /// `=>`: if `a` occurs, `b` occurs
    Implication,
    /// `<=`: if `b` occurs, `a` occurs
    ReverseImplication,
    /// `</=>`: `a` and `b` never co-occur
    Exclusion,
    /// `-`: no existential dependency
    Independent,
}

/// All [`Existential`] relations
pub const ALL_EXISTENTIAL_RELATIONS: &[Existential] = &[
    Existential::Equivalence,
    Existential::Implication,
    Existential::ReverseImplication,
    Existential::Exclusion,
    Existential::Independent,
];

impl Existential {
    /// Parse an existential symbol
    ///
    /// e.g., `"</=>"` -> [`Existential::Exclusion`]
    ///
    /// Returns `None` if the string cannot be parsed
    pub fn parse_str(s: impl AsRef<str>) -> Option<Self> {
        match s.as_ref().trim() {
            "<=>" => Some(Self::Equivalence),
            "=>" => Some(Self::Implication),
            "<=" => Some(Self::ReverseImplication),
            "</=>" => Some(Self::Exclusion),
            "-" => Some(Self::Independent),
            _ => None,
        }
    }

    /// Symbol of this relation (e.g., `"<=>"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Existential::Equivalence => "<=>",
            Existential::Implication => "=>",
            Existential::ReverseImplication => "<=",
            Existential::Exclusion => "</=>",
            Existential::Independent => "-",
        }
    }

    /// The same relation seen from the other activity, i.e., the relation of `(b, a)`
    pub fn mirror(&self) -> Self {
        match self {
            Existential::Implication => Existential::ReverseImplication,
            Existential::ReverseImplication => Existential::Implication,
            other => *other,
        }
    }
}

/// Combined temporal and existential relation of an ordered activity pair
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord, JsonSchema,
)]
pub struct Relation {
    /// Temporal part
    pub temporal: Temporal,
    /// Existential part
    pub existential: Existential,
}

impl Relation {
    /// The `"-,-"` relation, also used for every activity paired with itself
    pub const UNRELATED: Relation = Relation::new(Temporal::Unordered, Existential::Independent);

    /// Create a new relation
    pub const fn new(temporal: Temporal, existential: Existential) -> Self {
        Self {
            temporal,
            existential,
        }
    }

    /// The relation of `(b, a)` given this relation of `(a, b)`
    pub fn mirror(&self) -> Self {
        Self::new(self.temporal.mirror(), self.existential.mirror())
    }

    /// No ordering, always co-occurring (`"-,<=>"`)
    pub fn is_always(&self) -> bool {
        self.temporal == Temporal::Unordered && self.existential == Existential::Equivalence
    }

    /// No ordering, never co-occurring (`"-,</=>"`)
    pub fn is_never(&self) -> bool {
        self.temporal == Temporal::Unordered && self.existential == Existential::Exclusion
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.temporal.as_str(), self.existential.as_str())
    }
}

///
/// Error encountered while parsing a `"<temporal>,<existential>"` relation string
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseRelationError {
    /// No `,` separating the temporal and existential part
    MissingSeparator(String),
    /// Unknown temporal symbol
    UnknownTemporal(String),
    /// Unknown existential symbol
    UnknownExistential(String),
}

impl Display for ParseRelationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseRelationError::MissingSeparator(s) => {
                write!(f, "Expected '<temporal>,<existential>' but got '{}'", s)
            }
            ParseRelationError::UnknownTemporal(s) => write!(f, "Unknown temporal relation '{}'", s),
            ParseRelationError::UnknownExistential(s) => {
                write!(f, "Unknown existential relation '{}'", s)
            }
        }
    }
}

impl std::error::Error for ParseRelationError {}

impl FromStr for Relation {
    type Err = ParseRelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (temporal, existential) = s
            .split_once(',')
            .ok_or_else(|| ParseRelationError::MissingSeparator(s.to_string()))?;
        let temporal = Temporal::parse_str(temporal)
            .ok_or_else(|| ParseRelationError::UnknownTemporal(temporal.trim().to_string()))?;
        let existential = Existential::parse_str(existential).ok_or_else(|| {
            ParseRelationError::UnknownExistential(existential.trim().to_string())
        })?;
        Ok(Relation::new(temporal, existential))
    }
}

#[cfg(test)]
mod tests {
    use itertools::iproduct;

    use super::*;

    #[test]
    fn parse_and_display_relation() {
        let rel: Relation = "<d,<=>".parse().unwrap();
        assert_eq!(
            rel,
            Relation::new(Temporal::DirectlyBefore, Existential::Equivalence)
        );
        assert_eq!(rel.to_string(), "<d,<=>");

        let rel: Relation = " - , </=> ".parse().unwrap();
        assert!(rel.is_never());
        assert_eq!(rel.to_string(), "-,</=>");
    }

    #[test]
    fn parse_invalid_relations() {
        assert_eq!(
            "<d".parse::<Relation>(),
            Err(ParseRelationError::MissingSeparator("<d".to_string()))
        );
        assert_eq!(
            "<<,<=>".parse::<Relation>(),
            Err(ParseRelationError::UnknownTemporal("<<".to_string()))
        );
        assert_eq!(
            "<,v".parse::<Relation>(),
            Err(ParseRelationError::UnknownExistential("v".to_string()))
        );
    }

    #[test]
    fn mirror_is_involution() {
        for (t, e) in iproduct!(ALL_TEMPORAL_RELATIONS, ALL_EXISTENTIAL_RELATIONS) {
            let rel = Relation::new(*t, *e);
            assert_eq!(rel.mirror().mirror(), rel);
            assert_eq!(rel.to_string().parse::<Relation>().unwrap(), rel);
        }
        assert_eq!(
            "<d,=>".parse::<Relation>().unwrap().mirror().to_string(),
            ">d,<="
        );
    }
}
