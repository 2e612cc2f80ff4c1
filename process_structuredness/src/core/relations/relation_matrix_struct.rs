use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{Existential, ParseRelationError, Relation, Temporal};

/// Dense index of an activity in a [`RelationMatrix`]
///
/// Activities are sorted by label, so comparing indices compares labels.
pub type ActivityIndex = usize;

/// Nested label map as used in the JSON exchange format: `from -> to -> "<temporal>,<existential>"`
pub type RawRelationMatrix = BTreeMap<String, BTreeMap<String, String>>;

///
/// Error encountered while constructing a [`RelationMatrix`]
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationMatrixError {
    /// The relation of an ordered activity pair is missing
    MissingRelation {
        /// First activity of the pair
        from: String,
        /// Second activity of the pair
        to: String,
    },
    /// A relation references an activity that has no row in the matrix
    UnknownActivity {
        /// Activity the relation starts from
        from: String,
        /// Unknown activity
        to: String,
    },
    /// A relation string could not be parsed
    InvalidRelation {
        /// First activity of the pair
        from: String,
        /// Second activity of the pair
        to: String,
        /// Underlying parse error
        error: ParseRelationError,
    },
    /// The relation of an activity with itself is not `"-,-"`
    InvalidSelfRelation {
        /// The activity
        activity: String,
        /// The relation found instead
        relation: Relation,
    },
    /// `(to, from)` is not the mirror of `(from, to)`
    InconsistentRelations {
        /// First activity of the pair
        from: String,
        /// Second activity of the pair
        to: String,
        /// Relation of `(from, to)`
        forward: Relation,
        /// Relation of `(to, from)`
        backward: Relation,
    },
    /// The same activity label was passed twice
    DuplicateActivity(String),
}

impl Display for RelationMatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationMatrixError::MissingRelation { from, to } => {
                write!(f, "Missing relation for activity pair ({}, {})", from, to)
            }
            RelationMatrixError::UnknownActivity { from, to } => write!(
                f,
                "Relation ({}, {}) references unknown activity '{}'",
                from, to, to
            ),
            RelationMatrixError::InvalidRelation { from, to, error } => {
                write!(f, "Invalid relation for ({}, {}): {}", from, to, error)
            }
            RelationMatrixError::InvalidSelfRelation { activity, relation } => write!(
                f,
                "Relation of '{}' with itself must be '-,-' but is '{}'",
                activity, relation
            ),
            RelationMatrixError::InconsistentRelations {
                from,
                to,
                forward,
                backward,
            } => write!(
                f,
                "Inconsistent relations: ({}, {}) is '{}' but ({}, {}) is '{}' (expected '{}')",
                from,
                to,
                forward,
                to,
                from,
                backward,
                forward.mirror()
            ),
            RelationMatrixError::DuplicateActivity(act) => {
                write!(f, "Activity '{}' is listed more than once", act)
            }
        }
    }
}

impl std::error::Error for RelationMatrixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelationMatrixError::InvalidRelation { error, .. } => Some(error),
            _ => None,
        }
    }
}

///
/// Pairwise relations between all activities of a process
///
/// Immutable after construction. Every constructor validates that
/// * all ordered pairs are present,
/// * every activity is `"-,-"` related to itself, and
/// * `(b, a)` is the mirror of `(a, b)`.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRelationMatrix", into = "RawRelationMatrix")]
pub struct RelationMatrix {
    activities: Vec<String>,
    act_to_index: HashMap<String, ActivityIndex>,
    relations: Vec<Relation>,
}

impl RelationMatrix {
    fn with_activities<I, S>(activities: I) -> Result<Self, RelationMatrixError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut activities: Vec<String> = activities.into_iter().map(Into::into).collect();
        activities.sort();
        if let Some(dup) = activities.windows(2).find(|w| w[0] == w[1]) {
            return Err(RelationMatrixError::DuplicateActivity(dup[0].clone()));
        }
        let act_to_index = activities
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();
        let n = activities.len();
        Ok(Self {
            activities,
            act_to_index,
            relations: vec![Relation::UNRELATED; n * n],
        })
    }

    /// Construct a matrix from the nested label map of the JSON exchange format
    ///
    /// The keys of the outer map define the activities. A missing self-relation `(a, a)`
    /// is taken as `"-,-"`, all other pairs must be present.
    pub fn from_raw(raw: &RawRelationMatrix) -> Result<Self, RelationMatrixError> {
        let mut matrix = Self::with_activities(raw.keys().cloned())?;
        for (from, row) in raw {
            if let Some(to) = row.keys().find(|to| !matrix.act_to_index.contains_key(*to)) {
                return Err(RelationMatrixError::UnknownActivity {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
        let n = matrix.len();
        for a in 0..n {
            let row = &raw[&matrix.activities[a]];
            for b in 0..n {
                let from = &matrix.activities[a];
                let to = &matrix.activities[b];
                let value = match row.get(to) {
                    Some(value) => value,
                    // Self-relations may be omitted
                    None if a == b => continue,
                    None => {
                        return Err(RelationMatrixError::MissingRelation {
                            from: from.clone(),
                            to: to.clone(),
                        })
                    }
                };
                let relation: Relation =
                    value
                        .parse()
                        .map_err(|error| RelationMatrixError::InvalidRelation {
                            from: from.clone(),
                            to: to.clone(),
                            error,
                        })?;
                matrix.relations[a * n + b] = relation;
            }
        }
        matrix.validate()?;
        Ok(matrix)
    }

    ///
    /// Construct a matrix from forward relations only
    ///
    /// The relation of `(b, a)` is set to the mirror of the given `(a, b)` relation.
    /// Pairs that are not mentioned are `"-,-"`.
    ///
    /// ```
    /// use process_structuredness::core::relations::RelationMatrix;
    ///
    /// let matrix = RelationMatrix::from_pairs(["a", "b"], [("a", "b", "<d,<=>")]).unwrap();
    /// assert_eq!(matrix.relation_by_name("b", "a").unwrap().to_string(), ">d,<=>");
    /// ```
    pub fn from_pairs<I, S, P, A, B, R>(activities: I, pairs: P) -> Result<Self, RelationMatrixError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        P: IntoIterator<Item = (A, B, R)>,
        A: AsRef<str>,
        B: AsRef<str>,
        R: AsRef<str>,
    {
        let mut matrix = Self::with_activities(activities)?;
        let n = matrix.len();
        for (from, to, value) in pairs {
            let (from, to) = (from.as_ref(), to.as_ref());
            let lookup = |act: &str| {
                matrix
                    .index_of(act)
                    .ok_or_else(|| RelationMatrixError::UnknownActivity {
                        from: from.to_string(),
                        to: act.to_string(),
                    })
            };
            let (a, b) = (lookup(from)?, lookup(to)?);
            let relation: Relation =
                value
                    .as_ref()
                    .parse()
                    .map_err(|error| RelationMatrixError::InvalidRelation {
                        from: from.to_string(),
                        to: to.to_string(),
                        error,
                    })?;
            matrix.relations[a * n + b] = relation;
            matrix.relations[b * n + a] = relation.mirror();
        }
        matrix.validate()?;
        Ok(matrix)
    }

    fn validate(&self) -> Result<(), RelationMatrixError> {
        let n = self.len();
        for a in 0..n {
            let own = self.relation(a, a);
            if own != Relation::UNRELATED {
                return Err(RelationMatrixError::InvalidSelfRelation {
                    activity: self.activities[a].clone(),
                    relation: own,
                });
            }
            for b in (a + 1)..n {
                let forward = self.relation(a, b);
                let backward = self.relation(b, a);
                if forward.mirror() != backward {
                    return Err(RelationMatrixError::InconsistentRelations {
                        from: self.activities[a].clone(),
                        to: self.activities[b].clone(),
                        forward,
                        backward,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of activities
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// `true` if the matrix has no activities
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Activity labels, sorted (position = [`ActivityIndex`])
    pub fn activities(&self) -> &[String] {
        &self.activities
    }

    /// All activity indices in canonical (label) order
    pub fn indices(&self) -> std::ops::Range<ActivityIndex> {
        0..self.activities.len()
    }

    /// Index of the activity with the given label
    pub fn index_of(&self, activity: &str) -> Option<ActivityIndex> {
        self.act_to_index.get(activity).copied()
    }

    /// Label of the activity at `index`
    pub fn name(&self, index: ActivityIndex) -> &str {
        &self.activities[index]
    }

    /// Labels for a collection of activity indices
    pub fn acts_to_names<'a, I>(&self, acts: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a ActivityIndex>,
    {
        acts.into_iter().map(|a| self.activities[*a].clone()).collect()
    }

    /// Relation of the ordered pair `(a, b)`
    ///
    /// Panics if an index is out of range.
    pub fn relation(&self, a: ActivityIndex, b: ActivityIndex) -> Relation {
        self.relations[a * self.activities.len() + b]
    }

    /// Temporal part of the relation of `(a, b)`
    pub fn temporal(&self, a: ActivityIndex, b: ActivityIndex) -> Temporal {
        self.relation(a, b).temporal
    }

    /// Existential part of the relation of `(a, b)`
    pub fn existential(&self, a: ActivityIndex, b: ActivityIndex) -> Existential {
        self.relation(a, b).existential
    }

    /// `a` and `b` are distinct, unordered and always co-occur
    pub fn always(&self, a: ActivityIndex, b: ActivityIndex) -> bool {
        a != b && self.relation(a, b).is_always()
    }

    /// `a` and `b` are distinct, unordered and never co-occur
    pub fn never(&self, a: ActivityIndex, b: ActivityIndex) -> bool {
        a != b && self.relation(a, b).is_never()
    }

    /// Relation of the ordered pair `(from, to)` by label
    pub fn relation_by_name(&self, from: &str, to: &str) -> Option<Relation> {
        Some(self.relation(self.index_of(from)?, self.index_of(to)?))
    }

    /// Convert back into the nested label map of the JSON exchange format
    pub fn to_raw(&self) -> RawRelationMatrix {
        self.indices()
            .map(|a| {
                let row = self
                    .indices()
                    .map(|b| (self.activities[b].clone(), self.relation(a, b).to_string()))
                    .collect();
                (self.activities[a].clone(), row)
            })
            .collect()
    }
}

impl TryFrom<RawRelationMatrix> for RelationMatrix {
    type Error = RelationMatrixError;

    fn try_from(raw: RawRelationMatrix) -> Result<Self, Self::Error> {
        RelationMatrix::from_raw(&raw)
    }
}

impl From<RelationMatrix> for RawRelationMatrix {
    fn from(matrix: RelationMatrix) -> Self {
        matrix.to_raw()
    }
}
