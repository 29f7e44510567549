//!
//! Weighted-count records consumed by `ModelBuilder`
//!
//! The records are produced by the parsers in `crate::io::weights` (or built
//! directly in code) and are dropped once the tables are constructed.
//!
use crate::common::{Action, Observation, State, Weight};
use derive_new::new;

///
/// `(state, weight)` line of the initial-weights input
///
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct InitialRecord {
    pub state: State,
    pub weight: Weight,
}

///
/// `(source, target, weight)` line of an unconditional transition input
///
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct TransitionRecord {
    pub source: State,
    pub target: State,
    pub weight: Weight,
}

///
/// `(source, action, target, weight)` line of an action-conditioned
/// transition input
///
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct ActionTransitionRecord {
    pub source: State,
    pub action: Action,
    pub target: State,
    pub weight: Weight,
}

///
/// `(state, observation, weight)` line of the emission input
///
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct EmissionRecord {
    pub state: State,
    pub observation: Observation,
    pub weight: Weight,
}

///
/// Metadata line of the initial-weights input
///
/// Either `default_weight` alone or `n_states default_weight`.
/// The default weight is not used for the initial distribution:
/// states without a line get no entry.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, new)]
pub struct InitialHeader {
    pub n_states: Option<usize>,
    pub default_weight: Weight,
}

///
/// Metadata line `_ n_states n_labels default_weight` of the transition and
/// emission inputs
///
/// `n_labels` is the number of actions (transitions) or observations
/// (emissions). Only `default_weight` affects the tables.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, new)]
pub struct TableHeader {
    pub n_states: usize,
    pub n_labels: usize,
    pub default_weight: Weight,
}

///
/// Shape of the transition model
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionShape {
    /// `P(target | source)`
    Unconditional,
    /// `P(target | source, action)`
    Conditional,
}

impl TransitionShape {
    /// Shape selected by the field count of a data line
    pub fn from_n_fields(n_fields: usize) -> Self {
        if n_fields == 4 {
            TransitionShape::Conditional
        } else {
            TransitionShape::Unconditional
        }
    }
    /// Field count of a data line of this shape
    pub fn n_fields(&self) -> usize {
        match self {
            TransitionShape::Unconditional => 3,
            TransitionShape::Conditional => 4,
        }
    }
}

impl std::fmt::Display for TransitionShape {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TransitionShape::Unconditional => write!(f, "unconditional"),
            TransitionShape::Conditional => write!(f, "action-conditioned"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionRecords {
    Unconditional(Vec<TransitionRecord>),
    Conditional(Vec<ActionTransitionRecord>),
}

impl TransitionRecords {
    pub fn shape(&self) -> TransitionShape {
        match self {
            TransitionRecords::Unconditional(_) => TransitionShape::Unconditional,
            TransitionRecords::Conditional(_) => TransitionShape::Conditional,
        }
    }
    pub fn len(&self) -> usize {
        match self {
            TransitionRecords::Unconditional(records) => records.len(),
            TransitionRecords::Conditional(records) => records.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parsed initial-weights input
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct InitialInput {
    pub header: InitialHeader,
    pub records: Vec<InitialRecord>,
}

/// Parsed transition-weights input
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct TransitionInput {
    pub header: TableHeader,
    pub records: TransitionRecords,
}

impl TransitionInput {
    pub fn shape(&self) -> TransitionShape {
        self.records.shape()
    }
}

/// Parsed emission-weights input
#[derive(Clone, Debug, PartialEq, Eq, new)]
pub struct EmissionInput {
    pub header: TableHeader,
    pub records: Vec<EmissionRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_from_field_count() {
        assert_eq!(
            TransitionShape::from_n_fields(4),
            TransitionShape::Conditional
        );
        assert_eq!(
            TransitionShape::from_n_fields(3),
            TransitionShape::Unconditional
        );
        assert_eq!(
            TransitionShape::from_n_fields(0),
            TransitionShape::Unconditional
        );
        assert_eq!(TransitionShape::Conditional.n_fields(), 4);
    }
    #[test]
    fn records_shape_follows_variant() {
        let r = TransitionRecords::Conditional(vec![ActionTransitionRecord::new(
            "A".to_string(),
            "Forward".to_string(),
            "B".to_string(),
            1,
        )]);
        assert_eq!(r.shape(), TransitionShape::Conditional);
        assert_eq!(r.len(), 1);
        assert!(TransitionRecords::Unconditional(vec![]).is_empty());
    }
}
