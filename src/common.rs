//!
//! Labels and sequences shared by the model, the decoder and the parsers
//!
//! * `State`, `Action`, `Observation`: opaque string labels
//! * `ObservationSequence`: observations with optional per-step actions
//!

/// hidden state label
pub type State = String;

/// action label of the action-conditioned transition model
pub type Action = String;

/// emission label
pub type Observation = String;

/// integer weight of a weighted-count record
pub type Weight = u64;

/// Action used for observation lines which carry no action
/// when the model is action-conditioned.
pub const PLACEHOLDER_ACTION: &str = "N";

///
/// Strip surrounding quote characters of a label.
///
/// `"A"`, `A` and `""A""` all become `A`.
///
pub fn strip_quotes(label: &str) -> &str {
    label.trim_matches('"')
}

///
/// Observation sequence to be decoded.
///
/// `actions[t]` is the action recorded together with `observations[t]`.
/// During decoding `actions[t-1]` selects the transition into step `t`,
/// so the last action is never used.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservationSequence {
    pub observations: Vec<Observation>,
    pub actions: Vec<Option<Action>>,
}

impl ObservationSequence {
    pub fn new() -> Self {
        Self::default()
    }
    /// Constructor of a sequence without actions
    pub fn from_observations<T: Into<Observation>, I: IntoIterator<Item = T>>(iter: I) -> Self {
        let observations: Vec<Observation> = iter.into_iter().map(|o| o.into()).collect();
        let actions = vec![None; observations.len()];
        ObservationSequence {
            observations,
            actions,
        }
    }
    pub fn push(&mut self, observation: Observation, action: Option<Action>) {
        self.observations.push(observation);
        self.actions.push(action);
    }
    /// the number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
    /// has at least one step an explicit action?
    pub fn has_actions(&self) -> bool {
        self.actions.iter().any(|a| a.is_some())
    }
    ///
    /// actions with missing entries replaced by `placeholder`
    ///
    pub fn actions_or(&self, placeholder: &str) -> Vec<Action> {
        self.actions
            .iter()
            .map(|a| match a {
                Some(action) => action.clone(),
                None => placeholder.to_string(),
            })
            .collect()
    }
}
