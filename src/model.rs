//!
//! Probability tables of the hidden Markov model
//!
//! * `StateUniverse`: ordered set of hidden states
//! * `InitialDistribution`: `P(state at t=0)`
//! * `TransitionModel`: `P(target | source)` or `P(target | source, action)`
//! * `EmissionModel`: `P(observation | state)`
//!
//! Every lookup treats an absent key as probability zero.
//! All tables are built once by [`builder::ModelBuilder`] and never mutated.
//!
pub mod builder;
pub mod config;
pub mod records;

pub use builder::ModelBuilder;
pub use config::ModelConfig;

use crate::common::{Action, State};
use crate::error::Result;
use crate::io::{create_writer, open_reader};
use crate::prob::Prob;
use approx::AbsDiffEq;
use derive_new::new;
use fnv::FnvHashMap as HashMap;
use serde::{Deserialize, Serialize};

///
/// Hidden states in the order they were declared in the initial weights.
///
/// The order is the scan order of the decoder, so it decides ties.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<State>", into = "Vec<State>")]
pub struct StateUniverse {
    labels: Vec<State>,
    index: HashMap<State, usize>,
}

impl StateUniverse {
    pub fn new() -> Self {
        Self::default()
    }
    ///
    /// Add a state if it is not registered yet.
    /// Returns true if the state was added.
    ///
    pub fn insert(&mut self, state: &str) -> bool {
        if self.index.contains_key(state) {
            false
        } else {
            self.index.insert(state.to_string(), self.labels.len());
            self.labels.push(state.to_string());
            true
        }
    }
    pub fn len(&self) -> usize {
        self.labels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
    pub fn contains(&self, state: &str) -> bool {
        self.index.contains_key(state)
    }
    pub fn index_of(&self, state: &str) -> Option<usize> {
        self.index.get(state).copied()
    }
    /// label of the i-th state
    pub fn label(&self, i: usize) -> &str {
        &self.labels[i]
    }
    pub fn labels(&self) -> &[State] {
        &self.labels
    }
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.iter().map(|s| s.as_str())
    }
}

impl From<Vec<State>> for StateUniverse {
    fn from(labels: Vec<State>) -> Self {
        let mut universe = StateUniverse::new();
        for label in labels.iter() {
            universe.insert(label);
        }
        universe
    }
}

impl From<StateUniverse> for Vec<State> {
    fn from(universe: StateUniverse) -> Self {
        universe.labels
    }
}

///
/// One probability row `key -> P(key)`.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution {
    probs: HashMap<String, Prob>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_probs<K: Into<String>, I: IntoIterator<Item = (K, Prob)>>(iter: I) -> Self {
        Distribution {
            probs: iter.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }
    ///
    /// probability of `key`, zero if `key` has no entry
    ///
    pub fn get(&self, key: &str) -> Prob {
        self.probs.get(key).copied().unwrap_or_default()
    }
    pub fn contains(&self, key: &str) -> bool {
        self.probs.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.probs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, Prob)> + '_ {
        self.probs.iter().map(|(k, &p)| (k.as_str(), p))
    }
    /// sum of all probabilities in the row
    pub fn total(&self) -> Prob {
        self.probs.values().sum()
    }
    ///
    /// Does the row sum to one within `epsilon`?
    ///
    pub fn is_normalized(&self, epsilon: f64) -> bool {
        self.total().abs_diff_eq(&Prob::one(), epsilon)
    }
    ///
    /// Is every entry zero? (a zero-mass row, or an empty row)
    ///
    pub fn is_all_zero(&self) -> bool {
        self.probs.values().all(|p| p.is_zero())
    }
}

///
/// `P(state at t=0)`
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, new)]
#[serde(transparent)]
pub struct InitialDistribution {
    dist: Distribution,
}

impl InitialDistribution {
    pub fn prob(&self, state: &str) -> Prob {
        self.dist.get(state)
    }
    pub fn distribution(&self) -> &Distribution {
        &self.dist
    }
}

///
/// Transition model, either plain or action-conditioned.
///
/// The variant is fixed when the model is built and selects the decoding
/// recurrence.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TransitionModel {
    /// `source -> target -> P(target | source)`
    Unconditional(HashMap<State, Distribution>),
    /// `source -> action -> target -> P(target | source, action)`
    Conditional(HashMap<State, HashMap<Action, Distribution>>),
}

impl TransitionModel {
    pub fn is_conditional(&self) -> bool {
        match self {
            TransitionModel::Conditional(_) => true,
            TransitionModel::Unconditional(_) => false,
        }
    }
    ///
    /// Row of `source` (and `action` in the conditional model).
    ///
    /// The action is ignored by the unconditional model, and a conditional
    /// model has no row without an action.
    ///
    pub fn row(&self, source: &str, action: Option<&str>) -> Option<&Distribution> {
        match self {
            TransitionModel::Unconditional(rows) => rows.get(source),
            TransitionModel::Conditional(rows) => {
                let action = action?;
                rows.get(source).and_then(|by_action| by_action.get(action))
            }
        }
    }
    ///
    /// `P(target | source[, action])`, zero for any missing key
    ///
    pub fn prob(&self, source: &str, action: Option<&str>, target: &str) -> Prob {
        self.row(source, action)
            .map(|row| row.get(target))
            .unwrap_or_default()
    }
    /// the number of rows (`(source, action)` pairs in the conditional model)
    pub fn n_rows(&self) -> usize {
        match self {
            TransitionModel::Unconditional(rows) => rows.len(),
            TransitionModel::Conditional(rows) => rows.values().map(|r| r.len()).sum(),
        }
    }
    ///
    /// All action labels of a conditional model, sorted.
    /// Empty for the unconditional model.
    ///
    pub fn actions(&self) -> Vec<&str> {
        match self {
            TransitionModel::Unconditional(_) => Vec::new(),
            TransitionModel::Conditional(rows) => {
                let mut actions: Vec<&str> = rows
                    .values()
                    .flat_map(|by_action| by_action.keys().map(|a| a.as_str()))
                    .collect();
                actions.sort_unstable();
                actions.dedup();
                actions
            }
        }
    }
    ///
    /// iterate over `(source, action, row)`
    ///
    pub fn rows(&self) -> Box<dyn Iterator<Item = (&str, Option<&str>, &Distribution)> + '_> {
        match self {
            TransitionModel::Unconditional(rows) => {
                Box::new(rows.iter().map(|(s, row)| (s.as_str(), None, row)))
            }
            TransitionModel::Conditional(rows) => Box::new(rows.iter().flat_map(|(s, by_action)| {
                by_action
                    .iter()
                    .map(move |(a, row)| (s.as_str(), Some(a.as_str()), row))
            })),
        }
    }
}

///
/// `state -> observation -> P(observation | state)`
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, new)]
#[serde(transparent)]
pub struct EmissionModel {
    rows: HashMap<State, Distribution>,
}

impl EmissionModel {
    pub fn row(&self, state: &str) -> Option<&Distribution> {
        self.rows.get(state)
    }
    pub fn prob(&self, state: &str, observation: &str) -> Prob {
        self.row(state)
            .map(|row| row.get(observation))
            .unwrap_or_default()
    }
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
    pub fn rows(&self) -> impl Iterator<Item = (&str, &Distribution)> + '_ {
        self.rows.iter().map(|(s, row)| (s.as_str(), row))
    }
}

///
/// A row whose total weight was zero after default-fill.
/// Every probability of such a row is zero.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZeroMassRow {
    Initial,
    Transition {
        source: State,
        action: Option<Action>,
    },
    Emission {
        state: State,
    },
}

impl std::fmt::Display for ZeroMassRow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ZeroMassRow::Initial => write!(f, "initial distribution"),
            ZeroMassRow::Transition {
                source,
                action: None,
            } => write!(f, "transition row {}", source),
            ZeroMassRow::Transition {
                source,
                action: Some(action),
            } => write!(f, "transition row ({}, {})", source, action),
            ZeroMassRow::Emission { state } => write!(f, "emission row {}", state),
        }
    }
}

///
/// The complete model: state universe and the three tables.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, new)]
pub struct Model {
    states: StateUniverse,
    initial: InitialDistribution,
    transition: TransitionModel,
    emission: EmissionModel,
    /// rows left at zero probability by the builder
    zero_mass_rows: Vec<ZeroMassRow>,
}

impl Model {
    pub fn states(&self) -> &StateUniverse {
        &self.states
    }
    pub fn initial(&self) -> &InitialDistribution {
        &self.initial
    }
    pub fn transition(&self) -> &TransitionModel {
        &self.transition
    }
    pub fn emission(&self) -> &EmissionModel {
        &self.emission
    }
    pub fn zero_mass_rows(&self) -> &[ZeroMassRow] {
        &self.zero_mass_rows
    }
    pub fn is_conditional(&self) -> bool {
        self.transition.is_conditional()
    }
    pub fn n_states(&self) -> usize {
        self.states.len()
    }
    /// `P(state at t=0)`
    pub fn p_init(&self, state: &str) -> Prob {
        self.initial.prob(state)
    }
    /// `P(target | source[, action])`
    pub fn p_trans(&self, source: &str, action: Option<&str>, target: &str) -> Prob {
        self.transition.prob(source, action, target)
    }
    /// `P(observation | state)`
    pub fn p_emit(&self, state: &str, observation: &str) -> Prob {
        self.emission.prob(state, observation)
    }
    //
    // serialization
    //
    pub fn to_json_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
    ///
    /// Write the model as JSON, gzipped if the extension is `.gz`
    ///
    pub fn to_json_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = create_writer(path)?;
        self.to_json_writer(&mut writer)
            .and_then(|_| writer.finish())
            .map_err(|e| e.in_file(path))
    }
    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = open_reader(path)?;
        Self::from_json_reader(reader).map_err(|e| e.in_file(path))
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "n_states={} transition={} n_transition_rows={} n_emission_rows={} n_zero_mass_rows={}",
            self.n_states(),
            if self.is_conditional() {
                "action-conditioned"
            } else {
                "unconditional"
            },
            self.transition.n_rows(),
            self.emission.n_rows(),
            self.zero_mass_rows.len(),
        )
    }
}
