//!
//! Construction of the probability tables from weighted-count records
//!
//! For each table:
//!
//! 1. accumulate explicit weights into their cell and the row total
//! 2. default-fill: every cell of the row's domain without an explicit record
//!    receives the default weight
//! 3. normalize each cell by the row total
//!
//! Rows whose total is zero are kept with all probabilities zero and are
//! reported as [`ZeroMassRow`].
//!
use super::config::ModelConfig;
use super::records::{EmissionInput, InitialInput, TransitionInput, TransitionRecords};
use super::{
    Distribution, EmissionModel, InitialDistribution, Model, StateUniverse, TransitionModel,
    ZeroMassRow,
};
use crate::common::{strip_quotes, Weight};
use crate::prob::Prob;
use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};
use itertools::Itertools;
use log::{debug, info, warn};

///
/// Row of accumulated integer weights
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightRow {
    weights: HashMap<String, Weight>,
    total: Weight,
    overflowed: bool,
}

impl WeightRow {
    pub fn new() -> Self {
        Self::default()
    }
    ///
    /// Add `weight` to the cell of `key` and to the row total.
    ///
    /// A sum past `Weight::MAX` is clamped and marks the row as overflowed.
    ///
    pub fn add(&mut self, key: &str, weight: Weight) {
        let cell = self.weights.entry(key.to_string()).or_insert(0);
        *cell = checked_or_clamp(*cell, weight, &mut self.overflowed);
        self.total = checked_or_clamp(self.total, weight, &mut self.overflowed);
    }
    ///
    /// Give `default_weight` to every key of `domain` that has no cell yet.
    /// Returns the number of inserted cells.
    ///
    /// Calling it twice with the same domain changes nothing the second time.
    ///
    pub fn fill_defaults<'a, I>(&mut self, domain: I, default_weight: Weight) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut n_inserted = 0;
        for key in domain {
            if !self.weights.contains_key(key) {
                self.weights.insert(key.to_string(), default_weight);
                self.total = checked_or_clamp(self.total, default_weight, &mut self.overflowed);
                n_inserted += 1;
            }
        }
        n_inserted
    }
    pub fn get(&self, key: &str) -> Option<Weight> {
        self.weights.get(key).copied()
    }
    pub fn total(&self) -> Weight {
        self.total
    }
    pub fn len(&self) -> usize {
        self.weights.len()
    }
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
    pub fn is_zero_mass(&self) -> bool {
        self.total == 0
    }
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }
    ///
    /// `weight / total` of each cell.
    ///
    /// If the total is zero every cell becomes probability zero.
    ///
    pub fn to_distribution(&self) -> Distribution {
        let total = self.total;
        Distribution::from_probs(self.weights.iter().map(|(key, &weight)| {
            let prob = if total == 0 {
                Prob::zero()
            } else {
                Prob::from_ratio(weight, total)
            };
            (key.as_str(), prob)
        }))
    }
}

fn checked_or_clamp(a: Weight, b: Weight, overflowed: &mut bool) -> Weight {
    match a.checked_add(b) {
        Some(sum) => sum,
        None => {
            *overflowed = true;
            Weight::MAX
        }
    }
}

///
/// Normalize `row` into a distribution, recording it in `zero_mass_rows` if
/// its total is zero.
///
fn finish_row(
    row: &WeightRow,
    id: ZeroMassRow,
    zero_mass_rows: &mut Vec<ZeroMassRow>,
) -> Distribution {
    if row.is_overflowed() {
        warn!(
            "weights of {} overflow {}; sums were clamped to it",
            id,
            Weight::MAX
        );
    }
    if row.is_zero_mass() {
        zero_mass_rows.push(id);
    }
    row.to_distribution()
}

///
/// Builds a [`Model`] from the three parsed inputs.
///
/// The `ModelConfig` gives the action and observation domains of the
/// default-fill pass. The destination domain of transitions is always the
/// state universe.
///
#[derive(Clone, Debug, Default)]
pub struct ModelBuilder {
    config: ModelConfig,
}

impl ModelBuilder {
    pub fn new(config: ModelConfig) -> Self {
        ModelBuilder { config }
    }
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
    ///
    /// Build all tables.
    ///
    /// The state universe comes from the initial weights and is then used as
    /// the source/target domain of the transitions and the state domain of
    /// the emissions.
    ///
    pub fn build(
        &self,
        initial: &InitialInput,
        transitions: &TransitionInput,
        emissions: &EmissionInput,
    ) -> Model {
        let mut zero_mass_rows = Vec::new();
        let (states, initial) = build_initial(initial, &mut zero_mass_rows);
        let transition = self.build_transitions(&states, transitions, &mut zero_mass_rows);
        let emission = self.build_emissions(&states, emissions, &mut zero_mass_rows);

        for row in zero_mass_rows.iter() {
            warn!("zero total weight in {}; all its probabilities are 0", row);
        }

        let model = Model::new(states, initial, transition, emission, zero_mass_rows);
        info!("model built: {}", model);
        model
    }
    ///
    /// Transition table of either shape.
    ///
    pub fn build_transitions(
        &self,
        states: &StateUniverse,
        input: &TransitionInput,
        zero_mass_rows: &mut Vec<ZeroMassRow>,
    ) -> TransitionModel {
        let header = &input.header;
        debug!(
            "transitions: shape={} declared n_states={} n_actions={} default_weight={}",
            input.shape(),
            header.n_states,
            header.n_labels,
            header.default_weight
        );
        if header.n_states != states.len() {
            debug!(
                "transition header declares {} states but the universe has {}",
                header.n_states,
                states.len()
            );
        }
        let mut unknown = UnknownStates::new(states);

        match &input.records {
            TransitionRecords::Unconditional(records) => {
                let mut rows: HashMap<String, WeightRow> = HashMap::default();
                for r in records.iter() {
                    let source = strip_quotes(&r.source);
                    let target = strip_quotes(&r.target);
                    unknown.check(source);
                    unknown.check(target);
                    rows.entry(source.to_string())
                        .or_default()
                        .add(target, r.weight);
                }
                for source in states.iter() {
                    rows.entry(source.to_string())
                        .or_default()
                        .fill_defaults(states.iter(), header.default_weight);
                }
                unknown.report("transition");

                let mut table = HashMap::default();
                for (source, row) in rows {
                    let id = ZeroMassRow::Transition {
                        source: source.clone(),
                        action: None,
                    };
                    table.insert(source, finish_row(&row, id, zero_mass_rows));
                }
                TransitionModel::Unconditional(table)
            }
            TransitionRecords::Conditional(records) => {
                let mut rows: HashMap<String, HashMap<String, WeightRow>> = HashMap::default();
                for r in records.iter() {
                    let source = strip_quotes(&r.source);
                    let action = strip_quotes(&r.action);
                    let target = strip_quotes(&r.target);
                    unknown.check(source);
                    unknown.check(target);
                    rows.entry(source.to_string())
                        .or_default()
                        .entry(action.to_string())
                        .or_default()
                        .add(target, r.weight);
                }
                for source in states.iter() {
                    let by_action = rows.entry(source.to_string()).or_default();
                    for action in self.config.actions.iter().map(|a| strip_quotes(a)) {
                        by_action
                            .entry(action.to_string())
                            .or_default()
                            .fill_defaults(states.iter(), header.default_weight);
                    }
                }
                unknown.report("transition");

                let mut table = HashMap::default();
                for (source, by_action) in rows {
                    let mut dists = HashMap::default();
                    for (action, row) in by_action {
                        let id = ZeroMassRow::Transition {
                            source: source.clone(),
                            action: Some(action.clone()),
                        };
                        dists.insert(action, finish_row(&row, id, zero_mass_rows));
                    }
                    table.insert(source, dists);
                }
                TransitionModel::Conditional(table)
            }
        }
    }
    ///
    /// Emission table, filled over the configured observations.
    ///
    pub fn build_emissions(
        &self,
        states: &StateUniverse,
        input: &EmissionInput,
        zero_mass_rows: &mut Vec<ZeroMassRow>,
    ) -> EmissionModel {
        let header = &input.header;
        debug!(
            "emissions: declared n_states={} n_observations={} default_weight={}",
            header.n_states, header.n_labels, header.default_weight
        );
        let mut unknown = UnknownStates::new(states);

        let mut rows: HashMap<String, WeightRow> = HashMap::default();
        for r in input.records.iter() {
            let state = strip_quotes(&r.state);
            let observation = strip_quotes(&r.observation);
            unknown.check(state);
            rows.entry(state.to_string())
                .or_default()
                .add(observation, r.weight);
        }
        let domain: Vec<&str> = self
            .config
            .observations
            .iter()
            .map(|o| strip_quotes(o))
            .collect();
        for state in states.iter() {
            rows.entry(state.to_string())
                .or_default()
                .fill_defaults(domain.iter().copied(), header.default_weight);
        }
        unknown.report("emission");

        let mut table = HashMap::default();
        for (state, row) in rows {
            let id = ZeroMassRow::Emission {
                state: state.clone(),
            };
            table.insert(state, finish_row(&row, id, zero_mass_rows));
        }
        EmissionModel::new(table)
    }
}

///
/// Initial distribution and the state universe it defines.
///
/// Repeated states accumulate their weights. The default weight of the
/// header is not applied.
///
pub fn build_initial(
    input: &InitialInput,
    zero_mass_rows: &mut Vec<ZeroMassRow>,
) -> (StateUniverse, InitialDistribution) {
    debug!(
        "initial: declared n_states={:?} default_weight={}",
        input.header.n_states, input.header.default_weight
    );
    let mut states = StateUniverse::new();
    let mut row = WeightRow::new();
    for r in input.records.iter() {
        let state = strip_quotes(&r.state);
        states.insert(state);
        row.add(state, r.weight);
    }
    if let Some(n) = input.header.n_states {
        if n != states.len() {
            warn!(
                "initial weights declare {} states but list {}",
                n,
                states.len()
            );
        }
    }
    let dist = finish_row(&row, ZeroMassRow::Initial, zero_mass_rows);
    (states, InitialDistribution::new(dist))
}

///
/// Collects labels used in records that are not in the state universe.
///
struct UnknownStates<'a> {
    states: &'a StateUniverse,
    unknown: HashSet<String>,
}

impl<'a> UnknownStates<'a> {
    fn new(states: &'a StateUniverse) -> Self {
        UnknownStates {
            states,
            unknown: HashSet::default(),
        }
    }
    fn check(&mut self, state: &str) {
        if !self.states.contains(state) && !self.unknown.contains(state) {
            self.unknown.insert(state.to_string());
        }
    }
    fn report(&self, table: &str) {
        if !self.unknown.is_empty() {
            warn!(
                "{} records reference {} state(s) missing from the initial weights: {}",
                table,
                self.unknown.len(),
                self.unknown.iter().sorted().join(",")
            );
        }
    }
}
