//!
//! mock models for tests and benchmarks
//!
//! * `coin`: two states `A`/`B` with sticky transitions, observations `x`/`y`
//! * `robot`: action-conditioned two-state model, actions `Stay`/`Switch`
//! * `random`: dense random model generated from a seed
//!
use crate::common::{ObservationSequence, Weight};
use crate::model::records::{
    ActionTransitionRecord, EmissionInput, EmissionRecord, InitialHeader, InitialInput,
    InitialRecord, TableHeader, TransitionInput, TransitionRecord, TransitionRecords,
};
use crate::model::{Model, ModelBuilder, ModelConfig};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn initial_input(records: &[(&str, Weight)]) -> InitialInput {
    InitialInput::new(
        InitialHeader::new(Some(records.len()), 0),
        records
            .iter()
            .map(|&(s, w)| InitialRecord::new(s.to_string(), w))
            .collect(),
    )
}

fn emission_input(n_states: usize, records: &[(&str, &str, Weight)]) -> EmissionInput {
    let n_observations = records.len() / n_states.max(1);
    EmissionInput::new(
        TableHeader::new(n_states, n_observations, 0),
        records
            .iter()
            .map(|&(s, o, w)| EmissionRecord::new(s.to_string(), o.to_string(), w))
            .collect(),
    )
}

/// fill domain of the coin model
pub fn coin_config() -> ModelConfig {
    ModelConfig {
        observations: vec!["x".to_string(), "y".to_string()],
        ..ModelConfig::default()
    }
}

///
/// Weighted records of the coin model
///
/// * initial `A: .5, B: .5`
/// * transitions `A->A .9, A->B .1, B->A .1, B->B .9`
/// * emissions `A: x .9 y .1`, `B: x .1 y .9`
///
pub fn coin_inputs() -> (InitialInput, TransitionInput, EmissionInput) {
    let initial = initial_input(&[("A", 5), ("B", 5)]);
    let transitions = TransitionInput::new(
        TableHeader::new(2, 0, 0),
        TransitionRecords::Unconditional(
            [("A", "A", 9), ("A", "B", 1), ("B", "A", 1), ("B", "B", 9)]
                .iter()
                .map(|&(s, t, w)| TransitionRecord::new(s.to_string(), t.to_string(), w))
                .collect(),
        ),
    );
    let emissions = emission_input(
        2,
        &[("A", "x", 9), ("A", "y", 1), ("B", "x", 1), ("B", "y", 9)],
    );
    (initial, transitions, emissions)
}

pub fn mock_coin_model() -> Model {
    let (i, t, e) = coin_inputs();
    ModelBuilder::new(coin_config()).build(&i, &t, &e)
}

/// fill domain of the robot model
pub fn robot_config() -> ModelConfig {
    ModelConfig::new(&["Stay", "Switch"], &["o"])
}

///
/// Weighted records of the robot model
///
/// * always starts in `A`
/// * `Stay` keeps the state with `.9`, `Switch` flips it with `.9`
/// * both states emit `o`
///
pub fn robot_inputs() -> (InitialInput, TransitionInput, EmissionInput) {
    let initial = initial_input(&[("A", 1), ("B", 0)]);
    let records = [
        ("A", "Stay", "A", 9),
        ("A", "Stay", "B", 1),
        ("B", "Stay", "B", 9),
        ("B", "Stay", "A", 1),
        ("A", "Switch", "B", 9),
        ("A", "Switch", "A", 1),
        ("B", "Switch", "A", 9),
        ("B", "Switch", "B", 1),
    ];
    let transitions = TransitionInput::new(
        TableHeader::new(2, 2, 0),
        TransitionRecords::Conditional(
            records
                .iter()
                .map(|&(s, a, t, w)| {
                    ActionTransitionRecord::new(s.to_string(), a.to_string(), t.to_string(), w)
                })
                .collect(),
        ),
    );
    let emissions = emission_input(2, &[("A", "o", 1), ("B", "o", 1)]);
    (initial, transitions, emissions)
}

pub fn mock_robot_model() -> Model {
    let (i, t, e) = robot_inputs();
    ModelBuilder::new(robot_config()).build(&i, &t, &e)
}

///
/// Dense random unconditional model
///
/// States are `s0, s1, ...` and observations `o0, o1, ...`. Every cell has
/// an explicit weight in `1..=100`.
///
pub fn mock_random_model(n_states: usize, n_observations: usize, seed: u64) -> Model {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let states: Vec<String> = (0..n_states).map(|i| format!("s{}", i)).collect();
    let observations: Vec<String> = (0..n_observations).map(|i| format!("o{}", i)).collect();

    let initial = InitialInput::new(
        InitialHeader::new(Some(n_states), 0),
        states
            .iter()
            .map(|s| InitialRecord::new(s.clone(), rng.gen_range(1..=100)))
            .collect(),
    );
    let mut transitions = Vec::new();
    for s in states.iter() {
        for t in states.iter() {
            transitions.push(TransitionRecord::new(
                s.clone(),
                t.clone(),
                rng.gen_range(1..=100),
            ));
        }
    }
    let transitions = TransitionInput::new(
        TableHeader::new(n_states, 0, 0),
        TransitionRecords::Unconditional(transitions),
    );
    let mut emissions = Vec::new();
    for s in states.iter() {
        for o in observations.iter() {
            emissions.push(EmissionRecord::new(
                s.clone(),
                o.clone(),
                rng.gen_range(1..=100),
            ));
        }
    }
    let emissions = EmissionInput::new(
        TableHeader::new(n_states, n_observations, 0),
        emissions,
    );
    let config = ModelConfig::new::<&str, String>(&[], &observations);
    ModelBuilder::new(config).build(&initial, &transitions, &emissions)
}

///
/// Uniformly random observations over the emission labels of `model`
///
pub fn random_sequence(model: &Model, length: usize, seed: u64) -> ObservationSequence {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut labels: Vec<&str> = model
        .emission()
        .rows()
        .flat_map(|(_, row)| row.iter().map(|(o, _)| o))
        .collect();
    labels.sort_unstable();
    labels.dedup();
    ObservationSequence::from_observations(
        (0..length).filter_map(|_| labels.choose(&mut rng).map(|o| o.to_string())),
    )
}
