//!
//! Subcommands of the `hmmdecode` binary
//!
//! * `decode`: build the model, decode one observation file, write the states
//! * `build`: build the model and optionally dump it as JSON
//!
use crate::error::Result;
use crate::io::{load_model, sequence, states};
use crate::model::{Model, ModelConfig};
use crate::prob::Prob;
use crate::viterbi::Recovery;
use derive_new::new;
use log::{info, warn};
use std::path::{Path, PathBuf};

///
/// Paths of the three weight files
///
#[derive(Clone, Debug, new)]
pub struct WeightFiles {
    pub initial: PathBuf,
    pub transitions: PathBuf,
    pub emissions: PathBuf,
}

impl WeightFiles {
    pub fn load(&self, config: &ModelConfig) -> Result<Model> {
        load_model(&self.initial, &self.transitions, &self.emissions, config)
    }
}

///
/// `ModelConfig` from the json file if given, the default otherwise
///
pub fn load_config(path: Option<&Path>) -> Result<ModelConfig> {
    match path {
        Some(path) => {
            let config = ModelConfig::from_json_file(path)?;
            info!("config loaded from {}", path.display());
            Ok(config)
        }
        None => Ok(ModelConfig::default()),
    }
}

///
/// What `decode` reports after writing the state file
///
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeSummary {
    pub n_observations: usize,
    pub n_states_written: usize,
    pub prob: Prob,
    pub log_prob: f64,
    pub recovery: Recovery,
}

impl std::fmt::Display for DecodeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "n_observations={} n_states_written={} prob={} log_prob={:.4}",
            self.n_observations, self.n_states_written, self.prob, self.log_prob
        )?;
        match self.recovery {
            Recovery::None => Ok(()),
            Recovery::Fallback {
                collapsed_at,
                recovered_len,
            } => write!(
                f,
                " recovery=fallback collapsed_at={} recovered_len={}",
                collapsed_at, recovered_len
            ),
            Recovery::Empty { collapsed_at } => {
                write!(f, " recovery=empty collapsed_at={}", collapsed_at)
            }
        }
    }
}

///
/// Build the model, decode `observations` and write the states to `output`.
///
pub fn decode(
    files: &WeightFiles,
    observations: &Path,
    output: &Path,
    config: &ModelConfig,
) -> Result<DecodeSummary> {
    let model = files.load(config)?;
    let seq = sequence::read_sequence_file(observations)?;
    info!(
        "{} observations loaded from {}",
        seq.len(),
        observations.display()
    );
    if !model.is_conditional() && seq.has_actions() {
        info!("transition model is unconditional: actions in the observation file are ignored");
    }

    let decoded = model
        .decoder()
        .with_placeholder_action(&config.placeholder_action)
        .decode_sequence(&seq)?;
    if decoded.is_degraded() {
        warn!("decoded path is degraded: {:?}", decoded.recovery);
    }
    states::write_states_file(output, &decoded.path)?;
    info!("states written to {}", output.display());

    Ok(DecodeSummary {
        n_observations: seq.len(),
        n_states_written: decoded.len(),
        prob: decoded.prob,
        log_prob: decoded.log_prob,
        recovery: decoded.recovery,
    })
}

///
/// Build the model and dump it into `json` if given.
///
pub fn build(files: &WeightFiles, json: Option<&Path>, config: &ModelConfig) -> Result<Model> {
    let model = files.load(config)?;
    for row in model.zero_mass_rows() {
        println!("zero_mass_row\t{}", row);
    }
    if let Some(json) = json {
        model.to_json_file(json)?;
        info!("model written to {}", json.display());
    }
    Ok(model)
}
