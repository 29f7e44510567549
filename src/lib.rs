//!
//! Hidden Markov model built from weighted counts, decoded with Viterbi
//!
//! * `model`: probability tables (plain or action-conditioned transitions)
//! * `viterbi`: most probable hidden state path
//! * `io`: weight/observation/state text files
//!
pub mod cli;
pub mod common;
pub mod error;
pub mod io;
pub mod mocks;
pub mod model;
pub mod prob;
pub mod viterbi;

#[macro_use]
extern crate approx;

pub use common::ObservationSequence;
pub use error::{HmmError, Result};
pub use model::{Model, ModelBuilder, ModelConfig};
pub use viterbi::{Decoded, Recovery, ViterbiDecoder};
