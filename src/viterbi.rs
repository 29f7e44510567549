//!
//! Viterbi decoding of the most probable hidden state path
//!
//! ```text
//! V[0][s]  = init(s) * emit(s, x[0])
//! V[t][s2] = max_{s1} V[t-1][s1] * trans(s1, [a[t-1],] s2) * emit(s2, x[t])
//! ```
//!
//! * probabilities are multiplied in linear space, left to right
//! * the scan is in state-universe order and a candidate has to be strictly
//!   larger than the current best (which starts at 0), so ties keep the
//!   earliest source state
//! * a state has a path at step `t` only if its `V[t]` is positive
//! * in the action-conditioned model `a[t-1]` selects the transition into
//!   step `t`
//!
//! When every path has vanished (collapse) the result falls back to the
//! last non-empty set of paths and is flagged with [`Recovery`].
//!
//! A step whose largest `V[t]` drops below `2^-500` is multiplied by `2^500`.
//! The factor is the same for every state and is a power of two, so every
//! comparison (and every tie) is decided as without it. The total factor is
//! removed again in `Decoded::log_prob`.
//!
use crate::common::{Action, ObservationSequence, State, PLACEHOLDER_ACTION};
use crate::error::{HmmError, Result};
use crate::model::Model;
use crate::prob::Prob;
use fnv::FnvHashMap as HashMap;
use log::{debug, trace, warn};
use rayon::prelude::*;

/// exponent of the power-of-two rescaling of the trellis
const RESCALE_EXP: i32 = 500;

///
/// How the returned path was obtained
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// regular Viterbi path
    None,
    ///
    /// every path vanished at step `collapsed_at`.
    /// The first path alive at step `collapsed_at - 1` (of length
    /// `recovered_len`) was padded to the input length by repeating its
    /// last state.
    ///
    Fallback {
        collapsed_at: usize,
        recovered_len: usize,
    },
    ///
    /// every path vanished at step `collapsed_at` and no earlier step had
    /// a path to fall back to. The path is empty.
    ///
    Empty { collapsed_at: usize },
}

///
/// Result of decoding one observation sequence
///
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    /// one state per observation (empty for `Recovery::Empty`)
    pub path: Vec<State>,
    /// `V[T-1]` of the last state of the path, zero if degraded.
    /// Underflows to zero for long sequences, see `log_prob`.
    pub prob: Prob,
    /// `ln V[T-1]`, `-inf` if degraded
    pub log_prob: f64,
    pub recovery: Recovery,
}

impl Decoded {
    fn empty_input() -> Self {
        Decoded {
            path: Vec::new(),
            prob: Prob::one(),
            log_prob: 0.0,
            recovery: Recovery::None,
        }
    }
    fn degraded(path: Vec<State>, recovery: Recovery) -> Self {
        Decoded {
            path,
            prob: Prob::zero(),
            log_prob: f64::NEG_INFINITY,
            recovery,
        }
    }
    /// was the path recovered from a collapse?
    pub fn is_degraded(&self) -> bool {
        self.recovery != Recovery::None
    }
    pub fn len(&self) -> usize {
        self.path.len()
    }
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

///
/// Decoder borrowing an immutable model
///
/// The model is shared, so any number of decoders (and threads) can
/// decode against it at the same time.
///
#[derive(Clone, Debug)]
pub struct ViterbiDecoder<'a> {
    model: &'a Model,
    /// action used for steps without an action in `decode_sequence`
    placeholder_action: Action,
}

impl Model {
    pub fn decoder(&self) -> ViterbiDecoder {
        ViterbiDecoder::new(self)
    }
}

impl<'a> ViterbiDecoder<'a> {
    pub fn new(model: &'a Model) -> Self {
        ViterbiDecoder {
            model,
            placeholder_action: PLACEHOLDER_ACTION.to_string(),
        }
    }
    pub fn with_placeholder_action(mut self, action: &str) -> Self {
        self.placeholder_action = action.to_string();
        self
    }
    pub fn model(&self) -> &Model {
        self.model
    }
    ///
    /// Decode observations with the unconditional transition model.
    ///
    /// An action-conditioned model needs actions, see `decode_with_actions`.
    ///
    pub fn decode<O: AsRef<str>>(&self, observations: &[O]) -> Result<Decoded> {
        if self.model.is_conditional() {
            return Err(HmmError::MissingActions);
        }
        let observations: Vec<&str> = observations.iter().map(|o| o.as_ref()).collect();
        Ok(self.run(&observations, None))
    }
    ///
    /// Decode observations with actions.
    ///
    /// `actions[t-1]` is the action of the transition into step `t`, so at
    /// least `observations.len() - 1` actions are required. Actions are
    /// ignored by an unconditional model.
    ///
    pub fn decode_with_actions<O, A>(&self, observations: &[O], actions: &[A]) -> Result<Decoded>
    where
        O: AsRef<str>,
        A: AsRef<str>,
    {
        let observations: Vec<&str> = observations.iter().map(|o| o.as_ref()).collect();
        if !self.model.is_conditional() {
            debug!(
                "unconditional model: ignoring {} actions",
                actions.len()
            );
            return Ok(self.run(&observations, None));
        }
        let required = observations.len().saturating_sub(1);
        if actions.len() < required {
            return Err(HmmError::ActionsTooShort {
                n_observations: observations.len(),
                required,
                given: actions.len(),
            });
        }
        let actions: Vec<&str> = actions.iter().map(|a| a.as_ref()).collect();
        Ok(self.run(&observations, Some(actions.as_slice())))
    }
    ///
    /// Decode a parsed sequence.
    ///
    /// For an action-conditioned model, steps without an action use the
    /// placeholder action.
    ///
    pub fn decode_sequence(&self, seq: &ObservationSequence) -> Result<Decoded> {
        if self.model.is_conditional() {
            let actions = seq.actions_or(&self.placeholder_action);
            self.decode_with_actions(&seq.observations, &actions)
        } else {
            self.decode(&seq.observations)
        }
    }
    ///
    /// Decode independent sequences in parallel.
    ///
    /// The i-th result belongs to the i-th sequence.
    ///
    pub fn decode_batch(&self, seqs: &[ObservationSequence]) -> Vec<Result<Decoded>> {
        seqs.par_iter().map(|seq| self.decode_sequence(seq)).collect()
    }

    //
    // internals
    //

    ///
    /// Dense `n x n` transition matrix `m[i * n + j] = trans(i, action, j)`
    ///
    fn transition_matrix(&self, action: Option<&str>) -> Vec<Prob> {
        let states = self.model.states();
        let mut m = Vec::with_capacity(states.len() * states.len());
        for source in states.iter() {
            for target in states.iter() {
                m.push(self.model.p_trans(source, action, target));
            }
        }
        m
    }
    fn emission_vector(&self, observation: &str) -> Vec<Prob> {
        self.model
            .states()
            .iter()
            .map(|state| self.model.p_emit(state, observation))
            .collect()
    }
    ///
    /// The recurrence itself. `actions` is `Some` iff the model is
    /// conditional, and then has at least `T-1` entries.
    ///
    fn run(&self, observations: &[&str], actions: Option<&[&str]>) -> Decoded {
        let n_steps = observations.len();
        let states = self.model.states();
        let n = states.len();
        debug!("decoding {} observations over {} states", n_steps, n);
        if n_steps == 0 {
            return Decoded::empty_input();
        }
        if n == 0 {
            warn!("decode collapse: the state universe is empty");
            return Decoded::degraded(Vec::new(), Recovery::Empty { collapsed_at: 0 });
        }

        // t = 0
        let emit = self.emission_vector(observations[0]);
        let mut v: Vec<Prob> = states
            .iter()
            .zip(emit.iter())
            .map(|(s, &e)| self.model.p_init(s) * e)
            .collect();
        // back[t][j] = best source of j at step t, None if j has no path
        let mut back: Vec<Vec<Option<usize>>> = vec![vec![None; n]];
        // last step t >= 1 with at least one path
        let mut last_alive: Option<usize> = None;
        let mut collapsed_at: Option<usize> = None;
        // V[t] here = true V[t] * 2^scale_exp
        let mut scale_exp: i64 = 0;

        let unconditional = match actions {
            None => self.transition_matrix(None),
            Some(_) => Vec::new(),
        };
        let mut by_action: HashMap<&str, Vec<Prob>> = HashMap::default();

        for t in 1..n_steps {
            let trans: &[Prob] = match actions {
                None => unconditional.as_slice(),
                Some(actions) => {
                    let action = actions[t - 1];
                    by_action
                        .entry(action)
                        .or_insert_with(|| self.transition_matrix(Some(action)))
                        .as_slice()
                }
            };
            let emit = self.emission_vector(observations[t]);
            let mut v_next = vec![Prob::zero(); n];
            let mut back_next = vec![None; n];

            for j in 0..n {
                let mut best = Prob::zero();
                for i in 0..n {
                    let candidate = v[i] * trans[i * n + j] * emit[j];
                    trace!(
                        "t={} {}->{} prev={} trans={} emit={} candidate={}",
                        t,
                        states.label(i),
                        states.label(j),
                        v[i],
                        trans[i * n + j],
                        emit[j],
                        candidate
                    );
                    if candidate > best {
                        best = candidate;
                        back_next[j] = Some(i);
                    }
                }
                v_next[j] = best;
            }

            let max = v_next
                .iter()
                .fold(Prob::zero(), |a, &b| if b > a { b } else { a });
            if max.is_positive() && max.mul_pow2(RESCALE_EXP) < Prob::one() {
                trace!("t={} rescale by 2^{}", t, RESCALE_EXP);
                for x in v_next.iter_mut() {
                    *x = x.mul_pow2(RESCALE_EXP);
                }
                scale_exp += i64::from(RESCALE_EXP);
            }

            if back_next.iter().any(|b| b.is_some()) {
                last_alive = Some(t);
            } else if collapsed_at.is_none() {
                collapsed_at = Some(t);
            }
            v = v_next;
            back.push(back_next);
        }

        // termination: first state wins ties
        let mut best_state = 0;
        for j in 1..n {
            if v[j] > v[best_state] {
                best_state = j;
            }
        }
        let t_last = n_steps - 1;
        let has_path = t_last == 0 || back[t_last][best_state].is_some();

        if has_path {
            let path = traceback(&back, t_last, best_state);
            let log_prob =
                v[best_state].to_log_value() - scale_exp as f64 * std::f64::consts::LN_2;
            let prob = if scale_exp == 0 {
                v[best_state]
            } else {
                Prob::from_prob(log_prob.exp())
            };
            return Decoded {
                path: self.to_labels(&path),
                prob,
                log_prob,
                recovery: Recovery::None,
            };
        }

        // collapse
        let collapsed_at = collapsed_at.unwrap_or(t_last);
        match last_alive {
            Some(t) => {
                // first state (in universe order) alive at step t
                let j = (0..n).find(|&j| back[t][j].is_some()).unwrap_or(0);
                let mut path = traceback(&back, t, j);
                let recovered_len = path.len();
                path.resize(n_steps, j);
                warn!(
                    "decode collapse at step {} of {}: padding the path alive at step {} (state {})",
                    collapsed_at,
                    n_steps,
                    t,
                    states.label(j)
                );
                Decoded::degraded(
                    self.to_labels(&path),
                    Recovery::Fallback {
                        collapsed_at,
                        recovered_len,
                    },
                )
            }
            None => {
                warn!(
                    "decode collapse at step {} of {}: no path to fall back to",
                    collapsed_at, n_steps
                );
                Decoded::degraded(Vec::new(), Recovery::Empty { collapsed_at })
            }
        }
    }
    fn to_labels(&self, path: &[usize]) -> Vec<State> {
        let states = self.model.states();
        path.iter().map(|&i| states.label(i).to_string()).collect()
    }
}

///
/// Follow the back pointers from `(t_end, j_end)` to step 0.
///
fn traceback(back: &[Vec<Option<usize>>], t_end: usize, j_end: usize) -> Vec<usize> {
    let mut path = Vec::with_capacity(t_end + 1);
    let mut j = j_end;
    path.push(j);
    for t in (1..=t_end).rev() {
        match back[t][j] {
            Some(i) => {
                j = i;
                path.push(i);
            }
            None => break,
        }
    }
    path.reverse();
    path
}
