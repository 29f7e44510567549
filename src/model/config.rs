//!
//! Label enumerations used by the default-fill pass
//!
//! ```json
//! {
//!   "actions": ["Forward", "Backward", "Turnaround"],
//!   "observations": ["S", "Z", "EH0", "AH0"],
//!   "placeholder_action": "N"
//! }
//! ```
//!
//! Missing fields take the values above.
//!
use crate::common::{Action, Observation, PLACEHOLDER_ACTION};
use crate::error::{HmmError, Result};
use serde::{Deserialize, Serialize};

/// Actions filled in every `(source, action)` row of a conditional model
pub const DEFAULT_ACTIONS: [&str; 3] = ["Forward", "Backward", "Turnaround"];

/// Observations filled in every emission row
pub const DEFAULT_OBSERVATIONS: [&str; 4] = ["S", "Z", "EH0", "AH0"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    ///
    /// action enumeration of the conditional transition model
    ///
    pub actions: Vec<Action>,
    ///
    /// observation enumeration of the emission model
    ///
    pub observations: Vec<Observation>,
    ///
    /// action assigned to observation lines without an action
    ///
    pub placeholder_action: Action,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            actions: DEFAULT_ACTIONS.iter().map(|s| s.to_string()).collect(),
            observations: DEFAULT_OBSERVATIONS.iter().map(|s| s.to_string()).collect(),
            placeholder_action: PLACEHOLDER_ACTION.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn new<A, O>(actions: &[A], observations: &[O]) -> Self
    where
        A: AsRef<str>,
        O: AsRef<str>,
    {
        ModelConfig {
            actions: actions.iter().map(|a| a.as_ref().to_string()).collect(),
            observations: observations.iter().map(|o| o.as_ref().to_string()).collect(),
            placeholder_action: PLACEHOLDER_ACTION.to_string(),
        }
    }
    pub fn with_placeholder_action(mut self, action: &str) -> Self {
        self.placeholder_action = action.to_string();
        self
    }
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| HmmError::from(e).in_file(path))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| HmmError::from(e).in_file(path))
    }
    pub fn to_json_string(&self) -> String {
        // a struct of strings always serializes
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_reference_domain() {
        let c = ModelConfig::default();
        assert_eq!(c.actions, vec!["Forward", "Backward", "Turnaround"]);
        assert_eq!(c.observations, vec!["S", "Z", "EH0", "AH0"]);
        assert_eq!(c.placeholder_action, "N");
    }
    #[test]
    fn partial_json_keeps_defaults() {
        let c = ModelConfig::from_json_str(r#"{"observations": ["x", "y"]}"#).unwrap();
        assert_eq!(c.observations, vec!["x", "y"]);
        assert_eq!(c.actions, ModelConfig::default().actions);
        assert_eq!(c.placeholder_action, "N");
    }
    #[test]
    fn json_roundtrip() {
        let c = ModelConfig::new(&["Stay", "Switch"], &["o"]).with_placeholder_action("Stay");
        let d = ModelConfig::from_json_str(&c.to_json_string()).unwrap();
        assert_eq!(c, d);
    }
    #[test]
    fn broken_json_is_error() {
        assert!(ModelConfig::from_json_str("{").is_err());
    }
}
