//!
//! Reader of the observation (and action) file
//!
//! ```text
//! observation_actions
//! 3
//! "x" "Forward"
//! "y"
//! "x" "Backward"
//! ```
//!
//! The header and count lines are skipped. A line is `observation` or
//! `observation action`.
//!
use super::weights::NumberedLines;
use crate::common::{strip_quotes, ObservationSequence};
use crate::error::Result;
use crate::io::open_reader;
use log::{debug, warn};
use std::io::BufRead;
use std::path::Path;

///
/// Parse an observation sequence
///
pub fn read_sequence<R: BufRead>(reader: R) -> Result<ObservationSequence> {
    let mut lines = NumberedLines::new(reader);
    let mut seq = ObservationSequence::new();

    // header and count lines
    if lines.next_line()?.is_none() {
        return Ok(seq);
    }
    let declared = match lines.next_line()? {
        Some((_, text)) => text.trim().parse::<usize>().ok(),
        None => return Ok(seq),
    };

    while let Some(line) = lines.next_record()? {
        match line.split().as_slice() {
            [observation] => seq.push(strip_quotes(observation).to_string(), None),
            [observation, action] => seq.push(
                strip_quotes(observation).to_string(),
                Some(strip_quotes(action).to_string()),
            ),
            fields => {
                return Err(line.error(format!(
                    "expected `observation` or `observation action`, found {} fields",
                    fields.len()
                )))
            }
        }
    }

    match declared {
        Some(n) if n != seq.len() => warn!(
            "observation file declares {} records but has {}",
            n,
            seq.len()
        ),
        _ => {}
    }
    debug!(
        "read {} observations (with actions: {})",
        seq.len(),
        seq.has_actions()
    );
    Ok(seq)
}

pub fn read_sequence_file<P: AsRef<Path>>(path: P) -> Result<ObservationSequence> {
    let path = path.as_ref();
    read_sequence(open_reader(path)?).map_err(|e| e.in_file(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmmError;

    #[test]
    fn observations_with_and_without_actions() {
        let s = "observation_actions\n3\n\"x\" \"Forward\"\n\ny\n\"x\" Backward\n";
        let seq = read_sequence(s.as_bytes()).unwrap();
        assert_eq!(seq.observations, vec!["x", "y", "x"]);
        assert_eq!(
            seq.actions,
            vec![
                Some("Forward".to_string()),
                None,
                Some("Backward".to_string())
            ]
        );
    }
    #[test]
    fn observations_only() {
        let s = "observations\n2\nx\ny\n";
        let seq = read_sequence(s.as_bytes()).unwrap();
        assert_eq!(seq, ObservationSequence::from_observations(vec!["x", "y"]));
    }
    #[test]
    fn header_only_is_empty() {
        assert!(read_sequence("observations\n0\n".as_bytes())
            .unwrap()
            .is_empty());
        assert!(read_sequence("".as_bytes()).unwrap().is_empty());
    }
    #[test]
    fn count_mismatch_is_not_fatal() {
        let seq = read_sequence("observations\n5\nx\n".as_bytes()).unwrap();
        assert_eq!(seq.len(), 1);
    }
    #[test]
    fn three_fields_is_error() {
        match read_sequence("h\n1\nx F y\n".as_bytes()) {
            Err(HmmError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other),
        }
    }
}
