//!
//! end-to-end decoding from text files
//!
#[macro_use]
extern crate approx;

use flate2::write::GzEncoder;
use flate2::Compression;
use hmmdecode::cli::{self, WeightFiles};
use hmmdecode::io::{load_model, sequence::read_sequence_file};
use hmmdecode::model::{Model, ModelConfig, ZeroMassRow};
use hmmdecode::prob::Prob;
use hmmdecode::viterbi::Recovery;
use hmmdecode::HmmError;
use std::io::Write;
use std::path::{Path, PathBuf};

const COIN_INITIAL: &str = "state_weights\n2 0\n\"A\" 5\n\"B\" 5\n";
const COIN_TRANSITIONS: &str =
    "state_state_weights\n4 2 0 0\n\"A\" \"A\" 9\n\"A\" \"B\" 1\n\"B\" \"A\" 1\n\"B\" \"B\" 9\n";
const COIN_EMISSIONS: &str =
    "state_observation_weights\n4 2 2 0\n\"A\" \"x\" 9\n\"A\" \"y\" 1\n\"B\" \"x\" 1\n\"B\" \"y\" 9\n";

const ROBOT_INITIAL: &str = "state_weights\n2 0\n\"A\" 1\n\"B\" 0\n";
const ROBOT_TRANSITIONS: &str = "state_action_state_weights
8 2 2 0
\"A\" \"Stay\" \"A\" 9
\"A\" \"Stay\" \"B\" 1
\"B\" \"Stay\" \"B\" 9
\"B\" \"Stay\" \"A\" 1
\"A\" \"Switch\" \"B\" 9
\"A\" \"Switch\" \"A\" 1
\"B\" \"Switch\" \"A\" 9
\"B\" \"Switch\" \"B\" 1
";
const ROBOT_EMISSIONS: &str = "state_observation_weights\n2 2 1 0\n\"A\" \"o\" 1\n\"B\" \"o\" 1\n";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_gz(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut w = GzEncoder::new(file, Compression::default());
    w.write_all(content.as_bytes()).unwrap();
    w.finish().unwrap();
    path
}

fn coin_files(dir: &Path) -> WeightFiles {
    WeightFiles::new(
        write(dir, "state_weights.txt", COIN_INITIAL),
        write(dir, "state_state_weights.txt", COIN_TRANSITIONS),
        write(dir, "state_observation_weights.txt", COIN_EMISSIONS),
    )
}

fn robot_files(dir: &Path) -> WeightFiles {
    WeightFiles::new(
        write(dir, "state_weights.txt", ROBOT_INITIAL),
        write(dir, "state_action_state_weights.txt", ROBOT_TRANSITIONS),
        write(dir, "state_observation_weights.txt", ROBOT_EMISSIONS),
    )
}

fn coin_config() -> ModelConfig {
    ModelConfig::new(&["Forward"], &["x", "y"])
}

fn robot_config() -> ModelConfig {
    ModelConfig::new(&["Stay", "Switch"], &["o"])
}

#[test]
fn coin_files_decode_to_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let files = coin_files(dir.path());
    let observations = write(
        dir.path(),
        "observation_actions.txt",
        "observation_actions\n4\n\"x\"\n\"x\"\n\"y\"\n\"y\"\n",
    );
    let output = dir.path().join("states.txt");
    let summary = cli::decode(&files, &observations, &output, &coin_config()).unwrap();
    assert_eq!(summary.n_observations, 4);
    assert_eq!(summary.n_states_written, 4);
    assert_eq!(summary.recovery, Recovery::None);
    assert_abs_diff_eq!(summary.prob, Prob::from_prob(0.02657205), epsilon = 1e-12);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "states\n4\n\"A\"\n\"A\"\n\"B\"\n\"B\"\n"
    );
}

#[test]
fn coin_model_rows_are_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let files = coin_files(dir.path());
    let model = files.load(&coin_config()).unwrap();
    assert!(!model.is_conditional());
    assert!(model.zero_mass_rows().is_empty());
    assert!(model.initial().distribution().is_normalized(1e-9));
    for (_, _, row) in model.transition().rows() {
        assert!(row.is_normalized(1e-9));
    }
    for (_, row) in model.emission().rows() {
        assert!(row.is_normalized(1e-9));
    }
}

#[test]
fn robot_files_use_previous_action() {
    let dir = tempfile::tempdir().unwrap();
    let files = robot_files(dir.path());
    let observations = write(
        dir.path(),
        "observation_actions.txt",
        "observation_actions\n3\n\"o\" \"Switch\"\n\"o\" \"Stay\"\n\"o\" \"Stay\"\n",
    );
    let output = dir.path().join("states.txt");
    let summary = cli::decode(&files, &observations, &output, &robot_config()).unwrap();
    assert_eq!(summary.recovery, Recovery::None);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "states\n3\n\"A\"\n\"B\"\n\"B\"\n"
    );
}

#[test]
fn missing_actions_use_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let files = robot_files(dir.path());
    let observations = write(
        dir.path(),
        "observation_actions.txt",
        "observation_actions\n3\n\"o\"\n\"o\"\n\"o\"\n",
    );
    let output = dir.path().join("states.txt");

    // "N" has no transition row: every path vanishes at the first transition
    let summary = cli::decode(&files, &observations, &output, &robot_config()).unwrap();
    assert_eq!(summary.recovery, Recovery::Empty { collapsed_at: 1 });
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "states\n0\n");

    let config = robot_config().with_placeholder_action("Stay");
    let summary = cli::decode(&files, &observations, &output, &config).unwrap();
    assert_eq!(summary.recovery, Recovery::None);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "states\n3\n\"A\"\n\"A\"\n\"A\"\n"
    );
}

#[test]
fn initial_file_without_records_gives_empty_path() {
    let dir = tempfile::tempdir().unwrap();
    let d = dir.path();
    let files = WeightFiles::new(
        write(d, "state_weights.txt", "state_weights\n0 0\n"),
        write(d, "state_state_weights.txt", COIN_TRANSITIONS),
        write(d, "state_observation_weights.txt", COIN_EMISSIONS),
    );
    let observations = write(d, "observation_actions.txt", "obs\n2\nx\ny\n");
    let output = d.join("states.txt");
    let summary = cli::decode(&files, &observations, &output, &coin_config()).unwrap();
    assert_eq!(summary.recovery, Recovery::Empty { collapsed_at: 0 });
    assert_eq!(summary.n_states_written, 0);
    assert_eq!(summary.log_prob, f64::NEG_INFINITY);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "states\n0\n");
}

#[test]
fn gzipped_inputs_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let d = dir.path();
    let model = load_model(
        write_gz(d, "i.txt.gz", COIN_INITIAL),
        write_gz(d, "t.txt.gz", COIN_TRANSITIONS),
        write_gz(d, "e.txt.gz", COIN_EMISSIONS),
        &coin_config(),
    )
    .unwrap();
    let seq = read_sequence_file(write_gz(d, "o.txt.gz", "obs\n2\nx\ny\n")).unwrap();
    assert_eq!(seq.observations, vec!["x", "y"]);
    let r = model.decoder().decode_sequence(&seq).unwrap();
    assert_eq!(r.path.len(), 2);
}

#[test]
fn collapse_pads_fallback_path() {
    let dir = tempfile::tempdir().unwrap();
    let files = coin_files(dir.path());
    let observations = write(dir.path(), "obs.txt", "obs\n4\nx\nx\nz\ny\n");
    let output = dir.path().join("states.txt");
    let summary = cli::decode(&files, &observations, &output, &coin_config()).unwrap();
    assert_eq!(
        summary.recovery,
        Recovery::Fallback {
            collapsed_at: 2,
            recovered_len: 2
        }
    );
    assert_eq!(summary.n_states_written, 4);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "states\n4\n\"A\"\n\"A\"\n\"A\"\n\"A\"\n"
    );
}

#[test]
fn zero_mass_rows_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let d = dir.path();
    let files = WeightFiles::new(
        write(d, "i.txt", COIN_INITIAL),
        write(d, "t.txt", "h\n1 2 0 0\nA B 1\n"),
        write(d, "e.txt", COIN_EMISSIONS),
    );
    let model = files.load(&coin_config()).unwrap();
    assert_eq!(
        model.zero_mass_rows(),
        &[ZeroMassRow::Transition {
            source: "B".to_string(),
            action: None
        }]
    );
    assert!(model.transition().row("B", None).unwrap().is_all_zero());
}

#[test]
fn malformed_weight_file_names_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let d = dir.path();
    let files = WeightFiles::new(
        write(d, "i.txt", COIN_INITIAL),
        write(d, "t.txt", "h\n4 2 0 0\nA A 9\nA B one\n"),
        write(d, "e.txt", COIN_EMISSIONS),
    );
    let e = files.load(&coin_config()).unwrap_err();
    assert!(e.is_parse_error());
    let message = e.to_string();
    assert!(message.contains("t.txt"));
    assert!(message.contains("line 4"));
    match e {
        HmmError::File { path, .. } => assert!(path.ends_with("t.txt")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn missing_weight_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let files = WeightFiles::new(
        dir.path().join("nope.txt"),
        dir.path().join("nope.txt"),
        dir.path().join("nope.txt"),
    );
    let e = files.load(&ModelConfig::default()).unwrap_err();
    assert!(!e.is_parse_error());
}

#[test]
fn build_dumps_model_json() {
    let dir = tempfile::tempdir().unwrap();
    let files = robot_files(dir.path());
    let json = dir.path().join("model.json.gz");
    let model = cli::build(&files, Some(json.as_path()), &robot_config()).unwrap();
    let loaded = Model::from_json_file(&json).unwrap();
    assert_eq!(model, loaded);
    let r = loaded
        .decoder()
        .decode_with_actions(&["o", "o", "o"], &["Stay", "Switch", "Stay"])
        .unwrap();
    assert_eq!(r.path, vec!["A", "A", "B"]);
}

#[test]
fn config_file_sets_fill_domain() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "config.json",
        r#"{"actions": ["Stay", "Switch"], "observations": ["o"], "placeholder_action": "Stay"}"#,
    );
    let config = cli::load_config(Some(path.as_path())).unwrap();
    assert_eq!(config, robot_config().with_placeholder_action("Stay"));
}
