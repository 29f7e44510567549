//!
//! Parsers of the three weight files
//!
//! # Initial weights
//!
//! ```text
//! state_weights
//! 2 0
//! "A" 5
//! "B" 5
//! ```
//!
//! The second line is `n_states default_weight` or `default_weight`.
//!
//! # Transition weights
//!
//! ```text
//! state_action_state_weights
//! 4 2 3 1
//! "A" "Forward" "B" 9
//! ```
//!
//! The second line is `_ n_states n_actions default_weight`. The field count
//! of the first data line selects the shape for the whole file: 4 fields
//! (`source action target weight`) for the action-conditioned model,
//! 3 fields (`source target weight`) otherwise.
//!
//! # Emission weights
//!
//! ```text
//! state_observation_weights
//! 8 2 4 1
//! "A" "S" 3
//! ```
//!
//! The second line is `_ n_states n_observations default_weight`.
//!
//! In every file the first line is ignored, blank lines are skipped and
//! quotes around labels are stripped.
//!
use crate::common::{strip_quotes, Weight};
use crate::error::{HmmError, Result};
use crate::io::open_reader;
use crate::model::records::{
    ActionTransitionRecord, EmissionInput, EmissionRecord, InitialHeader, InitialInput,
    InitialRecord, TableHeader, TransitionInput, TransitionRecord, TransitionRecords,
    TransitionShape,
};
use log::debug;
use std::io::BufRead;
use std::path::Path;

///
/// Line reader with 1-based line numbers
///
pub(crate) struct NumberedLines<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> NumberedLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        NumberedLines {
            lines: reader.lines(),
            line_no: 0,
        }
    }
    ///
    /// next raw line, or None at EOF
    ///
    pub(crate) fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(Some((self.line_no, line?)))
            }
            None => Ok(None),
        }
    }
    ///
    /// next line that must exist (header and metadata lines)
    ///
    pub(crate) fn expect_line(&mut self, what: &str) -> Result<(usize, String)> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(HmmError::parse(
                self.line_no + 1,
                "",
                format!("missing {}", what),
            )),
        }
    }
    ///
    /// next non-blank line split into fields
    ///
    pub(crate) fn next_record(&mut self) -> Result<Option<Fields>> {
        while let Some((line_no, text)) = self.next_line()? {
            if !text.trim().is_empty() {
                return Ok(Some(Fields::new(line_no, text)));
            }
        }
        Ok(None)
    }
}

///
/// Whitespace separated fields of one line
///
pub(crate) struct Fields {
    pub(crate) line_no: usize,
    pub(crate) text: String,
}

impl Fields {
    pub(crate) fn new(line_no: usize, text: String) -> Self {
        Fields { line_no, text }
    }
    pub(crate) fn split(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
    pub(crate) fn error<S: Into<String>>(&self, reason: S) -> HmmError {
        HmmError::parse(self.line_no, self.text.clone(), reason)
    }
    ///
    /// fields of a record line which must have exactly `n` fields
    ///
    pub(crate) fn exactly(&self, n: usize) -> Result<Vec<&str>> {
        let fields = self.split();
        if fields.len() == n {
            Ok(fields)
        } else {
            Err(self.error(format!(
                "expected {} fields, found {}",
                n,
                fields.len()
            )))
        }
    }
    pub(crate) fn weight(&self, field: &str) -> Result<Weight> {
        field
            .parse::<Weight>()
            .map_err(|_| self.error(format!("invalid weight `{}`", field)))
    }
    pub(crate) fn count(&self, field: &str) -> Result<usize> {
        field
            .parse::<usize>()
            .map_err(|_| self.error(format!("invalid count `{}`", field)))
    }
}

fn label(field: &str) -> String {
    strip_quotes(field).to_string()
}

///
/// `_ n_states n_labels default_weight`
///
fn parse_table_header(fields: &Fields) -> Result<TableHeader> {
    let f = fields.exactly(4)?;
    fields.count(f[0])?;
    Ok(TableHeader::new(
        fields.count(f[1])?,
        fields.count(f[2])?,
        fields.weight(f[3])?,
    ))
}

fn expect_metadata<R: BufRead>(lines: &mut NumberedLines<R>) -> Result<Fields> {
    let (line_no, text) = lines.expect_line("metadata line")?;
    Ok(Fields::new(line_no, text))
}

///
/// Parse the initial weights
///
pub fn read_initial<R: BufRead>(reader: R) -> Result<InitialInput> {
    let mut lines = NumberedLines::new(reader);
    lines.expect_line("header line")?;
    let metadata = expect_metadata(&mut lines)?;
    let header = match metadata.split().as_slice() {
        [default_weight] => InitialHeader::new(None, metadata.weight(default_weight)?),
        [n_states, default_weight] => InitialHeader::new(
            Some(metadata.count(n_states)?),
            metadata.weight(default_weight)?,
        ),
        fields => {
            return Err(metadata.error(format!(
                "expected `default_weight` or `n_states default_weight`, found {} fields",
                fields.len()
            )))
        }
    };
    debug!("initial metadata {:?}", header);

    let mut records = Vec::new();
    while let Some(line) = lines.next_record()? {
        let f = line.exactly(2)?;
        records.push(InitialRecord::new(label(f[0]), line.weight(f[1])?));
    }
    Ok(InitialInput::new(header, records))
}

///
/// Parse the transition weights of either shape
///
pub fn read_transitions<R: BufRead>(reader: R) -> Result<TransitionInput> {
    let mut lines = NumberedLines::new(reader);
    lines.expect_line("header line")?;
    let header = parse_table_header(&expect_metadata(&mut lines)?)?;
    debug!("transition metadata {:?}", header);

    let first = lines.next_record()?;
    let shape = first
        .as_ref()
        .map(|line| TransitionShape::from_n_fields(line.split().len()))
        .unwrap_or(TransitionShape::Unconditional);
    debug!("transition shape detected: {}", shape);

    let records = match shape {
        TransitionShape::Unconditional => {
            let mut records = Vec::new();
            let mut line = first;
            while let Some(l) = line {
                let f = l.exactly(3)?;
                records.push(TransitionRecord::new(
                    label(f[0]),
                    label(f[1]),
                    l.weight(f[2])?,
                ));
                line = lines.next_record()?;
            }
            TransitionRecords::Unconditional(records)
        }
        TransitionShape::Conditional => {
            let mut records = Vec::new();
            let mut line = first;
            while let Some(l) = line {
                let f = l.exactly(4)?;
                records.push(ActionTransitionRecord::new(
                    label(f[0]),
                    label(f[1]),
                    label(f[2]),
                    l.weight(f[3])?,
                ));
                line = lines.next_record()?;
            }
            TransitionRecords::Conditional(records)
        }
    };
    Ok(TransitionInput::new(header, records))
}

///
/// Parse the emission weights
///
pub fn read_emissions<R: BufRead>(reader: R) -> Result<EmissionInput> {
    let mut lines = NumberedLines::new(reader);
    lines.expect_line("header line")?;
    let header = parse_table_header(&expect_metadata(&mut lines)?)?;
    debug!("emission metadata {:?}", header);

    let mut records = Vec::new();
    while let Some(line) = lines.next_record()? {
        let f = line.exactly(3)?;
        records.push(EmissionRecord::new(
            label(f[0]),
            label(f[1]),
            line.weight(f[2])?,
        ));
    }
    Ok(EmissionInput::new(header, records))
}

pub fn read_initial_file<P: AsRef<Path>>(path: P) -> Result<InitialInput> {
    let path = path.as_ref();
    read_initial(open_reader(path)?).map_err(|e| e.in_file(path))
}

pub fn read_transitions_file<P: AsRef<Path>>(path: P) -> Result<TransitionInput> {
    let path = path.as_ref();
    read_transitions(open_reader(path)?).map_err(|e| e.in_file(path))
}

pub fn read_emissions_file<P: AsRef<Path>>(path: P) -> Result<EmissionInput> {
    let path = path.as_ref();
    read_emissions(open_reader(path)?).map_err(|e| e.in_file(path))
}
