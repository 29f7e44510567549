//!
//! Writer of the decoded state file
//!
//! ```text
//! states
//! 3
//! "A"
//! "A"
//! "B"
//! ```
//!
use crate::error::Result;
use crate::io::create_writer;
use std::io::Write;
use std::path::Path;

pub fn write_states<W: Write, S: AsRef<str>>(mut writer: W, states: &[S]) -> Result<()> {
    writeln!(writer, "states")?;
    writeln!(writer, "{}", states.len())?;
    for state in states {
        writeln!(writer, "\"{}\"", state.as_ref())?;
    }
    Ok(())
}

pub fn states_to_string<S: AsRef<str>>(states: &[S]) -> String {
    let mut buf = Vec::new();
    // writing into a Vec never fails
    let _ = write_states(&mut buf, states);
    String::from_utf8_lossy(&buf).into_owned()
}

///
/// Write the decoded states into a file (gzip if the name ends in `.gz`)
///
pub fn write_states_file<P: AsRef<Path>, S: AsRef<str>>(path: P, states: &[S]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create_writer(path)?;
    write_states(&mut writer, states)
        .and_then(|_| writer.finish())
        .map_err(|e| e.in_file(path))
}
