//!
//! Text inputs and outputs around the model and the decoder
//!
//! * `weights`: initial / transition / emission weight files
//! * `sequence`: observation (and action) file
//! * `states`: decoded state file
//!
//! Files whose name ends in `.gz` are read and written through gzip.
//!
pub mod sequence;
pub mod states;
pub mod weights;

use crate::error::{HmmError, Result};
use crate::model::{Model, ModelBuilder, ModelConfig};
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

///
/// Open a file for buffered reading, decompressing `.gz` files
///
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| HmmError::from(e).in_file(path))?;
    let reader = BufReader::new(file);
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

///
/// Buffered file writer, gzip-compressed for `.gz` files
///
/// `finish` has to be called after the last write: it writes the gzip
/// trailer and flushes the buffer, returning any error on the way.
///
pub enum FileWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl FileWriter {
    pub fn finish(self) -> Result<()> {
        match self {
            FileWriter::Plain(mut w) => w.flush()?,
            FileWriter::Gzip(w) => {
                let mut inner = w.finish()?;
                inner.flush()?;
            }
        }
        Ok(())
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            FileWriter::Plain(w) => w.write(buf),
            FileWriter::Gzip(w) => w.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            FileWriter::Plain(w) => w.flush(),
            FileWriter::Gzip(w) => w.flush(),
        }
    }
}

///
/// Create a file for buffered writing, compressing `.gz` files
///
pub fn create_writer<P: AsRef<Path>>(path: P) -> Result<FileWriter> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| HmmError::from(e).in_file(path))?;
    let writer = BufWriter::new(file);
    if is_gzip(path) {
        Ok(FileWriter::Gzip(GzEncoder::new(
            writer,
            Compression::default(),
        )))
    } else {
        Ok(FileWriter::Plain(writer))
    }
}

///
/// Parse the three weight files and build the model.
///
pub fn load_model<P, Q, R>(
    initial: P,
    transitions: Q,
    emissions: R,
    config: &ModelConfig,
) -> Result<Model>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let initial = weights::read_initial_file(initial)?;
    let transitions = weights::read_transitions_file(transitions)?;
    let emissions = weights::read_emissions_file(emissions)?;
    info!(
        "loaded {} initial, {} {} transition and {} emission records",
        initial.records.len(),
        transitions.records.len(),
        transitions.shape(),
        emissions.records.len()
    );
    Ok(ModelBuilder::new(config.clone()).build(&initial, &transitions, &emissions))
}
