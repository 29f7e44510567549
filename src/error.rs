//!
//! Error type shared by the parsers, the builder and the decoder
//!
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HmmError {
    /// I/O error while reading or writing a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// malformed record in one of the text inputs
    ///
    /// `line` is 1-based.
    #[error("parse error at line {line} ({text:?}): {reason}")]
    Parse {
        line: usize,
        text: String,
        reason: String,
    },

    /// an error raised while handling `path`
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<HmmError>,
    },

    /// model or config (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// an action-conditioned model was decoded without an action sequence
    #[error("the transition model is action-conditioned but no actions were given")]
    MissingActions,

    /// the action sequence cannot cover every transition of the observations
    #[error("{n_observations} observations need at least {required} actions, got {given}")]
    ActionsTooShort {
        n_observations: usize,
        required: usize,
        given: usize,
    },
}

impl HmmError {
    pub fn parse<T: Into<String>, R: Into<String>>(line: usize, text: T, reason: R) -> Self {
        HmmError::Parse {
            line,
            text: text.into(),
            reason: reason.into(),
        }
    }
    ///
    /// attach the file name to an error
    ///
    pub fn in_file<P: Into<PathBuf>>(self, path: P) -> Self {
        HmmError::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
    ///
    /// is this a malformed-input error (possibly wrapped with a file name)?
    ///
    pub fn is_parse_error(&self) -> bool {
        match self {
            HmmError::Parse { .. } => true,
            HmmError::File { source, .. } => source.is_parse_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, HmmError>;
