//! Output-related errors

use std::fmt;
use std::error::Error;

pub enum OutputError {
    Open(String),
    Write(String),
    Conversion(String, usize, String),
    Empty(String),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputError::Open(s) => write!(f, "failed to open '{}'", s),
            OutputError::Write(s) => write!(f, "failed to write data to '{}'", s),
            OutputError::Conversion(s, line, text) => write!(f, "'{}' (line {} of '{}') is not a valid number", text, line, s),
            OutputError::Empty(s) => write!(f, "'{}' contains no data", s),
        }
    }
}

impl fmt::Debug for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Error for OutputError {}

impl OutputError {
    pub fn conversion(file: &str, line: usize, text: &str) -> Self {
        Self::Conversion(file.to_owned(), line, text.to_owned())
    }
}
