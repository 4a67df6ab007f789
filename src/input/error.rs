//! Input parsing errors

use std::fmt;
use std::error::Error;

const HELP_MSG: &str = "Usage: spheroidal input-file";

/// Why did reading the configuration fail?
#[derive(Debug,Copy,Clone,PartialEq)]
pub enum InputErrorKind {
    File,
    Location,
    Conversion,
    Stage,
}

/// Error returned when the configuration cannot be read or is
/// inconsistent.
pub enum InputError {
    /// No input file was given, or it is not valid YAML.
    File(Option<String>),
    /// `path` exists up to, but not including, `missing`.
    Location { path: String, missing: String },
    /// `field` of `path` holds a value of the wrong type.
    Conversion { path: String, field: String },
    /// An entry of `stages` is not a stage name.
    Stage(String),
}

impl fmt::Debug for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputError::File(None) => write!(f, "No configuration file given.\n{}", HELP_MSG),
            InputError::File(Some(name)) => write!(f, "Unable to read \"{}\" as a YAML configuration.\n{}", name, HELP_MSG),
            InputError::Location { path, missing } => write!(f, "\"{}\" is missing from \"{}\".", missing, path),
            InputError::Conversion { path, field } => write!(f, "Could not convert \"{}\" in \"{}\" to the expected type.", field, path),
            InputError::Stage(name) => write!(f, "\"{}\" is not a recognised stage.", name),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for InputError {}

impl InputError {
    /// No input file.
    pub fn usage() -> Self {
        InputError::File(None)
    }

    pub fn file(name: &str) -> Self {
        InputError::File(Some(name.to_owned()))
    }

    pub fn location(path: &str, missing: &str) -> Self {
        InputError::Location { path: path.to_owned(), missing: missing.to_owned() }
    }

    pub fn conversion(path: &str, field: &str) -> Self {
        InputError::Conversion { path: path.to_owned(), field: field.to_owned() }
    }

    pub fn stage(name: &str) -> Self {
        InputError::Stage(name.to_owned())
    }

    pub fn kind(&self) -> InputErrorKind {
        match self {
            InputError::File(_) => InputErrorKind::File,
            InputError::Location { .. } => InputErrorKind::Location,
            InputError::Conversion { .. } => InputErrorKind::Conversion,
            InputError::Stage(_) => InputErrorKind::Stage,
        }
    }
}
