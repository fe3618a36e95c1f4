//! Error types for parsing, resolving, and validating sample sheets.
//!
//! Each stage has its own error enum so callers can tell a malformed document
//! from a rejected one. [`Error`] wraps all of them for code that drives the
//! whole read → validate → write flow.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience result for crate-level operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while turning text or a structured tree into a sheet.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A line starts a section header but never closes it.
    #[error("line {line}: section header is missing a closing ']': {text}")]
    UnclosedSectionHeader { line: usize, text: String },

    /// A section header with nothing between the brackets.
    #[error("line {line}: section header has an empty name")]
    EmptySectionName { line: usize },

    /// A single line could not be read as a CSV record.
    #[error("line {line}: {message}")]
    Record { line: usize, message: String },

    /// The structured tree does not have the expected shape.
    #[error("section '{section}': {reason}")]
    InvalidTree { section: String, reason: String },

    /// The interchange document is not JSON.
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while resolving a schema `$ref`.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The reference uses a scheme no resolver handles.
    #[error("unsupported schema reference '{reference}'")]
    Unsupported { reference: String },

    /// A local schema file could not be read.
    #[error("failed to read schema '{reference}' from {path}: {source}")]
    Io {
        reference: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote schema could not be fetched.
    #[error("failed to fetch schema '{reference}': {message}")]
    Fetch { reference: String, message: String },

    /// Remote access was disabled by configuration.
    #[error("remote schema references are disabled: '{reference}'")]
    RemoteDisabled { reference: String },

    /// The referenced document is not JSON.
    #[error("schema '{reference}' is not valid JSON: {source}")]
    Json {
        reference: String,
        #[source]
        source: serde_json::Error,
    },

    /// A chain of `$ref`-only documents did not terminate.
    #[error("schema reference chain starting at '{reference}' is deeper than {depth}")]
    TooDeep { reference: String, depth: usize },

    /// The schema compiler could not resolve a nested reference.
    #[error("unresolvable schema reference: {message}")]
    Unresolvable { message: String },
}

/// What kind of validator a [`ValidatorId`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorKind {
    Schema,
    Predicate,
}

/// Identity of a validator inside an ordered validator list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorId {
    /// Zero-based position in the list.
    pub index: usize,
    /// Name for named validators (schema `title` or predicate name).
    pub name: Option<String>,
    pub kind: ValidatorKind,
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.kind) {
            (Some(name), _) => write!(f, "{} (#{})", name, self.index),
            (None, ValidatorKind::Schema) => write!(f, "anonymous validator #{}", self.index),
            (None, ValidatorKind::Predicate) => {
                write!(f, "anonymous validation function #{}", self.index)
            }
        }
    }
}

/// The first failure reported by a validation pipeline.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A JSON Schema rejected the document.
    #[error("{validator} raised validation error: {path}: {message}")]
    Schema {
        validator: ValidatorId,
        path: String,
        message: String,
    },

    /// A predicate function rejected the document.
    #[error("{validator} raised validation error: {message}")]
    Predicate {
        validator: ValidatorId,
        message: String,
    },

    /// A schema reference could not be resolved.
    #[error("{validator} could not be resolved: {source}")]
    Resolution {
        validator: ValidatorId,
        #[source]
        source: ResolutionError,
    },

    /// The schema document itself is not a valid JSON Schema.
    #[error("{validator} is not a valid JSON schema: {message}")]
    InvalidSchema {
        validator: ValidatorId,
        message: String,
    },
}

impl ValidationError {
    /// The validator that failed.
    pub fn validator(&self) -> &ValidatorId {
        match self {
            Self::Schema { validator, .. }
            | Self::Predicate { validator, .. }
            | Self::Resolution { validator, .. }
            | Self::InvalidSchema { validator, .. } => validator,
        }
    }

    /// Position of the failing validator in the list.
    pub fn index(&self) -> usize {
        self.validator().index
    }
}

/// Errors from mutating a data section.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("row {row} is out of range (section has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("field '{field}' is not part of the section header")]
    UnknownField { field: String },
}

/// Umbrella error for the read → validate → write flow.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process exit codes for the command line front end.
pub mod exit_code {
    /// Input could not be read or parsed.
    pub const READ: u8 = 1;
    /// A requested validator rejected the input.
    pub const VALIDATION: u8 = 2;
    /// An unknown input or output format was requested.
    pub const FORMAT: u8 = 3;
    /// Output could not be produced (usually validation at write time).
    pub const OUTPUT: u8 = 4;
}

impl Error {
    /// Exit code for this error when it surfaces from the read or validate stage.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Parse(_) | Self::Read { .. } => exit_code::READ,
            Self::Validation(_) | Self::Resolution(_) => exit_code::VALIDATION,
            Self::Data(_) | Self::Io(_) | Self::Json(_) => exit_code::OUTPUT,
        }
    }
}
