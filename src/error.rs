//! Error types for schema compilation and lookup

use thiserror::Error;
use url::Url;

use crate::pointer::Pointer;

/// Result type for schema compilation
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised while building a schema
///
/// Every variant carries the JSON Pointer of the offending location within
/// the document being compiled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Invalid type at '{location}': expected {expected}")]
    InvalidType { location: Pointer, expected: String },

    #[error("Invalid value at '{location}': {message}")]
    InvalidValue { location: Pointer, message: String },

    #[error("Unknown keyword '{keyword}' at '{location}'")]
    UnknownKeyword { keyword: String, location: Pointer },

    #[error("Invalid schema id '{id}' at '{location}': {message}")]
    InvalidSchemaId { id: String, location: Pointer, message: String },

    #[error("Duplicate schema id '{id}' at '{location}'")]
    DuplicateId { id: Url, location: Pointer },

    #[error("Invalid anchor '{anchor}' at '{location}'")]
    InvalidAnchor { anchor: String, location: Pointer },

    #[error("Unknown meta-schema '{id}' at '{location}'")]
    UnknownMetaSchema { id: String, location: Pointer },

    #[error("Unknown required vocabulary '{id}' at '{location}'")]
    UnknownVocabulary { id: String, location: Pointer },

    #[error("Invalid regular expression '{pattern}' at '{location}': {message}")]
    InvalidPattern { pattern: String, location: Pointer, message: String },
}

impl CompileError {
    /// Location of the failure within the schema document
    pub fn location(&self) -> &Pointer {
        match self {
            CompileError::InvalidType { location, .. }
            | CompileError::InvalidValue { location, .. }
            | CompileError::UnknownKeyword { location, .. }
            | CompileError::InvalidSchemaId { location, .. }
            | CompileError::DuplicateId { location, .. }
            | CompileError::InvalidAnchor { location, .. }
            | CompileError::UnknownMetaSchema { location, .. }
            | CompileError::UnknownVocabulary { location, .. }
            | CompileError::InvalidPattern { location, .. } => location,
        }
    }
}

/// Errors raised by schema locators
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Failed to compile schema '{id}': {source}")]
    Compile {
        id: Url,
        #[source]
        source: CompileError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid schema path '{0}'")]
    InvalidPath(String),

    #[error("Invalid base URI '{uri}': {source}")]
    InvalidBase {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}
