//! Error types for the bytemut library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using bytemut's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating mutants or tracking their history.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// A requested mutator or group name is not registered in the catalog.
    #[error("Unknown mutator or group: {name}")]
    UnknownOperator { name: String },

    /// A persisted history document could not be read back.
    #[error("Malformed history: {message}")]
    MalformedHistory { message: String },

    /// A mutation ordinal beyond the number of candidates was requested.
    #[error("Mutation ordinal {ordinal} is out of range ({candidates} candidates)")]
    SelectionOutOfRange { ordinal: usize, candidates: usize },

    /// A method type descriptor could not be parsed.
    #[error("Invalid descriptor {descriptor}: {message}")]
    Descriptor { descriptor: String, message: String },

    /// The requested method does not exist in the class.
    #[error("Method not found: {class}.{method}")]
    MissingMethod { class: String, method: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create an unknown operator error for the offending token.
    pub fn unknown_operator(name: impl Into<String>) -> Self {
        Self::UnknownOperator { name: name.into() }
    }

    /// Create a malformed history error.
    pub fn malformed_history(message: impl Into<String>) -> Self {
        Self::MalformedHistory {
            message: message.into(),
        }
    }

    /// Create a descriptor error.
    pub fn descriptor(descriptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            descriptor: descriptor.into(),
            message: message.into(),
        }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
