//! Error types for rmcs.
//!
//! This module defines all error types used throughout the rmcs crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rmcs operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Record Errors ===
    /// No device type with the given id exists.
    #[error("device type {id} not found")]
    DeviceTypeNotFound {
        /// The requested id.
        id: i64,
    },

    /// No event with the given id exists.
    #[error("event {id} not found")]
    EventNotFound {
        /// The requested id.
        id: i64,
    },

    /// A device type with the same name already exists.
    #[error("device type named '{name}' already exists")]
    DuplicateDeviceType {
        /// The conflicting name.
        name: String,
    },

    /// A device references a device type missing from the catalog.
    #[error("device {device_id} references unknown device type {device_type_id}")]
    DanglingDeviceType {
        /// The offending device.
        device_id: i64,
        /// The device type id it references.
        device_type_id: i64,
    },

    /// User-supplied record fields were rejected.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// The field that was rejected.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A specialized Result type for rmcs operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid input error for the given field.
    #[must_use]
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }
}
