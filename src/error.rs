//! Error types for rust-sqlddl

use std::path::PathBuf;
use thiserror::Error;

use crate::context::SqlServerVersion;

/// Errors raised while synthesizing DDL.
///
/// Every variant is raised at script-generation time, before any text is
/// returned to the caller.
#[derive(Error, Debug)]
pub enum DdlError {
    #[error("{feature} is not supported on {target}; it requires {required} or later")]
    UnsupportedVersion {
        feature: String,
        target: String,
        required: String,
    },

    #[error("Property {property} of {object} must be set")]
    PropertyNotSet { object: String, property: String },

    #[error("Property {property} of {object} is not supported by this kind of object: {reason}")]
    PropertyNotSupported {
        object: String,
        property: String,
        reason: String,
    },

    #[error("Wrong value for property {property} of {object}: {message}")]
    WrongPropertyValue {
        object: String,
        property: String,
        message: String,
    },

    #[error("Conflicting properties on {object}: {message}")]
    ConflictingProperties { object: String, message: String },

    #[error("Cannot {operation} {object} while it is {state}")]
    InvalidOperation {
        operation: String,
        object: String,
        state: String,
    },

    #[error("Expected graph column not found after {column} on {object}")]
    ExpectedGraphColumnNotFound { object: String, column: String },

    #[error("Failed to read snapshot file: {path}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot document")]
    SnapshotParse {
        #[source]
        source: roxmltree::Error,
    },

    #[error("Invalid snapshot document: {message}")]
    InvalidSnapshot { message: String },
}

impl DdlError {
    pub(crate) fn unsupported_version(
        feature: impl Into<String>,
        target: SqlServerVersion,
        required: SqlServerVersion,
    ) -> Self {
        DdlError::UnsupportedVersion {
            feature: feature.into(),
            target: target.to_string(),
            required: required.to_string(),
        }
    }

    pub(crate) fn not_set(object: impl Into<String>, property: impl Into<String>) -> Self {
        DdlError::PropertyNotSet {
            object: object.into(),
            property: property.into(),
        }
    }

    pub(crate) fn not_supported(
        object: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        DdlError::PropertyNotSupported {
            object: object.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn wrong_value(
        object: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DdlError::WrongPropertyValue {
            object: object.into(),
            property: property.into(),
            message: message.into(),
        }
    }

    pub(crate) fn conflicting(object: impl Into<String>, message: impl Into<String>) -> Self {
        DdlError::ConflictingProperties {
            object: object.into(),
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DdlError>;
