//! Error types for knowledgebank.
//!
//! This module defines all error types used throughout the knowledgebank crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for knowledgebank operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Fetch Errors ===
    /// A request to a resource location failed before a response arrived.
    #[error("failed to fetch {location}: {source}")]
    Fetch {
        /// The URL that was requested.
        location: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The remote side answered with a non-success status.
    #[error("request to {location} failed with status {status}")]
    HttpStatus {
        /// The URL that was requested.
        location: String,
        /// The HTTP status code returned.
        status: u16,
    },

    /// Building the HTTP client failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // === Store Errors ===
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

    // === Upload Errors ===
    /// An upload request was malformed.
    #[error("invalid upload: {message}")]
    InvalidUpload {
        /// Description of what was wrong with the upload.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read a resource document from disk.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

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
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for knowledgebank operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid upload error.
    #[must_use]
    pub fn invalid_upload(message: impl Into<String>) -> Self {
        Self::InvalidUpload {
            message: message.into(),
        }
    }

    /// Create a fetch error for the given location.
    #[must_use]
    pub fn fetch(location: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            location: location.into(),
            source,
        }
    }

    /// Check if this error came from loading data (network, status, decode, read).
    #[must_use]
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::HttpStatus { .. }
                | Self::Http(_)
                | Self::Json(_)
                | Self::FileRead { .. }
        )
    }

    /// Check if this error was caused by the client's upload request.
    #[must_use]
    pub fn is_invalid_upload(&self) -> bool {
        matches!(self, Self::InvalidUpload { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");

        let err = Error::HttpStatus {
            location: "http://localhost/api/resources".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "request to http://localhost/api/resources failed with status 503"
        );
    }

    #[test]
    fn test_invalid_upload() {
        let err = Error::invalid_upload("missing boundary");
        assert!(err.is_invalid_upload());
        assert!(!err.is_load_failure());
        assert_eq!(err.to_string(), "invalid upload: missing boundary");
    }

    #[test]
    fn test_status_is_load_failure() {
        let err = Error::HttpStatus {
            location: "x".to_string(),
            status: 404,
        };
        assert!(err.is_load_failure());
        assert!(!Error::internal("x").is_load_failure());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
            assert!(err.is_load_failure());
        }
    }

    #[test]
    fn test_file_read_error_display() {
        let err = Error::FileRead {
            path: PathBuf::from("/data/resources.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/resources.json"));
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "timeout_secs must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
