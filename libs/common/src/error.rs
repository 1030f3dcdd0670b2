//! Custom error types for the common library
//!
//! This module defines the error types shared by the services: database
//! connectivity failures and configuration loading failures.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised while assembling the service settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A configuration source could not be read or deserialized
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The settings were read but are not usable together
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Type alias for Result with SettingsError
pub type SettingsResult<T> = Result<T, SettingsError>;
