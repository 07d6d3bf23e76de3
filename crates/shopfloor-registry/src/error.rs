//! Error types for the machine registry.

use std::io;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No entry exists for the requested machine id.
    #[error("Machine not registered: {0}")]
    NotRegistered(usize),

    /// An entry with this id already exists.
    #[error("Machine already registered: {0}")]
    AlreadyRegistered(usize),

    /// The id is outside the valid slot range.
    #[error("Machine id {id} outside 1..={max}")]
    IdOutOfRange {
        /// The rejected id.
        id: usize,
        /// The highest valid id.
        max: usize,
    },

    /// The address field is empty or unusable.
    #[error("Invalid address for machine {id}: {reason}")]
    InvalidAddress {
        /// The machine id the address was for.
        id: usize,
        /// Why the address was rejected.
        reason: String,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::NotRegistered(4);
        assert_eq!(err.to_string(), "Machine not registered: 4");

        let err = RegistryError::IdOutOfRange { id: 11, max: 10 };
        assert_eq!(err.to_string(), "Machine id 11 outside 1..=10");

        let err = RegistryError::InvalidAddress {
            id: 2,
            reason: "empty".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid address for machine 2: empty");
    }
}
