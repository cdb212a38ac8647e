//! Error types for registry operations.

use thiserror::Error;

/// Everything that can go wrong reading or changing reservations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// config file could not be read or written
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// a required form/json field was blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// a field holds characters a `dhcp-host=` directive can't carry
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("MAC address {0} already exists. Edit the existing entry to update.")]
    DuplicateMac(String),

    #[error("Hostname {0} already exists. Choose a different hostname.")]
    DuplicateHostname(String),

    #[error("No host found with MAC address {0}")]
    NotFound(String),
}

impl RegistryError {
    /// Returns true if the request itself was rejected and nothing was
    /// persisted (as opposed to an i/o failure).
    pub fn is_validation(&self) -> bool {
        !matches!(self, RegistryError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
