use thiserror::Error;

/// Failure of an external action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// command ran but exited non-zero
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// restart exited non-zero, `status` holds what systemctl reported afterwards
    #[error("Failed to restart {service}: {stderr}\nStatus: {status}")]
    ServiceRestart {
        service: String,
        stderr: String,
        status: String,
    },

    #[error("not associated with {ssid} after {attempts} attempts")]
    WifiNotAssociated { ssid: String, attempts: u32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ActionError {
    /// rejected before anything was run
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ActionError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, ActionError>;
