use sahm_core::{ClientError, ClientErrorKind};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
///
/// Upstream failures are not errors here: they travel in the envelope and
/// pick the exit code through [`client_exit_code`].
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] sahm_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Serialization(_) => 4,
        }
    }
}

/// Configuration problems exit 6, upstream failures 3.
pub const fn client_exit_code(error: &ClientError) -> u8 {
    match error.kind() {
        ClientErrorKind::MissingCredential | ClientErrorKind::Unauthorized => 6,
        ClientErrorKind::RateLimited | ClientErrorKind::RequestFailed => 3,
    }
}
