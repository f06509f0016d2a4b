use thiserror::Error;

/// Failures of a call to the backend, split by how the UI must react to them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Input rejected locally; the request never left the client.
    #[error("invalid fields: {}", fields.join(", "))]
    Validation { fields: Vec<String> },

    /// The server answered with a non-2xx status. `message` is shown verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Network or decoding failure. `detail` is for the logs only.
    #[error("transport failure: {detail}")]
    Transport { detail: String },
}

impl ApiError {
    pub fn validation(field: impl Into<String>) -> Self {
        ApiError::Validation { fields: vec![field.into()] }
    }

    /// Fails with every `(name, value)` pair whose value is blank.
    pub fn check_required(fields: &[(&str, &str)]) -> Result<(), ApiError> {
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation { fields: missing })
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        ApiError::Transport { detail: err.to_string() }
    }

    /// Text suitable for a toast. Transport details are replaced by a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation { fields } => {
                format!("Please fill in the required fields: {}", fields.join(", "))
            }
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Transport { .. } => GENERIC_FAILURE.to_string(),
        }
    }
}

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors returned by the interaction controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The same action is still waiting for the backend.
    #[error("{0} is already in progress")]
    Busy(&'static str),

    /// The user declined the confirmation prompt.
    #[error("cancelled by the user")]
    Cancelled,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Returned by a device capability that cannot be used on this platform.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("{capability} failed: {detail}")]
    Failed { capability: &'static str, detail: String },
}
