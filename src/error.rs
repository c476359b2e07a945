// error.rs - Error taxonomy for tool invocations
// Every variant is caught at the invocation point and turned into a
// user-visible message; none of them terminate the host process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OsintError {
    /// Empty, missing or mis-typed input. Shown as a warning, never invoked.
    #[error("{0}")]
    Validation(String),

    /// External process could not be started or exited abnormally
    #[error("{message}")]
    Execution { message: String, stderr: Option<String> },

    /// Tool output was not structured data. Degrades to raw text.
    #[error("Could not parse JSON output: {0}")]
    Parse(String),

    /// Library-level failure (no registration data, missing profile, bad response)
    #[error("{0}")]
    Lookup(String),

    /// Network failure for URL-based input or remote lookups
    #[error("{0}")]
    Transport(String),
}

impl OsintError {
    pub fn execution(message: impl Into<String>) -> Self {
        OsintError::Execution {
            message: message.into(),
            stderr: None,
        }
    }

    /// Short label used in activity events and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            OsintError::Validation(_) => "validation",
            OsintError::Execution { .. } => "execution",
            OsintError::Parse(_) => "parse",
            OsintError::Lookup(_) => "lookup",
            OsintError::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for OsintError {
    fn from(err: reqwest::Error) -> Self {
        OsintError::Transport(err.to_string())
    }
}

/// Rejected query, returned instead of an InvocationResult
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{warning}")]
pub struct ValidationError {
    pub warning: String,
}

impl ValidationError {
    pub fn new(warning: impl Into<String>) -> Self {
        Self {
            warning: warning.into(),
        }
    }
}

impl From<ValidationError> for OsintError {
    fn from(err: ValidationError) -> Self {
        OsintError::Validation(err.warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(OsintError::Lookup("x".into()).kind(), "lookup");
        assert_eq!(OsintError::execution("boom").kind(), "execution");
        assert_eq!(OsintError::Transport("down".into()).to_string(), "down");
    }

    #[test]
    fn test_validation_converts() {
        let err: OsintError = ValidationError::new("Please enter a domain.").into();
        assert_eq!(err.to_string(), "Please enter a domain.");
        assert_eq!(err.kind(), "validation");
    }
}
