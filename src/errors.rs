use thiserror::Error;

/// Result alias used across the portal wizard.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Failures that escape the wizard. Validation problems never appear here;
/// they surface as blocked commands and gated controls instead.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid step layout: {0}")]
    InvalidStepLayout(String),
    #[error("Unknown step: {0}")]
    UnknownStep(u8),
    #[error("Unknown bank account: {0}")]
    UnknownAccount(i64),
    #[error("Unknown policy: {0}")]
    UnknownPolicy(i64),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Submission failed: {0}")]
    Submission(String),
}

impl PortalError {
    /// True for failures of the network round trip itself,
    /// as opposed to a server that answered with a non-success result.
    pub fn is_transport(&self) -> bool {
        matches!(self, PortalError::Http(_) | PortalError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        let io = PortalError::Io(std::io::Error::new(std::io::ErrorKind::Other, "reset"));
        assert!(io.is_transport());
        assert!(!PortalError::Submission("rejected".into()).is_transport());
        assert!(!PortalError::UnknownStep(9).is_transport());
    }

    #[test]
    fn messages_carry_context() {
        let err = PortalError::InvalidStepLayout("step 2 missing".into());
        assert_eq!(err.to_string(), "Invalid step layout: step 2 missing");
    }
}
