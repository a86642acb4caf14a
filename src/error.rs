// MIT License - Copyright (c) 2026 Peter Wright

/// All errors that can occur while running the alarm panel.
///
/// Alarm conditions (wrong code lockout, sensor trips, entry timeout) are not
/// errors: they are panel states carrying an `AlarmCause`. These variants cover
/// configuration mistakes and failures of the hardware collaborators.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid access code ({length} characters): {reason}")]
    InvalidAccessCode { length: usize, reason: String },

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("Hardware read failed: {details}")]
    Hardware { details: String },
}

impl PanelError {
    /// Whether the polling loop may log this error and carry on with the next pass.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PanelError::Hardware { .. } | PanelError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(PanelError::Hardware { details: "bus".into() }.is_recoverable());
        assert!(PanelError::Io(std::io::Error::other("gpio")).is_recoverable());
        assert!(
            !PanelError::InvalidConfig { details: "x".into() }.is_recoverable()
        );
    }

    #[test]
    fn test_error_display() {
        let err = PanelError::InvalidAccessCode {
            length: 4,
            reason: "only digit keys are allowed".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid access code (4 characters): only digit keys are allowed"
        );
    }
}
