/// Result alias that carries the custom [`FormCoachError`] type.
pub type Result<T> = std::result::Result<T, FormCoachError>;

/// Common error type for the core crate.
///
/// Frame processing never fails; only building a session, parsing an
/// exercise name or loading configuration and recordings can.
#[derive(Debug, thiserror::Error)]
pub enum FormCoachError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON in a configuration file or frame recording.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The exercise identifier does not name one of the supported kinds.
    #[error("unknown exercise `{0}`")]
    UnknownExercise(String),
    /// A configuration value is outside the range the engine can work with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl FormCoachError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for FormCoachError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for FormCoachError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_unknown_exercise() {
        let err = FormCoachError::UnknownExercise("burpees".to_string());
        assert_eq!(err.to_string(), "unknown exercise `burpees`");
    }

    #[test]
    fn converts_plain_strings() {
        let err: FormCoachError = "replay aborted".into();
        assert!(matches!(err, FormCoachError::Message(_)));
    }
}
