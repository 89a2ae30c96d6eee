use std::fmt;

#[derive(Debug)]
pub enum MemoError {
    InvalidArgument { target: i64 },
    Configuration(String),
    DependencyHazard { index: usize, reason: String },
    Overflow { index: usize },
    RecurrencePanicked { index: usize, message: String },
    LockPoisoned(String),
    Other(String),
}

impl fmt::Display for MemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoError::InvalidArgument { target } => {
                write!(f, "Invalid argument: target {} must be a non-negative index", target)
            }
            MemoError::Configuration(e) => write!(f, "Configuration error: {}", e),
            MemoError::DependencyHazard { index, reason } => {
                write!(f, "Dependency hazard at index {}: {}", index, reason)
            }
            MemoError::Overflow { index } => {
                write!(f, "Overflow: value at index {} does not fit in 64 bits", index)
            }
            MemoError::RecurrencePanicked { index, message } => {
                write!(f, "Recurrence panicked at index {}: {}", index, message)
            }
            MemoError::LockPoisoned(e) => write!(f, "Lock poisoned: {}", e),
            MemoError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for MemoError {}

impl<T> From<std::sync::PoisonError<T>> for MemoError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        MemoError::LockPoisoned(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for MemoError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        MemoError::Configuration(format!("failed to start fill workers: {}", err))
    }
}

impl From<serde_json::Error> for MemoError {
    fn from(err: serde_json::Error) -> Self {
        MemoError::Other(format!("failed to encode stats: {}", err))
    }
}

impl From<String> for MemoError {
    fn from(err: String) -> Self {
        MemoError::Other(err)
    }
}

impl From<&str> for MemoError {
    fn from(err: &str) -> Self {
        MemoError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_target_and_precondition() {
        let err = MemoError::InvalidArgument { target: -1 };
        assert_eq!(
            err.to_string(),
            "Invalid argument: target -1 must be a non-negative index"
        );

        let err = MemoError::DependencyHazard { index: 7, reason: "index 5 missing".to_string() };
        assert!(err.to_string().contains("index 7"));
        assert!(err.to_string().contains("index 5 missing"));

        let err = MemoError::RecurrencePanicked { index: 50, message: "boom".to_string() };
        assert_eq!(err.to_string(), "Recurrence panicked at index 50: boom");
    }

    #[test]
    fn test_from_str_is_other() {
        let err: MemoError = "boom".into();
        assert!(matches!(err, MemoError::Other(ref s) if s == "boom"));
    }
}
