use thiserror::Error;

/// The core's exit contract: either a list of commands, or exactly one of
/// these. No other effect escapes the evaluator.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid site configuration: {message} (source: {source_fragment})")]
    ConfigError {
        message: String,
        source_fragment: String,
    },

    #[error("assertion failed at {structure_path:?}: {message}")]
    AssertionFailed {
        message: String,
        structure_path: Vec<usize>,
    },

    #[error("component {source_string} failed: {detail}")]
    RuntimeComponentError {
        source_string: String,
        detail: String,
    },
}

impl CoreError {
    pub fn config<M, S>(message: M, source_fragment: S) -> Self
    where
        M: Into<String>,
        S: Into<String>,
    {
        CoreError::ConfigError {
            message: message.into(),
            source_fragment: source_fragment.into(),
        }
    }

    pub fn assertion_failed<M>(message: M, structure_path: Vec<usize>) -> Self
    where
        M: Into<String>,
    {
        CoreError::AssertionFailed {
            message: message.into(),
            structure_path,
        }
    }

    pub fn runtime<S, D>(source_string: S, detail: D) -> Self
    where
        S: Into<String>,
        D: Into<String>,
    {
        CoreError::RuntimeComponentError {
            source_string: source_string.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
