use thiserror::Error;

/// Every fallible engine entry point returns `Result<T, FireError>`.
///
/// An unreachable FIRE goal is not an error: it comes back as data with
/// `reachable == false`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl FireError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FireError::InvalidInput(msg.into())
    }
}
