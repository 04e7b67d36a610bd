use thiserror::Error;

/// Errors raised at the simulation boundary.
///
/// None of these are fatal to a session: setters reject the change and
/// keep the previous state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// An unrecognized statistic or distribution name.
    #[error("invalid {kind} value: {value}. Must be one of: {expected}")]
    InvalidSelection {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    /// More elements requested without replacement than the pool holds.
    #[error("more elements taken than available: requested {requested}, pool has {available}")]
    InsufficientPool { requested: usize, available: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
