//! Application-level error surface.

use thiserror::Error;

/// Anything the assistant can fail with. Bootstrap errors end the process
/// (with a diagnostic, via the `Result` out of `main`); per-turn errors are
/// reported to the user and the session continues.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cards(#[from] cardvault::CardError),

    #[error(transparent)]
    Rules(#[from] rulesmith::RuleError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("completion failed: {0}")]
    Completion(String),

    #[error("could not extract SQL from the model response: {0}")]
    Sql(String),

    #[error("could not parse sub-question plan: {0}")]
    Plan(String),

    #[error("configuration error: {0}")]
    Config(String),
}
