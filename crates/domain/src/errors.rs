use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // シナリオ定義関連のエラー
    #[error("Unknown exec function: {0}")]
    UnknownExec(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },
}

impl DomainError {
    pub fn invalid_scenario(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScenario {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
