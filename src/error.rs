use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FuzzyError {
    /// Malformed rule text. `token` is the token the parser stopped at, if any.
    #[error("syntax error: {message}")]
    Syntax { message: String, token: Option<String> },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl FuzzyError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            token: None,
        }
    }

    pub(crate) fn syntax_at(message: impl Into<String>, token: &str) -> Self {
        Self::Syntax {
            message: message.into(),
            token: Some(token.to_owned()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FuzzyError>;
