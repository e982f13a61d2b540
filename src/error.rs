use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Rate limited on {endpoint}")]
    RateLimited { endpoint: String },

    #[error("API error: status={status}, {body}")]
    Api { status: u16, body: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl BotError {
    /// True for failures that came from talking to the network.
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            BotError::Retrieval(_)
                | BotError::RateLimited { .. }
                | BotError::Api { .. }
                | BotError::Http(_)
        )
    }
}

pub type BotResult<T> = Result<T, BotError>;
