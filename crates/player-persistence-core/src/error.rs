use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("database connection error: {0}")]
    Connection(String),
    #[error("schema initialization error: {0}")]
    Schema(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("malformed player payload: {0}")]
    Payload(String),
    #[error("invalid player id {0}")]
    InvalidPlayerId(String),
}

impl From<player_persistence_config::ConfigError> for CoreError {
    fn from(value: player_persistence_config::ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}
