use thiserror::Error;

use crate::location::Location;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("malformed hit data for {target}: {reason}")]
    MalformedHits { target: String, reason: String },

    #[error("negative raw damage {damage} at {location:?}")]
    NegativeDamage { location: Location, damage: i32 },

    #[error("unknown condition id: {0}")]
    UnknownCondition(String),

    #[error("invalid dice notation: {0}")]
    InvalidDice(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
