use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration value for '{key}': {reason}")]
    Config { key: String, reason: String },

    #[error("Missing configuration key '{key}'")]
    MissingKey { key: String },

    #[error("Social class '{class}' refers to unknown social group {group_id}")]
    UnknownGroup { class: String, group_id: u32 },

    #[error("Social class '{class}' refers to unknown car type '{car_name}'")]
    UnknownCarType { class: String, car_name: String },

    #[error("Malformed customer attribute entry '{entry}'")]
    MalformedAttribute { entry: String },

    #[error("Social class '{class}' has no {what} configured")]
    IncompleteClass { class: String, what: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EvResult<T> = Result<T, EvError>;
