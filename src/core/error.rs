use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid symbol {ch:?} at position {position} in tracking id '{id}' (Code 128 accepts ASCII only)")]
    InvalidSymbol {
        ch: char,
        position: usize,
        id: String,
    },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(#[from] validator::ValidationErrors),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LabelError>;
