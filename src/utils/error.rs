use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("Field resolution failed for {type_name}::{field}: {reason}")]
    FieldResolution {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("Invalid date-time '{value}': {reason}")]
    DateParse { value: String, reason: String },

    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("Entity {name} not found")]
    EntityNotFound { name: String },

    #[error("Undefined attribute {type_name}::{attribute}")]
    UndefinedAttribute {
        type_name: String,
        attribute: String,
    },

    #[error("Cannot add element: no integer key follows {last}")]
    CollectionKeyExhausted { last: usize },

    #[error("Type mismatch on field '{field}': {message}")]
    TypeMismatch { field: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Payload,
    Entity,
    Format,
    Config,
    System,
}

impl MarshalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarshalError::FieldResolution { .. } => ErrorCategory::Schema,
            MarshalError::DateParse { .. }
            | MarshalError::MalformedPayload { .. }
            | MarshalError::TypeMismatch { .. }
            | MarshalError::CollectionKeyExhausted { .. }
            | MarshalError::Serialization(_) => ErrorCategory::Payload,
            MarshalError::EntityNotFound { .. } => ErrorCategory::Entity,
            MarshalError::UndefinedAttribute { .. } => ErrorCategory::Format,
            MarshalError::ConfigError { .. }
            | MarshalError::InvalidConfigValue { .. }
            | MarshalError::MissingConfig { .. } => ErrorCategory::Config,
            MarshalError::Io(_) => ErrorCategory::System,
        }
    }

    /// 給 CLI 使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            MarshalError::MalformedPayload { .. } | MarshalError::Serialization(_) => {
                format!("Input is not a valid JSON object: {}", self)
            }
            MarshalError::DateParse { value, .. } => {
                format!("'{}' is not an RFC3339 / ISO-8601 date-time", value)
            }
            MarshalError::Io(e) => format!("Could not read or write a file: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Schema => "Check the field declarations of the transfer object schema",
            ErrorCategory::Payload => "Check the input payload shape and value types",
            ErrorCategory::Entity => "Register the entity type before projecting onto it",
            ErrorCategory::Format => "Check the aliases used in the format template",
            ErrorCategory::Config => "Check the TOML configuration file and environment variables",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarshalError>;
