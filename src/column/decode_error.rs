use thiserror::Error;

/// Failures while turning raw result rows into template-shaped values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// An aggregate query produced no row where exactly one was expected.
    #[error("aggregate query returned no rows")]
    EmptyAggregate,

    #[error("column `{column}` is not nullable but the row holds NULL")]
    UnexpectedNull { column: String },

    #[error("column `{column}` is missing from the row")]
    MissingColumn { column: String },

    #[error("cannot format {value}: {message}")]
    Format { value: String, message: String },

    #[error("cannot deserialize row: {0}")]
    Deserialize(String),
}

impl DecodeError {
    pub fn format(value: &serde_json::Value, message: impl Into<String>) -> Self {
        Self::Format { value: value.to_string(), message: message.into() }
    }
}
