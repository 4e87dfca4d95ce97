use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProformaError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Invalid assumption: {field} — {reason}")]
    InvalidAssumption { field: String, reason: String },

    #[error("Invalid cash flow: {0}")]
    InvalidCashFlow(String),

    #[error(
        "No root found: NPV kept its sign on [{lo}, {hi}] after {expansions} bracket expansions"
    )]
    NoRootFound { expansions: u32, lo: f64, hi: f64 },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ProformaError {
    fn from(e: serde_json::Error) -> Self {
        ProformaError::SerializationError(e.to_string())
    }
}
