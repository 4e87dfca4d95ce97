pub mod aggregate;
pub mod cash_flow;
pub mod error;
pub mod irr;
pub mod sampler;
pub mod simulation;
pub mod types;

pub use error::ProformaError;
pub use types::*;

/// Standard result type for all proforma operations
pub type ProformaResult<T> = Result<T, ProformaError>;
