//! Error types for the tether-engine crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] tether_store::StoreError),

    #[error("Unknown entity type: {kind}")]
    UnknownType { kind: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
