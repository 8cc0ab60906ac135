//! Error types for checkout_core

use crate::types::Barcode;
use thiserror::Error;

/// Errors raised by the checkout pipeline.
///
/// Only structural problems surface here. Data-quality issues (noisy events,
/// unknown customers, weak weight matches) are dropped and logged instead.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Missing store metadata for key '{0}'")]
    MissingMetadata(String),

    #[error(
        "Gondola {gondola}: {timestamps} timestamps but rolling statistics span {stats} samples"
    )]
    DimensionMismatch {
        gondola: u32,
        timestamps: usize,
        stats: usize,
    },

    #[error("Unknown product {0}")]
    UnknownProduct(Barcode),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
