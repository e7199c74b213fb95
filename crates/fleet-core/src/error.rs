//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `FleetError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// The base error type shared by the `fleet-*` crates.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `fleet-core`.
pub type FleetResult<T> = Result<T, FleetError>;
