//! Error taxonomy for connection generation and resolution.
//!
//! Configuration and argument errors are raised before any query is issued;
//! cursor and upstream errors reject a single resolution and leave the
//! context and caches untouched. Nothing here is retried internally.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type RelayResult<T> = Result<T, RelayError>;

/// All failure modes surfaced by this crate.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Missing or inconsistent configuration, detected fail-fast with no
    /// partial state left behind.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A cursor that could not be decoded, or that carries a key shape
    /// inconsistent with the field's current ordering.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// Connection arguments that violate the Relay convention, such as
    /// supplying both `first` and `last`.
    #[error("invalid connection arguments: {0}")]
    InvalidArgument(String),

    /// Two distinct type shapes were requested under the same derived name.
    /// A schema cannot declare two different types with one name, so this is
    /// reported instead of silently merging.
    #[error("schema collision: `{name}` was already declared with a different shape")]
    SchemaCollision { name: String },

    /// Opaque pass-through from the ORM layer. Retry policy belongs to the
    /// ORM, not to this crate.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}
