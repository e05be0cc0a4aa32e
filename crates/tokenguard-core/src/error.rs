//! Authentication error types.

use thiserror::Error;

/// Errors raised while registering principal types or running guards.
///
/// A failed token lookup or a rejected request is not an error: those are
/// reported through [`GuardOutcome`](crate::guard::GuardOutcome).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The principal type does not satisfy the naming contract.
    #[error("unknown principal type: {0}")]
    UnknownPrincipalType(String),

    /// Two distinct principal types derive the same guard names.
    #[error(
        "guard name collision: '{name}' is already derived from '{existing}', \
         cannot derive it from '{requested}'"
    )]
    GuardNameCollision {
        /// The derived name both types map to.
        name: String,
        /// Principal type that already owns the name.
        existing: String,
        /// Principal type being registered.
        requested: String,
    },

    /// A guard was invoked by a name the component does not expose.
    #[error("unknown guard: {0}")]
    UnknownGuard(String),

    /// The principal store could not answer a lookup.
    #[error("principal store error: {0}")]
    Store(String),

    /// The session-based fallback strategy failed.
    #[error("fallback strategy error: {0}")]
    Fallback(String),

    /// Invalid configuration or registration options.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
