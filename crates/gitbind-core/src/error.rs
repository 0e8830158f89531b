//! Error taxonomy for native library resolution and version negotiation.

/// Errors surfaced by the native loader and the version grammar.
///
/// Everything propagates to the immediate caller; nothing is logged and
/// swallowed internally. There is no degraded mode: either the native library
/// is fully usable or every operation requiring it fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The search path cannot change once the native library has been loaded.
    #[error("native library already loaded, search path can no longer be changed")]
    ConfigurationLocked,

    #[error("native library not found: {0}")]
    NotFound(String),

    #[error("failed to load native library: {0}")]
    LoadFailed(String),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("malformed version string: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
