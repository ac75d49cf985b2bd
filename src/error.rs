use thiserror::Error;

/// Failure taxonomy for the reconciliation core. No variant is fatal to the
/// process: every failure degrades to a conservative auth phase instead of
/// crashing or leaving stale credentials visible.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport or provider failure while talking to the identity
    /// provider. "No session" is a normal fetch result, never this error.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The remote sign-out request failed. Local state is cleared anyway.
    #[error("remote sign-out failed: {0}")]
    SignOutFailed(String),

    /// The persisted cache record could not be parsed. Callers treat the
    /// record as absent; the cache clears it.
    #[error("persisted cache record corrupt: {0}")]
    CacheCorrupt(String),

    /// The persisted cache could not be read or written.
    #[error("persisted cache unavailable: {0}")]
    CacheUnavailable(String),
}
