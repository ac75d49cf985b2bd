use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// Opaque reference to the provider's live session. The value inside is
/// handed back to the provider verbatim; the core never parses it and,
/// since the type is not serializable, it cannot reach the persisted
/// cache.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(value: impl Into<String>) -> Self {
        SessionHandle(value.into())
    }

    /// The raw opaque value, for handing back to the provider.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Redacted: session handles must not leak into logs.
impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionHandle(***)")
    }
}

/// A live session as reported by the provider: the opaque handle plus the
/// narrowed identity. The pair is updated as one unit, never independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub handle: SessionHandle,
    pub identity: Identity,
}

/// The store's authentication status.
///
/// `Initializing` is the state before the first authoritative answer and
/// must never be read as a definitive "logged out" signal. `SigningOut` is
/// the transient sub-state while a sign-out is in flight; it suppresses
/// stale renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    Initializing,
    Authenticated,
    Anonymous,
    SigningOut,
}

impl AuthPhase {
    pub fn is_authenticated(self) -> bool {
        matches!(self, AuthPhase::Authenticated)
    }
}
