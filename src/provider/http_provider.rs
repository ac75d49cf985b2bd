use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::models::{Identity, ProviderSession, ProviderUser, SessionHandle};
use crate::provider::base::{
    ChangeHub, ChangeListener, ProviderSubscription, SessionChange, SessionProvider,
};

/// The config needed for the HTTP session provider.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct HttpProviderConfig {
    /// Base URI of the identity provider's session surface.
    pub uri: String,
    /// A friendly name for logs.
    pub name: String,
}

/// Wire shape of the provider's session endpoint. A `null` session is the
/// normal "not signed in" answer. The user payload inside is narrowed on
/// deserialization; see `ProviderUser`.
#[derive(Deserialize, Debug)]
struct SessionEnvelope {
    session: Option<WireSession>,
}

#[derive(Deserialize, Debug)]
struct WireSession {
    handle: String,
    user: ProviderUser,
}

/// A provider that talks to the identity provider's REST session surface.
pub struct HttpSessionProvider {
    config: HttpProviderConfig,
    client: reqwest::Client,
    hub: ChangeHub,
}

impl HttpSessionProvider {
    pub fn new(config: &HttpProviderConfig) -> Self {
        info!(
            "Creating HTTP session provider '{}' for {}",
            config.name, config.uri
        );
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            hub: ChangeHub::default(),
        }
    }
}

#[async_trait::async_trait]
impl SessionProvider for HttpSessionProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "http"
    }

    async fn fetch_current_session(&self) -> Result<Option<ProviderSession>, SessionError> {
        let url = format!("{}/session", self.config.uri);
        debug!("Fetching current session from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            SessionError::ProviderUnavailable(format!("error sending request: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(SessionError::ProviderUnavailable(format!(
                "session endpoint returned {}",
                response.status()
            )));
        }

        let envelope: SessionEnvelope = response.json().await.map_err(|e| {
            SessionError::ProviderUnavailable(format!("error parsing session payload: {}", e))
        })?;

        Ok(envelope.session.map(|wire| ProviderSession {
            handle: SessionHandle::new(wire.handle),
            identity: Identity::narrowed_from(wire.user),
        }))
    }

    fn subscribe(&self, listener: ChangeListener) -> ProviderSubscription {
        self.hub.register(listener)
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        let url = format!("{}/logout", self.config.uri);
        debug!("Requesting remote sign-out at {}", url);

        let result = match self.client.post(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(SessionError::SignOutFailed(format!(
                "logout endpoint returned {}",
                response.status()
            ))),
            Err(e) => Err(SessionError::SignOutFailed(format!(
                "error sending request: {}",
                e
            ))),
        };

        if let Err(ref e) = result {
            warn!("Remote sign-out failed: {}", e);
        }

        // The provider-side session is gone, or unreachable, either way.
        self.hub.emit(SessionChange::SignedOut, None);
        result
    }
}
