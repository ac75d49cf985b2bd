pub mod base;
pub mod http_provider;
pub mod local_provider;

// Re-export from base.rs so we can do "use crate::provider::*;"
pub use base::{
    create_session_provider, ChangeListener, ProviderConfig, ProviderSubscription, SessionChange,
    SessionProvider,
};
