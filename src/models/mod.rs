pub mod identity;
pub mod session;

// Re-export the model types so code outside can do "use crate::models::*;"
pub use identity::{Identity, IdentityMetadata, ProviderUser, ProviderUserMetadata};
pub use session::{AuthPhase, ProviderSession, SessionHandle};
