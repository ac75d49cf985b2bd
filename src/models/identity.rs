use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The user record as the identity provider returns it on the wire. Only
/// the fields below survive deserialization; anything else the provider
/// sends is dropped at this boundary and never reaches memory or storage.
#[derive(Deserialize, Debug, Clone)]
pub struct ProviderUser {
    pub id: String,
    pub email: Option<String>,
    pub user_metadata: Option<ProviderUserMetadata>,
}

/// The metadata keys we accept from the provider payload.
#[derive(Deserialize, Debug, Clone)]
pub struct ProviderUserMetadata {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub full_name: Option<String>,
}

/// The narrowed projection of the authenticated user held in memory and
/// mirrored to the persisted cache.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct Identity {
    /// Opaque stable identifier assigned by the provider.
    pub id: String,
    pub email: Option<String>,
    pub metadata: Option<IdentityMetadata>,
}

/// The retained metadata subset: display name, avatar, full name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
pub struct IdentityMetadata {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub full_name: Option<String>,
}

impl Identity {
    /// Narrow a provider user payload down to the retained subset.
    pub fn narrowed_from(user: ProviderUser) -> Self {
        Identity {
            id: user.id,
            email: user.email,
            metadata: user.user_metadata.map(|m| IdentityMetadata {
                display_name: m.name,
                avatar_url: m.avatar_url,
                full_name: m.full_name,
            }),
        }
    }
}
