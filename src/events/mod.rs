pub mod broadcaster;

// Re-export the primary items so code outside can do
// "use crate::events::{EventBroadcaster, EventKind};"
pub use broadcaster::{AuthEvent, EventBroadcaster, EventKind, EventSubscription};
