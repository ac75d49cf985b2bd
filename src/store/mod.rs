pub mod store;

// Re-export the primary store items so code outside can do
// "use crate::store::SessionStore;"
pub use store::{SessionSnapshot, SessionStore};
