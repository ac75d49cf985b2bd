pub mod reconciler;

// Re-export so code outside can do "use crate::callback::CallbackReconciler;"
pub use reconciler::{CallbackPhase, CallbackReconciler};
