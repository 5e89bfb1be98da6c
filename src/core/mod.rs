// ============================================================================
// weak-signals - Core Module
// Weak owner handles, errors, and options shared by every signal
// ============================================================================

pub mod error;
pub mod options;
pub mod weak;

// Re-export commonly used items
pub use error::{EmitError, FailureKind, SlotFailure, SlotResult};
pub use options::SignalOptions;
pub use weak::{OwnerAddr, WeakHandle};
