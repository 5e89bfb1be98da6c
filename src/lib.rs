// ============================================================================
// weak-signals - Signal/Slot Dispatch for Rust
// ============================================================================
//
// An owning object broadcasts typed events to an ordered set of slots.
// Slots bound to an owner hold it weakly: connecting never extends the
// owner's lifetime, and connections to dropped owners are skipped and
// reclaimed without an explicit disconnect.
//
// Emit is reentrant: a slot may emit on, connect to, or disconnect from the
// signal that is calling it. Every slot in an emit pass runs even if earlier
// ones fail; failures are reported together afterwards.
// ============================================================================

pub mod core;
pub mod dispatch;
pub mod primitives;

// Re-export core items at crate root for ergonomic access
pub use crate::core::error::{EmitError, FailureKind, SlotFailure, SlotResult};
pub use crate::core::options::SignalOptions;
pub use crate::core::weak::{OwnerAddr, WeakHandle};

// Re-export primitives at crate root
pub use primitives::signal::{Signal, SignalView};
pub use primitives::slot::{
    Convention, Invocation, MethodFn, Prepared, Slot, SlotKey, SlotPattern, StrongFn, WrapperFn,
};
pub use primitives::table::SlotTable;

// =============================================================================
// TESTS
// =============================================================================
