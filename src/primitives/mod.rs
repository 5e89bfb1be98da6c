// ============================================================================
// weak-signals - Primitives Module
// Slots, the slot table, and the signal facade
// ============================================================================

pub mod signal;
pub mod slot;
pub mod table;

// Re-export for convenience
pub use signal::{Signal, SignalView};
pub use slot::{
    Convention, Invocation, MethodFn, Prepared, Slot, SlotKey, SlotPattern, StrongFn, WrapperFn,
};
pub use table::SlotTable;
