// ============================================================================
// weak-signals - Dispatch Module
// The emit engine: snapshot iteration, compaction, failure aggregation
// ============================================================================

pub mod emit;

pub use emit::emit;
