// ============================================================================
// weak-signals - Signal Options
// ============================================================================

/// Options for creating a signal.
///
/// # Example
///
/// ```
/// use weak_signals::{Signal, SignalOptions};
///
/// let signal: Signal<u32> = Signal::with_options(SignalOptions {
///     capacity: 8,
///     ..SignalOptions::default()
/// });
/// assert!(signal.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalOptions {
    /// Number of slots to reserve up front.
    pub capacity: usize,

    /// Capture panics raised by slot bodies and report them as failures
    /// in the aggregated [`EmitError`](crate::EmitError), continuing with
    /// the remaining slots. When false a panic unwinds out of `emit`
    /// after the slot table has been restored to a consistent state.
    pub catch_panics: bool,
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            capacity: 0,
            catch_panics: true,
        }
    }
}
