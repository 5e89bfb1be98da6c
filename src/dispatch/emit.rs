// ============================================================================
// weak-signals - Emit
// Reentrant dispatch over a slot table snapshot
// ============================================================================
//
// Each call to `emit` is one frame. A frame visits indices 0..len, where len
// is the table length when the frame started; slots connected later are
// never visited by it.
//
// The first frame on a table is the outermost one. While it runs it moves
// each live slot down over the dead slots it has passed, so that on exit the
// dead slots form one run [len - dead, len) that it removes. Nested frames
// (a slot emitting on its own signal) only dispatch; two frames rewriting
// the same positions would lose slots.
//
// Slot failures never stop a frame. They are collected and returned as one
// EmitError after every slot in the snapshot has been attempted.
// ============================================================================

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::core::error::{EmitError, SlotFailure};
use crate::core::options::SignalOptions;
use crate::primitives::slot::Invocation;
use crate::primitives::table::SlotTable;

// =============================================================================
// EMIT FRAME
// =============================================================================

/// Bookkeeping for one emit call.
///
/// Dropping the outermost frame closes the gap left by dead slots and clears
/// the table's emit flag, also when a slot panic unwinds through `emit`.
struct EmitFrame<'t, A: 'static> {
    table: &'t SlotTable<A>,
    outermost: bool,

    /// Table length when the frame started
    snapshot_len: usize,

    /// Indices handled so far
    cursor: usize,

    /// Dead slots seen so far
    dead: usize,
}

impl<'t, A: 'static> EmitFrame<'t, A> {
    fn enter(table: &'t SlotTable<A>) -> Self {
        let outermost = table.enter_emit();
        Self {
            table,
            outermost,
            snapshot_len: table.len(),
            cursor: 0,
            dead: 0,
        }
    }

    /// Resolve the next slot. `None` means the slot is dead and was skipped.
    fn next_invocation(&mut self, index: usize) -> Option<Invocation<A>> {
        let shift = if self.outermost { self.dead } else { 0 };
        let invocation = self.table.prepare_at(index, shift);
        self.cursor = index + 1;
        if invocation.is_none() {
            self.dead += 1;
        }
        invocation
    }
}

impl<A: 'static> Drop for EmitFrame<'_, A> {
    fn drop(&mut self) {
        if self.outermost {
            self.table.close_gap(self.cursor, self.dead);
            self.table.exit_emit();
        }
    }
}

// =============================================================================
// EMIT
// =============================================================================

/// Call every live slot of `table` with `args`, in connect order.
///
/// Returns `Ok(())` if every slot succeeded (or there were none), otherwise
/// one [`EmitError`] listing each failure in invocation order.
pub fn emit<A: 'static>(
    table: &SlotTable<A>,
    args: &A,
    options: &SignalOptions,
) -> Result<(), EmitError> {
    let mut frame = EmitFrame::enter(table);
    let mut failures = Vec::new();

    for index in 0..frame.snapshot_len {
        let Some(invocation) = frame.next_invocation(index) else {
            continue;
        };
        if let Err(failure) = run_slot(&invocation, args, index, options.catch_panics) {
            failures.push(failure);
        }
    }

    if failures.is_empty() {
        tracing::trace!(
            slots = frame.snapshot_len,
            dead = frame.dead,
            outermost = frame.outermost,
            "emit finished"
        );
    } else {
        tracing::debug!(
            slots = frame.snapshot_len,
            dead = frame.dead,
            failed = failures.len(),
            outermost = frame.outermost,
            "emit finished with slot failures"
        );
    }

    drop(frame);
    match EmitError::from_failures(failures) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Run one slot, turning an error or captured panic into a failure link.
fn run_slot<A>(
    invocation: &Invocation<A>,
    args: &A,
    index: usize,
    catch_panics: bool,
) -> Result<(), SlotFailure> {
    if !catch_panics {
        return invocation
            .call(args)
            .map_err(|error| SlotFailure::failed(index, error));
    }

    match panic::catch_unwind(AssertUnwindSafe(|| invocation.call(args))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(SlotFailure::failed(index, error)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(index, %message, "slot panicked during emit");
            Err(SlotFailure::panicked(index, message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}

// =============================================================================
// TESTS
// =============================================================================
