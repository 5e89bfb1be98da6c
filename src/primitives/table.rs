// ============================================================================
// weak-signals - Slot Table
//
// Ordered storage for a signal's slots. Insertion order is call order.
//
// Structural rules while an emit is in progress:
// - append only ever writes past the emit snapshot
// - mark_dead only turns live slots into sentinels in place
// - compaction is deferred to the outermost emit frame
//
// No RefCell borrow is ever held across a slot call, so callbacks are free
// to connect, disconnect and emit on the same signal.
// ============================================================================

use std::cell::{Cell, RefCell};

use crate::primitives::slot::{Invocation, Prepared, Slot};

/// Ordered, growable collection of slots with an adjacent emit flag.
pub struct SlotTable<A> {
    slots: RefCell<Vec<Slot<A>>>,

    /// Set while the outermost emit frame is running
    emitting: Cell<bool>,
}

impl<A: 'static> SlotTable<A> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RefCell::new(Vec::with_capacity(capacity)),
            emitting: Cell::new(false),
        }
    }

    /// Append a slot at the end, returning its index.
    ///
    /// Growing the backing vector moves every slot into the new storage, so
    /// order and each slot's single weak registration are preserved.
    pub fn append(&self, slot: Slot<A>) -> usize {
        let mut slots = self.slots.borrow_mut();
        tracing::trace!(index = slots.len(), key = ?slot.key(), "slot connected");
        slots.push(slot);
        slots.len() - 1
    }

    /// Reset every slot matching `predicate` to the sentinel, in place.
    ///
    /// Never shrinks the table, so it is safe while an emit is running.
    /// Returns the number of slots reset.
    pub fn mark_dead(&self, mut predicate: impl FnMut(&Slot<A>) -> bool) -> usize {
        // Dropped after the borrow ends: a callback's captures may re-enter
        let mut released = Vec::new();
        {
            let mut slots = self.slots.borrow_mut();
            for slot in slots.iter_mut().filter(|slot| predicate(slot)) {
                released.push(slot.take());
            }
        }
        let count = released.len();
        if count > 0 {
            tracing::trace!(count, "slots disconnected");
        }
        drop(released);
        count
    }

    /// Remove dead slots, keeping live ones in their relative order.
    ///
    /// Refused while an emit is in progress; returns whether it ran.
    pub fn compact(&self) -> bool {
        if self.emitting.get() {
            return false;
        }

        // Dead owners' callbacks are dropped after the borrow ends
        let mut released = Vec::new();
        {
            let mut slots = self.slots.borrow_mut();
            let before = slots.len();
            let mut kept = Vec::with_capacity(before);
            for slot in slots.drain(..) {
                if slot.is_live() {
                    kept.push(slot);
                } else {
                    released.push(slot);
                }
            }
            *slots = kept;
            if before != slots.len() {
                tracing::trace!(before, after = slots.len(), "slot table compacted");
            }
        }
        drop(released);
        true
    }

    /// Physical length, including dead slots not yet compacted.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Number of slots that would currently dispatch.
    pub fn live_count(&self) -> usize {
        self.slots.borrow().iter().filter(|slot| slot.is_live()).count()
    }

    /// Whether an emit is running on this table.
    pub fn is_emitting(&self) -> bool {
        self.emitting.get()
    }

    // =========================================================================
    // EMIT SUPPORT
    // =========================================================================

    /// Enter an emit frame. Returns true if this is the outermost frame.
    pub(crate) fn enter_emit(&self) -> bool {
        !self.emitting.replace(true)
    }

    /// Leave the outermost emit frame.
    pub(crate) fn exit_emit(&self) {
        self.emitting.set(false);
    }

    /// Resolve the slot at `index` for a call.
    ///
    /// With `shift > 0` a live slot is first moved down into the sentinel at
    /// `index - shift`. Only the outermost frame passes a non-zero shift.
    /// A slot found dead is dropped only after the borrow is released.
    pub(crate) fn prepare_at(&self, index: usize, shift: usize) -> Option<Invocation<A>> {
        let prepared = {
            let mut slots = self.slots.borrow_mut();
            let prepared = slots.get_mut(index)?.prepare();
            if shift > 0 && matches!(prepared, Prepared::Call(_)) {
                let moved = slots[index].take();
                slots[index - shift] = moved;
            }
            prepared
        };
        prepared.into_invocation()
    }

    /// Drop the `dead` sentinels that end at `end`, the outermost frame's
    /// snapshot length. Slots appended during the emit shift down.
    pub(crate) fn close_gap(&self, end: usize, dead: usize) {
        if dead == 0 {
            return;
        }
        let mut slots = self.slots.borrow_mut();
        let end = end.min(slots.len());
        let start = end.saturating_sub(dead);
        debug_assert!(slots[start..end].iter().all(Slot::is_dead));
        slots.drain(start..end);
        tracing::trace!(removed = end - start, len = slots.len(), "emit compacted slots");
    }

    #[cfg(test)]
    pub(crate) fn is_dead_at(&self, index: usize) -> bool {
        self.slots.borrow().get(index).is_none_or(Slot::is_dead)
    }
}

impl<A: 'static> Default for SlotTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Drop for SlotTable<A> {
    fn drop(&mut self) {
        let slots = std::mem::take(self.slots.get_mut());
        let remaining = slots.iter().filter(|slot| !slot.is_dead()).count();
        if remaining > 0 {
            tracing::trace!(remaining, "slot table dropped, releasing connections");
        }
        // Each slot drops its weak handle, releasing the owner's weak count
        drop(slots);
    }
}

// =============================================================================
// TESTS
// =============================================================================
