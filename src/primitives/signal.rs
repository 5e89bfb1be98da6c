// ============================================================================
// weak-signals - Signal
// The owner-side facade: a connect-only view and the full emitting signal
// ============================================================================

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::core::error::{EmitError, SlotResult};
use crate::core::options::SignalOptions;
use crate::dispatch::emit::emit;
use crate::primitives::slot::{MethodFn, Slot, SlotPattern, StrongFn, WrapperFn};
use crate::primitives::table::SlotTable;

// =============================================================================
// SIGNAL VIEW - connect/disconnect only
// =============================================================================

/// The restricted view of a signal: anyone holding it can connect and
/// disconnect, but only the holder of the [`Signal`] can emit.
///
/// An owning type keeps its `Signal` private and hands out `&SignalView`.
///
/// Disconnect calls remove *every* matching connection and return how many
/// were removed.
pub struct SignalView<A: 'static> {
    table: SlotTable<A>,
}

impl<A: 'static> SignalView<A> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            table: SlotTable::with_capacity(capacity),
        }
    }

    /// Connect a method of `owner`. The owner is held weakly: once it is
    /// dropped the connection is skipped and later reclaimed.
    ///
    /// Connecting the same owner and method twice creates two independent
    /// connections that both fire.
    pub fn connect<O: 'static>(&self, owner: &Rc<O>, method: MethodFn<O, A>) {
        self.table.append(Slot::method(owner, method));
    }

    /// Connect a closure that receives the resolved owner. The owner is held
    /// weakly; the closure must not itself capture a strong `Rc` to it.
    ///
    /// The wrapper and the owner are separate `Rc` allocations, so a wrapper
    /// can never alias its own owner.
    pub fn connect_wrapper<O: 'static>(&self, owner: &Rc<O>, wrapper: &WrapperFn<O, A>) {
        self.table.append(Slot::wrapper(owner, wrapper));
    }

    /// Connect a closure with no owner. The connection keeps the closure
    /// alive until it is disconnected or the signal is dropped.
    pub fn strong_connect(&self, closure: &StrongFn<A>) {
        self.table.append(Slot::strong(closure));
    }

    /// Wrap `f` in a [`StrongFn`], connect it, and return the handle needed
    /// to disconnect it later.
    pub fn strong_connect_fn(&self, f: impl Fn(&A) -> SlotResult + 'static) -> StrongFn<A> {
        let closure: StrongFn<A> = Rc::new(f);
        self.strong_connect(&closure);
        closure
    }

    /// Remove every connection of `method` on `owner`.
    ///
    /// Methods are matched by function-pointer address. Rust does not
    /// promise one address per function: two identical bodies may be merged,
    /// and one function may get different addresses in different codegen
    /// units. Disconnect with the same path the connection used, or match on
    /// the owner alone with [`disconnect_owner`](Self::disconnect_owner).
    pub fn disconnect<O: 'static>(&self, owner: &Rc<O>, method: MethodFn<O, A>) -> usize {
        self.remove(SlotPattern::method(owner, method))
    }

    /// Remove every connection of `wrapper` on `owner`.
    pub fn disconnect_wrapper<O: 'static>(&self, owner: &Rc<O>, wrapper: &WrapperFn<O, A>) -> usize {
        self.remove(SlotPattern::wrapper(owner, wrapper))
    }

    /// Remove every connection bound to `owner`, whatever its callback.
    pub fn disconnect_owner<O: 'static>(&self, owner: &Rc<O>) -> usize {
        self.remove(SlotPattern::owner(owner))
    }

    /// Remove every strong connection of `closure`.
    pub fn strong_disconnect(&self, closure: &StrongFn<A>) -> usize {
        self.remove(SlotPattern::strong(closure))
    }

    fn remove(&self, pattern: SlotPattern) -> usize {
        let removed = self.table.mark_dead(|slot| slot.matches(&pattern));
        if removed > 0 {
            // No-op while an emit is running; that emit compacts on exit
            self.table.compact();
        }
        removed
    }

    /// Number of connections that would currently fire.
    pub fn len(&self) -> usize {
        self.table.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an emit is currently running on this signal.
    pub fn is_emitting(&self) -> bool {
        self.table.is_emitting()
    }

    /// Physical table length, including dead connections not yet reclaimed.
    pub fn capacity_used(&self) -> usize {
        self.table.len()
    }
}

impl<A: 'static> fmt::Debug for SignalView<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalView")
            .field("live", &self.table.live_count())
            .field("slots", &self.table.len())
            .field("emitting", &self.table.is_emitting())
            .finish()
    }
}

// =============================================================================
// SIGNAL - full view with emit
// =============================================================================

/// A typed event source that calls its connected slots in connect order.
///
/// `Signal<A>` derefs to [`SignalView<A>`] for connecting; only code with
/// access to the `Signal` itself can [`emit`](Signal::emit).
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use weak_signals::{Signal, SlotResult};
///
/// struct Label {
///     text: RefCell<String>,
/// }
///
/// impl Label {
///     fn on_changed(&self, (text, n): &(String, i32)) -> SlotResult {
///         *self.text.borrow_mut() = format!("{text}:{n}");
///         Ok(())
///     }
/// }
///
/// let changed: Signal<(String, i32)> = Signal::new();
/// let label = Rc::new(Label { text: RefCell::new(String::new()) });
///
/// changed.connect(&label, Label::on_changed);
/// changed.emit(("hello".to_string(), 5)).unwrap();
/// assert_eq!(*label.text.borrow(), "hello:5");
///
/// // Dropping the label silently ends the connection
/// drop(label);
/// changed.emit(("x".to_string(), 1)).unwrap();
/// assert!(changed.is_empty());
/// ```
pub struct Signal<A: 'static> {
    view: SignalView<A>,
    options: SignalOptions,
}

impl<A: 'static> Signal<A> {
    pub fn new() -> Self {
        Self::with_options(SignalOptions::default())
    }

    pub fn with_options(options: SignalOptions) -> Self {
        Self {
            view: SignalView::with_capacity(options.capacity),
            options,
        }
    }

    /// The connect-only view to hand out to other code.
    pub fn view(&self) -> &SignalView<A> {
        &self.view
    }

    pub fn options(&self) -> &SignalOptions {
        &self.options
    }

    /// Call every live slot with `args`.
    ///
    /// Every slot in the snapshot is attempted even if earlier ones fail;
    /// failures come back together as one [`EmitError`].
    pub fn emit(&self, args: A) -> Result<(), EmitError> {
        self.emit_ref(&args)
    }

    /// Like [`emit`](Signal::emit), borrowing the arguments.
    pub fn emit_ref(&self, args: &A) -> Result<(), EmitError> {
        emit(&self.view.table, args, &self.options)
    }
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Deref for Signal<A> {
    type Target = SignalView<A>;

    fn deref(&self) -> &SignalView<A> {
        &self.view
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("live", &self.view.table.live_count())
            .field("slots", &self.view.table.len())
            .field("options", &self.options)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
