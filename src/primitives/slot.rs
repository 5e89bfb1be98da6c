// ============================================================================
// weak-signals - Slot
//
// One registered callback in a signal's slot table.
//
// A slot is either live or the dead sentinel. Slots are cleared in place
// (disconnect, owner death) and only physically removed when the table is
// compacted, so indices held by an in-progress emit stay valid.
//
// Three calling conventions:
// - DirectMethod:   fn(&Owner, &Args) bound to a weakly held owner
// - WrapperClosure: Fn(&Owner, &Args) closure, owner weakly held
// - StrongClosure:  Fn(&Args) closure kept alive by the connection
// ============================================================================

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::core::error::SlotResult;
use crate::core::weak::{OwnerAddr, WeakHandle};

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A method-style callback bound to an owner of type `O`.
pub type MethodFn<O, A> = fn(&O, &A) -> SlotResult;

/// A closure invoked with the resolved owner and the emitted arguments.
pub type WrapperFn<O, A> = Rc<dyn Fn(&O, &A) -> SlotResult>;

/// A closure invoked with the emitted arguments only.
pub type StrongFn<A> = Rc<dyn Fn(&A) -> SlotResult>;

/// Owner-erased callback stored in bound slots.
pub type BoundFn<A> = Rc<dyn Fn(&dyn Any, &A) -> SlotResult>;

// =============================================================================
// CONVENTION & IDENTITY
// =============================================================================

/// How a slot's callback is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    DirectMethod,
    WrapperClosure,
    StrongClosure,
}

/// Identity of a connection: owner, entry point, auxiliary data, convention.
///
/// For `DirectMethod` the entry point is the function address and the
/// auxiliary address is the owner. For closures both are the closure's
/// allocation address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub owner: Option<OwnerAddr>,
    pub entry: usize,
    pub aux: usize,
    pub convention: Convention,
}

/// Selects the slots a disconnect call removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPattern {
    /// Every connection bound to this owner.
    Owner(OwnerAddr),
    /// Connections bound to this owner through this entry point.
    Bound {
        owner: OwnerAddr,
        entry: usize,
        convention: Convention,
    },
    /// Strong connections to this closure.
    Strong { entry: usize },
}

fn closure_addr<F: ?Sized>(closure: &Rc<F>) -> usize {
    Rc::as_ptr(closure) as *const () as usize
}

impl SlotPattern {
    pub fn method<O: 'static, A: 'static>(owner: &Rc<O>, method: MethodFn<O, A>) -> Self {
        SlotPattern::Bound {
            owner: OwnerAddr::of(owner),
            entry: method as usize,
            convention: Convention::DirectMethod,
        }
    }

    pub fn wrapper<O: 'static, A: 'static>(owner: &Rc<O>, wrapper: &WrapperFn<O, A>) -> Self {
        SlotPattern::Bound {
            owner: OwnerAddr::of(owner),
            entry: closure_addr(wrapper),
            convention: Convention::WrapperClosure,
        }
    }

    pub fn owner<O: 'static>(owner: &Rc<O>) -> Self {
        SlotPattern::Owner(OwnerAddr::of(owner))
    }

    pub fn strong<A: 'static>(closure: &StrongFn<A>) -> Self {
        SlotPattern::Strong {
            entry: closure_addr(closure),
        }
    }
}

// =============================================================================
// SLOT
// =============================================================================

enum Callback<A> {
    Bound(BoundFn<A>),
    Strong(StrongFn<A>),
}

struct SlotInner<A> {
    key: SlotKey,
    owner: WeakHandle,
    callback: Callback<A>,
}

/// One entry of a slot table. `Slot::dead()` is the empty sentinel.
pub struct Slot<A> {
    inner: Option<SlotInner<A>>,
}

impl<A> Slot<A> {
    /// The dead/empty sentinel.
    pub fn dead() -> Self {
        Self { inner: None }
    }
}

impl<A: 'static> Slot<A> {
    /// Bind a method to a weakly held owner.
    pub fn method<O: 'static>(owner: &Rc<O>, method: MethodFn<O, A>) -> Self {
        let addr = OwnerAddr::of(owner);
        let key = SlotKey {
            owner: Some(addr),
            entry: method as usize,
            aux: addr.addr(),
            convention: Convention::DirectMethod,
        };
        let callback: BoundFn<A> = Rc::new(move |target: &dyn Any, args: &A| {
            match target.downcast_ref::<O>() {
                Some(owner) => method(owner, args),
                None => Err(anyhow::anyhow!("slot owner is not a {}", std::any::type_name::<O>())),
            }
        });

        Self {
            inner: Some(SlotInner {
                key,
                owner: WeakHandle::new(owner),
                callback: Callback::Bound(callback),
            }),
        }
    }

    /// Bind a wrapper closure to a weakly held owner.
    ///
    /// The wrapper is its own `Rc` allocation, so it can never be the owner.
    /// It can still keep the owner alive by capturing a strong `Rc` to it.
    pub fn wrapper<O: 'static>(owner: &Rc<O>, wrapper: &WrapperFn<O, A>) -> Self {
        let addr = OwnerAddr::of(owner);
        let entry = closure_addr(wrapper);

        let key = SlotKey {
            owner: Some(addr),
            entry,
            aux: entry,
            convention: Convention::WrapperClosure,
        };
        let wrapper = wrapper.clone();
        let callback: BoundFn<A> = Rc::new(move |target: &dyn Any, args: &A| {
            match target.downcast_ref::<O>() {
                Some(owner) => wrapper(owner, args),
                None => Err(anyhow::anyhow!("slot owner is not a {}", std::any::type_name::<O>())),
            }
        });

        Self {
            inner: Some(SlotInner {
                key,
                owner: WeakHandle::new(owner),
                callback: Callback::Bound(callback),
            }),
        }
    }

    /// A closure with no owner; the connection keeps it alive.
    pub fn strong(closure: &StrongFn<A>) -> Self {
        let entry = closure_addr(closure);
        Self {
            inner: Some(SlotInner {
                key: SlotKey {
                    owner: None,
                    entry,
                    aux: entry,
                    convention: Convention::StrongClosure,
                },
                owner: WeakHandle::none(),
                callback: Callback::Strong(closure.clone()),
            }),
        }
    }

    /// Resolve the slot for a call.
    ///
    /// A slot whose owner is gone is moved out, leaving the sentinel, and
    /// handed back in [`Prepared::Skip`]. Neither outcome runs user code, so
    /// this is safe under a table borrow; the caller releases the borrow
    /// before calling the invocation or dropping the skipped slot.
    pub fn prepare(&mut self) -> Prepared<A> {
        let Some(inner) = &self.inner else {
            return Prepared::Skip(Slot::dead());
        };
        let invocation = match &inner.callback {
            Callback::Strong(closure) => Some(Invocation::Strong(closure.clone())),
            Callback::Bound(callback) => inner.owner.resolve().map(|owner| Invocation::Bound {
                owner,
                callback: callback.clone(),
            }),
        };
        match invocation {
            Some(invocation) => Prepared::Call(invocation),
            None => {
                tracing::trace!(key = ?inner.key, "slot owner dropped");
                Prepared::Skip(self.take())
            }
        }
    }
}

impl<A> Slot<A> {
    /// Whether this slot matches a disconnect pattern.
    ///
    /// Slots whose owner has died never match, so a new owner that happens
    /// to reuse a freed address cannot claim them.
    pub fn matches(&self, pattern: &SlotPattern) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        let key = &inner.key;
        match *pattern {
            SlotPattern::Owner(owner) => key.owner == Some(owner) && inner.owner.is_alive(),
            SlotPattern::Bound {
                owner,
                entry,
                convention,
            } => {
                key.owner == Some(owner)
                    && key.entry == entry
                    && key.convention == convention
                    && inner.owner.is_alive()
            }
            SlotPattern::Strong { entry } => {
                key.convention == Convention::StrongClosure && key.entry == entry
            }
        }
    }

    /// Clear to the sentinel, releasing the weak handle and callback.
    pub fn reset(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.owner.reset();
        }
    }

    /// Move this slot out, leaving the sentinel behind.
    pub fn take(&mut self) -> Self {
        Self {
            inner: self.inner.take(),
        }
    }

    /// Whether this slot is the sentinel.
    pub fn is_dead(&self) -> bool {
        self.inner.is_none()
    }

    /// Whether this slot would currently dispatch.
    pub fn is_live(&self) -> bool {
        match &self.inner {
            None => false,
            Some(inner) => inner.key.convention == Convention::StrongClosure || inner.owner.is_alive(),
        }
    }

    pub fn key(&self) -> Option<&SlotKey> {
        self.inner.as_ref().map(|inner| &inner.key)
    }
}

impl<A> fmt::Debug for Slot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => f.write_str("Slot(dead)"),
            Some(inner) => f
                .debug_struct("Slot")
                .field("key", &inner.key)
                .field("owner", &inner.owner)
                .finish(),
        }
    }
}

// =============================================================================
// INVOCATION
// =============================================================================

/// Outcome of [`Slot::prepare`].
pub enum Prepared<A> {
    /// The slot is live; run this.
    Call(Invocation<A>),
    /// The slot is dead. Holds whatever was released from it, which may run
    /// arbitrary `Drop` code and must be dropped outside any table borrow.
    Skip(Slot<A>),
}

impl<A> Prepared<A> {
    /// The invocation, dropping a skipped slot on the spot.
    pub fn into_invocation(self) -> Option<Invocation<A>> {
        match self {
            Prepared::Call(invocation) => Some(invocation),
            Prepared::Skip(_) => None,
        }
    }
}

/// A resolved slot, ready to call.
///
/// Bound invocations hold a strong reference to the owner for the duration
/// of the call.
pub enum Invocation<A> {
    Bound {
        owner: Rc<dyn Any>,
        callback: BoundFn<A>,
    },
    Strong(StrongFn<A>),
}

impl<A> Invocation<A> {
    /// Run the callback. Errors propagate to the caller.
    pub fn call(&self, args: &A) -> SlotResult {
        match self {
            Invocation::Bound { owner, callback } => callback(owner.as_ref(), args),
            Invocation::Strong(closure) => closure(args),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
