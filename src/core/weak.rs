// ============================================================================
// weak-signals - Weak Handle
// Non-owning reference from a slot back to the object it is bound to
// ============================================================================
//
// A WeakHandle never keeps its owner alive. The owner's own Drop is the
// disposal notification: once the last Rc goes away, `Weak::upgrade` fails
// forever after, so a handle can only ever move from alive to dead.
//
// The owner address is kept next to the weak pointer purely as an identity
// token for disconnect matching. It is never dereferenced.
// ============================================================================

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

// =============================================================================
// OWNER ADDRESS
// =============================================================================

/// Identity of an owner allocation, used for matching only.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerAddr(*const ());

impl OwnerAddr {
    /// Address of the allocation behind an `Rc`.
    pub fn of<O: ?Sized>(owner: &Rc<O>) -> Self {
        Self(Rc::as_ptr(owner) as *const ())
    }

    /// Raw address value (for logging).
    pub fn addr(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for OwnerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerAddr({:#x})", self.addr())
    }
}

// =============================================================================
// WEAK HANDLE
// =============================================================================

/// A weak, type-erased reference to a slot's owner.
///
/// A handle is either *none* (used by strong connections, which have no
/// owner) or holds a `Weak<dyn Any>` to the owner. Resolving it yields a
/// strong reference only while the owner is still alive.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use weak_signals::WeakHandle;
///
/// let owner = Rc::new(String::from("widget"));
/// let handle = WeakHandle::new(&owner);
/// assert!(handle.is_alive());
///
/// drop(owner);
/// assert!(handle.resolve().is_none());
/// ```
pub struct WeakHandle {
    target: Option<Weak<dyn Any>>,
    addr: Option<OwnerAddr>,
}

impl WeakHandle {
    /// A handle with no owner. It never resolves.
    pub fn none() -> Self {
        Self {
            target: None,
            addr: None,
        }
    }

    /// Create a handle to `owner` without extending its lifetime.
    pub fn new<O: 'static>(owner: &Rc<O>) -> Self {
        let erased: Rc<dyn Any> = owner.clone();
        let target = Rc::downgrade(&erased);
        // `erased` is dropped here; only the weak count remains
        Self {
            target: Some(target),
            addr: Some(OwnerAddr::of(owner)),
        }
    }

    /// Resolve to a strong reference if the owner is still alive.
    pub fn resolve(&self) -> Option<Rc<dyn Any>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    /// Resolve and downcast to the concrete owner type.
    pub fn resolve_as<O: 'static>(&self) -> Option<Rc<O>> {
        self.resolve().and_then(|rc| rc.downcast::<O>().ok())
    }

    /// Whether the owner is still alive.
    pub fn is_alive(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Whether this handle was created without an owner.
    pub fn is_none(&self) -> bool {
        self.addr.is_none()
    }

    /// Address of the owner this handle was created for.
    ///
    /// Still reported after the owner died, so dead connections can be
    /// matched by identity until they are reset.
    pub fn owner_addr(&self) -> Option<OwnerAddr> {
        self.addr
    }

    /// Release the weak pointer. Idempotent.
    ///
    /// Dropping the weak count lets the owner's allocation be freed once its
    /// strong count reaches zero.
    pub fn reset(&mut self) {
        self.target = None;
    }
}

impl Default for WeakHandle {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for WeakHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHandle")
            .field("owner", &self.addr)
            .field("alive", &self.is_alive())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
