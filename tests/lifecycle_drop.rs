use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use weak_signals::{Signal, SlotResult, WrapperFn};

struct Listener {
    hits: Cell<u32>,
}

impl Listener {
    fn new() -> Rc<Self> {
        Rc::new(Self { hits: Cell::new(0) })
    }

    fn on_event(&self, _: &()) -> SlotResult {
        self.hits.set(self.hits.get() + 1);
        Ok(())
    }
}

#[test]
fn test_connect_does_not_extend_owner_lifetime() {
    let signal: Signal<()> = Signal::new();
    let listener = Listener::new();
    let weak = Rc::downgrade(&listener);

    signal.connect(&listener, Listener::on_event);
    assert_eq!(Rc::strong_count(&listener), 1);

    drop(listener);
    assert!(weak.upgrade().is_none(), "Connection must not keep the owner alive");
}

#[test]
fn test_dropped_owner_skipped_without_disconnect() {
    let signal: Signal<()> = Signal::new();
    let kept = Listener::new();
    let dropped = Listener::new();
    let dropped_weak = Rc::downgrade(&dropped);

    signal.connect(&kept, Listener::on_event);
    signal.connect(&dropped, Listener::on_event);
    signal.emit(()).unwrap();
    assert_eq!(kept.hits.get(), 1);

    drop(dropped);
    signal.emit(()).unwrap();
    signal.emit(()).unwrap();

    assert_eq!(kept.hits.get(), 3);
    assert!(dropped_weak.upgrade().is_none());
    assert_eq!(signal.len(), 1);
    assert_eq!(signal.capacity_used(), 1, "Dead connection should be reclaimed by emit");
}

#[test]
fn test_disconnect_releases_weak_count() {
    let signal: Signal<()> = Signal::new();
    let listener = Listener::new();

    signal.connect(&listener, Listener::on_event);
    assert_eq!(Rc::weak_count(&listener), 1);

    assert_eq!(signal.disconnect(&listener, Listener::on_event), 1);
    assert_eq!(Rc::weak_count(&listener), 0);
}

#[test]
fn test_signal_drop_releases_every_connection() {
    let listener = Listener::new();
    {
        let signal: Signal<()> = Signal::new();
        signal.connect(&listener, Listener::on_event);
        signal.connect(&listener, Listener::on_event);
        assert_eq!(Rc::weak_count(&listener), 2);
    }
    assert_eq!(Rc::weak_count(&listener), 0, "Signal drop should reset weak handles");
}

#[test]
fn test_wrapper_closure_owner_stays_weak() {
    let signal: Signal<()> = Signal::new();
    let listener = Listener::new();
    let wrapper: WrapperFn<Listener, ()> = Rc::new(|owner: &Listener, args: &()| owner.on_event(args));

    signal.connect_wrapper(&listener, &wrapper);
    signal.emit(()).unwrap();
    assert_eq!(listener.hits.get(), 1);

    let weak = Rc::downgrade(&listener);
    drop(listener);
    assert!(weak.upgrade().is_none());

    signal.emit(()).unwrap();
    assert!(signal.is_empty());
    // The wrapper itself was released along with the dead connection
    assert_eq!(Rc::strong_count(&wrapper), 1);
}

#[test]
fn test_strong_connection_keeps_closure_alive() {
    let signal: Signal<()> = Signal::new();
    let hits = Rc::new(Cell::new(0));

    {
        let hits = hits.clone();
        // Handle dropped immediately; the connection owns the closure
        let _ = signal.strong_connect_fn(move |_: &()| {
            hits.set(hits.get() + 1);
            Ok(())
        });
    }

    signal.emit(()).unwrap();
    signal.emit(()).unwrap();
    assert_eq!(hits.get(), 2);
}

/// Owner kept alive only by a reference to itself.
struct SelfDropping {
    hits: Cell<u32>,
    slot: RefCell<Option<Rc<SelfDropping>>>,
}

impl SelfDropping {
    /// Releases the only strong reference to itself while being called.
    fn on_event(&self, _: &()) -> SlotResult {
        self.hits.set(self.hits.get() + 1);
        let _released = self.slot.borrow_mut().take();
        Ok(())
    }
}

#[test]
fn test_owner_released_during_its_own_call() {
    let signal: Signal<()> = Signal::new();
    let owner = Rc::new(SelfDropping {
        hits: Cell::new(0),
        slot: RefCell::new(None),
    });
    let weak: Weak<SelfDropping> = Rc::downgrade(&owner);
    *owner.slot.borrow_mut() = Some(owner.clone());

    signal.connect(&owner, SelfDropping::on_event);
    drop(owner);

    // Still alive through its self-reference
    assert!(weak.upgrade().is_some());

    // The invocation holds the owner for the duration of the call
    signal.emit(()).unwrap();
    assert!(weak.upgrade().is_none());

    signal.emit(()).unwrap();
    assert!(signal.is_empty());
}
