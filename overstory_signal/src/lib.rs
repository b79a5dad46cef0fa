// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Signal: typed synchronous signals with RAII connections.
//!
//! A [`Signal<E>`] is one named event category; the event type *is* the name.
//! Providers own one `Signal` field per category they announce, listeners
//! attach with [`Signal::connect`] and hold the returned [`Connection`] for
//! as long as they care. Emission is synchronous and runs listeners in the
//! order they connected. Events are passed mutably, so listeners can write
//! response fields into them.
//!
//! ```rust
//! use overstory_signal::Signal;
//!
//! struct Moved {
//!     x: i32,
//!     vetoed: bool,
//! }
//!
//! let moved: Signal<Moved> = Signal::new();
//! let guard = moved.connect(|e| {
//!     if e.x < 0 {
//!         e.vetoed = true;
//!     }
//! });
//!
//! let mut event = Moved { x: -3, vetoed: false };
//! moved.emit(&mut event);
//! assert!(event.vetoed);
//!
//! // Dropping the guard detaches the listener.
//! drop(guard);
//! let mut event = Moved { x: -3, vetoed: false };
//! moved.emit(&mut event);
//! assert!(!event.vetoed);
//! ```
//!
//! ## Emission semantics
//!
//! The rules below keep arbitrary listener behavior safe in a
//! single-threaded event loop:
//!
//! - Listeners run in connection order.
//! - A listener connected during an emission is not invoked by that
//!   emission; it sees the next one.
//! - A listener disconnected during an emission (by itself or by an earlier
//!   listener) is skipped for the rest of that emission.
//! - A listener is never re-entered: if it emits the same signal
//!   recursively, the recursive emission runs the *other* listeners only.
//!
//! ## Lifetimes
//!
//! Detachment is automatic in both directions. Dropping the [`Connection`]
//! removes the listener; dropping the [`Signal`] leaves outstanding
//! connections inert (their listeners are simply never called again).
//! Everything is `Rc`-based and single-threaded by construction.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

type Callback<E> = Box<dyn FnMut(&mut E)>;

struct Slot<E> {
    /// Vacated while the callback runs and after disconnection.
    callback: RefCell<Option<Callback<E>>>,
    disconnected: Cell<bool>,
}

/// One event category: connect listeners, emit events.
///
/// See the [crate docs](crate) for the emission semantics.
pub struct Signal<E> {
    slots: RefCell<Vec<Weak<Slot<E>>>>,
}

impl<E> Signal<E> {
    /// Create a signal with no listeners.
    pub const fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }

    /// Attach a listener; it stays attached while the returned
    /// [`Connection`] is held.
    pub fn connect(&self, callback: impl FnMut(&mut E) + 'static) -> Connection<E> {
        let slot = Rc::new(Slot {
            callback: RefCell::new(Some(Box::new(callback))),
            disconnected: Cell::new(false),
        });
        self.slots.borrow_mut().push(Rc::downgrade(&slot));
        Connection { slot }
    }

    /// Invoke the current listeners with `event`, in connection order.
    pub fn emit(&self, event: &mut E) {
        // Snapshot the listeners first: connections made during emission
        // take effect on the next emission.
        let snapshot: Vec<Rc<Slot<E>>> = self
            .slots
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for slot in snapshot {
            // Vacate the slot while its callback runs; a listener that
            // disconnects itself or re-emits must not be re-entered.
            let callback = slot.callback.borrow_mut().take();
            if let Some(mut callback) = callback {
                callback(event);
                if !slot.disconnected.get() {
                    *slot.callback.borrow_mut() = Some(callback);
                }
            }
        }
        self.slots.borrow_mut().retain(|w| w.strong_count() > 0);
    }

    /// Number of listeners an emission would consider right now.
    pub fn listener_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|slot| !slot.disconnected.get())
            .count()
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// RAII guard for one attached listener.
///
/// Dropping it detaches the listener. The guard side does not observe the
/// [`Signal`] being dropped; emissions simply stop arriving.
pub struct Connection<E> {
    slot: Rc<Slot<E>>,
}

impl<E> Connection<E> {
    /// Detach the listener now. Dropping the guard does the same; this reads
    /// better when detachment is the point of the statement.
    pub fn disconnect(self) {}

    /// Whether the listener is still in place on this side.
    pub fn is_connected(&self) -> bool {
        !self.slot.disconnected.get()
    }
}

impl<E> Drop for Connection<E> {
    fn drop(&mut self) {
        self.slot.disconnected.set(true);
        self.slot.callback.borrow_mut().take();
    }
}

impl<E> fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn listeners_run_in_connection_order() {
        let sig: Signal<Vec<u32>> = Signal::new();
        let _a = sig.connect(|log| log.push(1));
        let _b = sig.connect(|log| log.push(2));
        let _c = sig.connect(|log| log.push(3));

        let mut log = Vec::new();
        sig.emit(&mut log);
        assert_eq!(log, vec![1, 2, 3]);
    }

    #[test]
    fn listeners_mutate_the_event() {
        let sig: Signal<u32> = Signal::new();
        let _double = sig.connect(|v| *v *= 2);
        let _inc = sig.connect(|v| *v += 1);

        let mut v = 10;
        sig.emit(&mut v);
        assert_eq!(v, 21, "listeners run in order on the same event");
    }

    #[test]
    fn dropping_the_connection_detaches() {
        let sig: Signal<Vec<u32>> = Signal::new();
        let a = sig.connect(|log| log.push(1));
        let _b = sig.connect(|log| log.push(2));
        assert_eq!(sig.listener_count(), 2);

        drop(a);
        assert_eq!(sig.listener_count(), 1);
        let mut log = Vec::new();
        sig.emit(&mut log);
        assert_eq!(log, vec![2]);
    }

    #[test]
    fn disconnect_consumes_the_guard() {
        let sig: Signal<Vec<u32>> = Signal::new();
        let a = sig.connect(|log| log.push(1));
        assert!(a.is_connected());
        a.disconnect();

        let mut log = Vec::new();
        sig.emit(&mut log);
        assert!(log.is_empty());
    }

    #[test]
    fn dropping_the_signal_leaves_connections_inert() {
        let sig: Signal<u32> = Signal::new();
        let a = sig.connect(|v| *v += 1);
        drop(sig);
        assert!(a.is_connected());
        drop(a);
    }

    #[test]
    fn connect_during_emission_waits_for_the_next_one() {
        let sig: Rc<Signal<Vec<&'static str>>> = Rc::new(Signal::new());
        let keep: Rc<RefCell<Vec<Connection<Vec<&'static str>>>>> =
            Rc::new(RefCell::new(Vec::new()));

        let sig2 = Rc::clone(&sig);
        let keep2 = Rc::clone(&keep);
        let _a = sig.connect(move |log: &mut Vec<&'static str>| {
            log.push("a");
            let first_time = keep2.borrow().is_empty();
            if first_time {
                keep2.borrow_mut().push(sig2.connect(|log| log.push("b")));
            }
        });

        let mut log = Vec::new();
        sig.emit(&mut log);
        assert_eq!(log, vec!["a"], "b is not called by the emission that connected it");

        let mut log = Vec::new();
        sig.emit(&mut log);
        assert_eq!(log, vec!["a", "b"]);
    }

    #[test]
    fn self_disconnect_during_emission() {
        let sig: Signal<Vec<u32>> = Signal::new();
        let own: Rc<RefCell<Option<Connection<Vec<u32>>>>> = Rc::new(RefCell::new(None));

        let own2 = Rc::clone(&own);
        let a = sig.connect(move |log: &mut Vec<u32>| {
            log.push(1);
            own2.borrow_mut().take();
        });
        *own.borrow_mut() = Some(a);
        let _b = sig.connect(|log| log.push(2));

        let mut log = Vec::new();
        sig.emit(&mut log);
        assert_eq!(log, vec![1, 2], "later listeners still run");

        let mut log = Vec::new();
        sig.emit(&mut log);
        assert_eq!(log, vec![2], "the listener removed itself");
    }

    #[test]
    fn disconnecting_a_later_listener_during_emission_skips_it() {
        let sig: Signal<Vec<u32>> = Signal::new();
        let victim: Rc<RefCell<Option<Connection<Vec<u32>>>>> = Rc::new(RefCell::new(None));

        let victim2 = Rc::clone(&victim);
        let _a = sig.connect(move |log: &mut Vec<u32>| {
            log.push(1);
            victim2.borrow_mut().take();
        });
        let b = sig.connect(|log| log.push(2));
        *victim.borrow_mut() = Some(b);

        let mut log = Vec::new();
        sig.emit(&mut log);
        assert_eq!(log, vec![1], "a disconnected b before it ran");
    }

    #[test]
    fn recursive_emission_skips_the_running_listener() {
        let sig: Rc<Signal<i32>> = Rc::new(Signal::new());
        let log: Rc<RefCell<Vec<(&'static str, i32)>>> = Rc::new(RefCell::new(Vec::new()));

        let sig2 = Rc::clone(&sig);
        let log_a = Rc::clone(&log);
        let _a = sig.connect(move |v: &mut i32| {
            log_a.borrow_mut().push(("a", *v));
            if *v == 1 {
                sig2.emit(&mut 2);
            }
        });
        let log_b = Rc::clone(&log);
        let _b = sig.connect(move |v: &mut i32| {
            log_b.borrow_mut().push(("b", *v));
        });

        sig.emit(&mut 1);
        assert_eq!(
            log.borrow().as_slice(),
            &[("a", 1), ("b", 2), ("b", 1)],
            "the recursive emission reached b but not the running a"
        );
    }

    #[test]
    fn listener_count_tracks_disconnection() {
        let sig: Signal<()> = Signal::new();
        assert_eq!(sig.listener_count(), 0);
        let a = sig.connect(|_| {});
        let b = sig.connect(|_| {});
        assert_eq!(sig.listener_count(), 2);
        a.disconnect();
        assert_eq!(sig.listener_count(), 1);
        drop(b);
        assert_eq!(sig.listener_count(), 0);
    }
}
