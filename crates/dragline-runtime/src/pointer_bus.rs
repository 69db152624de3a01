#![forbid(unsafe_code)]

//! Window-level pointer streams.
//!
//! Machines subscribe here for the global pointer-move and pointer-up
//! activity that drives pre-drag probing and live dragging.
//!
//! # How it works
//!
//! 1. The host forwards raw window events with [`PointerBus::emit_move`] and
//!    [`PointerBus::emit_up`].
//! 2. Each emit snapshots the listeners registered for that stream, then
//!    calls their sinks one by one.
//! 3. A listener whose token was cancelled, or that was unsubscribed by an
//!    earlier sink in the same emit, is skipped.
//!
//! Listeners registered during an emit do not see that emit.

use std::cell::RefCell;
use std::rc::Rc;

use dragline_core::{ListenerError, ListenerId, ListenerToken, Point, PointerStream};
use tracing::trace;

/// Callback receiving pointer positions for one listener.
pub type PointerSink = Rc<dyn Fn(Point)>;

/// A provider of window-level pointer streams.
pub trait PointerSource {
    /// Register `sink` on `stream`. Deliveries stop once `token` is cancelled.
    fn subscribe(
        &self,
        stream: PointerStream,
        token: ListenerToken,
        sink: PointerSink,
    ) -> Result<ListenerId, ListenerError>;

    /// Remove a listener.
    fn unsubscribe(&self, id: ListenerId) -> Result<(), ListenerError>;
}

struct BusListener {
    id: ListenerId,
    stream: PointerStream,
    token: ListenerToken,
    sink: PointerSink,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<BusListener>,
}

/// In-process pointer source fed by the host.
///
/// Cloning a `PointerBus` creates a new handle to the **same** listener set:
/// hand one clone to the registry and keep one to emit events.
#[derive(Clone, Default)]
pub struct PointerBus {
    inner: Rc<RefCell<BusInner>>,
}

impl std::fmt::Debug for PointerBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl PointerBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a window pointer-move. Returns the number of sinks called.
    pub fn emit_move(&self, pos: Point) -> usize {
        self.emit(PointerStream::Move, pos)
    }

    /// Deliver a window pointer-up. Returns the number of sinks called.
    pub fn emit_up(&self, pos: Point) -> usize {
        self.emit(PointerStream::Up, pos)
    }

    /// Deliver `pos` to every live listener on `stream`.
    pub fn emit(&self, stream: PointerStream, pos: Point) -> usize {
        let targets: Vec<(ListenerId, ListenerToken, PointerSink)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.stream == stream && !l.token.is_cancelled())
            .map(|l| (l.id, l.token.clone(), Rc::clone(&l.sink)))
            .collect();

        let mut delivered = 0;
        for (id, token, sink) in targets {
            if token.is_cancelled() || !self.is_registered(id) {
                trace!(listener = %id, %stream, "skipping listener stopped mid-emit");
                continue;
            }
            sink(pos);
            delivered += 1;
        }
        delivered
    }

    /// Registered listeners across both streams.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Registered listeners on one stream.
    #[must_use]
    pub fn listener_count_for(&self, stream: PointerStream) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.stream == stream)
            .count()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.inner.borrow().listeners.iter().any(|l| l.id == id)
    }
}

impl PointerSource for PointerBus {
    fn subscribe(
        &self,
        stream: PointerStream,
        token: ListenerToken,
        sink: PointerSink,
    ) -> Result<ListenerId, ListenerError> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = ListenerId::new(inner.next_id);
        trace!(listener = %id, %stream, "listener registered");
        inner.listeners.push(BusListener {
            id,
            stream,
            token,
            sink,
        });
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) -> Result<(), ListenerError> {
        let mut inner = self.inner.borrow_mut();
        let Some(index) = inner.listeners.iter().position(|l| l.id == id) else {
            return Err(ListenerError::Unknown(id));
        };
        let removed = inner.listeners.remove(index);
        trace!(listener = %id, stream = %removed.stream, "listener removed");
        Ok(())
    }
}
