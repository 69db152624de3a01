#![forbid(unsafe_code)]

//! Single-threaded machine service.
//!
//! A [`MachineHandle`] wraps one [`DragMachine`] with an event queue, binds
//! its [`DragEnv`] to a [`PointerSource`] and a [`BoundsProvider`], and
//! publishes a [`Snapshot`] to observers after every handled event.
//!
//! # Dispatch
//!
//! Events are admitted one at a time. [`MachineHandle::send`] appends to the
//! queue and drains it unless a drain is already running further up the
//! stack; pointer listeners and observer callbacks that send events while a
//! drain runs only enqueue. Each event is fully processed (transition,
//! actions, publication) before the next is taken.
//!
//! # Shutdown
//!
//! Stopping a service shuts its machine down (cancelling every listener),
//! drops queued events and refuses further input with
//! [`DragError::Released`]. The last published snapshot stays readable.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use dragline_core::{
    Anchor, DragConfig, DragEnv, DragError, DragMachine, DragNotice, DragPhase, GroupId,
    ListenerError, ListenerId, ListenerToken, MachineEvent, MeasureError, PointerStream, Snapshot,
    TargetId,
};
use dragline_core::error;
use tracing::{info_span, trace};

use crate::bounds::BoundsProvider;
use crate::observers::{Observers, Subscription};
use crate::pointer_bus::{PointerSink, PointerSource};

struct ServiceInner<P: 'static> {
    group: GroupId,
    machine: RefCell<DragMachine<P>>,
    queue: RefCell<VecDeque<MachineEvent<P>>>,
    dispatching: Cell<bool>,
    stopped: Cell<bool>,
    version: Cell<u64>,
    last: RefCell<Snapshot<P>>,
    snapshots: Observers<Snapshot<P>>,
    notices: Observers<DragNotice<P>>,
    source: Rc<dyn PointerSource>,
    bounds: Rc<dyn BoundsProvider>,
}

/// Shared handle to one group's running machine.
///
/// Clones refer to the same service. Compare with [`ptr_eq`](Self::ptr_eq).
pub struct MachineHandle<P: 'static> {
    inner: Rc<ServiceInner<P>>,
}

impl<P: 'static> Clone for MachineHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: 'static> std::fmt::Debug for MachineHandle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineHandle")
            .field("group", &self.inner.group)
            .field("phase", &self.inner.last.borrow().phase)
            .field("version", &self.inner.version.get())
            .field("stopped", &self.inner.stopped.get())
            .finish_non_exhaustive()
    }
}

impl<P: Clone + 'static> MachineHandle<P> {
    pub(crate) fn start(
        group: GroupId,
        config: &DragConfig,
        source: Rc<dyn PointerSource>,
        bounds: Rc<dyn BoundsProvider>,
    ) -> Self {
        let machine = DragMachine::new(config);
        let last = machine.snapshot();
        Self {
            inner: Rc::new(ServiceInner {
                group,
                machine: RefCell::new(machine),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                stopped: Cell::new(false),
                version: Cell::new(0),
                last: RefCell::new(last),
                snapshots: Observers::new(),
                notices: Observers::new(),
                source,
                bounds,
            }),
        }
    }

    #[must_use]
    pub fn group(&self) -> &GroupId {
        &self.inner.group
    }

    /// Whether two handles refer to the same service.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    /// Queue `event` and process it, unless a drain is already running.
    pub fn send(&self, event: MachineEvent<P>) -> error::Result<()> {
        self.ensure_running()?;
        self.enqueue(event);
        Ok(())
    }

    /// Replace the payload of the current interaction.
    pub fn set_payload(&self, payload: Option<P>) -> error::Result<()> {
        self.send(MachineEvent::SetPayload(payload))
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<P> {
        self.inner.last.borrow().clone()
    }

    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.inner.last.borrow().phase
    }

    /// Number of snapshots published since the service started.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Observe every published snapshot.
    pub fn subscribe(&self, callback: impl Fn(&Snapshot<P>) + 'static) -> Subscription {
        self.inner.snapshots.subscribe(callback)
    }

    /// Observe lifecycle and drop-area notices.
    pub fn subscribe_notices(&self, callback: impl Fn(&DragNotice<P>) + 'static) -> Subscription {
        self.inner.notices.subscribe(callback)
    }

    /// Broadcast a notice raised outside the machine, such as a drop-area
    /// crossing reported by a consumer.
    pub fn announce(&self, notice: DragNotice<P>) -> error::Result<()> {
        self.ensure_running()?;
        self.inner.notices.notify(&notice);
        Ok(())
    }

    /// Listeners the machine currently holds.
    #[must_use]
    pub fn active_listeners(&self) -> usize {
        self.inner.machine.borrow().active_listeners()
    }

    #[must_use]
    pub fn drag_listener_starts(&self) -> u64 {
        self.inner.machine.borrow().drag_listener_starts()
    }

    /// Shut the machine down and refuse further events. Idempotent.
    pub(crate) fn stop(&self) {
        if self.inner.stopped.replace(true) {
            return;
        }
        self.inner.queue.borrow_mut().clear();
        let mut env = ServiceEnv { inner: &self.inner };
        let interrupted = self.inner.machine.borrow_mut().shutdown(&mut env);
        trace!(group = %self.inner.group, interrupted, "machine service stopped");
    }

    fn ensure_running(&self) -> error::Result<()> {
        if self.inner.stopped.get() {
            return Err(DragError::released(&self.inner.group));
        }
        Ok(())
    }

    fn enqueue(&self, event: MachineEvent<P>) {
        if self.inner.stopped.get() {
            trace!(group = %self.inner.group, event = %event.kind(), "dropping event for stopped service");
            return;
        }
        self.inner.queue.borrow_mut().push_back(event);
        if !self.inner.dispatching.get() {
            self.drain();
        }
    }

    fn drain(&self) {
        let _dispatch = DispatchGuard::enter(&self.inner.dispatching);
        let span = info_span!("dragline.dispatch", group = %self.inner.group);
        let _span = span.enter();

        loop {
            if self.inner.stopped.get() {
                self.inner.queue.borrow_mut().clear();
                break;
            }
            let Some(event) = self.inner.queue.borrow_mut().pop_front() else {
                break;
            };
            let step = {
                let mut env = ServiceEnv { inner: &self.inner };
                self.inner.machine.borrow_mut().step(event, &mut env)
            };
            if step.handled {
                self.publish(&step.notices);
            }
        }
    }

    fn publish(&self, notices: &[DragNotice<P>]) {
        let snapshot = self.inner.machine.borrow().snapshot();
        self.inner.version.set(self.inner.version.get() + 1);
        *self.inner.last.borrow_mut() = snapshot.clone();
        self.inner.snapshots.notify(&snapshot);
        for notice in notices {
            self.inner.notices.notify(notice);
        }
    }
}

/// Clears the dispatching flag when a drain ends, including by unwinding.
struct DispatchGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// [`DragEnv`] bound to a service's pointer source and bounds provider.
struct ServiceEnv<'a, P: 'static> {
    inner: &'a Rc<ServiceInner<P>>,
}

impl<P: Clone + 'static> DragEnv for ServiceEnv<'_, P> {
    fn measure(&mut self, target: TargetId) -> Result<Anchor, MeasureError> {
        self.inner.bounds.measure(target)
    }

    fn listen(
        &mut self,
        stream: PointerStream,
        token: ListenerToken,
    ) -> Result<ListenerId, ListenerError> {
        let service = Rc::downgrade(self.inner);
        let live = token.clone();
        let sink: PointerSink = Rc::new(move |pos| {
            if live.is_cancelled() {
                return;
            }
            let Some(inner) = service.upgrade() else {
                return;
            };
            let event = match stream {
                PointerStream::Move => MachineEvent::PointerMove { pos },
                PointerStream::Up => MachineEvent::PointerUp { pos },
            };
            MachineHandle { inner }.enqueue(event);
        });
        self.inner.source.subscribe(stream, token, sink)
    }

    fn unlisten(&mut self, id: ListenerId) -> Result<(), ListenerError> {
        self.inner.source.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundsTable;
    use crate::pointer_bus::PointerBus;
    use dragline_core::Point;

    const CARD: TargetId = TargetId::new(1);

    fn service() -> (MachineHandle<&'static str>, PointerBus, BoundsTable) {
        let bus = PointerBus::new();
        let bounds = BoundsTable::new();
        bounds.mount(CARD, Anchor::new(30.0, 40.0));
        let handle = MachineHandle::start(
            GroupId::new("board"),
            &DragConfig::default(),
            Rc::new(bus.clone()),
            Rc::new(bounds.clone()),
        );
        (handle, bus, bounds)
    }

    #[test]
    fn pointer_bus_drives_the_machine() {
        let (handle, bus, _bounds) = service();
        handle
            .send(MachineEvent::down(CARD, 100.0, 100.0, Some("card")))
            .unwrap();
        assert_eq!(handle.phase(), DragPhase::PreDrag);
        assert_eq!(bus.listener_count(), 2);

        bus.emit_move(Point::new(105.0, 103.0));
        assert_eq!(handle.phase(), DragPhase::PreDrag);

        bus.emit_move(Point::new(100.0, 125.0));
        let snap = handle.snapshot();
        assert_eq!(snap.phase, DragPhase::Dragging);
        assert_eq!((snap.dx, snap.dy), (0.0, 25.0));
        assert_eq!((snap.top, snap.left), (30.0, 40.0));
        assert_eq!(bus.listener_count(), 2);

        bus.emit_up(Point::new(100.0, 125.0));
        assert_eq!(handle.snapshot(), Snapshot::default());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn every_handled_event_bumps_the_version() {
        let (handle, bus, _bounds) = service();
        assert_eq!(handle.version(), 0);

        handle.send(MachineEvent::down(CARD, 0.0, 0.0, None)).unwrap();
        bus.emit_move(Point::new(1.0, 1.0));
        assert_eq!(handle.version(), 2);

        // Not handled in pre-drag.
        handle.send(MachineEvent::DropAreaEnter).unwrap();
        assert_eq!(handle.version(), 2);
    }

    #[test]
    fn events_sent_from_observers_are_queued() {
        let (handle, bus, _bounds) = service();
        let phases = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&phases);
        let reentrant = handle.clone();
        let _sub = handle.subscribe(move |snap| {
            log.borrow_mut().push(snap.phase);
            if snap.phase == DragPhase::Dragging {
                reentrant.send(MachineEvent::DropAreaEnter).unwrap();
            }
        });

        handle.send(MachineEvent::down(CARD, 0.0, 0.0, None)).unwrap();
        bus.emit_move(Point::new(0.0, 30.0));

        assert_eq!(
            *phases.borrow(),
            vec![
                DragPhase::PreDrag,
                DragPhase::Dragging,
                DragPhase::InDropArea
            ]
        );
    }

    #[test]
    fn unmounted_owner_aborts_and_notifies() {
        let (handle, bus, bounds) = service();
        bounds.unmount(CARD);
        let notices = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&notices);
        let _sub = handle.subscribe_notices(move |n| log.borrow_mut().push(n.clone()));

        handle.send(MachineEvent::down(CARD, 0.0, 0.0, None)).unwrap();
        bus.emit_move(Point::new(0.0, 30.0));

        assert_eq!(handle.phase(), DragPhase::Idle);
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(
            *notices.borrow(),
            vec![DragNotice::Aborted {
                owner: CARD,
                reason: DragError::Measure(MeasureError::Unmounted(CARD)),
            }]
        );
    }

    #[test]
    fn stopped_service_refuses_input() {
        let (handle, bus, _bounds) = service();
        handle.send(MachineEvent::down(CARD, 0.0, 0.0, None)).unwrap();
        bus.emit_move(Point::new(0.0, 30.0));
        let version = handle.version();

        handle.stop();
        handle.stop();

        assert!(handle.is_stopped());
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(handle.active_listeners(), 0);
        assert_eq!(bus.emit_move(Point::new(0.0, 90.0)), 0);
        assert_eq!(handle.version(), version);
        assert_eq!(
            handle.send(MachineEvent::up(0.0, 0.0)),
            Err(DragError::Released {
                group: GroupId::new("board")
            })
        );
        assert!(handle.announce(DragNotice::AreaDrop {
            area: TargetId::new(2),
            payload: None
        })
        .is_err());
    }
}
