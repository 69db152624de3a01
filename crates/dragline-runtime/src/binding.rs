#![forbid(unsafe_code)]

//! One element's attachment to its interaction group.
//!
//! A [`DragBinding`] is what a draggable element or drop area holds. It
//! forwards the element's pointer events into the group's machine, filters
//! them by role and ownership, and turns published snapshots and notices into
//! the element's callbacks.
//!
//! | Role        | Element event        | Sent when                         |
//! |-------------|----------------------|-----------------------------------|
//! | draggable   | `pointer_down`       | always                            |
//! | drop area   | `pointer_enter`      | machine not idle, not the owner   |
//! | drop area   | `pointer_leave`      | machine not idle, not the owner   |
//! | drop area   | `pointer_up`         | machine not idle, not the owner   |
//!
//! An element's own `pointer_up` is expected before the window-level one, so
//! a drop is announced while the drag is still live and the drag then ends
//! through the machine's pointer-up listener.

use std::cell::Cell;
use std::rc::Rc;

use dragline_core::error::Result;
use dragline_core::{DragNotice, DragPhase, GroupId, MachineEvent, Point, TargetId};

use crate::observers::Subscription;
use crate::registry::Registry;
use crate::service::MachineHandle;

type PayloadCallback<P> = Rc<dyn Fn(Option<&P>)>;
type PhaseCallback = Rc<dyn Fn(DragPhase)>;

/// Roles, data and callbacks for a [`DragBinding`].
pub struct DragOptions<P> {
    draggable: bool,
    drop_area: bool,
    data: Option<P>,
    on_drag_area_enter: Option<PayloadCallback<P>>,
    on_drag_area_leave: Option<PayloadCallback<P>>,
    on_drag_area_drop: Option<PayloadCallback<P>>,
    on_state_change: Option<PhaseCallback>,
}

impl<P> Default for DragOptions<P> {
    fn default() -> Self {
        Self {
            draggable: false,
            drop_area: false,
            data: None,
            on_drag_area_enter: None,
            on_drag_area_leave: None,
            on_drag_area_drop: None,
            on_state_change: None,
        }
    }
}

impl<P> std::fmt::Debug for DragOptions<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragOptions")
            .field("draggable", &self.draggable)
            .field("drop_area", &self.drop_area)
            .field("has_data", &self.data.is_some())
            .finish_non_exhaustive()
    }
}

impl<P> DragOptions<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Element can start drags.
    #[must_use]
    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    /// Element accepts drops.
    #[must_use]
    pub fn drop_area(mut self, drop_area: bool) -> Self {
        self.drop_area = drop_area;
        self
    }

    /// Payload carried by drags this element starts.
    #[must_use]
    pub fn data(mut self, data: P) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn on_drag_area_enter(mut self, callback: impl Fn(Option<&P>) + 'static) -> Self {
        self.on_drag_area_enter = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_drag_area_leave(mut self, callback: impl Fn(Option<&P>) + 'static) -> Self {
        self.on_drag_area_leave = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_drag_area_drop(mut self, callback: impl Fn(Option<&P>) + 'static) -> Self {
        self.on_drag_area_drop = Some(Rc::new(callback));
        self
    }

    /// Called with the group's phase each time it changes.
    #[must_use]
    pub fn on_state_change(mut self, callback: impl Fn(DragPhase) + 'static) -> Self {
        self.on_state_change = Some(Rc::new(callback));
        self
    }
}

/// Placement of the element's drag overlay.
///
/// The overlay sits at (`top`, `left`) and is translated by (`dx`, `dy`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub top: f64,
    pub left: f64,
    pub dx: f64,
    pub dy: f64,
}

/// An element attached to a group's machine.
///
/// Dropping the binding detaches it and releases its consumer slot in the
/// registry.
pub struct DragBinding<P: Clone + 'static> {
    id: TargetId,
    registry: Registry<P>,
    handle: MachineHandle<P>,
    draggable: bool,
    drop_area: bool,
    data: Option<P>,
    subscriptions: Vec<Subscription>,
}

impl<P: Clone + 'static> std::fmt::Debug for DragBinding<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragBinding")
            .field("id", &self.id)
            .field("group", self.handle.group())
            .field("draggable", &self.draggable)
            .field("drop_area", &self.drop_area)
            .finish_non_exhaustive()
    }
}

impl<P: Clone + 'static> DragBinding<P> {
    /// Attach a new element to `group`, acquiring the group's machine.
    pub fn attach(
        registry: &Registry<P>,
        group: impl Into<GroupId>,
        options: DragOptions<P>,
    ) -> Self {
        Self::attach_as(TargetId::fresh(), registry, group, options)
    }

    /// Attach with a host-chosen element id.
    pub fn attach_as(
        id: TargetId,
        registry: &Registry<P>,
        group: impl Into<GroupId>,
        options: DragOptions<P>,
    ) -> Self {
        let handle = registry.acquire(group);
        let mut subscriptions = Vec::new();

        if let Some(callback) = options.on_state_change {
            let last = Cell::new(handle.phase());
            subscriptions.push(handle.subscribe(move |snapshot| {
                if last.replace(snapshot.phase) != snapshot.phase {
                    callback(snapshot.phase);
                }
            }));
        }

        let enter = options.on_drag_area_enter;
        let leave = options.on_drag_area_leave;
        let dropped = options.on_drag_area_drop;
        if enter.is_some() || leave.is_some() || dropped.is_some() {
            subscriptions.push(handle.subscribe_notices(move |notice| {
                if notice.area() != Some(id) {
                    return;
                }
                let callback = match notice {
                    DragNotice::AreaEnter { .. } => &enter,
                    DragNotice::AreaLeave { .. } => &leave,
                    DragNotice::AreaDrop { .. } => &dropped,
                    _ => return,
                };
                if let Some(callback) = callback {
                    callback(notice.payload());
                }
            }));
        }

        Self {
            id,
            registry: registry.clone(),
            handle,
            draggable: options.draggable,
            drop_area: options.drop_area,
            data: options.data,
            subscriptions,
        }
    }

    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    #[must_use]
    pub fn group(&self) -> &GroupId {
        self.handle.group()
    }

    /// The group's machine service.
    #[must_use]
    pub fn handle(&self) -> &MachineHandle<P> {
        &self.handle
    }

    #[must_use]
    pub fn data(&self) -> Option<&P> {
        self.data.as_ref()
    }

    /// Pointer pressed on this element. Returns whether it was forwarded.
    pub fn pointer_down(&self, pos: Point) -> Result<bool> {
        if !self.draggable {
            return Ok(false);
        }
        self.handle.send(MachineEvent::PointerDown {
            target: self.id,
            pos,
            payload: self.data.clone(),
        })?;
        Ok(true)
    }

    /// Pointer entered this element. Returns whether it counted as a
    /// drop-area entry.
    pub fn pointer_enter(&self) -> Result<bool> {
        self.crossing(MachineEvent::DropAreaEnter, |area, payload| {
            DragNotice::AreaEnter { area, payload }
        })
    }

    /// Pointer left this element. Returns whether it counted as a drop-area
    /// exit.
    pub fn pointer_leave(&self) -> Result<bool> {
        self.crossing(MachineEvent::DropAreaLeave, |area, payload| {
            DragNotice::AreaLeave { area, payload }
        })
    }

    /// Pointer released over this element. Returns whether a drop was
    /// announced.
    ///
    /// Call this before forwarding the same release to
    /// [`PointerBus::emit_up`](crate::PointerBus::emit_up). The window-level
    /// pointer-up ends the drag, after which the element is no longer
    /// eligible and the drop is not announced.
    pub fn pointer_up(&self) -> Result<bool> {
        let Some(payload) = self.eligible_payload() else {
            return Ok(false);
        };
        self.handle.announce(DragNotice::AreaDrop {
            area: self.id,
            payload,
        })?;
        Ok(true)
    }

    /// Replace this element's data. Forwarded to the machine only while this
    /// element owns the interaction.
    pub fn set_data(&mut self, data: P) -> Result<()> {
        self.data = Some(data);
        if self.is_drag_owner() {
            self.handle.set_payload(self.data.clone())?;
        }
        Ok(())
    }

    /// Whether this element owns the group's current interaction.
    #[must_use]
    pub fn is_drag_owner(&self) -> bool {
        self.handle.snapshot().is_owned_by(self.id)
    }

    /// Whether this element is being dragged past the threshold.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        let snapshot = self.handle.snapshot();
        snapshot.is_owned_by(self.id) && snapshot.phase.is_dragging()
    }

    /// Where to draw this element's overlay, while it is being dragged.
    #[must_use]
    pub fn overlay(&self) -> Option<Overlay> {
        let snapshot = self.handle.snapshot();
        (snapshot.is_owned_by(self.id) && snapshot.phase.is_dragging()).then_some(Overlay {
            top: snapshot.top,
            left: snapshot.left,
            dx: snapshot.dx,
            dy: snapshot.dy,
        })
    }

    /// The group's phase, reported only to the owning element.
    #[must_use]
    pub fn phase_marker(&self) -> Option<DragPhase> {
        let snapshot = self.handle.snapshot();
        snapshot.is_owned_by(self.id).then_some(snapshot.phase)
    }

    fn eligible_payload(&self) -> Option<Option<P>> {
        if !self.drop_area {
            return None;
        }
        let snapshot = self.handle.snapshot();
        snapshot
            .is_drop_eligible(self.id)
            .then_some(snapshot.payload)
    }

    fn crossing(
        &self,
        event: MachineEvent<P>,
        notice: impl FnOnce(TargetId, Option<P>) -> DragNotice<P>,
    ) -> Result<bool> {
        let Some(payload) = self.eligible_payload() else {
            return Ok(false);
        };
        self.handle.send(event)?;
        self.handle.announce(notice(self.id, payload))?;
        Ok(true)
    }
}

impl<P: Clone + 'static> Drop for DragBinding<P> {
    fn drop(&mut self) {
        self.subscriptions.clear();
        self.registry.release_handle(&self.handle);
    }
}
