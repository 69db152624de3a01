#![forbid(unsafe_code)]

//! Per-machine drag context and the snapshots published from it.

use crate::event::DragPhase;
use crate::geometry::{Anchor, Displacement, Point};
use crate::identity::TargetId;

/// Mutable drag state owned by exactly one machine.
///
/// # Invariants
///
/// 1. `owner` is `Some` iff the machine phase is not idle.
/// 2. `offset` is zero whenever the machine is idle.
#[derive(Debug, Clone, PartialEq)]
pub struct DragContext<P> {
    pub(crate) owner: Option<TargetId>,
    pub(crate) payload: Option<P>,
    pub(crate) threshold: f64,
    pub(crate) origin: Point,
    pub(crate) anchor: Anchor,
    pub(crate) offset: Displacement,
}

impl<P> DragContext<P> {
    pub(crate) fn new(threshold: f64) -> Self {
        Self {
            owner: None,
            payload: None,
            threshold,
            origin: Point::ZERO,
            anchor: Anchor::default(),
            offset: Displacement::ZERO,
        }
    }

    /// Element that owns the current drag.
    #[must_use]
    pub fn owner(&self) -> Option<TargetId> {
        self.owner
    }

    #[must_use]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Pointer position at pointer-down.
    #[must_use]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Bounding-box corner measured when the drag was confirmed.
    #[must_use]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Current pointer travel from [`origin`](Self::origin).
    #[must_use]
    pub fn offset(&self) -> Displacement {
        self.offset
    }

    /// Drop everything but the threshold.
    pub(crate) fn reset(&mut self) {
        self.owner = None;
        self.payload = None;
        self.origin = Point::ZERO;
        self.anchor = Anchor::default();
        self.offset = Displacement::ZERO;
    }
}

/// Phase plus context, as handed to observers after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<P> {
    pub phase: DragPhase,
    pub owner: Option<TargetId>,
    pub payload: Option<P>,
    pub origin: Point,
    pub top: f64,
    pub left: f64,
    pub dx: f64,
    pub dy: f64,
}

impl<P> Snapshot<P> {
    /// Whether `target` owns the drag this snapshot describes.
    #[must_use]
    pub fn is_owned_by(&self, target: TargetId) -> bool {
        self.owner == Some(target)
    }

    /// Whether `target` may receive drop-area enter/leave/drop notifications:
    /// the machine is not idle and `target` is not the owner.
    #[must_use]
    pub fn is_drop_eligible(&self, target: TargetId) -> bool {
        self.phase.is_active() && !self.is_owned_by(target)
    }
}

impl<P: Clone> Snapshot<P> {
    pub(crate) fn capture(phase: DragPhase, ctx: &DragContext<P>) -> Self {
        Self {
            phase,
            owner: ctx.owner,
            payload: ctx.payload.clone(),
            origin: ctx.origin,
            top: ctx.anchor.top,
            left: ctx.anchor.left,
            dx: ctx.offset.dx,
            dy: ctx.offset.dy,
        }
    }
}

impl<P> Default for Snapshot<P> {
    fn default() -> Self {
        Self {
            phase: DragPhase::Idle,
            owner: None,
            payload: None,
            origin: Point::ZERO,
            top: 0.0,
            left: 0.0,
            dx: 0.0,
            dy: 0.0,
        }
    }
}
