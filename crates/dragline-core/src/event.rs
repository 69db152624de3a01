#![forbid(unsafe_code)]

//! Machine phases and the events that drive them.

use std::fmt;

use crate::geometry::Point;
use crate::identity::TargetId;

// ---------------------------------------------------------------------------
// DragPhase
// ---------------------------------------------------------------------------

/// Where a machine is in the drag cycle.
///
/// `Idle → PreDrag → Dragging ⇄ InDropArea → Idle`. There is no terminal
/// phase; a machine cycles until its group is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Pointer is down on a draggable; travel has not reached the threshold.
    PreDrag,
    Dragging,
    /// Dragging while over an eligible drop area.
    InDropArea,
}

impl DragPhase {
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Any phase with an owner: pre-drag, dragging or in a drop area.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.is_idle()
    }

    /// A confirmed drag, inside a drop area or not.
    #[must_use]
    pub const fn is_dragging(self) -> bool {
        matches!(self, Self::Dragging | Self::InDropArea)
    }

    /// Stable lowercase name, as used for `data-state` style markers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PreDrag => "preDrag",
            Self::Dragging => "dragging",
            Self::InDropArea => "inDropArea",
        }
    }
}

impl fmt::Display for DragPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An input to a drag machine.
///
/// `PointerMove` and `PointerUp` are window-level: they arrive through the
/// machine's own listeners, not from the element under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum MachineEvent<P> {
    /// Pointer pressed on a draggable element.
    PointerDown {
        target: TargetId,
        pos: Point,
        payload: Option<P>,
    },
    PointerMove {
        pos: Point,
    },
    PointerUp {
        pos: Point,
    },
    /// A non-owner drop area reports the pointer entering it.
    DropAreaEnter,
    /// A non-owner drop area reports the pointer leaving it.
    DropAreaLeave,
    /// Replace the payload. Accepted in every phase.
    SetPayload(Option<P>),
}

impl<P> MachineEvent<P> {
    /// Shorthand for a pointer-down at `(x, y)`.
    #[must_use]
    pub fn down(target: TargetId, x: f64, y: f64, payload: Option<P>) -> Self {
        Self::PointerDown {
            target,
            pos: Point::new(x, y),
            payload,
        }
    }

    /// Shorthand for a global pointer-move to `(x, y)`.
    #[must_use]
    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            pos: Point::new(x, y),
        }
    }

    /// Shorthand for a global pointer-up at `(x, y)`.
    #[must_use]
    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            pos: Point::new(x, y),
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerDown { .. } => EventKind::PointerDown,
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::PointerUp { .. } => EventKind::PointerUp,
            Self::DropAreaEnter => EventKind::DropAreaEnter,
            Self::DropAreaLeave => EventKind::DropAreaLeave,
            Self::SetPayload(_) => EventKind::SetPayload,
        }
    }

    /// Pointer position carried by the event, if any.
    #[must_use]
    pub fn pos(&self) -> Option<Point> {
        match self {
            Self::PointerDown { pos, .. } | Self::PointerMove { pos } | Self::PointerUp { pos } => {
                Some(*pos)
            }
            _ => None,
        }
    }
}

/// Payload-free discriminant of [`MachineEvent`], used as a transition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    DropAreaEnter,
    DropAreaLeave,
    SetPayload,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PointerDown => "pointer-down",
            Self::PointerMove => "pointer-move",
            Self::PointerUp => "pointer-up",
            Self::DropAreaEnter => "drop-area-enter",
            Self::DropAreaLeave => "drop-area-leave",
            Self::SetPayload => "set-payload",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_predicates() {
        assert!(DragPhase::Idle.is_idle());
        assert!(!DragPhase::Idle.is_active());
        assert!(DragPhase::PreDrag.is_active());
        assert!(!DragPhase::PreDrag.is_dragging());
        assert!(DragPhase::Dragging.is_dragging());
        assert!(DragPhase::InDropArea.is_dragging());
    }

    #[test]
    fn phase_names_are_stable() {
        assert_eq!(DragPhase::PreDrag.to_string(), "preDrag");
        assert_eq!(DragPhase::InDropArea.as_str(), "inDropArea");
    }

    #[test]
    fn event_kind_and_pos() {
        let down: MachineEvent<()> = MachineEvent::down(TargetId::new(1), 3.0, 4.0, None);
        assert_eq!(down.kind(), EventKind::PointerDown);
        assert_eq!(down.pos(), Some(Point::new(3.0, 4.0)));
        assert_eq!(MachineEvent::<()>::DropAreaEnter.pos(), None);
        assert_eq!(MachineEvent::<()>::up(0.0, 0.0).kind(), EventKind::PointerUp);
    }
}
