#![forbid(unsafe_code)]

//! The drag transition table.
//!
//! Each [`Rule`] maps `(phase, event)` to an optional guard, an ordered list
//! of [`Action`]s and a target phase. Lookup returns the first rule whose
//! phase, event and guard all match; phase-specific rules are listed before
//! the phase-independent ones. An event with no matching rule is ignored.
//!
//! | From        | Event           | Guard     | Next        |
//! |-------------|-----------------|-----------|-------------|
//! | idle        | pointer-down    |           | preDrag     |
//! | preDrag     | pointer-move    | outside   | dragging    |
//! | preDrag     | pointer-move    | within    | (stay)      |
//! | preDrag     | pointer-up      |           | idle        |
//! | dragging    | pointer-move    |           | (stay)      |
//! | dragging    | pointer-up      |           | idle        |
//! | dragging    | drop-area-enter |           | inDropArea  |
//! | inDropArea  | pointer-move    |           | (stay)      |
//! | inDropArea  | pointer-up      |           | idle        |
//! | inDropArea  | drop-area-leave |           | dragging    |
//! | any         | set-payload     |           | (stay)      |

use crate::event::{DragPhase, EventKind};

/// Condition evaluated against the context and the incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Travel from the origin reaches the threshold.
    OutsideThreshold,
    /// Travel from the origin is below the threshold.
    WithinThreshold,
}

/// A step executed while taking a transition, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Store owner, origin and payload from a pointer-down.
    RecordPointerDown,
    StartProbes,
    StopProbes,
    /// Query the owner's bounding box. Failure aborts the transition.
    MeasureAnchor,
    /// Failure aborts the transition.
    StartDragListeners,
    StopDragListeners,
    /// `offset = pos - origin`.
    TrackOffset,
    AssignPayload,
    NotifyStarted,
    NotifyEnded,
    ResetContext,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// `None` matches every phase.
    pub from: Option<DragPhase>,
    pub on: EventKind,
    pub guard: Option<Guard>,
    pub actions: &'static [Action],
    /// `None` keeps the current phase.
    pub to: Option<DragPhase>,
}

impl Rule {
    fn matches(&self, phase: DragPhase, kind: EventKind) -> bool {
        self.on == kind && self.from.is_none_or(|from| from == phase)
    }
}

const END_DRAG: &[Action] = &[
    Action::StopDragListeners,
    Action::NotifyEnded,
    Action::ResetContext,
];

const MOVE: &[Action] = &[Action::TrackOffset];

/// The full table.
pub static RULES: &[Rule] = &[
    Rule {
        from: Some(DragPhase::Idle),
        on: EventKind::PointerDown,
        guard: None,
        actions: &[Action::RecordPointerDown, Action::StartProbes],
        to: Some(DragPhase::PreDrag),
    },
    Rule {
        from: Some(DragPhase::PreDrag),
        on: EventKind::PointerMove,
        guard: Some(Guard::OutsideThreshold),
        actions: &[
            Action::StopProbes,
            Action::MeasureAnchor,
            Action::StartDragListeners,
            Action::TrackOffset,
            Action::NotifyStarted,
        ],
        to: Some(DragPhase::Dragging),
    },
    Rule {
        from: Some(DragPhase::PreDrag),
        on: EventKind::PointerMove,
        guard: Some(Guard::WithinThreshold),
        actions: &[],
        to: None,
    },
    Rule {
        from: Some(DragPhase::PreDrag),
        on: EventKind::PointerUp,
        guard: None,
        actions: &[Action::StopProbes, Action::ResetContext],
        to: Some(DragPhase::Idle),
    },
    Rule {
        from: Some(DragPhase::Dragging),
        on: EventKind::PointerMove,
        guard: None,
        actions: MOVE,
        to: None,
    },
    Rule {
        from: Some(DragPhase::Dragging),
        on: EventKind::PointerUp,
        guard: None,
        actions: END_DRAG,
        to: Some(DragPhase::Idle),
    },
    Rule {
        from: Some(DragPhase::Dragging),
        on: EventKind::DropAreaEnter,
        guard: None,
        actions: &[],
        to: Some(DragPhase::InDropArea),
    },
    Rule {
        from: Some(DragPhase::InDropArea),
        on: EventKind::PointerMove,
        guard: None,
        actions: MOVE,
        to: None,
    },
    Rule {
        from: Some(DragPhase::InDropArea),
        on: EventKind::PointerUp,
        guard: None,
        actions: END_DRAG,
        to: Some(DragPhase::Idle),
    },
    Rule {
        from: Some(DragPhase::InDropArea),
        on: EventKind::DropAreaLeave,
        guard: None,
        actions: &[],
        to: Some(DragPhase::Dragging),
    },
    Rule {
        from: None,
        on: EventKind::SetPayload,
        guard: None,
        actions: &[Action::AssignPayload],
        to: None,
    },
];

/// First rule for `(phase, kind)` whose guard holds.
pub fn lookup(
    phase: DragPhase,
    kind: EventKind,
    mut guard_holds: impl FnMut(Guard) -> bool,
) -> Option<&'static Rule> {
    RULES
        .iter()
        .filter(|rule| rule.matches(phase, kind))
        .find(|rule| rule.guard.is_none_or(&mut guard_holds))
}
