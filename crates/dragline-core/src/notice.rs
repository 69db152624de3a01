#![forbid(unsafe_code)]

//! Application-visible drag notifications.
//!
//! # Invariants
//!
//! 1. A drag that never reached the threshold produces no `Started` or
//!    `Ended`. Refused probe listeners at pointer-down yield `Aborted` only.
//! 2. Every `Started` is followed by exactly one `Ended` for the same owner,
//!    unless the machine is shut down mid-drag.
//! 3. `Aborted` is never preceded by `Started` for the same interaction.
//! 4. Drop-area notices always name an `area` different from the owner.

use crate::error::DragError;
use crate::identity::TargetId;

/// Something an application may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum DragNotice<P> {
    /// Travel reached the threshold; the element is now being dragged.
    Started { owner: TargetId, payload: Option<P> },
    /// The drag finished on pointer-up.
    Ended { owner: TargetId, payload: Option<P> },
    /// Drag confirmation failed; the machine went back to idle.
    Aborted { owner: TargetId, reason: DragError },
    /// The pointer entered drop area `area` while dragging.
    AreaEnter { area: TargetId, payload: Option<P> },
    /// The pointer left drop area `area` while dragging.
    AreaLeave { area: TargetId, payload: Option<P> },
    /// The pointer was released over drop area `area`.
    AreaDrop { area: TargetId, payload: Option<P> },
}

impl<P> DragNotice<P> {
    /// The drop area a notice is addressed to, if it is a drop-area notice.
    #[must_use]
    pub fn area(&self) -> Option<TargetId> {
        match self {
            Self::AreaEnter { area, .. }
            | Self::AreaLeave { area, .. }
            | Self::AreaDrop { area, .. } => Some(*area),
            _ => None,
        }
    }

    /// The payload carried by the notice, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&P> {
        match self {
            Self::Started { payload, .. }
            | Self::Ended { payload, .. }
            | Self::AreaEnter { payload, .. }
            | Self::AreaLeave { payload, .. }
            | Self::AreaDrop { payload, .. } => payload.as_ref(),
            Self::Aborted { .. } => None,
        }
    }
}
