#![forbid(unsafe_code)]

//! The drag interaction state machine.
//!
//! [`DragMachine`] consumes [`MachineEvent`]s one at a time, looks up the
//! matching [`Rule`](crate::transition::Rule) and runs its actions against the
//! context and a [`DragEnv`]. It never blocks and never queues; callers that
//! receive events re-entrantly (listeners firing while a step runs) queue them
//! and feed them in order.
//!
//! # Invariants
//!
//! 1. The context owner is set iff the phase is not idle.
//! 2. The offset is zero whenever the phase is idle.
//! 3. Probe listeners run iff the phase is pre-drag.
//! 4. Drag listeners run iff the phase is dragging or in-drop-area, and exactly
//!    one pair runs at a time.
//! 5. A drag that never reaches the threshold emits neither `Started` nor
//!    `Ended`. It may still emit `Aborted` if its probe listeners are refused.
//!
//! # Failure Modes
//!
//! - If the bounding box cannot be measured, or a listener cannot be
//!   registered, the machine returns to idle, stops every listener it holds and
//!   emits [`DragNotice::Aborted`]. No `Started` is emitted for that drag.
//! - If a listener cannot be unregistered, the failure is logged and the
//!   transition completes anyway; the listener's token is already cancelled.

use tracing::{debug, trace, warn};

use crate::config::DragConfig;
use crate::context::{DragContext, Snapshot};
use crate::env::DragEnv;
use crate::error::{DragError, MeasureError};
use crate::event::{DragPhase, MachineEvent};
use crate::geometry::{Displacement, Point};
use crate::listener::{ListenerPair, ListenerRole};
use crate::notice::DragNotice;
use crate::transition::{self, Action, Guard};

/// Result of feeding one event to a machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<P> {
    pub from: DragPhase,
    pub to: DragPhase,
    /// Whether a rule matched. Ignored events leave phase and context untouched.
    pub handled: bool,
    pub notices: Vec<DragNotice<P>>,
}

impl<P> Step<P> {
    fn ignored(phase: DragPhase) -> Self {
        Self {
            from: phase,
            to: phase,
            handled: false,
            notices: Vec::new(),
        }
    }

    #[must_use]
    pub fn changed_phase(&self) -> bool {
        self.from != self.to
    }
}

/// A single interaction group's drag state machine.
pub struct DragMachine<P> {
    phase: DragPhase,
    ctx: DragContext<P>,
    probes: ListenerPair,
    drag: ListenerPair,
}

impl<P> std::fmt::Debug for DragMachine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragMachine")
            .field("phase", &self.phase)
            .field("owner", &self.ctx.owner)
            .field("offset", &self.ctx.offset)
            .field("listeners", &(self.probes.active() + self.drag.active()))
            .finish_non_exhaustive()
    }
}

impl<P: Clone> DragMachine<P> {
    /// Create an idle machine.
    #[must_use]
    pub fn new(config: &DragConfig) -> Self {
        Self {
            phase: DragPhase::Idle,
            ctx: DragContext::new(config.threshold),
            probes: ListenerPair::new(ListenerRole::Probe),
            drag: ListenerPair::new(ListenerRole::Drag),
        }
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    #[must_use]
    pub fn context(&self) -> &DragContext<P> {
        &self.ctx
    }

    /// Phase and context as one owned value.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<P> {
        Snapshot::capture(self.phase, &self.ctx)
    }

    /// Listeners currently registered, probes and drag listeners together.
    #[must_use]
    pub fn active_listeners(&self) -> usize {
        self.probes.active() + self.drag.active()
    }

    /// How many times drag listeners have been started over the machine's life.
    #[must_use]
    pub fn drag_listener_starts(&self) -> u64 {
        self.drag.starts()
    }

    /// Feed one event.
    pub fn step(&mut self, mut event: MachineEvent<P>, env: &mut dyn DragEnv) -> Step<P> {
        let from = self.phase;
        let kind = event.kind();
        let pos = event.pos();

        let ctx = &self.ctx;
        let Some(rule) = transition::lookup(from, kind, |guard| guard_holds(ctx, guard, pos))
        else {
            trace!(phase = %from, event = %kind, "event ignored");
            return Step::ignored(from);
        };

        let mut notices = Vec::new();
        for &action in rule.actions {
            if let Err(reason) = self.run(action, &mut event, env, &mut notices) {
                self.abort(reason, env, &mut notices);
                return Step {
                    from,
                    to: self.phase,
                    handled: true,
                    notices,
                };
            }
        }

        if let Some(to) = rule.to {
            self.phase = to;
        }
        if from != self.phase {
            debug!(from = %from, to = %self.phase, event = %kind, "transition");
        }
        self.check_invariants();

        Step {
            from,
            to: self.phase,
            handled: true,
            notices,
        }
    }

    /// Stop every listener and return to idle without emitting notices.
    ///
    /// Returns `true` if an interaction was in progress.
    pub fn shutdown(&mut self, env: &mut dyn DragEnv) -> bool {
        let interrupted = self.phase.is_active();
        self.drag.stop(env);
        self.probes.stop(env);
        self.ctx.reset();
        if interrupted {
            debug!(from = %self.phase, "machine shut down mid-interaction");
        }
        self.phase = DragPhase::Idle;
        self.check_invariants();
        interrupted
    }

    fn run(
        &mut self,
        action: Action,
        event: &mut MachineEvent<P>,
        env: &mut dyn DragEnv,
        notices: &mut Vec<DragNotice<P>>,
    ) -> Result<(), DragError> {
        match action {
            Action::RecordPointerDown => {
                if let MachineEvent::PointerDown {
                    target,
                    pos,
                    payload,
                } = event
                {
                    self.ctx.owner = Some(*target);
                    self.ctx.origin = *pos;
                    self.ctx.payload = payload.take();
                    self.ctx.offset = Displacement::ZERO;
                }
            }
            Action::StartProbes => self.probes.start(env)?,
            Action::StopProbes => self.probes.stop(env),
            Action::MeasureAnchor => {
                if let Some(owner) = self.ctx.owner {
                    let anchor = env.measure(owner)?;
                    if !anchor.is_finite() {
                        return Err(MeasureError::NonFinite(owner).into());
                    }
                    self.ctx.anchor = anchor;
                }
            }
            Action::StartDragListeners => self.drag.start(env)?,
            Action::StopDragListeners => self.drag.stop(env),
            Action::TrackOffset => {
                if let Some(pos) = event.pos() {
                    self.ctx.offset = pos - self.ctx.origin;
                }
            }
            Action::AssignPayload => {
                if let MachineEvent::SetPayload(payload) = event {
                    self.ctx.payload = payload.take();
                }
            }
            Action::NotifyStarted => {
                if let Some(owner) = self.ctx.owner {
                    notices.push(DragNotice::Started {
                        owner,
                        payload: self.ctx.payload.clone(),
                    });
                }
            }
            Action::NotifyEnded => {
                if let Some(owner) = self.ctx.owner {
                    notices.push(DragNotice::Ended {
                        owner,
                        payload: self.ctx.payload.clone(),
                    });
                }
            }
            Action::ResetContext => self.ctx.reset(),
        }
        Ok(())
    }

    fn abort(&mut self, reason: DragError, env: &mut dyn DragEnv, notices: &mut Vec<DragNotice<P>>) {
        warn!(phase = %self.phase, error = %reason, "drag aborted");
        let owner = self.ctx.owner;
        self.drag.stop(env);
        self.probes.stop(env);
        self.ctx.reset();
        self.phase = DragPhase::Idle;
        if let Some(owner) = owner {
            notices.push(DragNotice::Aborted { owner, reason });
        }
        self.check_invariants();
    }

    fn check_invariants(&self) {
        debug_assert_eq!(self.ctx.owner.is_some(), self.phase.is_active());
        debug_assert!(self.phase.is_active() || self.ctx.offset.is_zero());
        debug_assert_eq!(self.probes.is_running(), self.phase == DragPhase::PreDrag);
        debug_assert_eq!(self.drag.is_running(), self.phase.is_dragging());
    }
}

fn guard_holds<P>(ctx: &DragContext<P>, guard: Guard, pos: Option<Point>) -> bool {
    let travel = pos.map_or(Displacement::ZERO, |pos| pos - ctx.origin);
    match guard {
        Guard::OutsideThreshold => travel.reaches(ctx.threshold),
        Guard::WithinThreshold => !travel.reaches(ctx.threshold),
    }
}
