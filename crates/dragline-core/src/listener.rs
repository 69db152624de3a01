#![forbid(unsafe_code)]

//! Global pointer listeners owned by a machine.
//!
//! A machine holds at most two [`ListenerPair`]s: the pre-drag probes and the
//! drag listeners. Each pair is one pointer-move and one pointer-up listener.
//!
//! # Cancellation
//!
//! Every listener carries a [`ListenerToken`] whose [`CancelHandle`] stays with
//! the machine. Stopping a listener first flips the token and only then asks
//! the source to unregister it. A source that fails to unregister is logged and
//! otherwise ignored: the flipped token already keeps it from delivering into
//! a context that has been reset.
//!
//! # Invariants
//!
//! 1. `stop` is idempotent; stopping an empty pair does nothing.
//! 2. `start` stops any previous listeners before registering new ones.
//! 3. If the second registration fails, the first is stopped before the
//!    error is returned, so a failed `start` leaves the pair empty.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::env::DragEnv;
use crate::error::ListenerError;

/// Which window-level pointer stream a listener observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerStream {
    Move,
    Up,
}

impl fmt::Display for PointerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Move => "pointer-move",
            Self::Up => "pointer-up",
        })
    }
}

/// Id a pointer source assigns to a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// What a listener pair is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerRole {
    /// Threshold probes installed while in pre-drag.
    Probe,
    /// Long-lived listeners installed while a drag is active.
    Drag,
}

impl fmt::Display for ListenerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Probe => "probe",
            Self::Drag => "drag",
        })
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Machine-side control of one listener's liveness.
///
/// Dropping the handle does **not** cancel the token; call
/// [`cancel`](Self::cancel) explicitly.
#[derive(Debug)]
pub struct CancelHandle {
    cancelled: Rc<Cell<bool>>,
}

/// Source-side view of a listener's liveness. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ListenerToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelHandle {
    /// Create a live handle and its token.
    #[must_use]
    pub fn new() -> (Self, ListenerToken) {
        let cancelled = Rc::new(Cell::new(false));
        let token = ListenerToken {
            cancelled: Rc::clone(&cancelled),
        };
        (Self { cancelled }, token)
    }

    /// Mark the listener dead. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl ListenerToken {
    /// Returns `true` once the owning machine has cancelled this listener.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

// ---------------------------------------------------------------------------
// Listener pairs
// ---------------------------------------------------------------------------

/// A registered listener and the handle that cancels it.
#[derive(Debug)]
struct ActiveListener {
    id: ListenerId,
    stream: PointerStream,
    cancel: CancelHandle,
}

/// One pointer-move and one pointer-up listener, started and stopped together.
#[derive(Debug)]
pub struct ListenerPair {
    role: ListenerRole,
    moves: Option<ActiveListener>,
    ups: Option<ActiveListener>,
    starts: u64,
}

impl ListenerPair {
    #[must_use]
    pub fn new(role: ListenerRole) -> Self {
        Self {
            role,
            moves: None,
            ups: None,
            starts: 0,
        }
    }

    #[must_use]
    pub fn role(&self) -> ListenerRole {
        self.role
    }

    /// Number of listeners currently registered (0, 1 or 2).
    #[must_use]
    pub fn active(&self) -> usize {
        usize::from(self.moves.is_some()) + usize::from(self.ups.is_some())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.moves.is_some() && self.ups.is_some()
    }

    /// How many times this pair has been started successfully.
    #[must_use]
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Register both listeners, replacing any that are still running.
    pub fn start(&mut self, env: &mut dyn DragEnv) -> Result<(), ListenerError> {
        self.stop(env);

        let moves = register(env, PointerStream::Move)?;
        self.moves = Some(moves);
        match register(env, PointerStream::Up) {
            Ok(ups) => {
                self.ups = Some(ups);
                self.starts += 1;
                Ok(())
            }
            Err(err) => {
                self.stop(env);
                Err(err)
            }
        }
    }

    /// Cancel and unregister both listeners. Cleanup failures are logged only.
    pub fn stop(&mut self, env: &mut dyn DragEnv) {
        let role = self.role;
        for listener in [self.moves.take(), self.ups.take()].into_iter().flatten() {
            listener.cancel.cancel();
            if let Err(err) = env.unlisten(listener.id) {
                warn!(
                    %role,
                    listener = %listener.id,
                    stream = %listener.stream,
                    error = %err,
                    "listener cleanup failed; continuing"
                );
            }
        }
    }
}

fn register(env: &mut dyn DragEnv, stream: PointerStream) -> Result<ActiveListener, ListenerError> {
    let (cancel, token) = CancelHandle::new();
    let id = env.listen(stream, token)?;
    Ok(ActiveListener { id, stream, cancel })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeasureError;
    use crate::geometry::Anchor;
    use crate::identity::TargetId;

    #[derive(Default)]
    struct CountingEnv {
        next: u64,
        live: Vec<(ListenerId, ListenerToken)>,
        refuse: Option<PointerStream>,
        fail_unlisten: bool,
    }

    impl DragEnv for CountingEnv {
        fn measure(&mut self, target: TargetId) -> Result<Anchor, MeasureError> {
            Err(MeasureError::Unmounted(target))
        }

        fn listen(
            &mut self,
            stream: PointerStream,
            token: ListenerToken,
        ) -> Result<ListenerId, ListenerError> {
            if self.refuse == Some(stream) {
                return Err(ListenerError::Refused { stream });
            }
            self.next += 1;
            let id = ListenerId::new(self.next);
            self.live.push((id, token));
            Ok(id)
        }

        fn unlisten(&mut self, id: ListenerId) -> Result<(), ListenerError> {
            if self.fail_unlisten {
                return Err(ListenerError::Unknown(id));
            }
            let before = self.live.len();
            self.live.retain(|(live, _)| *live != id);
            if self.live.len() == before {
                return Err(ListenerError::Unknown(id));
            }
            Ok(())
        }
    }

    #[test]
    fn cancel_handle_flips_token() {
        let (handle, token) = CancelHandle::new();
        assert!(!token.is_cancelled());
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn dropping_handle_does_not_cancel() {
        let (handle, token) = CancelHandle::new();
        drop(handle);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn start_registers_both_streams() {
        let mut env = CountingEnv::default();
        let mut pair = ListenerPair::new(ListenerRole::Drag);
        pair.start(&mut env).unwrap();
        assert!(pair.is_running());
        assert_eq!(pair.active(), 2);
        assert_eq!(pair.starts(), 1);
        assert_eq!(env.live.len(), 2);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut env = CountingEnv::default();
        let mut pair = ListenerPair::new(ListenerRole::Drag);
        pair.start(&mut env).unwrap();
        pair.stop(&mut env);
        pair.stop(&mut env);
        assert_eq!(pair.active(), 0);
        assert!(env.live.is_empty());
    }

    #[test]
    fn restart_cancels_previous_listeners_first() {
        let mut env = CountingEnv::default();
        let mut pair = ListenerPair::new(ListenerRole::Drag);
        pair.start(&mut env).unwrap();
        let old_tokens: Vec<ListenerToken> = env.live.iter().map(|(_, t)| t.clone()).collect();

        pair.start(&mut env).unwrap();

        assert!(old_tokens.iter().all(ListenerToken::is_cancelled));
        assert_eq!(env.live.len(), 2);
        assert_eq!(pair.starts(), 2);
    }

    #[test]
    fn failed_second_registration_leaves_pair_empty() {
        let mut env = CountingEnv {
            refuse: Some(PointerStream::Up),
            ..CountingEnv::default()
        };
        let mut pair = ListenerPair::new(ListenerRole::Drag);
        let err = pair.start(&mut env).unwrap_err();
        assert_eq!(
            err,
            ListenerError::Refused {
                stream: PointerStream::Up
            }
        );
        assert_eq!(pair.active(), 0);
        assert!(env.live.is_empty());
        assert_eq!(pair.starts(), 0);
    }

    #[test]
    fn failed_cleanup_still_cancels_tokens() {
        let mut env = CountingEnv::default();
        let mut pair = ListenerPair::new(ListenerRole::Probe);
        pair.start(&mut env).unwrap();
        env.fail_unlisten = true;

        pair.stop(&mut env);

        assert_eq!(pair.active(), 0);
        assert!(env.live.iter().all(|(_, t)| t.is_cancelled()));
    }
}
