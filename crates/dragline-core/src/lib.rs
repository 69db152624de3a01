#![forbid(unsafe_code)]

//! Core: the threshold-gated drag interaction state machine.
//!
//! # Role in Dragline
//! `dragline-core` owns the per-group [`DragMachine`](machine::DragMachine):
//! phases, drag context, the transition table, and the listener handles a
//! machine holds while a drag is live. It has no notion of hosts, groups or
//! observers; all side effects go through [`DragEnv`](env::DragEnv).
//!
//! # Primary responsibilities
//! - **Machine**: `idle → preDrag → dragging ⇄ inDropArea → idle`, gated by a
//!   Euclidean travel threshold so a click never becomes a drag.
//! - **Transition table**: explicit `(phase, event) → (guard, actions, next)`
//!   rules in [`transition`].
//! - **Listener lifecycle**: cancellable pointer-move/pointer-up listener pairs
//!   that are stopped before any new pair starts.
//! - **Notices**: `Started`/`Ended`/`Aborted` plus the drop-area notices.
//!
//! # How it fits in the system
//! `dragline-runtime` wraps each machine in a single-threaded service with an
//! event queue, binds `DragEnv` to a global pointer bus and a bounds table,
//! and keeps one service per interaction group in its registry.

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod event;
pub mod geometry;
pub mod identity;
pub mod listener;
pub mod machine;
pub mod notice;
pub mod transition;

pub use config::DragConfig;
pub use context::{DragContext, Snapshot};
pub use env::DragEnv;
pub use error::{ConfigError, DragError, ListenerError, MeasureError};
pub use event::{DragPhase, EventKind, MachineEvent};
pub use geometry::{Anchor, Displacement, Point};
pub use identity::{GroupId, TargetId};
pub use listener::{ListenerId, ListenerToken, PointerStream};
pub use machine::{DragMachine, Step};
pub use notice::DragNotice;
