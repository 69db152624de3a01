#![forbid(unsafe_code)]

//! The machine's view of its host.
//!
//! A [`DragMachine`](crate::machine::DragMachine) performs side effects only
//! through this trait: measuring the dragged element and registering global
//! pointer listeners. The runtime crate binds it to a pointer bus and a
//! bounds table; tests bind it to plain structs.

use crate::error::{ListenerError, MeasureError};
use crate::geometry::Anchor;
use crate::identity::TargetId;
use crate::listener::{ListenerId, ListenerToken, PointerStream};

/// Side effects a machine may request while handling an event.
pub trait DragEnv {
    /// Bounding-box query for `target`, called once when a drag is confirmed.
    fn measure(&mut self, target: TargetId) -> Result<Anchor, MeasureError>;

    /// Register a window-level listener on `stream`.
    ///
    /// Deliveries must feed back into the same machine's event queue and must
    /// stop as soon as `token` reports cancelled.
    fn listen(
        &mut self,
        stream: PointerStream,
        token: ListenerToken,
    ) -> Result<ListenerId, ListenerError>;

    /// Unregister a listener previously returned by [`listen`](Self::listen).
    fn unlisten(&mut self, id: ListenerId) -> Result<(), ListenerError>;
}
