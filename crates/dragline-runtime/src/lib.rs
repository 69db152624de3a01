#![forbid(unsafe_code)]

//! Runtime: machine services, the group registry and element bindings.
//!
//! # Role in Dragline
//! `dragline-runtime` hosts [`DragMachine`](dragline_core::DragMachine)s. Each
//! interaction group gets one [`MachineHandle`] from the [`Registry`]; elements
//! attach through [`DragBinding`], which forwards their pointer events and
//! turns published snapshots into callbacks and overlay placement.
//!
//! # Wiring
//!
//! ```
//! use dragline_core::{Anchor, Point};
//! use dragline_runtime::{BoundsTable, DragBinding, DragOptions, PointerBus, Registry};
//!
//! let bus = PointerBus::new();
//! let bounds = BoundsTable::new();
//! let registry: Registry<&str> = Registry::new(bus.clone(), bounds.clone());
//!
//! let card = DragBinding::attach(&registry, "board", DragOptions::new().draggable(true).data("card"));
//! let slot = DragBinding::attach(&registry, "board", DragOptions::new().drop_area(true));
//! bounds.mount(card.id(), Anchor::new(8.0, 16.0));
//!
//! card.pointer_down(Point::new(100.0, 100.0)).unwrap();
//! bus.emit_move(Point::new(100.0, 125.0));
//! assert!(card.is_dragging());
//!
//! // Element-level release first, then the window-level one.
//! assert!(slot.pointer_enter().unwrap());
//! assert!(slot.pointer_up().unwrap());
//! bus.emit_up(Point::new(100.0, 125.0));
//! assert!(!card.is_dragging());
//! ```
//!
//! A host must forward an element's pointer-up to its binding before the
//! same release reaches [`PointerBus::emit_up`]; the window-level pointer-up
//! ends the drag, and a drop reported after it is not announced.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); run one registry per
//! UI thread.

pub mod binding;
pub mod bounds;
pub mod observers;
pub mod pointer_bus;
pub mod registry;
pub mod service;

pub use binding::{DragBinding, DragOptions, Overlay};
pub use bounds::{BoundsProvider, BoundsTable};
pub use observers::{Observers, Subscription};
pub use pointer_bus::{PointerBus, PointerSink, PointerSource};
pub use registry::Registry;
pub use service::MachineHandle;
