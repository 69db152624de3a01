#![forbid(unsafe_code)]

//! Bounding-box lookup for drag owners.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use dragline_core::{Anchor, MeasureError, TargetId};

/// Reports the top-left corner of a mounted element.
pub trait BoundsProvider {
    fn measure(&self, target: TargetId) -> Result<Anchor, MeasureError>;
}

impl<F> BoundsProvider for F
where
    F: Fn(TargetId) -> Result<Anchor, MeasureError>,
{
    fn measure(&self, target: TargetId) -> Result<Anchor, MeasureError> {
        self(target)
    }
}

/// Host-maintained table of element anchors.
///
/// Clones share the same table, so the host can keep one clone to update
/// layouts while the registry measures through another.
#[derive(Debug, Clone, Default)]
pub struct BoundsTable {
    anchors: Rc<RefCell<AHashMap<TargetId, Anchor>>>,
}

impl BoundsTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or update an element's anchor.
    pub fn mount(&self, target: TargetId, anchor: Anchor) {
        self.anchors.borrow_mut().insert(target, anchor);
    }

    /// Forget an element. Returns its last anchor.
    pub fn unmount(&self, target: TargetId) -> Option<Anchor> {
        self.anchors.borrow_mut().remove(&target)
    }

    #[must_use]
    pub fn get(&self, target: TargetId) -> Option<Anchor> {
        self.anchors.borrow().get(&target).copied()
    }
}

impl BoundsProvider for BoundsTable {
    fn measure(&self, target: TargetId) -> Result<Anchor, MeasureError> {
        self.get(target).ok_or(MeasureError::Unmounted(target))
    }
}
