#![forbid(unsafe_code)]

//! Group registry: one machine service per interaction group.
//!
//! # Lifecycle
//!
//! - [`Registry::acquire`] returns the group's service, creating an idle one
//!   on first use, and counts one more consumer.
//! - [`Registry::release`] counts one consumer fewer. At zero the service is
//!   stopped (listeners cancelled, further sends refused) and the entry is
//!   removed. A later `acquire` for the same group starts a fresh service.
//! - [`Registry::release_handle`] does the same for one specific service and
//!   ignores handles whose service was already replaced.
//!
//! Groups are fully independent: each service owns its own machine, queue
//! and observers.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use dragline_core::{ConfigError, DragConfig, GroupId};
use tracing::{debug, info};

use crate::bounds::BoundsProvider;
use crate::pointer_bus::PointerSource;
use crate::service::MachineHandle;

struct Entry<P: 'static> {
    handle: MachineHandle<P>,
    consumers: usize,
}

struct RegistryInner<P: 'static> {
    config: DragConfig,
    source: Rc<dyn PointerSource>,
    bounds: Rc<dyn BoundsProvider>,
    entries: AHashMap<GroupId, Entry<P>>,
}

/// Map from group id to running machine service.
///
/// Cloning a `Registry` yields another handle to the same map.
pub struct Registry<P: 'static> {
    inner: Rc<RefCell<RegistryInner<P>>>,
}

impl<P: 'static> Clone for Registry<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: 'static> std::fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Registry")
            .field("config", &inner.config)
            .field("groups", &inner.entries.len())
            .finish_non_exhaustive()
    }
}

impl<P: Clone + 'static> Registry<P> {
    /// Registry with the default [`DragConfig`].
    pub fn new(
        source: impl PointerSource + 'static,
        bounds: impl BoundsProvider + 'static,
    ) -> Self {
        Self::from_parts(DragConfig::default(), Rc::new(source), Rc::new(bounds))
    }

    /// Registry whose machines all use `config`.
    pub fn with_config(
        config: DragConfig,
        source: impl PointerSource + 'static,
        bounds: impl BoundsProvider + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, Rc::new(source), Rc::new(bounds)))
    }

    fn from_parts(
        config: DragConfig,
        source: Rc<dyn PointerSource>,
        bounds: Rc<dyn BoundsProvider>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                config,
                source,
                bounds,
                entries: AHashMap::new(),
            })),
        }
    }

    /// The group's service, started on first use. Counts one consumer.
    pub fn acquire(&self, group: impl Into<GroupId>) -> MachineHandle<P> {
        let group = group.into();
        let mut inner = self.inner.borrow_mut();
        let RegistryInner {
            config,
            source,
            bounds,
            entries,
        } = &mut *inner;

        let entry = entries.entry(group.clone()).or_insert_with(|| {
            info!(group = %group, threshold = config.threshold, "drag machine created");
            Entry {
                handle: MachineHandle::start(
                    group.clone(),
                    config,
                    Rc::clone(source),
                    Rc::clone(bounds),
                ),
                consumers: 0,
            }
        });
        entry.consumers += 1;
        debug!(group = %group, consumers = entry.consumers, "consumer attached");
        entry.handle.clone()
    }

    /// Drop one consumer of `group`. Returns `true` if this stopped the
    /// group's machine. Unknown groups are ignored.
    pub fn release(&self, group: &GroupId) -> bool {
        self.detach(group, None)
    }

    /// Drop one consumer of the service behind `handle`.
    ///
    /// A no-op if the group was already torn down, even when a newer service
    /// is now registered under the same name. Returns `true` if this stopped
    /// the machine.
    pub fn release_handle(&self, handle: &MachineHandle<P>) -> bool {
        self.detach(handle.group(), Some(handle))
    }

    fn detach(&self, group: &GroupId, expected: Option<&MachineHandle<P>>) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let Some(entry) = inner.entries.get_mut(group) else {
                return false;
            };
            if expected.is_some_and(|handle| !entry.handle.ptr_eq(handle)) {
                debug!(group = %group, "ignoring release of a replaced machine");
                return false;
            }
            entry.consumers = entry.consumers.saturating_sub(1);
            debug!(group = %group, consumers = entry.consumers, "consumer detached");
            if entry.consumers > 0 {
                return false;
            }
            inner.entries.remove(group)
        };

        match removed {
            Some(entry) => {
                entry.handle.stop();
                info!(group = %group, "drag machine destroyed");
                true
            }
            None => false,
        }
    }

    /// The group's service, without counting a consumer.
    #[must_use]
    pub fn get(&self, group: &GroupId) -> Option<MachineHandle<P>> {
        self.inner
            .borrow()
            .entries
            .get(group)
            .map(|entry| entry.handle.clone())
    }

    /// Number of live groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, group: &GroupId) -> bool {
        self.inner.borrow().entries.contains_key(group)
    }

    /// Consumers attached to `group`; zero for unknown groups.
    #[must_use]
    pub fn consumer_count(&self, group: &GroupId) -> usize {
        self.inner
            .borrow()
            .entries
            .get(group)
            .map_or(0, |entry| entry.consumers)
    }

    /// Configuration applied to new machines.
    #[must_use]
    pub fn config(&self) -> DragConfig {
        self.inner.borrow().config.clone()
    }
}
