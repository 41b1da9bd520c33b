//! Synchronous bookkeeping behind the manager's mutex.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::watch;
use web_time::{Duration, Instant};

use super::ViewerId;
use crate::engine::{Container, EngineViewer};
use crate::error::MolmountError;
use crate::viewer::ViewerInstance;

/// Outcome shared with everyone waiting on one initialization. Errors are
/// carried as text so every joiner gets its own copy.
pub(crate) type InitOutcome<V> = Result<Arc<ViewerInstance<V>>, String>;

/// Receiving side of an in-flight initialization.
pub(crate) type InitWatch<V> = watch::Receiver<Option<InitOutcome<V>>>;

pub(crate) struct Entry<C, V> {
    pub(crate) container: C,
    pub(crate) instance: Arc<ViewerInstance<V>>,
    refcount: usize,
    last_touched: Instant,
}

pub(crate) struct Registry<C, V> {
    by_container: FxHashMap<C, ViewerId>,
    entries: FxHashMap<ViewerId, Entry<C, V>>,
    pub(crate) initializing: FxHashMap<C, InitWatch<V>>,
}

impl<C, V> Default for Registry<C, V> {
    fn default() -> Self {
        Self {
            by_container: FxHashMap::default(),
            entries: FxHashMap::default(),
            initializing: FxHashMap::default(),
        }
    }
}

impl<C: Container, V: EngineViewer> Registry<C, V> {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Count one more user of `id`. `None` if it is not registered.
    pub(crate) fn touch(
        &mut self,
        id: ViewerId,
        now: Instant,
    ) -> Option<Arc<ViewerInstance<V>>> {
        let entry = self.entries.get_mut(&id)?;
        entry.refcount += 1;
        entry.last_touched = now;
        Some(Arc::clone(&entry.instance))
    }

    /// Instance registered for exactly `container`, with its refcount
    /// bumped.
    pub(crate) fn acquire(
        &mut self,
        container: &C,
        now: Instant,
    ) -> Option<Arc<ViewerInstance<V>>> {
        let id = *self.by_container.get(container)?;
        self.touch(id, now)
    }

    /// Instance of the innermost managed container enclosing `container`,
    /// with its refcount bumped.
    pub(crate) fn acquire_enclosing(
        &mut self,
        container: &C,
        now: Instant,
    ) -> Option<Arc<ViewerInstance<V>>> {
        let mut innermost: Option<(&C, ViewerId)> = None;
        for (managed, id) in &self.by_container {
            if !managed.contains(container) {
                continue;
            }
            // Enclosing containers form a chain; keep the deepest.
            if innermost.map_or(true, |(best, _)| best.contains(managed)) {
                innermost = Some((managed, *id));
            }
        }
        let (_, id) = innermost?;
        self.touch(id, now)
    }

    pub(crate) fn insert(
        &mut self,
        container: C,
        instance: Arc<ViewerInstance<V>>,
        now: Instant,
    ) {
        let id = instance.id();
        let _ = self.by_container.insert(container.clone(), id);
        let _ = self.entries.insert(
            id,
            Entry {
                container,
                instance,
                refcount: 1,
                last_touched: now,
            },
        );
    }

    /// Drop one reference, never below zero.
    pub(crate) fn release(
        &mut self,
        id: ViewerId,
        now: Instant,
    ) -> Result<usize, MolmountError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(MolmountError::UnmanagedResource(id))?;
        entry.refcount = entry.refcount.saturating_sub(1);
        entry.last_touched = now;
        Ok(entry.refcount)
    }

    pub(crate) fn refcount(&self, id: ViewerId) -> Option<usize> {
        self.entries.get(&id).map(|e| e.refcount)
    }

    pub(crate) fn remove(&mut self, id: ViewerId) -> Option<Entry<C, V>> {
        let entry = self.entries.remove(&id)?;
        let _ = self.by_container.remove(&entry.container);
        Some(entry)
    }

    pub(crate) fn remove_container(
        &mut self,
        container: &C,
    ) -> Option<Entry<C, V>> {
        let id = *self.by_container.get(container)?;
        self.remove(id)
    }

    /// Remove and return every unreferenced entry idle for longer than
    /// `grace`.
    pub(crate) fn take_idle(
        &mut self,
        now: Instant,
        grace: Duration,
    ) -> Vec<Entry<C, V>> {
        let expired: Vec<ViewerId> = self
            .entries
            .iter()
            .filter(|(_, e)| {
                e.refcount == 0
                    && now.saturating_duration_since(e.last_touched) > grace
            })
            .map(|(id, _)| *id)
            .collect();
        expired.into_iter().filter_map(|id| self.remove(id)).collect()
    }
}
