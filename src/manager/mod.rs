//! Reference-counted owner of the viewers mounted into containers.
//!
//! Each container gets at most one viewer. Mounts acquire it (creating it
//! on first use), release it when they go away, and a background sweep
//! disposes viewers nobody has referenced for the idle grace period.
//!
//! Per container the lifecycle is
//! `unmanaged → initializing → managed → disposed`. Concurrent acquires of
//! a container that is still initializing wait on a one-shot notification
//! and all observe the same outcome.
//!
//! The registry lives behind a `std::sync::Mutex` that is never held
//! across an `.await`.

mod clock;
mod registry;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub use clock::{Clock, ManualClock, SystemClock};
use registry::{InitOutcome, InitWatch, Registry};

use crate::engine::{Container, Engine, UiMode};
use crate::error::MolmountError;
use crate::options::LifecycleOptions;
use crate::viewer::ViewerInstance;

/// Opaque identity of a managed viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(u64);

impl ViewerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to a managed viewer.
pub type SharedViewer<E> = Arc<ViewerInstance<<E as Engine>::Viewer>>;

/// What an acquire call has to do, decided under the lock.
enum Claim<V> {
    Ready(Arc<ViewerInstance<V>>),
    Join(InitWatch<V>),
    Initialize(watch::Sender<Option<InitOutcome<V>>>),
}

/// Removes the container from the initializing set however the
/// initialization ends, including cancellation.
struct InitializingGuard<'a, E: Engine> {
    manager: &'a ViewerManager<E>,
    container: E::Container,
}

impl<E: Engine> Drop for InitializingGuard<'_, E> {
    fn drop(&mut self) {
        let _ = self.manager.lock().initializing.remove(&self.container);
    }
}

/// Owner of all viewers created through one [`Engine`].
pub struct ViewerManager<E: Engine> {
    engine: E,
    clock: Arc<dyn Clock>,
    lifecycle: LifecycleOptions,
    state: Mutex<Registry<E::Container, E::Viewer>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<E: Engine> fmt::Debug for ViewerManager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerManager")
            .field("viewers", &self.viewer_count())
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl<E: Engine> ViewerManager<E> {
    /// Manager on the system clock with default timings.
    pub fn new(engine: E) -> Self {
        Self::with_clock(
            engine,
            LifecycleOptions::default(),
            Arc::new(SystemClock),
        )
    }

    /// Manager with explicit timings and time source.
    pub fn with_clock(
        engine: E,
        lifecycle: LifecycleOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            clock,
            lifecycle,
            state: Mutex::new(Registry::default()),
            sweeper: Mutex::new(None),
        }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Idle timings in use.
    pub fn lifecycle(&self) -> &LifecycleOptions {
        &self.lifecycle
    }

    fn lock(&self) -> MutexGuard<'_, Registry<E::Container, E::Viewer>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registered viewers.
    pub fn viewer_count(&self) -> usize {
        self.lock().len()
    }

    /// Current reference count of a viewer, `None` if unregistered.
    pub fn refcount(
        &self,
        viewer: &ViewerInstance<E::Viewer>,
    ) -> Option<usize> {
        self.lock().refcount(viewer.id())
    }

    /// Whether `container` is being initialized right now.
    pub fn is_initializing(&self, container: &E::Container) -> bool {
        self.lock().initializing.contains_key(container)
    }

    fn claim(&self, container: &E::Container) -> Claim<E::Viewer> {
        let now = self.clock.now();
        let mut state = self.lock();

        if let Some(instance) = state.acquire(container, now) {
            return Claim::Ready(instance);
        }
        if container.has_mount_marker() {
            if let Some(instance) = state.acquire_enclosing(container, now) {
                log::debug!(
                    "Nested mount reuses enclosing viewer {}",
                    instance.id()
                );
                return Claim::Ready(instance);
            }
        }
        if let Some(rx) = state.initializing.get(container) {
            return Claim::Join(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        let _ = state.initializing.insert(container.clone(), rx);
        Claim::Initialize(tx)
    }

    /// Viewer for `container`, creating it if needed.
    ///
    /// Every successful call counts as one reference; balance it with
    /// [`ViewerManager::release`].
    ///
    /// # Errors
    ///
    /// [`MolmountError::Initialization`] if the engine fails to build the
    /// viewer. Callers that joined an in-flight initialization get the
    /// same error.
    pub async fn acquire_or_create(
        &self,
        container: &E::Container,
        ui: UiMode,
    ) -> Result<SharedViewer<E>, MolmountError> {
        match self.claim(container) {
            Claim::Ready(instance) => Ok(instance),
            Claim::Join(rx) => self.join(rx).await,
            Claim::Initialize(tx) => self.initialize(container, ui, tx).await,
        }
    }

    async fn join(
        &self,
        mut rx: InitWatch<E::Viewer>,
    ) -> Result<SharedViewer<E>, MolmountError> {
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        let instance = match outcome {
            Some(Ok(instance)) => instance,
            Some(Err(msg)) => return Err(MolmountError::Initialization(msg)),
            None => {
                return Err(MolmountError::Initialization(
                    "initialization was abandoned".to_owned(),
                ))
            }
        };
        self.lock()
            .touch(instance.id(), self.clock.now())
            .ok_or_else(|| {
                MolmountError::Initialization(format!(
                    "viewer {} was disposed during initialization",
                    instance.id()
                ))
            })
    }

    async fn initialize(
        &self,
        container: &E::Container,
        ui: UiMode,
        tx: watch::Sender<Option<InitOutcome<E::Viewer>>>,
    ) -> Result<SharedViewer<E>, MolmountError> {
        let _guard = InitializingGuard {
            manager: self,
            container: container.clone(),
        };

        if !container.has_mount_marker() {
            container.clear();
        }

        let outcome: InitOutcome<E::Viewer> =
            match self.engine.create_viewer(container, ui).await {
                Ok(viewer) => {
                    let instance =
                        Arc::new(ViewerInstance::new(ViewerId::next(), viewer));
                    self.lock().insert(
                        container.clone(),
                        Arc::clone(&instance),
                        self.clock.now(),
                    );
                    log::info!("Viewer {} created ({ui:?} UI)", instance.id());
                    Ok(instance)
                }
                Err(e) => {
                    log::warn!("Viewer initialization failed: {e}");
                    Err(e.to_string())
                }
            };

        let _ = tx.send_replace(Some(outcome.clone()));
        outcome.map_err(MolmountError::Initialization)
    }

    /// Viewer registered for exactly `container`, counted as a reference.
    pub fn get_existing(
        &self,
        container: &E::Container,
    ) -> Option<SharedViewer<E>> {
        self.lock().acquire(container, self.clock.now())
    }

    /// Give back one reference. Never drops below zero.
    ///
    /// # Errors
    ///
    /// [`MolmountError::UnmanagedResource`] if the viewer is not registered.
    pub fn release(
        &self,
        viewer: &ViewerInstance<E::Viewer>,
    ) -> Result<(), MolmountError> {
        let remaining = self.lock().release(viewer.id(), self.clock.now())?;
        log::debug!(
            "Viewer {} released, {remaining} reference(s) left",
            viewer.id()
        );
        Ok(())
    }

    /// Dispose the viewer of exactly `container` (not an enclosing one)
    /// and clear the container. Returns whether a viewer was found.
    pub fn dispose_for_container(&self, container: &E::Container) -> bool {
        let Some(entry) = self.lock().remove_container(container) else {
            return false;
        };
        entry.instance.dispose();
        container.clear();
        true
    }

    /// Dispose every unreferenced viewer idle for longer than the grace
    /// period. Returns how many were disposed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let expired = self.lock().take_idle(now, self.lifecycle.idle_grace());
        for entry in &expired {
            log::info!("Disposing idle viewer {}", entry.instance.id());
            entry.instance.dispose();
        }
        expired.len()
    }

    /// Start the periodic sweep on the current tokio runtime. Does nothing
    /// if it is already running. Returns `false` outside a runtime.
    pub fn start_sweeper(self: &Arc<Self>) -> bool {
        let mut sweeper =
            self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if sweeper.is_some() {
            return true;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No async runtime; idle viewers will not be swept");
            return false;
        };

        let manager = Arc::downgrade(self);
        let period = self.lifecycle.sweep_interval();
        *sweeper = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            let _ = ticker.tick().await;
            loop {
                let _ = ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let _ = manager.sweep();
            }
        }));
        log::debug!("Idle sweep every {period:?}");
        true
    }

    /// Stop the periodic sweep. Registered viewers are left alone.
    pub fn shutdown(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            log::debug!("Idle sweep stopped");
        }
    }

    /// Whether the periodic sweep is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl<E: Engine> Drop for ViewerManager<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Process-wide manager slot, initialized on first use.
///
/// ```ignore
/// static VIEWERS: ManagerCell<MyEngine> = ManagerCell::new();
/// let manager = VIEWERS.get_or_init(|| ViewerManager::new(MyEngine));
/// ```
pub struct ManagerCell<E: Engine> {
    cell: OnceLock<Arc<ViewerManager<E>>>,
}

impl<E: Engine> Default for ManagerCell<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> ManagerCell<E> {
    /// Empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The manager, building it with `init` on first call. The idle sweep
    /// is started when the first call happens inside a tokio runtime.
    pub fn get_or_init(
        &self,
        init: impl FnOnce() -> ViewerManager<E>,
    ) -> Arc<ViewerManager<E>> {
        let manager = self.cell.get_or_init(|| Arc::new(init()));
        let _ = manager.start_sweeper();
        Arc::clone(manager)
    }

    /// The manager, if already built.
    pub fn get(&self) -> Option<Arc<ViewerManager<E>>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;
    use crate::testing::{FakeContainer, FakeEngine, TokioClock};

    fn manager() -> (Arc<ViewerManager<FakeEngine>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let manager = ViewerManager::with_clock(
            FakeEngine::default(),
            LifecycleOptions::default(),
            clock.clone(),
        );
        (Arc::new(manager), clock)
    }

    #[tokio::test]
    async fn concurrent_acquires_share_one_viewer() {
        let (manager, _) = manager();
        let container = FakeContainer::new("root");

        let (a, b) = tokio::join!(
            manager.acquire_or_create(&container, UiMode::Standard),
            manager.acquire_or_create(&container, UiMode::Standard),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.engine().created(), 1);
        assert_eq!(manager.refcount(&a), Some(2));
        assert!(!manager.is_initializing(&container));
        assert_eq!(container.clear_count(), 1);
    }

    #[tokio::test]
    async fn failure_reaches_every_joiner() {
        let (manager, _) = manager();
        manager.engine().fail_next();
        let container = FakeContainer::new("root");

        let (a, b) = tokio::join!(
            manager.acquire_or_create(&container, UiMode::Minimal),
            manager.acquire_or_create(&container, UiMode::Minimal),
        );
        assert!(matches!(a, Err(MolmountError::Initialization(_))));
        assert!(matches!(b, Err(MolmountError::Initialization(_))));
        assert_eq!(manager.engine().created(), 1);

        // Not wedged: the next call starts a fresh initialization.
        assert!(!manager.is_initializing(&container));
        let c = manager.acquire_or_create(&container, UiMode::Minimal).await;
        assert!(c.is_ok());
        assert_eq!(manager.engine().created(), 2);
    }

    #[tokio::test]
    async fn nested_mount_reuses_enclosing_viewer() {
        let (manager, _) = manager();
        let outer = FakeContainer::new("outer");
        let viewer = manager
            .acquire_or_create(&outer, UiMode::Standard)
            .await
            .unwrap();

        let inner = outer.child("inner");
        inner.mark_mounted();
        let nested = manager
            .acquire_or_create(&inner, UiMode::Standard)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&viewer, &nested));
        assert_eq!(manager.engine().created(), 1);
        assert_eq!(inner.clear_count(), 0);

        // Without the marker the inner container gets its own viewer.
        let plain = outer.child("plain");
        let own = manager
            .acquire_or_create(&plain, UiMode::Standard)
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&viewer, &own));
        assert_eq!(manager.viewer_count(), 2);
    }

    #[tokio::test]
    async fn nested_mount_picks_innermost_viewer() {
        let outer = FakeContainer::new("outer");
        let middle = outer.child("middle");
        let inner = middle.child("inner");
        inner.mark_mounted();

        // Both registration orders, so map order cannot decide the winner.
        for order in [[&middle, &outer], [&outer, &middle]] {
            let (manager, _) = manager();
            for container in order {
                let _ = manager
                    .acquire_or_create(container, UiMode::Standard)
                    .await
                    .unwrap();
            }
            let middle_viewer = manager.get_existing(&middle).unwrap();
            let nested = manager
                .acquire_or_create(&inner, UiMode::Standard)
                .await
                .unwrap();
            assert!(Arc::ptr_eq(&nested, &middle_viewer));
            assert_eq!(manager.engine().created(), 2);
        }
    }

    #[tokio::test]
    async fn marked_container_is_not_cleared() {
        let (manager, _) = manager();
        let container = FakeContainer::new("root");
        container.mark_mounted();
        let _ = manager
            .acquire_or_create(&container, UiMode::Standard)
            .await
            .unwrap();
        assert_eq!(container.clear_count(), 0);
    }

    #[tokio::test]
    async fn release_of_unmanaged_viewer_fails() {
        let (manager, _) = manager();
        let other = {
            let (m, _) = self::manager();
            m.acquire_or_create(&FakeContainer::new("x"), UiMode::Standard)
                .await
                .unwrap()
        };
        assert!(matches!(
            manager.release(&other),
            Err(MolmountError::UnmanagedResource(id)) if id == other.id()
        ));
    }

    #[tokio::test]
    async fn get_existing_counts_and_release_floors_at_zero() {
        let (manager, _) = manager();
        let container = FakeContainer::new("root");
        assert!(manager.get_existing(&container).is_none());

        let viewer = manager
            .acquire_or_create(&container, UiMode::Standard)
            .await
            .unwrap();
        let again = manager.get_existing(&container).unwrap();
        assert!(Arc::ptr_eq(&viewer, &again));
        assert_eq!(manager.refcount(&viewer), Some(2));

        for _ in 0..4 {
            manager.release(&viewer).unwrap();
        }
        assert_eq!(manager.refcount(&viewer), Some(0));
    }

    #[tokio::test]
    async fn idle_viewer_survives_grace_period() {
        let (manager, clock) = manager();
        let container = FakeContainer::new("root");
        let viewer = manager
            .acquire_or_create(&container, UiMode::Standard)
            .await
            .unwrap();
        manager.release(&viewer).unwrap();

        clock.advance(Duration::from_secs(30));
        assert_eq!(manager.sweep(), 0);
        assert!(!viewer.is_disposed());

        clock.advance(Duration::from_secs(1));
        assert_eq!(manager.sweep(), 1);
        assert!(viewer.is_disposed());
        assert_eq!(manager.viewer_count(), 0);
        assert!(manager.release(&viewer).is_err());
    }

    #[tokio::test]
    async fn referenced_viewer_is_never_swept() {
        let (manager, clock) = manager();
        let viewer = manager
            .acquire_or_create(&FakeContainer::new("root"), UiMode::Standard)
            .await
            .unwrap();
        clock.advance(Duration::from_secs(3600));
        assert_eq!(manager.sweep(), 0);
        assert!(!viewer.is_disposed());
    }

    #[tokio::test]
    async fn dispose_for_container_is_exact() {
        let (manager, _) = manager();
        let outer = FakeContainer::new("outer");
        let viewer = manager
            .acquire_or_create(&outer, UiMode::Standard)
            .await
            .unwrap();

        assert!(!manager.dispose_for_container(&outer.child("inner")));
        assert!(!viewer.is_disposed());

        assert!(manager.dispose_for_container(&outer));
        assert!(viewer.is_disposed());
        assert_eq!(outer.clear_count(), 2);

        // Disposal is terminal; the next acquire builds a new viewer.
        let fresh = manager
            .acquire_or_create(&outer, UiMode::Standard)
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&viewer, &fresh));
        assert_eq!(manager.engine().created(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweep_disposes_after_grace() {
        let manager = Arc::new(ViewerManager::with_clock(
            FakeEngine::default(),
            LifecycleOptions::default(),
            Arc::new(TokioClock::new()),
        ));
        assert!(manager.start_sweeper());
        assert!(manager.is_sweeping());

        let viewer = manager
            .acquire_or_create(&FakeContainer::new("root"), UiMode::Standard)
            .await
            .unwrap();
        manager.release(&viewer).unwrap();

        // Sweeps at 20s (idle 20s) and 40s (idle 40s).
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(!viewer.is_disposed());
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(viewer.is_disposed());

        manager.shutdown();
        assert!(!manager.is_sweeping());
    }

    #[test]
    fn sweeper_needs_a_runtime() {
        let manager = Arc::new(ViewerManager::new(FakeEngine::default()));
        assert!(!manager.start_sweeper());
        assert!(!manager.is_sweeping());
    }

    #[tokio::test]
    async fn cell_builds_once() {
        static CELL: ManagerCell<FakeEngine> = ManagerCell::new();
        assert!(CELL.get().is_none());
        let a = CELL.get_or_init(|| ViewerManager::new(FakeEngine::default()));
        let b = CELL.get_or_init(|| ViewerManager::new(FakeEngine::default()));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_sweeping());
        a.shutdown();
    }
}
