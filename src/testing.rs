//! In-memory engine used by the unit tests.

use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use glam::DMat4;

use crate::color::ColorHex;
use crate::engine::{
    CameraAnimation, Container, Engine, EngineError, EngineViewer, UiMode,
};
use crate::manager::Clock;
use crate::mvs::MvsData;
use crate::protein::UploadedFile;

struct ContainerNode {
    name: String,
    parent: Option<FakeContainer>,
    mounted: AtomicBool,
    clears: AtomicUsize,
}

/// Element-like container with identity semantics.
#[derive(Clone)]
pub(crate) struct FakeContainer(Arc<ContainerNode>);

impl FakeContainer {
    pub(crate) fn new(name: &str) -> Self {
        Self(Arc::new(ContainerNode {
            name: name.to_owned(),
            parent: None,
            mounted: AtomicBool::new(false),
            clears: AtomicUsize::new(0),
        }))
    }

    pub(crate) fn child(&self, name: &str) -> Self {
        Self(Arc::new(ContainerNode {
            name: name.to_owned(),
            parent: Some(self.clone()),
            mounted: AtomicBool::new(false),
            clears: AtomicUsize::new(0),
        }))
    }

    pub(crate) fn mark_mounted(&self) {
        self.0.mounted.store(true, Ordering::SeqCst);
    }

    pub(crate) fn clear_count(&self) -> usize {
        self.0.clears.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for FakeContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FakeContainer({})", self.0.name)
    }
}

impl PartialEq for FakeContainer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FakeContainer {}

impl Hash for FakeContainer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl Container for FakeContainer {
    fn contains(&self, other: &Self) -> bool {
        let mut cursor = other.0.parent.as_ref();
        while let Some(parent) = cursor {
            if parent == self {
                return true;
            }
            cursor = parent.0.parent.as_ref();
        }
        false
    }

    fn has_mount_marker(&self) -> bool {
        self.0.mounted.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        let _ = self.0.clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// Viewer that records every call as a line of text.
#[derive(Default)]
pub(crate) struct FakeViewer {
    log: Mutex<Vec<String>>,
    urls: AtomicUsize,
    fail_revoke: AtomicBool,
    fail_load: AtomicBool,
}

impl FakeViewer {
    fn record(&self, entry: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(entry);
        }
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub(crate) fn fail_revocations(&self) {
        self.fail_revoke.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_loads(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }
}

impl EngineViewer for FakeViewer {
    fn load_scene(
        &self,
        scene: &MvsData,
        format: &str,
    ) -> impl Future<Output = Result<(), EngineError>> + Send {
        let result = if self.fail_load.load(Ordering::SeqCst) {
            Err(EngineError::new("scene rejected"))
        } else {
            self.record(format!(
                "load {} as {format}",
                scene.structure_count()
            ));
            Ok(())
        };
        std::future::ready(result)
    }

    fn clear(&self) {
        self.record("clear".to_owned());
    }

    fn dispose(&self) {
        self.record("dispose".to_owned());
    }

    fn set_background_color(&self, color: &ColorHex) {
        self.record(format!("background {color}"));
    }

    fn set_animation(&self, animation: CameraAnimation) {
        self.record(format!("animation {animation:?}"));
    }

    fn focus_residue_range(&self, start: i32, end: i32) {
        self.record(format!("focus {start}..={end}"));
    }

    fn reset_camera(&self) {
        self.record("reset".to_owned());
    }

    fn update_structure_transform(&self, index: usize, matrix: DMat4) {
        let t = matrix.w_axis;
        self.record(format!("transform {index} [{} {} {}]", t.x, t.y, t.z));
    }

    fn create_object_url(
        &self,
        file: &UploadedFile,
    ) -> Result<String, EngineError> {
        let n = self.urls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("blob:{n}/{}", file.name))
    }

    fn revoke_object_url(&self, url: &str) -> Result<(), EngineError> {
        self.record(format!("revoke {url}"));
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(EngineError::new("already revoked"));
        }
        Ok(())
    }
}

/// Engine whose viewer construction yields once before completing, so
/// concurrent acquires interleave.
#[derive(Default)]
pub(crate) struct FakeEngine {
    created: AtomicUsize,
    fail_next: AtomicBool,
    ui_modes: Mutex<Vec<UiMode>>,
}

impl FakeEngine {
    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub(crate) fn ui_modes(&self) -> Vec<UiMode> {
        self.ui_modes.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Engine for FakeEngine {
    type Container = FakeContainer;
    type Viewer = FakeViewer;

    fn create_viewer(
        &self,
        _container: &FakeContainer,
        ui: UiMode,
    ) -> impl Future<Output = Result<FakeViewer, EngineError>> + Send {
        async move {
            tokio::task::yield_now().await;
            let _ = self.created.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut modes) = self.ui_modes.lock() {
                modes.push(ui);
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(EngineError::new("no rendering context"));
            }
            Ok(FakeViewer::default())
        }
    }
}

/// Clock that follows tokio's (pausable) timer.
pub(crate) struct TokioClock {
    base: web_time::Instant,
    start: tokio::time::Instant,
}

impl TokioClock {
    pub(crate) fn new() -> Self {
        Self {
            base: web_time::Instant::now(),
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> web_time::Instant {
        self.base + self.start.elapsed()
    }
}
