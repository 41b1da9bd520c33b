//! A managed viewer: the engine's viewer plus the bookkeeping this crate
//! adds on top (identity, object URLs, one-shot disposal).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use glam::{DMat4, DVec3};

use crate::color::ColorHex;
use crate::compiler::ObjectUrlProvider;
use crate::engine::{CameraAnimation, EngineViewer};
use crate::error::MolmountError;
use crate::manager::ViewerId;
use crate::mvs::{MvsData, MVS_FORMAT};
use crate::protein::{
    rotation_matrix, ChoppingRange, Matrix3, UploadedFile, Vector3,
};

/// A viewer owned by the [`crate::manager::ViewerManager`].
///
/// Object URLs created through this instance (see [`ObjectUrlProvider`])
/// belong to it and are revoked exactly once, when it is disposed.
pub struct ViewerInstance<V> {
    id: ViewerId,
    viewer: V,
    object_urls: Mutex<Vec<String>>,
    disposed: AtomicBool,
}

impl<V> fmt::Debug for ViewerInstance<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerInstance")
            .field("id", &self.id)
            .field("disposed", &self.disposed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<V: EngineViewer> ViewerInstance<V> {
    pub(crate) fn new(id: ViewerId, viewer: V) -> Self {
        Self {
            id,
            viewer,
            object_urls: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Registry identity.
    #[must_use]
    pub fn id(&self) -> ViewerId {
        self.id
    }

    /// The wrapped engine viewer.
    #[must_use]
    pub fn engine_viewer(&self) -> &V {
        &self.viewer
    }

    /// Whether [`ViewerInstance::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Object URLs still owned by this instance.
    #[must_use]
    pub fn object_url_count(&self) -> usize {
        self.object_urls.lock().map_or(0, |urls| urls.len())
    }

    /// Replace the scene. Concurrent loads are not ordered; the last one
    /// to finish wins.
    ///
    /// # Errors
    ///
    /// [`MolmountError::Engine`] if the engine rejects the document. The
    /// instance stays usable.
    pub async fn load_scene(
        &self,
        scene: &MvsData,
    ) -> Result<(), MolmountError> {
        log::debug!(
            "Viewer {}: loading scene with {} structure(s)",
            self.id,
            scene.structure_count()
        );
        self.viewer.load_scene(scene, MVS_FORMAT).await?;
        Ok(())
    }

    /// Remove all content, keeping the viewer.
    pub fn clear(&self) {
        self.viewer.clear();
    }

    /// Canvas background.
    pub fn set_background(&self, color: &ColorHex) {
        self.viewer.set_background_color(color);
    }

    /// Camera motion.
    pub fn set_animation(&self, animation: CameraAnimation) {
        self.viewer.set_animation(animation);
    }

    /// Frame one domain range.
    pub fn focus_on_domain(&self, range: &ChoppingRange) {
        let (start, end) = range.residue_bounds();
        self.viewer.focus_residue_range(start, end);
    }

    /// Default camera framing.
    pub fn reset_view(&self) {
        self.viewer.reset_camera();
    }

    /// Move structure `index` in place. Missing parts of the transform
    /// stay at identity.
    pub fn update_structure_transform(
        &self,
        index: usize,
        translation: Option<Vector3>,
        rotation: Option<&Matrix3>,
    ) {
        let matrix = superposition_matrix(translation, rotation);
        self.viewer.update_structure_transform(index, matrix);
    }

    /// Dispose the engine viewer and revoke owned object URLs. Later calls
    /// do nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.viewer.dispose();

        let urls = match self.object_urls.lock() {
            Ok(mut urls) => std::mem::take(&mut *urls),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for url in &urls {
            if let Err(e) = self.viewer.revoke_object_url(url) {
                log::warn!("Viewer {}: failed to revoke {url}: {e}", self.id);
            }
        }
        log::info!(
            "Viewer {} disposed ({} object URL(s) revoked)",
            self.id,
            urls.len()
        );
    }
}

impl<V: EngineViewer> ObjectUrlProvider for ViewerInstance<V> {
    fn create_object_url(
        &self,
        file: &UploadedFile,
    ) -> Result<String, MolmountError> {
        let url = self.viewer.create_object_url(file)?;
        match self.object_urls.lock() {
            Ok(mut urls) => urls.push(url.clone()),
            Err(poisoned) => poisoned.into_inner().push(url.clone()),
        }
        Ok(url)
    }
}

/// Homogeneous transform from an optional row-major rotation and an
/// optional translation.
#[must_use]
pub fn superposition_matrix(
    translation: Option<Vector3>,
    rotation: Option<&Matrix3>,
) -> DMat4 {
    let mut matrix = rotation
        .map_or(DMat4::IDENTITY, |r| DMat4::from_mat3(rotation_matrix(r)));
    if let Some(t) = translation {
        matrix.w_axis = DVec3::from_array(t).extend(1.0);
    }
    matrix
}
