//! A mounted view: one container showing one scene.
//!
//! [`Mount::attach`] obtains the container's viewer from the
//! [`ViewerManager`], loads the scene and applies the presentation
//! options. The mount holds one reference on the viewer
//! until it is dropped or [`Mount::release`]d.
//!
//! ```ignore
//! let config = ViewerConfig::builder()
//!     .with_proteins(vec![Protein::uniprot("P69905")])
//!     .with_spin(true)
//!     .build()?;
//! let mount = Mount::attach(manager, &container, config).await?;
//! mount.highlight(0, "d1");
//! ```

use std::sync::Arc;

use crate::color::ColorHex;
use crate::compiler::{compile, ModelSourceUrls};
use crate::engine::{CameraAnimation, Engine, UiMode};
use crate::error::MolmountError;
use crate::manager::{SharedViewer, ViewerManager};
use crate::mvs::MvsData;
use crate::options::ViewerOptions;
use crate::protein::{Matrix3, Protein, Vector3};

/// What a mount displays.
#[derive(Debug, Clone)]
pub enum SceneSource {
    /// Display intents, compiled on load.
    Proteins(Vec<Protein>),
    /// A ready-made scene document.
    Scene(MvsData),
}

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`ViewerConfig`].
#[derive(Debug, Default)]
pub struct ViewerConfigBuilder {
    proteins: Option<Vec<Protein>>,
    scene: Option<MvsData>,
    urls: Option<ModelSourceUrls>,
    options: ViewerOptions,
}

impl ViewerConfigBuilder {
    /// Show these proteins.
    #[must_use]
    pub fn with_proteins(mut self, proteins: Vec<Protein>) -> Self {
        self.proteins = Some(proteins);
        self
    }

    /// Show a precomputed scene.
    #[must_use]
    pub fn with_scene(mut self, scene: MvsData) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Override how identifiers become download URLs.
    #[must_use]
    pub fn with_model_source_urls(mut self, urls: ModelSourceUrls) -> Self {
        self.urls = Some(urls);
        self
    }

    /// Replace all presentation options at once.
    #[must_use]
    pub fn with_options(mut self, options: ViewerOptions) -> Self {
        self.options = options;
        self
    }

    /// Viewer chrome.
    #[must_use]
    pub fn with_ui(mut self, ui: UiMode) -> Self {
        self.options.ui = ui;
        self
    }

    /// Canvas background.
    #[must_use]
    pub fn with_background_color(mut self, color: ColorHex) -> Self {
        self.options.background_color = Some(color);
        self
    }

    /// Continuous spin.
    #[must_use]
    pub fn with_spin(mut self, spin: bool) -> Self {
        self.options.spin = spin;
        self
    }

    /// Spin speed.
    #[must_use]
    pub fn with_spin_speed(mut self, speed: f64) -> Self {
        self.options.spin_speed = speed;
        self
    }

    /// Back-and-forth rock.
    #[must_use]
    pub fn with_rock(mut self, rock: bool) -> Self {
        self.options.rock = rock;
        self
    }

    /// Rock speed.
    #[must_use]
    pub fn with_rock_speed(mut self, speed: f64) -> Self {
        self.options.rock_speed = speed;
        self
    }

    /// Explicit height in pixels.
    #[must_use]
    pub fn with_height(mut self, height: u32) -> Self {
        self.options.height = Some(height);
        self
    }

    /// Validate and produce a [`ViewerConfig`].
    ///
    /// # Errors
    ///
    /// [`MolmountError::Configuration`] when both or neither of proteins
    /// and scene are set, or when spin and rock are both enabled.
    pub fn build(self) -> Result<ViewerConfig, MolmountError> {
        let source = match (self.proteins, self.scene) {
            (Some(proteins), None) => SceneSource::Proteins(proteins),
            (None, Some(scene)) => SceneSource::Scene(scene),
            _ => {
                return Err(MolmountError::configuration(
                    "exactly one of proteins or scene must be provided",
                ))
            }
        };
        let animation = self.options.animation()?;
        Ok(ViewerConfig {
            source,
            urls: self.urls.unwrap_or_default(),
            animation,
            options: self.options,
        })
    }
}

// ── Config ───────────────────────────────────────────────────────────────

/// Validated mount configuration.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    source: SceneSource,
    urls: ModelSourceUrls,
    animation: CameraAnimation,
    options: ViewerOptions,
}

impl ViewerConfig {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> ViewerConfigBuilder {
        ViewerConfigBuilder::default()
    }

    /// What will be displayed.
    #[must_use]
    pub fn source(&self) -> &SceneSource {
        &self.source
    }

    /// Presentation options.
    #[must_use]
    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    /// Camera animation derived from the options.
    #[must_use]
    pub fn animation(&self) -> CameraAnimation {
        self.animation
    }
}

// ── Mount ────────────────────────────────────────────────────────────────

/// A container showing a scene, holding one viewer reference.
pub struct Mount<E: Engine> {
    manager: Arc<ViewerManager<E>>,
    viewer: SharedViewer<E>,
    proteins: Vec<Protein>,
    released: bool,
}

impl<E: Engine> std::fmt::Debug for Mount<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("viewer", &self.viewer.id())
            .field("proteins", &self.proteins.len())
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl<E: Engine> Mount<E> {
    /// Show `config` in `container`.
    ///
    /// Reuses the container's viewer when it has one. If anything after
    /// acquisition fails, the reference is given back before returning.
    ///
    /// # Errors
    ///
    /// Viewer initialization, scene compilation or scene loading failure.
    pub async fn attach(
        manager: Arc<ViewerManager<E>>,
        container: &E::Container,
        config: ViewerConfig,
    ) -> Result<Self, MolmountError> {
        let viewer = match manager.get_existing(container) {
            Some(viewer) => viewer,
            None => {
                manager
                    .acquire_or_create(container, config.options.ui)
                    .await?
            }
        };
        let mut mount = Self {
            manager,
            viewer,
            proteins: Vec::new(),
            released: false,
        };
        mount.show(config.source, &config.urls).await?;
        mount.viewer.set_animation(config.animation);
        if let Some(color) = &config.options.background_color {
            mount.viewer.set_background(color);
        }
        Ok(mount)
    }

    /// The viewer this mount holds.
    #[must_use]
    pub fn viewer(&self) -> &SharedViewer<E> {
        &self.viewer
    }

    /// Proteins currently shown (empty for precomputed scenes).
    #[must_use]
    pub fn proteins(&self) -> &[Protein] {
        &self.proteins
    }

    /// Replace the displayed scene. Loads are not ordered against each
    /// other; the last to finish wins.
    ///
    /// # Errors
    ///
    /// Compilation or load failure. The viewer stays usable.
    pub async fn show(
        &mut self,
        source: SceneSource,
        urls: &ModelSourceUrls,
    ) -> Result<(), MolmountError> {
        let (scene, proteins) = match source {
            SceneSource::Proteins(proteins) => {
                let scene = compile(&proteins, urls, Some(&*self.viewer))?;
                (scene, proteins)
            }
            SceneSource::Scene(scene) => (scene, Vec::new()),
        };
        self.viewer.load_scene(&scene).await?;
        self.proteins = proteins;
        Ok(())
    }

    /// Focus the camera on the first range of the named domain of protein
    /// `protein_index`. Returns whether such a domain was found.
    pub fn highlight(&self, protein_index: usize, domain_label: &str) -> bool {
        let Some(range) = self
            .proteins
            .get(protein_index)
            .and_then(|p| p.domain(domain_label))
            .and_then(|d| d.ranges.first())
        else {
            log::debug!(
                "No domain {domain_label:?} on protein {protein_index}"
            );
            return false;
        };
        self.viewer.focus_on_domain(range);
        true
    }

    /// Default camera framing.
    pub fn reset(&self) {
        self.viewer.reset_view();
    }

    /// Move one loaded structure without reloading the scene.
    pub fn update_superposition(
        &self,
        protein_index: usize,
        translation: Option<Vector3>,
        rotation: Option<&Matrix3>,
    ) {
        self.viewer
            .update_structure_transform(protein_index, translation, rotation);
    }

    /// Change the background.
    pub fn set_background(&self, color: &ColorHex) {
        self.viewer.set_background(color);
    }

    /// Change the camera animation.
    pub fn set_animation(&self, animation: CameraAnimation) {
        self.viewer.set_animation(animation);
    }

    /// Give the viewer reference back now instead of on drop.
    ///
    /// # Errors
    ///
    /// [`MolmountError::UnmanagedResource`] if the viewer was already
    /// disposed by the manager.
    pub fn release(mut self) -> Result<(), MolmountError> {
        self.released = true;
        self.manager.release(&self.viewer)
    }
}

impl<E: Engine> Drop for Mount<E> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.manager.release(&self.viewer) {
            log::warn!("Releasing viewer {} on drop: {e}", self.viewer.id());
        }
    }
}
