use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color::ColorHex;
use crate::engine::{CameraAnimation, UiMode};
use crate::error::MolmountError;

/// Default spin speed.
pub const DEFAULT_SPIN_SPEED: f64 = 0.05;
/// Default rock speed.
pub const DEFAULT_ROCK_SPEED: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Viewer", inline)]
#[serde(default)]
/// Presentation of a mounted viewer.
pub struct ViewerOptions {
    /// Amount of viewer chrome.
    #[schemars(title = "UI Mode")]
    pub ui: UiMode,
    /// Canvas background; the engine's own default when unset.
    #[schemars(title = "Background", with = "Option<String>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorHex>,
    /// Turn the camera continuously.
    #[schemars(title = "Spin")]
    pub spin: bool,
    /// Spin speed.
    #[schemars(title = "Spin Speed", range(min = 0.01, max = 1.0), extend("step" = 0.01))]
    pub spin_speed: f64,
    /// Sweep the camera back and forth.
    #[schemars(title = "Rock")]
    pub rock: bool,
    /// Rock speed.
    #[schemars(title = "Rock Speed", range(min = 0.01, max = 1.0), extend("step" = 0.01))]
    pub rock_speed: f64,
    /// Explicit height in pixels; fills the parent when unset.
    #[schemars(skip)]
    pub height: Option<u32>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            ui: UiMode::Standard,
            background_color: None,
            spin: false,
            spin_speed: DEFAULT_SPIN_SPEED,
            rock: false,
            rock_speed: DEFAULT_ROCK_SPEED,
            height: None,
        }
    }
}

impl ViewerOptions {
    /// Camera animation selected by the spin/rock flags.
    ///
    /// # Errors
    ///
    /// [`MolmountError::Configuration`] when both spin and rock are set.
    pub fn animation(&self) -> Result<CameraAnimation, MolmountError> {
        match (self.spin, self.rock) {
            (true, true) => Err(MolmountError::configuration(
                "spin and rock animations are mutually exclusive",
            )),
            (true, false) => Ok(CameraAnimation::spin(self.spin_speed)),
            (false, true) => Ok(CameraAnimation::rock(self.rock_speed)),
            (false, false) => Ok(CameraAnimation::Off),
        }
    }
}
