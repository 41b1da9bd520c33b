use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use web_time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Lifecycle", inline)]
#[serde(default)]
/// Idle collection of unreferenced viewers.
pub struct LifecycleOptions {
    /// How long a viewer may sit unreferenced before it is disposed.
    #[schemars(title = "Idle Grace (s)", range(min = 1, max = 600))]
    pub idle_grace_secs: u64,
    /// How often idle viewers are looked for. Keep it below the grace
    /// period so no viewer outlives it by more than one sweep.
    #[schemars(title = "Sweep Interval (s)", range(min = 1, max = 600))]
    pub sweep_interval_secs: u64,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            idle_grace_secs: 30,
            sweep_interval_secs: 20,
        }
    }
}

impl LifecycleOptions {
    /// Idle grace period.
    #[must_use]
    pub fn idle_grace(&self) -> Duration {
        Duration::from_secs(self.idle_grace_secs)
    }

    /// Sweep period, at least one second.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}
