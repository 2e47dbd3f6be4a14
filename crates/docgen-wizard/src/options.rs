use crate::types::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for the step lifecycle.
///
/// The defaults come from observed SDK behaviour: mount targets usually
/// settle within two seconds and a failed editor creation succeeds on a
/// retry half a second later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleOptions {
    /// Polls for a connected, non-zero-size mount target
    pub readiness_attempts: u32,
    pub readiness_interval_ms: u64,
    /// Extra wait granted once when the target was seen with zero size
    pub zero_size_settle_ms: u64,
    /// Animation frames to wait before handing the target to the SDK
    pub frame_ticks: u32,
    pub settle_delay_ms: u64,
    pub retry_backoff_ms: u64,
    pub license_key: Option<String>,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            readiness_attempts: 20,
            readiness_interval_ms: 100,
            zero_size_settle_ms: 200,
            frame_ticks: 2,
            settle_delay_ms: 50,
            retry_backoff_ms: 500,
            license_key: None,
        }
    }
}

impl LifecycleOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| WizardError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| WizardError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.readiness_attempts == 0 {
            return Err(WizardError::Config(
                "readiness_attempts must be at least 1".to_string(),
            ));
        }
        if self.readiness_interval_ms == 0 {
            return Err(WizardError::Config(
                "readiness_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }

    pub fn zero_size_settle(&self) -> Duration {
        Duration::from_millis(self.zero_size_settle_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
