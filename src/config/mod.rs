pub mod profile;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::bluetooth::{NINTENDO_OUI, Timings};
use crate::utils::ensure_directory_exists;

const APP_DIR_NAME: &str = "nso-gc-bridge";
const CONFIG_FILE_NAME: &str = "bridge_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Hardware address prefix of the controller, separators optional
    pub vendor_prefix: String,

    /// Length of one discovery pass, in seconds
    pub scan_timeout_secs: f64,

    /// Drop the Dolphin profile into the Dolphin user folder on startup
    pub auto_install_profile: bool,

    /// Log level used unless RUST_LOG says otherwise
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            vendor_prefix: NINTENDO_OUI.to_string(),
            scan_timeout_secs: 4.0,
            auto_install_profile: true,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// `<config_dir>/nso-gc-bridge/bridge_config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow!("No config directory on this platform"))?;
        Ok(config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config from `path`, falling back to defaults when the file is missing.
    pub async fn load_config(path: &Path) -> Result<Self> {
        let file_path_str = path.to_string_lossy().into_owned();

        if !path.exists() {
            warn!("Config file not found at {:?}, using default.", file_path_str);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", file_path_str))?;
        let config: Self = serde_json::from_str(&config_json)
            .with_context(|| format!("Invalid config file {}", file_path_str))?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the current config to `path`.
    pub async fn save_config(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            ensure_directory_exists(parent).await?;
        }

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize bridge config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(path, config_json).await?;

        info!("Bridge config saved to {:?}.", path.to_string_lossy());
        Ok(())
    }

    /// The state machine timings, with the configured scan window.
    pub fn timings(&self) -> Timings {
        let mut timings = Timings::default();
        if self.scan_timeout_secs.is_finite() && self.scan_timeout_secs > 0.0 {
            timings.scan_timeout = Duration::from_secs_f64(self.scan_timeout_secs);
        } else {
            warn!(
                "Ignoring invalid scan_timeout_secs {}, using {:?}",
                self.scan_timeout_secs, timings.scan_timeout
            );
        }
        timings
    }
}
