//! Dolphin controller profile
//! Maps the virtual Xbox 360 pad onto Dolphin's GameCube pad bindings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use tokio::fs;

use crate::utils::ensure_directory_exists;

pub const PROFILE_FILE_NAME: &str = "nso_gamecube.ini";

pub const DOLPHIN_PROFILE: &str = "[Profile]
Device = XInput/0/Gamepad
Buttons/A = `Button A`
Buttons/B = `Button Y`
Buttons/X = `Button X`
Buttons/Y = `Button B`
Buttons/Z = `Shoulder R`
Buttons/Start = Start
Main Stick/Up = `Left Y+`
Main Stick/Down = `Left Y-`
Main Stick/Left = `Left X-`
Main Stick/Right = `Left X+`
Main Stick/Modifier = `Shift`
Main Stick/Calibration = 100.00 141.42 100.00 141.42 100.00 141.42 100.00 141.42
C-Stick/Up = `Right Y+`
C-Stick/Down = `Right Y-`
C-Stick/Left = `Right X-`
C-Stick/Right = `Right X+`
C-Stick/Modifier = `Ctrl`
C-Stick/Calibration = 100.00 141.42 100.00 141.42 100.00 141.42 100.00 141.42
Triggers/L = `Trigger L`
Triggers/R = `Trigger R`
Triggers/L-Analog = `Trigger L`
Triggers/R-Analog = `Trigger R`
D-Pad/Up = `Pad N`
D-Pad/Down = `Pad E`
D-Pad/Left = `Pad S`
D-Pad/Right = `Pad W`
";

/// Writes `template` to `destination`, creating missing parent directories.
pub async fn write_profile(template: &str, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        ensure_directory_exists(parent).await?;
    }
    fs::write(destination, template)
        .await
        .with_context(|| format!("Could not save profile to {:?}", destination))?;
    info!("Dolphin profile saved to {:?}", destination);
    Ok(())
}

/// Writes the profile to a user-chosen location. A directory gets the default file name.
pub async fn export_profile(destination: &Path) -> Result<PathBuf> {
    let target = if destination.is_dir() {
        destination.join(PROFILE_FILE_NAME)
    } else {
        destination.to_path_buf()
    };
    write_profile(DOLPHIN_PROFILE, &target).await?;
    Ok(target)
}

/// Drops the profile into Dolphin's GCPad profile folder under the user's
/// Documents, but only when a Dolphin user folder already exists there.
pub async fn auto_install_profile() -> Result<Option<PathBuf>> {
    let documents = dirs::document_dir().ok_or_else(|| anyhow!("No Documents folder on this platform"))?;
    install_into_documents(&documents).await
}

async fn install_into_documents(documents: &Path) -> Result<Option<PathBuf>> {
    let dolphin_root = documents.join("Dolphin Emulator");
    if !dolphin_root.is_dir() {
        debug!("No Dolphin user folder at {:?}, skipping profile install", dolphin_root);
        return Ok(None);
    }

    let target = dolphin_root
        .join("Config")
        .join("Profiles")
        .join("GCPad")
        .join(PROFILE_FILE_NAME);
    write_profile(DOLPHIN_PROFILE, &target).await?;
    Ok(Some(target))
}
