//! ViGEmBus driver presence probe

use std::path::PathBuf;

use log::{debug, info};

/// Where users can download the ViGEmBus driver.
pub const VIGEM_DOWNLOAD_URL: &str = "https://github.com/nefarius/ViGEmBus/releases/latest";

/// Location of the installed driver file, if `%WINDIR%` is known.
pub fn vigem_driver_path() -> Option<PathBuf> {
    std::env::var_os("WINDIR").map(|windir| {
        PathBuf::from(windir)
            .join("System32")
            .join("drivers")
            .join("ViGEmBus.sys")
    })
}

/// Checks for the physical driver file.
pub fn is_vigem_installed() -> bool {
    match vigem_driver_path() {
        Some(path) => {
            let present = path.exists();
            info!("ViGEmBus driver at {:?}: {}", path, if present { "present" } else { "missing" });
            present
        }
        None => {
            debug!("WINDIR is not set, assuming no ViGEmBus driver");
            false
        }
    }
}
