//! External camera trigger via the capture utility.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use tokio::process::Command;
use tracing::info;

/// Capture one frame into a dated folder below `capture_dir` and return the
/// image path. The camera protocol itself is entirely the capture
/// utility's concern.
pub async fn capture_image(capture_bin: &str, capture_dir: &Path) -> Result<PathBuf> {
    let now = Local::now();
    let folder = capture_dir.join(now.format("%Y-%m-%d").to_string());
    tokio::fs::create_dir_all(&folder)
        .await
        .with_context(|| format!("Failed to create capture folder {folder:?}"))?;

    let filename = format!("shot_{}.jpg", now.format("%Y-%m-%d_%H-%M-%S"));
    let path = folder.join(filename);

    let status = Command::new(capture_bin)
        .arg("--capture-image-and-download")
        .arg("--filename")
        .arg(&path)
        .status()
        .await
        .with_context(|| format!("Failed to launch capture utility {capture_bin:?}"))?;
    if !status.success() {
        bail!("Capture utility exited with {status}");
    }

    info!("Captured image {:?}", path);
    Ok(path)
}
