//! Screenshot artifacts
//!
//! Artifacts are write-once PNG files with deterministic, step-derived
//! names. Capture is best-effort diagnostics: a capture failure is logged
//! and must never mask the error that triggered it.

use std::path::PathBuf;

use tracing::{error, info};

use crate::browser::Driver;
use crate::common::{Error, Result};

/// Where a run writes its screenshots.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The deterministic path for a tag.
    pub fn path_for(&self, tag: &str) -> PathBuf {
        self.dir.join(format!("{}.png", sanitize(tag)))
    }

    /// Write PNG bytes for a tag, creating the output directory if absent.
    pub fn write(&self, tag: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Capture(format!("cannot create '{}': {e}", self.dir.display())))?;
        let path = self.path_for(tag);
        std::fs::write(&path, bytes)
            .map_err(|e| Error::Capture(format!("cannot write '{}': {e}", path.display())))?;
        Ok(path)
    }
}

/// Best-effort screenshot of the current page state.
///
/// Returns the artifact path on success. On failure, logs the capture error
/// and returns `None` so the caller's original error stays in charge.
pub async fn capture(driver: &dyn Driver, sink: &ArtifactSink, tag: &str) -> Option<PathBuf> {
    let result = match driver.screenshot().await {
        Ok(bytes) => sink.write(tag, &bytes),
        Err(e) => Err(e),
    };
    match result {
        Ok(path) => {
            info!("screenshot saved to {}", path.display());
            Some(path)
        }
        Err(e) => {
            error!("{}", Error::Capture(e.to_string()));
            None
        }
    }
}

/// Reduce a step name to a filesystem-safe tag.
fn sanitize(tag: &str) -> String {
    let cleaned: String = tag
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let collapsed = cleaned
        .split('-')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if collapsed.is_empty() {
        "screenshot".to_string()
    } else {
        collapsed.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_derives_stable_filenames() {
        assert_eq!(sanitize("submit login"), "submit-login");
        assert_eq!(sanitize("Módulo Loja!"), "m-dulo-loja");
        assert_eq!(sanitize("  "), "screenshot");
        assert_eq!(sanitize("already-safe_tag"), "already-safe_tag");
    }

    #[test]
    fn path_is_deterministic() {
        let sink = ArtifactSink::new("/tmp/artifacts");
        assert_eq!(
            sink.path_for("land on dashboard"),
            PathBuf::from("/tmp/artifacts/land-on-dashboard.png")
        );
    }
}
