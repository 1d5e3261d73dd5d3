//! Manifest loading

use anyhow::Result;
use pinwarden_core::Manifest;
use std::path::Path;
use tracing::info;

/// Load the manifest at `path`, or an empty one if the file does not exist
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    if path.exists() {
        Ok(Manifest::from_file(path)?)
    } else {
        info!(
            path = %path.display(),
            "Manifest not found, nothing to plan"
        );
        Ok(Manifest::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_manifest_is_empty() {
        let manifest = load_manifest(Path::new("/nonexistent/pinwarden.toml")).unwrap();
        assert!(manifest.boards.is_empty());
        assert!(manifest.components.is_empty());
    }
}
