pub mod batch;
pub mod classify;
pub mod layout;

use anyhow::{Context as _, Result};
use std::path::Path;
use vmap_batch::VmapConfig;

/// Load `--config` when given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<VmapConfig> {
    match path {
        Some(path) => VmapConfig::from_yaml(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(VmapConfig::default()),
    }
}
