//! Batch configuration loaded from YAML

use serde::{Deserialize, Serialize};
use std::path::Path;
use vmap_common::Result;
use vmap_feature_classifier::{DescriptorConfig, ExtractorConfig};
use vmap_floor_plan::{LayoutConfig, LayoutStrategy, SiteInfo};

/// Everything a batch run can be tuned with; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmapConfig {
    pub extractor: ExtractorConfig,
    /// Hash, corner count and dominant colors attached to each record
    pub descriptors: DescriptorConfig,
    pub layout: LayoutConfig,
    /// Strategy used when exporting the batch layout
    pub strategy: LayoutStrategy,
    pub site: SiteInfo,
    /// Classify items on the rayon pool
    pub parallel: bool,
    /// Attach descriptive file names to classification records
    pub rename: bool,
    /// Assign records to `seq_NNN-NNN` groups by their sequence number
    pub organize: bool,
}

impl Default for VmapConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            descriptors: DescriptorConfig::default(),
            layout: LayoutConfig::default(),
            strategy: LayoutStrategy::default(),
            site: SiteInfo::default(),
            parallel: true,
            rename: false,
            organize: false,
        }
    }
}

impl VmapConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns [`vmap_common::ProcessingError::Io`] if the file cannot be read, or
    /// [`vmap_common::ProcessingError::Configuration`] if it cannot be parsed or is invalid
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// # Errors
    /// Returns [`vmap_common::ProcessingError::Configuration`] on malformed or invalid YAML
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: VmapConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`vmap_common::ProcessingError::Configuration`] for the first invalid section
    pub fn validate(&self) -> Result<()> {
        self.extractor.validate()?;
        self.descriptors.validate()?;
        self.layout.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let parsed = VmapConfig::from_yaml_str("{}").unwrap();
        assert_eq!(parsed, VmapConfig::default());
        assert!(parsed.parallel);
        assert!(!parsed.rename);
        assert!(!parsed.organize);
        assert!(parsed.descriptors.enabled);
        assert_eq!(parsed.strategy, LayoutStrategy::Auto);
        assert_eq!(parsed.layout.spacing, 10.0);
    }

    #[test]
    fn test_partial_yaml_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let yaml = "\
extractor:
  min_door_area: 1000
strategy: grid
rename: true
site:
  building: StanGrad
  floor: 3";
        writeln!(file, "{yaml}").unwrap();

        let config = VmapConfig::from_yaml(file.path()).unwrap();
        assert_eq!(config.extractor.min_door_area, 1000);
        assert_eq!(config.extractor.canny_high, 150.0);
        assert_eq!(config.strategy, LayoutStrategy::Grid);
        assert!(config.rename);
        assert!(config.parallel);
        assert_eq!(config.site.building.as_deref(), Some("StanGrad"));
        assert_eq!(config.site.floor, Some(3));
        assert_eq!(config.site.wing, None);
    }

    #[test]
    fn test_unknown_strategy_is_configuration_error() {
        let err = VmapConfig::from_yaml_str("strategy: spiral").unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = VmapConfig::from_yaml_str("layout:\n  spacing: -1.0").unwrap_err();
        assert_eq!(err.kind(), "configuration");
        let err = VmapConfig::from_yaml_str("extractor:\n  canny_low: 0.0").unwrap_err();
        assert_eq!(err.kind(), "configuration");
        let err = VmapConfig::from_yaml_str("descriptors:\n  color_clusters: 0").unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_descriptor_and_organize_settings() {
        let config = VmapConfig::from_yaml_str(
            "organize: true\ndescriptors:\n  enabled: false\n  max_corners: 20",
        )
        .unwrap();
        assert!(config.organize);
        assert!(!config.descriptors.enabled);
        assert_eq!(config.descriptors.max_corners, 20);
        assert_eq!(config.descriptors.color_clusters, 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = VmapConfig::from_yaml("/nonexistent/vmap.yaml").unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
