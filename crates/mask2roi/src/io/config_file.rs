use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    config::{Configuration, OptionValue},
    error::{Mask2RoiError, Result, Warning},
};

/// Option overrides stored in a TOML or JSON file.
///
/// The file is a flat table of option names to values, e.g.
///
/// ```toml
/// NumROIs = 2
/// Connectivity = 4
/// RoundOutput = true
/// ```
///
/// Names are checked only when the overrides are resolved, so an unknown
/// key is reported the same way as on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigFile {
    pub options: BTreeMap<String, OptionValue>,
}

impl ConfigFile {
    /// Load options from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load options from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load options from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load options
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(Mask2RoiError::UnsupportedFileFormat),
        }
    }

    /// Name/value pairs, ready to be combined with further overrides
    pub fn overrides(&self) -> Vec<(String, OptionValue)> {
        self.options
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Resolve the file's options against the defaults
    pub fn resolve(&self) -> Result<(Configuration, Vec<Warning>)> {
        Configuration::resolve(&self.overrides())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Connectivity;

    #[test]
    fn test_from_toml() {
        let file = ConfigFile::from_toml(
            "NumROIs = 2\nConnectivity = 4\nFillHoles = false\nScaleNumVertices = 3\n",
        )
        .expect("Should parse TOML");

        let (config, warnings) = file.resolve().expect("Should resolve");
        assert_eq!(config.region_count, 2);
        assert_eq!(config.connectivity, Connectivity::Four);
        assert!(!config.fill_holes);
        assert_eq!(config.decimation_stride.get(), 3);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_from_json() {
        let file = ConfigFile::from_json(r#"{ "RoundOutput": true, "Connectivity": 6 }"#)
            .expect("Should parse JSON");
        let (config, warnings) = file.resolve().expect("Should resolve");
        assert!(config.round_output);
        assert_eq!(config.connectivity, Connectivity::Four);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unknown_key_is_reported_on_resolve() {
        let file = ConfigFile::from_toml("Tolerance = 1.5\n").expect("Should parse TOML");
        let err = file.resolve().expect_err("Unknown option must be rejected");
        assert!(matches!(
            err,
            Mask2RoiError::UnknownOption { ref key, value_type: "float" } if key == "Tolerance"
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            ConfigFile::from_file("options.yaml"),
            Err(Mask2RoiError::UnsupportedFileFormat)
        ));
    }
}
