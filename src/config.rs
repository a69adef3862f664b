//! YAML run configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::GenError;

/// Package metadata written into the generated `__init__.py` and
/// packaging scaffolding.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageConfig {
    /// Importable package name, e.g. `blockchain_apis`.
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(rename = "author-comment", default)]
    pub author_comment: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Symbols re-exported from the package root.
    #[serde(rename = "all-exports", default)]
    pub all_exports: Vec<String>,
}

/// The full run configuration (`config.yml`).
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Primary client class name, e.g. `BlockchainAPIs`.
    pub name: String,
    /// Base URL baked into both generated clients.
    #[serde(rename = "api-url")]
    pub api_url: String,
    pub package: PackageConfig,
    #[serde(rename = "model-module-description", default)]
    pub model_module_description: String,
    #[serde(rename = "exception-module-description", default)]
    pub exception_module_description: String,
}

impl RunConfig {
    /// Load and parse the configuration file.
    pub fn load(path: &Path) -> Result<Self, GenError> {
        if !path.is_file() {
            return Err(GenError::ConfigNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Class name of the synchronous client variant.
    #[must_use]
    pub fn sync_name(&self) -> String {
        format!("{}Sync", self.name)
    }

    /// Class name of the shared base exception.
    #[must_use]
    pub fn base_exception(&self) -> String {
        format!("{}Exception", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_YAML: &str = r#"
name: BlockchainAPIs
api-url: https://api.blockchainapis.io
package:
  name: blockchain_apis
  author: blockchainapis
  author-comment: maintained by the API team
  version: 0.1.0
  description: High-frequency DEX API client
  all-exports:
    - BlockchainAPIs
    - BlockchainAPIsSync
    - Exchange
model-module-description: Models returned by the API
exception-module-description: Exceptions raised by the API
"#;

    #[test]
    fn parses_kebab_case_keys() {
        let config: RunConfig = serde_yaml::from_str(CONFIG_YAML).expect("valid config");

        assert_eq!("BlockchainAPIs", config.name);
        assert_eq!("https://api.blockchainapis.io", config.api_url);
        assert_eq!("blockchain_apis", config.package.name);
        assert_eq!("0.1.0", config.package.version);
        assert_eq!(3, config.package.all_exports.len());
        assert_eq!("Models returned by the API", config.model_module_description);
    }

    #[test]
    fn derived_class_names() {
        let config: RunConfig = serde_yaml::from_str(CONFIG_YAML).expect("valid config");

        assert_eq!("BlockchainAPIsSync", config.sync_name());
        assert_eq!("BlockchainAPIsException", config.base_exception());
    }

    #[test]
    fn missing_file_maps_to_config_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("config.yml");

        let error = RunConfig::load(&missing).expect_err("must fail");
        assert!(matches!(error, GenError::ConfigNotFound(_)));
        assert_eq!(4, error.exit_code());
    }
}
