//! Configuration file (lacquer.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use lacquer_core::PluginOptions;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub output: OutputConfig,

    /// Options forwarded to the rule extractor
    #[serde(default)]
    pub transform: PluginOptions,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub source_maps: bool,
    #[serde(default)]
    pub require_css: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            source_maps: false,
            require_css: false,
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_file_is_missing() {
        let dir = TempDir::new().unwrap();

        let config = load_config(&dir.path().join("lacquer.toml")).unwrap();

        assert_eq!(config.output.dir, PathBuf::from("."));
        assert!(!config.output.source_maps);
        assert!(config.transform.evaluate);
        assert!(!config.transform.display_name);
    }

    #[test]
    fn reads_partial_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lacquer.toml");
        fs::write(
            &path,
            "[output]\ndir = \"dist\"\nsource_maps = true\n\n[transform]\ndisplay_name = true\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.output.dir, PathBuf::from("dist"));
        assert!(config.output.source_maps);
        assert!(!config.output.require_css);
        assert!(config.transform.evaluate);
        assert!(config.transform.display_name);
    }

    #[test]
    fn rejects_malformed_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lacquer.toml");
        fs::write(&path, "[output\ndir = ").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().starts_with("Failed to parse"));
    }
}
