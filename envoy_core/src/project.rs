//! Project configuration.
//!
//! A project is a directory holding an `envoy.yaml` file and the definition
//! files it points at:
//!
//! ```text
//! pwd
//!  └── {project_name}
//!       ├── envoy.yaml
//!       └── users
//!            └── <anything>.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glob::glob;
use serde::{Deserialize, Serialize};
use yaml_peg::serde as yaml;

use crate::logging::debug;

/// Default name of the project configuration file
pub const PROJECT_CFG: &str = "envoy.yaml";

/// Struct representing the envoy.yaml file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    name: String,
    /// Glob patterns, relative to the project directory, of the files holding definitions.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

fn default_version() -> String {
    "0.0.1".to_owned()
}

fn default_sources() -> Vec<String> {
    vec!["users/**/*.y*ml".to_owned()]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: String::new(),
            sources: default_sources(),
        }
    }
}

impl ProjectConfig {
    /// New === default for this simple constructor.
    pub fn new() -> Self {
        Default::default()
    }

    /// Read the config from a file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
        debug!("Trying to read project config from {:?}", path.as_ref());
        let config_raw = fs::read_to_string(&path).context("Reading file")?;
        Self::from_yaml(&config_raw)
    }

    /// Parse the config from yaml. An empty document yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<ProjectConfig> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let mut config = yaml::from_str::<ProjectConfig>(raw).context("Deserializing config")?;
        config.pop().ok_or_else(|| anyhow!["config file is empty"])
    }

    /// Set the project name.
    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Get the name
    pub fn get_name(&self) -> String {
        self.name.to_owned()
    }

    /// Convert this config to a yaml string.
    pub fn to_yaml(&self) -> Result<String> {
        yaml::to_string(self).map_err(anyhow::Error::from)
    }

    /// Expand the source patterns relative to `project_dir`. Paths are sorted
    /// and each appears once, even when several patterns match it.
    pub fn source_paths<P: AsRef<Path>>(&self, project_dir: P) -> Result<Vec<PathBuf>> {
        let mut paths = vec![];
        for pattern in &self.sources {
            let full = project_dir.as_ref().join(pattern);
            let matches = glob(&full.to_string_lossy())
                .with_context(|| format!("invalid source pattern `{pattern}`"))?;
            for p in matches {
                paths.push(p.context("trouble reading source path")?);
            }
        }
        paths.sort();
        paths.dedup();
        debug!("found {} source files", paths.len());
        Ok(paths)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() -> Result<()> {
        let cfg = ProjectConfig::from_yaml("")?;
        assert_eq!(cfg, ProjectConfig::new());
        assert_eq!(cfg.sources, vec!["users/**/*.y*ml"]);
        Ok(())
    }

    #[test]
    fn config_is_parsed() -> Result<()> {
        let cfg = ProjectConfig::from_yaml("name: demo\nsources:\n  - people/*.yaml\n")?;
        assert_eq!(cfg.get_name(), "demo");
        assert_eq!(cfg.sources, vec!["people/*.yaml"]);
        Ok(())
    }

    #[test]
    fn source_paths_are_sorted_and_unique() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("envoy_project_test_{}", std::process::id()));
        fs::create_dir_all(dir.join("users/nested"))?;
        fs::write(dir.join("users/b.yaml"), "")?;
        fs::write(dir.join("users/nested/a.yml"), "")?;
        fs::write(dir.join("users/notes.txt"), "")?;

        let mut cfg = ProjectConfig::new();
        cfg.sources.push("users/*.yaml".to_owned());
        let paths = cfg.source_paths(&dir)?;

        fs::remove_dir_all(&dir)?;
        assert_eq!(
            paths,
            vec![dir.join("users/b.yaml"), dir.join("users/nested/a.yml")]
        );
        Ok(())
    }
}
