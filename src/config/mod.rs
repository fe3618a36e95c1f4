//! Configuration for the samshee command line tool.
//!
//! Configuration is an optional YAML file given with `--config` or the
//! `SAMSHEE_CONFIG` environment variable. Every key has a default, so an
//! empty file and no file at all behave the same.
//!
//! ```yaml
//! resolver:
//!   allow_remote: true
//!   timeout_secs: 30
//!   base_dir: schemas/
//! validation:
//!   builtin: true
//!   index_distance: 3
//!   schemas:
//!     - { "$ref": "urn:samshee:nextseq1k2k/v1" }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::validation::{default_validators, index_distance, DefaultResolver, SchemaResolver, Validator};

pub mod defaults;
pub mod validation;

pub use defaults::*;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "SAMSHEE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Load from `path`, else from `$SAMSHEE_CONFIG`, else use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(env_config_path) {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        // an empty document deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content).context("Failed to parse config")?;

        config.resolver.validate()?;
        config.validation.validate()?;

        Ok(config)
    }

    /// The resolver described by the `resolver` section.
    pub fn resolver(&self) -> Arc<dyn SchemaResolver> {
        let mut resolver = DefaultResolver::new()
            .allow_remote(self.resolver.allow_remote)
            .with_timeout(Duration::from_secs(self.resolver.timeout_secs));
        if let Some(dir) = &self.resolver.base_dir {
            resolver = resolver.with_base_dir(dir);
        }
        Arc::new(resolver)
    }

    /// Validators for SampleSheet v2 output: built-ins, the index distance
    /// check, then the configured schemas.
    pub fn validators(&self) -> Vec<Validator> {
        let mut validators = if self.validation.builtin {
            default_validators()
        } else {
            Vec::new()
        };
        if let Some(mindist) = self.validation.index_distance {
            validators.push(index_distance(mindist));
        }
        validators.extend(self.validation.schemas.iter().cloned().map(Validator::schema));
        validators
    }
}

fn env_config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
