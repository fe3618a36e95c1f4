//! Default values and configuration sections with default implementations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Macro to generate default functions for serde attributes
macro_rules! default_fn {
    ($name:ident, $type:ty, $value:expr) => {
        pub(crate) fn $name() -> $type {
            $value
        }
    };
}

// =========================================================================
// DEFAULT VALUE FUNCTIONS
// =========================================================================

default_fn!(default_true, bool, true);
default_fn!(default_timeout_secs, u64, 30);

// =========================================================================
// CONFIG SECTIONS
// =========================================================================

/// How schema references outside the built-in set are resolved.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Allow `http(s):` references to be fetched.
    #[serde(default = "default_true")]
    pub allow_remote: bool,
    /// Per-request timeout for remote fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory that relative schema paths are resolved against.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            allow_remote: default_true(),
            timeout_secs: default_timeout_secs(),
            base_dir: None,
        }
    }
}

/// Which validators a SampleSheet v2 is checked against.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Include the built-in illumina schema and logic.
    #[serde(default = "default_true")]
    pub builtin: bool,
    /// Extra JSON Schema documents, run after the built-in validators.
    #[serde(default)]
    pub schemas: Vec<serde_json::Value>,
    /// Minimal pairwise index distance, if it should be checked.
    #[serde(default)]
    pub index_distance: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            builtin: default_true(),
            schemas: Vec::new(),
            index_distance: None,
        }
    }
}
