//! Sanity checks for loaded configuration.

use anyhow::{bail, Result};

use super::defaults::{ResolverConfig, ValidationConfig};

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("resolver.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.index_distance == Some(0) {
            bail!("validation.index_distance must be greater than 0");
        }
        for (i, schema) in self.schemas.iter().enumerate() {
            if !schema.is_object() {
                bail!("validation.schemas[{}] must be a mapping, not a scalar or list", i);
            }
        }
        Ok(())
    }
}
