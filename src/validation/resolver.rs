//! Schema reference resolution.
//!
//! Built-in references are answered from memory first. Everything else goes
//! through a [`SchemaResolver`]; [`DefaultResolver`] understands `file:` URLs,
//! `http(s):` URLs and plain paths.

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::illumina;
use crate::error::ResolutionError;

/// Base URI the schema compiler assigns to documents without an `$id`.
const COMPILER_BASE_URI: &str = "json-schema:///";

/// Default timeout for remote schema fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns a schema reference into a schema document.
pub trait SchemaResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<Value, ResolutionError>;
}

/// Resolve `reference`, trying the built-in schemas before `resolver`.
pub fn resolve_reference(
    reference: &str,
    resolver: &dyn SchemaResolver,
) -> Result<Value, ResolutionError> {
    if let Some(schema) = illumina::builtin_schema(reference) {
        debug!(reference, "using built-in schema");
        return Ok(schema);
    }
    resolver.resolve(reference)
}

/// Resolves local files and, unless disabled, remote URLs.
pub struct DefaultResolver {
    agent: ureq::Agent,
    allow_remote: bool,
    base_dir: Option<PathBuf>,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self {
            agent: build_agent(DEFAULT_TIMEOUT),
            allow_remote: true,
            base_dir: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    /// Allow or refuse `http(s):` references.
    pub fn allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    /// Directory that relative paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn local_path(&self, relative: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(relative),
            None => PathBuf::from(relative),
        }
    }

    fn read_file(&self, reference: &str, path: &Path) -> Result<Value, ResolutionError> {
        debug!(reference, path = %path.display(), "reading schema file");
        let text = fs::read_to_string(path).map_err(|source| ResolutionError::Io {
            reference: reference.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ResolutionError::Json {
            reference: reference.to_string(),
            source,
        })
    }

    fn fetch(&self, reference: &str, url: &Url) -> Result<Value, ResolutionError> {
        if !self.allow_remote {
            return Err(ResolutionError::RemoteDisabled {
                reference: reference.to_string(),
            });
        }
        info!(url = %url, "fetching remote schema");
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| ResolutionError::Fetch {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;
        response
            .into_json::<Value>()
            .map_err(|e| ResolutionError::Fetch {
                reference: reference.to_string(),
                message: format!("invalid JSON body: {}", e),
            })
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaResolver for DefaultResolver {
    fn resolve(&self, reference: &str) -> Result<Value, ResolutionError> {
        if let Some(relative) = reference.strip_prefix(COMPILER_BASE_URI) {
            return self.read_file(reference, &self.local_path(relative));
        }

        let url = match Url::parse(reference) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return self.read_file(reference, &self.local_path(reference));
            }
            Err(_) => {
                return Err(ResolutionError::Unsupported {
                    reference: reference.to_string(),
                })
            }
        };

        let document = match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| ResolutionError::Unsupported {
                        reference: reference.to_string(),
                    })?;
                self.read_file(reference, &path)?
            }
            "http" | "https" => self.fetch(reference, &url)?,
            _ => {
                return Err(ResolutionError::Unsupported {
                    reference: reference.to_string(),
                })
            }
        };
        select_fragment(reference, document, url.fragment())
    }
}

/// Resolves references from a fixed in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    schemas: HashMap<String, Value>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reference: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(reference.into(), schema);
        self
    }
}

impl SchemaResolver for StaticResolver {
    fn resolve(&self, reference: &str) -> Result<Value, ResolutionError> {
        self.schemas
            .get(reference)
            .cloned()
            .ok_or_else(|| ResolutionError::Unsupported {
                reference: reference.to_string(),
            })
    }
}

/// Adapter handing nested references from the schema compiler to a resolver.
pub(crate) struct ResolverRetriever {
    resolver: Arc<dyn SchemaResolver>,
}

impl ResolverRetriever {
    pub(crate) fn new(resolver: Arc<dyn SchemaResolver>) -> Self {
        Self { resolver }
    }
}

impl jsonschema::Retrieve for ResolverRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        resolve_reference(uri.as_str(), self.resolver.as_ref()).map_err(Into::into)
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

fn select_fragment(
    reference: &str,
    document: Value,
    fragment: Option<&str>,
) -> Result<Value, ResolutionError> {
    match fragment {
        None | Some("") => Ok(document),
        Some(pointer) => document
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| ResolutionError::Unresolvable {
                message: format!("'{}' has no element at '{}'", reference, pointer),
            }),
    }
}
