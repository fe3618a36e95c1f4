//! Ordered, fail-fast validation of sectioned sheets.
//!
//! A validator is either a JSON Schema document, evaluated against the
//! sheet's tree form (see [`crate::sheet::tree`]), or a predicate function
//! over the typed sheet. Validators run in list order and the first failure
//! stops the run.
//!
//! A schema of the form `{"$ref": "<reference>"}` is resolved before it is
//! compiled. Built-in references such as
//! [`ILLUMINA_V2_SCHEMA_URN`](illumina::ILLUMINA_V2_SCHEMA_URN) never touch
//! the network or the file system; everything else goes through the injected
//! [`SchemaResolver`].

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ResolutionError, ValidationError, ValidatorId, ValidatorKind};
use crate::sheet::SectionedSheet;

pub mod illumina;
pub mod index_distance;
pub mod resolver;

pub use illumina::{default_validators, ILLUMINA_V2_SCHEMA_URN, NEXTSEQ_1K2K_SCHEMA_URN};
pub use index_distance::{check_index_distance, index_distance};
pub use resolver::{resolve_reference, DefaultResolver, SchemaResolver, StaticResolver};

/// Signature of a predicate validator.
pub type Predicate = dyn Fn(&SectionedSheet) -> anyhow::Result<()> + Send + Sync;

/// Longest chain of `$ref`-only documents followed before giving up.
const MAX_REF_DEPTH: usize = 16;

/// One check in a validation pipeline.
#[derive(Clone)]
pub enum Validator {
    /// A JSON Schema document (draft 2020-12).
    Schema(Value),
    /// A function that returns an error to reject the sheet.
    Predicate {
        name: Option<String>,
        check: Arc<Predicate>,
    },
}

impl Validator {
    pub fn schema(schema: Value) -> Self {
        Self::Schema(schema)
    }

    /// A schema that only references another document.
    pub fn schema_ref(reference: impl Into<String>) -> Self {
        Self::Schema(serde_json::json!({ "$ref": reference.into() }))
    }

    /// An anonymous predicate, reported by its position in the list.
    pub fn predicate<F>(check: F) -> Self
    where
        F: Fn(&SectionedSheet) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::Predicate {
            name: None,
            check: Arc::new(check),
        }
    }

    /// A predicate reported by name.
    pub fn named_predicate<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&SectionedSheet) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::Predicate {
            name: Some(name.into()),
            check: Arc::new(check),
        }
    }

    /// Schema `title` or predicate name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Schema(schema) => schema_title(schema),
            Self::Predicate { name, .. } => name.as_deref(),
        }
    }

    pub fn kind(&self) -> ValidatorKind {
        match self {
            Self::Schema(_) => ValidatorKind::Schema,
            Self::Predicate { .. } => ValidatorKind::Predicate,
        }
    }

    fn id(&self, index: usize) -> ValidatorId {
        ValidatorId {
            index,
            name: self.name().map(str::to_string),
            kind: self.kind(),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(schema) => f.debug_tuple("Schema").field(schema).finish(),
            Self::Predicate { name, .. } => f
                .debug_struct("Predicate")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// Validate with the default resolver.
pub fn validate(sheet: &SectionedSheet, validators: &[Validator]) -> Result<(), ValidationError> {
    let resolver: Arc<dyn SchemaResolver> = Arc::new(DefaultResolver::new());
    validate_with_resolver(sheet, validators, &resolver)
}

/// Run `validators` in order against `sheet`, stopping at the first failure.
///
/// An empty list always succeeds.
pub fn validate_with_resolver(
    sheet: &SectionedSheet,
    validators: &[Validator],
    resolver: &Arc<dyn SchemaResolver>,
) -> Result<(), ValidationError> {
    if validators.is_empty() {
        debug!("no validators requested");
        return Ok(());
    }

    let mut tree: Option<Value> = None;
    for (index, validator) in validators.iter().enumerate() {
        debug!(index, validator = ?validator.name(), "running validator");
        match validator {
            Validator::Schema(schema) => {
                let tree = tree.get_or_insert_with(|| sheet.to_tree());
                run_schema(index, schema, tree, resolver)?;
            }
            Validator::Predicate { check, .. } => {
                check(sheet).map_err(|err| ValidationError::Predicate {
                    validator: validator.id(index),
                    message: format!("{:#}", err),
                })?;
            }
        }
    }
    Ok(())
}

fn run_schema(
    index: usize,
    schema: &Value,
    instance: &Value,
    resolver: &Arc<dyn SchemaResolver>,
) -> Result<(), ValidationError> {
    let unresolved = ValidatorId {
        index,
        name: schema_title(schema).map(str::to_string),
        kind: ValidatorKind::Schema,
    };
    let schema = resolve_root(schema, resolver.as_ref()).map_err(|source| {
        ValidationError::Resolution {
            validator: unresolved.clone(),
            source,
        }
    })?;
    let id = ValidatorId {
        name: schema_title(&schema)
            .map(str::to_string)
            .or(unresolved.name),
        ..unresolved
    };

    let compiled = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .with_retriever(resolver::ResolverRetriever::new(Arc::clone(resolver)))
        .build(&schema)
        .map_err(|err| compile_error(id.clone(), &err))?;

    if let Some(err) = compiled.iter_errors(instance).next() {
        return Err(ValidationError::Schema {
            validator: id,
            path: json_path(&err.instance_path.to_string()),
            message: err.to_string(),
        });
    }
    Ok(())
}

fn compile_error(validator: ValidatorId, err: &jsonschema::ValidationError<'_>) -> ValidationError {
    match &err.kind {
        jsonschema::error::ValidationErrorKind::Referencing(_) => ValidationError::Resolution {
            validator,
            source: ResolutionError::Unresolvable {
                message: err.to_string(),
            },
        },
        _ => ValidationError::InvalidSchema {
            validator,
            message: err.to_string(),
        },
    }
}

/// Follow `{"$ref": ...}`-only documents until a real schema is reached.
fn resolve_root(schema: &Value, resolver: &dyn SchemaResolver) -> Result<Value, ResolutionError> {
    let Some(first) = ref_only(schema) else {
        return Ok(schema.clone());
    };
    let first = first.to_string();
    let mut current = resolve_reference(&first, resolver)?;
    for _ in 1..MAX_REF_DEPTH {
        let Some(next) = ref_only(&current) else {
            return Ok(current);
        };
        let next = next.to_string();
        current = resolve_reference(&next, resolver)?;
    }
    match ref_only(&current) {
        None => Ok(current),
        Some(_) => Err(ResolutionError::TooDeep {
            reference: first,
            depth: MAX_REF_DEPTH,
        }),
    }
}

fn ref_only(schema: &Value) -> Option<&str> {
    let map = schema.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get("$ref").and_then(Value::as_str)
}

fn schema_title(schema: &Value) -> Option<&str> {
    schema.get("title").and_then(Value::as_str)
}

/// Render a JSON pointer as a JSONPath-style location (`$.Header.RunName`).
fn json_path(pointer: &str) -> String {
    let mut path = String::from("$");
    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push_str(&format!("[{}]", segment));
        } else if !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            path.push('.');
            path.push_str(&segment);
        } else {
            path.push_str(&format!("['{}']", segment.replace('\'', "\\'")));
        }
    }
    path
}
