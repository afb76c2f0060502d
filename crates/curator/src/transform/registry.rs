//! Name → transformer registry and transform reference resolution.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{CuratorError, Result};

use super::builtin;
use super::transformer::{BoundTransform, RowTransform, StructTransformer, Transformer, ValueTransform};

/// Registry of every transformer a table description may reference.
///
/// Names are dotted paths (`lab.normalize_name`, `lab.LabTransformer`).
/// Registering a name twice replaces the earlier entry.
///
/// ```
/// use curator::transform::{TransformerRegistry, TransformResult};
/// use serde_json::Value;
///
/// fn shout(raw: &Value) -> TransformResult {
///     TransformResult::success(raw.as_str().unwrap_or_default().to_uppercase())
/// }
///
/// let mut registry = TransformerRegistry::new();
/// registry.module("text").value("shout", shout);
///
/// assert!(registry.find("text.shout").is_ok());
/// assert!(registry.find("text.whisper").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransformerRegistry {
    entries: IndexMap<String, Transformer>,
}

impl TransformerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Create a registry holding the built-in `common.*` transforms.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register(&mut registry);
        registry
    }

    /// Add a transformer, returning the one it replaced.
    pub fn register(&mut self, name: impl Into<String>, transformer: Transformer) -> Option<Transformer> {
        let name = name.into();
        let previous = self.entries.insert(name.clone(), transformer);
        if previous.is_some() {
            warn!(name = %name, "transformer registered twice, keeping the latest");
        }
        previous
    }

    /// Register a single-value transform.
    pub fn register_value(&mut self, name: impl Into<String>, transform: impl ValueTransform + 'static) -> &mut Self {
        self.register(name, Transformer::Value(Arc::new(transform)));
        self
    }

    /// Register a whole-row transform.
    pub fn register_row(&mut self, name: impl Into<String>, transform: impl RowTransform + 'static) -> &mut Self {
        self.register(name, Transformer::Row(Arc::new(transform)));
        self
    }

    /// Register a struct transformer under its own name.
    pub fn register_struct(&mut self, transformer: StructTransformer) -> &mut Self {
        let name = transformer.name().to_string();
        self.register(name, Transformer::Struct(Arc::new(transformer)));
        self
    }

    /// Registrar that prefixes every name with `path.`.
    pub fn module(&mut self, path: impl Into<String>) -> ModuleRegistrar<'_> {
        ModuleRegistrar {
            registry: self,
            path: path.into(),
        }
    }

    /// Look up a transformer by its full name.
    pub fn find(&self, name: &str) -> Result<&Transformer> {
        self.entries
            .get(name)
            .ok_or_else(|| CuratorError::UnknownTransformer(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Transformer> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind a dotted reference to a callable transform.
    ///
    /// The longest registered prefix of the reference names the transformer.
    /// One trailing segment after a struct transformer names one of its
    /// fields; the field is bound as a row transform.
    pub fn resolve(&self, reference: &str) -> Result<BoundTransform> {
        let segments: Vec<&str> = reference.split('.').collect();
        let unresolved = |reason: String| CuratorError::UnresolvedTransform {
            reference: reference.to_string(),
            reason,
        };

        for split in (1..=segments.len()).rev() {
            let name = segments[..split].join(".");
            let Some(transformer) = self.entries.get(&name) else {
                continue;
            };
            let rest = &segments[split..];

            let bound = match (transformer, rest) {
                (Transformer::Value(t), []) => BoundTransform::Value(Arc::clone(t)),
                (Transformer::Row(t), []) => BoundTransform::Row(Arc::clone(t)),
                (Transformer::Struct(_), []) => {
                    return Err(unresolved(format!(
                        "'{}' is a struct transformer, reference one of its fields",
                        name
                    )));
                }
                (Transformer::Struct(s), [field]) => match s.field(field) {
                    Some(t) => BoundTransform::Row(Arc::clone(t)),
                    None => {
                        return Err(unresolved(format!("'{}' has no field '{}'", name, field)));
                    }
                },
                (other, _) => {
                    return Err(unresolved(format!(
                        "'{}' is a {} transformer and has no field '{}'",
                        name,
                        other.kind(),
                        rest.join(".")
                    )));
                }
            };

            debug!(reference, convention = ?bound.convention(), "resolved transform");
            return Ok(bound);
        }

        Err(unresolved(self.missing_reason(&segments)))
    }

    /// Explain which part of an unresolvable reference is missing.
    fn missing_reason(&self, segments: &[&str]) -> String {
        for split in (1..segments.len()).rev() {
            let module = segments[..split].join(".");
            let prefix = format!("{}.", module);
            if self.entries.keys().any(|k| k.starts_with(&prefix)) {
                return format!("module '{}' has no transformer '{}'", module, segments[split]);
            }
        }
        match segments {
            [name] => format!("no transformer named '{}'", name),
            _ => format!("no module named '{}'", segments[..segments.len() - 1].join(".")),
        }
    }
}

/// Registers transformers under a common module path.
pub struct ModuleRegistrar<'a> {
    registry: &'a mut TransformerRegistry,
    path: String,
}

impl ModuleRegistrar<'_> {
    fn qualify(&self, name: &str) -> String {
        format!("{}.{}", self.path, name)
    }

    pub fn value(self, name: &str, transform: impl ValueTransform + 'static) -> Self {
        let name = self.qualify(name);
        self.registry.register_value(name, transform);
        self
    }

    pub fn row(self, name: &str, transform: impl RowTransform + 'static) -> Self {
        let name = self.qualify(name);
        self.registry.register_row(name, transform);
        self
    }

    /// Register a struct transformer as `path.<struct name>`.
    pub fn structure(self, transformer: StructTransformer) -> Self {
        let name = self.qualify(transformer.name());
        self.registry
            .register(name, Transformer::Struct(Arc::new(transformer)));
        self
    }
}
