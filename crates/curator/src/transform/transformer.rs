//! Transformer capabilities and the calling conventions they bind to.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::input::Record;

use super::result::{catch_panic, TransformResult};

/// A transform over a single column value.
pub trait ValueTransform: Send + Sync {
    /// Clean one raw value. Expected bad input must come back as a failure.
    fn transform(&self, raw: &Value) -> TransformResult;

    /// Run [`ValueTransform::transform`], converting a panic into a failure.
    fn clean(&self, raw: &Value) -> TransformResult {
        catch_panic(|| self.transform(raw), || raw.clone())
    }
}

/// A transform that needs the whole raw row to clean its column.
pub trait RowTransform: Send + Sync {
    /// Clean one column using every value in the row.
    fn transform(&self, row: &Record) -> TransformResult;

    /// Run [`RowTransform::transform`], converting a panic into a failure.
    fn clean(&self, row: &Record) -> TransformResult {
        catch_panic(|| self.transform(row), || record_value(row))
    }
}

impl<F> ValueTransform for F
where
    F: Fn(&Value) -> TransformResult + Send + Sync,
{
    fn transform(&self, raw: &Value) -> TransformResult {
        self(raw)
    }
}

impl<F> RowTransform for F
where
    F: Fn(&Record) -> TransformResult + Send + Sync,
{
    fn transform(&self, row: &Record) -> TransformResult {
        self(row)
    }
}

/// A transformer producing one output field per declared sub-transform.
///
/// Fields are declared up front with [`StructTransformerBuilder::field`] and
/// frozen by [`StructTransformerBuilder::build`]. Every field receives the
/// entire raw row. A failing field does not abort the others.
///
/// ```
/// use curator::transform::{StructTransformer, TransformResult};
/// use curator::input::Record;
/// use serde_json::json;
///
/// fn one(_: &Record) -> TransformResult { TransformResult::success(1) }
/// fn two(_: &Record) -> TransformResult { TransformResult::success(2) }
///
/// let numbers = StructTransformer::builder("Numbers")
///     .field("one", one)
///     .field("two", two)
///     .build();
///
/// let out = numbers.clean(&Record::new());
/// assert_eq!(out["one"], TransformResult::success(1));
/// assert_eq!(out.len(), 2);
/// ```
pub struct StructTransformer {
    name: String,
    fields: IndexMap<String, Arc<dyn RowTransform>>,
}

impl StructTransformer {
    pub fn builder(name: impl Into<String>) -> StructTransformerBuilder {
        StructTransformerBuilder {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sub-transform for an output field.
    pub fn field(&self, name: &str) -> Option<&Arc<dyn RowTransform>> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Declared output fields, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Invoke every field with the row.
    pub fn transform(&self, row: &Record) -> IndexMap<String, TransformResult> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.transform(row)))
            .collect()
    }

    /// Like [`StructTransformer::transform`], but a panicking field becomes
    /// that field's failure.
    pub fn clean(&self, row: &Record) -> IndexMap<String, TransformResult> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.clean(row)))
            .collect()
    }
}

impl fmt::Debug for StructTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructTransformer")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Declares the fields of a [`StructTransformer`].
pub struct StructTransformerBuilder {
    name: String,
    fields: IndexMap<String, Arc<dyn RowTransform>>,
}

impl StructTransformerBuilder {
    /// Declare an output field. Redeclaring a field replaces it.
    pub fn field(mut self, name: impl Into<String>, transform: impl RowTransform + 'static) -> Self {
        self.fields.insert(name.into(), Arc::new(transform));
        self
    }

    pub fn build(self) -> StructTransformer {
        StructTransformer {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// A registered transformer, tagged with its capability.
#[derive(Clone)]
pub enum Transformer {
    Value(Arc<dyn ValueTransform>),
    Row(Arc<dyn RowTransform>),
    Struct(Arc<StructTransformer>),
}

impl Transformer {
    pub fn kind(&self) -> &'static str {
        match self {
            Transformer::Value(_) => "value",
            Transformer::Row(_) => "row",
            Transformer::Struct(_) => "struct",
        }
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformer::Value(_) => f.write_str("Value(..)"),
            Transformer::Row(_) => f.write_str("Row(..)"),
            Transformer::Struct(s) => f.debug_tuple("Struct").field(s).finish(),
        }
    }
}

/// How a bound transform expects to be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// Receives only its column's raw value.
    Value,
    /// Receives the entire raw record.
    Row,
}

/// A transform resolved from a column description, with its calling
/// convention fixed at resolution time.
#[derive(Clone)]
pub enum BoundTransform {
    Value(Arc<dyn ValueTransform>),
    Row(Arc<dyn RowTransform>),
}

impl BoundTransform {
    pub fn convention(&self) -> CallingConvention {
        match self {
            BoundTransform::Value(_) => CallingConvention::Value,
            BoundTransform::Row(_) => CallingConvention::Row,
        }
    }

    /// Clean one cell, handing the transform what its convention asks for.
    pub fn apply(&self, raw: &Value, row: &Record) -> TransformResult {
        match self {
            BoundTransform::Value(t) => t.clean(raw),
            BoundTransform::Row(t) => t.clean(row),
        }
    }
}

impl fmt::Debug for BoundTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundTransform::{:?}", self.convention())
    }
}

/// A record as a JSON object, for reporting a row-level failure.
pub(crate) fn record_value(row: &Record) -> Value {
    Value::Object(row.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Map<_, _>>())
}
