//! The value a transform hands back: a cleaned value or a failure.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde_json::Value;

use crate::error::{CuratorError, Result};

/// Outcome of a single transform call.
///
/// A failure is data, not an error: it flows through dispatch and lands in
/// the output record like any other value. It is always falsy, so callers can
/// ask [`TransformResult::is_truthy`] or [`TransformResult::is_failure`]
/// without matching on the tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransformResult {
    /// The cleaned value.
    Success(Value),
    /// The transform could not produce a value.
    Failure(TransformFailure),
}

impl TransformResult {
    /// Wrap a cleaned value.
    pub fn success(value: impl Into<Value>) -> Self {
        TransformResult::Success(value.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransformResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TransformResult::Failure(_))
    }

    /// Boolean view of the result.
    ///
    /// Failures are always false. Successes follow the wrapped value: null,
    /// `false`, zero, and empty strings, arrays or objects are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            TransformResult::Failure(_) => false,
            TransformResult::Success(value) => match value {
                Value::Null => false,
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                Value::String(s) => !s.is_empty(),
                Value::Array(a) => !a.is_empty(),
                Value::Object(o) => !o.is_empty(),
            },
        }
    }

    /// The cleaned value, if any.
    pub fn ok(&self) -> Option<&Value> {
        match self {
            TransformResult::Success(value) => Some(value),
            TransformResult::Failure(_) => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&TransformFailure> {
        match self {
            TransformResult::Success(_) => None,
            TransformResult::Failure(failure) => Some(failure),
        }
    }

    /// Raise a failure as [`CuratorError::Transform`].
    pub fn into_result(self) -> Result<Value> {
        match self {
            TransformResult::Success(value) => Ok(value),
            TransformResult::Failure(failure) => Err(CuratorError::Transform(failure)),
        }
    }

    /// Attach dispatch context to a failure. Successes pass through.
    pub fn in_context(self, table: &str, column: &str, record: usize) -> Self {
        match self {
            TransformResult::Failure(failure) => {
                TransformResult::Failure(failure.with_context(table, column, record))
            }
            success => success,
        }
    }
}

impl From<Value> for TransformResult {
    fn from(value: Value) -> Self {
        TransformResult::Success(value)
    }
}

impl From<TransformFailure> for TransformResult {
    fn from(failure: TransformFailure) -> Self {
        TransformResult::Failure(failure)
    }
}

/// Where in a batch a failure was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureContext {
    pub table: String,
    pub column: String,
    /// Index of the record within its batch (0-based).
    pub record: usize,
}

/// Details of a failed transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformFailure {
    /// What went wrong.
    pub message: String,
    /// The raw value the transform was given.
    pub value: Value,
    /// Source position that reported the failure.
    pub location: String,
    /// Set once the failure passes through the curator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<FailureContext>,
}

impl TransformFailure {
    pub fn new(message: impl Into<String>, value: impl Into<Value>, location: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: value.into(),
            location: location.into(),
            context: None,
        }
    }

    /// Stamp the table, column and record index the failure belongs to.
    pub fn with_context(mut self, table: &str, column: &str, record: usize) -> Self {
        self.context = Some(FailureContext {
            table: table.to_string(),
            column: column.to_string(),
            record,
        });
        self
    }
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (value: {}) at {}", self.message, self.value, self.location)?;
        if let Some(ref ctx) = self.context {
            write!(f, " [{}.{}, record {}]", ctx.table, ctx.column, ctx.record)?;
        }
        Ok(())
    }
}

/// Report a failed transform.
///
/// The location defaults to the call site of this function.
///
/// ```
/// use curator::transform::failure;
///
/// let result = failure("Value should be positive", -3);
/// assert!(result.is_failure());
/// assert!(!result.is_truthy());
/// ```
#[track_caller]
pub fn failure(message: impl Into<String>, value: impl Into<Value>) -> TransformResult {
    let caller = panic::Location::caller();
    TransformResult::Failure(TransformFailure::new(
        message,
        value,
        format!("{}:{}", caller.file(), caller.line()),
    ))
}

/// Run a transform body, turning a panic into a failure.
///
/// The panic site is not recoverable from the payload, so the location is
/// the caller of this function.
#[track_caller]
pub(crate) fn catch_panic<F, R>(body: F, raw: R) -> TransformResult
where
    F: FnOnce() -> TransformResult,
    R: FnOnce() -> Value,
{
    let caller = panic::Location::caller();
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(payload) => TransformResult::Failure(TransformFailure::new(
            panic_message(payload.as_ref()),
            raw(),
            format!("{}:{}", caller.file(), caller.line()),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "transform panicked".to_string()
    }
}
