//! Transforms: the result model, transformer capabilities and their registry.

pub mod builtin;
mod registry;
mod result;
mod transformer;

pub use registry::{ModuleRegistrar, TransformerRegistry};
pub use result::{failure, FailureContext, TransformFailure, TransformResult};
pub use transformer::{
    BoundTransform, CallingConvention, RowTransform, StructTransformer, StructTransformerBuilder,
    Transformer, ValueTransform,
};
