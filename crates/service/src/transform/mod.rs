//! Response reshaping: one `ResponseTransformer` per configured step, chained
//! by a `TransformPipeline` that never lets a failing step abort the chain.

pub mod transformer;
pub mod pipeline;

use thiserror::Error;

use crate::field_path::FieldPathError;

pub use pipeline::TransformPipeline;
pub use transformer::ResponseTransformer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error(transparent)]
    Path(#[from] FieldPathError),
    #[error("cannot rename '{from}' to '{to}': wildcard prefixes differ")]
    UnsupportedRename { from: String, to: String },
}
