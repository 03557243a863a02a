//! Argument handling for one invocation:
//! alias resolution -> defaults -> parameter map -> validation -> request slots.

pub mod alias;
pub mod mapping;
pub mod validator;
pub mod request;

pub use alias::{merge_args, AliasResolver, Resolution};
pub use mapping::{ParameterMap, ParameterSpec};
pub use request::{classify, RequestParts};
pub use validator::{ParameterValidator, ValidationOptions, ValidationReport};
