//! Declarative API description model.
//! - `ServiceConfig` is the root: base URL, authentication, operations, aliases.
//! - Operations are either REST endpoints or GraphQL operations, never both.
//! - Everything here is immutable once loaded; behaviour lives in the `service` crate.

pub mod errors;
pub mod auth;
pub mod parameter;
pub mod transform;
pub mod endpoint;
pub mod alias;
pub mod service;

pub use alias::AliasConfig;
pub use auth::AuthConfig;
pub use endpoint::{EndpointConfig, GraphQLOperationConfig, HttpMethod, OperationRef, OperationType};
pub use errors::ModelError;
pub use parameter::{ParamType, ParameterConfig, ParameterSchema, ValueType};
pub use service::{ServiceConfig, Target};
pub use transform::{RenameRule, TransformConfig, TransformSpec};
