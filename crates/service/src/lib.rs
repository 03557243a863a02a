//! Core of the declarative API client.
//! - `field_path` / `transform`: reshape JSON responses.
//! - `params`: resolve aliases and sort arguments into request slots.
//! - `cache`: TTL cache persisted as JSON.
//! - `invoke`: the resolve -> call -> transform cycle on top of an executor.

pub mod errors;
pub mod observability;
pub mod field_path;
pub mod transform;
pub mod params;
pub mod storage;
pub mod cache;
pub mod executor;
pub mod invoke;

pub use cache::{CacheEntry, CacheStats, CacheStorage};
pub use errors::{CacheError, ExecutorError, ServiceError};
pub use executor::{Authenticator, ConfiguredAuth, HttpRequest, HttpResponse, NoAuth, ReqwestExecutor, RequestExecutor};
pub use invoke::{ApiClient, BatchItem, BatchReport, InvocationOutcome, InvokeOptions};
pub use params::{AliasResolver, ParameterValidator, ValidationOptions, ValidationReport};
pub use transform::{ResponseTransformer, TransformPipeline};
