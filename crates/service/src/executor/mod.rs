//! The outbound side of an invocation: a request executor and the
//! authentication step applied before it.

pub mod auth;
pub mod http;

use std::collections::BTreeMap;

use async_trait::async_trait;
use models::HttpMethod;
use serde::Serialize;
use serde_json::Value;

use crate::errors::ExecutorError;

pub use auth::{Authenticator, ConfiguredAuth, NoAuth};
pub use http::ReqwestExecutor;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one request and returns the decoded response.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ExecutorError>;
}
