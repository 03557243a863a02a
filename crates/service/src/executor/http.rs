use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use models::HttpMethod;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::{HttpRequest, HttpResponse, RequestExecutor};
use crate::errors::ExecutorError;

/// `reqwest`-backed executor. JSON bodies are decoded; anything else is
/// returned as a JSON string, and an empty body as `null`.
#[derive(Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ExecutorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ExecutorError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

fn method(m: HttpMethod) -> Method {
    match m {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ExecutorError> {
        let mut builder = self.client.request(method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| ExecutorError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let text = resp.text().await.map_err(|e| ExecutorError::Transport(e.to_string()))?;
        debug!(status, bytes = text.len(), url = %request.url, "response received");

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(HttpResponse { status, headers, body })
    }
}
