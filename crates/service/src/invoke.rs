//! End-to-end invocation: resolve -> validate -> classify -> authenticate ->
//! cache lookup -> execute -> cache store -> transform.

use std::sync::Arc;

use models::{HttpMethod, OperationRef, ServiceConfig};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::cache::CacheStorage;
use crate::errors::ServiceError;
use crate::executor::{Authenticator, HttpRequest, NoAuth, RequestExecutor};
use crate::observability::INVOCATIONS_TOTAL;
use crate::params::{
    classify, merge_args, AliasResolver, ParameterMap, ParameterValidator, ValidationOptions,
};
use crate::transform::TransformPipeline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Unknown arguments fail validation.
    pub strict: bool,
    /// Skip both cache lookup and cache store.
    pub no_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationOutcome {
    pub operation: String,
    pub status: u16,
    pub cached: bool,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub succeeded: usize,
    pub failed: usize,
    pub stopped_early: bool,
}

/// Invocation context. The cache is an explicit dependency; without one every
/// call goes to the executor.
pub struct ApiClient {
    executor: Arc<dyn RequestExecutor>,
    auth: Arc<dyn Authenticator>,
    cache: Option<Arc<CacheStorage>>,
}

impl ApiClient {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self { executor, auth: Arc::new(NoAuth), cache: None }
    }

    pub fn with_auth(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_cache(mut self, cache: Arc<CacheStorage>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<CacheStorage>> {
        self.cache.as_ref()
    }

    /// Build the outgoing request for `name` without sending it.
    pub fn prepare<'a>(
        &self,
        service: &'a ServiceConfig,
        name: &str,
        args: Map<String, Value>,
        opts: InvokeOptions,
    ) -> Result<(OperationRef<'a>, HttpRequest), ServiceError> {
        let resolution = AliasResolver::new(service).resolve(name, args)?;
        let op = resolution.operation;
        let args = merge_args(op.default_params(), resolution.merged_args);

        let params = ParameterMap::build(op);
        let report = ParameterValidator::validate_against(
            &params,
            &args,
            ValidationOptions { partial: false, strict: opts.strict },
        );
        for warning in &report.warnings {
            warn!(operation = op.name(), "{warning}");
        }
        if !report.valid {
            let help = (!report.missing.is_empty())
                .then(|| format!("required parameters: {}", params.required().collect::<Vec<_>>().join(", ")));
            return Err(ServiceError::Validation { report, help });
        }

        let parts = classify(op, &params, &args)?;
        let mut request = match op {
            OperationRef::Rest(endpoint) => {
                let mut url = format!("{}{}", service.base_url.trim_end_matches('/'), parts.path);
                if let Some(qs) = parts.query_string() {
                    url.push('?');
                    url.push_str(&qs);
                }
                HttpRequest {
                    method: endpoint.method,
                    url,
                    headers: parts.headers,
                    body: parts.body.map(Value::Object),
                }
            }
            OperationRef::GraphQl(operation) => HttpRequest {
                method: HttpMethod::Post,
                url: service.base_url.clone(),
                headers: parts.headers,
                body: Some(json!({
                    "query": operation.query,
                    "variables": parts.body.unwrap_or_default(),
                })),
            },
        };
        if request.body.is_some() {
            request.headers.entry("Content-Type".to_string()).or_insert_with(|| "application/json".to_string());
        }
        self.auth.apply(&mut request, service);
        Ok((op, request))
    }

    pub async fn invoke(
        &self,
        service: &ServiceConfig,
        name: &str,
        args: Map<String, Value>,
        opts: InvokeOptions,
    ) -> Result<InvocationOutcome, ServiceError> {
        INVOCATIONS_TOTAL.inc();
        let (op, request) = self.prepare(service, name, args, opts)?;
        let pipeline = TransformPipeline::from_operation(op).unwrap_or_default();

        let cache_ttl = op.cache_ttl().filter(|ttl| *ttl > 0 && op.is_read());
        let cache = self.cache.as_ref().filter(|_| cache_ttl.is_some() && !opts.no_cache);
        let cache_key = cache.map(|_| {
            CacheStorage::generate_request_key(
                &service.service_name,
                op.name(),
                &request.url,
                &request.headers,
                request.body.as_ref(),
            )
        });

        if let (Some(cache), Some(key)) = (cache, cache_key.as_deref()) {
            if let Some(raw) = cache.get(key).await? {
                debug!(operation = op.name(), "serving cached response");
                return Ok(InvocationOutcome {
                    operation: op.name().to_string(),
                    status: 200,
                    cached: true,
                    data: pipeline.transform(raw),
                });
            }
        }

        debug!(method = request.method.as_str(), url = %request.url, "executing request");
        let response = self.executor.execute(&request).await?;
        if !response.is_success() {
            return Err(ServiceError::Http { status: response.status, body: response.body });
        }
        if op.is_graphql() {
            if let Some(errors) = response.body.get("errors").filter(|e| e.as_array().is_some_and(|a| !a.is_empty())) {
                return Err(ServiceError::GraphQl(errors.clone()));
            }
        }

        if let (Some(cache), Some(key), Some(ttl)) = (cache, cache_key.as_deref(), cache_ttl) {
            cache.set(key, response.body.clone(), ttl).await?;
        }

        Ok(InvocationOutcome {
            operation: op.name().to_string(),
            status: response.status,
            cached: false,
            data: pipeline.transform(response.body),
        })
    }

    /// Run the full cycle once per input, in order. With `fail_fast` the
    /// batch stops at the first failure.
    pub async fn invoke_batch(
        &self,
        service: &ServiceConfig,
        name: &str,
        inputs: Vec<Map<String, Value>>,
        opts: InvokeOptions,
        fail_fast: bool,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (index, args) in inputs.into_iter().enumerate() {
            match self.invoke(service, name, args, opts).await {
                Ok(outcome) => {
                    report.succeeded += 1;
                    report.items.push(BatchItem { index, ok: true, data: Some(outcome.data), error: None });
                }
                Err(e) => {
                    report.failed += 1;
                    report.items.push(BatchItem { index, ok: false, data: None, error: Some(e.to_string()) });
                    if fail_fast {
                        report.stopped_early = true;
                        break;
                    }
                }
            }
        }
        info!(
            operation = name,
            succeeded = report.succeeded,
            failed = report.failed,
            stopped_early = report.stopped_early,
            "batch finished"
        );
        report
    }
}
