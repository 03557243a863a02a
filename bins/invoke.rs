use std::sync::Arc;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use serde_json::{Map, Value};
use tracing::{error, info};
use uuid::Uuid;

use configs::{AppConfig, LogFormat};
use models::ServiceConfig;
use service::{ApiClient, CacheStorage, ConfiguredAuth, InvokeOptions, ReqwestExecutor};

fn init_logging(format: LogFormat) {
    match format {
        LogFormat::Json => common::utils::logging::init_logging_json(),
        LogFormat::Compact => common::utils::logging::init_logging_default(),
    }
    info!(service = "invoke", event = "logger_init", "tracing subscriber initialized");
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn into_object(v: Value) -> anyhow::Result<Map<String, Value>> {
    match v {
        Value::Object(m) => Ok(m),
        Value::Null => Ok(Map::new()),
        other => Err(anyhow!("arguments must be a JSON object, got {}", other)),
    }
}

async fn run(cfg: AppConfig) -> anyhow::Result<Value> {
    let service_path = std::env::var("APISHAPE_SERVICE").context("APISHAPE_SERVICE is not set")?;
    let operation = std::env::var("APISHAPE_OPERATION").context("APISHAPE_OPERATION is not set")?;
    let raw_args = std::env::var("APISHAPE_ARGS").unwrap_or_else(|_| "{}".to_string());

    let text = tokio::fs::read_to_string(&service_path)
        .await
        .with_context(|| format!("failed to read service definition {}", service_path))?;
    let svc = ServiceConfig::from_json_str(&text)?;
    let args: Value = serde_json::from_str(&raw_args).context("APISHAPE_ARGS is not valid JSON")?;

    let executor = ReqwestExecutor::new(cfg.http.timeout(), &cfg.http.user_agent)?;
    let mut client = ApiClient::new(Arc::new(executor)).with_auth(Arc::new(ConfiguredAuth));
    if cfg.cache.enabled {
        common::env::ensure_cache_dir(&cfg.cache.dir).await?;
        let cache = CacheStorage::open(&cfg.cache.dir, &cfg.cache.namespace).await?;
        client = client.with_cache(Arc::new(cache));
    }

    let opts = InvokeOptions { strict: cfg.validation.strict, no_cache: env_flag("APISHAPE_NO_CACHE") };

    // 数组参数按批量调用处理
    if let Value::Array(items) = args {
        let inputs = items.into_iter().map(into_object).collect::<anyhow::Result<Vec<_>>>()?;
        let report = client
            .invoke_batch(&svc, &operation, inputs, opts, env_flag("APISHAPE_FAIL_FAST"))
            .await;
        return Ok(serde_json::to_value(report)?);
    }

    match client.invoke(&svc, &operation, into_object(args)?, opts).await {
        Ok(outcome) => Ok(serde_json::to_value(outcome)?),
        Err(e) => {
            if let Some(help) = e.help() {
                eprintln!("{}", help);
            }
            Err(e.into())
        }
    }
}

fn main() -> std::process::ExitCode {
    dotenv().ok();

    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "invoke", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    init_logging(cfg.logging.format);

    let run_id = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "invoke", event = "panic", %run_id, message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "invoke", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cfg)) {
        Ok(out) => {
            match serde_json::to_string_pretty(&out) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    error!(service = "invoke", event = "encode_failed", error = %e, "failed to encode result");
                    return std::process::ExitCode::FAILURE;
                }
            }
            info!(service = "invoke", event = "done", %run_id, "invocation finished");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "invoke", event = "invoke_failed", %run_id, error = %e, "invocation failed");
            std::process::ExitCode::FAILURE
        }
    }
}
