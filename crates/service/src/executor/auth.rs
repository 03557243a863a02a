use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use models::{AuthConfig, ServiceConfig};

use super::HttpRequest;

/// Attaches credentials to a request before it is sent.
pub trait Authenticator: Send + Sync {
    fn apply(&self, request: &mut HttpRequest, service: &ServiceConfig);
}

/// Leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    fn apply(&self, _request: &mut HttpRequest, _service: &ServiceConfig) {}
}

/// Builds headers from the service's `authentication` block. Secrets are
/// expected to be resolved already.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredAuth;

impl Authenticator for ConfiguredAuth {
    fn apply(&self, request: &mut HttpRequest, service: &ServiceConfig) {
        let Some(auth) = &service.authentication else { return };
        let (name, value) = match auth {
            AuthConfig::Bearer { token } => ("Authorization".to_string(), format!("Bearer {token}")),
            AuthConfig::ApiKey { header, value } => (header.clone(), value.clone()),
            AuthConfig::Basic { username, password } => (
                "Authorization".to_string(),
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))),
            ),
        };
        request.headers.insert(name, value);
    }
}
