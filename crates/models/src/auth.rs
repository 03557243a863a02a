use serde::{Deserialize, Serialize};

/// 认证配置：值应当已经完成环境变量替换
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AuthConfig {
    #[serde(rename = "bearer")]
    Bearer { token: String },
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(default = "default_api_key_header")]
        header: String,
        value: String,
    },
    #[serde(rename = "basic")]
    Basic { username: String, password: String },
}

fn default_api_key_header() -> String { "X-API-Key".to_string() }
