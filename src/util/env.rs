//! Environment-backed configuration.
//!
//! Variables are read once (optionally from a `.env` file via [`dotenvy`]) into an [`Env`] and
//! handed out through the [`var!`](crate::var) accessor. Keys are matched case-insensitively
//! against the snake_case field names, so `OPENAI_MODEL` fills `openai_model`.

use std::sync::LazyLock;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::OnceCell;

static ENV_VARS: LazyLock<OnceCell<Env>> = LazyLock::new(OnceCell::new);
pub async fn get_var(var: Var) -> EnvResult<&'static str> {
    let vars = ENV_VARS.get_or_try_init(|| async { Env::new() }).await?;
    Ok(match var {
        Var::DatabaseUrl => &vars.database_url,
        Var::OpenAiApiKey => &vars.openai_api_key,
        Var::OpenAiBaseUrl => &vars.openai_base_url,
        Var::OpenAiModel => &vars.openai_model,
        Var::ServerApiPort => &vars.server_api_port,
        Var::CorsAllowOrigins => &vars.cors_allow_origins,
        Var::OtelExporterEndpoint => &vars.otel_exporter_otlp_endpoint,
        Var::ApiServiceName => &vars.api_service_name,
        Var::ApiTracerName => &vars.api_tracer_name,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct Env {
    pub database_url: String,
    pub openai_api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_server_api_port")]
    pub server_api_port: String,
    #[serde(default = "default_cors_allow_origins")]
    pub cors_allow_origins: String,
    /// Empty disables OTLP export; only the console layer is installed.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: String,
    #[serde(default = "default_api_service_name")]
    pub api_service_name: String,
    #[serde(default = "default_api_tracer_name")]
    pub api_tracer_name: String,
}

impl Env {
    pub fn new() -> EnvResult<Self> {
        from_iter(dotenvy::vars())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Var {
    DatabaseUrl,
    OpenAiApiKey,
    OpenAiBaseUrl,
    OpenAiModel,
    ServerApiPort,
    CorsAllowOrigins,
    OtelExporterEndpoint,
    ApiServiceName,
    ApiTracerName,
}

#[macro_export]
macro_rules! var {
    ($ev:expr) => {
        $crate::util::env::get_var($ev)
    };
}

/// Builds a `T` from `(KEY, value)` pairs. Every value stays a string; callers parse numeric
/// settings at the point of use.
pub fn from_iter<Iter, T>(iter: Iter) -> EnvResult<T>
where
    T: serde::de::DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    let map: Map<String, Value> = iter
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), Value::String(v)))
        .collect();

    Ok(serde_json::from_value(Value::Object(map))?)
}

fn default_openai_base_url() -> String {
    String::from("https://api.openai.com/v1")
}

fn default_openai_model() -> String {
    String::from("gpt-4o-mini")
}

fn default_server_api_port() -> String {
    String::from("3000")
}

fn default_cors_allow_origins() -> String {
    String::from("*")
}

fn default_api_service_name() -> String {
    String::from("reviewhub-api")
}

fn default_api_tracer_name() -> String {
    String::from("reviewhub-tracer")
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error("env deserialization error: {0}")]
    DeserializationError(#[from] serde_json::Error),
}
