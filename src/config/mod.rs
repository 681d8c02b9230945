use anyhow::Context;
use std::env;
use std::path::PathBuf;

use crate::prediction::FailurePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Trained model artifacts, one JSON file per stage
    pub models_dir: PathBuf,

    // Batch handling
    pub failure_policy: FailurePolicy,
    pub max_batch_size: usize,

    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            models_dir: PathBuf::from("models"),
            failure_policy: FailurePolicy::Isolate,
            max_batch_size: 10_000,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let failure_policy_raw = env::var("FAILURE_POLICY").unwrap_or_else(|_| "isolate".into());
        let failure_policy = FailurePolicy::from_str(&failure_policy_raw).ok_or_else(|| {
            anyhow::anyhow!("FAILURE_POLICY must be `isolate` or `abort`, got `{failure_policy_raw}`")
        })?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a valid port number")?,
            models_dir: env::var("MODELS_DIR")
                .unwrap_or_else(|_| "models".into())
                .into(),
            failure_policy,
            max_batch_size: env::var("MAX_BATCH_SIZE")
                .unwrap_or_else(|_| "10000".into())
                .parse()
                .context("MAX_BATCH_SIZE must be a positive integer")?,
            log_format: LogFormat::from_str(
                &env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            ),
        })
    }
}
