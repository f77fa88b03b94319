use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::upload::UploadTarget;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Timeout for non-upload requests (listing exams, marking references)
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UploadConfig {
    /// Upper bound for a single image upload; expiry fails that image only
    pub per_call_timeout_secs: u64,
    pub assessment_id: Option<i64>,
    pub student_id: Option<i64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            per_call_timeout_secs: 60,
            assessment_id: None,
            student_id: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub token: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "scan_batch.db".to_string(),
        }
    }
}

impl Config {
    /// Layered load: `config/default`, then `path`, then `SCAN_*` env vars
    /// (e.g. `SCAN_AUTH__TOKEN`).
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SCAN").separator("__"))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("api.base_url must be an http(s) URL, got '{}'", url);
        }
        if self.upload.per_call_timeout_secs == 0 {
            anyhow::bail!("upload.per_call_timeout_secs must be greater than zero");
        }
        if self.api.request_timeout_secs == 0 {
            anyhow::bail!("api.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_secs(self.upload.per_call_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Upload target from config, with command-line values taking precedence
    pub fn upload_target(&self, assessment_id: Option<i64>, student_id: Option<i64>) -> UploadTarget {
        UploadTarget {
            assessment_id: assessment_id.or(self.upload.assessment_id),
            student_id: student_id.or(self.upload.student_id),
        }
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
