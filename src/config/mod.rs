use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub gateway: GatewayConfig,
    pub upload: UploadConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub enable_request_logging: bool,
}

/// Default attachment policy applied to entities that validate uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the durable session file; `None` falls back to
    /// `$HOME/.config/admin-console`
    pub config_dir: Option<PathBuf>,
    pub storage_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("CONSOLE_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Gateway overrides
        if let Ok(v) = env::var("CONSOLE_API_BASE_URL") {
            self.gateway.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("CONSOLE_HTTP_TIMEOUT_SECS") {
            self.gateway.timeout_secs = v.parse().unwrap_or(self.gateway.timeout_secs);
        }
        if let Ok(v) = env::var("CONSOLE_REQUEST_LOGGING") {
            self.gateway.enable_request_logging =
                v.parse().unwrap_or(self.gateway.enable_request_logging);
        }

        // Upload overrides
        if let Ok(v) = env::var("CONSOLE_UPLOAD_MAX_BYTES") {
            self.upload.max_bytes = v.parse().unwrap_or(self.upload.max_bytes);
        }
        if let Ok(v) = env::var("CONSOLE_UPLOAD_ALLOWED_TYPES") {
            self.upload.allowed_types = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Session overrides
        if let Ok(v) = env::var("CONSOLE_CONFIG_DIR") {
            self.session.config_dir = Some(PathBuf::from(v));
        }

        self
    }

    fn image_upload() -> UploadConfig {
        UploadConfig {
            max_bytes: 2 * 1024 * 1024, // 2MB
            allowed_types: ["image/png", "image/jpeg", "image/jpg", "image/gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    fn session_defaults() -> SessionConfig {
        SessionConfig {
            config_dir: None,
            storage_key: "currentUser".to_string(),
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            gateway: GatewayConfig {
                base_url: "http://localhost/api".to_string(),
                timeout_secs: 30,
                enable_request_logging: true,
            },
            upload: Self::image_upload(),
            session: Self::session_defaults(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            gateway: GatewayConfig {
                base_url: "https://staging.azhalitsolutions.com/api".to_string(),
                timeout_secs: 15,
                enable_request_logging: true,
            },
            upload: Self::image_upload(),
            session: Self::session_defaults(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            gateway: GatewayConfig {
                base_url: "https://azhalitsolutions.com/api".to_string(),
                timeout_secs: 10,
                enable_request_logging: false,
            },
            upload: Self::image_upload(),
            session: Self::session_defaults(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!(
            $crate::config::CONFIG.environment,
            $crate::config::Environment::Development
        )
    };
}
