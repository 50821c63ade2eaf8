//! Server configuration

/// Configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// Workflow engine endpoint notified on submission creation; submissions
    /// created while unset stay pending until the engine is configured.
    pub generation_webhook_url: Option<String>,
    /// Shared secret the generation engine must present on completion
    /// callbacks. Unset means the caller is trusted (development mode).
    pub completion_webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            generation_webhook_url: std::env::var("GENERATION_WEBHOOK_URL").ok(),
            completion_webhook_secret: std::env::var("COMPLETION_WEBHOOK_SECRET").ok(),
        })
    }
}
