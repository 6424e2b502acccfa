//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Commerce platform API base URL
    pub commerce_base_url: String,
    /// Commerce platform access token
    pub commerce_access_token: String,
    /// Commerce webhook signing secret
    pub commerce_webhook_secret: String,
    /// Shared token for the scheduling webhook (unchecked when unset —
    /// the scheduling platform does not sign deliveries)
    pub scheduling_webhook_token: Option<String>,
    /// Bearer token for administrative endpoints
    pub admin_token: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in
    /// non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            commerce_base_url: std::env::var("COMMERCE_BASE_URL")
                .unwrap_or_else(|_| "https://commerce.example.com/api".into()),
            commerce_access_token: Self::require_secret("COMMERCE_ACCESS_TOKEN", &environment)?,
            commerce_webhook_secret: Self::require_secret("COMMERCE_WEBHOOK_SECRET", &environment)?,
            scheduling_webhook_token: std::env::var("SCHEDULING_WEBHOOK_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            admin_token: Self::require_secret("ADMIN_TOKEN", &environment)?,
            environment,
        })
    }
}
