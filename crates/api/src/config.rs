use tagvault_gitlab::GitLabConfig;
use tagvault_intake::HookSettings;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Shared secret GitLab echoes in `X-Gitlab-Token`.
    pub webhook_secret: String,
    /// Public URL of the webhook receiver, installed into GitLab hooks.
    pub receiver_url: String,
    /// Whether GitLab should verify our TLS certificate.
    pub verify_ssl: bool,
    /// GitLab instance configuration.
    pub gitlab: GitLabConfig,
    /// Service-account token for hook management calls.
    pub gitlab_token: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default              |
    /// |----------------------|----------------------|
    /// | `HOST`               | `0.0.0.0`            |
    /// | `PORT`               | `3000`               |
    /// | `WEBHOOK_SECRET`     | (required)           |
    /// | `RECEIVER_URL`       | (required)           |
    /// | `VERIFY_SSL`         | `true`               |
    /// | `GITLAB_BASE_URL`    | `https://gitlab.com` |
    /// | `GITLAB_TOKEN`       | (required)           |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let webhook_secret =
            std::env::var("WEBHOOK_SECRET").expect("WEBHOOK_SECRET must be set");
        let receiver_url = std::env::var("RECEIVER_URL").expect("RECEIVER_URL must be set");

        let verify_ssl: bool = std::env::var("VERIFY_SSL")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("VERIFY_SSL must be true or false");

        let gitlab = GitLabConfig {
            base_url: std::env::var("GITLAB_BASE_URL")
                .unwrap_or_else(|_| GitLabConfig::default().base_url),
        };
        let gitlab_token = std::env::var("GITLAB_TOKEN").expect("GITLAB_TOKEN must be set");

        Self {
            host,
            port,
            webhook_secret,
            receiver_url,
            verify_ssl,
            gitlab,
            gitlab_token,
        }
    }

    /// Hook attributes derived from this configuration.
    pub fn hook_settings(&self) -> HookSettings {
        HookSettings {
            receiver_url: self.receiver_url.clone(),
            secret: self.webhook_secret.clone(),
            verify_ssl: self.verify_ssl,
        }
    }
}
