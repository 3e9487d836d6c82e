use tagvault_gitlab::GitLabConfig;

use crate::publisher::PublisherConfig;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// GitLab instance to fetch archives from.
    pub gitlab: GitLabConfig,
    /// Service-account token for GitLab API calls.
    pub gitlab_token: String,
    /// Archival repository deposit API.
    pub publisher: PublisherConfig,
    /// Seconds between polls for newly received releases (default: `30`).
    pub poll_interval_secs: u64,
    /// Maximum releases picked up per poll (default: `10`).
    pub poll_batch_size: i64,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default              |
    /// |----------------------|----------------------|
    /// | `GITLAB_BASE_URL`    | `https://gitlab.com` |
    /// | `GITLAB_TOKEN`       | (required)           |
    /// | `REPOSITORY_URL`     | (required)           |
    /// | `REPOSITORY_TOKEN`   | (required)           |
    /// | `POLL_INTERVAL_SECS` | `30`                 |
    /// | `POLL_BATCH_SIZE`    | `10`                 |
    pub fn from_env() -> Self {
        let gitlab = GitLabConfig {
            base_url: std::env::var("GITLAB_BASE_URL")
                .unwrap_or_else(|_| GitLabConfig::default().base_url),
        };
        let gitlab_token = std::env::var("GITLAB_TOKEN").expect("GITLAB_TOKEN must be set");

        let publisher = PublisherConfig {
            base_url: std::env::var("REPOSITORY_URL").expect("REPOSITORY_URL must be set"),
            token: std::env::var("REPOSITORY_TOKEN").expect("REPOSITORY_TOKEN must be set"),
        };

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let poll_batch_size: i64 = std::env::var("POLL_BATCH_SIZE")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("POLL_BATCH_SIZE must be a valid i64");

        Self {
            gitlab,
            gitlab_token,
            publisher,
            poll_interval_secs,
            poll_batch_size,
        }
    }
}
