/// Primary key type shared by every tagvault table (PostgreSQL BIGSERIAL).
pub type DbId = i64;

/// Timestamps are always UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
