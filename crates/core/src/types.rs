/// Database primary key (PostgreSQL BIGSERIAL).
pub type DbId = i64;

/// UTC wall-clock instant; every stored timestamp uses this.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
