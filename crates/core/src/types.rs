/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A calendar date without a time zone (report boundaries are UTC days).
pub type Date = chrono::NaiveDate;
