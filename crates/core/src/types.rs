/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier assigned by the real-time transport to one live session.
pub type ConnectionId = String;
