use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// A synthetic, recomputed-per-call notification. Nothing is persisted;
/// `is_read` is always false in the list view.
#[derive(Debug, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: OffsetDateTime,
    pub is_read: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}
