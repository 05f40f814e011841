use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_user_id: Uuid,
    pub recipient_user_id: Uuid,
    pub message_text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A conversation together with both participants' identities.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub subject: String,
    pub student_id: Uuid,
    pub student_user_id: Uuid,
    pub student_name: String,
    pub employer_id: Uuid,
    pub employer_user_id: Uuid,
    pub company_name: String,
    pub updated_at: DateTime<Utc>,
}

pub const CONVERSATION_SELECT: &str = r#"
    SELECT c.id, c.subject,
           sp.id AS student_id, sp.user_id AS student_user_id, sp.full_name AS student_name,
           ep.id AS employer_id, ep.user_id AS employer_user_id, ep.company_name,
           c.updated_at
    FROM conversations c
    JOIN student_profiles sp ON sp.id = c.student_id
    JOIN employer_profiles ep ON ep.id = c.employer_id
"#;

/// Conversation plus the aggregates needed for the inbox listing.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationActivityRecord {
    #[sqlx(flatten)]
    pub conversation: ConversationRecord,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub message_count: i64,
}

/// A message the caller sent, as listed in their outbox.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SentMessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub subject: String,
    pub message_text: String,
    pub recipient_user_id: Uuid,
    pub recipient_name: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    /// Profile id (student or employer profile).
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub subject: String,
    pub message_text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sender: Participant,
    pub recipient: Participant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub subject: String,
    pub other_participant: Participant,
    pub last_message: Option<String>,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: i64,
    pub message_count: i64,
}
