use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{Json, Path};
use crate::messages::conversation::{
    default_subject, other_participant, require_participant, summarize, thread_view,
    validate_text,
};
use crate::models::message::{
    ConversationActivityRecord, ConversationRecord, ConversationSummary, MessageRow,
    MessageView, SentMessageRow, CONVERSATION_SELECT,
};
use crate::models::user::UserType;
use crate::profiles::queries::{current_employer, current_student, fetch_employer, fetch_student};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Employer profile id when a student writes, student profile id when an employer writes.
    pub recipient_id: Option<Uuid>,
    pub subject: Option<String>,
    pub message_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub message_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageSent {
    pub message: String,
    pub data: MessageView,
}

async fn fetch_conversation(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ConversationRecord>, sqlx::Error> {
    let sql = format!("{CONVERSATION_SELECT} WHERE c.id = $1");
    sqlx::query_as(&sql).bind(id).fetch_optional(pool).await
}

async fn participant_conversation(
    pool: &PgPool,
    user: &AuthUser,
    id: Uuid,
) -> Result<ConversationRecord, AppError> {
    let conv = fetch_conversation(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;
    require_participant(&conv, user.user_id)?;
    Ok(conv)
}

/// Inserts a message and bumps the conversation's activity time.
async fn append_message(
    pool: &PgPool,
    conv: &ConversationRecord,
    sender_user_id: Uuid,
    text: &str,
) -> Result<MessageView, AppError> {
    let recipient = other_participant(conv, sender_user_id);

    let mut tx = pool.begin().await?;
    let row: MessageRow = sqlx::query_as(
        r#"
        INSERT INTO messages (id, conversation_id, sender_user_id, recipient_user_id, message_text)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conv.id)
    .bind(sender_user_id)
    .bind(recipient.user_id)
    .bind(text)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query("UPDATE conversations SET updated_at = now() WHERE id = $1")
        .bind(conv.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(
        "Message {} sent in conversation {} by {sender_user_id}",
        row.id, conv.id
    );
    thread_view(conv, vec![row])
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("message view was empty")))
}

/// POST /api/messages
/// Starts (or continues) the caller's conversation with the recipient.
pub async fn handle_send(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageSent>), AppError> {
    let text = validate_text(req.message_text.as_deref())?;
    let recipient_id = req
        .recipient_id
        .ok_or_else(|| AppError::Validation("Recipient is required".to_string()))?;
    let recipient_missing = || AppError::NotFound("Recipient not found".to_string());

    let (student_id, employer_id) = match user.user_type {
        UserType::Student => {
            let student = current_student(&state.db, &user, "Unauthorized").await?;
            let employer = fetch_employer(&state.db, recipient_id)
                .await?
                .ok_or_else(recipient_missing)?;
            (student.id, employer.id)
        }
        UserType::Employer => {
            let employer = current_employer(&state.db, &user, "Unauthorized").await?;
            let student = fetch_student(&state.db, recipient_id)
                .await?
                .ok_or_else(recipient_missing)?;
            (student.id, employer.id)
        }
    };

    let subject = req
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_subject(user.user_type));

    // One conversation per student/employer pair; the first subject sticks.
    let conversation_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO conversations (id, student_id, employer_id, subject)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_id, employer_id) DO UPDATE SET updated_at = now()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(employer_id)
    .bind(subject)
    .fetch_one(&state.db)
    .await?;

    let conv = participant_conversation(&state.db, &user, conversation_id).await?;
    let data = append_message(&state.db, &conv, user.user_id, &text).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageSent {
            message: "Message sent successfully".to_string(),
            data,
        }),
    ))
}

/// GET /api/messages
/// Messages the caller has sent, newest first.
pub async fn handle_sent(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SentMessageRow>>, AppError> {
    let rows: Vec<SentMessageRow> = sqlx::query_as(
        r#"
        SELECT m.id, m.conversation_id, c.subject, m.message_text, m.recipient_user_id,
               COALESCE(NULLIF(sp.full_name, ''), ep.company_name, 'Unknown') AS recipient_name,
               m.is_read, m.created_at
        FROM messages m
        JOIN conversations c ON c.id = m.conversation_id
        LEFT JOIN student_profiles sp ON sp.user_id = m.recipient_user_id
        LEFT JOIN employer_profiles ep ON ep.user_id = m.recipient_user_id
        WHERE m.sender_user_id = $1
        ORDER BY m.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/messages/conversations
pub async fn handle_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ConversationSummary>>, AppError> {
    let sql = format!(
        r#"
        SELECT conv.*,
               latest.message_text AS last_message,
               latest.created_at AS last_message_time,
               counts.unread_count,
               counts.message_count
        FROM ({CONVERSATION_SELECT}) conv
        LEFT JOIN LATERAL (
            SELECT m.message_text, m.created_at
            FROM messages m
            WHERE m.conversation_id = conv.id
            ORDER BY m.created_at DESC
            LIMIT 1
        ) latest ON true
        CROSS JOIN LATERAL (
            SELECT COUNT(*) AS message_count,
                   COUNT(*) FILTER (WHERE m.recipient_user_id = $1 AND NOT m.is_read) AS unread_count
            FROM messages m
            WHERE m.conversation_id = conv.id
        ) counts
        WHERE conv.student_user_id = $1 OR conv.employer_user_id = $1
        ORDER BY COALESCE(latest.created_at, conv.updated_at) DESC
        "#
    );
    let records: Vec<ConversationActivityRecord> = sqlx::query_as(&sql)
        .bind(user.user_id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(
        records
            .into_iter()
            .map(|r| summarize(r, user.user_id))
            .collect(),
    ))
}

/// Marks the viewer's incoming messages read, then loads the thread oldest
/// first so the returned flags reflect the update.
async fn read_thread(
    pool: &PgPool,
    conv: &ConversationRecord,
    viewer: Uuid,
) -> Result<Vec<MessageView>, AppError> {
    let mut tx = pool.begin().await?;
    let marked = sqlx::query(
        r#"
        UPDATE messages SET is_read = true
        WHERE conversation_id = $1 AND recipient_user_id = $2 AND NOT is_read
        "#,
    )
    .bind(conv.id)
    .bind(viewer)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let rows: Vec<MessageRow> = sqlx::query_as(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC, id",
    )
    .bind(conv.id)
    .fetch_all(&mut *tx)
    .await?;
    tx.commit().await?;

    if marked > 0 {
        info!("Marked {marked} messages read in conversation {}", conv.id);
    }
    Ok(thread_view(conv, rows))
}

/// GET /api/messages/conversation/:id
pub async fn handle_thread(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    let conv = participant_conversation(&state.db, &user, id).await?;
    Ok(Json(read_thread(&state.db, &conv, user.user_id).await?))
}

/// POST /api/messages/conversation/:id/reply
pub async fn handle_reply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<MessageSent>), AppError> {
    let text = validate_text(req.message_text.as_deref())?;
    let conv = participant_conversation(&state.db, &user, id).await?;
    let data = append_message(&state.db, &conv, user.user_id, &text).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageSent {
            message: "Reply sent successfully".to_string(),
            data,
        }),
    ))
}

/// GET /api/messages/unread-count
pub async fn handle_unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let unread: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM messages WHERE recipient_user_id = $1 AND NOT is_read",
    )
    .bind(user.user_id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(json!({ "unread": unread })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn send_request(recipient_id: Uuid, subject: &str, text: &str) -> SendMessageRequest {
        SendMessageRequest {
            recipient_id: Some(recipient_id),
            subject: Some(subject.to_string()),
            message_text: Some(text.to_string()),
        }
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_pair_reuses_conversation_and_keeps_first_subject(pool: PgPool) {
        let state = testing::state_with(pool.clone());
        let (ada, _) = testing::student(&pool, "Ada", &[], &[]).await;
        let (hr, acme) = testing::employer(&pool, "Acme").await;

        let (status, Json(first)) = handle_send(
            State(state.clone()),
            ada.clone(),
            Json(send_request(acme.id, "Internship question", "Hello")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first.data.sender.name, "Ada");
        assert_eq!(first.data.recipient.name, "Acme");

        let (_, Json(second)) = handle_send(
            State(state.clone()),
            ada.clone(),
            Json(send_request(acme.id, "Something else", "Are you hiring?")),
        )
        .await
        .unwrap();
        assert_eq!(second.data.conversation_id, first.data.conversation_id);
        assert_eq!(second.data.subject, "Internship question");

        let Json(inbox) = handle_conversations(State(state.clone()), hr.clone())
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message_count, 2);
        assert_eq!(inbox[0].unread_count, 2);
        assert_eq!(inbox[0].last_message.as_deref(), Some("Are you hiring?"));
        assert_eq!(inbox[0].other_participant.name, "Ada");

        let Json(outbox) = handle_conversations(State(state), ada).await.unwrap();
        assert_eq!(outbox[0].unread_count, 0);
        assert_eq!(outbox[0].other_participant.name, "Acme");
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_opening_thread_returns_messages_as_read(pool: PgPool) {
        let state = testing::state_with(pool.clone());
        let (ada, _) = testing::student(&pool, "Ada", &[], &[]).await;
        let (hr, acme) = testing::employer(&pool, "Acme").await;

        let (_, Json(sent)) = handle_send(
            State(state.clone()),
            ada.clone(),
            Json(send_request(acme.id, "", "Hello")),
        )
        .await
        .unwrap();
        assert_eq!(sent.data.subject, "Message from Student");
        let conversation_id = sent.data.conversation_id;

        let Json(unread) = handle_unread_count(State(state.clone()), hr.clone())
            .await
            .unwrap();
        assert_eq!(unread["unread"], 1);

        let Json(thread) = handle_thread(State(state.clone()), hr.clone(), Path(conversation_id))
            .await
            .unwrap();
        assert_eq!(thread.len(), 1);
        assert!(thread[0].is_read);

        let Json(unread) = handle_unread_count(State(state.clone()), hr.clone())
            .await
            .unwrap();
        assert_eq!(unread["unread"], 0);

        handle_reply(
            State(state.clone()),
            hr,
            Path(conversation_id),
            Json(ReplyRequest {
                message_text: Some("Hi Ada".to_string()),
            }),
        )
        .await
        .unwrap();
        let Json(unread) = handle_unread_count(State(state.clone()), ada.clone())
            .await
            .unwrap();
        assert_eq!(unread["unread"], 1);

        let Json(thread) = handle_thread(State(state), ada, Path(conversation_id))
            .await
            .unwrap();
        let texts: Vec<&str> = thread.iter().map(|m| m.message_text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "Hi Ada"]);
        assert!(thread.iter().all(|m| m.is_read));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_thread_access_outsider_and_unknown(pool: PgPool) {
        let state = testing::state_with(pool.clone());
        let (ada, _) = testing::student(&pool, "Ada", &[], &[]).await;
        let (grace, _) = testing::student(&pool, "Grace", &[], &[]).await;
        let (_, acme) = testing::employer(&pool, "Acme").await;

        let (_, Json(sent)) = handle_send(
            State(state.clone()),
            ada,
            Json(send_request(acme.id, "Hi", "Hello")),
        )
        .await
        .unwrap();

        let err = handle_thread(State(state.clone()), grace.clone(), Path(sent.data.conversation_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = handle_thread(State(state), grace, Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres server at DATABASE_URL"]
    async fn test_send_to_unknown_recipient(pool: PgPool) {
        let state = testing::state_with(pool.clone());
        let (ada, _) = testing::student(&pool, "Ada", &[], &[]).await;

        let err = handle_send(
            State(state),
            ada,
            Json(send_request(Uuid::new_v4(), "Hi", "Hello")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Recipient not found"));
    }
}
