use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{Json, Path, Query};
use crate::events::queries::{event_exists, fetch_event};
use crate::models::event::{EventView, RsvpEventRecord, EVENT_SELECT};
use crate::models::profile::ApplicantRow;
use crate::profiles::queries::{current_employer, current_student};
use crate::rsvp::status::{parse_id_list, status_map};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RsvpRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub student_id: Uuid,
    pub rsvp_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RsvpCreated {
    pub message: String,
    pub rsvp: RsvpRow,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    #[serde(default)]
    pub ids: String,
}

/// POST /api/events/:id/rsvp
pub async fn handle_rsvp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<(StatusCode, Json<RsvpCreated>), AppError> {
    let student = current_student(&state.db, &user, "Only students can RSVP").await?;
    if !event_exists(&state.db, event_id).await? {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    // The unique (event_id, student_id) constraint settles concurrent duplicates.
    let rsvp: Option<RsvpRow> = sqlx::query_as(
        r#"
        INSERT INTO event_rsvps (id, event_id, student_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (event_id, student_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(student.id)
    .fetch_optional(&state.db)
    .await?;

    let rsvp = rsvp
        .ok_or_else(|| AppError::Validation("Already RSVP'd to this event".to_string()))?;

    info!("Student {} RSVP'd to event {event_id}", student.id);
    Ok((
        StatusCode::CREATED,
        Json(RsvpCreated {
            message: "RSVP successful".to_string(),
            rsvp,
        }),
    ))
}

/// DELETE /api/events/:id/rsvp
pub async fn handle_cancel_rsvp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let student = current_student(&state.db, &user, "Only students can RSVP").await?;
    if !event_exists(&state.db, event_id).await? {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    let result = sqlx::query("DELETE FROM event_rsvps WHERE event_id = $1 AND student_id = $2")
        .bind(event_id)
        .bind(student.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("RSVP not found".to_string()));
    }

    info!("Student {} cancelled RSVP to event {event_id}", student.id);
    Ok(Json(json!({ "message": "RSVP cancelled successfully" })))
}

/// GET /api/my-rsvps (also served at GET /api/events/rsvp)
pub async fn handle_my_rsvps(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<EventView>>, AppError> {
    let student = current_student(&state.db, &user, "Only students have RSVPs").await?;

    let sql = format!(
        r#"
        SELECT ev.*, r.rsvp_date
        FROM ({EVENT_SELECT}) ev
        JOIN event_rsvps r ON r.event_id = ev.id
        WHERE r.student_id = $1
        ORDER BY r.rsvp_date DESC
        "#
    );
    let rows: Vec<RsvpEventRecord> = sqlx::query_as(&sql)
        .bind(student.id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(RsvpEventRecord::into_view).collect()))
}

/// GET /api/events/rsvp-status?ids=a,b,c
pub async fn handle_rsvp_status(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<StatusParams>,
) -> Result<Json<BTreeMap<Uuid, bool>>, AppError> {
    let ids = parse_id_list(&params.ids)?;
    let student = current_student(&state.db, &user, "Only students have RSVPs").await?;
    if ids.is_empty() {
        return Ok(Json(BTreeMap::new()));
    }

    let rsvped: Vec<Uuid> = sqlx::query_scalar(
        "SELECT event_id FROM event_rsvps WHERE student_id = $1 AND event_id = ANY($2)",
    )
    .bind(student.id)
    .bind(&ids)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(status_map(&ids, &rsvped)))
}

/// GET /api/events/:id/applicants
pub async fn handle_applicants(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    let employer =
        current_employer(&state.db, &user, "Only employers can view applicants").await?;
    let event = fetch_event(&state.db, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    if event.employer_id != employer.id {
        return Err(AppError::Forbidden(
            "Not authorized to view applicants".to_string(),
        ));
    }

    let applicants: Vec<ApplicantRow> = sqlx::query_as(
        r#"
        SELECT sp.*, r.rsvp_date
        FROM event_rsvps r
        JOIN student_profiles sp ON sp.id = r.student_id
        WHERE r.event_id = $1
        ORDER BY r.rsvp_date ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applicants))
}
