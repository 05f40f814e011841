use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{Json, Path, Query};
use crate::events::dates::{check_time_range, parse_event_date, parse_time};
use crate::events::queries::{fetch_event, fetch_events, fetch_upcoming_events, EventFilter};
use crate::events::ranking::{rank_events, Interests};
use crate::models::event::{EventRecord, EventView};
use crate::models::profile::EmployerProfileRow;
use crate::profiles::queries::{current_employer, current_student};
use crate::state::AppState;
use crate::tags::normalize_tags;

#[derive(Debug, Default, Deserialize)]
pub struct EventListParams {
    pub event_type: Option<String>,
    pub employer_id: Option<Uuid>,
    pub upcoming: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct EventSaved {
    pub message: String,
    pub event: EventView,
}

/// Column values for an insert or a full-row update.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub tags: Vec<String>,
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl EventRequest {
    /// Builds fields for a new event. Title and date are required.
    pub fn into_new_fields(self) -> Result<EventFields, AppError> {
        let title = clean(self.title.as_deref());
        let (Some(title), Some(raw_date)) = (title, self.event_date.as_deref()) else {
            return Err(AppError::Validation("Missing required fields".to_string()));
        };
        let fields = EventFields {
            title,
            description: self.description.clone(),
            event_type: clean(self.event_type.as_deref()),
            location: clean(self.location.as_deref()),
            event_date: parse_event_date(raw_date)?,
            start_time: parse_time(self.start_time.as_deref())?,
            end_time: parse_time(self.end_time.as_deref())?,
            tags: normalize_tags(self.tags.unwrap_or_default()),
        };
        check_time_range(fields.start_time, fields.end_time)?;
        Ok(fields)
    }

    /// Overlays the fields present in the request onto an existing event.
    /// An explicitly blank time clears it.
    pub fn merge_into(self, existing: &EventRecord) -> Result<EventFields, AppError> {
        let title = match self.title.as_deref() {
            Some(raw) => clean(Some(raw))
                .ok_or_else(|| AppError::Validation("Title cannot be empty".to_string()))?,
            None => existing.title.clone(),
        };
        let event_date = match self.event_date.as_deref() {
            Some(raw) => parse_event_date(raw)?,
            None => existing.event_date,
        };
        let start_time = match self.start_time.as_deref() {
            Some(raw) => parse_time(Some(raw))?,
            None => existing.start_time,
        };
        let end_time = match self.end_time.as_deref() {
            Some(raw) => parse_time(Some(raw))?,
            None => existing.end_time,
        };
        check_time_range(start_time, end_time)?;

        Ok(EventFields {
            title,
            description: self.description.or_else(|| existing.description.clone()),
            event_type: match self.event_type {
                Some(raw) => clean(Some(&raw)),
                None => existing.event_type.clone(),
            },
            location: match self.location {
                Some(raw) => clean(Some(&raw)),
                None => existing.location.clone(),
            },
            event_date,
            start_time,
            end_time,
            tags: match self.tags {
                Some(tags) => normalize_tags(tags),
                None => existing.tags.clone(),
            },
        })
    }
}

/// Loads an event the caller is allowed to change.
async fn owned_event(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> Result<(EmployerProfileRow, EventRecord), AppError> {
    let employer = current_employer(&state.db, user, "Unauthorized").await?;
    let event = fetch_event(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    if event.employer_id != employer.id {
        return Err(AppError::Forbidden(
            "Not authorized to modify this event".to_string(),
        ));
    }
    Ok((employer, event))
}

async fn reload(state: &AppState, id: Uuid) -> Result<EventRecord, AppError> {
    fetch_event(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

/// GET /api/events?event_type=&employer_id=&upcoming=
pub async fn handle_list_events(
    State(state): State<AppState>,
    Query(params): Query<EventListParams>,
) -> Result<Json<Vec<EventView>>, AppError> {
    let filter = EventFilter {
        event_type: clean(params.event_type.as_deref()),
        employer_id: params.employer_id,
        starting_after: params.upcoming.unwrap_or(false).then(Utc::now),
    };
    let events = fetch_events(&state.db, &filter).await?;
    Ok(Json(events.into_iter().map(|e| e.into_view(true)).collect()))
}

/// POST /api/events
pub async fn handle_create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<EventRequest>,
) -> Result<(StatusCode, Json<EventSaved>), AppError> {
    let employer = current_employer(&state.db, &user, "Unauthorized").await?;
    let fields = req.into_new_fields()?;

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO events
            (id, employer_id, title, description, event_type, location,
             event_date, start_time, end_time, tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(id)
    .bind(employer.id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.event_type)
    .bind(&fields.location)
    .bind(fields.event_date)
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(&fields.tags)
    .execute(&state.db)
    .await?;

    info!("Employer {} created event {id} '{}'", employer.id, fields.title);
    state.search.refresh_events(&state.db).await;

    let event = reload(&state, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(EventSaved {
            message: "Event created successfully".to_string(),
            event: event.into_view(true),
        }),
    ))
}

/// GET /api/events/:id
pub async fn handle_get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventView>, AppError> {
    Ok(Json(reload(&state, id).await?.into_view(true)))
}

/// PUT /api/events/:id
pub async fn handle_update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<EventRequest>,
) -> Result<Json<EventSaved>, AppError> {
    let (_, existing) = owned_event(&state, &user, id).await?;
    let fields = req.merge_into(&existing)?;

    sqlx::query(
        r#"
        UPDATE events SET
            title = $2, description = $3, event_type = $4, location = $5,
            event_date = $6, start_time = $7, end_time = $8, tags = $9
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.event_type)
    .bind(&fields.location)
    .bind(fields.event_date)
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(&fields.tags)
    .execute(&state.db)
    .await?;

    info!("Event {id} updated");
    state.search.refresh_events(&state.db).await;

    let event = reload(&state, id).await?;
    Ok(Json(EventSaved {
        message: "Event updated successfully".to_string(),
        event: event.into_view(true),
    }))
}

/// DELETE /api/events/:id
/// RSVPs go with the event (ON DELETE CASCADE).
pub async fn handle_delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    owned_event(&state, &user, id).await?;

    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    info!("Event {id} deleted");
    state.search.refresh_events(&state.db).await;
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

/// GET /api/events/browse?limit=
/// Upcoming events ranked against the calling student's interests.
pub async fn handle_browse_events(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<BrowseParams>,
) -> Result<Json<Vec<EventView>>, AppError> {
    let student = current_student(&state.db, &user, "Only students can browse events").await?;
    let events = fetch_upcoming_events(&state.db, Utc::now()).await?;

    let interests = Interests::new(&student.skills, &student.job_preferences);
    if interests.is_empty() {
        debug!("Student {} has no skills or preferences; browsing by date", student.id);
    }
    let ranked = apply_limit(rank_events(events, &interests), params.limit);

    Ok(Json(ranked.into_iter().map(|e| e.into_view(true)).collect()))
}

/// Truncates to `limit`. A missing or zero limit returns everything.
fn apply_limit<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit.filter(|&n| n > 0) {
        items.truncate(limit);
    }
    items
}
