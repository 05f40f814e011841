use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::event::{EventRecord, EVENT_SELECT};

/// Optional narrowing for the public event listing.
#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub employer_id: Option<Uuid>,
    pub starting_after: Option<DateTime<Utc>>,
}

pub async fn fetch_events(
    pool: &PgPool,
    filter: &EventFilter,
) -> Result<Vec<EventRecord>, sqlx::Error> {
    let sql = format!(
        r#"{EVENT_SELECT}
        WHERE ($1::text IS NULL OR lower(e.event_type) = lower($1))
          AND ($2::uuid IS NULL OR e.employer_id = $2)
          AND ($3::timestamptz IS NULL OR e.event_date >= $3)
        ORDER BY e.event_date DESC"#
    );
    sqlx::query_as(&sql)
        .bind(filter.event_type.as_deref())
        .bind(filter.employer_id)
        .bind(filter.starting_after)
        .fetch_all(pool)
        .await
}

pub async fn fetch_event(pool: &PgPool, id: Uuid) -> Result<Option<EventRecord>, sqlx::Error> {
    let sql = format!("{EVENT_SELECT} WHERE e.id = $1");
    sqlx::query_as(&sql).bind(id).fetch_optional(pool).await
}

/// Events for the given ids, soonest first. Unknown ids are skipped.
pub async fn fetch_events_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<EventRecord>, sqlx::Error> {
    let sql = format!("{EVENT_SELECT} WHERE e.id = ANY($1) ORDER BY e.event_date ASC, e.id");
    sqlx::query_as(&sql).bind(ids).fetch_all(pool).await
}

pub async fn fetch_events_for_employer(
    pool: &PgPool,
    employer_id: Uuid,
) -> Result<Vec<EventRecord>, sqlx::Error> {
    fetch_events(
        pool,
        &EventFilter {
            employer_id: Some(employer_id),
            ..Default::default()
        },
    )
    .await
}

pub async fn fetch_upcoming_events(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<EventRecord>, sqlx::Error> {
    let sql = format!("{EVENT_SELECT} WHERE e.event_date >= $1 ORDER BY e.event_date ASC");
    sqlx::query_as(&sql).bind(now).fetch_all(pool).await
}

pub async fn event_exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}
