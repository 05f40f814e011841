use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Column list shared by every query that loads events for display.
/// Joins the hosting employer and counts RSVPs in one round trip.
pub const EVENT_SELECT: &str = r#"
    SELECT e.id, e.employer_id, e.title, e.description, e.event_type, e.location,
           e.event_date, e.start_time, e.end_time, e.tags, e.created_at,
           ep.company_name, ep.logo_url AS employer_logo_url, ep.industry AS employer_industry,
           (SELECT COUNT(*) FROM event_rsvps r WHERE r.event_id = e.id) AS rsvp_count
    FROM events e
    JOIN employer_profiles ep ON ep.id = e.employer_id
"#;

#[derive(Debug, Clone, FromRow)]
pub struct EventRecord {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub company_name: String,
    pub employer_logo_url: Option<String>,
    pub employer_industry: Option<String>,
    pub rsvp_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RsvpEventRecord {
    #[sqlx(flatten)]
    pub event: EventRecord,
    pub rsvp_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployerSummary {
    pub id: Uuid,
    pub company_name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub tags: Vec<String>,
    pub rsvp_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<EmployerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsvp_date: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// Converts to the wire shape. Employer pages list their own events
    /// without the nested employer summary.
    pub fn into_view(self, include_employer: bool) -> EventView {
        let employer = include_employer.then(|| EmployerSummary {
            id: self.employer_id,
            company_name: self.company_name.clone(),
            logo_url: self.employer_logo_url.clone(),
        });
        EventView {
            id: self.id,
            employer_id: self.employer_id,
            title: self.title,
            description: self.description,
            event_type: self.event_type,
            location: self.location,
            event_date: self.event_date,
            start_time: self.start_time,
            end_time: self.end_time,
            tags: self.tags,
            rsvp_count: self.rsvp_count,
            created_at: self.created_at,
            employer,
            rsvp_date: None,
        }
    }
}

impl RsvpEventRecord {
    pub fn into_view(self) -> EventView {
        let mut view = self.event.into_view(true);
        view.rsvp_date = Some(self.rsvp_date);
        view
    }
}

/// Test fixture shared by the ranking and search tests.
#[cfg(test)]
pub fn sample_event(title: &str, tags: &[&str], company: &str, days_ahead: i64) -> EventRecord {
    EventRecord {
        id: Uuid::new_v4(),
        employer_id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        event_type: Some("In-Person".to_string()),
        location: Some("Chicago, IL".to_string()),
        event_date: Utc::now() + chrono::Duration::days(days_ahead),
        start_time: None,
        end_time: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: Utc::now(),
        company_name: company.to_string(),
        employer_logo_url: None,
        employer_industry: None,
        rsvp_count: 0,
    }
}
