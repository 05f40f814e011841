use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{Json, Query};
use crate::events::queries::fetch_events_by_ids;
use crate::models::event::EventView;
use crate::models::profile::EmployerProfileRow;
use crate::profiles::queries::fetch_employers_by_ids;
use crate::state::AppState;

const AUTOCOMPLETE_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Events,
    Companies,
    All,
}

impl SearchScope {
    pub fn parse(raw: Option<&str>, default: SearchScope) -> Result<Self, AppError> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") => Ok(default),
            Some("events") => Ok(SearchScope::Events),
            Some("companies") => Ok(SearchScope::Companies),
            Some("all") => Ok(SearchScope::All),
            Some(other) => Err(AppError::Validation(format!(
                "Unknown search type '{other}'; expected events, companies or all"
            ))),
        }
    }

    /// Scope for autocomplete, which suggests one kind at a time. Defaults to events.
    pub fn parse_single(raw: Option<&str>) -> Result<Self, AppError> {
        match Self::parse(raw, SearchScope::Events)? {
            SearchScope::All => Err(AppError::Validation(
                "Autocomplete type must be events or companies".to_string(),
            )),
            scope => Ok(scope),
        }
    }

    fn includes_events(self) -> bool {
        matches!(self, SearchScope::Events | SearchScope::All)
    }

    fn includes_companies(self) -> bool {
        matches!(self, SearchScope::Companies | SearchScope::All)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub events: Vec<EventView>,
    pub companies: Vec<EmployerProfileRow>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Suggestion {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// GET /api/search?q=&type=
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::Validation("Search query required".to_string()));
    }
    let scope = SearchScope::parse(params.scope.as_deref(), SearchScope::All)?;

    let mut results = SearchResults {
        events: Vec::new(),
        companies: Vec::new(),
    };

    if scope.includes_events() {
        let ids = state.search.event_ids(query).await;
        debug!("Search '{query}': {} event ids", ids.len());
        if !ids.is_empty() {
            results.events = fetch_events_by_ids(&state.db, &ids)
                .await?
                .into_iter()
                .map(|e| e.into_view(true))
                .collect();
        }
    }

    if scope.includes_companies() {
        let ids = state.search.company_ids(query).await;
        debug!("Search '{query}': {} company ids", ids.len());
        if !ids.is_empty() {
            results.companies = fetch_employers_by_ids(&state.db, &ids).await?;
        }
    }

    Ok(Json(results))
}

/// GET /api/search/autocomplete?q=&type=
pub async fn handle_autocomplete(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Suggestion>>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Ok(Json(Vec::new()));
    }
    let scope = SearchScope::parse_single(params.scope.as_deref())?;

    let suggestions = match scope {
        // parse_single never yields All
        SearchScope::Events | SearchScope::All => {
            let ids = state.search.event_ids(query).await;
            if ids.is_empty() {
                Vec::new()
            } else {
                fetch_events_by_ids(&state.db, &ids)
                    .await?
                    .into_iter()
                    .take(AUTOCOMPLETE_LIMIT)
                    .map(|e| Suggestion {
                        id: e.id,
                        title: Some(e.title),
                        name: None,
                        kind: "event",
                    })
                    .collect()
            }
        }
        SearchScope::Companies => {
            let ids = state.search.company_ids(query).await;
            if ids.is_empty() {
                Vec::new()
            } else {
                fetch_employers_by_ids(&state.db, &ids)
                    .await?
                    .into_iter()
                    .take(AUTOCOMPLETE_LIMIT)
                    .map(|c| Suggestion {
                        id: c.id,
                        title: None,
                        name: Some(c.company_name),
                        kind: "company",
                    })
                    .collect()
            }
        }
    };

    Ok(Json(suggestions))
}
