use std::sync::Arc;

use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::search::trie::Trie;

#[derive(Debug, Clone, FromRow)]
pub struct EventIndexRow {
    pub id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub company_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct CompanyIndexRow {
    pub id: Uuid,
    pub company_name: String,
    pub industry: Option<String>,
}

/// Events are found by any title word, any tag, or the host's full company name.
pub fn build_event_trie(rows: &[EventIndexRow]) -> Trie {
    let mut trie = Trie::new();
    for row in rows {
        for word in row.title.split_whitespace() {
            trie.insert(word, row.id);
        }
        for tag in &row.tags {
            trie.insert(tag, row.id);
        }
        trie.insert(&row.company_name, row.id);
    }
    trie
}

/// Companies are found by any word of their name or by their industry.
pub fn build_company_trie(rows: &[CompanyIndexRow]) -> Trie {
    let mut trie = Trie::new();
    for row in rows {
        for word in row.company_name.split_whitespace() {
            trie.insert(word, row.id);
        }
        if let Some(industry) = &row.industry {
            trie.insert(industry, row.id);
        }
    }
    trie
}

/// In-memory prefix indexes over events and companies, shared by all handlers.
/// Rebuilt wholesale from Postgres after any mutation that changes indexed text.
#[derive(Clone, Default)]
pub struct SearchIndex {
    events: Arc<RwLock<Trie>>,
    companies: Arc<RwLock<Trie>>,
}

impl SearchIndex {
    pub async fn rebuild_events(&self, pool: &PgPool) -> Result<(), AppError> {
        let rows: Vec<EventIndexRow> = sqlx::query_as(
            r#"
            SELECT e.id, e.title, e.tags, ep.company_name
            FROM events e
            JOIN employer_profiles ep ON ep.id = e.employer_id
            "#,
        )
        .fetch_all(pool)
        .await?;
        let trie = build_event_trie(&rows);
        info!("Event index rebuilt: {} events, {} keys", rows.len(), trie.key_count());
        *self.events.write().await = trie;
        Ok(())
    }

    pub async fn rebuild_companies(&self, pool: &PgPool) -> Result<(), AppError> {
        let rows: Vec<CompanyIndexRow> =
            sqlx::query_as("SELECT id, company_name, industry FROM employer_profiles")
                .fetch_all(pool)
                .await?;
        let trie = build_company_trie(&rows);
        info!("Company index rebuilt: {} companies, {} keys", rows.len(), trie.key_count());
        *self.companies.write().await = trie;
        Ok(())
    }

    pub async fn rebuild_all(&self, pool: &PgPool) -> Result<(), AppError> {
        self.rebuild_events(pool).await?;
        self.rebuild_companies(pool).await
    }

    /// Rebuilds the event index after a write. A failed rebuild leaves the
    /// previous index in place and does not fail the request.
    pub async fn refresh_events(&self, pool: &PgPool) {
        if let Err(e) = self.rebuild_events(pool).await {
            warn!("Event index refresh failed: {e}");
        }
    }

    /// Company text also feeds the event index, so both are rebuilt.
    pub async fn refresh_companies(&self, pool: &PgPool) {
        if let Err(e) = self.rebuild_all(pool).await {
            warn!("Company index refresh failed: {e}");
        }
    }

    pub async fn event_ids(&self, prefix: &str) -> Vec<Uuid> {
        self.events.read().await.starts_with(prefix)
    }

    pub async fn company_ids(&self, prefix: &str) -> Vec<Uuid> {
        self.companies.read().await.starts_with(prefix)
    }

    #[cfg(test)]
    pub async fn load(&self, events: &[EventIndexRow], companies: &[CompanyIndexRow]) {
        *self.events.write().await = build_event_trie(events);
        *self.companies.write().await = build_company_trie(companies);
    }
}
