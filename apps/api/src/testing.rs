//! Fixtures for tests that drive handlers against a real database.
//!
//! Tests built on these run under `#[sqlx::test]`, which gives each test a
//! fresh database with the migrations applied. They are `#[ignore]`d because
//! they need a Postgres server; run them with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::test_config;
use crate::models::profile::{EmployerProfileRow, StudentProfileRow};
use crate::models::user::UserType;
use crate::search::SearchIndex;
use crate::state::AppState;
use crate::storage::memory::MemoryResumeStore;

/// State around `db`. Redis is configured but never connected unless a
/// handler touches token revocation.
pub fn state_with(db: PgPool) -> AppState {
    let config = test_config();
    let redis = redis::Client::open(config.redis_url.clone()).unwrap();
    AppState {
        db,
        redis,
        resumes: Arc::new(MemoryResumeStore::default()),
        search: SearchIndex::default(),
        config,
    }
}

async fn insert_user(pool: &PgPool, user_type: UserType) -> AuthUser {
    let id = Uuid::new_v4();
    let email = format!("{id}@example.edu");
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, user_type) VALUES ($1, $2, 'unused', $3)",
    )
    .bind(id)
    .bind(&email)
    .bind(user_type.as_str())
    .execute(pool)
    .await
    .unwrap();
    AuthUser {
        user_id: id,
        user_type,
        email,
        jti: Uuid::new_v4(),
        exp: (Utc::now() + Duration::days(1)).timestamp(),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub async fn student(
    pool: &PgPool,
    name: &str,
    skills: &[&str],
    preferences: &[&str],
) -> (AuthUser, StudentProfileRow) {
    let user = insert_user(pool, UserType::Student).await;
    let profile = sqlx::query_as(
        r#"
        INSERT INTO student_profiles (id, user_id, full_name, skills, job_preferences)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(name)
    .bind(owned(skills))
    .bind(owned(preferences))
    .fetch_one(pool)
    .await
    .unwrap();
    (user, profile)
}

pub async fn employer(pool: &PgPool, company: &str) -> (AuthUser, EmployerProfileRow) {
    let user = insert_user(pool, UserType::Employer).await;
    let profile = sqlx::query_as(
        "INSERT INTO employer_profiles (id, user_id, company_name) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(company)
    .fetch_one(pool)
    .await
    .unwrap();
    (user, profile)
}

/// Inserts an event `days_ahead` days from now (negative for past events).
pub async fn event(
    pool: &PgPool,
    employer_id: Uuid,
    title: &str,
    tags: &[&str],
    days_ahead: i64,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO events (id, employer_id, title, event_date, tags)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(employer_id)
    .bind(title)
    .bind(Utc::now() + Duration::days(days_ahead))
    .bind(owned(tags))
    .execute(pool)
    .await
    .unwrap();
    id
}
