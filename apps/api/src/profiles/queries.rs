use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::profile::{EmployerProfileRow, StudentProfileRow};
use crate::models::user::UserType;

pub async fn fetch_student(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<StudentProfileRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM student_profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_employer(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<EmployerProfileRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM employer_profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_employers_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<EmployerProfileRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM employer_profiles WHERE id = ANY($1) ORDER BY company_name")
        .bind(ids)
        .fetch_all(pool)
        .await
}

/// Loads the caller's student profile, or 403 with `forbidden` if the caller is an employer.
pub async fn current_student(
    pool: &PgPool,
    user: &AuthUser,
    forbidden: &str,
) -> Result<StudentProfileRow, AppError> {
    user.require(UserType::Student, forbidden)?;
    let profile: Option<StudentProfileRow> =
        sqlx::query_as("SELECT * FROM student_profiles WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?;
    profile.ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// Loads the caller's employer profile, or 403 with `forbidden` if the caller is a student.
pub async fn current_employer(
    pool: &PgPool,
    user: &AuthUser,
    forbidden: &str,
) -> Result<EmployerProfileRow, AppError> {
    user.require(UserType::Employer, forbidden)?;
    let profile: Option<EmployerProfileRow> =
        sqlx::query_as("SELECT * FROM employer_profiles WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?;
    profile.ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}
