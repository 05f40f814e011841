use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{Json, Path};
use crate::events::queries::fetch_events_for_employer;
use crate::models::event::EventView;
use crate::models::profile::{EmployerProfileRow, StudentProfileRow};
use crate::profiles::queries::{current_employer, current_student, fetch_employer, fetch_student};
use crate::profiles::resume::{resume_key, validate_resume};
use crate::state::AppState;
use crate::tags::normalize_tags;

const RESUME_FIELD: &str = "resume";

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStudentRequest {
    pub full_name: Option<String>,
    pub school: Option<String>,
    pub major: Option<String>,
    pub resume_url: Option<String>,
    pub job_preferences: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmployerRequest {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdated<T> {
    pub message: String,
    pub profile: T,
}

#[derive(Debug, Serialize)]
pub struct EmployerWithEvents {
    #[serde(flatten)]
    pub profile: EmployerProfileRow,
    pub events: Vec<EventView>,
}

async fn with_events(
    state: &AppState,
    profile: EmployerProfileRow,
) -> Result<EmployerWithEvents, AppError> {
    let events = fetch_events_for_employer(&state.db, profile.id)
        .await?
        .into_iter()
        .map(|e| e.into_view(false))
        .collect();
    Ok(EmployerWithEvents { profile, events })
}

/// GET /api/profile/student/:id
pub async fn handle_get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProfileRow>, AppError> {
    let profile = fetch_student(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

/// GET /api/profile/student
pub async fn handle_get_own_student(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<StudentProfileRow>, AppError> {
    Ok(Json(current_student(&state.db, &user, "Unauthorized").await?))
}

/// PUT /api/profile/student
/// Only fields present in the body change; list fields are replaced wholesale.
pub async fn handle_update_student(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateStudentRequest>,
) -> Result<Json<ProfileUpdated<StudentProfileRow>>, AppError> {
    let profile = current_student(&state.db, &user, "Unauthorized").await?;

    let updated: StudentProfileRow = sqlx::query_as(
        r#"
        UPDATE student_profiles SET
            full_name       = COALESCE($2, full_name),
            school          = COALESCE($3, school),
            major           = COALESCE($4, major),
            resume_url      = COALESCE($5, resume_url),
            job_preferences = COALESCE($6, job_preferences),
            skills          = COALESCE($7, skills)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(profile.id)
    .bind(req.full_name.as_deref().map(str::trim))
    .bind(req.school.as_deref().map(str::trim))
    .bind(req.major.as_deref().map(str::trim))
    .bind(req.resume_url.as_deref().map(str::trim))
    .bind(req.job_preferences.as_ref().map(normalize_tags))
    .bind(req.skills.as_ref().map(normalize_tags))
    .fetch_one(&state.db)
    .await?;

    info!("Student profile {} updated", updated.id);
    Ok(Json(ProfileUpdated {
        message: "Profile updated successfully".to_string(),
        profile: updated,
    }))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File size must be less than the upload limit".to_string())
    } else {
        AppError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

/// POST /api/profile/student/resume (multipart, field `resume`)
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ProfileUpdated<StudentProfileRow>>, AppError> {
    let profile = current_student(&state.db, &user, "Only students can upload resumes").await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((content_type, file_name, data));
        break;
    }
    let (content_type, file_name, data) = upload
        .ok_or_else(|| AppError::Validation(format!("Missing '{RESUME_FIELD}' file field")))?;

    let format = validate_resume(
        content_type.as_deref(),
        file_name.as_deref(),
        data.len(),
        state.config.resume_max_bytes,
    )?;
    let key = resume_key(profile.id, format);
    let url = state.resumes.put(&key, format.content_type(), data).await?;

    let updated: StudentProfileRow =
        sqlx::query_as("UPDATE student_profiles SET resume_url = $2 WHERE id = $1 RETURNING *")
            .bind(profile.id)
            .bind(&url)
            .fetch_one(&state.db)
            .await?;

    info!("Stored resume for student {} at {key}", profile.id);
    Ok(Json(ProfileUpdated {
        message: "Resume uploaded successfully".to_string(),
        profile: updated,
    }))
}

/// GET /api/profile/employer/:id
pub async fn handle_get_employer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmployerWithEvents>, AppError> {
    let profile = fetch_employer(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(with_events(&state, profile).await?))
}

/// GET /api/profile/employer
pub async fn handle_get_own_employer(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<EmployerWithEvents>, AppError> {
    let profile = current_employer(&state.db, &user, "Unauthorized").await?;
    Ok(Json(with_events(&state, profile).await?))
}

/// PUT /api/profile/employer
pub async fn handle_update_employer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateEmployerRequest>,
) -> Result<Json<ProfileUpdated<EmployerProfileRow>>, AppError> {
    let profile = current_employer(&state.db, &user, "Unauthorized").await?;

    let company_name = req.company_name.as_deref().map(str::trim);
    if company_name == Some("") {
        return Err(AppError::Validation(
            "Company name cannot be empty".to_string(),
        ));
    }

    let updated: EmployerProfileRow = sqlx::query_as(
        r#"
        UPDATE employer_profiles SET
            company_name = COALESCE($2, company_name),
            industry     = COALESCE($3, industry),
            description  = COALESCE($4, description),
            website      = COALESCE($5, website),
            location     = COALESCE($6, location),
            logo_url     = COALESCE($7, logo_url)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(profile.id)
    .bind(company_name)
    .bind(req.industry.as_deref().map(str::trim))
    .bind(req.description.as_deref())
    .bind(req.website.as_deref().map(str::trim))
    .bind(req.location.as_deref().map(str::trim))
    .bind(req.logo_url.as_deref().map(str::trim))
    .fetch_one(&state.db)
    .await?;

    info!("Employer profile {} updated", updated.id);
    state.search.refresh_companies(&state.db).await;

    Ok(Json(ProfileUpdated {
        message: "Profile updated successfully".to_string(),
        profile: updated,
    }))
}
