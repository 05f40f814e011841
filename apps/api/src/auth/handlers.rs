use axum::{extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::revocation::{remaining_ttl, revoke};
use crate::auth::token::issue_token;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::Json;
use crate::models::user::{UserRow, UserType, UserView};
use crate::state::AppState;
use crate::tags::normalize_tags;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<String>,
    // student fields
    pub full_name: Option<String>,
    pub school: Option<String>,
    pub major: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub job_preferences: Vec<String>,
    // employer fields
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserView,
}

/// Validated registration credentials.
#[derive(Debug, PartialEq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

/// Checks the request shape before anything touches the database.
pub fn validate_registration(req: &RegisterRequest) -> Result<Registration, AppError> {
    let (Some(email), Some(password), Some(user_type)) =
        (&req.email, &req.password, &req.user_type)
    else {
        return Err(AppError::Validation("Missing required fields".to_string()));
    };

    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    if !is_plausible_email(&email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    let user_type = UserType::parse(user_type)
        .ok_or_else(|| AppError::Validation("Invalid user type".to_string()))?;

    if user_type == UserType::Employer
        && req
            .company_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    {
        return Err(AppError::Validation(
            "Company name is required for employers".to_string(),
        ));
    }

    Ok(Registration {
        email,
        password: password.clone(),
        user_type,
    })
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One `@`, a non-empty local part, and a dotted domain. Deliverability is not checked.
pub fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !email.chars().any(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

fn auth_response(
    state: &AppState,
    user: &UserRow,
    user_type: UserType,
    message: &str,
) -> Result<AuthResponse, AppError> {
    let (token, _) = issue_token(
        user.id,
        user_type,
        &state.config.jwt_secret,
        Duration::days(state.config.token_ttl_days),
    )?;
    Ok(AuthResponse {
        message: message.to_string(),
        token,
        user: UserView::from(user),
    })
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let registration = validate_registration(&req)?;

    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM users WHERE lower(email) = $1")
            .bind(&registration.email)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password_blocking(registration.password.clone()).await?;

    let mut tx = state.db.begin().await?;

    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, user_type)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&registration.email)
    .bind(&password_hash)
    .bind(registration.user_type.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict("User already exists".to_string())
        }
        other => AppError::Database(other),
    })?;

    match registration.user_type {
        UserType::Student => {
            sqlx::query(
                r#"
                INSERT INTO student_profiles
                    (id, user_id, full_name, school, major, job_preferences, skills)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(req.full_name.as_deref().map(str::trim).unwrap_or_default())
            .bind(req.school.as_deref().map(str::trim))
            .bind(req.major.as_deref().map(str::trim))
            .bind(normalize_tags(&req.job_preferences))
            .bind(normalize_tags(&req.skills))
            .execute(&mut *tx)
            .await?;
        }
        UserType::Employer => {
            sqlx::query(
                r#"
                INSERT INTO employer_profiles
                    (id, user_id, company_name, industry, description, website, location)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.id)
            .bind(req.company_name.as_deref().map(str::trim).unwrap_or_default())
            .bind(req.industry.as_deref().map(str::trim))
            .bind(req.description.as_deref())
            .bind(req.website.as_deref().map(str::trim))
            .bind(req.location.as_deref().map(str::trim))
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(
        "Registered {} {} ({})",
        registration.user_type.as_str(),
        user.id,
        user.email
    );

    if registration.user_type == UserType::Employer {
        state.search.refresh_companies(&state.db).await;
    }

    let response = auth_response(
        &state,
        &user,
        registration.user_type,
        "User created successfully",
    )?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = req.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password required".to_string(),
        ));
    }

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE lower(email) = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
    let user = user.ok_or_else(invalid)?;

    if !verify_password_blocking(user.password_hash.clone(), password).await? {
        warn!("Failed login for {}", user.email);
        return Err(invalid());
    }

    let user_type = UserType::parse(&user.user_type).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "User {} has unknown user_type '{}'",
            user.id,
            user.user_type
        ))
    })?;

    info!("User {} logged in", user.id);
    Ok(Json(auth_response(&state, &user, user_type, "Login successful")?))
}

/// POST /api/auth/logout
/// Revokes the presented token for the rest of its lifetime.
pub async fn handle_logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let ttl = remaining_ttl(user.exp, Utc::now().timestamp());
    revoke(&state.redis, user.jti, ttl).await?;
    info!("User {} ({}) logged out", user.user_id, user.email);
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserView>, AppError> {
    let row: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(UserView::from(&row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, user_type: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            user_type: Some(user_type.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_student_registration() {
        let reg = validate_registration(&request(" Ada@UIC.edu ", "pw123456", "student")).unwrap();
        assert_eq!(reg.email, "ada@uic.edu");
        assert_eq!(reg.user_type, UserType::Student);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut req = request("ada@uic.edu", "pw", "student");
        req.password = None;
        let err = validate_registration(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Missing required fields"));
    }

    #[test]
    fn test_unknown_user_type_rejected() {
        let err = validate_registration(&request("ada@uic.edu", "pw", "admin")).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Invalid user type"));
    }

    #[test]
    fn test_employer_needs_company_name() {
        let err = validate_registration(&request("hr@acme.com", "pw", "employer")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut req = request("hr@acme.com", "pw", "employer");
        req.company_name = Some("Acme".to_string());
        assert!(validate_registration(&req).is_ok());
    }

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("no-at-sign.com"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@b@c.co"));
        assert!(!is_plausible_email("a@localhost"));
        assert!(!is_plausible_email("a b@c.co"));
        assert!(!is_plausible_email("a@b.co."));
    }
}
