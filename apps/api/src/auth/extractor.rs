use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::revocation::is_revoked;
use crate::auth::token::{bearer_token, decode_token, Claims};
use crate::errors::AppError;
use crate::models::user::{UserRow, UserType};
use crate::state::AppState;

/// The authenticated caller. Add it as a handler argument to require a valid,
/// unrevoked token belonging to a user that still exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub email: String,
    pub jti: Uuid,
    pub exp: i64,
}

impl AuthUser {
    /// Rejects with 403 and `message` unless the caller is of the given kind.
    pub fn require(&self, kind: UserType, message: &str) -> Result<(), AppError> {
        if self.user_type == kind {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

/// The account kind recorded on the user row, which must still match the kind
/// the token was issued for.
fn resolve_user_type(claims: &Claims, user: &UserRow) -> Result<UserType, AppError> {
    let stored = UserType::parse(&user.user_type).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "User {} has unknown user_type '{}'",
            user.id,
            user.user_type
        ))
    })?;
    if stored != claims.user_type {
        debug!(
            "Token for {} claims {} but account is {}",
            user.id,
            claims.user_type.as_str(),
            stored.as_str()
        );
        return Err(AppError::Unauthorized("Invalid token".to_string()));
    }
    Ok(stored)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Token is missing".to_string()))?;
        let token = bearer_token(header)
            .ok_or_else(|| AppError::Unauthorized("Token is missing".to_string()))?;

        let claims = decode_token(token, &state.config.jwt_secret).map_err(|e| {
            debug!("Rejected token: {e}");
            AppError::Unauthorized("Token is invalid".to_string())
        })?;

        if is_revoked(&state.redis, claims.jti).await? {
            return Err(AppError::Unauthorized("Token has been revoked".to_string()));
        }

        let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;
        let user = user.ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        let user_type = resolve_user_type(&claims, &user)?;

        Ok(AuthUser {
            user_id: user.id,
            user_type,
            email: user.email,
            jti: claims.jti,
            exp: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn caller(user_type: UserType) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            user_type,
            email: "someone@uic.edu".to_string(),
            jti: Uuid::new_v4(),
            exp: 0,
        }
    }

    fn row(user_type: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "someone@uic.edu".to_string(),
            password_hash: String::new(),
            user_type: user_type.to_string(),
            created_at: Utc::now(),
        }
    }

    fn claims_for(user: &UserRow, user_type: UserType) -> Claims {
        Claims {
            sub: user.id,
            user_type,
            jti: Uuid::new_v4(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_user_type_matches_claim() {
        let user = row("employer");
        let claims = claims_for(&user, UserType::Employer);
        assert_eq!(resolve_user_type(&claims, &user).unwrap(), UserType::Employer);
    }

    #[test]
    fn test_user_type_mismatch_is_invalid_token() {
        let user = row("student");
        let claims = claims_for(&user, UserType::Employer);
        let err = resolve_user_type(&claims, &user).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid token"));
    }

    #[test]
    fn test_unknown_stored_type_is_internal() {
        let user = row("admin");
        let claims = claims_for(&user, UserType::Student);
        assert!(matches!(
            resolve_user_type(&claims, &user),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_require_matching_kind() {
        assert!(caller(UserType::Student)
            .require(UserType::Student, "Only students can RSVP")
            .is_ok());
    }

    #[test]
    fn test_require_other_kind_is_forbidden() {
        let err = caller(UserType::Employer)
            .require(UserType::Student, "Only students can RSVP")
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "Only students can RSVP"));
    }
}
