use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserType;

const BEARER: &str = "bearer";

/// JWT payload. `jti` identifies the token so logout can revoke it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub user_type: UserType,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(
    user_id: Uuid,
    user_type: UserType,
    secret: &str,
    ttl: Duration,
) -> Result<(String, Claims)> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        user_type,
        jti: Uuid::new_v4(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// Extracts the token from an `Authorization` header value.
/// Accepts `Bearer <token>` and a bare token.
/// A scheme with nothing after it yields `None`.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let value = header_value.trim_start();
    let token = match value.get(..BEARER.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER) => {
            let rest = &value[BEARER.len()..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest
            } else {
                value
            }
        }
        _ => value,
    };
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issue_and_decode() {
        let user_id = Uuid::new_v4();
        let (token, issued) =
            issue_token(user_id, UserType::Student, SECRET, Duration::days(30)).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.user_type, UserType::Student);
        assert_eq!(claims.jti, issued.jti);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) =
            issue_token(Uuid::new_v4(), UserType::Employer, SECRET, Duration::days(1)).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let (token, _) =
            issue_token(Uuid::new_v4(), UserType::Student, SECRET, Duration::hours(-2)).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_bearer_prefix_handling() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn test_bare_scheme_is_missing_token() {
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("  BEARER \t "), None);
        assert_eq!(bearer_token("  Bearer  abc.def  "), Some("abc.def"));
        // A bare token that merely starts with the scheme name is kept whole.
        assert_eq!(bearer_token("bearerish.token"), Some("bearerish.token"));
    }
}
