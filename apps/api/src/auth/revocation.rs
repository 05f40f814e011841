//! Logout support. JWTs are stateless, so a logged-out token is remembered in
//! Redis until it would have expired anyway.

use redis::Client as RedisClient;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

fn revoked_key(jti: Uuid) -> String {
    format!("revoked:{jti}")
}

/// Seconds until `exp`, never less than one so the key is always written with a TTL.
pub fn remaining_ttl(exp: i64, now: i64) -> u64 {
    (exp - now).max(1) as u64
}

pub async fn revoke(redis: &RedisClient, jti: Uuid, ttl_secs: u64) -> Result<(), AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(revoked_key(jti))
        .arg(1)
        .arg("EX")
        .arg(ttl_secs)
        .query_async::<_, ()>(&mut conn)
        .await?;
    info!("Revoked token {jti} for {ttl_secs}s");
    Ok(())
}

pub async fn is_revoked(redis: &RedisClient, jti: Uuid) -> Result<bool, AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let exists: bool = redis::cmd("EXISTS")
        .arg(revoked_key(jti))
        .query_async(&mut conn)
        .await?;
    Ok(exists)
}
