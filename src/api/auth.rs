use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    error::{ApiError, Error},
    storage::{Db, Querier},
};

/// 已认证的调用者
///
/// 从 `Authorization: Bearer <token>` 解析令牌并查表得到。
/// 令牌缺失或未知时拒绝请求，返回 401。
///
/// ```ignore
/// async fn create(user: AuthUser, /* ... */) -> Result<_> {
///     // user.id 作为新记录的作者
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    Db: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let pool = Db::from_ref(state);
        let (id, username) = pool
            .user_by_token(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser { id, username })
    }
}
