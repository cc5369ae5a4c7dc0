use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::{
    error::{ApiError, Result},
    state::AppState,
    storage::{Db, Querier, UserRow},
};

/// 配置用户相关路由。
///
/// 用户由外部身份系统维护，这里只提供只读列表和详情：
/// - `GET /users`：用户列表
/// - `GET /users/{id}`：获取单个用户
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/users", get(user_list))
        .route("/users/{id}", get(user))
}

/// 用户的对外表示
#[derive(Debug, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

/// 获取用户列表。
async fn user_list(State(pool): State<Db>) -> Result<Json<Vec<User>>> {
    let rows = pool.user_list().await?;
    Ok(Json(rows.into_iter().map(User::from).collect()))
}

/// 根据 ID 获取单个用户。
///
/// 用户不存在返回 [`ApiError::NotFound`]。
async fn user(Path(id): Path<i64>, State(pool): State<Db>) -> Result<Json<User>> {
    let row = pool.user_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(row.into()))
}
