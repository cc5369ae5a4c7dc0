use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, Result},
    state::AppState,
    storage::{CategoryRow, Db, Querier, Store},
};

use super::auth::AuthUser;
use super::payload::JsonOrForm;

/// 配置分类相关路由。
///
/// 路由包括：
/// - `GET /categories`：分类列表
/// - `POST /categories`：创建分类（需认证）
/// - `GET /categories/{slug}`：获取单个分类
/// - `PUT/PATCH /categories/{slug}`：更新分类（需认证）
/// - `DELETE /categories/{slug}`：删除分类（需认证）
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/categories", get(category_list).post(category_create))
        .route(
            "/categories/{slug}",
            get(category)
                .put(category_update)
                .patch(category_update)
                .delete(category_remove),
        )
}

/// 分类的对外表示
#[derive(Debug, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at.timestamp_millis(),
        }
    }
}

/// 分类写入请求的字段集合
///
/// 创建时两个字段均为必填，更新时缺失的字段保留原值。
#[derive(Debug, Deserialize)]
pub struct CategoryFields {
    name: Option<String>,
    slug: Option<String>,
}

/// 获取分类列表。
async fn category_list(State(pool): State<Db>) -> Result<Json<Vec<Category>>> {
    let rows = pool.category_list().await?;
    Ok(Json(rows.into_iter().map(Category::from).collect()))
}

/// 根据 slug 获取单个分类。
///
/// 分类不存在返回 [`ApiError::NotFound`]。
async fn category(
    Path(slug): Path<String>,
    State(pool): State<Db>,
) -> Result<Json<Category>> {
    let row = pool
        .category_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(row.into()))
}

/// 创建分类。
///
/// 任何已认证用户均可创建，slug 重复返回字段校验错误。
async fn category_create(
    State(pool): State<Db>,
    _user: AuthUser,
    JsonOrForm(fields): JsonOrForm<CategoryFields>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = fields
        .name
        .ok_or_else(|| ApiError::validation("name", "this field is required"))?;
    let slug = fields
        .slug
        .ok_or_else(|| ApiError::validation("slug", "this field is required"))?;

    let row = (&pool).insert_category(&name, &slug).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// 更新分类。
///
/// PUT 和 PATCH 共用：缺失的字段保留原值。
async fn category_update(
    Path(slug): Path<String>,
    State(pool): State<Db>,
    _user: AuthUser,
    JsonOrForm(fields): JsonOrForm<CategoryFields>,
) -> Result<Json<Category>> {
    let current = pool
        .category_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound)?;

    let name = fields.name.unwrap_or(current.name);
    let new_slug = fields.slug.unwrap_or(current.slug);

    let row = (&pool).update_category(current.id, &name, &new_slug).await?;
    Ok(Json(row.into()))
}

/// 删除分类。
///
/// 分类下的文章级联删除。
async fn category_remove(
    Path(slug): Path<String>,
    State(pool): State<Db>,
    _user: AuthUser,
) -> Result<StatusCode> {
    let current = pool
        .category_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound)?;

    (&pool).delete_category(current.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
