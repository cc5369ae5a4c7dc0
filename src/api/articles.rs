use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, Result},
    state::AppState,
    storage::{ArticleChange, ArticleFilter, ArticleRow, Db, NewArticle, Ordering, Querier, Store},
};

use super::auth::AuthUser;
use super::payload::{ArticleFields, ArticlePayload};

/// 配置文章相关路由。
///
/// 路由包括：
/// - `GET /articles`：文章列表，支持筛选、搜索和排序
/// - `POST /articles`：创建文章（需认证）
/// - `GET /articles/{slug}`：获取单篇文章
/// - `PUT/PATCH /articles/{slug}`：更新文章（需认证）
/// - `DELETE /articles/{slug}`：删除文章（需认证）
pub fn setup_route() -> Router<AppState> {
    Router::new()
        .route("/articles", get(article_list).post(article_create))
        .route(
            "/articles/{slug}",
            get(article)
                .put(article_update)
                .patch(article_update)
                .delete(article_remove),
        )
}

/// 文章的对外表示
///
/// `category_name` 和 `author_name` 为连接查询得到的只读冗余字段。
#[derive(Debug, Serialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub category: i64,
    pub category_name: String,
    pub author: i64,
    pub author_name: String,
    pub published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            image: row.image,
            category: row.category_id,
            category_name: row.category_name,
            author: row.author_id,
            author_name: row.author_name,
            published: row.published,
            created_at: row.created_at.timestamp_millis(),
            updated_at: row.updated_at.timestamp_millis(),
        }
    }
}

/// 查询参数，用于文章列表筛选和排序。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    category: Option<i64>,
    author: Option<i64>,
    published: Option<bool>,
    search: Option<String>,
    ordering: Option<String>,
}

impl From<QueryParams> for ArticleFilter {
    fn from(params: QueryParams) -> Self {
        Self {
            category: params.category,
            author: params.author,
            published: params.published,
            search: params.search,
            ordering: Ordering::parse(params.ordering.as_deref()),
        }
    }
}

/// 获取文章列表。
///
/// 支持按分类、作者和发布状态筛选，按标题正文搜索，
/// 默认按创建时间倒序。
async fn article_list(
    Query(params): Query<QueryParams>,
    State(pool): State<Db>,
) -> Result<Json<Vec<Article>>> {
    let rows = pool.article_list(&params.into()).await?;
    Ok(Json(rows.into_iter().map(Article::from).collect()))
}

/// 根据 slug 获取单篇文章。
///
/// 文章不存在返回 [`ApiError::NotFound`]。
async fn article(Path(slug): Path<String>, State(pool): State<Db>) -> Result<Json<Article>> {
    let row = pool
        .article_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(row.into()))
}

/// 创建文章。
///
/// 作者总是取认证调用者，请求体中的作者字段忽略。
/// 发布状态缺省为已发布。
async fn article_create(
    State(pool): State<Db>,
    user: AuthUser,
    ArticlePayload(fields): ArticlePayload,
) -> Result<(StatusCode, Json<Article>)> {
    let new = require_fields(fields, user.id)?;

    let id = (&pool).insert_article(&new).await?;
    let row = pool.article_by_id(id).await?.ok_or(ApiError::NotFound)?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// 更新文章。
///
/// PUT 和 PATCH 共用：缺失的字段保留原值，作者不可变更，
/// `updated_at` 随每次修改刷新。
async fn article_update(
    Path(slug): Path<String>,
    State(pool): State<Db>,
    _user: AuthUser,
    ArticlePayload(fields): ArticlePayload,
) -> Result<Json<Article>> {
    let current = pool
        .article_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound)?;

    let change = merge_fields(fields, &current);
    (&pool).update_article(current.id, &change).await?;

    let row = pool
        .article_by_id(current.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(row.into()))
}

/// 删除文章。
async fn article_remove(
    Path(slug): Path<String>,
    State(pool): State<Db>,
    _user: AuthUser,
) -> Result<StatusCode> {
    let current = pool
        .article_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound)?;

    (&pool).delete_article(current.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 校验创建文章的必填字段
///
/// title、slug、content、category 缺一不可，
/// 作者取自认证调用者。
fn require_fields(fields: ArticleFields, author_id: i64) -> Result<NewArticle> {
    let required = |field: &'static str, value: Option<String>| -> Result<String> {
        value.ok_or_else(|| ApiError::validation(field, "this field is required").into())
    };

    Ok(NewArticle {
        title: required("title", fields.title)?,
        slug: required("slug", fields.slug)?,
        content: required("content", fields.content)?,
        image: fields.image,
        category_id: fields
            .category
            .ok_or_else(|| ApiError::validation("category", "this field is required"))?,
        author_id,
        published: fields.published.unwrap_or(true),
    })
}

/// 合并更新字段，缺失的字段保留原值
fn merge_fields(fields: ArticleFields, current: &ArticleRow) -> ArticleChange {
    ArticleChange {
        title: fields.title.unwrap_or_else(|| current.title.clone()),
        slug: fields.slug.unwrap_or_else(|| current.slug.clone()),
        content: fields.content.unwrap_or_else(|| current.content.clone()),
        image: fields.image.or_else(|| current.image.clone()),
        category_id: fields.category.unwrap_or(current.category_id),
        published: fields.published.unwrap_or(current.published),
    }
}
