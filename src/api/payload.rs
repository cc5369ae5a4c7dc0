use std::path::Path;

use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, Error},
    state::AppState,
};

/// 文章写入请求的字段集合
///
/// 所有字段可选：创建时由处理器检查必填项，更新时缺失的
/// 字段保留原值。请求体中的作者字段一律忽略。
#[derive(Debug, Default, Deserialize)]
pub struct ArticleFields {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub category: Option<i64>,
    pub published: Option<bool>,
    pub image: Option<String>,
}

/// 按 `Content-Type` 在 JSON 和表单之间分派的请求体
///
/// 用于不涉及文件上传的写入接口。
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation("body", e.body_text()))?;
            return Ok(Self(value));
        }

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation("body", e.body_text()))?;
        Ok(Self(value))
    }
}

/// 按 `Content-Type` 解析文章写入请求体
///
/// 支持三种格式：
/// - `application/json`
/// - `application/x-www-form-urlencoded`
/// - `multipart/form-data`，其中 `image` 文件部分会写入
///   上传目录，字段值记录相对路径
pub struct ArticlePayload(pub ArticleFields);

impl FromRequest<AppState> for ArticlePayload {
    type Rejection = Error;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation("body", e.body_text()))?;
            let fields = from_multipart(multipart, state.media_root()).await?;
            return Ok(Self(fields));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<ArticleFields>::from_request(req, state)
                .await
                .map_err(|e| ApiError::validation("body", e.body_text()))?;
            return Ok(Self(fields));
        }

        let Json(fields) = Json::<ArticleFields>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation("body", e.body_text()))?;
        Ok(Self(fields))
    }
}

/// 逐个读取 multipart 字段
///
/// 文本字段按名称填充，`image` 文件部分落盘后记录相对路径，
/// 未知字段（包括 `author`）跳过。
async fn from_multipart(
    mut multipart: Multipart,
    media_root: &Path,
) -> Result<ArticleFields, Error> {
    let mut fields = ArticleFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation("body", e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == "image" && field.file_name().is_some() {
            fields.image = Some(save_image(field, media_root).await?);
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| ApiError::validation(name.clone(), e.body_text()))?;

        match name.as_str() {
            "title" => fields.title = Some(text),
            "slug" => fields.slug = Some(text),
            "content" => fields.content = Some(text),
            "category" => {
                let id = text
                    .parse()
                    .map_err(|_| ApiError::validation("category", "expected an integer id"))?;
                fields.category = Some(id);
            }
            "published" => {
                let flag = text
                    .parse()
                    .map_err(|_| ApiError::validation("published", "expected true or false"))?;
                fields.published = Some(flag);
            }
            // 其余字段（包括 author）忽略
            _ => {}
        }
    }

    Ok(fields)
}

/// 将上传的图片写入 `{media_root}/articles/`，返回相对路径
///
/// 文件名加时间戳前缀避免覆盖，并丢弃客户端提供的路径部分。
async fn save_image(
    field: axum::extract::multipart::Field<'_>,
    media_root: &Path,
) -> Result<String, Error> {
    let file_name = field
        .file_name()
        .and_then(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation("image", e.body_text()))?;

    let relative = format!(
        "articles/{}-{}",
        chrono::Local::now().timestamp_millis(),
        file_name
    );

    tokio::fs::create_dir_all(media_root.join("articles")).await?;
    tokio::fs::write(media_root.join(&relative), &data).await?;

    Ok(relative)
}
