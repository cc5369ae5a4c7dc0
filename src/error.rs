use std::io;

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::Value;

pub type Result<T> = core::result::Result<T, Error>;

/// 面向客户端的错误
///
/// 对应三类客户端错误：未找到、未认证、字段校验失败。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("validation failed: {field}: {message}")]
    Validation { field: String, message: String },
}

impl ApiError {
    /// 构造字段校验错误
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    ApiError(#[from] ApiError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Sqlx(e) => {
                tracing::error!(%e, "sqlx error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::ApiError(api_error) => match api_error {
                ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
                ApiError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
                }
                ApiError::Validation { field, message } => {
                    let mut body = serde_json::Map::new();
                    body.insert(field, Value::String(message));
                    (StatusCode::BAD_REQUEST, Json(Value::Object(body))).into_response()
                }
            },
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
        }
    }
}
