use std::{path::Path, sync::Arc};

use axum::extract::FromRef;

use crate::storage::Db;

/// 应用程序上下文
///
/// [`AppState`] 封装了数据库连接池和上传文件根目录，提供统一访问入口。
#[derive(Clone, FromRef)]
pub struct AppState {
    pool: Db,
    media_root: Arc<Path>,
}

impl AppState {
    /// 创建一个新的 [`AppState`] 实例
    pub fn new(pool: Db, media_root: impl AsRef<Path>) -> Self {
        let media_root = Arc::<Path>::from(media_root.as_ref());

        Self { pool, media_root }
    }

    /// 获取数据库连接池
    pub fn pool(&self) -> &Db {
        &self.pool
    }

    /// 获取上传文件根目录
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }
}
