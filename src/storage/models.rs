use chrono::{DateTime, Local};

/// 文章记录
///
/// 由 `articles` 连接 `categories` 和 `users` 查出，
/// 附带冗余的分类名和作者名。
#[derive(Debug, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    /// 标题
    pub title: String,
    /// 文章唯一标识
    pub slug: String,
    /// 正文
    pub content: String,
    /// 可选的图片路径，相对于上传根目录
    pub image: Option<String>,
    /// 所属分类 ID
    pub category_id: i64,
    /// 分类名，来自 `categories.name`
    pub category_name: String,
    /// 作者 ID
    pub author_id: i64,
    /// 作者名，来自 `users.username`
    pub author_name: String,
    /// 是否已发布
    pub published: bool,
    /// 创建时间
    pub created_at: DateTime<Local>,
    /// 更新时间，每次修改刷新
    pub updated_at: DateTime<Local>,
}

/// 分类记录
#[derive(Debug, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    /// 分类名
    pub name: String,
    /// 分类唯一标识
    pub slug: String,
    /// 创建时间
    pub created_at: DateTime<Local>,
}

/// 用户记录
///
/// 用户由外部身份系统维护，这里只读。
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}
