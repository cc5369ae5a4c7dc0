use super::{ArticleRow, CategoryRow, Db, UserRow};

/// 文章连接查询的公共 SELECT 片段
const ARTICLE_SELECT: &str = r#"
    SELECT a.id, a.title, a.slug, a.content, a.image,
           a.category_id, c.name AS category_name,
           a.author_id, u.username AS author_name,
           a.published, a.created_at, a.updated_at
    FROM articles a
    INNER JOIN categories c ON a.category_id = c.id
    INNER JOIN users u ON a.author_id = u.id
    "#;

/// 文章列表的排序方式
///
/// 对应查询参数 `ordering`，默认按创建时间倒序。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ordering {
    #[default]
    CreatedDesc,
    CreatedAsc,
    TitleAsc,
    TitleDesc,
}

impl Ordering {
    /// 解析 `ordering` 查询参数
    ///
    /// 识别 `created_at`、`title` 及其 `-` 前缀的倒序形式，
    /// 其他取值回退到默认排序。
    pub fn parse(param: Option<&str>) -> Self {
        match param {
            Some("created_at") => Self::CreatedAsc,
            Some("-created_at") => Self::CreatedDesc,
            Some("title") => Self::TitleAsc,
            Some("-title") => Self::TitleDesc,
            _ => Self::default(),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::CreatedDesc => "a.created_at DESC",
            Self::CreatedAsc => "a.created_at ASC",
            Self::TitleAsc => "a.title ASC",
            Self::TitleDesc => "a.title DESC",
        }
    }
}

/// 文章列表的筛选条件
///
/// `category`、`author`、`published` 为精确匹配，
/// `search` 对标题和正文做不区分大小写的子串匹配。
#[derive(Debug, Default)]
pub struct ArticleFilter {
    pub category: Option<i64>,
    pub author: Option<i64>,
    pub published: Option<bool>,
    pub search: Option<String>,
    pub ordering: Ordering,
}

/// 用于查询文章、分类和用户数据
///
/// 所有方法均为只读，写入见 [`super::Store`]。
pub trait Querier: Send + Sync {
    type Error;

    /// 根据 slug 查询单篇文章
    ///
    /// 返回 [`ArticleRow`]，如果文章不存在则返回 `None`。
    fn article_by_slug(
        &self,
        slug: impl AsRef<str>,
    ) -> impl std::future::Future<Output = Result<Option<ArticleRow>, Self::Error>>;

    /// 根据 ID 查询单篇文章
    ///
    /// 写入后用于取回带分类名和作者名的完整行。
    fn article_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<ArticleRow>, Self::Error>>;

    /// 按条件查询文章列表
    ///
    /// 返回 [`ArticleRow`] 的向量，筛选和排序见 [`ArticleFilter`]。
    fn article_list(
        &self,
        filter: &ArticleFilter,
    ) -> impl std::future::Future<Output = Result<Vec<ArticleRow>, Self::Error>>;

    /// 查询所有分类，按 ID 升序
    fn category_list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<CategoryRow>, Self::Error>>;

    /// 根据 slug 查询单个分类
    fn category_by_slug(
        &self,
        slug: impl AsRef<str>,
    ) -> impl std::future::Future<Output = Result<Option<CategoryRow>, Self::Error>>;

    /// 查询所有用户，按 ID 升序
    fn user_list(&self) -> impl std::future::Future<Output = Result<Vec<UserRow>, Self::Error>>;

    /// 根据 ID 查询单个用户
    fn user_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<UserRow>, Self::Error>>;

    /// 根据访问令牌查询用户 ID 和用户名
    ///
    /// 令牌由外部身份系统签发，这里只做查表校验。
    fn user_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<(i64, String)>, Self::Error>>;
}

impl Querier for Db {
    type Error = sqlx::Error;

    async fn article_by_slug(&self, slug: impl AsRef<str>) -> Result<Option<ArticleRow>, sqlx::Error> {
        let query = format!("{ARTICLE_SELECT} WHERE a.slug = $1 LIMIT 1");
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(slug.as_ref())
            .fetch_optional(self)
            .await
    }

    async fn article_by_id(&self, id: i64) -> Result<Option<ArticleRow>, sqlx::Error> {
        let query = format!("{ARTICLE_SELECT} WHERE a.id = $1 LIMIT 1");
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(id)
            .fetch_optional(self)
            .await
    }

    async fn article_list(&self, filter: &ArticleFilter) -> Result<Vec<ArticleRow>, sqlx::Error> {
        let mut builder = sqlx::QueryBuilder::new(ARTICLE_SELECT);

        builder.push("WHERE TRUE");
        if let Some(category) = filter.category {
            builder.push(" AND a.category_id = ").push_bind(category);
        }
        if let Some(author) = filter.author {
            builder.push(" AND a.author_id = ").push_bind(author);
        }
        if let Some(published) = filter.published {
            builder.push(" AND a.published = ").push_bind(published);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            builder
                .push(" AND (a.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.content ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder.push(" ORDER BY ").push(filter.ordering.sql());

        let query = builder.build_query_as::<ArticleRow>();
        let result = query.fetch_all(self).await?;
        Ok(result)
    }

    async fn category_list(&self) -> Result<Vec<CategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, slug, created_at
            FROM categories
            ORDER BY id
            "#,
        )
        .fetch_all(self)
        .await
    }

    async fn category_by_slug(
        &self,
        slug: impl AsRef<str>,
    ) -> Result<Option<CategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, slug, created_at
            FROM categories
            WHERE slug = $1
            LIMIT 1
            "#,
        )
        .bind(slug.as_ref())
        .fetch_optional(self)
        .await
    }

    async fn user_list(&self) -> Result<Vec<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, first_name, last_name
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(self)
        .await
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, first_name, last_name
            FROM users
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(self)
        .await
    }

    async fn user_by_token(&self, token: &str) -> Result<Option<(i64, String)>, sqlx::Error> {
        sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT u.id, u.username
            FROM auth_tokens t
            INNER JOIN users u ON t.user_id = u.id
            WHERE t.token = $1
            LIMIT 1
            "#,
        )
        .bind(token)
        .fetch_optional(self)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::Ordering;

    #[test]
    fn ordering_parse() {
        assert_eq!(Ordering::parse(None), Ordering::CreatedDesc);
        assert_eq!(Ordering::parse(Some("created_at")), Ordering::CreatedAsc);
        assert_eq!(Ordering::parse(Some("-created_at")), Ordering::CreatedDesc);
        assert_eq!(Ordering::parse(Some("title")), Ordering::TitleAsc);
        assert_eq!(Ordering::parse(Some("-title")), Ordering::TitleDesc);
    }

    #[test]
    fn ordering_parse_unknown_falls_back() {
        assert_eq!(Ordering::parse(Some("updated_at")), Ordering::CreatedDesc);
        assert_eq!(Ordering::parse(Some("")), Ordering::CreatedDesc);
    }
}
