use sqlx::PgExecutor;

use crate::error::{ApiError, Error};

use super::{CategoryRow, Db};

/// 待插入的文章
///
/// `author_id` 总是来自认证调用者，从不取自请求体。
#[derive(Debug)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub author_id: i64,
    pub published: bool,
}

/// 文章的整行更新内容
///
/// 不含作者字段，作者在创建后不可变更。
#[derive(Debug)]
pub struct ArticleChange {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub published: bool,
}

/// 提供文章和分类的数据库写入接口
///
/// 所有写入为单条原子操作，`updated_at` 在每次修改时刷新。
pub trait Store {
    /// 获取 SQL 执行器，用于 [`sqlx::query()`] 执行
    fn executor<'t>(&'t mut self) -> impl PgExecutor<'t>;

    /// 插入分类，返回完整记录
    ///
    /// slug 冲突返回字段校验错误。
    fn insert_category(
        &mut self,
        name: &str,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<CategoryRow, Error>> {
        async move {
            sqlx::query_as::<_, CategoryRow>(
                r#"
                INSERT INTO categories (name, slug)
                VALUES ($1, $2)
                RETURNING id, name, slug, created_at
                "#,
            )
            .bind(name)
            .bind(slug)
            .fetch_one(self.executor())
            .await
            .map_err(map_constraint)
        }
    }

    /// 更新分类，返回完整记录
    fn update_category(
        &mut self,
        id: i64,
        name: &str,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<CategoryRow, Error>> {
        async move {
            sqlx::query_as::<_, CategoryRow>(
                r#"
                UPDATE categories
                SET name = $2, slug = $3
                WHERE id = $1
                RETURNING id, name, slug, created_at
                "#,
            )
            .bind(id)
            .bind(name)
            .bind(slug)
            .fetch_one(self.executor())
            .await
            .map_err(map_constraint)
        }
    }

    /// 删除分类
    ///
    /// 分类下的文章由外键级联一并删除。
    fn delete_category(&mut self, id: i64) -> impl std::future::Future<Output = Result<(), Error>> {
        async move {
            sqlx::query("DELETE FROM categories WHERE id = $1")
                .bind(id)
                .execute(self.executor())
                .await?;
            Ok(())
        }
    }

    /// 插入文章，返回新记录的 ID
    ///
    /// slug 冲突或分类不存在返回字段校验错误。
    fn insert_article(
        &mut self,
        article: &NewArticle,
    ) -> impl std::future::Future<Output = Result<i64, Error>> {
        async move {
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO articles
                    (title, slug, content, image, category_id, author_id, published)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(&article.title)
            .bind(&article.slug)
            .bind(&article.content)
            .bind(&article.image)
            .bind(article.category_id)
            .bind(article.author_id)
            .bind(article.published)
            .fetch_one(self.executor())
            .await
            .map_err(map_constraint)
        }
    }

    /// 整行更新文章，同时刷新 `updated_at`
    fn update_article(
        &mut self,
        id: i64,
        change: &ArticleChange,
    ) -> impl std::future::Future<Output = Result<(), Error>> {
        async move {
            sqlx::query(
                r#"
                UPDATE articles
                SET title = $2, slug = $3, content = $4, image = $5,
                    category_id = $6, published = $7, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&change.title)
            .bind(&change.slug)
            .bind(&change.content)
            .bind(&change.image)
            .bind(change.category_id)
            .bind(change.published)
            .execute(self.executor())
            .await
            .map_err(map_constraint)?;
            Ok(())
        }
    }

    /// 删除文章
    fn delete_article(&mut self, id: i64) -> impl std::future::Future<Output = Result<(), Error>> {
        async move {
            sqlx::query("DELETE FROM articles WHERE id = $1")
                .bind(id)
                .execute(self.executor())
                .await?;
            Ok(())
        }
    }
}

/// 将数据库约束冲突翻译为字段校验错误
///
/// 唯一约束对应 slug 重复，外键约束对应引用的分类或作者不存在。
fn map_constraint(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return ApiError::validation("slug", "this slug is already in use").into();
        }
        if db.is_foreign_key_violation() {
            let field = if db.constraint().is_some_and(|c| c.contains("author")) {
                "author"
            } else {
                "category"
            };
            return ApiError::validation(field, "referenced record does not exist").into();
        }
    }
    e.into()
}

/// 为 [`sqlx::PgTransaction`] 实现 [`Store`]
impl Store for sqlx::PgTransaction<'_> {
    fn executor<'t>(&'t mut self) -> impl PgExecutor<'t> {
        self.as_mut()
    }
}

/// 为 [`Db`] 实现 [`Store`]
impl Store for &'_ Db {
    fn executor<'t>(&'t mut self) -> impl PgExecutor<'t> {
        *self
    }
}
