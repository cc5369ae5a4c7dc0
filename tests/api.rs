use axum::{
    Router,
    body::{Body, to_bytes},
    extract::Request,
    http::{Response, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use newsdesk::{
    api, state,
    storage::{init_db_from_env, migrate},
};

const ALICE_TOKEN: &str = "alice-token";
const BOB_TOKEN: &str = "bob-token";

struct TestApp {
    router: Router,
    pool: newsdesk::storage::Db,
}

impl TestApp {
    async fn new() -> Self {
        let pool = init_db_from_env().await;

        migrate(&pool, "sql/01-CREATE_TABLE.sql")
            .await
            .expect("初始化sql失败");

        // 清空数据并预置两个外部身份系统的用户和令牌
        sqlx::query("TRUNCATE TABLE auth_tokens, articles, categories, users")
            .execute(&pool)
            .await
            .expect("清空数据失败");
        sqlx::query(
            "INSERT INTO users (id, username, email, first_name, last_name)
             VALUES (5, 'alice', 'alice@example.com', 'Alice', 'Liddell'),
                    (6, 'bob', 'bob@example.com', 'Bob', 'Baker')",
        )
        .execute(&pool)
        .await
        .expect("预置用户失败");
        sqlx::query("INSERT INTO auth_tokens (token, user_id) VALUES ($1, 5), ($2, 6)")
            .bind(ALICE_TOKEN)
            .bind(BOB_TOKEN)
            .execute(&pool)
            .await
            .expect("预置令牌失败");

        let media_root = std::env::temp_dir().join("newsdesk-test-media");
        let app = state::AppState::new(pool.clone(), media_root);

        let router = api::setup_route(app);

        Self { router, pool }
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("oneshot fail")
    }
}

impl TestApp {
    async fn read_json(resp: Response<Body>) -> Value {
        let data = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("读取数据失败");
        if data.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&data).expect("反序列化失败")
    }

    async fn get(&self, path: &str, code: StatusCode, msg: &str) -> Value {
        let req = Request::get(path).body(Body::empty()).expect("请求失败");
        let resp = self.request(req).await;
        assert_eq!(resp.status(), code, "{}", msg);
        Self::read_json(resp).await
    }

    async fn send_json(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Value,
        code: StatusCode,
        msg: &str,
    ) -> Value {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let req = builder
            .body(Body::from(body.to_string()))
            .expect("请求失败");

        let resp = self.request(req).await;
        assert_eq!(resp.status(), code, "{}", msg);
        Self::read_json(resp).await
    }

    async fn delete(&self, path: &str, token: Option<&str>, code: StatusCode, msg: &str) {
        let mut builder = Request::builder().method("DELETE").uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let req = builder.body(Body::empty()).expect("请求失败");

        let resp = self.request(req).await;
        assert_eq!(resp.status(), code, "{}", msg);
    }
}

#[tokio::test]
#[ignore = "API测试 依赖真实数据库"]
async fn test_api() {
    let app = TestApp::new().await;

    // 匿名写入被拒绝 不产生任何数据
    {
        app.send_json(
            "POST",
            "/api/categories",
            None,
            json!({"name": "Tech", "slug": "tech"}),
            StatusCode::UNAUTHORIZED,
            "匿名创建分类应被拒绝",
        )
        .await;

        app.send_json(
            "POST",
            "/api/categories",
            Some("no-such-token"),
            json!({"name": "Tech", "slug": "tech"}),
            StatusCode::UNAUTHORIZED,
            "未知令牌应被拒绝",
        )
        .await;

        let data = app
            .get("/api/categories", StatusCode::OK, "分类列表应为空")
            .await;
        assert_eq!(data.as_array().expect("应为数组").len(), 0);
    }

    // 分类的增删改查
    let (tech_id, life_id) = {
        let created = app
            .send_json(
                "POST",
                "/api/categories",
                Some(ALICE_TOKEN),
                json!({"name": "Tech", "slug": "tech"}),
                StatusCode::CREATED,
                "创建分类",
            )
            .await;
        assert_eq!(created["name"], "Tech");
        assert_eq!(created["slug"], "tech");

        let fetched = app
            .get("/api/categories/tech", StatusCode::OK, "按 slug 获取分类")
            .await;
        assert_eq!(fetched["name"], "Tech", "创建后按 slug 取回应一致");
        assert_eq!(fetched["id"], created["id"]);

        app.send_json(
            "POST",
            "/api/categories",
            Some(ALICE_TOKEN),
            json!({"name": "Tech Again", "slug": "tech"}),
            StatusCode::BAD_REQUEST,
            "slug 重复应返回校验错误",
        )
        .await;
        let data = app
            .get("/api/categories", StatusCode::OK, "重复创建不应持久化")
            .await;
        assert_eq!(data.as_array().expect("应为数组").len(), 1);

        app.get(
            "/api/categories/no-such",
            StatusCode::NOT_FOUND,
            "未知 slug 应返回 404",
        )
        .await;

        // 任何已认证用户都可以编辑别人创建的分类
        let updated = app
            .send_json(
                "PATCH",
                "/api/categories/tech",
                Some(BOB_TOKEN),
                json!({"name": "Technology"}),
                StatusCode::OK,
                "部分更新分类",
            )
            .await;
        assert_eq!(updated["name"], "Technology");
        assert_eq!(updated["slug"], "tech", "未提交的字段应保留原值");

        let life = app
            .send_json(
                "POST",
                "/api/categories",
                Some(BOB_TOKEN),
                json!({"name": "Life", "slug": "life"}),
                StatusCode::CREATED,
                "创建第二个分类",
            )
            .await;

        (
            created["id"].as_i64().expect("分类 id"),
            life["id"].as_i64().expect("分类 id"),
        )
    };

    // 创建文章 作者总是认证调用者
    {
        let created = app
            .send_json(
                "POST",
                "/api/articles",
                Some(ALICE_TOKEN),
                json!({
                    "title": "A",
                    "slug": "a",
                    "content": "something about foo",
                    "category": tech_id,
                    "author": 999
                }),
                StatusCode::CREATED,
                "创建文章",
            )
            .await;
        assert_eq!(created["author"], 5, "作者应为认证调用者 忽略请求体");
        assert_eq!(created["author_name"], "alice");
        assert_eq!(created["category"], tech_id);
        assert_eq!(created["category_name"], "Technology");
        assert_eq!(created["published"], true, "发布状态缺省为已发布");

        app.send_json(
            "POST",
            "/api/articles",
            Some(ALICE_TOKEN),
            json!({"title": "No Content", "slug": "no-content", "category": tech_id}),
            StatusCode::BAD_REQUEST,
            "缺少必填字段应返回校验错误",
        )
        .await;

        app.send_json(
            "POST",
            "/api/articles",
            Some(ALICE_TOKEN),
            json!({"title": "A2", "slug": "a", "content": "x", "category": tech_id}),
            StatusCode::BAD_REQUEST,
            "文章 slug 重复应返回校验错误",
        )
        .await;

        app.send_json(
            "POST",
            "/api/articles",
            Some(ALICE_TOKEN),
            json!({"title": "A3", "slug": "a3", "content": "x", "category": 424242}),
            StatusCode::BAD_REQUEST,
            "引用不存在的分类应返回校验错误",
        )
        .await;

        let data = app
            .get("/api/articles", StatusCode::OK, "失败的创建不应持久化")
            .await;
        assert_eq!(data.as_array().expect("应为数组").len(), 1);
    }

    // 列表的筛选 搜索和排序
    {
        app.send_json(
            "POST",
            "/api/articles",
            Some(BOB_TOKEN),
            json!({
                "title": "B",
                "slug": "b",
                "content": "something about bar",
                "category": life_id,
                "published": false
            }),
            StatusCode::CREATED,
            "创建未发布文章",
        )
        .await;
        app.send_json(
            "POST",
            "/api/articles",
            Some(ALICE_TOKEN),
            json!({
                "title": "C",
                "slug": "c",
                "content": "foo again",
                "category": tech_id
            }),
            StatusCode::CREATED,
            "创建第三篇文章",
        )
        .await;

        let data = app
            .get("/api/articles", StatusCode::OK, "默认按创建时间倒序")
            .await;
        let slugs: Vec<&str> = data
            .as_array()
            .expect("应为数组")
            .iter()
            .map(|a| a["slug"].as_str().expect("slug"))
            .collect();
        assert_eq!(slugs, ["c", "b", "a"]);

        let data = app
            .get(
                "/api/articles?published=false",
                StatusCode::OK,
                "按发布状态筛选",
            )
            .await;
        let rows = data.as_array().expect("应为数组");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["slug"], "b");

        let data = app
            .get("/api/articles?search=foo", StatusCode::OK, "标题正文搜索")
            .await;
        assert_eq!(data.as_array().expect("应为数组").len(), 2);

        let data = app
            .get(
                "/api/articles?ordering=title",
                StatusCode::OK,
                "按标题升序",
            )
            .await;
        let titles: Vec<&str> = data
            .as_array()
            .expect("应为数组")
            .iter()
            .map(|a| a["title"].as_str().expect("title"))
            .collect();
        assert_eq!(titles, ["A", "B", "C"]);

        let data = app
            .get(
                &format!("/api/articles?category={life_id}"),
                StatusCode::OK,
                "按分类筛选",
            )
            .await;
        assert_eq!(data.as_array().expect("应为数组").len(), 1);

        let data = app
            .get("/api/articles?author=6", StatusCode::OK, "按作者筛选")
            .await;
        let rows = data.as_array().expect("应为数组");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["author_name"], "bob");
    }

    // 部分更新 作者和未提交字段不变
    {
        let before = app
            .get("/api/articles/a", StatusCode::OK, "更新前取回")
            .await;

        let updated = app
            .send_json(
                "PATCH",
                "/api/articles/a",
                Some(BOB_TOKEN),
                json!({"content": "updated foo", "author": 999}),
                StatusCode::OK,
                "部分更新文章",
            )
            .await;
        assert_eq!(updated["title"], "A", "未提交的字段应保留原值");
        assert_eq!(updated["content"], "updated foo");
        assert_eq!(updated["author"], 5, "作者创建后不可变更");
        assert!(
            updated["updated_at"].as_i64() >= before["updated_at"].as_i64(),
            "更新时间应刷新"
        );

        app.send_json(
            "PUT",
            "/api/articles/no-such",
            Some(ALICE_TOKEN),
            json!({"content": "x"}),
            StatusCode::NOT_FOUND,
            "更新未知 slug 应返回 404",
        )
        .await;
    }

    // multipart 创建 带图片上传
    {
        let boundary = "NEWSDESK-TEST-BOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\nWith Picture\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"slug\"\r\n\r\npic\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"content\"\r\n\r\nillustrated\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"category\"\r\n\r\n{tech_id}\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"cover.png\"\r\n\
             Content-Type: image/png\r\n\r\nnot-really-a-png\r\n\
             --{boundary}--\r\n"
        );

        let req = Request::post("/api/articles")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("Authorization", format!("Bearer {ALICE_TOKEN}"))
            .body(Body::from(body))
            .expect("请求失败");
        let resp = app.request(req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "multipart 创建文章");

        let created = TestApp::read_json(resp).await;
        assert_eq!(created["title"], "With Picture");
        let image = created["image"].as_str().expect("image 路径");
        assert!(image.starts_with("articles/"), "图片应落在上传目录下");
    }

    // 用户只读接口
    {
        let data = app.get("/api/users", StatusCode::OK, "用户列表").await;
        assert_eq!(data.as_array().expect("应为数组").len(), 2);

        let alice = app
            .get("/api/users/5", StatusCode::OK, "按 id 获取用户")
            .await;
        assert_eq!(alice["username"], "alice");
        assert_eq!(alice["first_name"], "Alice");

        app.get("/api/users/999", StatusCode::NOT_FOUND, "未知用户应 404")
            .await;
    }

    // 匿名删除不产生任何变更
    {
        app.delete(
            "/api/articles/a",
            None,
            StatusCode::UNAUTHORIZED,
            "匿名删除应被拒绝",
        )
        .await;
        app.get("/api/articles/a", StatusCode::OK, "文章应仍然存在")
            .await;
    }

    // 级联删除
    {
        app.delete(
            "/api/categories/tech",
            Some(ALICE_TOKEN),
            StatusCode::NO_CONTENT,
            "删除分类",
        )
        .await;
        app.get(
            "/api/articles/a",
            StatusCode::NOT_FOUND,
            "分类删除应级联删除文章",
        )
        .await;
        let data = app
            .get("/api/articles", StatusCode::OK, "其他分类的文章应保留")
            .await;
        let rows = data.as_array().expect("应为数组");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["slug"], "b");

        // 用户由外部系统删除 其文章一并消失
        sqlx::query("DELETE FROM users WHERE id = 6")
            .execute(&app.pool)
            .await
            .expect("删除用户失败");
        app.get(
            "/api/articles/b",
            StatusCode::NOT_FOUND,
            "用户删除应级联删除其文章",
        )
        .await;
    }
}
