mod articles;
mod auth;
mod categories;
mod payload;
mod users;

pub use auth::AuthUser;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::state::AppState;

/// 设置应用的路由。
///
/// 将 `/api` 下的分类、文章和用户接口组合在一起，并绑定应用状态。
pub fn setup_route(app: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            categories::setup_route()
                .merge(articles::setup_route())
                .merge(users::setup_route()),
        )
        .with_state(app)
}

/// 启动 HTTP 服务，并使用给定的路由处理请求。
///
/// 在 `0.0.0.0:3000` 上监听 TCP 连接，并打印启动日志。
#[instrument(name = "http server", skip_all)]
pub async fn run_server_with_router(router: Router) {
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind TCP listener on 0.0.0.0:3000");

    tracing::info!("listening on :3000");

    axum::serve(listener, router)
        .await
        .expect("Failed to start Axum server");
}

/// 启动 HTTP 服务，自动设置路由和中间件。
pub async fn run_server(app: AppState) {
    let router = add_middlewares(setup_route(app));

    run_server_with_router(router).await
}

fn add_middlewares(router: Router) -> Router {
    fn log_failure(
        err: tower_http::classify::ServerErrorsFailureClass,
        _latency: std::time::Duration,
        _span: &tracing::Span,
    ) {
        tracing::error!(error = %err, "request failed");
    }

    router.layer(TraceLayer::new_for_http().on_failure(log_failure))
}
