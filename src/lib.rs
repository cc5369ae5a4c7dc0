pub mod api;
pub mod error;
pub mod state;
pub mod storage;

use std::env;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use state::AppState;

pub async fn run() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("NEWSDESK_LOG"))
        .init();

    let app = AppState::new(storage::init_db_from_env().await, media_root());

    api::run_server(app).await
}

/// 上传图片的存放目录，默认为 `media`
fn media_root() -> String {
    env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string())
}
