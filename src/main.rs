mod app;
mod auth;
mod chat;
mod config;
mod error;
mod listings;
mod notifications;
mod orders;
mod payments;
mod seed;
mod state;
mod storage;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "resalex=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    users::services::ensure_root_user(&app_state).await?;

    if std::env::var("SEED_DEMO").map(|v| v == "true").unwrap_or(false) {
        seed::seed_demo_data(&app_state).await?;
    }

    let app = app::build_app(app_state);
    app::serve(app).await
}
