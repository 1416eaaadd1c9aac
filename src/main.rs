use axum::{
    Router,
    routing::{get, post},
};
use tracing_subscriber::EnvFilter;

use payflow::config::Config;
use payflow::db;
use payflow::handlers::{accounts, health, transfers};
use payflow::state::AppState;

fn create_app(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/account", post(accounts::create_account))
        .route("/account/all", get(accounts::list_accounts))
        .route(
            "/account/{uid}",
            get(accounts::get_account).delete(accounts::delete_account),
        )
        .route("/transaction", post(transfers::create_transfer))
        .route("/transaction/all", get(transfers::list_transfers))
        .route("/transaction/{id}", get(transfers::get_transfer));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/db", get(health::db_health_check))
        .nest("/api/v1", v1)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let pool = db::pool::create_pool(&config.database_url)
        .await
        .expect("failed to create Postgres connection pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run database migrations");

    let app = create_app(AppState { pool });

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind tcp listener");

    tracing::info!(%addr, "server running");

    axum::serve(listener, app)
        .await
        .expect("failed to start server");
}
