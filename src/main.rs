use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use draft_sync_engine::routes::draft::draft_router;
use draft_sync_engine::services::session_store::SessionStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let db_url =
        std::env::var("DRAFT_DB_URL").unwrap_or_else(|_| "sqlite://./data/draft.db".to_string());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("Could not connect to SQLite");

    info!("Connected to sqlite database.");

    let store = SessionStore::new(pool)
        .await
        .expect("Could not initialize the draft session store");

    let app = draft_router(store);

    let bind_addr =
        std::env::var("DRAFT_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    info!("Started draft sync server on {bind_addr}.");
    axum::serve(listener, app).await.unwrap();
}
