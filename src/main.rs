mod app;
mod components;
mod config;
mod db;
mod frame;
mod model;
mod pages;
mod routes;
mod selection;
mod services;
mod state;
mod views;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");
    let port = config.port;

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");
    let state = state::AppState::new(pool, config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "8-bit club listening");
    axum::serve(listener, app).await.expect("server failed");
}
