use std::net::SocketAddr;

use dotenvy::dotenv;

use workforce_api::logging::init_tracing;
use workforce_api::modules::sessions::reaper;
use workforce_api::router::init_router;
use workforce_api::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();

    init_tracing();

    let state = init_app_state().await;

    reaper::spawn(state.db.clone(), state.session_config.clone());

    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind to 0.0.0.0:3000");
    tracing::info!("Server running on http://localhost:3000");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
