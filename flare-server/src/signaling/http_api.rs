use crate::relay::RelayService;
use crate::signaling::ws_handler;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use flare_core::now_millis;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

/// Builds the full HTTP surface: health check, ICE server descriptors and
/// the `/ws` signaling upgrade.
pub fn router(relay: RelayService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/api/ice-servers", get(ice_servers))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(relay)
}

async fn health(State(relay): State<RelayService>) -> Json<Value> {
    let stats = relay.stats();
    Json(json!({
        "message": "flare signaling relay",
        "status": "healthy",
        "timestamp": now_millis(),
        "connectedSockets": stats.connected_sockets,
        "activeRooms": stats.active_rooms,
        "uptime": format!("{} seconds", stats.uptime_secs),
    }))
}

/// Served verbatim; clients feed this straight into peer-connection setup.
async fn ice_servers(State(relay): State<RelayService>) -> Json<Value> {
    Json(json!({ "iceServers": relay.ice_servers() }))
}
