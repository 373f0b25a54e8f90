//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::FleetError;
use crate::server::handlers::{
    add_to_group_handler, create_group_handler, delete_device_handler, delete_group_handler,
    device_command_handler, device_status_handler, get_device_handler, group_command_handler,
    group_devices_handler, group_statistics_handler, health_handler, list_devices_handler,
    list_groups_handler, register_device_handler, remove_from_group_handler,
    update_device_handler, version_handler,
};
use crate::server::state::ServerState;

/// Build the HTTP router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Devices
        .route("/devices", get(list_devices_handler).post(register_device_handler))
        .route(
            "/devices/{id}",
            get(get_device_handler)
                .patch(update_device_handler)
                .delete(delete_device_handler),
        )
        .route("/devices/{id}/status", post(device_status_handler))
        .route("/devices/{id}/commands", post(device_command_handler))
        // Groups
        .route("/groups", get(list_groups_handler).post(create_group_handler))
        .route("/groups/{name}", axum::routing::delete(delete_group_handler))
        .route("/groups/{name}/devices", get(group_devices_handler))
        .route(
            "/groups/{name}/devices/{id}",
            put(add_to_group_handler).delete(remove_from_group_handler),
        )
        .route("/groups/{name}/statistics", get(group_statistics_handler))
        .route("/groups/{name}/commands", post(group_command_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), FleetError>>, FleetError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| FleetError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| FleetError::ServerError(e.to_string()))
    });

    Ok(handle)
}
