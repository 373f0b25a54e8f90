//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::FleetError;
use crate::mqtt::client::{MessageBus, MqttBus, MqttConnection};
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::bus;

/// Run the fleet hub until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), FleetError> {
    info!("Initializing fleet hub...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start fleet hub: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), FleetError> {
    let (mqtt_bus, connection) = MqttBus::connect(&options.broker_address)?;
    let bus: Arc<dyn MessageBus> = Arc::new(mqtt_bus);

    let app_state = Arc::new(AppState::new(&options.fleet, bus));
    shutdown_manager.with_app_state(app_state.clone())?;

    init_bus_worker(
        options.bus_worker.clone(),
        app_state.clone(),
        connection,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    if options.enable_socket_server {
        init_socket_server(options, app_state, shutdown_manager, shutdown_tx.subscribe()).await?;
    }

    Ok(())
}

fn init_bus_worker(
    options: bus::Options,
    app_state: Arc<AppState>,
    mut connection: MqttConnection,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), FleetError> {
    info!("Initializing bus worker...");

    let bus_handle = app_state.bus.clone();
    let lifecycle = app_state.lifecycle.clone();

    let worker_handle = tokio::spawn(async move {
        bus::run(
            &options,
            bus_handle.as_ref(),
            &mut connection,
            lifecycle,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_bus_worker_handle(worker_handle)
}

async fn init_socket_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), FleetError> {
    info!("Initializing local HTTP server...");

    let server_state = ServerState::from_app_state(&app_state);

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_socket_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
    socket_server_handle: Option<JoinHandle<Result<(), FleetError>>>,
    bus_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            app_state: None,
            socket_server_handle: None,
            bus_worker_handle: None,
        }
    }

    pub fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), FleetError> {
        if self.app_state.is_some() {
            return Err(FleetError::ShutdownError("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    pub fn with_bus_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), FleetError> {
        if self.bus_worker_handle.is_some() {
            return Err(FleetError::ShutdownError("bus_worker_handle already set".to_string()));
        }
        self.bus_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_socket_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), FleetError>>,
    ) -> Result<(), FleetError> {
        if self.socket_server_handle.is_some() {
            return Err(FleetError::ShutdownError("server_handle already set".to_string()));
        }
        self.socket_server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), FleetError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), FleetError> {
        info!("Shutting down fleet hub...");

        // 1. Socket server, so no new API calls arrive
        if let Some(handle) = self.socket_server_handle.take() {
            handle.await.map_err(|e| FleetError::ShutdownError(e.to_string()))??;
        }

        // 2. Bus worker, which stops the sweeper and disconnects
        if let Some(handle) = self.bus_worker_handle.take() {
            handle.await.map_err(|e| FleetError::ShutdownError(e.to_string()))?;
        }

        // 3. App state
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown().await;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
