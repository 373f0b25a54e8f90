//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::FleetOptions;
use crate::dispatch::CommandDispatcher;
use crate::lifecycle::StatusLifecycle;
use crate::mqtt::client::MessageBus;
use crate::mqtt::topics::Topics;
use crate::registry::{DeviceRegistry, Notifier};
use crate::stats::StatisticsAggregator;

/// Main application state
///
/// Every component shares the one registry, which is the single point of
/// serialisation for ingestion, the sweep and API calls.
pub struct AppState {
    /// Event fan-out
    pub notifier: Notifier,

    /// Device and group registry
    pub registry: Arc<DeviceRegistry>,

    /// Status ingestion and offline sweep
    pub lifecycle: Arc<StatusLifecycle>,

    /// Command fan-out
    pub dispatcher: Arc<CommandDispatcher>,

    /// Group statistics
    pub statistics: Arc<StatisticsAggregator>,

    /// Message bus handle
    pub bus: Arc<dyn MessageBus>,
}

impl AppState {
    /// Wire up application state around a message bus
    pub fn new(options: &FleetOptions, bus: Arc<dyn MessageBus>) -> Self {
        info!("Initializing application state...");

        let notifier = Notifier::new();
        let registry = Arc::new(DeviceRegistry::new(notifier.clone()));
        let topics = Topics::new(options.topic_prefix.clone());

        let lifecycle = Arc::new(StatusLifecycle::new(
            registry.clone(),
            topics.clone(),
            options.sweep_interval,
        ));
        let dispatcher = Arc::new(CommandDispatcher::new(
            registry.clone(),
            bus.clone(),
            topics,
            options.command_qos,
        ));
        let statistics = Arc::new(StatisticsAggregator::new(registry.clone()));

        Self {
            notifier,
            registry,
            lifecycle,
            dispatcher,
            statistics,
            bus,
        }
    }

    /// Shutdown application state
    pub async fn shutdown(&self) {
        info!(
            "Shutting down application state ({} device(s) tracked)...",
            self.registry.len()
        );
    }
}
