//! Server state

use std::sync::Arc;

use crate::app::state::AppState;
use crate::dispatch::CommandDispatcher;
use crate::lifecycle::StatusLifecycle;
use crate::mqtt::client::MessageBus;
use crate::registry::DeviceRegistry;
use crate::stats::StatisticsAggregator;

/// Server state shared across handlers
pub struct ServerState {
    pub registry: Arc<DeviceRegistry>,
    pub lifecycle: Arc<StatusLifecycle>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub statistics: Arc<StatisticsAggregator>,
    pub bus: Arc<dyn MessageBus>,
}

impl ServerState {
    pub fn from_app_state(app_state: &AppState) -> Self {
        Self {
            registry: app_state.registry.clone(),
            lifecycle: app_state.lifecycle.clone(),
            dispatcher: app_state.dispatcher.clone(),
            statistics: app_state.statistics.clone(),
            bus: app_state.bus.clone(),
        }
    }
}
