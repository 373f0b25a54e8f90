//! Bus worker: drives the MQTT session and feeds status reports in

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::lifecycle::StatusLifecycle;
use crate::mqtt::client::{BusEvent, MessageBus, MqttConnection, QoS};
use crate::utils::{calc_exp_backoff, CooldownOptions};
use crate::workers::sweeper::SweepSchedule;

const DISCONNECT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Bus worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Backoff between reconnect attempts
    pub reconnect_cooldown: CooldownOptions,

    /// QoS for the status subscription
    pub status_qos: QoS,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reconnect_cooldown: CooldownOptions::default(),
            status_qos: QoS::AtLeastOnce,
        }
    }
}

/// Run the bus worker
///
/// Every time the session comes up the status subscription is renewed and
/// the sweeper started; when it drops the sweeper is stopped until the next
/// successful reconnect.
pub async fn run<S, F>(
    options: &Options,
    bus: &dyn MessageBus,
    connection: &mut MqttConnection,
    lifecycle: Arc<StatusLifecycle>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Bus worker starting...");

    let status_filter = lifecycle.topics().status_filter();
    let mut sweeper = SweepSchedule::new(lifecycle.clone());
    let mut failed_polls: u32 = 0;

    loop {
        let polled = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Bus worker shutting down...");
                break;
            }
            polled = connection.poll() => polled,
        };

        match polled {
            Ok(Some(BusEvent::Connected)) => {
                failed_polls = 0;
                if let Err(e) = bus.subscribe(&status_filter, options.status_qos).await {
                    error!("Failed to subscribe to status reports: {}", e);
                }
                sweeper.start();
            }
            Ok(Some(BusEvent::Message(msg))) => {
                lifecycle.handle_message(&msg);
            }
            Ok(Some(BusEvent::Disconnected)) => {
                warn!("Broker closed the session");
                sweeper.stop().await;
            }
            Ok(None) => {}
            Err(e) => {
                sweeper.stop().await;
                let delay = calc_exp_backoff(&options.reconnect_cooldown, failed_polls);
                failed_polls = failed_polls.saturating_add(1);
                warn!("Bus error: {}, reconnecting in {:?}...", e, delay);
                sleep_fn(delay).await;
            }
        }
    }

    sweeper.stop().await;
    if bus.is_connected() {
        if let Err(e) = bus.unsubscribe(&status_filter).await {
            debug!("Unsubscribe on shutdown failed: {}", e);
        }
        if let Err(e) = bus.disconnect().await {
            warn!("Disconnect on shutdown failed: {}", e);
        }
        // The queued requests only reach the broker while the loop is polled.
        let flushed = tokio::time::timeout(DISCONNECT_FLUSH_TIMEOUT, async {
            while connection.poll().await.is_ok() {}
        })
        .await;
        if flushed.is_err() {
            debug!("Gave up flushing the session after {:?}", DISCONNECT_FLUSH_TIMEOUT);
        }
    }
}
