//! Market data manager for WebSocket integration.
//!
//! Connects the kline client and supervises it: when the connection drops,
//! the supervisor reports the fault on the event bus and reconnects with
//! exponential backoff. Decoded bars reach the daemon over an mpsc channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use trailbot_connectors::{BinanceKlineClient, FeedError, FeedMessage, KlineStreamConfig};

use crate::config::{FeedConfig, ReconnectConfig};
use crate::error::DaemonResult;
use crate::event_bus::{DaemonEvent, EventBus};

/// Buffered feed messages between the socket and the trading loop.
const FEED_CHANNEL_CAPACITY: usize = 256;

/// Market data manager - connects and supervises the kline client.
pub struct MarketDataManager {
    /// Stream and reconnect settings
    config: FeedConfig,
    /// Event bus for publishing feed faults
    event_bus: Arc<EventBus>,
}

impl MarketDataManager {
    /// Create a new market data manager.
    pub fn new(config: FeedConfig, event_bus: Arc<EventBus>) -> Self {
        Self { config, event_bus }
    }

    /// Connect and spawn the supervisor task.
    ///
    /// The first connection is made before returning: if it fails, the error
    /// is returned and nothing is spawned. The supervisor stops when `cancel`
    /// fires or the returned receiver is dropped.
    pub async fn start(
        &self,
        cancel: CancellationToken,
    ) -> DaemonResult<(mpsc::Receiver<FeedMessage>, JoinHandle<()>)> {
        let (sender, receiver) = mpsc::channel(FEED_CHANNEL_CAPACITY);

        let client = BinanceKlineClient::connect(self.config.stream.clone(), sender.clone()).await?;

        let supervisor = FeedSupervisor {
            stream: self.config.stream.clone(),
            reconnect: self.config.reconnect,
            sender,
            event_bus: self.event_bus.clone(),
            cancel,
        };
        let handle = tokio::spawn(supervisor.run(client));

        Ok((receiver, handle))
    }
}

/// Owns the reconnect loop for one stream.
struct FeedSupervisor {
    stream: KlineStreamConfig,
    reconnect: ReconnectConfig,
    sender: mpsc::Sender<FeedMessage>,
    event_bus: Arc<EventBus>,
    cancel: CancellationToken,
}

impl FeedSupervisor {
    async fn run(self, mut client: BinanceKlineClient) {
        let symbol = self.stream.symbol.clone();
        info!(%symbol, "Feed supervisor started");

        loop {
            let result = tokio::select! {
                result = client.run() => result,
                _ = self.cancel.cancelled() => {
                    info!(%symbol, "Feed supervisor cancelled");
                    return;
                }
            };

            match result {
                Ok(()) => info!(%symbol, "WebSocket client disconnected"),
                Err(FeedError::ConsumerGone) => {
                    info!(%symbol, "Feed consumer gone, stopping supervisor");
                    return;
                },
                Err(e) => {
                    warn!(error = %e, %symbol, "WebSocket connection lost");
                    self.event_bus.send(DaemonEvent::FeedFault(e.to_string()));
                },
            }

            client = match self.reconnect().await {
                Some(client) => client,
                None => return,
            };
        }
    }

    /// Retry until connected. `None` when cancelled or nobody listens anymore.
    async fn reconnect(&self) -> Option<BinanceKlineClient> {
        let mut delay = self.reconnect.initial_delay;
        let mut attempt: u32 = 0;

        loop {
            if self.sender.is_closed() {
                return None;
            }
            if !self.sleep_or_cancel(delay).await {
                return None;
            }

            attempt += 1;
            match BinanceKlineClient::connect(self.stream.clone(), self.sender.clone()).await {
                Ok(client) => {
                    info!(symbol = %self.stream.symbol, attempt, "Reconnected to market data feed");
                    return Some(client);
                },
                Err(e) => {
                    error!(
                        error = %e,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        "Reconnect failed"
                    );
                    self.event_bus.send(DaemonEvent::FeedFault(e.to_string()));
                    delay = self.reconnect.next_delay(delay);
                },
            }
        }
    }

    /// Sleep for `delay`; false if cancelled first.
    async fn sleep_or_cancel(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}
