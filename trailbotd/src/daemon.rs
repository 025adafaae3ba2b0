//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together all components:
//! - Market Data (supervised kline feed)
//! - Trading Engine (signal, entry, trailing, exit)
//! - Trade Journal (one line per closed trade)
//! - Event Bus (internal communication)
//!
//! # Lifecycle
//!
//! 1. Connect the feed (a failed first connection is fatal)
//! 2. Main event loop: one closed bar at a time through the engine
//! 3. Stop on SIGINT, cancellation or end of feed
//! 4. Log the session summary

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use trailbot_connectors::FeedMessage;
use trailbot_domain::{BarEvent, TradeRecord};
use trailbot_engine::{BarOutcome, TradingEngine};
use trailbot_store::TradeJournal;

use crate::config::Config;
use crate::error::DaemonResult;
use crate::event_bus::{DaemonEvent, EventBus};
use crate::market_data::MarketDataManager;
use crate::session::SessionSummary;

// =============================================================================
// Daemon
// =============================================================================

/// The main trailbot daemon.
pub struct Daemon<J: TradeJournal + 'static> {
    /// Configuration
    config: Config,
    /// Position state machine, owned by the event loop
    engine: TradingEngine,
    /// Closed trade sink
    journal: Arc<J>,
    /// Event bus
    event_bus: Arc<EventBus>,
    /// Stops the event loop and the feed supervisor
    cancel: CancellationToken,
    /// Totals reported on shutdown
    summary: SessionSummary,
}

impl<J: TradeJournal + 'static> Daemon<J> {
    /// Create a new daemon with a flat engine.
    pub fn new(config: Config, journal: Arc<J>, event_bus: Arc<EventBus>) -> DaemonResult<Self> {
        let engine = TradingEngine::new(config.strategy.clone())?;

        Ok(Self {
            config,
            engine,
            journal,
            event_bus,
            cancel: CancellationToken::new(),
            summary: SessionSummary::default(),
        })
    }

    /// Token that stops the daemon when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the daemon against the live feed.
    ///
    /// Blocks until shutdown is requested (SIGINT or cancellation).
    pub async fn run(self) -> DaemonResult<SessionSummary> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            symbol = %self.config.strategy.symbol,
            stream = %self.config.feed.stream.stream_url(),
            "Starting trailbot daemon"
        );

        let manager = MarketDataManager::new(self.config.feed.clone(), self.event_bus.clone());
        let (feed, feed_task) = manager.start(self.cancel.clone()).await?;
        info!("WebSocket connected, simulation started");

        let summary = self.run_with_feed(feed).await?;

        if let Err(e) = feed_task.await {
            error!(error = %e, "Feed supervisor task failed");
        }

        Ok(summary)
    }

    /// Run the event loop over any source of feed messages.
    ///
    /// Returns when the source is exhausted, on SIGINT, or on cancellation.
    pub async fn run_with_feed(
        mut self,
        mut feed: mpsc::Receiver<FeedMessage>,
    ) -> DaemonResult<SessionSummary> {
        let cancel = self.cancel.clone();

        info!("Entering main event loop");
        loop {
            tokio::select! {
                message = feed.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => {
                        info!("Market data feed ended");
                        break;
                    }
                },

                // Handle shutdown signals
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }

                _ = cancel.cancelled() => {
                    info!("Cancellation requested");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    /// Apply the per-message policy: bars go to the engine, malformed
    /// messages and rejected bars are logged and skipped.
    async fn handle_message(&mut self, message: FeedMessage) {
        match message {
            Ok(bar) => self.handle_bar(bar).await,
            Err(e) if e.is_recoverable_in_place() => {
                warn!(error = %e, "Skipping malformed market data message");
            },
            Err(e) => {
                warn!(error = %e, "Market data feed fault");
                self.event_bus.send(DaemonEvent::FeedFault(e.to_string()));
            },
        }
    }

    async fn handle_bar(&mut self, bar: BarEvent) {
        let outcome = match self.engine.process_bar(&bar) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, symbol = %bar.symbol, close = %bar.close, "Bar rejected");
                return;
            },
        };

        if outcome == BarOutcome::Ignored {
            return;
        }

        debug!(symbol = %bar.symbol, close = %bar.close, "Bar processed");
        self.event_bus.send(DaemonEvent::BarClosed(bar));

        match outcome {
            BarOutcome::Entered(position) => {
                info!(
                    position_id = %position.id,
                    side = %position.side,
                    entry_price = %position.entry_price,
                    quantity = %position.quantity.as_decimal(),
                    "Position opened"
                );
                self.event_bus.send(DaemonEvent::PositionOpened {
                    symbol: self.config.strategy.symbol.clone(),
                    position,
                });
            },
            BarOutcome::Trailed(levels) => {
                if let Some(position) = self.engine.position().as_open() {
                    self.event_bus.send(DaemonEvent::LevelsTrailed {
                        position_id: position.id,
                        side: position.side,
                        levels,
                    });
                }
            },
            BarOutcome::Exited { record, trailed } => {
                if let Some(levels) = trailed {
                    self.event_bus.send(DaemonEvent::LevelsTrailed {
                        position_id: record.position_id,
                        side: record.side,
                        levels,
                    });
                }
                self.record_trade(record).await;
            },
            BarOutcome::Ignored | BarOutcome::NoSignal | BarOutcome::Held => {},
        }
    }

    /// Journal and publish a closed trade. Journal failures do not stop trading.
    async fn record_trade(&mut self, record: TradeRecord) {
        self.summary.record(&record);

        info!(
            position_id = %record.position_id,
            reason = %record.exit_reason,
            exit_price = %record.exit_price,
            pnl = %record.pnl,
            "Position closed"
        );

        if let Err(e) = self.journal.append(&record).await {
            error!(error = %e, line = %record.journal_line(), "Failed to append trade to journal");
        }

        self.event_bus.send(DaemonEvent::TradeClosed(record));
    }

    /// Graceful shutdown.
    async fn shutdown(mut self) -> DaemonResult<SessionSummary> {
        info!("Initiating graceful shutdown");

        // Stops the feed supervisor
        self.cancel.cancel();

        self.summary.position_open = !self.engine.position().is_flat();
        let journal_entries = self.journal.len().await?;

        info!(
            trades = self.summary.trades,
            wins = self.summary.wins,
            losses = self.summary.losses,
            cumulative_pnl = %self.summary.cumulative_pnl,
            position_open = self.summary.position_open,
            journal_entries,
            "Session summary"
        );

        self.event_bus.send(DaemonEvent::Shutdown);
        Ok(self.summary)
    }
}

// =============================================================================
// Tests
// =============================================================================
