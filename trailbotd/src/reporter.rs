//! Console reporter.
//!
//! Subscribes to the event bus and logs one human-readable line per event:
//! every closed price, entries, trailing moves and completed trades.

use tokio::task::JoinHandle;
use tracing::{info, warn};
use trailbot_domain::trade::{two_places, JOURNAL_TIME_FORMAT};

use crate::event_bus::{DaemonEvent, EventBus, EventReceiver};

/// Logs daemon events until the bus shuts down.
pub struct ConsoleReporter {
    receiver: EventReceiver,
}

impl ConsoleReporter {
    /// Subscribe to `event_bus`. Only events sent after this call are reported.
    pub fn new(event_bus: &EventBus) -> Self {
        Self {
            receiver: event_bus.subscribe(),
        }
    }

    /// Spawn the reporting task.
    ///
    /// The task ends on `DaemonEvent::Shutdown` or when the bus is dropped,
    /// yielding the number of lines it reported.
    pub fn spawn(self) -> JoinHandle<usize> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> usize {
        let mut reported = 0;

        while let Some(event) = self.receiver.recv().await {
            match event {
                Ok(DaemonEvent::Shutdown) => break,
                Ok(DaemonEvent::FeedFault(reason)) => {
                    warn!(%reason, "Market data feed fault");
                    reported += 1;
                },
                Ok(event) => {
                    if let Some(line) = console_line(&event) {
                        info!("{}", line);
                        reported += 1;
                    }
                },
                Err(lag_msg) => warn!(%lag_msg, "Console reporter lagged"),
            }
        }

        reported
    }
}

/// Console text for an event, if it has one.
pub fn console_line(event: &DaemonEvent) -> Option<String> {
    match event {
        DaemonEvent::BarClosed(bar) => Some(format!(
            "[{}] {} closed price: {}",
            bar.close_time.format(JOURNAL_TIME_FORMAT),
            bar.symbol,
            two_places(bar.close)
        )),
        DaemonEvent::PositionOpened { symbol, position } => Some(format!(
            "ENTER {} {} @ {} | qty: {} | TP: {}, SL: {}",
            position.side,
            symbol,
            two_places(position.entry_price.as_decimal()),
            position.quantity.as_decimal(),
            two_places(position.initial.take_profit.as_decimal()),
            two_places(position.initial.stop_loss.as_decimal()),
        )),
        DaemonEvent::LevelsTrailed { side, levels, .. } => Some(format!(
            "[{}] TP moved to {} | SL moved to {}",
            side,
            two_places(levels.take_profit.as_decimal()),
            two_places(levels.stop_loss.as_decimal()),
        )),
        DaemonEvent::TradeClosed(record) => Some(record.journal_line()),
        DaemonEvent::FeedFault(reason) => Some(format!("Feed fault: {}", reason)),
        DaemonEvent::Shutdown => None,
    }
}
