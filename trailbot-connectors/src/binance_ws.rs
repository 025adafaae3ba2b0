//! Binance WebSocket Kline Client
//!
//! Connects to the Binance kline stream for one symbol and interval.
//! Normalizes kline messages to canonical [`BarEvent`]s and forwards them,
//! together with decode failures, over an mpsc channel.
//!
//! Reconnection is the caller's job: [`BinanceKlineClient::run`] returns as
//! soon as the connection is unusable.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::StreamExt;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message as WebSocketMessage, WebSocketStream};
use tracing::{debug, error, info, warn};
use trailbot_domain::{BarEvent, Symbol};

/// Type alias for the WebSocket stream (with auto TLS).
type WsStream = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Binance USD-M futures WebSocket base URL.
pub const BINANCE_FUTURES_WS_URL: &str = "wss://fstream.binance.com/ws";

/// Default kline interval.
pub const DEFAULT_KLINE_INTERVAL: &str = "1m";

/// WebSocket read timeout (in seconds).
const READ_TIMEOUT_SECS: u64 = 30;

/// Errors reported by the kline feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Failed to connect to WebSocket.
    #[error("Failed to connect to WebSocket: {0}")]
    ConnectionFailed(String),

    /// Transport error while reading.
    #[error("Failed to receive message: {0}")]
    ReceiveError(String),

    /// Message could not be decoded into a bar.
    #[error("Invalid message format: {0}")]
    Decode(String),

    /// Stream ended or the server closed the connection.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// Timed out waiting for message.
    #[error("Timed out waiting for message")]
    Timeout,

    /// Nobody is receiving feed messages anymore.
    #[error("Feed consumer dropped")]
    ConsumerGone,
}

impl FeedError {
    /// Whether the connection is still usable after this error.
    ///
    /// Only decode failures qualify: the offending message is dropped and the
    /// stream keeps going.
    pub fn is_recoverable_in_place(&self) -> bool {
        matches!(self, FeedError::Decode(_))
    }
}

/// One item delivered by the feed.
pub type FeedMessage = Result<BarEvent, FeedError>;

/// Where and what to subscribe.
#[derive(Debug, Clone, PartialEq)]
pub struct KlineStreamConfig {
    /// WebSocket base URL
    pub base_url: String,
    /// Symbol to subscribe to
    pub symbol: Symbol,
    /// Kline interval (e.g., "1m")
    pub interval: String,
    /// Maximum silence before the connection is considered dead
    pub read_timeout: Duration,
}

impl KlineStreamConfig {
    /// Futures stream for `symbol` with the default interval and timeout.
    pub fn new(symbol: Symbol) -> Self {
        Self {
            base_url: BINANCE_FUTURES_WS_URL.to_string(),
            symbol,
            interval: DEFAULT_KLINE_INTERVAL.to_string(),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }

    /// Full stream URL, e.g. `wss://fstream.binance.com/ws/solusdt@kline_1m`.
    pub fn stream_url(&self) -> String {
        format!(
            "{}/{}@kline_{}",
            self.base_url.trim_end_matches('/'),
            self.symbol.as_pair().to_lowercase(),
            self.interval
        )
    }
}

/// Binance WebSocket client for kline data.
pub struct BinanceKlineClient {
    /// Stream settings.
    config: KlineStreamConfig,
    /// WebSocket stream (with TLS wrapper).
    ws_stream: WsStream,
    /// Sender for feed messages.
    sender: mpsc::Sender<FeedMessage>,
    /// Whether the client is connected.
    connected: bool,
}

impl BinanceKlineClient {
    /// Connect to the kline stream.
    ///
    /// # Arguments
    ///
    /// * `config` - Stream URL, symbol, interval and read timeout
    /// * `sender` - Channel receiving decoded bars and decode failures
    pub async fn connect(
        config: KlineStreamConfig,
        sender: mpsc::Sender<FeedMessage>,
    ) -> Result<Self, FeedError> {
        let url = config.stream_url();

        info!(%url, "Connecting to Binance WebSocket");

        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;

        info!(symbol = %config.symbol, interval = %config.interval, "Connected to Binance WebSocket");

        Ok(Self {
            config,
            ws_stream,
            sender,
            connected: true,
        })
    }

    /// Run the client message loop.
    ///
    /// Returns when the connection is closed, times out or fails. Decode
    /// failures are forwarded to the consumer and do not end the loop.
    pub async fn run(&mut self) -> Result<(), FeedError> {
        while self.connected {
            match timeout(self.config.read_timeout, self.next_message()).await {
                Ok(Ok(Some(msg))) => self.handle_message(msg).await?,
                Ok(Ok(None)) => {
                    warn!("WebSocket stream closed");
                    self.connected = false;
                    return Err(FeedError::ChannelClosed);
                },
                Ok(Err(e)) => {
                    error!(error = %e, "Error reading from WebSocket");
                    self.connected = false;
                    return Err(e);
                },
                Err(_) => {
                    error!(timeout_secs = self.config.read_timeout.as_secs(), "Timeout waiting for message");
                    self.connected = false;
                    return Err(FeedError::Timeout);
                },
            }
        }

        Ok(())
    }

    /// Read the next message from the WebSocket stream.
    async fn next_message(&mut self) -> Result<Option<WebSocketMessage>, FeedError> {
        match self.ws_stream.next().await {
            Some(Ok(msg)) => Ok(Some(msg)),
            Some(Err(e)) => Err(FeedError::ReceiveError(e.to_string())),
            None => Ok(None),
        }
    }

    /// Handle a single WebSocket message.
    async fn handle_message(&mut self, msg: WebSocketMessage) -> Result<(), FeedError> {
        match msg {
            WebSocketMessage::Text(text) => self.handle_text_message(&text).await?,
            WebSocketMessage::Ping(_) => {
                // Pong is queued by tungstenite on read
                debug!("Received ping from Binance");
            },
            WebSocketMessage::Close(frame) => {
                self.connected = false;
                warn!(?frame, "WebSocket connection closed by server");
                return Err(FeedError::ChannelClosed);
            },
            _ => {},
        }

        Ok(())
    }

    /// Decode a text message and forward the result.
    ///
    /// Only a dropped consumer is an error here.
    async fn handle_text_message(&self, text: &str) -> Result<(), FeedError> {
        match decode_kline_message(text) {
            Ok(Some(bar)) => {
                debug!(
                    symbol = %bar.symbol,
                    close = %bar.close,
                    closed = bar.is_closed,
                    "Received kline"
                );
                self.publish(Ok(bar)).await
            },
            Ok(None) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Dropping malformed kline message");
                self.publish(Err(e)).await
            },
        }
    }

    async fn publish(&self, message: FeedMessage) -> Result<(), FeedError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| FeedError::ConsumerGone)
    }

    /// Check if the client is still connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Decode a raw kline stream message.
///
/// # Returns
///
/// * `Ok(Some(bar))` - A kline update (closed or still forming)
/// * `Ok(None)` - A message without kline payload (e.g. subscription ack)
/// * `Err(FeedError::Decode)` - Invalid JSON, missing or non-numeric fields
pub fn decode_kline_message(text: &str) -> Result<Option<BarEvent>, FeedError> {
    let json: Value = serde_json::from_str(text).map_err(|e| FeedError::Decode(e.to_string()))?;

    let Some(payload) = json.get("k") else {
        return Ok(None);
    };

    let kline: BinanceKline = serde_json::from_value(payload.clone())
        .map_err(|e| FeedError::Decode(format!("Invalid kline: {}", e)))?;

    let symbol = Symbol::from_pair(&kline.symbol).map_err(|e| FeedError::Decode(e.to_string()))?;
    let close_time: DateTime<Utc> = DateTime::from_timestamp_millis(kline.close_time)
        .ok_or_else(|| FeedError::Decode(format!("Invalid close time: {}", kline.close_time)))?;

    Ok(Some(BarEvent::new(
        symbol,
        kline.close,
        kline.high,
        kline.low,
        close_time,
        kline.is_closed,
    )))
}

// =============================================================================
// Binance-Specific Types (internal to connector)
// =============================================================================

/// Kline payload (the `k` object of a kline stream event).
#[derive(Debug, Clone, serde::Deserialize)]
struct BinanceKline {
    /// Symbol
    #[serde(rename = "s")]
    symbol: String,
    /// Kline close time (ms)
    #[serde(rename = "T")]
    close_time: i64,
    /// Close price
    #[serde(rename = "c")]
    close: Decimal,
    /// High price
    #[serde(rename = "h")]
    high: Decimal,
    /// Low price
    #[serde(rename = "l")]
    low: Decimal,
    /// Is this kline closed?
    #[serde(rename = "x")]
    is_closed: bool,
}

// =============================================================================
// Tests
// =============================================================================
