use crate::store::StateStore;
use futures::StreamExt;
use log::*;
use scoreboard_common::push::PushMessage;
use thiserror::Error;
use tokio::{
    net::TcpStream,
    task::{self, JoinHandle},
    time::{Duration, sleep},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("push endpoint must be a ws:// or wss:// URL, got {0:?}")]
    InvalidUrl(String),
    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Start,
    Opened,
    Closed,
    Error,
    BackoffElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Connect,
    ScheduleReconnect(Duration),
    Nothing,
}

/// The connection lifecycle, free of any I/O.
///
/// Losing a connection schedules exactly one reconnect after a fixed delay,
/// however many error and close events report that loss.
#[derive(Debug, Clone)]
pub struct ReconnectMachine {
    state: ConnectionState,
    delay: Duration,
    reconnect_pending: bool,
}

impl ReconnectMachine {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            delay,
            reconnect_pending: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn handle(&mut self, event: TransportEvent) -> TransportAction {
        use ConnectionState::*;
        use TransportEvent::*;

        let (next, action) = match (self.state, event) {
            (Disconnected, Start) if !self.reconnect_pending => {
                (Connecting, TransportAction::Connect)
            }
            (Disconnected, BackoffElapsed) if self.reconnect_pending => {
                self.reconnect_pending = false;
                (Connecting, TransportAction::Connect)
            }
            (Connecting, Opened) => (Connected, TransportAction::Nothing),
            (Connecting | Connected, Closed | Error) => {
                self.reconnect_pending = true;
                (
                    Disconnected,
                    TransportAction::ScheduleReconnect(self.delay),
                )
            }
            (state, _) => (state, TransportAction::Nothing),
        };

        if next != self.state {
            debug!("Push connection {:?} -> {next:?} on {event:?}", self.state);
        }
        self.state = next;
        action
    }
}

type PushSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Owns the live push connection and keeps the store fed from it. The
/// background task stops when this is dropped.
#[derive(Debug)]
pub struct PushTransport {
    join: JoinHandle<()>,
}

impl PushTransport {
    pub fn spawn(
        url: &str,
        reconnect_delay: Duration,
        store: StateStore,
    ) -> Result<Self, TransportError> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }

        let join = task::spawn(run_loop(url.to_string(), reconnect_delay, store));
        Ok(Self { join })
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for PushTransport {
    fn drop(&mut self) {
        self.join.abort();
    }
}

async fn run_loop(url: String, reconnect_delay: Duration, store: StateStore) {
    let mut machine = ReconnectMachine::new(reconnect_delay);
    let mut action = machine.handle(TransportEvent::Start);

    loop {
        action = match action {
            TransportAction::Connect => {
                info!("Connecting to push endpoint {url}");
                match connect(&url).await {
                    Ok(socket) => {
                        machine.handle(TransportEvent::Opened);
                        info!("Push connection open");
                        store.set_connected(true);
                        let event = read_until_closed(socket, &store).await;
                        store.set_connected(false);
                        machine.handle(event)
                    }
                    Err(e) => {
                        warn!("Failed to connect to {url}: {e}");
                        machine.handle(TransportEvent::Error)
                    }
                }
            }
            TransportAction::ScheduleReconnect(delay) => {
                info!("Reconnecting in {delay:?}");
                sleep(delay).await;
                machine.handle(TransportEvent::BackoffElapsed)
            }
            TransportAction::Nothing => {
                error!("Push transport stalled in {:?}", machine.state());
                return;
            }
        };
    }
}

async fn connect(url: &str) -> Result<PushSocket, TransportError> {
    let (socket, _) = connect_async(url).await?;
    Ok(socket)
}

async fn read_until_closed(mut socket: PushSocket, store: &StateStore) -> TransportEvent {
    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => handle_text(text.as_str(), store),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => handle_text(text, store),
                Err(e) => warn!("Dropping non-UTF-8 binary push: {e}"),
            },
            Ok(Message::Close(frame)) => {
                info!("Push connection closed by authority: {frame:?}");
                return TransportEvent::Closed;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Push connection error: {e}");
                return TransportEvent::Error;
            }
        }
    }
    info!("Push connection ended");
    TransportEvent::Closed
}

fn handle_text(text: &str, store: &StateStore) {
    match PushMessage::decode(text) {
        Ok(message) => {
            store.apply(message);
        }
        Err(e) => warn!("{e}"),
    }
}
