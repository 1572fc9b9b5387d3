//! tokio-tungstenite transport.
//!
//! Each [`WsTransport::open`] spawns one task that owns the socket. The task
//! connects, then runs a `select!` loop over the command channel and the
//! read half of the stream:
//!
//! - `Receive` arms the read branch for exactly one data frame
//! - `Send` writes a text frame, reporting failures as events
//! - `Close` sends a close frame and drains until the peer answers
//!
//! Ping/Pong are answered by tungstenite while reading and never surfaced.
//! Commands issued before the handshake completes are queued and applied
//! in order once the socket is open. A send that arrives after the task has
//! finished is reported as [`TransportEvent::SendFailed`].

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::{CloseCode, EventSink, Frame, Transport, TransportEvent, TransportHandle};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsSink = futures_util::stream::SplitSink<WsStream, Message>;

/// Internal commands for the socket task.
#[derive(Debug)]
enum SocketCommand {
    /// Write a text frame.
    Send(String),
    /// Deliver the next data frame.
    Receive,
    /// Start the closing handshake.
    Close {
        code: CloseCode,
        reason: Option<String>,
    },
}

// ============================================================================
// WsTransport
// ============================================================================

/// [`Transport`] backed by tokio-tungstenite.
///
/// Supports `ws://` and `wss://` (native TLS) endpoints.
#[derive(Debug, Clone)]
pub struct WsTransport {
    /// Runtime that socket tasks are spawned on.
    runtime: Handle,
}

impl WsTransport {
    /// Creates a transport bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if called outside a tokio runtime.
    pub fn new() -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("WsTransport must be created inside a tokio runtime"))?;
        Ok(Self { runtime })
    }

    /// Creates a transport that spawns socket tasks on `runtime`.
    #[inline]
    #[must_use]
    pub fn with_runtime(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Transport for WsTransport {
    fn open(&self, url: &Url, events: EventSink) -> Box<dyn TransportHandle> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        debug!(connection = %events.connection(), %url, "Opening WebSocket");
        self.runtime
            .spawn(run_socket(url.clone(), command_rx, events.clone()));

        Box::new(WsHandle { command_tx, events })
    }
}

// ============================================================================
// WsHandle
// ============================================================================

/// Handle to one socket task. Dropping it closes the socket.
struct WsHandle {
    command_tx: mpsc::UnboundedSender<SocketCommand>,
    events: EventSink,
}

impl WsHandle {
    fn command(&self, command: SocketCommand) {
        if let Err(mpsc::error::SendError(command)) = self.command_tx.send(command) {
            trace!(connection = %self.events.connection(), "Socket task already finished");
            report_unsent(&command, &self.events);
        }
    }
}

impl TransportHandle for WsHandle {
    fn send(&self, text: String) {
        self.command(SocketCommand::Send(text));
    }

    fn receive(&self) {
        self.command(SocketCommand::Receive);
    }

    fn close(&self, code: CloseCode, reason: Option<String>) {
        self.command(SocketCommand::Close { code, reason });
    }
}

/// Reports a send that never reached the socket.
fn report_unsent(command: &SocketCommand, events: &EventSink) {
    if let SocketCommand::Send(text) = command {
        debug!(len = text.len(), "Send after socket closed");
        events.emit(TransportEvent::SendFailed(Error::ConnectionClosed.to_string()));
    }
}

// ============================================================================
// Socket Task
// ============================================================================

/// Connects, runs the socket loop, and always finishes with one terminal event.
async fn run_socket(
    url: Url,
    mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
    events: EventSink,
) {
    let connect = connect_async(url.as_str());
    tokio::pin!(connect);

    // Commands issued before the handshake completes are applied once open.
    let mut pending = Vec::new();
    let ws_stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, response)) => {
                    info!(connection = %events.connection(), status = %response.status(), "WebSocket connection established");
                    break stream;
                }
                Err(e) => {
                    warn!(connection = %events.connection(), error = %e, "WebSocket connect failed");
                    events.emit(TransportEvent::OpenFailed(Error::from(e).to_string()));
                    return;
                }
            },
            command = command_rx.recv() => match command {
                Some(command) => pending.push(command),
                None => {
                    debug!(connection = %events.connection(), "Handle dropped before open");
                    return;
                }
            }
        }
    };

    events.emit(TransportEvent::Opened);

    let (code, reason) = run_open_loop(ws_stream, pending, &mut command_rx, &events).await;

    // Sends queued behind the close never reach the peer.
    command_rx.close();
    while let Ok(command) = command_rx.try_recv() {
        report_unsent(&command, &events);
    }

    info!(connection = %events.connection(), ?code, "WebSocket connection closed");
    events.emit(TransportEvent::Closed { code, reason });
}

/// Per-connection loop state.
#[derive(Debug, Default)]
struct LoopState {
    armed: bool,
    closing: Option<(CloseCode, Option<String>)>,
    commands_open: bool,
}

impl LoopState {
    /// Applies one command, or the end of the command stream.
    async fn apply(
        &mut self,
        command: Option<SocketCommand>,
        ws_write: &mut WsSink,
        events: &EventSink,
    ) {
        match command {
            Some(SocketCommand::Receive) => self.armed = true,

            Some(SocketCommand::Send(text)) => {
                send_text(ws_write, text, events).await;
            }

            Some(SocketCommand::Close { code, reason }) => {
                if self.closing.is_none() {
                    start_close(ws_write, code, reason.clone()).await;
                    self.closing = Some((code, reason));
                }
            }

            None => {
                debug!("Handle dropped, closing socket");
                self.commands_open = false;
                if self.closing.is_none() {
                    start_close(ws_write, CloseCode::Away, None).await;
                    self.closing = Some((CloseCode::Away, None));
                }
            }
        }
    }

    /// Close code and reason from our own close, if one was started.
    fn finish(&mut self) -> (Option<CloseCode>, Option<String>) {
        self.closing
            .take()
            .map_or((None, None), |(code, reason)| (Some(code), reason))
    }
}

/// Drives an open socket until it closes. Returns the close code and reason.
async fn run_open_loop(
    ws_stream: WsStream,
    pending: Vec<SocketCommand>,
    command_rx: &mut mpsc::UnboundedReceiver<SocketCommand>,
    events: &EventSink,
) -> (Option<CloseCode>, Option<String>) {
    let (mut ws_write, mut ws_read) = ws_stream.split();

    let mut state = LoopState {
        commands_open: true,
        ..LoopState::default()
    };
    for command in pending {
        state.apply(Some(command), &mut ws_write, events).await;
    }

    let outcome = loop {
        tokio::select! {
            message = ws_read.next(), if state.armed || state.closing.is_some() => {
                match message {
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Close frame received");
                        break match frame {
                            Some(frame) => {
                                let reason = frame.reason.to_string();
                                (
                                    Some(CloseCode::from(u16::from(frame.code))),
                                    (!reason.is_empty()).then_some(reason),
                                )
                            }
                            None => state.finish(),
                        };
                    }

                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        trace!("Control frame handled by tungstenite");
                    }

                    Some(Ok(message)) if state.closing.is_some() => {
                        trace!(len = message.len(), "Dropping frame while closing");
                    }

                    Some(Ok(message)) => {
                        state.armed = false;
                        events.emit(TransportEvent::Received(Ok(classify(message))));
                    }

                    Some(Err(e)) if is_terminal(&e) => {
                        if state.closing.is_none() {
                            warn!(error = %e, "WebSocket read failed");
                            events.emit(TransportEvent::Received(Err(Error::from(e).to_string())));
                        }
                        break state.finish();
                    }

                    Some(Err(e)) => {
                        state.armed = false;
                        events.emit(TransportEvent::Received(Err(Error::from(e).to_string())));
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break state.finish();
                    }
                }
            }

            command = command_rx.recv(), if state.commands_open => {
                state.apply(command, &mut ws_write, events).await;
            }
        }
    };

    if let Err(e) = ws_write.close().await {
        trace!(error = %e, "Socket already shut down");
    }

    outcome
}

/// Writes one text frame, reporting failure through the event sink.
async fn send_text(ws_write: &mut WsSink, text: String, events: &EventSink) {
    let len = text.len();
    match ws_write.send(Message::Text(text.into())).await {
        Ok(()) => trace!(len, "Text frame sent"),
        Err(e) => {
            warn!(error = %e, "Failed to send text frame");
            events.emit(TransportEvent::SendFailed(Error::from(e).to_string()));
        }
    }
}

/// Sends a close frame.
async fn start_close(ws_write: &mut WsSink, code: CloseCode, reason: Option<String>) {
    let frame = CloseFrame {
        code: WsCloseCode::from(u16::from(code)),
        reason: reason.unwrap_or_default().into(),
    };

    if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Failed to send close frame");
    }
}

/// Maps an inbound data message to a [`Frame`].
fn classify(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.to_string()),
        Message::Binary(data) => Frame::Binary(data.to_vec()),
        Message::Ping(_) => Frame::Unsupported("ping".to_string()),
        Message::Pong(_) => Frame::Unsupported("pong".to_string()),
        Message::Close(_) => Frame::Unsupported("close".to_string()),
        Message::Frame(_) => Frame::Unsupported("raw frame".to_string()),
    }
}

/// Returns `true` if the socket cannot be read again after `error`.
fn is_terminal(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed | WsError::AlreadyClosed | WsError::Io(_) | WsError::Protocol(_)
    )
}

// ============================================================================
// Tests
// ============================================================================
