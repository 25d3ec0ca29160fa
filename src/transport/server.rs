//! Host-side WebSocket server.
//!
//! The host binds before the browser is told to navigate and keeps
//! accepting for the whole session: every page reload reconnects as a new
//! socket, which replaces the previous one.
//!
//! # Connection Flow
//!
//! 1. Bind `127.0.0.1:0` (random port), hand `ws_url()` to the bootstrap
//! 2. Client connects, WebSocket upgrade
//! 3. Client sends `ready`; the host session resynchronizes
//! 4. Heartbeats every interval; a silent client is dropped as stale

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::protocol::{ClientMessage, HostMessage, WireMessage};

use super::connection::{Link, LinkEvent};
use super::event::{EventReceiver, EventSender, TransportEvent};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for the WebSocket upgrade of an accepted socket.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default heartbeat interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Default silence after which the client is considered gone.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(45);

// ============================================================================
// HeartbeatConfig
// ============================================================================

/// Heartbeat timing for the host transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Time between heartbeats.
    pub interval: Duration,
    /// Silence tolerated before dropping the client.
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }
}

// ============================================================================
// HostInner
// ============================================================================

/// Shared state between the handle, accept loop and heartbeat task.
struct HostInner {
    port: u16,
    link: Mutex<Option<Link<HostMessage>>>,
    last_seen: Mutex<Instant>,
    shutdown: AtomicBool,
    /// Taken on shutdown so the owner's receiver ends.
    events: Mutex<Option<EventSender<ClientMessage>>>,
}

// ============================================================================
// HostTransport
// ============================================================================

/// Host half of the duplex channel.
///
/// Exactly one client is attached at a time; a newer connection replaces
/// the older one.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use inspector_link::transport::{HeartbeatConfig, HostTransport};
///
/// let (host, mut events) =
///     HostTransport::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, HeartbeatConfig::default()).await?;
/// let ws_url = host.ws_url();
///
/// // Inject the client with ws_url...
///
/// while let Some(event) = events.recv().await {
///     // ...
/// }
/// ```
pub struct HostTransport {
    inner: Arc<HostInner>,
    tasks: Vec<JoinHandle<()>>,
}

// ============================================================================
// HostTransport - Constructor
// ============================================================================

impl HostTransport {
    /// Binds the server and starts the accept loop and heartbeat task.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if binding fails.
    pub async fn bind(
        ip: IpAddr,
        port: u16,
        heartbeat: HeartbeatConfig,
    ) -> Result<(Self, EventReceiver<ClientMessage>)> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        debug!(port = actual_port, "WebSocket server bound");

        let (events, events_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(HostInner {
            port: actual_port,
            link: Mutex::new(None),
            last_seen: Mutex::new(Instant::now()),
            shutdown: AtomicBool::new(false),
            events: Mutex::new(Some(events)),
        });

        let accept_task = tokio::spawn(HostInner::accept_loop(Arc::clone(&inner), listener));
        let heartbeat_task = tokio::spawn(HostInner::heartbeat_loop(Arc::clone(&inner), heartbeat));

        info!(port = actual_port, "Host transport started");

        Ok((
            Self {
                inner,
                tasks: vec![accept_task, heartbeat_task],
            },
            events_rx,
        ))
    }
}

// ============================================================================
// HostTransport - Public API
// ============================================================================

impl HostTransport {
    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.port
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.inner.port)
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), self.inner.port)
    }

    /// Returns `true` if a client is attached.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.link.lock().is_some()
    }

    /// Sends a message to the attached client.
    ///
    /// Returns `false` and drops the message when no client is attached.
    pub fn send(&self, message: &HostMessage) -> bool {
        let link = self.inner.link.lock();
        match link.as_ref() {
            Some(link) => link.send(message),
            None => {
                trace!(tag = message.tag(), "No client attached, dropping message");
                false
            }
        }
    }

    /// Stops accepting, closes the attached client and ends the event stream.
    pub fn shutdown(&mut self) {
        if self.inner.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let link = self.inner.link.lock().take();
        if let Some(link) = link {
            link.close();
        }
        self.inner.events.lock().take();
        info!(port = self.inner.port, "Host transport shut down");
    }
}

impl Drop for HostTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// HostInner - Tasks
// ============================================================================

impl HostInner {
    fn emit(&self, event: TransportEvent<ClientMessage>) {
        if let Some(events) = self.events.lock().as_ref() {
            let _ = events.send(event);
        }
    }

    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Accepts clients for the lifetime of the transport.
    async fn accept_loop(inner: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(?addr, "TCP connection accepted");
                    tokio::spawn(Self::attach(Arc::clone(&inner), stream, addr));
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    inner.emit(TransportEvent::Error(e.to_string()));
                }
            }

            if inner.shutdown.load(Ordering::SeqCst) {
                break;
            }
        }
    }

    /// Upgrades an accepted socket and makes it the current client.
    async fn attach(inner: Arc<Self>, stream: TcpStream, addr: SocketAddr) {
        let ws_stream = match timeout(HANDSHAKE_TIMEOUT, accept_async(stream)).await {
            Ok(Ok(ws_stream)) => ws_stream,
            Ok(Err(e)) => {
                warn!(?addr, error = %e, "WebSocket upgrade failed");
                inner.emit(TransportEvent::Error(format!("WebSocket upgrade failed: {e}")));
                return;
            }
            Err(_) => {
                warn!(?addr, "WebSocket upgrade timed out");
                return;
            }
        };

        if inner.shutdown.load(Ordering::SeqCst) {
            return;
        }

        let (link, link_rx) = Link::<HostMessage>::spawn::<_, ClientMessage>(ws_stream);
        let link_id = link.id();

        let previous = inner.link.lock().replace(link);
        if let Some(previous) = previous {
            debug!(link = link_id, "Replacing previous client");
            previous.close();
        }
        inner.touch();

        info!(?addr, port = inner.port, link = link_id, "Client connected");
        inner.emit(TransportEvent::Connected);

        Self::supervise(inner, link_id, link_rx).await;
    }

    /// Forwards link events until the link closes.
    async fn supervise(
        inner: Arc<Self>,
        link_id: u64,
        mut link_rx: mpsc::UnboundedReceiver<LinkEvent<ClientMessage>>,
    ) {
        while let Some(event) = link_rx.recv().await {
            match event {
                LinkEvent::Message(message) => {
                    inner.touch();
                    inner.emit(TransportEvent::Message(message));
                }

                LinkEvent::Malformed(e) => {
                    inner.touch();
                    inner.emit(TransportEvent::Error(e.to_string()));
                }

                LinkEvent::Closed { clean } => {
                    let current = {
                        let mut slot = inner.link.lock();
                        if slot.as_ref().is_some_and(|link| link.id() == link_id) {
                            *slot = None;
                            true
                        } else {
                            false
                        }
                    };

                    if current {
                        debug!(link = link_id, clean, "Client disconnected");
                        inner.emit(TransportEvent::Disconnected { clean });
                    } else {
                        trace!(link = link_id, "Superseded client closed");
                    }
                    return;
                }
            }
        }
    }

    /// Sends heartbeats and drops a silent client.
    async fn heartbeat_loop(inner: Arc<Self>, config: HeartbeatConfig) {
        let mut ticker = interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if inner.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let silent_for = inner.last_seen.lock().elapsed();
            let mut slot = inner.link.lock();
            let Some(link) = slot.as_ref() else {
                continue;
            };

            if silent_for > config.timeout {
                warn!(
                    link = link.id(),
                    silent_ms = silent_for.as_millis() as u64,
                    "Client stopped answering heartbeats, dropping"
                );
                link.close();
                *slot = None;
                drop(slot);
                inner.emit(TransportEvent::Disconnected { clean: false });
            } else {
                trace!(link = link.id(), "Heartbeat");
                link.send(&HostMessage::Heartbeat);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    async fn bind(heartbeat: HeartbeatConfig) -> (HostTransport, EventReceiver<ClientMessage>) {
        HostTransport::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, heartbeat)
            .await
            .expect("bind should succeed")
    }

    async fn next_event(
        rx: &mut EventReceiver<ClientMessage>,
    ) -> Option<TransportEvent<ClientMessage>> {
        timeout(Duration::from_secs(5), rx.recv()).await.ok().flatten()
    }

    #[tokio::test]
    async fn test_server_bind_random_port() {
        let (host, _rx) = bind(HeartbeatConfig::default()).await;
        assert!(host.port() > 0);
        assert_eq!(host.ws_url(), format!("ws://127.0.0.1:{}", host.port()));
        assert_eq!(host.local_addr().port(), host.port());
        assert!(!host.is_connected());
    }

    #[tokio::test]
    async fn test_send_without_client_is_dropped() {
        let (host, _rx) = bind(HeartbeatConfig::default()).await;
        assert!(!host.send(&HostMessage::ClearStaged));
    }

    #[tokio::test]
    async fn test_receives_client_messages() {
        let (host, mut rx) = bind(HeartbeatConfig::default()).await;
        let (mut ws, _) = connect_async(host.ws_url()).await.expect("connect");

        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));
        ws.send(Message::Text(r#"{"type":"ready"}"#.into()))
            .await
            .expect("send");
        assert_eq!(
            next_event(&mut rx).await,
            Some(TransportEvent::Message(ClientMessage::Ready))
        );

        ws.send(Message::Text(r#"{"type":"element-staged"}"#.into()))
            .await
            .expect("send");
        assert!(matches!(
            next_event(&mut rx).await,
            Some(TransportEvent::Error(_))
        ));
        assert!(host.is_connected());
    }

    #[tokio::test]
    async fn test_new_client_replaces_old() {
        let (host, mut rx) = bind(HeartbeatConfig::default()).await;

        let (mut first, _) = connect_async(host.ws_url()).await.expect("connect");
        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));

        let (_second, _) = connect_async(host.ws_url()).await.expect("connect");
        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));

        // The first socket is closed by the host.
        let mut closed = false;
        while let Some(frame) = first.next().await {
            if matches!(frame, Ok(Message::Close(_)) | Err(_)) {
                closed = true;
                break;
            }
        }
        assert!(closed);

        // The superseded close is not reported.
        assert!(
            timeout(Duration::from_millis(100), rx.recv()).await.is_err(),
            "unexpected event"
        );
        assert!(host.is_connected());
    }

    #[tokio::test]
    async fn test_client_close_reported_clean() {
        let (host, mut rx) = bind(HeartbeatConfig::default()).await;
        let (mut ws, _) = connect_async(host.ws_url()).await.expect("connect");
        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));

        ws.close(None).await.expect("close");
        assert_eq!(
            next_event(&mut rx).await,
            Some(TransportEvent::Disconnected { clean: true })
        );
    }

    #[tokio::test]
    async fn test_heartbeat_sent_and_silent_client_dropped() {
        let heartbeat = HeartbeatConfig {
            interval: Duration::from_millis(50),
            timeout: Duration::from_millis(120),
        };
        let (host, mut rx) = bind(heartbeat).await;
        let (mut ws, _) = connect_async(host.ws_url()).await.expect("connect");
        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));

        // Read the first heartbeat but never reply.
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("heartbeat in time")
            .expect("frame")
            .expect("ok");
        assert_eq!(frame.into_text().expect("text").as_str(), r#"{"type":"heartbeat"}"#);

        assert_eq!(
            next_event(&mut rx).await,
            Some(TransportEvent::Disconnected { clean: false })
        );
        assert!(!host.is_connected());
    }

    #[tokio::test]
    async fn test_shutdown_ends_event_stream() {
        let (mut host, mut rx) = bind(HeartbeatConfig::default()).await;
        let (_ws, _) = connect_async(host.ws_url()).await.expect("connect");
        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));

        host.shutdown();

        let end = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("stream ends in time");
        assert_eq!(end, None);
        assert!(!host.is_connected());
    }
}
