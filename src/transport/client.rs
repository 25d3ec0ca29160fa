//! Client-side transport with reconnection.
//!
//! The in-page client dials the host and keeps the channel alive across
//! page reloads, hot-reload disconnects and backgrounded tabs.
//!
//! # Connection Lifecycle
//!
//! 1. `connect()` - reset the record, dial, send `ready` on open
//! 2. On close - schedule a retry (shorter base delay for clean closes)
//! 3. On exhaustion - emit `MaxRetries` once and stop
//! 4. `notify_visibility(true)` - reset the budget, retry immediately
//! 5. `disconnect()` - set the intentional flag, cancel retries, close
//!
//! Messages sent while the channel is closed are dropped, never queued.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::config::ReconnectPolicy;
use crate::error::{Error, Result};
use crate::protocol::{ClientMessage, HostMessage, WireMessage};

use super::connection::{Link, LinkEvent};
use super::event::{EventReceiver, EventSender, TransportEvent};
use super::record::{ConnectionRecord, RetryDecision};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for one dial including the WebSocket handshake.
const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Connector
// ============================================================================

/// Stream type produced by [`Connector::open`].
pub type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket streams to the host.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Dials `url` and completes the WebSocket handshake.
    async fn open(&self, url: &Url) -> Result<ClientStream>;
}

/// Default connector backed by `tokio_tungstenite::connect_async`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    dial_timeout: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self {
            dial_timeout: DIAL_TIMEOUT,
        }
    }
}

impl WsConnector {
    /// Creates a connector with a custom dial timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(dial_timeout: Duration) -> Self {
        Self { dial_timeout }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, url: &Url) -> Result<ClientStream> {
        let (ws_stream, _) = timeout(self.dial_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(self.dial_timeout.as_millis() as u64))??;
        Ok(ws_stream)
    }
}

// ============================================================================
// ClientInner
// ============================================================================

/// Shared state between the handle, link supervisors and retry tasks.
struct ClientInner {
    url: Url,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    record: Mutex<ConnectionRecord>,
    link: Mutex<Option<Link<ClientMessage>>>,
    retry_task: Mutex<Option<JoinHandle<()>>>,
    retry_generation: AtomicU64,
    /// Set while a retry task is dialing.
    dialing: AtomicBool,
    dials: AtomicU64,
    events: EventSender<HostMessage>,
}

// ============================================================================
// ClientTransport
// ============================================================================

/// Client half of the duplex channel.
///
/// Events (`Connected`, `Disconnected`, `Message`, `Error`, `MaxRetries`)
/// are delivered on the receiver returned by the constructor.
pub struct ClientTransport {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ClientTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTransport")
            .field("url", &self.inner.url.as_str())
            .field("open", &self.is_open())
            .field("record", &*self.inner.record.lock())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ClientTransport - Constructors
// ============================================================================

impl ClientTransport {
    /// Creates a transport that dials with [`WsConnector`].
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `url` does not parse
    /// - [`Error::Config`] if the scheme is not `ws`/`wss` or the policy is invalid
    pub fn new(url: &str, policy: ReconnectPolicy) -> Result<(Self, EventReceiver<HostMessage>)> {
        Self::with_connector(url, policy, WsConnector::default())
    }

    /// Creates a transport with a custom connector.
    ///
    /// # Errors
    ///
    /// Same as [`ClientTransport::new`].
    pub fn with_connector(
        url: &str,
        policy: ReconnectPolicy,
        connector: impl Connector,
    ) -> Result<(Self, EventReceiver<HostMessage>)> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "transport URL must use ws:// or wss://, got {}",
                url.scheme()
            )));
        }
        policy.validate()?;

        let (events, events_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(ClientInner {
            url,
            policy,
            connector: Arc::new(connector),
            record: Mutex::new(ConnectionRecord::new()),
            link: Mutex::new(None),
            retry_task: Mutex::new(None),
            retry_generation: AtomicU64::new(0),
            dialing: AtomicBool::new(false),
            dials: AtomicU64::new(0),
            events,
        });

        Ok((Self { inner }, events_rx))
    }
}

// ============================================================================
// ClientTransport - Public API
// ============================================================================

impl ClientTransport {
    /// Opens the channel.
    ///
    /// Resets the connection record (clearing any intentional close) and
    /// resolves once the handshake completes and `ready` is queued. If this
    /// first attempt fails the error is returned, and the transport keeps
    /// retrying in the background according to its policy.
    ///
    /// # Errors
    ///
    /// Returns the dial error of the first attempt.
    pub async fn connect(&self) -> Result<()> {
        ClientInner::cancel_retry(&self.inner);
        self.inner.record.lock().reset();

        if self.is_open() {
            return Ok(());
        }

        match ClientInner::open(&self.inner).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(url = %self.inner.url, error = %e, "Initial connection failed");
                self.inner.emit(TransportEvent::Error(e.to_string()));
                ClientInner::schedule_reconnect(&self.inner, false);
                Err(e)
            }
        }
    }

    /// Sends a message if the channel is open.
    ///
    /// Returns `false` and drops the message otherwise.
    pub fn send(&self, message: &ClientMessage) -> bool {
        self.inner.send(message)
    }

    /// Handles the page becoming visible or hidden.
    ///
    /// When visible and the channel is not open, the attempt counter is
    /// reset and a fresh attempt starts immediately, unless a retry is
    /// already dialing. Returns `true` if an attempt was started.
    pub fn notify_visibility(&self, visible: bool) -> bool {
        if !visible {
            return false;
        }
        let dialing = self.inner.dialing.load(Ordering::SeqCst);
        if self.is_open() {
            return false;
        }
        if !self.inner.record.lock().rearm() {
            return false;
        }
        if dialing {
            debug!(url = %self.inner.url, "Page visible again, retry already dialing");
            return false;
        }

        debug!(url = %self.inner.url, "Page visible again, reconnecting now");
        ClientInner::cancel_retry(&self.inner);
        ClientInner::spawn_attempt(&self.inner, Duration::ZERO);
        true
    }

    /// Closes the channel on purpose. No reconnection follows until
    /// [`connect`](Self::connect) is called again.
    pub fn disconnect(&self) {
        self.inner.record.lock().mark_intentional();
        ClientInner::cancel_retry(&self.inner);

        let link = self.inner.link.lock().take();
        if let Some(link) = link {
            link.close();
            debug!(url = %self.inner.url, "Disconnected intentionally");
            self.inner.emit(TransportEvent::Disconnected { clean: true });
        }
    }

    /// Disconnects and releases the transport.
    pub fn destroy(self) {
        self.disconnect();
    }

    /// Returns `true` if the channel is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.link.lock().is_some()
    }

    /// Returns a copy of the connection record.
    #[must_use]
    pub fn record(&self) -> ConnectionRecord {
        self.inner.record.lock().clone()
    }

    /// Total number of dials made, including the first.
    #[inline]
    #[must_use]
    pub fn dial_count(&self) -> u64 {
        self.inner.dials.load(Ordering::Relaxed)
    }

    /// Returns the host URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }
}

impl Drop for ClientTransport {
    fn drop(&mut self) {
        // Retry tasks hold the inner state and outlive this handle.
        self.disconnect();
    }
}

// ============================================================================
// ClientInner - Connection Cycle
// ============================================================================

impl ClientInner {
    fn emit(&self, event: TransportEvent<HostMessage>) {
        let _ = self.events.send(event);
    }

    fn send(&self, message: &ClientMessage) -> bool {
        let link = self.link.lock();
        match link.as_ref() {
            Some(link) => link.send(message),
            None => {
                trace!(tag = message.tag(), "Channel closed, dropping message");
                false
            }
        }
    }

    /// Dials once and installs the new link.
    ///
    /// A stream that arrives while another link is installed is discarded,
    /// so `Connected` fires once per open channel.
    async fn open(inner: &Arc<Self>) -> Result<()> {
        inner.dials.fetch_add(1, Ordering::Relaxed);
        let ws_stream = inner.connector.open(&inner.url).await?;

        if inner.record.lock().intentional_close() {
            debug!("Disconnected while dialing, discarding stream");
            return Err(Error::ConnectionClosed);
        }

        let (link_id, link_rx) = {
            let mut slot = inner.link.lock();
            if slot.is_some() {
                debug!("Already connected, discarding dialed stream");
                return Ok(());
            }
            let (link, link_rx) = Link::<ClientMessage>::spawn::<_, HostMessage>(ws_stream);
            link.send(&ClientMessage::Ready);
            let link_id = link.id();
            *slot = Some(link);
            (link_id, link_rx)
        };
        inner.record.lock().mark_open();

        info!(url = %inner.url, link = link_id, "Connected to host");
        inner.emit(TransportEvent::Connected);

        tokio::spawn(Self::supervise(Arc::clone(inner), link_id, link_rx));
        Ok(())
    }

    /// Forwards link events and reacts to the close.
    async fn supervise(
        inner: Arc<Self>,
        link_id: u64,
        mut link_rx: mpsc::UnboundedReceiver<LinkEvent<HostMessage>>,
    ) {
        while let Some(event) = link_rx.recv().await {
            match event {
                LinkEvent::Message(message) => {
                    if message == HostMessage::Heartbeat {
                        inner.send(&ClientMessage::HeartbeatReply);
                    }
                    inner.emit(TransportEvent::Message(message));
                }

                LinkEvent::Malformed(e) => {
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

                    if !current {
                        trace!(link = link_id, "Superseded link closed");
                        return;
                    }

                    debug!(link = link_id, clean, "Channel closed");
                    inner.emit(TransportEvent::Disconnected { clean });
                    Self::schedule_reconnect(&inner, clean);
                    return;
                }
            }
        }
    }

    /// Consults the record and schedules the next attempt.
    fn schedule_reconnect(inner: &Arc<Self>, clean: bool) {
        let decision = inner.record.lock().next_retry(clean, &inner.policy);

        match decision {
            RetryDecision::Retry { attempt, delay } => {
                debug!(
                    attempt,
                    max = inner.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    clean,
                    "Scheduling reconnect"
                );
                Self::spawn_attempt(inner, delay);
            }

            RetryDecision::Exhausted => {
                warn!(
                    url = %inner.url,
                    attempts = inner.policy.max_attempts,
                    "Max retries reached, reload to reconnect"
                );
                inner.emit(TransportEvent::MaxRetries);
            }

            RetryDecision::Suppressed => {
                trace!("Reconnect suppressed");
            }
        }
    }

    /// Spawns a delayed attempt, replacing any pending one.
    fn spawn_attempt(inner: &Arc<Self>, delay: Duration) {
        let generation = inner.retry_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let task_inner = Arc::clone(inner);

        let mut slot = inner.retry_task.lock();
        let handle = tokio::spawn(async move {
            sleep(delay).await;

            if task_inner.retry_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            task_inner.retry_task.lock().take();

            if task_inner.record.lock().intentional_close() {
                trace!("Intentional close, skipping reconnect");
                return;
            }

            let result = {
                let _dialing = DialingGuard::enter(&task_inner.dialing);
                Self::open(&task_inner).await
            };
            if let Err(e) = result {
                debug!(error = %e, "Reconnect attempt failed");
                task_inner.emit(TransportEvent::Error(e.to_string()));
                Self::schedule_reconnect(&task_inner, false);
            }
        });

        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Cancels any pending attempt.
    fn cancel_retry(inner: &Arc<Self>) {
        inner.retry_generation.fetch_add(1, Ordering::SeqCst);
        let pending = inner.retry_task.lock().take();
        if let Some(handle) = pending {
            handle.abort();
        }
    }
}

// ============================================================================
// DialingGuard
// ============================================================================

/// Holds the dialing flag; released on drop, including task abort.
struct DialingGuard<'a>(&'a AtomicBool);

impl<'a> DialingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for DialingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicU32;

    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio::sync::Semaphore;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    /// Connector that always fails and counts dials.
    struct RefusingConnector {
        dials: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Connector for RefusingConnector {
        async fn open(&self, _url: &Url) -> Result<ClientStream> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            Err(Error::connection("refused"))
        }
    }

    /// Connector that refuses the first dial and parks later dials until
    /// the gate is opened.
    struct GatedConnector {
        dials: Arc<AtomicU32>,
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Connector for GatedConnector {
        async fn open(&self, url: &Url) -> Result<ClientStream> {
            if self.dials.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(Error::connection("refused"));
            }
            let _permit = self.gate.acquire().await.map_err(|_| Error::ConnectionClosed)?;
            WsConnector::default().open(url).await
        }
    }

    fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new()
            .with_initial_delay(Duration::from_millis(5))
            .with_clean_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(20))
            .with_jitter_ratio(0.0)
            .with_max_attempts(max_attempts)
    }

    async fn next_event(
        rx: &mut EventReceiver<HostMessage>,
    ) -> Option<TransportEvent<HostMessage>> {
        timeout(Duration::from_secs(5), rx.recv()).await.ok().flatten()
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = ClientTransport::new("http://127.0.0.1:1", ReconnectPolicy::default())
            .expect_err("should fail");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_send_while_closed_is_dropped() {
        let (transport, _rx) =
            ClientTransport::new("ws://127.0.0.1:9", ReconnectPolicy::default()).expect("create");
        assert!(!transport.is_open());
        assert!(!transport.send(&ClientMessage::SelectionsCleared));
    }

    #[tokio::test]
    async fn test_max_retries_fires_exactly_once() {
        let dials = Arc::new(AtomicU32::new(0));
        let connector = RefusingConnector {
            dials: Arc::clone(&dials),
        };
        let (transport, mut rx) =
            ClientTransport::with_connector("ws://127.0.0.1:9", fast_policy(3), connector)
                .expect("create");

        assert!(transport.connect().await.is_err());

        let mut max_retries = 0;
        while let Some(event) = next_event(&mut rx).await {
            if event.is_terminal() {
                max_retries += 1;
                break;
            }
        }
        assert_eq!(max_retries, 1);

        // No further attempts after exhaustion.
        sleep(Duration::from_millis(100)).await;
        assert_eq!(dials.load(Ordering::SeqCst), 1 + 3);
        while let Ok(event) = rx.try_recv() {
            assert!(!event.is_terminal(), "second MaxRetries event");
        }
        assert!(transport.record().is_exhausted());
    }

    #[tokio::test]
    async fn test_connect_after_exhaustion_starts_new_cycle() {
        let dials = Arc::new(AtomicU32::new(0));
        let connector = RefusingConnector {
            dials: Arc::clone(&dials),
        };
        let (transport, mut rx) =
            ClientTransport::with_connector("ws://127.0.0.1:9", fast_policy(1), connector)
                .expect("create");

        let _ = transport.connect().await;
        while let Some(event) = next_event(&mut rx).await {
            if event.is_terminal() {
                break;
            }
        }
        assert_eq!(dials.load(Ordering::SeqCst), 2);

        let _ = transport.connect().await;
        while let Some(event) = next_event(&mut rx).await {
            if event.is_terminal() {
                break;
            }
        }
        assert_eq!(dials.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_retry() {
        let dials = Arc::new(AtomicU32::new(0));
        let connector = RefusingConnector {
            dials: Arc::clone(&dials),
        };
        let policy = fast_policy(5).with_initial_delay(Duration::from_millis(200));
        let (transport, _rx) =
            ClientTransport::with_connector("ws://127.0.0.1:9", policy, connector)
                .expect("create");

        let _ = transport.connect().await;
        transport.disconnect();

        sleep(Duration::from_millis(400)).await;
        assert_eq!(dials.load(Ordering::SeqCst), 1);
        assert!(transport.record().intentional_close());
    }

    #[tokio::test]
    async fn test_visibility_resets_budget() {
        let dials = Arc::new(AtomicU32::new(0));
        let connector = RefusingConnector {
            dials: Arc::clone(&dials),
        };
        let (transport, mut rx) =
            ClientTransport::with_connector("ws://127.0.0.1:9", fast_policy(1), connector)
                .expect("create");

        let _ = transport.connect().await;
        while let Some(event) = next_event(&mut rx).await {
            if event.is_terminal() {
                break;
            }
        }
        assert_eq!(dials.load(Ordering::SeqCst), 2);

        assert!(transport.notify_visibility(true));
        while let Some(event) = next_event(&mut rx).await {
            if event.is_terminal() {
                break;
            }
        }
        // One immediate attempt plus one backoff attempt.
        assert_eq!(dials.load(Ordering::SeqCst), 4);
        assert!(!transport.notify_visibility(false));
    }

    #[tokio::test]
    async fn test_sends_ready_and_answers_heartbeat() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("ws://{}", listener.local_addr().expect("addr"));

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("upgrade");

            let first = ws.next().await.expect("frame").expect("ok");
            ws.send(Message::Text(r#"{"type":"heartbeat"}"#.into()))
                .await
                .expect("send");
            let second = ws.next().await.expect("frame").expect("ok");
            (first.into_text().expect("text"), second.into_text().expect("text"))
        });

        let (transport, mut rx) =
            ClientTransport::new(&url, fast_policy(3)).expect("create");
        transport.connect().await.expect("connect");
        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));

        let (first, second) = server.await.expect("join");
        assert_eq!(first.as_str(), r#"{"type":"ready"}"#);
        assert_eq!(second.as_str(), r#"{"type":"heartbeat-reply"}"#);
        assert_eq!(
            next_event(&mut rx).await,
            Some(TransportEvent::Message(HostMessage::Heartbeat))
        );
    }

    #[tokio::test]
    async fn test_reconnects_after_clean_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("ws://{}", listener.local_addr().expect("addr"));

        tokio::spawn(async move {
            // First client: close right after the handshake.
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("upgrade");
            let _ = ws.close(None).await;

            // Second client: keep it open.
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("upgrade");
            while ws.next().await.is_some() {}
        });

        let (transport, mut rx) =
            ClientTransport::new(&url, fast_policy(5)).expect("create");
        transport.connect().await.expect("connect");

        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));
        assert_eq!(
            next_event(&mut rx).await,
            Some(TransportEvent::Disconnected { clean: true })
        );
        assert_eq!(next_event(&mut rx).await, Some(TransportEvent::Connected));
        assert!(transport.is_open());
        assert_eq!(transport.record().attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_visibility_while_dialing_keeps_single_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("ws://{}", listener.local_addr().expect("addr"));
        let accepted = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    if let Ok(mut ws) = accept_async(stream).await {
                        while ws.next().await.is_some() {}
                    }
                });
            }
        });

        let dials = Arc::new(AtomicU32::new(0));
        let gate = Arc::new(Semaphore::new(0));
        let connector = GatedConnector {
            dials: Arc::clone(&dials),
            gate: Arc::clone(&gate),
        };
        let (transport, mut rx) =
            ClientTransport::with_connector(&url, fast_policy(5), connector).expect("create");

        assert!(transport.connect().await.is_err());
        timeout(Duration::from_secs(5), async {
            while dials.load(Ordering::SeqCst) < 2 {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("retry dialing");

        // The parked retry is the fresh attempt.
        assert!(!transport.notify_visibility(true));
        gate.add_permits(8);

        let mut connected = 0;
        while let Ok(Some(event)) = timeout(Duration::from_millis(300), rx.recv()).await {
            if event == TransportEvent::Connected {
                connected += 1;
            }
        }
        assert_eq!(connected, 1);
        assert_eq!(dials.load(Ordering::SeqCst), 2);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
        assert!(transport.is_open());
        assert_eq!(transport.record().attempt_count(), 0);
    }
}
