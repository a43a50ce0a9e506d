//! Worker builder and event loop.
//!
//! The [`WorkerBuilder`] provides a fluent API for attaching command
//! handlers and building the worker. The [`Worker`] runs the
//! poll/dispatch/heartbeat/reconnect cycle:
//! 1. Connect to the broker, announce identity, send `READY`
//! 2. Poll the primary connection and the outbound relay with a bounded
//!    timeout
//! 3. Dispatch requests, track broker heartbeats, forward relayed
//!    messages
//! 4. On prolonged silence, reconnect with exponential backoff
//!
//! # Example
//!
//! ```ignore
//! use queue_worker::{Worker, WorkerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkerConfig::new("127.0.0.1:5555").with_name("worker-1");
//!     let worker = Worker::builder(config)
//!         .attach("echo", |req, replier| async move {
//!             replier.reply(req.args);
//!             Ok(())
//!         })
//!         .start()
//!         .await?;
//!
//!     worker.run().await?;
//!     Ok(())
//! }
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::WorkerConfig;
use crate::envelope::{self, Incoming};
use crate::error::{Result, WorkerError};
use crate::handler::{Handler, HandlerRegistry, Replier};
use crate::protocol::Message;
use crate::relay::{relay_channel, RelayReceiver, RelaySender};
use crate::transport::{Connection, Connector};

/// Growing silence threshold used to decide when the broker counts as
/// unreachable.
///
/// Doubles on every declared failure, capped at the ceiling; resets to
/// the floor whenever the broker shows signs of life.
#[derive(Debug, Clone, Copy)]
struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    fn new(floor: Duration, ceiling: Duration) -> Self {
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    fn current(&self) -> Duration {
        self.current
    }

    fn grow(&mut self) {
        self.current = (self.current * 2).min(self.ceiling);
    }

    fn reset(&mut self) {
        self.current = self.floor;
    }
}

/// Builder for configuring and starting a worker.
pub struct WorkerBuilder {
    config: WorkerConfig,
    registry: HandlerRegistry,
}

impl WorkerBuilder {
    /// Create a builder from a configuration.
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
        }
    }

    /// Attach a handler for a command name.
    ///
    /// Re-attaching a name overwrites the previous handler.
    pub fn attach<H: Handler>(mut self, command: &str, handler: H) -> Self {
        self.registry.attach(command, handler);
        self
    }

    /// Build the worker and make the initial connection attempt.
    ///
    /// A broker that is down at startup is not an error: the worker
    /// comes up connection-less and the backoff path keeps retrying
    /// once [`Worker::run`] is driving the loop.
    pub async fn start(self) -> Result<Worker> {
        let connector = Connector::new(self.config.broker_addr.clone(), self.config.name.clone())
            .with_connect_timeout(self.config.connect_timeout);
        let (relay_tx, relay_rx) = relay_channel(self.config.relay_capacity);

        let now = Instant::now();
        let mut worker = Worker {
            heartbeat_at: now + self.config.heartbeat_interval,
            backoff: Backoff::new(self.config.backoff_floor, self.config.backoff_ceiling),
            last_seen: now,
            conn: None,
            registry: self.registry,
            config: self.config,
            connector,
            relay_tx,
            relay_rx,
        };
        worker.connect().await;
        Ok(worker)
    }
}

/// Outcome of one bounded poll.
enum Cycle {
    /// The broker sent a message.
    Inbound(Message),
    /// A handler or external thread queued an outgoing message.
    Relayed(Message),
    /// The primary connection failed mid-receive.
    Disconnected(WorkerError),
    /// Nothing happened before the poll timeout.
    Idle,
}

/// A running worker: owns the primary broker connection and all
/// heartbeat/backoff state.
///
/// The loop is the sole owner and mutator of that state; cross-thread
/// interaction happens only through the relay.
pub struct Worker {
    config: WorkerConfig,
    registry: HandlerRegistry,
    connector: Connector,
    conn: Option<Connection>,
    relay_tx: RelaySender,
    relay_rx: RelayReceiver,
    /// When the broker last showed signs of life.
    last_seen: Instant,
    /// When our next heartbeat is due.
    heartbeat_at: Instant,
    backoff: Backoff,
}

impl Worker {
    /// Create a worker builder.
    pub fn builder(config: WorkerConfig) -> WorkerBuilder {
        WorkerBuilder::new(config)
    }

    /// A relay handle for queueing outgoing messages from other threads.
    pub fn relay(&self) -> RelaySender {
        self.relay_tx.clone()
    }

    /// Whether a primary broker connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Run the event loop until a fatal error.
    ///
    /// Transport failures are absorbed by the heartbeat/reconnect path;
    /// the only fatal errors are those reported by handlers, which are
    /// deliberately not caught here.
    pub async fn run(mut self) -> Result<()> {
        loop {
            self.poll_cycle().await?;
        }
    }

    /// One iteration of the loop: bounded poll, branch, heartbeat timer.
    async fn poll_cycle(&mut self) -> Result<()> {
        match self.next_cycle().await {
            Cycle::Inbound(message) => self.handle_inbound(message).await?,
            Cycle::Relayed(message) => self.forward(message).await,
            Cycle::Disconnected(err) => {
                warn!(error = %err, "broker connection lost");
                self.conn = None;
            }
            Cycle::Idle => self.check_staleness().await,
        }

        // Runs every cycle regardless of which branch fired, so request
        // traffic never starves our heartbeats.
        if Instant::now() >= self.heartbeat_at {
            self.heartbeat_at = Instant::now() + self.config.heartbeat_interval;
            debug!("sending heartbeat");
            if let Some(conn) = self.conn.as_mut() {
                if let Err(err) = conn.send(&Message::signal(envelope::HEARTBEAT)).await {
                    debug!(error = %err, "heartbeat send failed");
                }
            }
        }

        Ok(())
    }

    /// Block on both readiness sources with a bounded timeout.
    ///
    /// At most one source is drained per cycle, the broker connection
    /// first, so a flood on one side cannot monopolize a single
    /// iteration.
    async fn next_cycle(&mut self) -> Cycle {
        let poll_interval = self.config.poll_interval;
        let relay = &mut self.relay_rx;

        let waited = match self.conn.as_mut() {
            Some(conn) => {
                tokio::time::timeout(poll_interval, async {
                    tokio::select! {
                        biased;
                        res = conn.recv() => match res {
                            Ok(message) => Cycle::Inbound(message),
                            Err(err) => Cycle::Disconnected(err),
                        },
                        Some(message) = relay.recv() => Cycle::Relayed(message),
                    }
                })
                .await
            }
            None => {
                tokio::time::timeout(poll_interval, async {
                    match relay.recv().await {
                        Some(message) => Cycle::Relayed(message),
                        // All senders gone; nothing to wait for here.
                        None => std::future::pending().await,
                    }
                })
                .await
            }
        };

        waited.unwrap_or(Cycle::Idle)
    }

    /// Classify and act on one broker message.
    async fn handle_inbound(&mut self, message: Message) -> Result<()> {
        match envelope::classify(&message) {
            Incoming::Request(request) => {
                self.last_seen = Instant::now();
                if self.config.log_requests {
                    debug!(
                        command = %request.command,
                        origin = %request.origin_str(),
                        "request"
                    );
                }
                match self.registry.get(&request.command) {
                    Some(handler) => {
                        let replier = Replier::new(
                            request.origin.clone(),
                            request.command.clone(),
                            self.relay_tx.clone(),
                        );
                        // Handler failures are fatal by design: the loop
                        // does not catch them.
                        handler.call(request, replier).await?;
                    }
                    None => {
                        warn!(
                            command = %request.command,
                            origin = %request.origin_str(),
                            "unhandled request"
                        );
                    }
                }
            }
            Incoming::Signal(token) if token == envelope::HEARTBEAT => {
                debug!("received heartbeat");
                self.last_seen = Instant::now();
            }
            Incoming::Signal(token) => {
                warn!(%token, "unexpected signal");
            }
            Incoming::Malformed(reason) => {
                warn!(%reason, "invalid message");
            }
        }

        // Any inbound traffic means the broker is reachable.
        self.backoff.reset();
        Ok(())
    }

    /// Forward one relayed outgoing message verbatim onto the primary
    /// connection.
    async fn forward(&mut self, message: Message) {
        match self.conn.as_mut() {
            Some(conn) => {
                if let Err(err) = conn.send(&message).await {
                    debug!(error = %err, "forwarding relayed message failed");
                }
            }
            None => {
                warn!("no broker connection, dropping relayed message");
            }
        }
    }

    /// Declare a heartbeat failure once broker silence outlasts the
    /// current backoff window, and rebuild the connection from scratch.
    async fn check_staleness(&mut self) {
        if self.last_seen.elapsed() <= self.backoff.current() {
            return;
        }

        warn!("heartbeat failure, can't reach queue");
        warn!(
            backoff_secs = self.backoff.current().as_secs_f64(),
            "reconnecting"
        );
        self.backoff.grow();

        self.conn = None;
        self.connect().await;
        // Fresh grace period for the new connection.
        self.last_seen = Instant::now();
    }

    /// Create the primary connection and announce readiness.
    ///
    /// Failure leaves the worker connection-less; the staleness path
    /// retries on the next backoff expiry.
    async fn connect(&mut self) {
        debug!(address = %self.connector.address(), "connecting");
        match self.connector.spawn().await {
            Ok(mut conn) => match conn.send(&Message::signal(envelope::READY)).await {
                Ok(()) => {
                    info!("worker ready");
                    self.conn = Some(conn);
                }
                Err(err) => {
                    warn!(error = %err, "failed to announce readiness");
                    self.conn = None;
                }
            },
            Err(err) => {
                warn!(error = %err, "connect failed");
                self.conn = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Request;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(Duration::from_secs(4), Duration::from_secs(32));

        assert_eq!(backoff.current(), Duration::from_secs(4));
        backoff.grow();
        assert_eq!(backoff.current(), Duration::from_secs(8));
        backoff.grow();
        assert_eq!(backoff.current(), Duration::from_secs(16));
        backoff.grow();
        assert_eq!(backoff.current(), Duration::from_secs(32));
        backoff.grow();
        // Capped at the ceiling.
        assert_eq!(backoff.current(), Duration::from_secs(32));
    }

    #[test]
    fn test_backoff_resets_to_floor() {
        let mut backoff = Backoff::new(Duration::from_secs(4), Duration::from_secs(32));
        backoff.grow();
        backoff.grow();
        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_with_equal_floor_and_ceiling() {
        let mut backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(2));
        backoff.grow();
        assert_eq!(backoff.current(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_start_with_broker_down() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let mut config = WorkerConfig::new(addr);
        config.connect_timeout = Duration::from_millis(200);

        // Startup must tolerate an unreachable broker.
        let worker = Worker::builder(config).start().await.unwrap();
        assert!(!worker.is_connected());
    }

    #[tokio::test]
    async fn test_lost_connection_detected_on_next_poll() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut config = WorkerConfig::new(addr);
        config.poll_interval = Duration::from_millis(20);

        let mut worker = Worker::builder(config).start().await.unwrap();
        assert!(worker.is_connected());

        // Broker side goes away; the poll loop must notice and drop the
        // dead connection instead of erroring out.
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);

        for _ in 0..10 {
            worker.poll_cycle().await.unwrap();
            if !worker.is_connected() {
                break;
            }
        }
        assert!(!worker.is_connected());
    }

    #[tokio::test]
    async fn test_builder_attach_overwrites() {
        let builder = WorkerBuilder::new(WorkerConfig::new("127.0.0.1:1"))
            .attach("foo", |_req: Request, _replier: Replier| async { Ok(()) })
            .attach("foo", |_req: Request, _replier: Replier| async { Ok(()) });

        assert_eq!(builder.registry.len(), 1);
    }
}
