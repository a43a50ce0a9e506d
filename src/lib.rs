//! # queue-worker
//!
//! Resilient message-queue worker: a long-lived service endpoint that
//! holds one identified connection to a broker, dispatches multipart
//! command requests to attached handlers, and survives broker outages
//! through heartbeating and exponential-backoff reconnects.
//!
//! ## Architecture
//!
//! - **Protocol** (`protocol`): length-prefixed multipart frames
//! - **Envelope** (`envelope`): signal vs. command-request classification
//! - **Transport** (`transport`): identified broker connections
//! - **Relay** (`relay`): fire-and-forget outbound queue from any thread
//! - **Worker** (`worker`): the poll/dispatch/heartbeat/reconnect loop
//!
//! ## Example
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

pub mod config;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod relay;
pub mod transport;

mod worker;

pub use config::WorkerConfig;
pub use envelope::{Incoming, Request};
pub use error::WorkerError;
pub use handler::{Handler, HandlerRegistry, Replier};
pub use protocol::Message;
pub use relay::RelaySender;
pub use worker::{Worker, WorkerBuilder};
