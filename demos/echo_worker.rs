//! Minimal worker that echoes request arguments back to the requester.
//!
//! Run against a broker listening on 127.0.0.1:5555:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example echo_worker
//! ```

use queue_worker::{Replier, Request, Worker, WorkerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = WorkerConfig::new("127.0.0.1:5555")
        .with_name("echo-worker")
        .with_log_requests(true);

    let worker = Worker::builder(config)
        .attach("echo", |req: Request, replier: Replier| async move {
            replier.reply(req.args);
            Ok(())
        })
        .start()
        .await?;

    worker.run().await?;
    Ok(())
}
