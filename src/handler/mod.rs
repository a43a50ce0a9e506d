//! Handler module - command dispatch and the reply capability.
//!
//! Provides:
//! - [`HandlerRegistry`] - maps command names to handlers
//! - [`Replier`] - lets handlers queue replies through the relay
//!
//! # Example
//!
//! ```ignore
//! use queue_worker::handler::{HandlerRegistry, Replier};
//! use queue_worker::envelope::Request;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.attach("echo", |req: Request, replier: Replier| async move {
//!     replier.reply(req.args);
//!     Ok(())
//! });
//! ```

mod context;
mod registry;

pub use context::Replier;
pub use registry::{BoxFuture, Handler, HandlerRegistry, HandlerResult};
