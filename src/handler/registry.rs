//! Handler registry for dispatching requests by command name.
//!
//! The registry maps command names to handlers. Names are unique;
//! attaching a handler under a name that is already taken replaces the
//! previous handler.
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

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::envelope::Request;
use crate::error::Result;

use super::Replier;

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for command handlers.
pub trait Handler: Send + Sync + 'static {
    /// Handle a parsed request with a bound reply capability.
    fn call(&self, request: Request, replier: Replier) -> BoxFuture<'static, HandlerResult>;
}

// Blanket impl so plain async closures register without a wrapper type.
impl<F, Fut> Handler for F
where
    F: Fn(Request, Replier) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: Request, replier: Replier) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request, replier))
    }
}

/// Registry mapping command names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Attach a handler for a command name.
    ///
    /// The last registration for a given name wins.
    pub fn attach<H: Handler>(&mut self, command: &str, handler: H) {
        self.handlers.insert(command.to_string(), Box::new(handler));
    }

    /// Look up a handler by command name.
    pub fn get(&self, command: &str) -> Option<&dyn Handler> {
        self.handlers.get(command).map(|h| h.as_ref())
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
