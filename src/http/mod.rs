//! HTTP server module.
//!
//! Plain HTTP only. Connections are bounded by fixed read, write and idle
//! timeouts. There is no graceful shutdown: the server runs until its
//! listener fails.

mod deadline;
mod server;

pub use deadline::DeadlineAcceptor;
pub use server::{start_server, ServerError};
