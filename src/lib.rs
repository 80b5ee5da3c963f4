//! Heartbeat: a minimal HTTP liveness service.
//!
//! Serves `GET /health` on a fixed port with a JSON status payload. The
//! binary in `main.rs` wires logging and starts the server; everything it
//! needs lives here so the router and server can be driven from tests.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

pub use error::AppError;
pub use routes::create_router;
