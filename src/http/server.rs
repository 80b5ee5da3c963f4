//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::config::Timeouts;

use super::deadline::DeadlineAcceptor;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid bind address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("Listener failed: {0}")]
    Listener(#[from] std::io::Error),
}

/// Start the HTTP server on `addr`.
///
/// Read and idle timeouts are enforced per connection by
/// [`DeadlineAcceptor`]; hyper's own header timer is switched off because it
/// would also run while a kept-alive connection waits for its next request.
/// The write timeout is applied by the router.
///
/// This function blocks until the listener fails. `handle` reports the bound
/// address once listening, which is how callers find an ephemeral port.
pub async fn start_server(
    app: Router,
    addr: &str,
    timeouts: Timeouts,
    handle: Handle,
) -> Result<(), ServerError> {
    let addr: SocketAddr = addr.parse().map_err(|source| ServerError::InvalidAddress {
        addr: addr.to_string(),
        source,
    })?;

    tracing::info!(
        %addr,
        read_timeout_ms = timeouts.read.as_millis() as u64,
        write_timeout_ms = timeouts.write.as_millis() as u64,
        idle_timeout_ms = timeouts.idle.as_millis() as u64,
        "Starting HTTP server"
    );

    let mut server = axum_server::bind(addr)
        .handle(handle)
        .acceptor(DeadlineAcceptor::new(timeouts.read, timeouts.idle));

    server.http_builder().http1().header_read_timeout(None);

    server.serve(app.into_make_service()).await?;

    Ok(())
}
