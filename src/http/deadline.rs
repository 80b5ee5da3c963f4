//! Per-connection read and idle deadlines.
//!
//! Every accepted connection is wrapped in a [`DeadlineStream`] that tracks
//! which phase the connection is in:
//!
//! - **Headers**: a request is being received. The read timeout runs from
//!   accept on a fresh connection, or from the first byte of the next request
//!   on a kept-alive one. Bytes trickling in do not extend it.
//! - **Active**: the headers are in. From here on the connection is closed
//!   once no bytes have moved for the idle timeout, which covers the gap
//!   between a response and the next request.
//!
//! An expired deadline fails the next pending read or write with `TimedOut`;
//! hyper treats that as fatal and drops the connection.

use std::future::{ready, Future, Ready};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum_server::accept::Accept;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{sleep, Instant, Sleep};

/// Acceptor that applies read and idle deadlines to every connection.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineAcceptor {
    read: Duration,
    idle: Duration,
}

impl DeadlineAcceptor {
    pub fn new(read: Duration, idle: Duration) -> Self {
        Self { read, idle }
    }
}

impl<I, S> Accept<I, S> for DeadlineAcceptor
where
    I: AsyncRead + AsyncWrite + Unpin,
{
    type Stream = DeadlineStream<I>;
    type Service = S;
    type Future = Ready<io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        ready(Ok((DeadlineStream::new(stream, self.read, self.idle), service)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Receiving request headers; `line_ends` counts consecutive line
    /// terminators, two in a row end the header block
    Headers { line_ends: u8 },
    /// Headers received; `responded` once response bytes have gone out
    Active { responded: bool },
}

/// Stream wrapper enforcing the read deadline while headers arrive and the
/// idle deadline otherwise.
pub struct DeadlineStream<S> {
    inner: S,
    read: Duration,
    idle: Duration,
    phase: Phase,
    deadline: Pin<Box<Sleep>>,
}

impl<S> DeadlineStream<S> {
    pub fn new(inner: S, read: Duration, idle: Duration) -> Self {
        Self {
            inner,
            read,
            idle,
            phase: Phase::Headers { line_ends: 0 },
            deadline: Box::pin(sleep(read)),
        }
    }

    fn restart(&mut self, after: Duration) {
        self.deadline.as_mut().reset(Instant::now() + after);
    }

    fn on_read(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let mut line_ends = match self.phase {
            Phase::Headers { line_ends } => line_ends,
            Phase::Active { responded: true } => {
                // First byte of the next request on a kept-alive connection
                self.restart(self.read);
                0
            }
            Phase::Active { responded: false } => {
                // Request body
                self.restart(self.idle);
                return;
            }
        };

        for &byte in bytes {
            match byte {
                b'\n' => {
                    line_ends += 1;
                    if line_ends == 2 {
                        self.phase = Phase::Active { responded: false };
                        self.restart(self.idle);
                        return;
                    }
                }
                b'\r' => {}
                _ => line_ends = 0,
            }
        }

        self.phase = Phase::Headers { line_ends };
    }

    fn on_write(&mut self, written: usize) {
        if written > 0 {
            self.phase = Phase::Active { responded: true };
            self.restart(self.idle);
        }
    }

    /// Registers the deadline with `cx` and reports whether it has passed.
    fn poll_expired(&mut self, cx: &mut Context<'_>) -> io::Result<()> {
        match self.deadline.as_mut().poll(cx) {
            Poll::Ready(()) => {
                let reason = match self.phase {
                    Phase::Headers { .. } => "request header read timeout",
                    Phase::Active { .. } => "connection idle timeout",
                };
                tracing::debug!(reason, "Closing connection");
                Err(io::Error::new(io::ErrorKind::TimedOut, reason))
            }
            Poll::Pending => Ok(()),
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for DeadlineStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                this.on_read(&buf.filled()[before..]);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => {
                this.poll_expired(cx)?;
                Poll::Pending
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for DeadlineStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => {
                this.on_write(n);
                Poll::Ready(Ok(n))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => {
                this.poll_expired(cx)?;
                Poll::Pending
            }
        }
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_write_vectored(cx, bufs) {
            Poll::Ready(Ok(n)) => {
                this.on_write(n);
                Poll::Ready(Ok(n))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => {
                this.poll_expired(cx)?;
                Poll::Pending
            }
        }
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

    const READ: Duration = Duration::from_secs(15);
    const IDLE: Duration = Duration::from_secs(60);
    const REQUEST: &[u8] = b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n";

    fn pair() -> (DuplexStream, DeadlineStream<DuplexStream>) {
        let (client, server) = duplex(1024);
        (client, DeadlineStream::new(server, READ, IDLE))
    }

    async fn read_until_error(stream: &mut DeadlineStream<DuplexStream>) -> io::Error {
        let mut buf = [0u8; 256];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => panic!("unexpected EOF"),
                Ok(_) => continue,
                Err(e) => return e,
            }
        }
    }

    fn assert_closed_after(started: Instant, expected: Duration) {
        let elapsed = started.elapsed();
        assert!(elapsed >= expected, "closed early after {elapsed:?}");
        assert!(
            elapsed < expected + Duration::from_secs(1),
            "closed late after {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_connection_closed_at_read_timeout() {
        let (_client, mut stream) = pair();
        let started = Instant::now();

        let err = read_until_error(&mut stream).await;

        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_closed_after(started, READ);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trickled_headers_do_not_extend_read_timeout() {
        let (mut client, mut stream) = pair();
        let started = Instant::now();

        tokio::spawn(async move {
            client.write_all(b"GET /health HTTP/1.1\r\n").await.unwrap();
            for _ in 0..10 {
                tokio::time::sleep(Duration::from_secs(5)).await;
                client.write_all(b"X-Slow: 1\r\n").await.unwrap();
            }
            client
        });

        let err = read_until_error(&mut stream).await;

        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_closed_after(started, READ);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_headers_switch_to_idle_timeout() {
        let (mut client, mut stream) = pair();
        client.write_all(REQUEST).await.unwrap();
        let started = Instant::now();

        let err = read_until_error(&mut stream).await;

        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_closed_after(started, IDLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bare_newline_headers_are_recognized() {
        let (mut client, mut stream) = pair();
        client.write_all(b"GET /health HTTP/1.1\nHost: a\n\n").await.unwrap();
        let started = Instant::now();

        read_until_error(&mut stream).await;

        assert_closed_after(started, IDLE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kept_alive_connection_idles_then_reads_next_request() {
        let (mut client, mut stream) = pair();
        let mut buf = [0u8; 256];

        client.write_all(REQUEST).await.unwrap();
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], REQUEST);
        stream.write_all(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();

        // Waiting for the next request is governed by the idle timeout
        tokio::time::advance(Duration::from_secs(50)).await;

        // The next request's headers get a fresh read deadline
        client.write_all(b"GET /he").await.unwrap();
        let started = Instant::now();

        let err = read_until_error(&mut stream).await;

        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_closed_after(started, READ);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_writes_push_idle_deadline_back() {
        let (mut client, mut stream) = pair();
        let mut buf = [0u8; 256];

        client.write_all(REQUEST).await.unwrap();
        stream.read(&mut buf).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        stream.write_all(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();
        let started = Instant::now();

        read_until_error(&mut stream).await;

        assert_closed_after(started, IDLE);
    }

    #[tokio::test]
    async fn test_acceptor_wraps_stream_and_passes_service() {
        let (_client, server) = duplex(64);
        let acceptor = DeadlineAcceptor::new(READ, IDLE);

        let (stream, service) = acceptor.accept(server, "service").await.unwrap();
        assert_eq!(stream.read, READ);
        assert_eq!(stream.idle, IDLE);
        assert_eq!(stream.phase, Phase::Headers { line_ends: 0 });
        assert_eq!(service, "service");
    }
}
