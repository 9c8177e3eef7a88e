// Transport wrapper module
// Decorates the response heads hyper writes without calling the service

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::http::NO_CACHE_HEADERS;

const HEAD_END: &[u8] = b"\r\n\r\n";

/// Connection stream wrapper for the responses that bypass
/// [`crate::http::NoCache`].
///
/// hyper answers requests it cannot parse (400, 414, 431) on its own. When a
/// write starts with an HTTP/1 response head that has no `cache-control`
/// line, the no-cache headers are spliced in before the blank line. Heads
/// produced by the service already carry them and pass through untouched,
/// as does every other byte.
///
/// Writes are never vectored, so hyper hands over each head at the start
/// of a single buffer.
pub struct NoCacheIo<T> {
    inner: T,
    rewritten: Option<Rewritten>,
}

/// A decorated head still being written to the inner stream
struct Rewritten {
    bytes: Vec<u8>,
    written: usize,
    /// Length of the caller's buffer this stands in for
    consumed: usize,
}

impl<T> NoCacheIo<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner,
            rewritten: None,
        }
    }
}

impl<T: AsyncWrite + Unpin> NoCacheIo<T> {
    /// Push out whatever is left of a rewritten head
    fn drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if let Some(pending) = self.rewritten.as_mut() {
            while pending.written < pending.bytes.len() {
                let n = ready!(
                    Pin::new(&mut self.inner).poll_write(cx, &pending.bytes[pending.written..])
                )?;
                if n == 0 {
                    return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
                }
                pending.written += n;
            }
        }
        Poll::Ready(Ok(()))
    }
}

/// The head with the no-cache lines added, or `None` when `buf` is not an
/// undecorated response head
fn decorate_head(buf: &[u8]) -> Option<Vec<u8>> {
    if !buf.starts_with(b"HTTP/1.") {
        return None;
    }
    let end = buf.windows(HEAD_END.len()).position(|w| w == HEAD_END)?;
    // Status line plus header lines, each ending in CRLF
    let insert_at = end + 2;
    if has_header(&buf[..insert_at], "cache-control") {
        return None;
    }

    let mut out = Vec::with_capacity(buf.len() + 96);
    out.extend_from_slice(&buf[..insert_at]);
    for (name, value) in &NO_CACHE_HEADERS {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(&buf[insert_at..]);
    Some(out)
}

fn has_header(head: &[u8], name: &str) -> bool {
    head.split(|&b| b == b'\n').skip(1).any(|line| {
        line.len() > name.len()
            && line[..name.len()].eq_ignore_ascii_case(name.as_bytes())
            && line[name.len()] == b':'
    })
}

impl<T: AsyncWrite + Unpin> AsyncWrite for NoCacheIo<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        // A rewrite interrupted by Pending finishes before anything new
        ready!(this.drain(cx))?;
        if let Some(done) = this.rewritten.take() {
            return Poll::Ready(Ok(done.consumed));
        }

        match decorate_head(buf) {
            Some(bytes) => {
                this.rewritten = Some(Rewritten {
                    bytes,
                    written: 0,
                    consumed: buf.len(),
                });
                ready!(this.drain(cx))?;
                this.rewritten = None;
                Poll::Ready(Ok(buf.len()))
            }
            None => Pin::new(&mut this.inner).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for NoCacheIo<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}
