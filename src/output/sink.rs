//! Newline-terminated line writer over an async byte sink.

use log::{debug, error};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Buffered line writer for one pipeline output
///
/// After the first write error the sink stops writing and only counts
/// dropped lines, so callers can keep draining their channel. Lines that
/// were already flushed are left untouched.
pub struct LineSink<W: AsyncWrite + Unpin> {
    name: &'static str,
    writer: BufWriter<W>,
    written: u64,
    dropped: u64,
    failure: Option<io::Error>,
}

impl<W: AsyncWrite + Unpin> LineSink<W> {
    pub fn new(name: &'static str, inner: W) -> Self {
        Self {
            name,
            writer: BufWriter::new(inner),
            written: 0,
            dropped: 0,
            failure: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Append `line` followed by a newline
    pub async fn write_line(&mut self, line: &str) {
        if self.failure.is_some() {
            self.dropped += 1;
            return;
        }

        match self.write_raw(line).await {
            Ok(()) => self.written += 1,
            Err(e) => self.fail(e),
        }
    }

    async fn write_raw(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await
    }

    /// Flush buffered lines and hand back the outcome of this sink
    ///
    /// # Returns
    /// Number of lines written, or the first I/O error the sink hit
    pub async fn finish(mut self) -> Result<u64, io::Error> {
        if self.failure.is_none() {
            if let Err(e) = self.writer.flush().await {
                self.fail(e);
            }
        }

        match self.failure {
            Some(e) => {
                if self.dropped > 0 {
                    error!("{} output dropped {} lines after failing", self.name, self.dropped);
                }
                Err(e)
            }
            None => {
                debug!("{} output flushed ({} lines)", self.name, self.written);
                Ok(self.written)
            }
        }
    }

    fn fail(&mut self, e: io::Error) {
        error!("Writing to {} output failed: {}", self.name, e);
        self.dropped += 1;
        self.failure = Some(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Writer that rejects every write
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_lines_are_newline_terminated() {
        let mut buffer = Vec::new();
        let mut sink = LineSink::new("malformed", &mut buffer);

        sink.write_line("first").await;
        sink.write_line("second").await;

        assert_eq!(sink.finish().await.unwrap(), 2);
        assert_eq!(buffer, b"first\nsecond\n");
    }

    #[tokio::test]
    async fn test_failure_is_reported_on_finish() {
        let mut sink = LineSink::new("completed", BrokenPipe);

        sink.write_line("lost").await;
        sink.write_line("also lost").await;

        let err = sink.finish().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
