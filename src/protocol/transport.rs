//! Line-delimited transport for JSON-RPC frames
//!
//! Each message is a single line of JSON terminated by a newline. The
//! transport hands raw frames to the codec and never interprets payloads.
//! Writes are flushed before returning, since the peer blocks on the reply.

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Framed transport over any async reader/writer pair
///
/// Generic so the dispatch loop can be driven from in-memory buffers in
/// tests; production code uses [`StdioTransport`].
pub struct Transport<R, W> {
    reader: R,
    writer: W,
}

/// Transport over stdin/stdout, the production configuration
pub type StdioTransport = Transport<BufReader<io::Stdin>, io::Stdout>;

impl StdioTransport {
    /// Create a transport over this process's stdin and stdout
    pub fn stdio() -> Self {
        Transport::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::stdio()
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a transport from a reader/writer pair
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read the next frame
    ///
    /// Returns one complete line with the delimiter stripped, skipping blank
    /// lines. Returns `None` on end of stream; the stream is closed and no
    /// further reads will succeed.
    pub async fn read_frame(&mut self) -> io::Result<Option<String>> {
        loop {
            let mut line = String::new();

            let n = self.reader.read_line(&mut line).await?;
            if n == 0 {
                // EOF
                return Ok(None);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                // Empty line, try again
                continue;
            }

            debug!(len = trimmed.len(), "received frame");
            return Ok(Some(trimmed.to_string()));
        }
    }

    /// Write one frame followed by a newline, then flush
    pub async fn write_frame(&mut self, frame: &str) -> io::Result<()> {
        debug!(len = frame.len(), "sending frame");

        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// Close the transport, flushing any buffered output
    pub async fn close(&mut self) -> io::Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_frames_until_eof() {
        let input = b"{\"a\":1}\n\n{\"b\":2}\n" as &[u8];
        let mut out: Vec<u8> = Vec::new();
        let mut transport = Transport::new(BufReader::new(input), &mut out);

        assert_eq!(
            transport.read_frame().await.unwrap(),
            Some("{\"a\":1}".to_string())
        );
        // Blank line is skipped
        assert_eq!(
            transport.read_frame().await.unwrap(),
            Some("{\"b\":2}".to_string())
        );
        assert_eq!(transport.read_frame().await.unwrap(), None);
        // EOF is terminal
        assert_eq!(transport.read_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_frame_appends_newline() {
        let input = b"" as &[u8];
        let mut out: Vec<u8> = Vec::new();
        {
            let mut transport = Transport::new(BufReader::new(input), &mut out);
            transport.write_frame("{\"ok\":true}").await.unwrap();
            transport.write_frame("{\"ok\":false}").await.unwrap();
            transport.close().await.unwrap();
        }

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"ok\":true}\n{\"ok\":false}\n"
        );
    }

    #[tokio::test]
    async fn test_read_frame_trims_carriage_return() {
        let input = b"{\"a\":1}\r\n" as &[u8];
        let mut out: Vec<u8> = Vec::new();
        let mut transport = Transport::new(BufReader::new(input), &mut out);

        assert_eq!(
            transport.read_frame().await.unwrap(),
            Some("{\"a\":1}".to_string())
        );
    }
}
