//! Client chat session
//!
//! Couples one server connection to an input source and a display sink.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::protocol::LineReader;

use super::config::ClientConfig;

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Lines sent to the server, including the sentinel
    pub lines_sent: u64,
    /// Lines received from the server
    pub lines_received: u64,
    /// Whether the session ended because the sentinel was sent
    pub quit: bool,
}

/// One client connection to a chat server
///
/// # Example
/// ```no_run
/// use chat_relay::client::{ChatSession, ClientConfig};
///
/// # async fn example() -> chat_relay::error::Result<()> {
/// let session = ChatSession::connect(ClientConfig::new("localhost:9000")).await?;
/// let summary = session.run(tokio::io::stdin(), tokio::io::stdout()).await?;
/// println!("sent {} lines", summary.lines_sent);
/// # Ok(())
/// # }
/// ```
pub struct ChatSession<S = TcpStream> {
    config: ClientConfig,
    stream: S,
    peer_addr: Option<SocketAddr>,
}

impl ChatSession<TcpStream> {
    /// Connect to the server named in the config
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let stream = TcpStream::connect(&config.server_addr).await?;
        if config.tcp_nodelay {
            stream.set_nodelay(true)?;
        }

        let peer_addr = stream.peer_addr()?;
        tracing::info!(server = %peer_addr, "Connected to chat server");

        Ok(Self {
            config,
            stream,
            peer_addr: Some(peer_addr),
        })
    }
}

impl<S> ChatSession<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap an already-connected stream
    pub fn from_stream(stream: S, config: ClientConfig) -> Self {
        Self {
            config,
            stream,
            peer_addr: None,
        }
    }

    /// Server address, when connected over TCP
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Run the session until both paths finish
    ///
    /// The receive path runs on its own task and writes each server line,
    /// newline-terminated, to `output`. The send path forwards `input` lines
    /// until the sentinel has been sent or input ends, then closes the
    /// outbound half. The call returns once the server has closed too.
    pub async fn run<I, O>(self, input: I, output: O) -> Result<SessionSummary>
    where
        I: AsyncRead + Unpin,
        O: AsyncWrite + Unpin + Send + 'static,
    {
        let (read_half, mut write_half) = tokio::io::split(self.stream);
        let max_line_length = self.config.max_line_length;

        let receiver = tokio::spawn(receive_loop(read_half, output, max_line_length));

        let send_result = send_loop(input, &mut write_half, &self.config).await;
        if let Err(e) = write_half.shutdown().await {
            tracing::debug!(error = %e, "Failed to close outbound half");
        }

        let (lines_sent, quit) = match send_result {
            Ok(result) => result,
            Err(e) => {
                receiver.abort();
                return Err(Error::Io(e));
            }
        };

        let lines_received = receiver
            .await
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e)))??;

        tracing::info!(
            lines_sent = lines_sent,
            lines_received = lines_received,
            quit = quit,
            "Chat session ended"
        );

        Ok(SessionSummary {
            lines_sent,
            lines_received,
            quit,
        })
    }
}

/// Forward input lines until the sentinel or end of input
async fn send_loop<I, W>(input: I, writer: &mut W, config: &ClientConfig) -> io::Result<(u64, bool)>
where
    I: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LineReader::new(input, config.max_outbound_line_length);
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        writer.write_all(&buf).await?;
        writer.flush().await?;
        sent += 1;

        if line == config.sentinel {
            tracing::debug!("Sentinel sent, closing connection");
            return Ok((sent, true));
        }
    }

    Ok((sent, false))
}

/// Copy server lines to the display sink until the server closes
async fn receive_loop<R, O>(reader: R, mut output: O, max_line_length: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = LineReader::new(reader, max_line_length);
    let mut received = 0;

    while let Some(line) = lines.next_line().await? {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        output.write_all(&buf).await?;
        output.flush().await?;
        received += 1;
    }

    Ok(received)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{duplex, AsyncBufReadExt, BufReader, DuplexStream};
    use tokio_test::io::Builder;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(2);

    /// Fake server: sends `greeting`, then collects lines until the client closes
    fn fake_server(stream: DuplexStream, greeting: &'static [u8]) -> tokio::task::JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            let (read_half, mut write_half) = tokio::io::split(stream);
            write_half.write_all(greeting).await.unwrap();

            let mut lines = BufReader::new(read_half).lines();
            let mut got = Vec::new();
            while let Some(line) = lines.next_line().await.unwrap() {
                got.push(line);
            }
            got
        })
    }

    #[tokio::test]
    async fn test_quit_sent_then_session_ends() {
        let (client, server) = duplex(1024);
        let server = fake_server(server, b"Client 2: hi\n");

        let input = Builder::new().read(b"hello\n").read(b"quit\nignored\n").build();
        let output = Builder::new().write(b"Client 2: hi\n").build();

        let session = ChatSession::from_stream(client, ClientConfig::default());
        let summary = tokio::time::timeout(TIMEOUT, session.run(input, output))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            summary,
            SessionSummary {
                lines_sent: 2,
                lines_received: 1,
                quit: true,
            }
        );
        assert_eq!(server.await.unwrap(), vec!["hello", "quit"]);
    }

    #[tokio::test]
    async fn test_input_eof_closes_without_quit() {
        let (client, server) = duplex(1024);
        let server = fake_server(server, b"");

        let input = Builder::new().read(b"one\ntwo\n").build();
        let output = Builder::new().build();

        let session = ChatSession::from_stream(client, ClientConfig::default());
        let summary = tokio::time::timeout(TIMEOUT, session.run(input, output))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.lines_sent, 2);
        assert_eq!(summary.lines_received, 0);
        assert!(!summary.quit);
        assert_eq!(server.await.unwrap(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_oversized_input_line_is_an_error_not_sent() {
        let (client, server) = duplex(1024);
        let server = fake_server(server, b"");

        let input = Builder::new().read(b"abcdefgh\nhello\n").build();
        let output = Builder::new().build();

        let config = ClientConfig::default().max_outbound_line_length(4);
        let session = ChatSession::from_stream(client, config);
        let result = tokio::time::timeout(TIMEOUT, session.run(input, output))
            .await
            .unwrap();

        assert!(matches!(result, Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::InvalidData));
        // Neither the oversized line nor anything after it reached the server
        assert!(server.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_sentinel() {
        let (client, server) = duplex(1024);
        let server = fake_server(server, b"");

        let input = Builder::new().read(b"quit\n/exit\n").build();
        let output = Builder::new().build();

        let config = ClientConfig::default().sentinel("/exit");
        let session = ChatSession::from_stream(client, config);
        let summary = tokio::time::timeout(TIMEOUT, session.run(input, output))
            .await
            .unwrap()
            .unwrap();

        assert!(summary.quit);
        assert_eq!(server.await.unwrap(), vec!["quit", "/exit"]);
    }
}
