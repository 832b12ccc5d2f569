//! TCP transport implementation.
//!
//! Cardforge speaks its framed protocol over a plain TCP stream; the
//! framing logic itself lives in [`crate::framing`]. A connection owns
//! the two stream halves separately so one task can block in `recv`
//! while another writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::framing::{FrameDecoder, encode_frame};
use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

const READ_CHUNK: usize = 8 * 1024;

/// A TCP-based [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        // Frames are small and latency matters more than throughput.
        let _ = stream.set_nodelay(true);

        let conn = TcpConnection::from_stream(stream);
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }
}

/// A single framed TCP connection.
///
/// `recv` returns whole frame payloads; `send` wraps payloads into frames.
/// Outgoing compression is off until [`set_compression`](Self::set_compression)
/// enables it after the handshake negotiates it.
pub struct TcpConnection {
    id: ConnectionId,
    reader: Mutex<(OwnedReadHalf, FrameDecoder)>,
    writer: Mutex<OwnedWriteHalf>,
    compress_out: AtomicBool,
}

impl TcpConnection {
    /// Wraps an established stream. Used by both `accept` and `connect`.
    pub fn from_stream(stream: TcpStream) -> Self {
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (read_half, write_half) = stream.into_split();
        Self {
            id,
            reader: Mutex::new((read_half, FrameDecoder::new())),
            writer: Mutex::new(write_half),
            compress_out: AtomicBool::new(false),
        }
    }

    /// Opens a client-side connection to a Cardforge server.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let _ = stream.set_nodelay(true);
        Ok(Self::from_stream(stream))
    }

    /// Enables or disables lz4 compression of outgoing frames.
    pub fn set_compression(&self, enabled: bool) {
        self.compress_out.store(enabled, Ordering::Relaxed);
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let frame =
            encode_frame(data, self.compress_out.load(Ordering::Relaxed));
        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut guard = self.reader.lock().await;
        let (read_half, decoder) = &mut *guard;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(frame) = decoder.next_frame()? {
                return Ok(Some(frame));
            }
            let n = read_half
                .read(&mut chunk)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                // EOF with undecoded bytes buffered is not a clean close.
                if decoder.buffered() > 0 {
                    return Err(TransportError::ConnectionClosed(format!(
                        "peer closed mid-frame with {} bytes buffered",
                        decoder.buffered()
                    )));
                }
                return Ok(None);
            }
            decoder.push(&chunk[..n]);
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl std::fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnection").field("id", &self.id).finish()
    }
}
