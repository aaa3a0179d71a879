//! The session state machine: one TCP connection, the handshake, and the
//! request/response discipline that binds successive frames together
//! (spec.md §4.2).

use std::time::Duration;

use ledgerlink_core::{Frame, Opcode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::ProtocolError;

/// Default port the reference network listens on.
pub const DEFAULT_PORT: u16 = 2095;
/// Read and write deadline, installed once at connect time.
pub const SOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// An open connection to a single peer, after a successful handshake.
///
/// Not safe for concurrent use by multiple tasks: a session is single-owner,
/// strictly request/response. Callers obtain concurrency by opening
/// independent sessions to different peers.
pub struct Session {
    ip: String,
    stream: TcpStream,
    id1: u16,
    id2: u16,
    /// Peer's most recently advertised block height (the `CBlock` field of
    /// every received frame). Zero after a failed or not-yet-attempted
    /// handshake.
    block_height: u64,
}

impl Session {
    /// Open a TCP connection to `ip:2095`. Does not perform the handshake —
    /// call [`Session::handshake`] next, or use [`Session::open`] to do both.
    #[tracing::instrument(skip_all, fields(ip = %ip))]
    pub async fn connect(ip: &str) -> Result<Self, ProtocolError> {
        let addr = format!("{ip}:{DEFAULT_PORT}");
        let stream = timeout(SOCK_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|_| ProtocolError::Timeout)?
            .map_err(|source| ProtocolError::Connect { ip: ip.to_string(), source })?;
        tracing::debug!("connected");
        Ok(Self { ip: ip.to_string(), stream, id1: 0, id2: 0, block_height: 0 })
    }

    /// Connect and perform the HELLO handshake in one step, mirroring
    /// `ConnectToNode` in the reference client.
    pub async fn open(ip: &str) -> Result<Self, ProtocolError> {
        let mut session = Self::connect(ip).await?;
        session.handshake().await?;
        Ok(session)
    }

    /// Send HELLO with a random client-chosen `ID1`, then require a
    /// HELLO_ACK reply; copies the server-chosen `ID2` for all subsequent
    /// frames on this connection.
    #[tracing::instrument(skip_all, fields(ip = %self.ip))]
    pub async fn handshake(&mut self) -> Result<(), ProtocolError> {
        let mut hello = Frame::hello();
        hello.set_opcode(Opcode::Hello);
        self.id1 = hello.id1;

        self.write_frame(&hello).await?;
        let reply = self.read_frame().await?;

        if !Opcode::HelloAck.matches(reply.opcode) {
            return Err(ProtocolError::UnexpectedOpcode(reply.opcode));
        }

        self.id2 = reply.id2;
        self.block_height = reply.cblock;
        tracing::debug!(block_height = self.block_height, "handshake complete");
        Ok(())
    }

    /// Peer IP this session is connected to.
    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Build a session around an already-open stream, skipping connect and
    /// handshake. Used by tests in this crate that drive both ends of a
    /// loopback socket directly.
    #[cfg(test)]
    pub(crate) fn from_raw_parts(ip: String, stream: TcpStream) -> Self {
        Self { ip, stream, id1: 0, id2: 0, block_height: 0 }
    }

    /// Peer's most recently advertised block height.
    #[must_use]
    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Build a frame carrying this session's connection identifiers, ready
    /// for the caller to populate payload fields before sending.
    #[must_use]
    pub fn new_frame(&self) -> Frame {
        let mut frame = Frame::hello();
        frame.id1 = self.id1;
        frame.id2 = self.id2;
        frame
    }

    /// Send `frame` with the given opcode stamped on, then read and
    /// validate exactly one inbound frame.
    pub async fn request(&mut self, opcode: Opcode, mut frame: Frame) -> Result<Frame, ProtocolError> {
        frame.set_opcode(opcode);
        self.write_frame(&frame).await?;
        self.read_frame().await
    }

    /// Receive a multi-frame file transfer: repeatedly read frames with
    /// opcode `SEND_FILE`, appending their declared payload bytes, until the
    /// connection closes. A clean EOF is the normal termination condition,
    /// not an error.
    pub async fn recv_file(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut file = Vec::new();
        loop {
            match self.try_read_frame().await? {
                None => return Ok(file),
                Some(frame) => {
                    if !Opcode::SendFile.matches(frame.opcode) {
                        return Err(ProtocolError::UnexpectedOpcode(frame.opcode));
                    }
                    let len = (frame.len as usize).min(Frame::PAYLOAD_LEN);
                    file.extend_from_slice(&frame.payload()[..len]);
                }
            }
        }
    }

    async fn write_frame(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        let wire = frame.serialize();
        timeout(SOCK_TIMEOUT, self.stream.write_all(&wire))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        Ok(())
    }

    /// Read exactly one frame, treating any EOF (clean or partial) as an
    /// error. Use [`Session::try_read_frame`] where EOF is a valid outcome.
    async fn read_frame(&mut self) -> Result<Frame, ProtocolError> {
        match self.try_read_frame().await? {
            Some(frame) => Ok(frame),
            None => Err(ProtocolError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before a frame was received",
            ))),
        }
    }

    /// Read one frame, or `None` on a clean EOF (no bytes read before the
    /// connection closed). A partial frame followed by EOF is an error.
    async fn try_read_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        let mut buf = [0u8; Frame::SIZE];
        let mut filled = 0usize;

        while filled < buf.len() {
            let n = timeout(SOCK_TIMEOUT, self.stream.read(&mut buf[filled..]))
                .await
                .map_err(|_| ProtocolError::Timeout)??;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(ProtocolError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed mid-frame",
                )));
            }
            filled += n;
        }

        let frame = Frame::deserialize(&buf)?;
        self.block_height = frame.cblock;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt as _;
    use tokio::net::TcpListener;

    async fn paired_session() -> (Session, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let session = Session::from_raw_parts(addr.ip().to_string(), client);
        (session, server)
    }

    #[tokio::test]
    async fn handshake_sets_id2_and_block_height() {
        let (mut session, mut server) = paired_session().await;

        let server_task = tokio::spawn(async move {
            let mut buf = [0u8; Frame::SIZE];
            server.read_exact(&mut buf).await.unwrap();
            let req = Frame::deserialize(&buf).unwrap();
            assert!(Opcode::Hello.matches(req.opcode));

            let mut ack = Frame::hello();
            ack.id1 = req.id1;
            ack.id2 = 0x5678;
            ack.cblock = 42;
            ack.set_opcode(Opcode::HelloAck);
            server.write_all(&ack.serialize()).await.unwrap();
        });

        session.handshake().await.unwrap();
        server_task.await.unwrap();

        assert_eq!(session.id2, 0x5678);
        assert_eq!(session.block_height(), 42);
    }

    #[tokio::test]
    async fn handshake_rejects_wrong_opcode() {
        let (mut session, mut server) = paired_session().await;

        let server_task = tokio::spawn(async move {
            let mut buf = [0u8; Frame::SIZE];
            server.read_exact(&mut buf).await.unwrap();
            let mut nack = Frame::hello();
            nack.set_opcode(Opcode::Nack);
            server.write_all(&nack.serialize()).await.unwrap();
        });

        let result = session.handshake().await;
        server_task.await.unwrap();
        assert!(matches!(result, Err(ProtocolError::UnexpectedOpcode(_))));
    }

    #[tokio::test]
    async fn recv_file_terminates_cleanly_on_eof() {
        let (mut session, mut server) = paired_session().await;

        let server_task = tokio::spawn(async move {
            let mut frame = Frame::hello();
            frame.set_opcode(Opcode::SendFile);
            frame.len = 4;
            frame.src_addr[0..4].copy_from_slice(b"data");
            server.write_all(&frame.serialize()).await.unwrap();
            // Close the connection: normal end-of-file termination.
        });

        let file = session.recv_file().await.unwrap();
        server_task.await.unwrap();
        assert_eq!(file, b"data");
    }

    #[tokio::test]
    async fn recv_file_handles_len_beyond_src_addr_field() {
        // A full block-download chunk routinely exceeds SrcAddr's 2208
        // bytes; Len spans the whole contiguous payload region instead.
        let (mut session, mut server) = paired_session().await;
        let chunk_len = Frame::PAYLOAD_LEN - 16;

        let server_task = tokio::spawn(async move {
            let mut frame = Frame::hello();
            frame.set_opcode(Opcode::SendFile);
            frame.len = chunk_len as u16;
            frame.tx_sig.iter_mut().for_each(|b| *b = 0x42);
            server.write_all(&frame.serialize()).await.unwrap();
        });

        let file = session.recv_file().await.unwrap();
        server_task.await.unwrap();
        assert_eq!(file.len(), chunk_len);
        assert_eq!(*file.last().unwrap(), 0x42);
    }
}
