use ledgerlink_core::FrameError;
use thiserror::Error;

/// Errors surfaced by a session or a query operation.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Could not open the TCP connection.
    #[error("connect to {ip} failed: {source}")]
    Connect { ip: String, #[source] source: std::io::Error },

    /// A read or write exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// Frame-integrity failure. The session must be discarded; never retry
    /// on the same connection.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A socket I/O error outside of deserialization.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The response opcode did not match what the operation expected.
    #[error("unexpected opcode: {0}")]
    UnexpectedOpcode(u16),

    /// `ResolveTag` found no address for the requested tag.
    #[error("tag not found")]
    TagNotFound,

    /// `GetBalance` found no account for the requested address.
    #[error("address not found")]
    AddressNotFound,

    /// The peer has no block at the requested height.
    #[error("block missing")]
    BlockMissing,
}
