use thiserror::Error;

/// Errors arising from frame or block wire-format validation.
///
/// These are integrity failures only; semantic negative results (tag not
/// found, address not found, ...) live in `ledgerlink-protocol` since they
/// require a valid, well-formed frame to be detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer passed to `Frame::decode` was not exactly [`Frame::SIZE`] bytes.
    #[error("expected frame of {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    /// Recomputed CRC-16/XMODEM did not match the frame's stored checksum.
    #[error("crc16 mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    BadCrc { expected: u16, computed: u16 },

    /// Trailer constant did not equal `0xcdab`.
    #[error("bad trailer: expected {expected:#06x}, got {actual:#06x}")]
    BadTrailer { expected: u16, actual: u16 },
}

/// Errors decoding a block file buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// Buffer was shorter than a header plus trailer (2380 bytes); a
    /// network-driven caller can legitimately hand back a buffer this
    /// short (e.g. a peer that sends one short `SEND_FILE` frame then
    /// closes the connection), so this is a recoverable error, not a panic.
    #[error("block buffer too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
}
