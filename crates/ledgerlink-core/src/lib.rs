//! Wire-level types for the ledgerlink peer-to-peer client.
//!
//! This crate owns the parts of the protocol that are pure data: the fixed
//! 8920-byte frame, its CRC-16/XMODEM checksum, the opcode table, the
//! WOTS-style address/amount model, and the block file decoder. Session
//! handling and network I/O live in `ledgerlink-protocol`.

pub mod address;
pub mod block;
pub mod crc16;
pub mod error;
pub mod frame;
pub mod opcode;

pub use address::WotsAddress;
pub use block::Block;
pub use error::{BlockError, FrameError};
pub use frame::Frame;
pub use opcode::Opcode;
