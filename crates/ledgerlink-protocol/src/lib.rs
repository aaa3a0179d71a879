//! Session handshake, framing discipline, and the typed query operations
//! built on top of the ledgerlink wire protocol.

pub mod error;
pub mod query;
pub mod session;

pub use error::ProtocolError;
pub use query::{get_balance, get_block_bytes, get_ip_list, resolve_tag};
pub use session::{Session, DEFAULT_PORT, SOCK_TIMEOUT};
