//! Typed query operations layered on top of a [`Session`] (spec.md §4.3).
//!
//! Each function owns exactly one request/response exchange (or, for
//! `get_block_bytes`, a request followed by a file-transfer receive). None
//! of them retry; a caller doing quorum fan-out is expected to open a fresh
//! session per peer and treat any error as that peer's result.

use ledgerlink_core::{Frame, Opcode, WotsAddress};

use crate::error::ProtocolError;
use crate::session::Session;

/// Ask a peer for its list of known peer IP addresses.
///
/// The response payload is packed into `SrcAddr` as 4-byte IPv4 groups; the
/// group count is `Len[0] / 4` — the low byte of the little-endian `Len`
/// field, matching the reference client's truncation.
pub async fn get_ip_list(session: &mut Session) -> Result<Vec<String>, ProtocolError> {
    let request = session.new_frame();
    let reply = session.request(Opcode::GetIpl, request).await?;

    if !Opcode::SendIpl.matches(reply.opcode) {
        return Err(ProtocolError::UnexpectedOpcode(reply.opcode));
    }

    let count = (reply.len.to_le_bytes()[0] as usize) / 4;
    Ok(reply.src_addr[..count * 4]
        .chunks_exact(4)
        .map(|g| format!("{}.{}.{}.{}", g[0], g[1], g[2], g[3]))
        .collect())
}

/// Resolve a 12-byte tag to its full WOTS address via a peer.
///
/// The request carries the lookup tag embedded in `DstAddr`'s tag field;
/// the peer echoes the same `RESOLVE` opcode back, distinguishing success
/// from failure via the first byte of `SendTotal` rather than the opcode.
pub async fn resolve_tag(session: &mut Session, tag: &[u8]) -> Result<(WotsAddress, u64), ProtocolError> {
    let mut request = session.new_frame();
    let mut probe = WotsAddress::default();
    probe.set_tag(tag);
    request.dst_addr.copy_from_slice(probe.bytes());

    let reply = session.request(Opcode::Resolve, request).await?;

    if !Opcode::Resolve.matches(reply.opcode) {
        return Err(ProtocolError::UnexpectedOpcode(reply.opcode));
    }
    if reply.send_total[0] != 1 {
        return Err(ProtocolError::TagNotFound);
    }

    let address = WotsAddress::from_bytes(&reply.dst_addr);
    let amount = u64::from_le_bytes(reply.change_total);
    Ok((address, amount))
}

/// Query a peer for the balance of a full WOTS address.
///
/// Success is signaled by the first byte of `ChangeTotal`, not by the
/// opcode: a peer without the requested account still replies `SEND_BAL`
/// with that flag clear.
pub async fn get_balance(session: &mut Session, address: &WotsAddress) -> Result<u64, ProtocolError> {
    let mut request = session.new_frame();
    request.src_addr.copy_from_slice(address.bytes());

    let reply = session.request(Opcode::Balance, request).await?;

    if !Opcode::SendBal.matches(reply.opcode) {
        return Err(ProtocolError::UnexpectedOpcode(reply.opcode));
    }
    if reply.change_total[0] != 1 {
        return Err(ProtocolError::AddressNotFound);
    }

    Ok(u64::from_le_bytes(reply.send_total))
}

/// Download the raw bytes of the block at `block_num` from a peer.
pub async fn get_block_bytes(session: &mut Session, block_num: u64) -> Result<Vec<u8>, ProtocolError> {
    let mut request = session.new_frame();
    request.block_num = block_num;
    request.set_opcode(Opcode::GetBlock);

    let first = session.request(Opcode::GetBlock, request).await?;
    if Opcode::Nack.matches(first.opcode) {
        return Err(ProtocolError::BlockMissing);
    }
    if !Opcode::SendFile.matches(first.opcode) {
        return Err(ProtocolError::UnexpectedOpcode(first.opcode));
    }

    let first_len = (first.len as usize).min(Frame::PAYLOAD_LEN);
    let mut file = first.payload()[..first_len].to_vec();
    let rest = session.recv_file().await?;
    file.extend_from_slice(&rest);
    Ok(file)
}
