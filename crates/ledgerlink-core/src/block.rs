//! Block file decoder (spec.md §3, §4.4).
//!
//! A block file is header + body + 160-byte trailer, with the body split
//! into fixed 8824-byte transaction entries. The decoder performs no
//! semantic or cryptographic validation — it only scatters bytes into the
//! declared layout.

use crate::address::ADDR_LEN;
use crate::error::BlockError;

/// Declared header length; a header claiming any other value marks the
/// block as malformed.
pub const HEADER_LEN: usize = 2220;
/// Trailer length.
pub const TRAILER_LEN: usize = 160;
/// Size of a single transaction entry in the body.
pub const TX_ENTRY_LEN: usize = 8824;
const AMOUNT_LEN: usize = 8;
const HASH_LEN: usize = 32;
const SIG_LEN: usize = 2144;

/// Block header: declared length, miner address, miner reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub hdrlen: u32,
    pub miner_addr: [u8; ADDR_LEN],
    pub miner_reward: u64,
}

impl BlockHeader {
    fn from_bytes(bytes: &[u8]) -> Self {
        let hdrlen = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if hdrlen != HEADER_LEN as u32 {
            return Self { hdrlen, miner_addr: [0; ADDR_LEN], miner_reward: 0 };
        }
        let mut miner_addr = [0u8; ADDR_LEN];
        miner_addr.copy_from_slice(&bytes[4..4 + ADDR_LEN]);
        let miner_reward =
            u64::from_le_bytes(bytes[4 + ADDR_LEN..4 + ADDR_LEN + AMOUNT_LEN].try_into().unwrap());
        Self { hdrlen, miner_addr, miner_reward }
    }
}

/// A single transaction entry within a block body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEntry {
    pub src_addr: [u8; ADDR_LEN],
    pub dst_addr: [u8; ADDR_LEN],
    pub chg_addr: [u8; ADDR_LEN],
    pub send_total: u64,
    pub change_total: u64,
    pub tx_fee: u64,
    pub tx_sig: [u8; SIG_LEN],
    pub tx_id: [u8; HASH_LEN],
}

impl TxEntry {
    fn from_bytes(bytes: &[u8]) -> Self {
        let mut off = 0;
        let mut take = |n: usize| {
            let slice = &bytes[off..off + n];
            off += n;
            slice
        };
        let mut src_addr = [0u8; ADDR_LEN];
        src_addr.copy_from_slice(take(ADDR_LEN));
        let mut dst_addr = [0u8; ADDR_LEN];
        dst_addr.copy_from_slice(take(ADDR_LEN));
        let mut chg_addr = [0u8; ADDR_LEN];
        chg_addr.copy_from_slice(take(ADDR_LEN));
        let send_total = u64::from_le_bytes(take(AMOUNT_LEN).try_into().unwrap());
        let change_total = u64::from_le_bytes(take(AMOUNT_LEN).try_into().unwrap());
        let tx_fee = u64::from_le_bytes(take(AMOUNT_LEN).try_into().unwrap());
        let mut tx_sig = [0u8; SIG_LEN];
        tx_sig.copy_from_slice(take(SIG_LEN));
        let mut tx_id = [0u8; HASH_LEN];
        tx_id.copy_from_slice(take(HASH_LEN));
        Self { src_addr, dst_addr, chg_addr, send_total, change_total, tx_fee, tx_sig, tx_id }
    }
}

/// Block trailer: fixed 160-byte footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTrailer {
    pub prev_hash: [u8; HASH_LEN],
    pub block_num: [u8; 8],
    pub mining_fee: [u8; 8],
    pub tx_count: [u8; 4],
    pub time0: [u8; 4],
    pub difficulty: [u8; 4],
    pub merkle_root: [u8; HASH_LEN],
    pub nonce: [u8; HASH_LEN],
    pub solve_time: [u8; 4],
    pub block_hash: [u8; HASH_LEN],
}

impl BlockTrailer {
    fn from_bytes(bytes: &[u8]) -> Self {
        let mut off = 0;
        let mut take = |n: usize| {
            let slice = &bytes[off..off + n];
            off += n;
            slice
        };
        let mut prev_hash = [0u8; HASH_LEN];
        prev_hash.copy_from_slice(take(HASH_LEN));
        let mut block_num = [0u8; 8];
        block_num.copy_from_slice(take(8));
        let mut mining_fee = [0u8; 8];
        mining_fee.copy_from_slice(take(8));
        let mut tx_count = [0u8; 4];
        tx_count.copy_from_slice(take(4));
        let mut time0 = [0u8; 4];
        time0.copy_from_slice(take(4));
        let mut difficulty = [0u8; 4];
        difficulty.copy_from_slice(take(4));
        let mut merkle_root = [0u8; HASH_LEN];
        merkle_root.copy_from_slice(take(HASH_LEN));
        let mut nonce = [0u8; HASH_LEN];
        nonce.copy_from_slice(take(HASH_LEN));
        let mut solve_time = [0u8; 4];
        solve_time.copy_from_slice(take(4));
        let mut block_hash = [0u8; HASH_LEN];
        block_hash.copy_from_slice(take(HASH_LEN));
        Self {
            prev_hash,
            block_num,
            mining_fee,
            tx_count,
            time0,
            difficulty,
            merkle_root,
            nonce,
            solve_time,
            block_hash,
        }
    }
}

/// A fully decoded block file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub body: Vec<TxEntry>,
    pub trailer: BlockTrailer,
}

impl Block {
    /// Decode a block file. Requires `bytes.len() >= HEADER_LEN + TRAILER_LEN`
    /// (2380 bytes) — a network-driven caller can legitimately hand back a
    /// shorter buffer (a peer that sends one short `SEND_FILE` frame then
    /// closes the connection), so that case is a [`BlockError::TooShort`],
    /// not a panic. If the header's declared length does not equal
    /// [`HEADER_LEN`], the block is malformed and decodes with an empty body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BlockError> {
        if bytes.len() < HEADER_LEN + TRAILER_LEN {
            return Err(BlockError::TooShort { expected: HEADER_LEN + TRAILER_LEN, actual: bytes.len() });
        }

        let header = BlockHeader::from_bytes(&bytes[..HEADER_LEN]);
        let trailer = BlockTrailer::from_bytes(&bytes[bytes.len() - TRAILER_LEN..]);

        let body = if header.hdrlen != HEADER_LEN as u32 {
            Vec::new()
        } else {
            let body_bytes = &bytes[HEADER_LEN..bytes.len() - TRAILER_LEN];
            body_bytes.chunks_exact(TX_ENTRY_LEN).map(TxEntry::from_bytes).collect()
        };

        Ok(Self { header, body, trailer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_header(bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&(HEADER_LEN as u32).to_le_bytes());
    }

    #[test]
    fn decodes_block_with_two_transactions() {
        let total_len = HEADER_LEN + TX_ENTRY_LEN * 2 + TRAILER_LEN;
        assert_eq!(total_len, 20044);
        let mut bytes = vec![0u8; total_len];
        valid_header(&mut bytes);
        let hash_off = total_len - HASH_LEN;
        bytes[hash_off..].copy_from_slice(&[0xAB; HASH_LEN]);

        let block = Block::from_bytes(&bytes).unwrap();
        assert_eq!(block.body.len(), 2);
        assert_eq!(block.trailer.block_hash, [0xAB; HASH_LEN]);
    }

    #[test]
    fn malformed_header_yields_empty_body() {
        let total_len = HEADER_LEN + TX_ENTRY_LEN + TRAILER_LEN;
        let mut bytes = vec![0u8; total_len];
        bytes[0..4].copy_from_slice(&999u32.to_le_bytes()); // wrong hdrlen

        let block = Block::from_bytes(&bytes).unwrap();
        assert!(block.body.is_empty());
    }

    #[test]
    fn body_length_is_multiple_of_entry_size() {
        let total_len = HEADER_LEN + TX_ENTRY_LEN * 3 + TRAILER_LEN;
        let mut bytes = vec![0u8; total_len];
        valid_header(&mut bytes);
        let block = Block::from_bytes(&bytes).unwrap();
        assert_eq!(block.body.len(), 3);
        let body_len = total_len - HEADER_LEN - TRAILER_LEN;
        assert_eq!(body_len % TX_ENTRY_LEN, 0);
    }

    #[test]
    fn buffer_shorter_than_header_plus_trailer_is_too_short() {
        let bytes = vec![0u8; HEADER_LEN + TRAILER_LEN - 1];
        assert_eq!(
            Block::from_bytes(&bytes),
            Err(BlockError::TooShort { expected: HEADER_LEN + TRAILER_LEN, actual: bytes.len() })
        );
    }
}
