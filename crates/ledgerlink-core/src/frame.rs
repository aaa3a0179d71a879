//! The fixed 8920-byte wire frame (spec.md §3, §4.1).
//!
//! All multi-byte integers are little-endian except `Network` and `Trailer`,
//! which are big-endian constants — intentional, load-bearing magic that
//! must round-trip bit-exactly.

use crate::address::ADDR_LEN;
use crate::crc16::crc16_xmodem;
use crate::error::FrameError;
use crate::opcode::Opcode;

const AMOUNT_LEN: usize = 8;
const HASH_LEN: usize = 32;
const WEIGHT_LEN: usize = 32;
const SIG_LEN: usize = 2144;

// Byte offsets, per spec.md §3.
const OFF_VERSION: usize = 0;
const OFF_NETWORK: usize = 2;
const OFF_ID1: usize = 4;
const OFF_ID2: usize = 6;
const OFF_OPCODE: usize = 8;
const OFF_CBLOCK: usize = 10;
const OFF_BLOCKNUM: usize = 18;
const OFF_CBLOCKHASH: usize = 26;
const OFF_PBLOCKHASH: usize = 58;
const OFF_WEIGHT: usize = 90;
const OFF_LEN: usize = 122;
const OFF_SRC_ADDR: usize = 124;
const OFF_DST_ADDR: usize = OFF_SRC_ADDR + ADDR_LEN; // 2332
const OFF_CHG_ADDR: usize = OFF_DST_ADDR + ADDR_LEN; // 4540
const OFF_SEND_TOTAL: usize = OFF_CHG_ADDR + ADDR_LEN; // 6748
const OFF_CHANGE_TOTAL: usize = OFF_SEND_TOTAL + AMOUNT_LEN; // 6756
const OFF_TX_FEE: usize = OFF_CHANGE_TOTAL + AMOUNT_LEN; // 6764
const OFF_TX_SIG: usize = OFF_TX_FEE + AMOUNT_LEN; // 6772
const OFF_CRC16: usize = OFF_TX_SIG + SIG_LEN; // 8916
const OFF_TRAILER: usize = OFF_CRC16 + 2; // 8918

/// The fixed-layout protocol frame.
#[derive(Clone)]
pub struct Frame {
    pub version: u8,
    pub network: u16,
    pub id1: u16,
    pub id2: u16,
    pub opcode: u16,
    pub cblock: u64,
    pub block_num: u64,
    pub cblock_hash: [u8; HASH_LEN],
    pub pblock_hash: [u8; HASH_LEN],
    pub weight: [u8; WEIGHT_LEN],
    pub len: u16,
    pub src_addr: [u8; ADDR_LEN],
    pub dst_addr: [u8; ADDR_LEN],
    pub chg_addr: [u8; ADDR_LEN],
    pub send_total: [u8; AMOUNT_LEN],
    pub change_total: [u8; AMOUNT_LEN],
    pub tx_fee: [u8; AMOUNT_LEN],
    pub tx_sig: [u8; SIG_LEN],
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            version: 0,
            network: 0,
            id1: 0,
            id2: 0,
            opcode: 0,
            cblock: 0,
            block_num: 0,
            cblock_hash: [0; HASH_LEN],
            pblock_hash: [0; HASH_LEN],
            weight: [0; WEIGHT_LEN],
            len: 0,
            src_addr: [0; ADDR_LEN],
            dst_addr: [0; ADDR_LEN],
            chg_addr: [0; ADDR_LEN],
            send_total: [0; AMOUNT_LEN],
            change_total: [0; AMOUNT_LEN],
            tx_fee: [0; AMOUNT_LEN],
            tx_sig: [0; SIG_LEN],
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("version", &self.version)
            .field("network", &format!("{:#06x}", self.network))
            .field("id1", &self.id1)
            .field("id2", &self.id2)
            .field("opcode", &self.opcode)
            .field("cblock", &self.cblock)
            .field("block_num", &self.block_num)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Serialized size in bytes.
    pub const SIZE: usize = 8920;
    /// Network constant (big-endian on the wire).
    pub const NETWORK: u16 = 0x3905;
    /// Trailer constant (big-endian on the wire).
    pub const TRAILER: u16 = 0xcdab;
    /// Protocol version.
    pub const VERSION: u8 = 4;
    /// Bytes covered by the CRC-16 checksum.
    pub const CRC_COVERAGE: usize = OFF_CRC16;

    /// A freshly initialized handshake frame: version, network, and trailer
    /// set to their protocol constants, a random client-chosen `ID1`, and
    /// every other field zeroed. Mirrors `TX.Init()` in the reference
    /// client — the opcode is stamped separately by the session before
    /// sending.
    #[must_use]
    pub fn hello() -> Self {
        let mut frame = Self { version: Self::VERSION, network: Self::NETWORK, ..Self::default() };
        frame.id1 = rand::random::<u16>();
        frame
    }

    /// Serialize into an 8920-byte wire buffer, computing and embedding the
    /// CRC-16/XMODEM checksum over `[0, 8916)` and writing the big-endian
    /// trailer constant.
    #[must_use]
    pub fn serialize(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];

        buf[OFF_VERSION] = self.version;
        buf[OFF_VERSION + 1] = 0;
        buf[OFF_NETWORK..OFF_NETWORK + 2].copy_from_slice(&self.network.to_be_bytes());
        buf[OFF_ID1..OFF_ID1 + 2].copy_from_slice(&self.id1.to_le_bytes());
        buf[OFF_ID2..OFF_ID2 + 2].copy_from_slice(&self.id2.to_le_bytes());
        buf[OFF_OPCODE..OFF_OPCODE + 2].copy_from_slice(&self.opcode.to_le_bytes());
        buf[OFF_CBLOCK..OFF_CBLOCK + 8].copy_from_slice(&self.cblock.to_le_bytes());
        buf[OFF_BLOCKNUM..OFF_BLOCKNUM + 8].copy_from_slice(&self.block_num.to_le_bytes());
        buf[OFF_CBLOCKHASH..OFF_CBLOCKHASH + HASH_LEN].copy_from_slice(&self.cblock_hash);
        buf[OFF_PBLOCKHASH..OFF_PBLOCKHASH + HASH_LEN].copy_from_slice(&self.pblock_hash);
        buf[OFF_WEIGHT..OFF_WEIGHT + WEIGHT_LEN].copy_from_slice(&self.weight);
        buf[OFF_LEN..OFF_LEN + 2].copy_from_slice(&self.len.to_le_bytes());
        buf[OFF_SRC_ADDR..OFF_SRC_ADDR + ADDR_LEN].copy_from_slice(&self.src_addr);
        buf[OFF_DST_ADDR..OFF_DST_ADDR + ADDR_LEN].copy_from_slice(&self.dst_addr);
        buf[OFF_CHG_ADDR..OFF_CHG_ADDR + ADDR_LEN].copy_from_slice(&self.chg_addr);
        buf[OFF_SEND_TOTAL..OFF_SEND_TOTAL + AMOUNT_LEN].copy_from_slice(&self.send_total);
        buf[OFF_CHANGE_TOTAL..OFF_CHANGE_TOTAL + AMOUNT_LEN].copy_from_slice(&self.change_total);
        buf[OFF_TX_FEE..OFF_TX_FEE + AMOUNT_LEN].copy_from_slice(&self.tx_fee);
        buf[OFF_TX_SIG..OFF_TX_SIG + SIG_LEN].copy_from_slice(&self.tx_sig);

        let crc = crc16_xmodem(&buf[..Self::CRC_COVERAGE]);
        buf[OFF_CRC16..OFF_CRC16 + 2].copy_from_slice(&crc.to_le_bytes());
        buf[OFF_TRAILER..OFF_TRAILER + 2].copy_from_slice(&Self::TRAILER.to_be_bytes());

        buf
    }

    /// Parse an 8920-byte wire buffer, validating the trailer constant and
    /// the CRC-16/XMODEM checksum. Does not require `Network == 0x3905`
    /// (spec.md notes implementations may be lenient here).
    pub fn deserialize(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != Self::SIZE {
            return Err(FrameError::ShortFrame { expected: Self::SIZE, actual: bytes.len() });
        }

        let trailer = u16::from_be_bytes([bytes[OFF_TRAILER], bytes[OFF_TRAILER + 1]]);
        if trailer != Self::TRAILER {
            return Err(FrameError::BadTrailer { expected: Self::TRAILER, actual: trailer });
        }

        let stored_crc = u16::from_le_bytes([bytes[OFF_CRC16], bytes[OFF_CRC16 + 1]]);
        let computed_crc = crc16_xmodem(&bytes[..Self::CRC_COVERAGE]);
        if stored_crc != computed_crc {
            return Err(FrameError::BadCrc { expected: stored_crc, computed: computed_crc });
        }

        let mut frame = Self {
            version: bytes[OFF_VERSION],
            network: u16::from_be_bytes([bytes[OFF_NETWORK], bytes[OFF_NETWORK + 1]]),
            id1: u16::from_le_bytes([bytes[OFF_ID1], bytes[OFF_ID1 + 1]]),
            id2: u16::from_le_bytes([bytes[OFF_ID2], bytes[OFF_ID2 + 1]]),
            opcode: u16::from_le_bytes([bytes[OFF_OPCODE], bytes[OFF_OPCODE + 1]]),
            cblock: u64::from_le_bytes(bytes[OFF_CBLOCK..OFF_CBLOCK + 8].try_into().unwrap()),
            block_num: u64::from_le_bytes(
                bytes[OFF_BLOCKNUM..OFF_BLOCKNUM + 8].try_into().unwrap(),
            ),
            len: u16::from_le_bytes([bytes[OFF_LEN], bytes[OFF_LEN + 1]]),
            ..Self::default()
        };
        frame.cblock_hash.copy_from_slice(&bytes[OFF_CBLOCKHASH..OFF_CBLOCKHASH + HASH_LEN]);
        frame.pblock_hash.copy_from_slice(&bytes[OFF_PBLOCKHASH..OFF_PBLOCKHASH + HASH_LEN]);
        frame.weight.copy_from_slice(&bytes[OFF_WEIGHT..OFF_WEIGHT + WEIGHT_LEN]);
        frame.src_addr.copy_from_slice(&bytes[OFF_SRC_ADDR..OFF_SRC_ADDR + ADDR_LEN]);
        frame.dst_addr.copy_from_slice(&bytes[OFF_DST_ADDR..OFF_DST_ADDR + ADDR_LEN]);
        frame.chg_addr.copy_from_slice(&bytes[OFF_CHG_ADDR..OFF_CHG_ADDR + ADDR_LEN]);
        frame.send_total.copy_from_slice(&bytes[OFF_SEND_TOTAL..OFF_SEND_TOTAL + AMOUNT_LEN]);
        frame
            .change_total
            .copy_from_slice(&bytes[OFF_CHANGE_TOTAL..OFF_CHANGE_TOTAL + AMOUNT_LEN]);
        frame.tx_fee.copy_from_slice(&bytes[OFF_TX_FEE..OFF_TX_FEE + AMOUNT_LEN]);
        frame.tx_sig.copy_from_slice(&bytes[OFF_TX_SIG..OFF_TX_SIG + SIG_LEN]);

        Ok(frame)
    }

    /// Stamp the given opcode onto this frame.
    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.opcode = opcode.to_u16();
    }

    /// Byte offset at which `SrcAddr` (and, for file transfer, raw file
    /// payload) begins.
    pub const SRC_ADDR_OFFSET: usize = OFF_SRC_ADDR;

    /// Length of the contiguous on-wire payload region `[124, 8916)`.
    pub const PAYLOAD_LEN: usize = OFF_CRC16 - OFF_SRC_ADDR;

    /// The contiguous on-wire payload region `[124, 8916)` — `SrcAddr`
    /// through `TxSig` concatenated in field order, exactly as it appears
    /// on the wire. File-transfer frames carry their chunk here with a
    /// `Len` that can exceed the 2208-byte `SrcAddr` field alone, so
    /// `SEND_FILE` handling must slice this instead of `src_addr`.
    #[must_use]
    pub fn payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::PAYLOAD_LEN);
        buf.extend_from_slice(&self.src_addr);
        buf.extend_from_slice(&self.dst_addr);
        buf.extend_from_slice(&self.chg_addr);
        buf.extend_from_slice(&self.send_total);
        buf.extend_from_slice(&self.change_total);
        buf.extend_from_slice(&self.tx_fee);
        buf.extend_from_slice(&self.tx_sig);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hello_frame_is_mostly_zero() {
        let frame = Frame::hello();
        assert_eq!(frame.version, Frame::VERSION);
        assert_eq!(frame.network, Frame::NETWORK);
        assert_eq!(frame.opcode, 0);
        assert_eq!(frame.cblock, 0);
        assert_eq!(frame.src_addr, [0u8; ADDR_LEN]);
    }

    #[test]
    fn serialize_sets_trailer_and_crc() {
        let frame = Frame::hello();
        let wire = frame.serialize();
        assert_eq!(u16::from_be_bytes([wire[8918], wire[8919]]), Frame::TRAILER);
        let crc = u16::from_le_bytes([wire[8916], wire[8917]]);
        assert_eq!(crc, crc16_xmodem(&wire[..8916]));
    }

    #[test]
    fn reject_short_frame() {
        assert_eq!(
            Frame::deserialize(&[0u8; Frame::SIZE - 1]),
            Err(FrameError::ShortFrame { expected: Frame::SIZE, actual: Frame::SIZE - 1 })
        );
        assert_eq!(
            Frame::deserialize(&[0u8; Frame::SIZE + 1]),
            Err(FrameError::ShortFrame { expected: Frame::SIZE, actual: Frame::SIZE + 1 })
        );
    }

    #[test]
    fn reject_bad_trailer() {
        let mut wire = Frame::hello().serialize();
        wire[8918] = 0;
        wire[8919] = 0;
        assert!(matches!(Frame::deserialize(&wire), Err(FrameError::BadTrailer { .. })));
    }

    #[test]
    fn payload_spans_src_addr_through_tx_sig() {
        let mut frame = Frame::hello();
        frame.src_addr[0] = 0xAA;
        frame.tx_sig[SIG_LEN - 1] = 0xBB;
        let payload = frame.payload();
        assert_eq!(payload.len(), Frame::PAYLOAD_LEN);
        assert_eq!(payload[0], 0xAA);
        assert_eq!(payload[payload.len() - 1], 0xBB);
    }

    #[test]
    fn payload_exceeds_src_addr_len_for_large_file_chunks() {
        // A full block-download chunk routinely fills more than the
        // 2208-byte SrcAddr field alone; payload() must expose the whole
        // contiguous [124, 8916) region so such a Len doesn't panic.
        let frame = Frame::hello();
        assert!(Frame::PAYLOAD_LEN > ADDR_LEN);
        assert_eq!(frame.payload().len(), Frame::PAYLOAD_LEN);
    }

    #[test]
    fn reject_bad_crc() {
        let mut wire = Frame::hello().serialize();
        wire[0] ^= 0xff; // corrupt a byte inside the CRC coverage range
        assert!(matches!(Frame::deserialize(&wire), Err(FrameError::BadCrc { .. })));
    }

    fn arbitrary_frame() -> impl Strategy<Value = Frame> {
        (any::<u16>(), any::<u16>(), any::<u16>(), any::<u64>(), any::<u64>(), any::<u16>()).prop_map(
            |(id1, id2, opcode, cblock, block_num, len)| Frame {
                version: Frame::VERSION,
                network: Frame::NETWORK,
                id1,
                id2,
                opcode,
                cblock,
                block_num,
                len,
                ..Frame::default()
            },
        )
    }

    proptest! {
        #[test]
        fn frame_round_trips(frame in arbitrary_frame()) {
            let wire = frame.serialize();
            let parsed = Frame::deserialize(&wire).expect("valid frame decodes");
            prop_assert_eq!(parsed.id1, frame.id1);
            prop_assert_eq!(parsed.id2, frame.id2);
            prop_assert_eq!(parsed.opcode, frame.opcode);
            prop_assert_eq!(parsed.cblock, frame.cblock);
            prop_assert_eq!(parsed.block_num, frame.block_num);
            prop_assert_eq!(parsed.len, frame.len);
            prop_assert_eq!(parsed.serialize(), wire);
        }
    }
}
