//! Single-byte effective opcodes carried in a frame's 2-byte `Opcode` field.

/// Wire opcode. Only the low byte is significant on the wire and in
/// comparisons (see [`Opcode::matches`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Null = 0,
    Hello = 1,
    HelloAck = 2,
    Tx = 3,
    Found = 4,
    GetBlock = 5,
    GetIpl = 6,
    SendFile = 7,
    SendIpl = 8,
    Busy = 9,
    Nack = 10,
    GetTfile = 11,
    Balance = 12,
    SendBal = 13,
    Resolve = 14,
    GetCblock = 15,
    Mblock = 16,
    Hash = 17,
    Tf = 18,
    Identify = 19,
}

impl Opcode {
    /// Convert to the little-endian wire value.
    #[must_use]
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Recover an opcode from a raw wire value. `None` for unrecognized codes.
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0 => Self::Null,
            1 => Self::Hello,
            2 => Self::HelloAck,
            3 => Self::Tx,
            4 => Self::Found,
            5 => Self::GetBlock,
            6 => Self::GetIpl,
            7 => Self::SendFile,
            8 => Self::SendIpl,
            9 => Self::Busy,
            10 => Self::Nack,
            11 => Self::GetTfile,
            12 => Self::Balance,
            13 => Self::SendBal,
            14 => Self::Resolve,
            15 => Self::GetCblock,
            16 => Self::Mblock,
            17 => Self::Hash,
            18 => Self::Tf,
            19 => Self::Identify,
            _ => return None,
        })
    }

    /// Compare against a raw wire opcode value, examining only the low byte —
    /// this matches how the original wire encoding of single-byte opcodes is
    /// observed on the wire.
    #[must_use]
    pub fn matches(self, raw: u16) -> bool {
        (self.to_u16() & 0xff) == (raw & 0xff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for raw in 0..=19u16 {
            let op = Opcode::from_u16(raw).expect("known opcode");
            assert_eq!(op.to_u16(), raw);
        }
    }

    #[test]
    fn unknown_opcode_is_none() {
        assert_eq!(Opcode::from_u16(20), None);
        assert_eq!(Opcode::from_u16(65535), None);
    }

    #[test]
    fn matches_examines_low_byte_only() {
        assert!(Opcode::Hello.matches(0x0001));
        assert!(Opcode::Hello.matches(0x0101)); // high byte garbage, still matches
        assert!(!Opcode::Hello.matches(0x0002));
    }
}
