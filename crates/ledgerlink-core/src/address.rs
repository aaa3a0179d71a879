//! The fixed-length WOTS-style address: a public-key region plus a trailing
//! tag, with an associated amount carried alongside in memory (the amount
//! itself travels on the wire in a frame's amount-bearing fields, not inside
//! the address bytes).

/// Total address length in bytes.
pub const ADDR_LEN: usize = 2208;
/// Length of the trailing tag region.
pub const TAG_LEN: usize = 12;
/// Length of the leading public-key region.
pub const PUBKEY_LEN: usize = ADDR_LEN - TAG_LEN;

/// A 2208-byte address: `[public-key region (2196 bytes)][tag (12 bytes)]`,
/// paired with a 64-bit amount that is not part of the address bytes
/// themselves.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WotsAddress {
    bytes: [u8; ADDR_LEN],
    amount: u64,
}

impl std::fmt::Debug for WotsAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WotsAddress")
            .field("tag", &hex::encode(self.tag()))
            .field("amount", &self.amount)
            .finish()
    }
}

impl Default for WotsAddress {
    fn default() -> Self {
        Self { bytes: [0u8; ADDR_LEN], amount: 0 }
    }
}

impl WotsAddress {
    /// Build an address from up to [`ADDR_LEN`] bytes; short input is
    /// zero-padded on the right, matching `WotsAddressFromBytes([]byte{})`
    /// producing an all-zero address in the original client.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut bytes = [0u8; ADDR_LEN];
        let n = data.len().min(ADDR_LEN);
        bytes[..n].copy_from_slice(&data[..n]);
        Self { bytes, amount: 0 }
    }

    /// Parse a hex-encoded address. Returns the zero address if `hex` does
    /// not decode to exactly [`ADDR_LEN`] bytes.
    #[must_use]
    pub fn from_hex(hex_str: &str) -> Self {
        match hex::decode(hex_str) {
            Ok(bytes) if bytes.len() == ADDR_LEN => Self::from_bytes(&bytes),
            _ => Self::default(),
        }
    }

    /// Full 2208-byte wire representation.
    #[must_use]
    pub fn bytes(&self) -> &[u8; ADDR_LEN] {
        &self.bytes
    }

    /// The trailing 12-byte tag.
    #[must_use]
    pub fn tag(&self) -> [u8; TAG_LEN] {
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&self.bytes[PUBKEY_LEN..]);
        tag
    }

    /// Overwrite the trailing tag region, leaving the public-key region
    /// untouched.
    pub fn set_tag(&mut self, tag: &[u8]) {
        let n = tag.len().min(TAG_LEN);
        self.bytes[PUBKEY_LEN..PUBKEY_LEN + n].copy_from_slice(&tag[..n]);
    }

    /// The leading 2196-byte public-key region.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.bytes[..PUBKEY_LEN]
    }

    /// Overwrite the public-key region, leaving the tag untouched.
    pub fn set_public_key(&mut self, key: &[u8]) {
        let n = key.len().min(PUBKEY_LEN);
        self.bytes[..n].copy_from_slice(&key[..n]);
    }

    /// The amount associated with this address in memory.
    #[must_use]
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Set the associated amount directly.
    pub fn set_amount(&mut self, amount: u64) {
        self.amount = amount;
    }

    /// Set the associated amount from its 8-byte little-endian wire form.
    pub fn set_amount_bytes(&mut self, bytes: &[u8]) {
        let mut arr = [0u8; 8];
        let n = bytes.len().min(8);
        arr[..n].copy_from_slice(&bytes[..n]);
        self.amount = u64::from_le_bytes(arr);
    }
}
