use crate::header::Header;
use crate::Hash;

/// Serialized header length: version, three hashes, time, bits, nonce
pub const HEADER_SIZE: usize = 4 + 32 * 3 + 4 * 3;

/// Serializes the header in consensus order
pub fn serialize_header(header: &Header) -> [u8; HEADER_SIZE] {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes[0..4].copy_from_slice(&header.version.to_le_bytes());
    bytes[4..36].copy_from_slice(header.prev_block_hash.as_bytes());
    bytes[36..68].copy_from_slice(header.merkle_root.as_bytes());
    bytes[68..100].copy_from_slice(header.metronome_hash.as_bytes());
    bytes[100..104].copy_from_slice(&header.time.to_le_bytes());
    bytes[104..108].copy_from_slice(&header.bits.to_le_bytes());
    bytes[108..112].copy_from_slice(&header.nonce.to_le_bytes());
    bytes
}

/// Computes the hash of a block header
pub fn calculate_header_hash(header: &Header) -> Hash {
    Hash::from(super::double_sha256(&serialize_header(header)))
}
