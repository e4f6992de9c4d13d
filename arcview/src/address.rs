//! Ledger address decoding
//!
//! An address is 58 characters of unpadded base32 over a 32-byte public key
//! followed by a 4-byte checksum (last 4 bytes of SHA-512/256 of the key).

use crate::types::ExtractionError;
use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha512_256};

/// Length of an encoded address
pub const ADDRESS_LENGTH: usize = 58;

/// Length of the raw public key
pub const PUBLIC_KEY_LENGTH: usize = 32;

const CHECKSUM_LENGTH: usize = 4;

/// Decode an address into its raw 32-byte public key
pub fn decode_address(address: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], ExtractionError> {
    if address.len() != ADDRESS_LENGTH {
        return Err(ExtractionError::InvalidReserveAddress(format!(
            "expected {} characters, got {}",
            ADDRESS_LENGTH,
            address.len()
        )));
    }

    let raw = BASE32_NOPAD
        .decode(address.as_bytes())
        .map_err(|e| ExtractionError::InvalidReserveAddress(format!("{}: {}", address, e)))?;

    if raw.len() != PUBLIC_KEY_LENGTH + CHECKSUM_LENGTH {
        return Err(ExtractionError::InvalidReserveAddress(format!(
            "{}: decoded to {} bytes",
            address,
            raw.len()
        )));
    }

    let (public_key, checksum) = raw.split_at(PUBLIC_KEY_LENGTH);
    if checksum_of(public_key).as_slice() != checksum {
        return Err(ExtractionError::InvalidReserveAddress(format!(
            "{}: checksum mismatch",
            address
        )));
    }

    let mut key = [0u8; PUBLIC_KEY_LENGTH];
    key.copy_from_slice(public_key);
    Ok(key)
}

fn checksum_of(public_key: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let digest = Sha512_256::digest(public_key);
    let mut checksum = [0u8; CHECKSUM_LENGTH];
    checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LENGTH..]);
    checksum
}
