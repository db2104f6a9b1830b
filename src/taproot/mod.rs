//! Taproot Reserve Addresses
//!
//! Reserve addresses carry two spending paths:
//!
//! - **Operator (key path)**: the internal key can move funds immediately
//! - **User (script path)**: a CSV leaf lets the user reclaim after a relative
//!   timelock if the operator never does
//!
//! Entity-derived reserves add a second, unspendable `OP_RETURN` leaf that
//! binds the asset owner's identity into the tree, so each owner gets a
//! distinct address without revealing anything on-chain until spend time.

pub mod address;
pub mod leaf;

pub use address::{
    derive_address, derive_entity_reserve_address, derive_hot_reserve_address,
    derive_key_path_address, derive_single_leaf_address, derive_two_leaf_address, ScriptTree,
    TapLeafInfo, TapLeafView, TaprootAddress, TaprootAddressInfo,
};
pub use leaf::{build_commitment_leaf, build_relative_timelock_leaf, MAX_COMMITMENT_PAYLOAD};

use bitcoin::XOnlyPublicKey;

/// Timelock: 144 blocks ≈ 24 hours on mainnet
pub const RESERVE_LOCK_BLOCKS: u16 = 144;

/// For test networks: 6 blocks ≈ 1 hour
pub const RESERVE_LOCK_BLOCKS_TESTNET: u16 = 6;

/// Parse a public key into its x-only form.
///
/// Accepts a 32-byte x-only key or a 33-byte compressed key; the parity byte
/// of a compressed key is dropped.
pub fn parse_x_only_key(bytes: &[u8]) -> Result<XOnlyPublicKey, TaprootError> {
    match bytes.len() {
        32 => XOnlyPublicKey::from_slice(bytes).map_err(|_| TaprootError::InvalidKey),
        33 => secp256k1::PublicKey::from_slice(bytes)
            .map(|pk| pk.x_only_public_key().0)
            .map_err(|_| TaprootError::InvalidKey),
        _ => Err(TaprootError::InvalidKey),
    }
}

/// Parse a hex-encoded 32- or 33-byte public key.
pub fn parse_x_only_key_hex(hex_str: &str) -> Result<XOnlyPublicKey, TaprootError> {
    let bytes = hex::decode(hex_str.trim()).map_err(|_| TaprootError::InvalidKey)?;
    parse_x_only_key(&bytes)
}

/// Errors for Taproot operations
#[derive(Debug, thiserror::Error)]
pub enum TaprootError {
    #[error("invalid lock value {0}: not a BIP-68 relative lock")]
    InvalidLockValue(i64),

    #[error("commitment payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("address derivation failed: {0}")]
    AddressDerivationFailed(String),

    #[error("invalid key")]
    InvalidKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Keypair, SecretKey, SECP256K1};

    #[test]
    fn test_parse_x_only_and_compressed() {
        let sk = SecretKey::from_slice(&[0x21; 32]).unwrap();
        let keypair = Keypair::from_secret_key(SECP256K1, &sk);
        let (x_only, _) = keypair.x_only_public_key();
        let compressed = keypair.public_key().serialize();

        assert_eq!(parse_x_only_key(&x_only.serialize()).unwrap(), x_only);
        assert_eq!(parse_x_only_key(&compressed).unwrap(), x_only);
        assert_eq!(parse_x_only_key_hex(&hex::encode(compressed)).unwrap(), x_only);
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert!(matches!(parse_x_only_key(&[0u8; 31]), Err(TaprootError::InvalidKey)));
        assert!(parse_x_only_key(&[0xffu8; 32]).is_err());
        assert!(parse_x_only_key(&[0x05u8; 33]).is_err());
        assert!(parse_x_only_key_hex("not hex").is_err());
    }
}
