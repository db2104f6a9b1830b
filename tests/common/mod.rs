//! Shared fixtures for integration tests

#![allow(dead_code)]

use bitcoin::{Amount, Network, XOnlyPublicKey};
use secp256k1::{Keypair, SecretKey, SECP256K1};

use zbtc_reserve::taproot::{derive_hot_reserve_address, RESERVE_LOCK_BLOCKS};
use zbtc_reserve::Utxo;

/// Deterministic x-only key from a one-byte seed (seed must be non-zero)
pub fn key(seed: u8) -> XOnlyPublicKey {
    let sk = SecretKey::from_slice(&[seed; 32]).expect("valid secret key");
    Keypair::from_secret_key(SECP256K1, &sk).x_only_public_key().0
}

/// UTXOs with distinct synthetic txids, in the given order
pub fn utxos(values: &[u64]) -> Vec<Utxo> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            Utxo::from_hex(&format!("{:064x}", i + 1), i as u32, *value).expect("valid txid")
        })
        .collect()
}

/// Testnet hot reserve address for operator 1 / user 2
pub fn reserve_address() -> String {
    derive_hot_reserve_address(&key(1), &key(2), RESERVE_LOCK_BLOCKS as i64, Network::Testnet)
        .expect("derivable")
        .address
        .to_string()
}

pub fn sats(values: &[Utxo]) -> Vec<u64> {
    values.iter().map(|utxo| utxo.value.to_sat()).collect()
}

pub fn sum(values: &[Utxo]) -> Amount {
    values.iter().map(|utxo| utxo.value).sum()
}
