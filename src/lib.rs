//! zBTC Reserve - Taproot Reserve Addresses and Deposits
//!
//! Pure, synchronous building blocks for moving BTC into zBTC reserves.
//! Nothing here signs, broadcasts or talks to a node.
//!
//! ## Reserve Addresses
//!
//! 1. **Hot reserve** - operator key path + user CSV recovery leaf
//! 2. **Entity-derived reserve** - the same, plus an `OP_RETURN <asset_owner>`
//!    leaf so every owner gets a distinct address
//!
//! ## Deposits
//!
//! Sorts the wallet's UTXOs smallest first, drops the ones not worth their
//! input cost, greedily selects until amount plus fee is covered, and returns
//! an unsigned version 2 transaction with an optional change output.

pub mod common;
pub mod deposit;
pub mod taproot;
pub mod units;

// Re-exports: Taproot
pub use taproot::{
    build_commitment_leaf, build_relative_timelock_leaf, derive_address,
    derive_entity_reserve_address, derive_hot_reserve_address, derive_key_path_address,
    derive_single_leaf_address, derive_two_leaf_address, parse_x_only_key, ScriptTree,
    TaprootAddress, TaprootAddressInfo, TaprootError,
};

// Re-exports: Deposits
pub use deposit::{
    build_deposit_transaction, estimate_max_spendable_amount, is_economically_spendable,
    DepositError, DepositTransaction, DepositTxBuilder, TransactionSkeleton, Utxo,
};

// Re-exports: Infrastructure
pub use common::{ReserveConfig, ReserveError};
