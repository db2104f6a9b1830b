//! Reserve Deposits
//!
//! Turns a wallet's UTXOs into an unsigned transaction paying a reserve
//! address.
//!
//! # Flow
//!
//! ```text
//! UTXOs ──sort ascending──▶ spendability filter ──▶ max-spendable check
//!                                                        │
//!        skeleton ◀── dust rule ◀── change ◀── greedy forward selection
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use zbtc_reserve::deposit::DepositTxBuilder;
//!
//! let builder = DepositTxBuilder::new(Network::Testnet, 2)?;
//! let deposit = builder.build(&utxos, &reserve_address, Amount::from_sat(4_000), &user_key)?;
//! let psbt = deposit.skeleton.to_psbt()?;
//! ```

pub mod builder;
pub mod fee;
pub mod types;

// Re-exports
pub use builder::{build_deposit_transaction, DepositError, DepositTxBuilder};
pub use fee::{
    estimate_max_spendable_amount, estimate_vbytes, fee_for_vbytes, is_economically_spendable,
    BASE_VBYTES, DUST_THRESHOLD, PER_INPUT_VBYTES, PER_OUTPUT_VBYTES,
};
pub use types::{DepositSummary, DepositTransaction, TransactionSkeleton, Utxo};
