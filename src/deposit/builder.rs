//! Deposit Transaction Builder
//!
//! Builds the unsigned transaction that moves a wallet's UTXOs into a reserve
//! address.
//!
//! # Selection
//!
//! UTXOs are sorted smallest first and added in a single forward pass until
//! they cover `amount + fee_rate × vbytes`. Small outputs get consolidated
//! first; the pass never backtracks and is not a subset-sum search.
//!
//! A full sweep (`amount == max spendable`) has one output. Anything less
//! plans for a change output back to the spender's key-path address, which is
//! then dropped (and donated to the fee) unless it exceeds the dust limit.

use bitcoin::{
    absolute::LockTime, transaction::Version, Address, Amount, FeeRate, Network, OutPoint,
    ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness, XOnlyPublicKey,
};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::fee::{
    estimate_max_spendable_amount, estimate_vbytes, fee_for_vbytes, is_economically_spendable,
    DUST_THRESHOLD, PER_INPUT_VBYTES,
};
use super::types::{DepositTransaction, TransactionSkeleton, Utxo};
use crate::taproot::derive_key_path_address;

/// Builds deposit transactions for one network at one fee rate
#[derive(Debug, Clone, Copy)]
pub struct DepositTxBuilder {
    network: Network,
    /// Fee rate (sats/vbyte)
    fee_rate: u64,
}

impl DepositTxBuilder {
    /// Create a new builder, rejecting fee rates below 1 sat/vbyte
    pub fn new(network: Network, fee_rate: u64) -> Result<Self, DepositError> {
        if fee_rate < 1 {
            return Err(DepositError::InvalidFeeRate(fee_rate));
        }
        Ok(Self { network, fee_rate })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn fee_rate(&self) -> u64 {
        self.fee_rate
    }

    /// Build the deposit (see [`build_deposit_transaction`])
    pub fn build(
        &self,
        utxos: &[Utxo],
        reserve_address: &str,
        amount: Amount,
        spender_key: &XOnlyPublicKey,
    ) -> Result<DepositTransaction, DepositError> {
        build_deposit_transaction(
            utxos,
            reserve_address,
            amount,
            spender_key,
            self.fee_rate,
            self.network,
        )
    }

    /// Largest amount a full sweep of `utxos` can deposit at this fee rate
    pub fn max_spendable(&self, utxos: &[Utxo]) -> Amount {
        estimate_max_spendable_amount(utxos, self.fee_rate)
    }

    /// Validate a Bitcoin address for this network
    pub fn validate_address(&self, address: &str) -> Result<Address, DepositError> {
        parse_address(address, self.network)
    }
}

/// Build an unsigned deposit of `amount` into `reserve_address`.
///
/// The consumed UTXOs are assumed to sit at the key-path-only address of
/// `spender_key`, which also receives the change.
pub fn build_deposit_transaction(
    utxos: &[Utxo],
    reserve_address: &str,
    amount: Amount,
    spender_key: &XOnlyPublicKey,
    fee_rate: u64,
    network: Network,
) -> Result<DepositTransaction, DepositError> {
    if utxos.is_empty() {
        return Err(DepositError::NoUtxosAvailable);
    }
    if fee_rate < 1 {
        return Err(DepositError::InvalidFeeRate(fee_rate));
    }
    let max_fee_rate = fee_rate
        .checked_add(1)
        .and_then(FeeRate::from_sat_per_vb)
        .ok_or(DepositError::InvalidFeeRate(fee_rate))?;

    // Stable sort keeps caller order among equal values
    let mut sorted: Vec<&Utxo> = utxos.iter().collect();
    sorted.sort_by_key(|utxo| utxo.value);

    let spendable: Vec<&Utxo> = sorted
        .into_iter()
        .filter(|utxo| is_economically_spendable(utxo, fee_rate))
        .collect();
    if spendable.is_empty() {
        return Err(DepositError::NoSpendableUtxos {
            count: utxos.len(),
            min_value: fee_rate.saturating_mul(PER_INPUT_VBYTES),
        });
    }

    let max_spendable = estimate_max_spendable_amount(utxos, fee_rate);
    if amount > max_spendable {
        return Err(DepositError::InsufficientBalance {
            requested: amount.to_sat(),
            available: max_spendable.to_sat(),
        });
    }

    let reserve = parse_address(reserve_address, network)?;
    let change = derive_key_path_address(spender_key, network)
        .map_err(|e| DepositError::InvalidChangeAddress(e.to_string()))?;

    let deposit_all = amount == max_spendable;
    let planned_outputs = if deposit_all { 1 } else { 2 };

    let mut vbytes = estimate_vbytes(0, planned_outputs);
    let mut prepared = Amount::ZERO;
    let mut consumed: Vec<Utxo> = Vec::new();

    for utxo in spendable {
        prepared = prepared
            .checked_add(utxo.value)
            .ok_or(DepositError::AmountOverflow)?;
        vbytes += PER_INPUT_VBYTES;
        consumed.push(utxo.clone());

        let target = required_total(amount, fee_rate, vbytes)?;
        debug!(
            target: "zbtc::deposit",
            txid = %utxo.txid,
            vout = utxo.vout,
            value = utxo.value.to_sat(),
            prepared = prepared.to_sat(),
            target = target.to_sat(),
            "added input"
        );
        if prepared >= target {
            break;
        }
    }

    let fee = fee_for_vbytes(fee_rate, vbytes).ok_or(DepositError::AmountOverflow)?;
    let change_amount = prepared
        .checked_sub(amount)
        .and_then(|rest| rest.checked_sub(fee))
        .ok_or(DepositError::InsufficientBalanceForFee {
            selected: prepared.to_sat(),
            required: amount.to_sat().saturating_add(fee.to_sat()),
        })?;

    let mut outputs = vec![TxOut {
        value: amount,
        script_pubkey: reserve.script_pubkey(),
    }];

    if change_amount != Amount::ZERO && change_amount > DUST_THRESHOLD {
        outputs.push(TxOut {
            value: change_amount,
            script_pubkey: change.output_script.clone(),
        });
    } else if change_amount != Amount::ZERO {
        warn!(
            target: "zbtc::deposit",
            change = change_amount.to_sat(),
            dust = DUST_THRESHOLD.to_sat(),
            "change at or below dust, adding it to the fee"
        );
    }

    let skeleton = assemble_skeleton(&consumed, outputs, change.output_script, spender_key, max_fee_rate);

    info!(
        target: "zbtc::deposit",
        inputs = consumed.len(),
        outputs = skeleton.tx.output.len(),
        amount = amount.to_sat(),
        change = change_amount.to_sat(),
        fee = fee.to_sat(),
        vbytes,
        "built deposit transaction"
    );

    Ok(DepositTransaction {
        skeleton,
        change_amount,
        fee,
        consumed_utxos: consumed,
    })
}

/// `amount + fee_rate × vbytes`
fn required_total(amount: Amount, fee_rate: u64, vbytes: u64) -> Result<Amount, DepositError> {
    fee_for_vbytes(fee_rate, vbytes)
        .and_then(|fee| amount.checked_add(fee))
        .ok_or(DepositError::AmountOverflow)
}

fn assemble_skeleton(
    consumed: &[Utxo],
    outputs: Vec<TxOut>,
    prevout_script: ScriptBuf,
    spender_key: &XOnlyPublicKey,
    max_fee_rate: FeeRate,
) -> TransactionSkeleton {
    let inputs = consumed
        .iter()
        .map(|utxo| TxIn {
            previous_output: OutPoint {
                txid: utxo.txid,
                vout: utxo.vout,
            },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::new(),
        })
        .collect();

    let prevouts = consumed
        .iter()
        .map(|utxo| TxOut {
            value: utxo.value,
            script_pubkey: prevout_script.clone(),
        })
        .collect();

    TransactionSkeleton {
        tx: Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: inputs,
            output: outputs,
        },
        prevouts,
        tap_internal_key: *spender_key,
        max_fee_rate,
    }
}

fn parse_address(address: &str, network: Network) -> Result<Address, DepositError> {
    Address::from_str(address)
        .map_err(|e| DepositError::InvalidDestinationAddress(e.to_string()))?
        .require_network(network)
        .map_err(|e| DepositError::InvalidDestinationAddress(e.to_string()))
}

/// Deposit builder errors
///
/// All are terminal: the caller has to come back with different inputs.
#[derive(Debug, Error)]
pub enum DepositError {
    #[error("no UTXOs available")]
    NoUtxosAvailable,

    #[error("invalid fee rate: {0} sat/vB")]
    InvalidFeeRate(u64),

    #[error("no spendable UTXOs: all {count} are worth at most {min_value} sats")]
    NoSpendableUtxos { count: usize, min_value: u64 },

    #[error("insufficient balance: requested {requested} sats, max spendable {available} sats")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("insufficient balance for fee: selected {selected} sats, need {required} sats")]
    InsufficientBalanceForFee { selected: u64, required: u64 },

    #[error("invalid change address: {0}")]
    InvalidChangeAddress(String),

    #[error("invalid destination address: {0}")]
    InvalidDestinationAddress(String),

    #[error("amount overflow")]
    AmountOverflow,
}

impl DepositError {
    /// Whether a smaller amount or a different UTXO set could succeed.
    pub fn is_funding_error(&self) -> bool {
        matches!(
            self,
            DepositError::NoUtxosAvailable
                | DepositError::NoSpendableUtxos { .. }
                | DepositError::InsufficientBalance { .. }
                | DepositError::InsufficientBalanceForFee { .. }
        )
    }
}
