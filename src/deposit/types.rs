//! Deposit Types
//!
//! Caller-supplied UTXOs and the unsigned skeleton handed to a signer.

use bitcoin::psbt::{self, Psbt};
use bitcoin::{Amount, FeeRate, Transaction, TxOut, Txid, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::fee::estimate_vbytes;

/// Unspent transaction output owned by the depositing wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Transaction ID
    pub txid: Txid,
    /// Output index
    pub vout: u32,
    /// Value in satoshis
    #[serde(rename = "value_sats", with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
}

impl Utxo {
    pub fn new(txid: Txid, vout: u32, value: Amount) -> Self {
        Self { txid, vout, value }
    }

    /// Build from a display-order (reversed) txid hex string.
    pub fn from_hex(
        txid: &str,
        vout: u32,
        value_sats: u64,
    ) -> Result<Self, <Txid as FromStr>::Err> {
        Ok(Self {
            txid: Txid::from_str(txid)?,
            vout,
            value: Amount::from_sat(value_sats),
        })
    }
}

/// Unsigned deposit transaction plus what a signer needs to sign it.
#[derive(Debug, Clone)]
pub struct TransactionSkeleton {
    /// Version 2, empty witnesses
    pub tx: Transaction,
    /// Spent outputs, one per input and in input order
    pub prevouts: Vec<TxOut>,
    /// Key-path internal key for every input
    pub tap_internal_key: XOnlyPublicKey,
    /// Highest fee rate a downstream signer should accept
    pub max_fee_rate: FeeRate,
}

impl TransactionSkeleton {
    pub fn total_input(&self) -> Amount {
        self.prevouts.iter().map(|out| out.value).sum()
    }

    pub fn total_output(&self) -> Amount {
        self.tx.output.iter().map(|out| out.value).sum()
    }

    /// Fee actually paid, including any change dropped as dust.
    pub fn fee(&self) -> Amount {
        self.total_input()
            .checked_sub(self.total_output())
            .unwrap_or(Amount::ZERO)
    }

    /// Virtual size under the fixed per-input/per-output cost model.
    pub fn vsize_estimate(&self) -> u64 {
        estimate_vbytes(self.tx.input.len(), self.tx.output.len())
    }

    /// BIP-174 PSBT with `witness_utxo` and `tap_internal_key` on every input.
    pub fn to_psbt(&self) -> Result<Psbt, psbt::Error> {
        let mut psbt = Psbt::from_unsigned_tx(self.tx.clone())?;
        for (input, prevout) in psbt.inputs.iter_mut().zip(&self.prevouts) {
            input.witness_utxo = Some(prevout.clone());
            input.tap_internal_key = Some(self.tap_internal_key);
        }
        Ok(psbt)
    }

    /// Serialize the unsigned transaction
    pub fn serialize_hex(&self) -> String {
        bitcoin::consensus::encode::serialize_hex(&self.tx)
    }
}

/// Result of building a deposit
#[derive(Debug, Clone)]
pub struct DepositTransaction {
    pub skeleton: TransactionSkeleton,
    /// Change before the dust rule; not emitted when at or below dust
    pub change_amount: Amount,
    /// `fee_rate × vbytes` for the selected shape
    pub fee: Amount,
    /// Selected UTXOs in the order they were added
    pub consumed_utxos: Vec<Utxo>,
}

impl DepositTransaction {
    /// Whether the change output made it into the transaction.
    pub fn has_change_output(&self) -> bool {
        self.skeleton.tx.output.len() == 2
    }

    pub fn to_summary(&self, amount: Amount) -> DepositSummary {
        DepositSummary {
            txid: self.skeleton.tx.compute_txid().to_string(),
            unsigned_tx: self.skeleton.serialize_hex(),
            psbt: self.skeleton.to_psbt().ok().map(|psbt| psbt.serialize_hex()),
            amount_sats: amount.to_sat(),
            change_sats: self.change_amount.to_sat(),
            fee_sats: self.fee.to_sat(),
            paid_fee_sats: self.skeleton.fee().to_sat(),
            max_fee_rate_sat_vb: self.skeleton.max_fee_rate.to_sat_per_vb_floor(),
            consumed_utxos: self.consumed_utxos.clone(),
        }
    }
}

/// Serializable deposit summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositSummary {
    pub txid: String,
    pub unsigned_tx: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psbt: Option<String>,
    pub amount_sats: u64,
    pub change_sats: u64,
    pub fee_sats: u64,
    pub paid_fee_sats: u64,
    pub max_fee_rate_sat_vb: u64,
    pub consumed_utxos: Vec<Utxo>,
}
