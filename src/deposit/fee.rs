//! Fee Model and Spendability
//!
//! Fixed virtual-size costs for a single-signature Taproot key-path spend.
//! Every count here is a whole number of vbytes, so `fee_rate × vbytes` is
//! already the rounded-up fee and no floating point is involved.

use bitcoin::Amount;

use super::types::Utxo;

/// Version, locktime, counts and segwit marker
pub const BASE_VBYTES: u64 = 10;

/// P2TR key-path input
pub const PER_INPUT_VBYTES: u64 = 58;

/// P2TR output
pub const PER_OUTPUT_VBYTES: u64 = 44;

/// Outputs at or below this are not relayed by policy
pub const DUST_THRESHOLD: Amount = Amount::from_sat(546);

/// Virtual size of a transaction with the given shape.
pub fn estimate_vbytes(inputs: usize, outputs: usize) -> u64 {
    BASE_VBYTES
        .saturating_add(PER_OUTPUT_VBYTES.saturating_mul(outputs as u64))
        .saturating_add(PER_INPUT_VBYTES.saturating_mul(inputs as u64))
}

/// `fee_rate × vbytes`, or `None` when it does not fit in a `u64`.
pub fn fee_for_vbytes(fee_rate: u64, vbytes: u64) -> Option<Amount> {
    fee_rate.checked_mul(vbytes).map(Amount::from_sat)
}

/// Whether a UTXO is worth more than the cost of spending it.
///
/// True iff `value > fee_rate × PER_INPUT_VBYTES`; a UTXO worth exactly its
/// input cost is not spendable.
pub fn is_economically_spendable(utxo: &Utxo, fee_rate: u64) -> bool {
    match fee_for_vbytes(fee_rate, PER_INPUT_VBYTES) {
        Some(input_cost) => utxo.value > input_cost,
        None => false,
    }
}

/// Largest amount a single-output sweep of every spendable UTXO can deliver.
///
/// Returns zero for an empty set, when nothing is spendable, or when the fee
/// would exceed the spendable total.
pub fn estimate_max_spendable_amount(utxos: &[Utxo], fee_rate: u64) -> Amount {
    let (total, count) = utxos
        .iter()
        .filter(|utxo| is_economically_spendable(utxo, fee_rate))
        .fold((0u64, 0usize), |(total, count), utxo| {
            (total.saturating_add(utxo.value.to_sat()), count + 1)
        });

    if count == 0 {
        return Amount::ZERO;
    }

    let fee = fee_for_vbytes(fee_rate, estimate_vbytes(count, 1));
    match fee {
        Some(fee) => Amount::from_sat(total.saturating_sub(fee.to_sat())),
        None => Amount::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::Txid;

    fn utxo(value: u64) -> Utxo {
        Utxo::new(Txid::all_zeros(), 0, Amount::from_sat(value))
    }

    #[test]
    fn test_vbyte_estimates() {
        assert_eq!(estimate_vbytes(0, 0), 10);
        assert_eq!(estimate_vbytes(1, 1), 112);
        assert_eq!(estimate_vbytes(3, 2), 10 + 88 + 174);
    }

    #[test]
    fn test_spendability_boundary() {
        // 2 sat/vB × 58 vB = 116 sats to spend an input
        assert!(!is_economically_spendable(&utxo(115), 2));
        assert!(!is_economically_spendable(&utxo(116), 2));
        assert!(is_economically_spendable(&utxo(117), 2));
    }

    #[test]
    fn test_spendability_overflowing_rate() {
        assert!(!is_economically_spendable(&utxo(u64::MAX), u64::MAX));
    }

    #[test]
    fn test_max_spendable_empty() {
        assert_eq!(estimate_max_spendable_amount(&[], 5), Amount::ZERO);
    }

    #[test]
    fn test_max_spendable_all_dust() {
        let utxos = vec![utxo(100), utxo(116), utxo(50)];
        assert_eq!(estimate_max_spendable_amount(&utxos, 2), Amount::ZERO);
    }

    #[test]
    fn test_max_spendable_clamped() {
        // spendable (200 > 58) but one-input sweep costs 112
        assert_eq!(estimate_max_spendable_amount(&[utxo(100)], 1), Amount::from_sat(0));
        assert_eq!(estimate_max_spendable_amount(&[utxo(200)], 1), Amount::from_sat(88));
    }

    #[test]
    fn test_max_spendable_skips_unspendable() {
        let utxos = vec![utxo(1_000), utxo(5_000), utxo(20_000), utxo(100)];
        // 100 is below 116, the rest sweep at 10 + 44 + 3 × 58 = 228 vB
        assert_eq!(
            estimate_max_spendable_amount(&utxos, 2),
            Amount::from_sat(26_000 - 456)
        );
    }
}
