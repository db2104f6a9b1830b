//! Property tests for coin selection

mod common;

use bitcoin::{Amount, Network};
use common::{key, reserve_address, sum, utxos};
use proptest::prelude::*;
use zbtc_reserve::deposit::{
    build_deposit_transaction, estimate_max_spendable_amount, is_economically_spendable,
    DUST_THRESHOLD,
};
use zbtc_reserve::DepositError;

fn wallet() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..2_000_000, 1..12)
}

proptest! {
    #[test]
    fn prop_deposit_respects_selection_rules(
        values in wallet(),
        fee_rate in 1u64..60,
        fraction in 0u64..=1_000,
    ) {
        let set = utxos(&values);
        let max = estimate_max_spendable_amount(&set, fee_rate);
        let amount = Amount::from_sat(max.to_sat() * fraction / 1_000);
        let spendable = set.iter().filter(|u| is_economically_spendable(u, fee_rate)).count();

        match build_deposit_transaction(&set, &reserve_address(), amount, &key(3), fee_rate, Network::Testnet) {
            Ok(deposit) => {
                // Smallest spendable values first
                let mut expected: Vec<u64> = values
                    .iter()
                    .copied()
                    .filter(|v| *v > fee_rate * 58)
                    .collect();
                expected.sort();
                let taken: Vec<u64> = deposit.consumed_utxos.iter().map(|u| u.value.to_sat()).collect();
                prop_assert_eq!(&taken[..], &expected[..taken.len()]);

                prop_assert_eq!(sum(&deposit.consumed_utxos), amount + deposit.change_amount + deposit.fee);
                prop_assert_eq!(deposit.skeleton.tx.output[0].value, amount);

                let outputs = deposit.skeleton.tx.output.len();
                if deposit.change_amount > DUST_THRESHOLD {
                    prop_assert_eq!(outputs, 2);
                } else {
                    prop_assert_eq!(outputs, 1);
                }

                if amount == max {
                    prop_assert_eq!(taken.len(), spendable);
                    prop_assert_eq!(deposit.change_amount, Amount::ZERO);
                }
            }
            Err(DepositError::NoSpendableUtxos { .. }) => prop_assert_eq!(spendable, 0),
            Err(DepositError::InsufficientBalanceForFee { selected, required }) => {
                prop_assert!(selected < required);
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }

    #[test]
    fn prop_over_max_is_rejected(values in wallet(), fee_rate in 1u64..60, extra in 1u64..10_000) {
        let set = utxos(&values);
        let max = estimate_max_spendable_amount(&set, fee_rate);
        let result = build_deposit_transaction(
            &set,
            &reserve_address(),
            max + Amount::from_sat(extra),
            &key(3),
            fee_rate,
            Network::Testnet,
        );
        let rejected = matches!(
            result,
            Err(DepositError::InsufficientBalance { .. }) | Err(DepositError::NoSpendableUtxos { .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn prop_build_is_deterministic(values in wallet(), fee_rate in 1u64..20) {
        let set = utxos(&values);
        let amount = estimate_max_spendable_amount(&set, fee_rate) / 2;
        let first = build_deposit_transaction(&set, &reserve_address(), amount, &key(3), fee_rate, Network::Testnet);
        let second = build_deposit_transaction(&set, &reserve_address(), amount, &key(3), fee_rate, Network::Testnet);

        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a.skeleton.tx, b.skeleton.tx),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "builds diverged"),
        }
    }
}
