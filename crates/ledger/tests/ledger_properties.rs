use ledger::{
    BalanceAggregator, ExpenseRecord, GroupBalanceReport, LedgerError, Money, ParticipantLedger, Roster,
    SplitCalculator, SplitMode,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

const NAMES: [&str; 5] = ["Me", "A", "B", "C", "Walk-in"];

fn people(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{}", i)).collect()
}

fn roster() -> Roster {
    Roster::new("Me", vec!["A".into(), "B".into(), "C".into()]).unwrap()
}

/// Builds equal-split expenses from (cents, payer index, participant mask).
fn history(entries: &[(i64, usize, u8)]) -> Vec<ExpenseRecord> {
    entries
        .iter()
        .map(|&(cents, payer, mask)| {
            let participants: Vec<String> = NAMES
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, n)| n.to_string())
                .collect();
            let amount = Money::from_cents(cents);
            let split_details =
                SplitCalculator::compute(amount, &participants, SplitMode::Equal, None, None).unwrap();
            ExpenseRecord {
                amount,
                payer: NAMES[payer].to_string(),
                participants,
                split_mode: SplitMode::Equal,
                split_details,
            }
        })
        .collect()
}

fn expense_entries() -> impl Strategy<Value = Vec<(i64, usize, u8)>> {
    prop::collection::vec((1i64..=500_000, 0usize..NAMES.len(), 1u8..32), 0..=25)
}

/// A few expenses of a handful of cents each, where most balances land within a cent of zero.
fn small_expense_entries() -> impl Strategy<Value = Vec<(i64, usize, u8)>> {
    prop::collection::vec((1i64..=12, 0usize..NAMES.len(), 1u8..32), 1..=6)
}

proptest! {
    #[test]
    fn equal_split_is_exact_and_fair(cents in 1i64..=10_000_000, n in 1usize..=10) {
        let amount = Money::from_cents(cents);
        let details = SplitCalculator::compute(amount, &people(n), SplitMode::Equal, None, None).unwrap();

        let total: Money = details.iter().map(|d| d.amount).sum();
        prop_assert_eq!(total, amount);

        let max = details.iter().map(|d| d.amount).max().unwrap();
        let min = details.iter().map(|d| d.amount).min().unwrap();
        prop_assert!(max - min <= Money::EPSILON);
    }

    #[test]
    fn custom_split_off_by_more_than_a_cent_is_rejected(
        mills in prop::collection::vec(0i64..=1_000_000, 1..=4),
        drift in prop_oneof![-5_000i64..=-2, 2i64..=5_000],
    ) {
        // Shares carry sub-cent digits; the stored (rounded) shares decide.
        let rounded_cents: i64 = mills.iter().map(|m| (m + 5) / 10).sum();
        prop_assume!(rounded_cents + drift > 0);
        let amount = Money::from_cents(rounded_cents + drift);
        let custom: Vec<Money> = mills.iter().map(|m| Money::new(Decimal::new(*m, 3))).collect();

        let err = SplitCalculator::compute(amount, &people(mills.len()), SplitMode::Custom, Some(&custom), None)
            .unwrap_err();
        let is_sum_mismatch = matches!(err, LedgerError::SplitSumMismatch { .. });
        prop_assert!(is_sum_mismatch);
    }

    #[test]
    fn accepted_custom_split_stays_within_a_cent(
        mills in prop::collection::vec(0i64..=1_000_000, 1..=4),
        amount_cents in 1i64..=4_000_000,
    ) {
        let amount = Money::from_cents(amount_cents);
        let custom: Vec<Money> = mills.iter().map(|m| Money::new(Decimal::new(*m, 3))).collect();

        if let Ok(details) =
            SplitCalculator::compute(amount, &people(mills.len()), SplitMode::Custom, Some(&custom), None)
        {
            let total: Money = details.iter().map(|d| d.amount).sum();
            prop_assert!(total.approx_eq(amount));
            prop_assert!(details.iter().all(|d| d.amount.to_cents().is_some()));
        }
    }

    #[test]
    fn custom_split_near_the_raw_total_is_consistent(
        mills in prop::collection::vec(0i64..=1_000_000, 2..=4),
    ) {
        let raw_total: i64 = mills.iter().sum();
        prop_assume!(raw_total >= 10);
        // Amount is the raw sum rounded to cents: accepted only if the stored shares agree.
        let amount = Money::new(Decimal::new(raw_total, 3)).round();
        let custom: Vec<Money> = mills.iter().map(|m| Money::new(Decimal::new(*m, 3))).collect();
        let rounded: Money = custom.iter().map(|c| c.round()).sum();

        let result = SplitCalculator::compute(amount, &people(mills.len()), SplitMode::Custom, Some(&custom), None);
        prop_assert_eq!(result.is_ok(), rounded.approx_eq(amount));
    }

    #[test]
    fn percentage_split_is_exact(
        cents in 1i64..=10_000_000,
        cuts in prop::collection::vec(0u32..=10_000, 0..=3),
    ) {
        let mut cuts = cuts;
        cuts.sort_unstable();
        let mut bounds = vec![0u32];
        bounds.extend(cuts);
        bounds.push(10_000);
        let pcts: Vec<Decimal> = bounds.windows(2).map(|w| Decimal::new(i64::from(w[1] - w[0]), 2)).collect();
        let amount = Money::from_cents(cents);

        match SplitCalculator::compute(amount, &people(pcts.len()), SplitMode::Percentage, None, Some(&pcts)) {
            Ok(details) => {
                let total: Money = details.iter().map(|d| d.amount).sum();
                prop_assert_eq!(total, amount);
            }
            Err(err) => {
                let is_negative_share = matches!(err, LedgerError::NegativeShare { .. });
                prop_assert!(is_negative_share);
            }
        }
    }

    #[test]
    fn percentage_sum_off_by_more_than_tolerance_is_rejected(
        first in 0i64..=10_000,
        drift in prop_oneof![-500i64..=-2, 2i64..=500],
    ) {
        let pcts = vec![Decimal::new(first, 2), Decimal::new(10_000 - first + drift, 2)];
        let err = SplitCalculator::compute(Money::from_cents(10_000), &people(2), SplitMode::Percentage, None, Some(&pcts))
            .unwrap_err();
        let is_pct_error = matches!(err, LedgerError::InvalidPercentageSum { .. });
        prop_assert!(is_pct_error);
    }

    #[test]
    fn balances_are_conserved(entries in expense_entries()) {
        let expenses = history(&entries);
        let result = BalanceAggregator::compute(&roster(), &expenses).unwrap();
        let total: Money = result.balances.values().sum();
        prop_assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn settlements_zero_every_balance(entries in expense_entries()) {
        let expenses = history(&entries);
        let report = GroupBalanceReport::compute(&roster(), &expenses).unwrap();

        let mut remaining: BTreeMap<String, Money> = report.balances.clone();
        for transfer in &report.settlements {
            prop_assert!(transfer.amount > Money::ZERO);
            *remaining.get_mut(&transfer.from).unwrap() -= transfer.amount;
            *remaining.get_mut(&transfer.to).unwrap() += transfer.amount;
        }
        for balance in remaining.values() {
            prop_assert!(balance.abs() <= Money::EPSILON);
        }

        let nonzero = report.balances.values().filter(|b| !b.is_zero()).count();
        prop_assert!(report.settlements.len() <= nonzero.saturating_sub(1));
    }

    #[test]
    fn cent_sized_histories_still_settle(entries in small_expense_entries()) {
        let expenses = history(&entries);
        let report = GroupBalanceReport::compute(&roster(), &expenses).unwrap();

        let mut remaining: BTreeMap<String, Money> = report.balances.clone();
        for transfer in &report.settlements {
            prop_assert!(transfer.amount > Money::ZERO);
            *remaining.get_mut(&transfer.from).unwrap() -= transfer.amount;
            *remaining.get_mut(&transfer.to).unwrap() += transfer.amount;
        }
        for balance in remaining.values() {
            prop_assert!(balance.abs() <= Money::EPSILON);
        }
    }

    #[test]
    fn breakdown_agrees_with_aggregate(entries in expense_entries()) {
        let expenses = history(&entries);
        let aggregate = BalanceAggregator::compute(&roster(), &expenses).unwrap();

        for (name, balance) in &aggregate.balances {
            let breakdown = ParticipantLedger::breakdown(name, &expenses).unwrap();
            prop_assert_eq!(breakdown.net_balance, *balance);

            let owes: Money = breakdown.owes_to.values().sum();
            let owed: Money = breakdown.owed_by.values().sum();
            prop_assert_eq!(owes - owed, breakdown.net_balance);
        }
    }
}

#[test]
fn two_payers_scenario() {
    let expenses = history(&[(3_000, 1, 0b01110), (1_500, 2, 0b01110)]);
    let report = GroupBalanceReport::compute(&roster(), &expenses).unwrap();

    assert_eq!(report.balances["A"], Money::from_cents(-1_500));
    assert_eq!(report.balances["B"], Money::ZERO);
    assert_eq!(report.balances["C"], Money::from_cents(1_500));
    assert_eq!(report.balances["Me"], Money::ZERO);
    assert_eq!(report.settlements.len(), 1);
    assert_eq!(report.settlements[0].from, "C");
    assert_eq!(report.settlements[0].to, "A");
    assert_eq!(report.settlements[0].amount, Money::from_cents(1_500));
    assert_eq!(report.total_expenses, Money::from_cents(4_500));
}
