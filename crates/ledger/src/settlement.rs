use crate::money::Money;
use serde::Serialize;
use std::collections::BTreeMap;

/// A participant on one side of the ledger, with the unsigned amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub participant: String,
    pub amount: Money,
}

/// A suggested payment from a debtor to a creditor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: Money,
}

/// Greedy debtor/creditor matching.
///
/// Pairs the largest remaining debt with the largest remaining credit until
/// one side runs out. The result is not guaranteed to be the smallest
/// possible set of transfers.
///
/// Balances within a cent of zero are normally left alone. When ignoring
/// them would leave someone more than a cent away from settled (a credit
/// built from several one-cent debts), the plan is redone over every
/// non-zero balance, so cent-sized transfers can appear.
pub struct SettlementPlanner;

impl SettlementPlanner {
    pub fn plan(balances: &BTreeMap<String, Money>) -> Vec<Transfer> {
        let (debts, credits) = Self::partition(balances);
        let transfers = Self::settle(&debts, &credits);
        if !Self::leaves_residue(balances, &transfers) {
            return transfers;
        }

        tracing::debug!(
            participants = balances.len(),
            "sub-cent positions add up beyond tolerance, settling every non-zero balance"
        );
        let (debts, credits) = Self::partition_above(balances, Money::ZERO);
        Self::settle_above(&debts, &credits, Money::ZERO)
    }

    /// Splits balances into debtors (owe more than a cent) and creditors
    /// (are owed more than a cent), largest first, ties by name.
    pub fn partition(balances: &BTreeMap<String, Money>) -> (Vec<Position>, Vec<Position>) {
        Self::partition_above(balances, Money::EPSILON)
    }

    /// Matches debts against credits, skipping and dropping amounts within a cent.
    pub fn settle(debts: &[Position], credits: &[Position]) -> Vec<Transfer> {
        Self::settle_above(debts, credits, Money::EPSILON)
    }

    fn partition_above(balances: &BTreeMap<String, Money>, threshold: Money) -> (Vec<Position>, Vec<Position>) {
        let mut debts = Vec::new();
        let mut credits = Vec::new();

        for (participant, balance) in balances {
            if *balance > threshold {
                debts.push(Position {
                    participant: participant.clone(),
                    amount: *balance,
                });
            } else if *balance < -threshold {
                credits.push(Position {
                    participant: participant.clone(),
                    amount: balance.abs(),
                });
            }
        }

        let by_amount_then_name =
            |a: &Position, b: &Position| b.amount.cmp(&a.amount).then_with(|| a.participant.cmp(&b.participant));
        debts.sort_by(by_amount_then_name);
        credits.sort_by(by_amount_then_name);

        (debts, credits)
    }

    fn settle_above(debts: &[Position], credits: &[Position], threshold: Money) -> Vec<Transfer> {
        let mut debts = debts.to_vec();
        let mut credits = credits.to_vec();
        let mut transfers = Vec::new();
        let (mut d, mut c) = (0, 0);

        while d < debts.len() && c < credits.len() {
            let amount = debts[d].amount.min(credits[c].amount);

            if amount > threshold {
                transfers.push(Transfer {
                    from: debts[d].participant.clone(),
                    to: credits[c].participant.clone(),
                    amount: amount.round(),
                });
            }

            debts[d].amount -= amount;
            credits[c].amount -= amount;

            if debts[d].amount <= threshold {
                d += 1;
            }
            if credits[c].amount <= threshold {
                c += 1;
            }
        }

        transfers
    }

    /// True when applying `transfers` leaves any balance more than a cent from zero.
    fn leaves_residue(balances: &BTreeMap<String, Money>, transfers: &[Transfer]) -> bool {
        let mut remaining = balances.clone();
        for t in transfers {
            if let Some(from) = remaining.get_mut(&t.from) {
                *from -= t.amount;
            }
            if let Some(to) = remaining.get_mut(&t.to) {
                *to += t.amount;
            }
        }
        remaining.values().any(|b| b.abs() > Money::EPSILON)
    }
}
