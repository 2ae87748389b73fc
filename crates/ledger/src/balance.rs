use crate::error::LedgerError;
use crate::models::{ExpenseRecord, Roster};
use crate::money::Money;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBalances {
    /// Roster order, then the owner, then names only seen in expenses.
    pub participants: Vec<String>,
    /// Positive: owes the group. Negative: is owed by the group.
    pub balances: BTreeMap<String, Money>,
    pub total_expenses: Money,
}

pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Folds a group's expense history into net balances.
    ///
    /// Running sums stay at full precision and are rounded to cents only on
    /// the way out, so the balances add up to zero exactly.
    pub fn compute(roster: &Roster, expenses: &[ExpenseRecord]) -> Result<GroupBalances, LedgerError> {
        let mut participants = roster.members();
        let mut balances: BTreeMap<String, Money> = participants
            .iter()
            .map(|name| (name.clone(), Money::ZERO))
            .collect();
        let mut total_expenses = Money::ZERO;

        for expense in expenses {
            expense.verify()?;
            total_expenses += expense.amount;

            Self::seed(&mut balances, &mut participants, &expense.payer);
            for split in &expense.split_details {
                Self::seed(&mut balances, &mut participants, &split.participant_name);
                if split.participant_name == expense.payer {
                    continue;
                }
                if let Some(owed) = balances.get_mut(&split.participant_name) {
                    *owed += split.amount;
                }
                if let Some(paid) = balances.get_mut(&expense.payer) {
                    *paid -= split.amount;
                }
            }
        }

        for value in balances.values_mut() {
            *value = value.round();
        }

        Ok(GroupBalances {
            participants,
            balances,
            total_expenses: total_expenses.round(),
        })
    }

    fn seed(balances: &mut BTreeMap<String, Money>, participants: &mut Vec<String>, name: &str) {
        if !balances.contains_key(name) {
            balances.insert(name.to_string(), Money::ZERO);
            participants.push(name.to_string());
        }
    }
}
