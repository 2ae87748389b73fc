use crate::balance::BalanceAggregator;
use crate::error::LedgerError;
use crate::models::{ExpenseRecord, Roster};
use crate::money::Money;
use crate::settlement::{Position, SettlementPlanner, Transfer};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything a group's balance page shows, recomputed from its expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBalanceReport {
    pub participants: Vec<String>,
    pub balances: BTreeMap<String, Money>,
    /// Participants who owe money, largest first.
    pub debts: Vec<Position>,
    /// Participants who are owed money, largest first.
    pub credits: Vec<Position>,
    pub settlements: Vec<Transfer>,
    pub total_expenses: Money,
}

impl GroupBalanceReport {
    pub fn compute(roster: &Roster, expenses: &[ExpenseRecord]) -> Result<Self, LedgerError> {
        let aggregate = BalanceAggregator::compute(roster, expenses)?;
        let (debts, credits) = SettlementPlanner::partition(&aggregate.balances);
        let settlements = SettlementPlanner::plan(&aggregate.balances);

        tracing::debug!(
            expenses = expenses.len(),
            debtors = debts.len(),
            creditors = credits.len(),
            transfers = settlements.len(),
            "computed group balance report"
        );

        Ok(Self {
            participants: aggregate.participants,
            balances: aggregate.balances,
            debts,
            credits,
            settlements,
            total_expenses: aggregate.total_expenses,
        })
    }
}
