use crate::error::LedgerError;
use crate::models::ExpenseRecord;
use crate::money::Money;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantBreakdown {
    pub participant: String,
    pub net_balance: Money,
    /// Payers this participant owes, with the amount owed to each.
    pub owes_to: BTreeMap<String, Money>,
    /// Participants who owe this participant, with the amount each owes.
    pub owed_by: BTreeMap<String, Money>,
}

pub struct ParticipantLedger;

impl ParticipantLedger {
    /// Counterparty-level view of one participant's position.
    ///
    /// `net_balance` matches what [`crate::BalanceAggregator`] reports for
    /// the same participant over the same expenses.
    pub fn breakdown(participant: &str, expenses: &[ExpenseRecord]) -> Result<ParticipantBreakdown, LedgerError> {
        let mut net_balance = Money::ZERO;
        let mut owes_to: BTreeMap<String, Money> = BTreeMap::new();
        let mut owed_by: BTreeMap<String, Money> = BTreeMap::new();

        for expense in expenses {
            expense.verify()?;

            if expense.payer == participant {
                for split in expense.split_details.iter().filter(|s| s.participant_name != participant) {
                    *owed_by.entry(split.participant_name.clone()).or_default() += split.amount;
                    net_balance -= split.amount;
                }
                continue;
            }

            for split in expense.split_details.iter().filter(|s| s.participant_name == participant) {
                *owes_to.entry(expense.payer.clone()).or_default() += split.amount;
                net_balance += split.amount;
            }
        }

        owes_to.values_mut().for_each(|v| *v = v.round());
        owed_by.values_mut().for_each(|v| *v = v.round());

        Ok(ParticipantBreakdown {
            participant: participant.to_string(),
            net_balance: net_balance.round(),
            owes_to,
            owed_by,
        })
    }
}
