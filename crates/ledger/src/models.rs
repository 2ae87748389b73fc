use crate::error::LedgerError;
use crate::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Most non-owner participants a group may carry.
pub const MAX_ROSTER_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    Equal,
    Custom,
    Percentage,
}

impl SplitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SplitMode::Equal => "equal",
            SplitMode::Custom => "custom",
            SplitMode::Percentage => "percentage",
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(SplitMode::Equal),
            "custom" => Ok(SplitMode::Custom),
            "percentage" => Ok(SplitMode::Percentage),
            other => Err(format!("Unknown split mode: {}", other)),
        }
    }
}

/// One participant's frozen share of an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitDetail {
    pub participant_name: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
}

/// The ledger-relevant part of a stored expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub amount: Money,
    pub payer: String,
    pub participants: Vec<String>,
    pub split_mode: SplitMode,
    pub split_details: Vec<SplitDetail>,
}

impl ExpenseRecord {
    /// Rejects records that cannot have been produced by the split calculator.
    pub fn verify(&self) -> Result<(), LedgerError> {
        if !self.amount.is_positive() {
            return Err(LedgerError::DataIntegrity(format!(
                "expense amount {} is not positive",
                self.amount
            )));
        }
        if self.payer.trim().is_empty() {
            return Err(LedgerError::DataIntegrity("expense has no payer".into()));
        }
        for split in &self.split_details {
            if split.participant_name.trim().is_empty() {
                return Err(LedgerError::DataIntegrity(
                    "split entry has no participant name".into(),
                ));
            }
            if split.amount.is_negative() {
                return Err(LedgerError::DataIntegrity(format!(
                    "split amount {} for '{}' is negative",
                    split.amount, split.participant_name
                )));
            }
        }
        let split_total = self.split_total();
        if !split_total.approx_eq(self.amount) {
            return Err(LedgerError::DataIntegrity(format!(
                "split details sum to {} but the expense amount is {}",
                split_total, self.amount
            )));
        }
        Ok(())
    }

    pub fn split_total(&self) -> Money {
        self.split_details.iter().map(|s| s.amount).sum()
    }
}

/// A group's membership: the implicit owner plus up to three named participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    owner: String,
    participants: Vec<String>,
}

impl Roster {
    pub fn new(owner: impl Into<String>, participants: Vec<String>) -> Result<Self, LedgerError> {
        if participants.len() > MAX_ROSTER_SIZE {
            return Err(LedgerError::RosterTooLarge {
                max: MAX_ROSTER_SIZE,
                actual: participants.len(),
            });
        }
        Ok(Self {
            owner: owner.into(),
            participants,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Roster order, then the owner unless already listed.
    pub fn members(&self) -> Vec<String> {
        let mut members = self.participants.clone();
        if !members.iter().any(|m| m == &self.owner) {
            members.push(self.owner.clone());
        }
        members
    }
}
