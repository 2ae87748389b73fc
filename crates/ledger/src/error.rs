use crate::models::SplitMode;
use crate::money::Money;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Expense amount must be greater than zero, got {0}")]
    NonPositiveAmount(Money),
    #[error("At least one participant is required")]
    NoParticipants,
    #[error("Participant '{0}' is listed more than once")]
    DuplicateParticipant(String),
    #[error("{field} must be provided for every participant of a {mode} split")]
    MissingSplitInputs { mode: SplitMode, field: &'static str },
    #[error("Expected {expected} {field}, one per participant, got {actual}")]
    SplitCountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Custom amounts must sum to the expense amount: expected {expected}, got {actual} (tolerance {tolerance})")]
    SplitSumMismatch {
        expected: Money,
        actual: Money,
        tolerance: Money,
    },
    #[error("Percentages must sum to {expected}: got {actual} (tolerance {tolerance})")]
    InvalidPercentageSum {
        expected: Decimal,
        actual: Decimal,
        tolerance: Decimal,
    },
    #[error("Share for '{participant}' would be negative ({amount})")]
    NegativeShare { participant: String, amount: Money },
    #[error("A group can have at most {max} participants plus the owner, got {actual}")]
    RosterTooLarge { max: usize, actual: usize },
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}
