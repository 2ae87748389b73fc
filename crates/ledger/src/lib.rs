//! Expense splitting and settlement arithmetic.
//!
//! Everything here is synchronous and side-effect free: callers hand in a
//! snapshot of a group's expenses and get derived figures back.

pub mod balance;
pub mod error;
pub mod models;
pub mod money;
pub mod participant;
pub mod report;
pub mod settlement;
pub mod split;

pub use balance::{BalanceAggregator, GroupBalances};
pub use error::LedgerError;
pub use models::{ExpenseRecord, MAX_ROSTER_SIZE, Roster, SplitDetail, SplitMode};
pub use money::Money;
pub use participant::{ParticipantBreakdown, ParticipantLedger};
pub use report::GroupBalanceReport;
pub use settlement::{Position, SettlementPlanner, Transfer};
pub use split::SplitCalculator;
