use ledger::{GroupBalanceReport, ParticipantBreakdown};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Default)]
pub struct BalanceQuery {
    pub group_id: Option<i64>,
}

/// One group's balance page.
#[derive(Debug, Serialize)]
pub struct GroupBalanceSummary {
    pub group_id: i64,
    pub group_name: String,
    #[serde(flatten)]
    pub report: GroupBalanceReport,
}

/// One participant's position inside one group.
#[derive(Debug, Serialize)]
pub struct ParticipantGroupBalance {
    pub group_id: i64,
    pub group_name: String,
    #[serde(flatten)]
    pub breakdown: ParticipantBreakdown,
}
