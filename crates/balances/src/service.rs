use crate::models::{GroupBalanceSummary, ParticipantGroupBalance};
use database::{Database, RepositoryError, UnitOfWork};
use expenses::repository::ExpenseRepository;
use groups::models::Group;
use groups::repository::GroupRepository;
use ledger::{ExpenseRecord, GroupBalanceReport, LedgerError, ParticipantLedger};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("Group not found")]
    NotFound,
}

impl From<RepositoryError> for BalanceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => BalanceError::NotFound,
            RepositoryError::DataIntegrity(msg) => BalanceError::DataIntegrity(msg),
            RepositoryError::Infrastructure(e) => BalanceError::Infrastructure(e.to_string()),
            _ => BalanceError::Infrastructure(err.to_string()),
        }
    }
}

// Everything fed to the ledger here was read back from storage, so any
// ledger rejection means the stored data is inconsistent.
impl From<LedgerError> for BalanceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DataIntegrity(msg) => BalanceError::DataIntegrity(msg),
            other => BalanceError::DataIntegrity(other.to_string()),
        }
    }
}

pub struct BalanceService;

impl BalanceService {
    /// Balance summaries for one group, or for every group when `group_id`
    /// is `None`. All groups and expenses are read in one transaction.
    #[instrument(skip(db))]
    pub async fn group_balances(
        db: &Database,
        owner: &str,
        group_id: Option<i64>,
    ) -> Result<Vec<GroupBalanceSummary>, BalanceError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let groups = Self::load_groups(&mut uow, group_id).await?;

        let mut summaries = Vec::with_capacity(groups.len());
        for group in groups {
            let records = Self::load_records(&mut uow, group.id).await?;
            let roster = group.roster(owner)?;
            let report = GroupBalanceReport::compute(&roster, &records).inspect_err(|e| {
                tracing::error!(group_id = group.id, error = %e, "stored expenses failed ledger checks");
            })?;

            summaries.push(GroupBalanceSummary {
                group_id: group.id,
                group_name: group.name,
                report,
            });
        }

        Ok(summaries)
    }

    /// Counterparty breakdown for `participant` in one group, or in every
    /// group whose roster lists them.
    #[instrument(skip(db))]
    pub async fn participant_balances(
        db: &Database,
        owner: &str,
        participant: &str,
        group_id: Option<i64>,
    ) -> Result<Vec<ParticipantGroupBalance>, BalanceError> {
        let participant = participant.trim();
        if participant.is_empty() {
            return Err(BalanceError::InvalidInput("Participant name is required".to_string()));
        }

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let groups = Self::load_groups(&mut uow, group_id).await?;

        let mut results = Vec::new();
        for group in groups {
            let roster = group.roster(owner)?;
            if group_id.is_none() && !roster.members().iter().any(|m| m == participant) {
                continue;
            }

            let records = Self::load_records(&mut uow, group.id).await?;
            let breakdown = ParticipantLedger::breakdown(participant, &records)?;

            results.push(ParticipantGroupBalance {
                group_id: group.id,
                group_name: group.name,
                breakdown,
            });
        }

        Ok(results)
    }

    async fn load_groups(uow: &mut UnitOfWork<'_>, group_id: Option<i64>) -> Result<Vec<Group>, BalanceError> {
        let mut repo = GroupRepository::new(uow.connection());
        match group_id {
            Some(id) => {
                let group = repo.find_by_id(id).await?.ok_or(BalanceError::NotFound)?;
                Ok(vec![group])
            }
            None => Ok(repo.list().await?),
        }
    }

    async fn load_records(uow: &mut UnitOfWork<'_>, group_id: i64) -> Result<Vec<ExpenseRecord>, BalanceError> {
        let expenses = ExpenseRepository::new(uow.connection())
            .list_by_group(group_id)
            .await?;
        Ok(expenses.into_iter().map(|e| e.record).collect())
    }
}
