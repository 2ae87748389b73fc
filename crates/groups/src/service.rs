use crate::models::{
    Group, GroupDetail, GroupRequest, PASTEL_COLORS, RawCreateGroupRequest, RawUpdateGroupRequest,
};
use crate::repository::GroupRepository;
use database::{Database, RepositoryError};
use ledger::Money;
use rand::seq::SliceRandom;
use tracing::instrument;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Group not found")]
    NotFound,
}

impl From<RepositoryError> for GroupError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => GroupError::NotFound,
            RepositoryError::UniqueViolation(msg) => GroupError::Conflict(msg),
            RepositoryError::Infrastructure(e) => GroupError::Infrastructure(e.to_string()),
            _ => GroupError::Infrastructure(err.to_string()),
        }
    }
}

pub struct GroupService;

impl GroupService {
    fn random_pastel_color() -> String {
        let mut rng = rand::thread_rng();
        PASTEL_COLORS.choose(&mut rng).unwrap_or(&"#BAE1FF").to_string()
    }

    #[instrument(skip(db))]
    pub async fn create_group(db: &Database, raw: RawCreateGroupRequest) -> Result<Group, GroupError> {
        raw.validate().map_err(|e| GroupError::InvalidInput(e.to_string()))?;
        let req = GroupRequest::new(raw.name, raw.participants, Self::random_pastel_color)
            .map_err(GroupError::InvalidInput)?;

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = GroupRepository::new(uow.connection());

        let id = repo.create(&req).await?;
        let group = repo.find_by_id(id).await?.ok_or(GroupError::NotFound)?;

        uow.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(group_id = id, participants = group.participants.len(), "group created");
        Ok(group)
    }

    /// Applies a partial update; a provided participant list replaces the roster.
    #[instrument(skip(db))]
    pub async fn update_group(db: &Database, id: i64, raw: RawUpdateGroupRequest) -> Result<Group, GroupError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = GroupRepository::new(uow.connection());

        let existing = repo.find_by_id(id).await?.ok_or(GroupError::NotFound)?;

        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| existing.name.clone());
        let participants = match raw.participants {
            Some(list) => list,
            None => existing
                .participants
                .into_iter()
                .map(|p| crate::models::RawParticipant {
                    name: p.name,
                    color: Some(p.color),
                })
                .collect(),
        };

        let req = GroupRequest::new(name, participants, Self::random_pastel_color)
            .map_err(GroupError::InvalidInput)?;

        repo.update(id, &req).await?;
        let group = repo.find_by_id(id).await?.ok_or(GroupError::NotFound)?;

        uow.commit().await.map_err(RepositoryError::from)?;
        Ok(group)
    }

    #[instrument(skip(db))]
    pub async fn get_group(db: &Database, id: i64) -> Result<Group, GroupError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = GroupRepository::new(uow.connection());

        let group = repo.find_by_id(id).await?.ok_or(GroupError::NotFound)?;
        Ok(group)
    }

    #[instrument(skip(db))]
    pub async fn get_group_detail(db: &Database, id: i64) -> Result<GroupDetail, GroupError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = GroupRepository::new(uow.connection());

        let group = repo.find_by_id(id).await?.ok_or(GroupError::NotFound)?;
        let (total_cents, expense_count) = repo.spending_summary(id).await?;

        Ok(GroupDetail {
            group,
            total_spent: Money::from_cents(total_cents),
            expense_count,
        })
    }

    #[instrument(skip(db))]
    pub async fn list_groups(db: &Database) -> Result<Vec<Group>, GroupError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = GroupRepository::new(uow.connection());

        let groups = repo.list().await?;
        Ok(groups)
    }

    #[instrument(skip(db))]
    pub async fn delete_group(db: &Database, id: i64) -> Result<(), GroupError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = GroupRepository::new(uow.connection());

        repo.delete(id).await?;

        uow.commit().await.map_err(RepositoryError::from)?;
        tracing::info!(group_id = id, "group deleted with its expenses");
        Ok(())
    }
}
