use crate::models::{Group, GroupRequest, Participant};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct GroupRecord {
    id: i64,
    name: String,
    created_at: String,
    updated_at: String,
}

#[derive(FromRow)]
struct ParticipantRecord {
    group_id: i64,
    name: String,
    color: String,
}

impl GroupRecord {
    fn into_group(self, participants: &[ParticipantRecord]) -> Group {
        Group {
            id: self.id,
            name: self.name,
            participants: participants
                .iter()
                .filter(|p| p.group_id == self.id)
                .map(|p| Participant {
                    name: p.name.clone(),
                    color: p.color.clone(),
                })
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub struct GroupRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> GroupRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &GroupRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar("INSERT INTO groups (name) VALUES ($1) RETURNING id")
            .bind(req.name())
            .fetch_one(&mut *self.conn)
            .await?;

        self.insert_participants(id, req.participants()).await?;
        Ok(id)
    }

    pub async fn update(&mut self, id: i64, req: &GroupRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE groups SET name = $1, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') WHERE id = $2",
        )
        .bind(req.name())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM group_participants WHERE group_id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        self.insert_participants(id, req.participants()).await?;
        Ok(())
    }

    async fn insert_participants(&mut self, group_id: i64, participants: &[Participant]) -> Result<(), RepositoryError> {
        for (position, participant) in participants.iter().enumerate() {
            sqlx::query(
                "INSERT INTO group_participants (group_id, position, name, color) VALUES ($1, $2, $3, $4)",
            )
            .bind(group_id)
            .bind(position as i64)
            .bind(&participant.name)
            .bind(&participant.color)
            .execute(&mut *self.conn)
            .await?;
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Group>, RepositoryError> {
        let record = sqlx::query_as::<_, GroupRecord>(
            "SELECT id, name, created_at, updated_at FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let participants = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT group_id, name, color FROM group_participants WHERE group_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(Some(record.into_group(&participants)))
    }

    pub async fn list(&mut self) -> Result<Vec<Group>, RepositoryError> {
        let records = sqlx::query_as::<_, GroupRecord>(
            "SELECT id, name, created_at, updated_at FROM groups ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let participants = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT group_id, name, color FROM group_participants ORDER BY group_id, position",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records.into_iter().map(|r| r.into_group(&participants)).collect())
    }

    /// (total spent in cents, number of expenses) for one group.
    pub async fn spending_summary(&mut self, id: i64) -> Result<(i64, i64), RepositoryError> {
        let summary: (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0), COUNT(*) FROM expenses WHERE group_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(summary)
    }

    /// Expenses and their splits go with the group (ON DELETE CASCADE).
    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawParticipant;
    use database::get_test_db;

    fn request(name: &str, people: &[&str]) -> GroupRequest {
        let raw = people
            .iter()
            .map(|p| RawParticipant { name: p.to_string(), color: None })
            .collect();
        GroupRequest::new(name.to_string(), raw, || "#BAE1FF".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_group() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = GroupRepository::new(uow.connection());

        let id = repo.create(&request("Trip", &["Alice", "Bob"])).await.unwrap();
        assert!(id > 0);

        let group = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(group.name, "Trip");
        assert_eq!(group.participant_names(), vec!["Alice", "Bob"]);
        assert_eq!(group.participants[0].color, "#BAE1FF");
    }

    #[tokio::test]
    async fn test_update_replaces_roster() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = GroupRepository::new(uow.connection());

        let id = repo.create(&request("Trip", &["Alice", "Bob"])).await.unwrap();
        repo.update(id, &request("Road trip", &["Carol"])).await.unwrap();

        let group = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(group.name, "Road trip");
        assert_eq!(group.participant_names(), vec!["Carol"]);
    }

    #[tokio::test]
    async fn test_update_missing_group() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = GroupRepository::new(uow.connection());

        let err = repo.update(999, &request("Ghost", &[])).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_list_groups_keeps_rosters_apart() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = GroupRepository::new(uow.connection());

        let first = repo.create(&request("Flat", &["A", "B"])).await.unwrap();
        let second = repo.create(&request("Trip", &["C"])).await.unwrap();

        let groups = repo.list().await.unwrap();
        assert_eq!(groups.len(), 2);
        let flat = groups.iter().find(|g| g.id == first).unwrap();
        let trip = groups.iter().find(|g| g.id == second).unwrap();
        assert_eq!(flat.participant_names(), vec!["A", "B"]);
        assert_eq!(trip.participant_names(), vec!["C"]);
    }

    #[tokio::test]
    async fn test_spending_summary_and_delete() {
        let db = get_test_db().await;
        let mut uow = db.begin().await.unwrap();
        let mut repo = GroupRepository::new(uow.connection());

        let id = repo.create(&request("Trip", &["A"])).await.unwrap();
        assert_eq!(repo.spending_summary(id).await.unwrap(), (0, 0));

        sqlx::query(
            "INSERT INTO expenses (group_id, description, expense_date, amount, payer, split_mode) VALUES ($1, 'Taxi', '2026-03-01', 2500, 'A', 'equal')",
        )
        .bind(id)
        .execute(uow.connection())
        .await
        .unwrap();

        let mut repo = GroupRepository::new(uow.connection());
        assert_eq!(repo.spending_summary(id).await.unwrap(), (2500, 1));

        repo.delete(id).await.unwrap();
        assert!(repo.find_by_id(id).await.unwrap().is_none());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses")
            .fetch_one(uow.connection())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
