use crate::models::{Expense, ExpenseFilter, ExpenseRequest, RawCreateExpenseRequest, RawUpdateExpenseRequest};
use crate::repository::ExpenseRepository;
use database::{Database, RepositoryError};
use groups::repository::GroupRepository;
use ledger::LedgerError;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("Group not found")]
    GroupNotFound,
    #[error("Expense not found")]
    NotFound,
}

impl From<RepositoryError> for ExpenseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExpenseError::NotFound,
            RepositoryError::DataIntegrity(msg) => ExpenseError::DataIntegrity(msg),
            RepositoryError::Infrastructure(e) => ExpenseError::Infrastructure(e.to_string()),
            _ => ExpenseError::Infrastructure(err.to_string()),
        }
    }
}

impl From<LedgerError> for ExpenseError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DataIntegrity(msg) => ExpenseError::DataIntegrity(msg),
            other => ExpenseError::InvalidInput(other.to_string()),
        }
    }
}

pub struct ExpenseService;

impl ExpenseService {
    #[instrument(skip(db))]
    pub async fn create_expense(db: &Database, raw: RawCreateExpenseRequest) -> Result<Expense, ExpenseError> {
        let today = chrono::Local::now().date_naive();
        let req = ExpenseRequest::new(raw, today)?;

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;

        let group_exists = GroupRepository::new(uow.connection())
            .find_by_id(req.group_id())
            .await?
            .is_some();
        if !group_exists {
            return Err(ExpenseError::GroupNotFound);
        }

        let mut repo = ExpenseRepository::new(uow.connection());
        let id = repo.create(&req).await?;
        let expense = repo.find_by_id(id).await?.ok_or(ExpenseError::NotFound)?;

        uow.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            expense_id = id,
            group_id = expense.group_id,
            amount = %expense.record.amount,
            split_mode = %expense.record.split_mode,
            "expense created"
        );
        Ok(expense)
    }

    /// Partial update; splits are recomputed when amount, participants, mode,
    /// custom amounts or percentages are sent.
    #[instrument(skip(db))]
    pub async fn update_expense(
        db: &Database,
        id: i64,
        raw: RawUpdateExpenseRequest,
    ) -> Result<Expense, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let existing = repo.find_by_id(id).await?.ok_or(ExpenseError::NotFound)?;
        let req = ExpenseRequest::amend(existing, raw)?;

        repo.update(id, &req).await?;
        let expense = repo.find_by_id(id).await?.ok_or(ExpenseError::NotFound)?;

        uow.commit().await.map_err(RepositoryError::from)?;
        Ok(expense)
    }

    #[instrument(skip(db))]
    pub async fn get_expense(db: &Database, id: i64) -> Result<Expense, ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let expense = repo.find_by_id(id).await?.ok_or(ExpenseError::NotFound)?;
        Ok(expense)
    }

    #[instrument(skip(db))]
    pub async fn list_expenses(db: &Database, filter: ExpenseFilter) -> Result<Vec<Expense>, ExpenseError> {
        filter.validate().map_err(ExpenseError::InvalidInput)?;

        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let expenses = repo.list(&filter).await?;
        Ok(expenses)
    }

    #[instrument(skip(db))]
    pub async fn delete_expense(db: &Database, id: i64) -> Result<(), ExpenseError> {
        let mut uow = db.begin().await.map_err(RepositoryError::from)?;
        let mut repo = ExpenseRepository::new(uow.connection());

        repo.delete(id).await?;

        uow.commit().await.map_err(RepositoryError::from)?;
        tracing::info!(expense_id = id, "expense deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::get_test_db;
    use ledger::{Money, SplitMode};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    async fn seed_group(db: &Database) -> i64 {
        sqlx::query_scalar("INSERT INTO groups (name) VALUES ('Flat') RETURNING id")
            .fetch_one(&db.pool)
            .await
            .unwrap()
    }

    fn raw(group_id: i64, amount: Decimal, mode: SplitMode) -> RawCreateExpenseRequest {
        RawCreateExpenseRequest {
            group_id,
            amount,
            description: "Groceries".into(),
            expense_date: Some("2026-03-10".into()),
            payer: "Me".into(),
            participants: vec!["Me".into(), "A".into()],
            split_mode: mode,
            custom_amounts: None,
            percentages: None,
            category: Some("Food".into()),
        }
    }

    #[tokio::test]
    async fn test_create_expense() {
        let db = get_test_db().await;
        let group_id = seed_group(&db).await;

        let expense = ExpenseService::create_expense(&db, raw(group_id, dec!(25.00), SplitMode::Equal))
            .await
            .unwrap();
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.record.split_total(), Money::new(dec!(25.00)));

        let fetched = ExpenseService::get_expense(&db, expense.id).await.unwrap();
        assert_eq!(fetched, expense);
    }

    #[tokio::test]
    async fn test_create_expense_unknown_group() {
        let db = get_test_db().await;
        let err = ExpenseService::create_expense(&db, raw(42, dec!(25.00), SplitMode::Equal))
            .await
            .unwrap_err();
        assert!(matches!(err, ExpenseError::GroupNotFound));
    }

    #[tokio::test]
    async fn test_create_expense_rejects_bad_percentages() {
        let db = get_test_db().await;
        let group_id = seed_group(&db).await;

        let mut input = raw(group_id, dec!(80.00), SplitMode::Percentage);
        input.percentages = Some(vec![dec!(60), dec!(30)]);
        let err = ExpenseService::create_expense(&db, input).await.unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidInput(_)));

        let listed = ExpenseService::list_expenses(&db, ExpenseFilter::default()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_create_expense_zero_amount() {
        let db = get_test_db().await;
        let group_id = seed_group(&db).await;
        let err = ExpenseService::create_expense(&db, raw(group_id, dec!(0.004), SplitMode::Equal))
            .await
            .unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_expense_recomputes_splits() {
        let db = get_test_db().await;
        let group_id = seed_group(&db).await;
        let expense = ExpenseService::create_expense(&db, raw(group_id, dec!(20.00), SplitMode::Equal))
            .await
            .unwrap();

        let update = RawUpdateExpenseRequest {
            split_mode: Some(SplitMode::Custom),
            custom_amounts: Some(vec![dec!(5), dec!(15)]),
            ..Default::default()
        };
        let updated = ExpenseService::update_expense(&db, expense.id, update).await.unwrap();
        assert_eq!(updated.record.split_mode, SplitMode::Custom);
        assert_eq!(updated.record.split_details[1].amount, Money::new(dec!(15)));
        assert_eq!(updated.record.amount, expense.record.amount);
    }

    #[tokio::test]
    async fn test_update_expense_not_found() {
        let db = get_test_db().await;
        let err = ExpenseService::update_expense(&db, 5, RawUpdateExpenseRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExpenseError::NotFound));
    }

    #[tokio::test]
    async fn test_list_rejects_bad_date_filter() {
        let db = get_test_db().await;
        let filter = ExpenseFilter {
            start_date: Some("March".into()),
            ..Default::default()
        };
        let err = ExpenseService::list_expenses(&db, filter).await.unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_amount_filter() {
        let db = get_test_db().await;
        let group_id = seed_group(&db).await;
        ExpenseService::create_expense(&db, raw(group_id, dec!(25.00), SplitMode::Equal))
            .await
            .unwrap();

        let filter = ExpenseFilter {
            min_amount: Some(Decimal::MAX),
            ..Default::default()
        };
        let err = ExpenseService::list_expenses(&db, filter).await.unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_expense() {
        let db = get_test_db().await;
        let group_id = seed_group(&db).await;
        let expense = ExpenseService::create_expense(&db, raw(group_id, dec!(9.99), SplitMode::Equal))
            .await
            .unwrap();

        ExpenseService::delete_expense(&db, expense.id).await.unwrap();
        assert!(matches!(ExpenseService::get_expense(&db, expense.id).await, Err(ExpenseError::NotFound)));
    }
}
