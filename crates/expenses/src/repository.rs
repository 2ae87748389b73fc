use crate::models::{Expense, ExpenseFilter, ExpenseRequest};
use database::{self, RepositoryError};
use ledger::{ExpenseRecord, Money, SplitDetail, SplitMode};
use rust_decimal::Decimal;
use sqlx::{FromRow, QueryBuilder};

const EXPENSE_COLUMNS: &str =
    "id, group_id, description, category, expense_date, amount, payer, split_mode, created_at, updated_at";

#[derive(FromRow)]
struct ExpenseRow {
    id: i64,
    group_id: i64,
    description: String,
    category: String,
    expense_date: String,
    amount: i64, // Stored in cents
    payer: String,
    split_mode: String,
    created_at: String,
    updated_at: String,
}

#[derive(FromRow)]
struct SplitRow {
    expense_id: i64,
    participant_name: String,
    amount: i64,
    percentage: Option<String>,
}

impl SplitRow {
    fn into_detail(self) -> Result<SplitDetail, RepositoryError> {
        let percentage = self
            .percentage
            .map(|p| {
                p.parse::<Decimal>().map_err(|_| {
                    RepositoryError::DataIntegrity(format!(
                        "expense {} has unreadable percentage '{}'",
                        self.expense_id, p
                    ))
                })
            })
            .transpose()?;

        Ok(SplitDetail {
            participant_name: self.participant_name,
            amount: Money::from_cents(self.amount),
            percentage,
        })
    }
}

impl ExpenseRow {
    /// `splits` may hold rows of other expenses; only this expense's rows are
    /// taken, in stored order.
    fn into_expense(self, splits: &mut Vec<SplitRow>) -> Result<Expense, RepositoryError> {
        let split_mode: SplitMode = self.split_mode.parse().map_err(|e| {
            RepositoryError::DataIntegrity(format!("expense {}: {}", self.id, e))
        })?;

        let (mine, rest): (Vec<SplitRow>, Vec<SplitRow>) =
            std::mem::take(splits).into_iter().partition(|s| s.expense_id == self.id);
        *splits = rest;

        let split_details = mine
            .into_iter()
            .map(SplitRow::into_detail)
            .collect::<Result<Vec<_>, _>>()?;
        let participants = split_details.iter().map(|s| s.participant_name.clone()).collect();

        Ok(Expense {
            id: self.id,
            group_id: self.group_id,
            description: self.description,
            category: self.category,
            expense_date: self.expense_date,
            record: ExpenseRecord {
                amount: Money::from_cents(self.amount),
                payer: self.payer,
                participants,
                split_mode,
                split_details,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn cents(amount: Money) -> Result<i64, RepositoryError> {
    amount
        .round()
        .to_cents()
        .ok_or_else(|| RepositoryError::DataIntegrity(format!("amount {} does not fit in cents", amount)))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub struct ExpenseRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> ExpenseRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &ExpenseRequest) -> Result<i64, RepositoryError> {
        let record = req.record();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO expenses (group_id, description, category, expense_date, amount, payer, split_mode) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(req.group_id())
        .bind(req.description())
        .bind(req.category())
        .bind(req.expense_date())
        .bind(cents(record.amount)?)
        .bind(&record.payer)
        .bind(record.split_mode.as_str())
        .fetch_one(&mut *self.conn)
        .await?;

        self.insert_splits(id, &record.split_details).await?;
        Ok(id)
    }

    pub async fn update(&mut self, id: i64, req: &ExpenseRequest) -> Result<(), RepositoryError> {
        let record = req.record();
        let result = sqlx::query(
            "UPDATE expenses SET description = $1, category = $2, expense_date = $3, amount = $4, payer = $5, split_mode = $6, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now') WHERE id = $7",
        )
        .bind(req.description())
        .bind(req.category())
        .bind(req.expense_date())
        .bind(cents(record.amount)?)
        .bind(&record.payer)
        .bind(record.split_mode.as_str())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM expense_splits WHERE expense_id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        self.insert_splits(id, &record.split_details).await
    }

    async fn insert_splits(&mut self, expense_id: i64, splits: &[SplitDetail]) -> Result<(), RepositoryError> {
        for (position, split) in splits.iter().enumerate() {
            sqlx::query(
                "INSERT INTO expense_splits (expense_id, position, participant_name, amount, percentage) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(expense_id)
            .bind(position as i64)
            .bind(&split.participant_name)
            .bind(cents(split.amount)?)
            .bind(split.percentage.map(|p| p.normalize().to_string()))
            .execute(&mut *self.conn)
            .await?;
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Expense>, RepositoryError> {
        let row = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {} FROM expenses WHERE id = $1",
            EXPENSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut splits = self.splits_for(&[id]).await?;
        row.into_expense(&mut splits).map(Some)
    }

    /// Every expense of one group, oldest first. This is the order balances
    /// are folded in.
    pub async fn list_by_group(&mut self, group_id: i64) -> Result<Vec<Expense>, RepositoryError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
            "SELECT {} FROM expenses WHERE group_id = $1 ORDER BY id",
            EXPENSE_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(&mut *self.conn)
        .await?;

        self.attach_splits(rows).await
    }

    /// Newest expense date first.
    pub async fn list(&mut self, filter: &ExpenseFilter) -> Result<Vec<Expense>, RepositoryError> {
        let mut qb = QueryBuilder::<database::Driver>::new(format!(
            "SELECT {} FROM expenses WHERE 1 = 1",
            EXPENSE_COLUMNS
        ));

        if let Some(group_id) = filter.group_id {
            qb.push(" AND group_id = ").push_bind(group_id);
        }
        if let Some(participant) = filter.participant.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            qb.push(
                " AND EXISTS (SELECT 1 FROM expense_splits s WHERE s.expense_id = expenses.id AND s.participant_name = ",
            )
            .push_bind(participant.to_string())
            .push(")");
        }
        if let Some(start) = &filter.start_date {
            qb.push(" AND expense_date >= ").push_bind(start.clone());
        }
        if let Some(end) = &filter.end_date {
            qb.push(" AND expense_date <= ").push_bind(end.clone());
        }
        if let Some(min) = filter.min_cents() {
            qb.push(" AND amount >= ").push_bind(min);
        }
        if let Some(max) = filter.max_cents() {
            qb.push(" AND amount <= ").push_bind(max);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // SQLite LIKE is case-insensitive for ASCII.
            qb.push(" AND description LIKE ")
                .push_bind(escape_like(search))
                .push(" ESCAPE '\\'");
        }
        qb.push(" ORDER BY expense_date DESC, created_at DESC, id DESC");

        let rows = qb
            .build_query_as::<ExpenseRow>()
            .fetch_all(&mut *self.conn)
            .await?;

        self.attach_splits(rows).await
    }

    async fn attach_splits(&mut self, rows: Vec<ExpenseRow>) -> Result<Vec<Expense>, RepositoryError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut splits = self.splits_for(&ids).await?;
        rows.into_iter().map(|r| r.into_expense(&mut splits)).collect()
    }

    async fn splits_for(&mut self, ids: &[i64]) -> Result<Vec<SplitRow>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<database::Driver>::new(
            "SELECT expense_id, participant_name, amount, percentage FROM expense_splits WHERE expense_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY expense_id, position");

        let rows = qb.build_query_as::<SplitRow>().fetch_all(&mut *self.conn).await?;
        Ok(rows)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
