use crate::service::ExpenseError;
use chrono::NaiveDate;
use ledger::{ExpenseRecord, Money, SplitCalculator, SplitMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "Other";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub group_id: i64,
    pub description: String,
    pub category: String,
    pub expense_date: String, // 'YYYY-MM-DD'
    #[serde(flatten)]
    pub record: ExpenseRecord,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RawCreateExpenseRequest {
    pub group_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub expense_date: Option<String>,
    pub payer: String,
    pub participants: Vec<String>,
    pub split_mode: SplitMode,
    pub custom_amounts: Option<Vec<Decimal>>,
    pub percentages: Option<Vec<Decimal>>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawUpdateExpenseRequest {
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub expense_date: Option<String>,
    pub payer: Option<String>,
    pub participants: Option<Vec<String>>,
    pub split_mode: Option<SplitMode>,
    pub custom_amounts: Option<Vec<Decimal>>,
    pub percentages: Option<Vec<Decimal>>,
    pub category: Option<String>,
}

impl RawUpdateExpenseRequest {
    /// Whether the stored split details have to be recomputed.
    pub fn touches_split(&self) -> bool {
        self.amount.is_some()
            || self.participants.is_some()
            || self.split_mode.is_some()
            || self.custom_amounts.is_some()
            || self.percentages.is_some()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ExpenseFilter {
    pub group_id: Option<i64>,
    pub participant: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub search: Option<String>,
}

impl ExpenseFilter {
    pub fn validate(&self) -> Result<(), String> {
        for date in [&self.start_date, &self.end_date].into_iter().flatten() {
            NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;
        }
        for (field, amount) in [("min_amount", self.min_amount), ("max_amount", self.max_amount)] {
            if let Some(amount) = amount {
                if Money::new(amount).round().to_cents().is_none() {
                    return Err(format!("{} {} is out of range", field, amount));
                }
            }
        }
        Ok(())
    }

    pub fn min_cents(&self) -> Option<i64> {
        self.min_amount.and_then(|a| Money::new(a).round().to_cents())
    }

    pub fn max_cents(&self) -> Option<i64> {
        self.max_amount.and_then(|a| Money::new(a).round().to_cents())
    }
}

/// An expense ready to be written: descriptive fields are normalized and the
/// split details have been computed and checked.
#[derive(Debug)]
pub struct ExpenseRequest {
    group_id: i64,
    description: String,
    category: String,
    expense_date: String,
    record: ExpenseRecord,
}

impl ExpenseRequest {
    pub fn new(raw: RawCreateExpenseRequest, today: NaiveDate) -> Result<Self, ExpenseError> {
        let amount = Money::new(raw.amount).round();
        let participants = normalize_names(raw.participants)?;
        let custom: Option<Vec<Money>> = raw.custom_amounts.map(|v| v.into_iter().map(Money::new).collect());

        let split_details = SplitCalculator::compute(
            amount,
            &participants,
            raw.split_mode,
            custom.as_deref(),
            raw.percentages.as_deref(),
        )?;

        Ok(Self {
            group_id: raw.group_id,
            description: required(raw.description, "Description")?,
            category: category_or_default(raw.category),
            expense_date: parse_date(raw.expense_date, today)?,
            record: ExpenseRecord {
                amount,
                payer: required(raw.payer, "Payer")?,
                participants,
                split_mode: raw.split_mode,
                split_details,
            },
        })
    }

    /// Applies a partial update to a stored expense.
    ///
    /// Splits are recomputed only when a split-relevant field is present.
    /// Custom amounts and percentages not sent again fall back to the stored
    /// ones while the split mode stays the same.
    pub fn amend(existing: Expense, raw: RawUpdateExpenseRequest) -> Result<Self, ExpenseError> {
        let resplit = raw.touches_split();
        let stored = existing.record;

        let amount = raw.amount.map(|a| Money::new(a).round()).unwrap_or(stored.amount);
        let participants = match raw.participants {
            Some(list) => normalize_names(list)?,
            None => stored.participants.clone(),
        };
        let split_mode = raw.split_mode.unwrap_or(stored.split_mode);
        let payer = match raw.payer {
            Some(payer) => required(payer, "Payer")?,
            None => stored.payer.clone(),
        };

        let split_details = if resplit {
            let same_mode = split_mode == stored.split_mode;
            let custom: Option<Vec<Money>> = match raw.custom_amounts {
                Some(v) => Some(v.into_iter().map(Money::new).collect()),
                None if same_mode && split_mode == SplitMode::Custom => {
                    Some(stored.split_details.iter().map(|s| s.amount).collect())
                }
                None => None,
            };
            let percentages: Option<Vec<Decimal>> = match raw.percentages {
                Some(v) => Some(v),
                None if same_mode && split_mode == SplitMode::Percentage => {
                    stored.split_details.iter().map(|s| s.percentage).collect()
                }
                None => None,
            };
            SplitCalculator::compute(amount, &participants, split_mode, custom.as_deref(), percentages.as_deref())?
        } else {
            stored.split_details
        };

        let description = match raw.description {
            Some(d) => required(d, "Description")?,
            None => existing.description,
        };
        let category = match raw.category {
            Some(c) => category_or_default(Some(c)),
            None => existing.category,
        };
        let expense_date = match raw.expense_date {
            Some(d) => parse_date(Some(d), chrono::Local::now().date_naive())?,
            None => existing.expense_date,
        };

        Ok(Self {
            group_id: existing.group_id,
            description,
            category,
            expense_date,
            record: ExpenseRecord {
                amount,
                payer,
                participants,
                split_mode,
                split_details,
            },
        })
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn expense_date(&self) -> &str {
        &self.expense_date
    }

    pub fn record(&self) -> &ExpenseRecord {
        &self.record
    }
}

fn required(value: String, field: &str) -> Result<String, ExpenseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ExpenseError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn normalize_names(names: Vec<String>) -> Result<Vec<String>, ExpenseError> {
    names
        .into_iter()
        .map(|n| required(n, "Participant name"))
        .collect()
}

fn category_or_default(category: Option<String>) -> String {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

fn parse_date(date: Option<String>, today: NaiveDate) -> Result<String, ExpenseError> {
    match date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => NaiveDate::parse_from_str(d, DATE_FORMAT)
            .map(|parsed| parsed.format(DATE_FORMAT).to_string())
            .map_err(|_| ExpenseError::InvalidInput("Invalid date format, expected YYYY-MM-DD".to_string())),
        None => Ok(today.format(DATE_FORMAT).to_string()),
    }
}
