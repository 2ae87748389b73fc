use crate::error::LedgerError;
use crate::models::{SplitDetail, SplitMode};
use crate::money::Money;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Turns one expense amount into per-participant shares.
///
/// Every share is rounded half away from zero as it is produced; the last
/// participant in list order absorbs whatever rounding left over, so the
/// shares always add back up to the amount.
pub struct SplitCalculator;

impl SplitCalculator {
    pub fn compute(
        amount: Money,
        participants: &[String],
        mode: SplitMode,
        custom_amounts: Option<&[Money]>,
        percentages: Option<&[Decimal]>,
    ) -> Result<Vec<SplitDetail>, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if participants.is_empty() {
            return Err(LedgerError::NoParticipants);
        }
        let mut seen = HashSet::with_capacity(participants.len());
        for name in participants {
            if !seen.insert(name.as_str()) {
                return Err(LedgerError::DuplicateParticipant(name.clone()));
            }
        }

        let details = match mode {
            SplitMode::Equal => Self::equal(amount, participants),
            SplitMode::Custom => {
                let amounts = custom_amounts.ok_or(LedgerError::MissingSplitInputs {
                    mode,
                    field: "custom amounts",
                })?;
                Self::custom(amount, participants, amounts)?
            }
            SplitMode::Percentage => {
                let pcts = percentages.ok_or(LedgerError::MissingSplitInputs {
                    mode,
                    field: "percentages",
                })?;
                Self::percentage(amount, participants, pcts)?
            }
        };

        tracing::debug!(%amount, %mode, parts = details.len(), "computed split");
        Ok(details)
    }

    fn equal(amount: Money, participants: &[String]) -> Vec<SplitDetail> {
        let n = participants.len();
        let per = amount.divide(n).round();
        let allocated: Money = std::iter::repeat_n(per, n - 1).sum();
        let last = (amount - allocated).round();

        let shares = if (last - per).abs() > Money::EPSILON {
            // Only reachable with four or more participants (e.g. 0.06 / 4).
            Self::spread_cents(amount, per, n).unwrap_or_else(|| {
                let mut shares = vec![per; n - 1];
                shares.push(last);
                shares
            })
        } else {
            let mut shares = vec![per; n - 1];
            shares.push(last);
            shares
        };

        participants
            .iter()
            .zip(shares)
            .map(|(name, share)| SplitDetail {
                participant_name: name.clone(),
                amount: share,
                percentage: None,
            })
            .collect()
    }

    /// Hands out whole cents so no two shares differ by more than one cent,
    /// keeping the leading participants at `per` where the cents allow.
    fn spread_cents(amount: Money, per: Money, n: usize) -> Option<Vec<Money>> {
        let total = amount.round().to_cents()?;
        let per = per.to_cents()?;
        let parts = i64::try_from(n).ok()?;
        let base = total.div_euclid(parts);
        let extra = usize::try_from(total.rem_euclid(parts)).ok()?;

        let shares = (0..n)
            .map(|i| {
                let bumped = if per > base { i < extra } else { i >= n - extra };
                Money::from_cents(base + i64::from(bumped))
            })
            .collect();
        Some(shares)
    }

    fn custom(
        amount: Money,
        participants: &[String],
        amounts: &[Money],
    ) -> Result<Vec<SplitDetail>, LedgerError> {
        if amounts.len() != participants.len() {
            return Err(LedgerError::SplitCountMismatch {
                field: "custom amounts",
                expected: participants.len(),
                actual: amounts.len(),
            });
        }

        // The tolerance applies to the shares as stored, so round first.
        let rounded: Vec<Money> = amounts.iter().map(|a| a.round()).collect();
        let total: Money = rounded.iter().sum();
        if !total.approx_eq(amount) {
            return Err(LedgerError::SplitSumMismatch {
                expected: amount,
                actual: total,
                tolerance: Money::EPSILON,
            });
        }

        participants
            .iter()
            .zip(rounded)
            .map(|(name, share)| Self::share(name, share, None))
            .collect()
    }

    fn percentage(
        amount: Money,
        participants: &[String],
        pcts: &[Decimal],
    ) -> Result<Vec<SplitDetail>, LedgerError> {
        if pcts.len() != participants.len() {
            return Err(LedgerError::SplitCountMismatch {
                field: "percentages",
                expected: participants.len(),
                actual: pcts.len(),
            });
        }

        let total: Decimal = pcts.iter().sum();
        let tolerance = Money::EPSILON.as_decimal();
        if (total - Decimal::ONE_HUNDRED).abs() > tolerance {
            return Err(LedgerError::InvalidPercentageSum {
                expected: Decimal::ONE_HUNDRED,
                actual: total,
                tolerance,
            });
        }

        let last_index = participants.len() - 1;
        let mut allocated = Money::ZERO;
        let mut details = Vec::with_capacity(participants.len());
        for (i, (name, pct)) in participants.iter().zip(pcts).enumerate() {
            let share = if i == last_index {
                (amount - allocated).round()
            } else {
                amount.percent(*pct).round()
            };
            allocated += share;
            details.push(Self::share(name, share, Some(*pct))?);
        }
        Ok(details)
    }

    fn share(name: &str, amount: Money, percentage: Option<Decimal>) -> Result<SplitDetail, LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::NegativeShare {
                participant: name.to_string(),
                amount,
            });
        }
        Ok(SplitDetail {
            participant_name: name.to_string(),
            amount,
            percentage,
        })
    }
}
