//! Tax Engine: USN "income minus expenses"
//!
//! Aggregates confirmed ledger entries per calendar quarter and computes
//! the simplified-tax liability: 15% of the base, floored by the 1%
//! minimum tax on gross income. Quarterly figures use isolated windows;
//! the advance-payment schedule is computed on cumulative year-to-date
//! windows with prior advances subtracted.

use crate::db::repository::{entry, RepoError};
use crate::utils::time::quarter_window;
use crate::utils::{AppError, AppResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::money::to_major;
use sqlx::{SqliteConnection, SqlitePool};

/// USN "income minus expenses" rate: 15%
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
/// Statutory minimum tax: 1% of gross income
pub const MIN_TAX_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One quarter's figures, all in rubles.
#[derive(Debug, Clone, Serialize)]
pub struct QuarterTax {
    pub year: i32,
    pub quarter: u8,
    pub income: Decimal,
    pub deductible_expense: Decimal,
    pub tax_base: Decimal,
    pub tax: Decimal,
    pub min_tax: Decimal,
    pub tax_to_pay: Decimal,
}

/// One line of the advance-payment schedule.
#[derive(Debug, Clone, Serialize)]
pub struct AdvancePayment {
    pub quarter: u8,
    /// What is actually due for this quarter after prior advances
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearTax {
    pub year: i32,
    pub quarters: Vec<QuarterTax>,
    pub schedule: Vec<AdvancePayment>,
    /// Cumulative tax-to-pay for the full year
    pub total_due: Decimal,
}

/// The arithmetic core, separated so it is testable without a ledger.
fn assess(income: Decimal, deductible_expense: Decimal) -> (Decimal, Decimal, Decimal, Decimal) {
    let tax_base = (income - deductible_expense).max(Decimal::ZERO);
    let tax = (tax_base * TAX_RATE).round_dp(2);
    let min_tax = (income * MIN_TAX_RATE).round_dp(2);
    let tax_to_pay = tax.max(min_tax);
    (tax_base, tax, min_tax, tax_to_pay)
}

async fn window_figures(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<(Decimal, Decimal)> {
    let income = to_major(entry::income_sum(conn, from, to).await?);
    let expense = to_major(entry::deductible_expense_sum(conn, from, to).await?);
    Ok((income, expense))
}

fn advance_due_date(year: i32, quarter: u8) -> AppResult<NaiveDate> {
    let (y, m, d) = match quarter {
        1 => (year, 4, 25),
        2 => (year, 7, 25),
        3 => (year, 10, 25),
        // Annual declaration deadline
        4 => (year + 1, 3, 31),
        q => return Err(AppError::validation(format!("Quarter must be 1..=4, got {q}"))),
    };
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| AppError::Internal(format!("Invalid statutory deadline {y}-{m}-{d}")))
}

#[derive(Clone)]
pub struct TaxEngine {
    pool: SqlitePool,
}

impl TaxEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Figures for one isolated quarter window. Both aggregates run in
    /// one transaction so a concurrent confirmation cannot land between
    /// the income and expense reads.
    pub async fn compute_quarter(&self, year: i32, quarter: u8) -> AppResult<QuarterTax> {
        let (from, to) = quarter_window(year, quarter)?;
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let (income, deductible_expense) = window_figures(&mut tx, from, to).await?;
        tx.commit().await.map_err(RepoError::from)?;

        let (tax_base, tax, min_tax, tax_to_pay) = assess(income, deductible_expense);
        Ok(QuarterTax {
            year,
            quarter,
            income,
            deductible_expense,
            tax_base,
            tax,
            min_tax,
            tax_to_pay,
        })
    }

    /// Full-year picture: isolated quarterly figures plus the cumulative
    /// advance-payment schedule.
    pub async fn compute_year(&self, year: i32) -> AppResult<YearTax> {
        let year_start = quarter_window(year, 1)?.0;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let mut quarters = Vec::with_capacity(4);
        let mut schedule = Vec::with_capacity(4);
        let mut advances_paid = Decimal::ZERO;

        for quarter in 1..=4u8 {
            let (from, to) = quarter_window(year, quarter)?;

            let (income, deductible_expense) = window_figures(&mut tx, from, to).await?;
            let (tax_base, tax, min_tax, tax_to_pay) = assess(income, deductible_expense);
            quarters.push(QuarterTax {
                year,
                quarter,
                income,
                deductible_expense,
                tax_base,
                tax,
                min_tax,
                tax_to_pay,
            });

            // Year-to-date window for the advance actually due
            let (ytd_income, ytd_expense) = window_figures(&mut tx, year_start, to).await?;
            let (_, _, _, ytd_to_pay) = assess(ytd_income, ytd_expense);
            let amount = (ytd_to_pay - advances_paid).max(Decimal::ZERO);
            advances_paid += amount;
            schedule.push(AdvancePayment {
                quarter,
                amount,
                due_date: advance_due_date(year, quarter)?,
            });
        }
        tx.commit().await.map_err(RepoError::from)?;

        Ok(YearTax {
            year,
            quarters,
            schedule,
            total_due: advances_paid,
        })
    }
}
