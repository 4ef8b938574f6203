//! Engine Assembly
//!
//! [`LedgerEngine`] is the explicitly constructed object the outer
//! plumbing (bot handlers, API routes, schedulers) talks to. It owns the
//! database handle and the service objects; nothing in the crate is
//! reachable through globals.

use crate::core::config::Config;
use crate::db::repository::{advance, category, employee, entry, receipt};
use crate::db::DbService;
use crate::services::advances::{AdvanceIssued, AdvanceTracker, ReceiptReported};
use crate::services::balance::BalanceCalculator;
use crate::services::fiscal::{FiscalDataSource, SbisOfdClient};
use crate::services::shift_check::{ShiftCheckResult, ShiftValidator};
use crate::services::shift_importer::ShiftImporter;
use crate::services::tax::{QuarterTax, TaxEngine, YearTax};
use crate::utils::{AppError, AppResult};
use chrono::NaiveDate;
use shared::models::{
    AccountableAdvance, AdvanceIssue, AdvanceStatus, CashBalanceSnapshot, Category, CategoryCreate,
    CategoryKind, Employee, EmployeeCreate, EntryCreate, EntryFilter, LedgerEntry, Receipt,
    ReceiptCreate, ShiftKind, ShiftReport, ShiftReportCreate,
};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct LedgerEngine {
    db: DbService,
    validator: ShiftValidator,
    advances: AdvanceTracker,
    importer: ShiftImporter,
    balance: BalanceCalculator,
    tax: TaxEngine,
}

impl LedgerEngine {
    /// Open the database and wire the services around it.
    pub async fn new(config: &Config, fiscal: Arc<dyn FiscalDataSource>) -> AppResult<Self> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::with_db(db, fiscal))
    }

    /// Assemble around an already-open database.
    pub fn with_db(db: DbService, fiscal: Arc<dyn FiscalDataSource>) -> Self {
        let pool = db.pool.clone();
        Self {
            db,
            validator: ShiftValidator::new(fiscal),
            advances: AdvanceTracker::new(pool.clone()),
            importer: ShiftImporter::new(pool.clone()),
            balance: BalanceCalculator::new(pool.clone()),
            tax: TaxEngine::new(pool),
        }
    }

    /// Production fiscal source from config, if credentials are present.
    pub fn fiscal_from_config(config: &Config) -> AppResult<Arc<dyn FiscalDataSource>> {
        match (&config.sbis_api_token, &config.sbis_inn) {
            (Some(token), Some(inn)) => Ok(Arc::new(SbisOfdClient::new(token, inn)?)),
            _ => Err(AppError::config(
                "SBIS_API_TOKEN and SBIS_INN must both be set for fiscal reconciliation",
            )),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    // ===== Shift reports =====

    pub async fn record_shift_report(&self, data: ShiftReportCreate) -> AppResult<ShiftReport> {
        self.importer.record(data).await
    }

    /// Turn pending shift reports into confirmed income entries.
    pub async fn process_pending_reports(&self) -> AppResult<u32> {
        self.importer.process_pending().await
    }

    /// Reconcile a recorded shift against the fiscal register.
    pub async fn check_shift(&self, date: NaiveDate, shift: ShiftKind) -> AppResult<ShiftCheckResult> {
        let report = crate::db::repository::shift_report::find_by_date_shift(self.pool(), date, shift)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No shift report recorded for {date} {shift:?}"))
            })?;
        Ok(self.validator.check(&report).await)
    }

    // ===== Ledger =====

    /// Record a ledger entry. The ledger records money that has already
    /// moved, so future-dated entries are rejected.
    pub async fn create_entry(&self, data: EntryCreate) -> AppResult<LedgerEntry> {
        crate::utils::time::validate_not_future(data.date)?;
        Ok(entry::create(self.pool(), data).await?)
    }

    pub async fn confirm_entry(&self, id: i64, actor: &str) -> AppResult<LedgerEntry> {
        Ok(entry::confirm(self.pool(), id, actor).await?)
    }

    pub async fn entries_for_period(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        filter: EntryFilter,
    ) -> AppResult<Vec<LedgerEntry>> {
        Ok(entry::find_by_period(self.pool(), from, to, filter).await?)
    }

    pub async fn delete_entry(&self, id: i64) -> AppResult<bool> {
        Ok(entry::delete(self.pool(), id).await?)
    }

    // ===== Cash balance =====

    pub async fn cash_balance(&self, as_of: NaiveDate) -> AppResult<i64> {
        self.balance.calculate(as_of).await
    }

    pub async fn get_or_create_cash_snapshot(&self, date: NaiveDate) -> AppResult<CashBalanceSnapshot> {
        self.balance.get_or_create_snapshot(date).await
    }

    pub async fn update_cash_snapshot(
        &self,
        date: NaiveDate,
        reported: i64,
        note: Option<&str>,
    ) -> AppResult<CashBalanceSnapshot> {
        self.balance.update_snapshot(date, reported, note).await
    }

    /// Human sign-off on a snapshot's discrepancy.
    pub async fn confirm_cash_snapshot(&self, date: NaiveDate) -> AppResult<CashBalanceSnapshot> {
        self.balance.confirm_snapshot(date).await
    }

    pub async fn recent_cash_snapshots(&self, limit: i64) -> AppResult<Vec<CashBalanceSnapshot>> {
        Ok(crate::db::repository::cash_balance::find_recent(self.pool(), limit).await?)
    }

    // ===== Advances =====

    pub async fn issue_advance(&self, data: AdvanceIssue) -> AppResult<AdvanceIssued> {
        let today = chrono::Utc::now().date_naive();
        self.advances.issue(data, today).await
    }

    pub async fn report_advance_receipt(
        &self,
        advance_id: i64,
        receipt: ReceiptCreate,
        category_id: Option<i64>,
    ) -> AppResult<ReceiptReported> {
        self.advances.report_receipt(advance_id, receipt, category_id).await
    }

    pub async fn evaluate_deadlines(&self, as_of: NaiveDate) -> AppResult<u64> {
        self.advances.evaluate_deadlines(as_of).await
    }

    pub async fn mark_advance_taxed(&self, advance_id: i64) -> AppResult<AccountableAdvance> {
        self.advances.mark_taxed(advance_id).await
    }

    pub async fn advances_by_status(&self, status: AdvanceStatus) -> AppResult<Vec<AccountableAdvance>> {
        Ok(advance::find_by_status(self.pool(), status).await?)
    }

    pub async fn open_advances(&self, employee_id: i64) -> AppResult<Vec<AccountableAdvance>> {
        Ok(advance::find_open_by_employee(self.pool(), employee_id).await?)
    }

    pub async fn advance_receipts(&self, advance_id: i64) -> AppResult<Vec<Receipt>> {
        Ok(receipt::find_by_advance(self.pool(), advance_id).await?)
    }

    // ===== Tax =====

    pub async fn compute_quarter_tax(&self, year: i32, quarter: u8) -> AppResult<QuarterTax> {
        self.tax.compute_quarter(year, quarter).await
    }

    pub async fn compute_year_tax(&self, year: i32) -> AppResult<YearTax> {
        self.tax.compute_year(year).await
    }

    // ===== Reference data =====

    pub async fn create_category(&self, data: CategoryCreate) -> AppResult<Category> {
        Ok(category::create(self.pool(), data).await?)
    }

    pub async fn categories(&self, kind: CategoryKind) -> AppResult<Vec<Category>> {
        Ok(category::find_active(self.pool(), kind).await?)
    }

    pub async fn deactivate_category(&self, id: i64) -> AppResult<()> {
        Ok(category::deactivate(self.pool(), id).await?)
    }

    pub async fn create_employee(&self, data: EmployeeCreate) -> AppResult<Employee> {
        Ok(employee::create(self.pool(), data).await?)
    }

    pub async fn employees(&self) -> AppResult<Vec<Employee>> {
        Ok(employee::find_active(self.pool()).await?)
    }

    pub async fn deactivate_employee(&self, id: i64) -> AppResult<()> {
        Ok(employee::deactivate(self.pool(), id).await?)
    }
}
