//! Fiscal Register Data Source
//!
//! Shift reconciliation needs the Z-report the cash register uploaded to
//! the fiscal operator (OFD). [`FiscalDataSource`] is the seam; the
//! production implementation talks to the SBIS OFD REST API, tests plug
//! in a canned source.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

const SBIS_BASE_URL: &str = "https://api.sbis.ru/ofd/v1";

#[derive(Debug, thiserror::Error)]
pub enum FiscalError {
    #[error("Fiscal register request failed: {0}")]
    Request(String),

    #[error("Fiscal register returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("No fiscal shift data for {0}")]
    NoData(NaiveDate),

    #[error("Malformed fiscal response: {0}")]
    Decode(String),
}

/// Z-report totals for one register shift, in major units (rubles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftTotals {
    pub cash: Decimal,
    pub cashless: Decimal,
    pub total: Decimal,
    pub receipts_count: u32,
    pub shift_number: Option<u32>,
    pub closed_at: Option<String>,
}

/// What the reconciler needs from a fiscal operator.
#[async_trait]
pub trait FiscalDataSource: Send + Sync {
    async fn shift_totals(&self, date: NaiveDate) -> Result<ShiftTotals, FiscalError>;
}

/// SBIS OFD shift-report payload. Amounts arrive as JSON numbers in
/// rubles; they are rounded to kopeck precision on conversion.
#[derive(Debug, Deserialize)]
struct SbisShiftReport {
    #[serde(default, with = "rust_decimal::serde::float")]
    cash: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    cashless: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    total: Decimal,
    #[serde(default)]
    receipts_count: u32,
    shift_number: Option<u32>,
    closed_at: Option<String>,
}

/// SBIS OFD API client.
///
/// Single attempt per call with a 30s timeout; the nightly reconciliation
/// pass simply reports an error status when the operator is unreachable,
/// and the next pass retries.
#[derive(Debug, Clone)]
pub struct SbisOfdClient {
    client: Client,
    base_url: String,
    api_token: String,
    inn: String,
}

impl SbisOfdClient {
    pub fn new(
        api_token: impl Into<String>,
        inn: impl Into<String>,
    ) -> Result<Self, FiscalError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| FiscalError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: SBIS_BASE_URL.to_string(),
            api_token: api_token.into(),
            inn: inn.into(),
        })
    }

    /// Point the client at a different endpoint (staging, local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl FiscalDataSource for SbisOfdClient {
    async fn shift_totals(&self, date: NaiveDate) -> Result<ShiftTotals, FiscalError> {
        let url = format!("{}/shift-report", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("inn", self.inn.as_str()), ("date", &date.to_string())])
            .send()
            .await
            .map_err(|e| FiscalError::Request(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FiscalError::NoData(date));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, date = %date, "SBIS OFD API error");
            return Err(FiscalError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let report: SbisShiftReport = response
            .json()
            .await
            .map_err(|e| FiscalError::Decode(e.to_string()))?;

        Ok(ShiftTotals {
            cash: report.cash.round_dp(2),
            cashless: report.cashless.round_dp(2),
            total: report.total.round_dp(2),
            receipts_count: report.receipts_count,
            shift_number: report.shift_number,
            closed_at: report.closed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_report_parses_numeric_amounts() {
        let json = r#"{
            "cash": 15000.0,
            "cashless": 8000.5,
            "total": 23000.5,
            "receipts_count": 150,
            "shift_number": 123,
            "opened_at": "2025-01-15T08:00:00",
            "closed_at": "2025-01-15T20:00:00"
        }"#;
        let report: SbisShiftReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.cash, Decimal::new(15_000_00, 2));
        assert_eq!(report.cashless, Decimal::new(8_000_50, 2));
        assert_eq!(report.receipts_count, 150);
        assert_eq!(report.shift_number, Some(123));
    }

    #[test]
    fn client_builds_with_its_timeout() {
        assert!(SbisOfdClient::new("token", "7707083893").is_ok());
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let report: SbisShiftReport = serde_json::from_str("{}").unwrap();
        assert_eq!(report.cash, Decimal::ZERO);
        assert_eq!(report.total, Decimal::ZERO);
        assert_eq!(report.receipts_count, 0);
        assert!(report.shift_number.is_none());
    }
}
