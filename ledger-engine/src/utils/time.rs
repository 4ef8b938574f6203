//! Date helpers: surface validation and calendar math.

use super::{AppError, AppResult};
use chrono::NaiveDate;

/// Validate that a date is not in the future (UTC)
pub fn validate_not_future(date: NaiveDate) -> AppResult<()> {
    let today = chrono::Utc::now().date_naive();
    if date > today {
        return Err(AppError::validation(format!(
            "Date {date} is in the future (today is {today})"
        )));
    }
    Ok(())
}

/// First and last day of a calendar quarter (1..=4).
pub fn quarter_window(year: i32, quarter: u8) -> AppResult<(NaiveDate, NaiveDate)> {
    if !(1..=4).contains(&quarter) {
        return Err(AppError::validation(format!(
            "Quarter must be 1..=4, got {quarter}"
        )));
    }
    let start_month = (quarter as u32 - 1) * 3 + 1;
    let start = NaiveDate::from_ymd_opt(year, start_month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid year {year}")))?;
    // Last day = day before the first of the next quarter
    let (end_year, end_month) = if quarter == 4 {
        (year + 1, 1)
    } else {
        (year, start_month + 3)
    };
    let end = NaiveDate::from_ymd_opt(end_year, end_month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid year {year}")))?
        .pred_opt()
        .ok_or_else(|| AppError::validation(format!("Invalid year {year}")))?;
    Ok((start, end))
}
