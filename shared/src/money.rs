//! Money helpers
//!
//! Stored amounts are `i64` minor units (kopecks): exact fixed-point that
//! SQL `SUM`/`CHECK` constraints handle natively. Rate arithmetic (tax
//! percentages, tolerances) is done in `rust_decimal::Decimal`. No `f64`
//! is involved at any point.

use rust_decimal::Decimal;

/// Minor units (kopecks) → major units (rubles) as an exact `Decimal`.
pub fn to_major(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
