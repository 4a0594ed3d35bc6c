use chrono::{DateTime, Utc};

use crate::domain::SaleRecord;

/// Accumulated-sales level at which the upper commission tier starts.
pub const ACCUMULATION_THRESHOLD: f64 = 25_000.0;
/// Fixed rate paid on sales past the threshold.
pub const UPPER_TIER_RATE_PERCENT: f64 = 15.0;

/// Tiered commission for one pay period.
///
/// `accumulated` is the seller's cumulative sales including this period.
/// At or below the threshold the whole period pays the base rate. When the
/// period straddles the threshold, the portion that brings cumulative sales
/// up to the threshold pays the base rate and the remainder pays the upper
/// tier. A period that starts past the threshold pays the upper tier in
/// full.
pub fn commission(period_total: f64, base_rate_percent: f64, accumulated: f64) -> f64 {
    let base = base_rate_percent / 100.0;
    let upper = UPPER_TIER_RATE_PERCENT / 100.0;

    if accumulated <= ACCUMULATION_THRESHOLD {
        return period_total * base;
    }
    let before_period = accumulated - period_total;
    if before_period < ACCUMULATION_THRESHOLD {
        let below = ACCUMULATION_THRESHOLD - before_period;
        let above = period_total - below;
        below * base + above * upper
    } else {
        period_total * upper
    }
}

/// Sum of a seller's sales up to and including `end_date`. Seller matching
/// is an exact display-name comparison; rows without a seller never match.
pub fn accumulated_sales(sales: &[SaleRecord], seller: &str, end_date: DateTime<Utc>) -> f64 {
    sales
        .iter()
        .filter(|s| s.user_display_name.as_deref() == Some(seller))
        .filter(|s| s.timestamp <= end_date)
        .map(|s| s.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn below_threshold_pays_base_rate() {
        assert_eq!(commission(10_000.0, 10.0, 20_000.0), 1_000.0);
    }

    #[test]
    fn straddling_period_is_split() {
        // 5000 below the threshold at 10%, 5000 above at 15%.
        assert_eq!(commission(10_000.0, 10.0, 30_000.0), 1_250.0);
    }

    #[test]
    fn fully_past_threshold_pays_upper_tier() {
        assert_eq!(commission(10_000.0, 10.0, 40_000.0), 1_500.0);
    }

    #[test]
    fn exact_threshold_is_inclusive_no_split() {
        assert_eq!(commission(25_000.0, 10.0, 25_000.0), 2_500.0);
    }

    fn sale(seller: Option<&str>, amount: f64, day: u32) -> SaleRecord {
        SaleRecord {
            timestamp: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            amount,
            user_display_name: seller.map(|s| s.to_string()),
            payment_type: None,
            product_name: None,
        }
    }

    #[test]
    fn accumulated_sales_matches_seller_up_to_inclusive_end_date() {
        let sales = vec![
            sale(Some("Maja"), 100.0, 1),
            sale(Some("Maja"), 200.0, 15),
            sale(Some("Erik"), 400.0, 10),
            sale(None, 800.0, 10),
            sale(Some("Maja"), 1_600.0, 20),
        ];
        let end = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(accumulated_sales(&sales, "Maja", end), 300.0);
    }

    #[test]
    fn accumulated_sales_on_empty_input_is_zero() {
        let end = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(accumulated_sales(&[], "Maja", end), 0.0);
    }
}
