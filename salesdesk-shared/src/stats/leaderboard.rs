use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::Purchase;

/// Trailing window for the presence board, in days.
pub const PRESENCE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_display_name: String,
    pub value: f64,
}

impl LeaderboardEntry {
    /// Sentinel returned when no purchase qualifies.
    pub fn none() -> Self {
        LeaderboardEntry {
            user_display_name: "-".into(),
            value: 0.0,
        }
    }
}

/// Non-refunded purchases with a seller name, in input order.
fn scored(purchases: &[Purchase]) -> impl Iterator<Item = (&str, &Purchase)> {
    purchases
        .iter()
        .filter(|p| !p.refunded)
        .filter_map(|p| p.user_display_name.as_deref().map(|name| (name, p)))
}

struct SellerAgg<'a> {
    name: &'a str,
    total: f64,
    count: u32,
}

/// Per-seller totals in first-seen order, so ties resolve to the seller
/// encountered first.
fn by_seller(purchases: &[Purchase]) -> Vec<SellerAgg<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<SellerAgg> = Vec::new();
    for (name, p) in scored(purchases) {
        let i = *index.entry(name).or_insert_with(|| {
            rows.push(SellerAgg {
                name,
                total: 0.0,
                count: 0,
            });
            rows.len() - 1
        });
        rows[i].total += p.amount.normalize();
        rows[i].count += 1;
    }
    rows
}

fn first_max<I: IntoIterator<Item = (String, f64)>>(entries: I) -> LeaderboardEntry {
    let mut winner: Option<(String, f64)> = None;
    for (name, value) in entries {
        let better = match &winner {
            Some((_, best)) => value > *best,
            None => true,
        };
        if better {
            winner = Some((name, value));
        }
    }
    match winner {
        Some((user_display_name, value)) => LeaderboardEntry {
            user_display_name,
            value,
        },
        None => LeaderboardEntry::none(),
    }
}

/// Seller with the highest summed sales.
pub fn top_seller(purchases: &[Purchase]) -> LeaderboardEntry {
    first_max(
        by_seller(purchases)
            .into_iter()
            .map(|agg| (agg.name.to_string(), agg.total)),
    )
}

/// The single largest sale.
pub fn highest_sale(purchases: &[Purchase]) -> LeaderboardEntry {
    first_max(scored(purchases).map(|(name, p)| (name.to_string(), p.amount.normalize())))
}

/// Seller with the highest mean sale value.
pub fn top_average_value(purchases: &[Purchase]) -> LeaderboardEntry {
    first_max(
        by_seller(purchases)
            .into_iter()
            .map(|agg| (agg.name.to_string(), agg.total / f64::from(agg.count))),
    )
}

/// Seller active on the most distinct calendar days within the trailing
/// 30-day window ending at `now` (inclusive lower bound). Days are counted
/// in the supplied reporting timezone.
pub fn top_presence(purchases: &[Purchase], now: DateTime<Utc>, tz: Tz) -> LeaderboardEntry {
    let cutoff = now - Duration::days(PRESENCE_WINDOW_DAYS);
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<(&str, HashSet<NaiveDate>)> = Vec::new();
    for (name, p) in scored(purchases) {
        if p.purchased_at < cutoff {
            continue;
        }
        let i = *index.entry(name).or_insert_with(|| {
            rows.push((name, HashSet::new()));
            rows.len() - 1
        });
        rows[i].1.insert(p.purchased_at.with_timezone(&tz).date_naive());
    }
    first_max(
        rows.into_iter()
            .map(|(name, days)| (name.to_string(), days.len() as f64)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Amount;
    use chrono::TimeZone;

    const TZ: Tz = chrono_tz::Europe::Stockholm;

    fn sale(seller: Option<&str>, amount: Amount, at: DateTime<Utc>) -> Purchase {
        Purchase {
            id: format!("{seller:?}-{at}"),
            purchased_at: at,
            amount,
            user_display_name: seller.map(|s| s.to_string()),
            payment_type: None,
            products: None,
            product_name: None,
            quantity: None,
            refunded: false,
            refund_uuid: None,
            refund_timestamp: None,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_returns_sentinel() {
        assert_eq!(top_seller(&[]), LeaderboardEntry::none());
        assert_eq!(highest_sale(&[]), LeaderboardEntry::none());
        assert_eq!(top_average_value(&[]), LeaderboardEntry::none());
        assert_eq!(
            top_presence(&[], at(15, 12), TZ),
            LeaderboardEntry::none()
        );
    }

    #[test]
    fn top_seller_sums_per_seller_and_drops_nulls() {
        let sales = vec![
            sale(Some("Maja"), Amount::Number(100.0), at(1, 10)),
            sale(Some("Erik"), Amount::Number(250.0), at(2, 10)),
            sale(Some("Maja"), Amount::Number(200.0), at(3, 10)),
            sale(None, Amount::Number(10_000.0), at(3, 11)),
        ];
        let top = top_seller(&sales);
        assert_eq!(top.user_display_name, "Maja");
        assert_eq!(top.value, 300.0);
    }

    #[test]
    fn refunded_sales_do_not_score() {
        let mut refunded = sale(Some("Erik"), Amount::Number(9_999.0), at(1, 9));
        refunded.refunded = true;
        let sales = vec![refunded, sale(Some("Maja"), Amount::Number(50.0), at(1, 10))];
        assert_eq!(top_seller(&sales).user_display_name, "Maja");
    }

    #[test]
    fn highest_sale_first_encountered_wins_ties() {
        let sales = vec![
            sale(Some("Maja"), Amount::Number(500.0), at(1, 10)),
            sale(Some("Erik"), Amount::Number(500.0), at(2, 10)),
        ];
        assert_eq!(highest_sale(&sales).user_display_name, "Maja");
    }

    #[test]
    fn string_amounts_are_normalized() {
        let sales = vec![
            sale(Some("Maja"), Amount::Text("199,50".into()), at(1, 10)),
            sale(Some("Erik"), Amount::Number(150.0), at(2, 10)),
        ];
        let top = highest_sale(&sales);
        assert_eq!(top.user_display_name, "Maja");
        assert_eq!(top.value, 199.5);
    }

    #[test]
    fn top_average_divides_by_sale_count() {
        let sales = vec![
            sale(Some("Maja"), Amount::Number(100.0), at(1, 10)),
            sale(Some("Maja"), Amount::Number(300.0), at(2, 10)),
            sale(Some("Erik"), Amount::Number(150.0), at(3, 10)),
        ];
        let top = top_average_value(&sales);
        assert_eq!(top.user_display_name, "Maja");
        assert_eq!(top.value, 200.0);
    }

    #[test]
    fn presence_counts_distinct_days_within_window() {
        let now = at(30, 12);
        let sales = vec![
            // Two sales on the same local day count once.
            sale(Some("Maja"), Amount::Number(10.0), at(28, 8)),
            sale(Some("Maja"), Amount::Number(10.0), at(28, 15)),
            sale(Some("Maja"), Amount::Number(10.0), at(29, 9)),
            // Erik: one day in window, one outside.
            sale(Some("Erik"), Amount::Number(10.0), at(27, 9)),
            sale(
                Some("Erik"),
                Amount::Number(10.0),
                Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
            ),
        ];
        let top = top_presence(&sales, now, TZ);
        assert_eq!(top.user_display_name, "Maja");
        assert_eq!(top.value, 2.0);
    }

    #[test]
    fn presence_window_lower_bound_is_inclusive() {
        let now = at(30, 12);
        let boundary = now - Duration::days(PRESENCE_WINDOW_DAYS);
        let sales = vec![sale(Some("Maja"), Amount::Number(10.0), boundary)];
        assert_eq!(top_presence(&sales, now, TZ).value, 1.0);
    }
}
