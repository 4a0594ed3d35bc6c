use crate::domain::{Purchase, SaleRecord};

/// Map a backend-shaped purchase row into the legacy display shape.
/// Side-effect free; string amounts (comma decimal separator tolerated)
/// normalize to a number and absent optional fields stay `None`.
pub fn to_sale_record(purchase: &Purchase) -> SaleRecord {
    SaleRecord {
        timestamp: purchase.purchased_at,
        amount: purchase.amount.normalize(),
        user_display_name: purchase.user_display_name.clone(),
        payment_type: purchase.payment_type.clone(),
        product_name: purchase.product_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Amount;
    use chrono::{TimeZone, Utc};

    fn row(amount: Amount) -> Purchase {
        Purchase {
            id: "p1".into(),
            purchased_at: Utc.with_ymd_and_hms(2026, 5, 2, 9, 30, 0).unwrap(),
            amount,
            user_display_name: Some("Maja".into()),
            payment_type: None,
            products: None,
            product_name: None,
            quantity: None,
            refunded: false,
            refund_uuid: None,
            refund_timestamp: None,
        }
    }

    #[test]
    fn comma_decimal_separator_is_normalized() {
        let rec = to_sale_record(&row(Amount::Text("123,45".into())));
        assert_eq!(rec.amount, 123.45);
    }

    #[test]
    fn dot_decimal_and_plain_numbers_pass_through() {
        assert_eq!(to_sale_record(&row(Amount::Text("99.5".into()))).amount, 99.5);
        assert_eq!(to_sale_record(&row(Amount::Number(42.0))).amount, 42.0);
    }

    #[test]
    fn non_numeric_amount_coerces_to_zero() {
        assert_eq!(to_sale_record(&row(Amount::Text("n/a".into()))).amount, 0.0);
    }

    #[test]
    fn absent_optionals_stay_none() {
        let rec = to_sale_record(&row(Amount::Number(1.0)));
        assert_eq!(rec.payment_type, None);
        assert_eq!(rec.product_name, None);
    }
}
