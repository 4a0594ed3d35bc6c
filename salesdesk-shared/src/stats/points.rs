use crate::domain::{ProductLine, Purchase};

/// Product name that earns the elevated rate.
pub const EXPLORE_PRODUCT: &str = "Utforska";
/// Points per unit sold of the explore product.
pub const EXPLORE_RATE: f64 = 40.0;
/// Points per unit sold of every other product.
pub const STANDARD_RATE: f64 = 15.0;

/// Points for a single line item. A missing quantity counts as 0.
pub fn product_points(item: &ProductLine) -> f64 {
    let quantity = item.quantity.unwrap_or(0.0);
    if item.name == EXPLORE_PRODUCT {
        quantity * EXPLORE_RATE
    } else {
        quantity * STANDARD_RATE
    }
}

/// Points for a legacy-shape purchase that has no line-item list: the
/// standard rate applies to the top-level quantity, absent quantity is 0.
pub fn quantity_points(quantity: Option<f64>) -> f64 {
    quantity.unwrap_or(0.0) * STANDARD_RATE
}

/// Total reward points over a purchase collection. Refunded purchases never
/// count. Purchases carrying a line-item list (even an empty one) are
/// scored per item; all others fall back to the legacy quantity. The sum is
/// returned unrounded.
pub fn total_points(purchases: &[Purchase]) -> f64 {
    purchases
        .iter()
        .filter(|p| !p.refunded)
        .map(|p| match &p.products {
            Some(items) => items.iter().map(product_points).sum(),
            None => quantity_points(p.quantity),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Amount;
    use chrono::Utc;

    fn purchase(products: Option<Vec<ProductLine>>, quantity: Option<f64>) -> Purchase {
        Purchase {
            id: "p1".into(),
            purchased_at: Utc::now(),
            amount: Amount::Number(100.0),
            user_display_name: Some("Maja".into()),
            payment_type: None,
            products,
            product_name: None,
            quantity,
            refunded: false,
            refund_uuid: None,
            refund_timestamp: None,
        }
    }

    fn line(name: &str, quantity: Option<f64>) -> ProductLine {
        ProductLine {
            name: name.into(),
            quantity,
        }
    }

    #[test]
    fn explore_product_earns_elevated_rate() {
        assert_eq!(product_points(&line(EXPLORE_PRODUCT, Some(3.0))), 120.0);
        assert_eq!(product_points(&line("Kaffe", Some(3.0))), 45.0);
    }

    #[test]
    fn missing_quantity_counts_as_zero() {
        assert_eq!(product_points(&line(EXPLORE_PRODUCT, None)), 0.0);
        assert_eq!(quantity_points(None), 0.0);
    }

    #[test]
    fn refunded_purchases_are_excluded() {
        let mut refunded = purchase(Some(vec![line(EXPLORE_PRODUCT, Some(2.0))]), None);
        refunded.refunded = true;
        let kept = purchase(Some(vec![line("Kaffe", Some(1.0))]), None);
        assert_eq!(total_points(&[refunded, kept]), 15.0);
    }

    #[test]
    fn legacy_quantity_fallback_uses_standard_rate() {
        let legacy = purchase(None, Some(4.0));
        assert_eq!(total_points(&[legacy]), 60.0);
    }

    #[test]
    fn empty_product_list_scores_zero_without_fallback() {
        let p = purchase(Some(vec![]), Some(4.0));
        assert_eq!(total_points(&[p]), 0.0);
    }

    #[test]
    fn fractional_quantities_are_not_rounded() {
        let p = purchase(Some(vec![line("Kaffe", Some(1.5))]), None);
        assert_eq!(total_points(&[p]), 22.5);
    }

    #[test]
    fn empty_collection_sums_to_zero() {
        assert_eq!(total_points(&[]), 0.0);
    }
}
