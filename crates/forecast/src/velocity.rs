//! Sales velocity: units sold per (product, warehouse) over the lookback window.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use stockwatch_core::{ProductId, WarehouseId};
use stockwatch_inventory::Sale;

use crate::window::WindowDays;

/// Totals of recent sales keyed by (product, warehouse).
///
/// Absent keys mean zero units sold, never "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesVelocity {
    window: WindowDays,
    totals: HashMap<(ProductId, WarehouseId), i64>,
}

impl SalesVelocity {
    /// Sum sales dated within `[now - window, now]` (both bounds inclusive).
    pub fn aggregate<'a, I>(sales: I, window: WindowDays, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Sale>,
    {
        let start = window.start(now);
        let mut totals: HashMap<(ProductId, WarehouseId), i64> = HashMap::new();

        for sale in sales {
            if sale.sale_date < start || sale.sale_date > now {
                continue;
            }
            let total = totals.entry((sale.product_id, sale.warehouse_id)).or_insert(0);
            *total = total.saturating_add(sale.quantity_sold);
        }

        Self { window, totals }
    }

    pub fn window(&self) -> WindowDays {
        self.window
    }

    pub fn total_sold(&self, product_id: ProductId, warehouse_id: WarehouseId) -> i64 {
        self.totals
            .get(&(product_id, warehouse_id))
            .copied()
            .unwrap_or(0)
    }

    /// Average units sold per day for the key.
    pub fn avg_daily(&self, product_id: ProductId, warehouse_id: WarehouseId) -> Decimal {
        average_daily(self.total_sold(product_id, warehouse_id), self.window)
    }

    /// Number of keys with recorded sales.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// `total_sold / window_days` in fixed-point.
///
/// Quotients below the decimal's resolution become zero.
pub fn average_daily(total_sold: i64, window: WindowDays) -> Decimal {
    Decimal::from(total_sold)
        .checked_div(Decimal::from(window.get()))
        .unwrap_or(Decimal::ZERO)
}

/// Whole days of cover left: `floor(current_stock / avg_daily)`.
///
/// `None` when there is no positive velocity, or when the horizon does not fit
/// an `i64`. Negative stock counts as zero, so a present horizon is never negative.
pub fn days_until_stockout(current_stock: i64, avg_daily: Decimal) -> Option<i64> {
    if avg_daily <= Decimal::ZERO {
        return None;
    }
    Decimal::from(current_stock.max(0))
        .checked_div(avg_daily)?
        .floor()
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use stockwatch_core::CompanyId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn sale(product: i64, warehouse: i64, qty: i64, at: DateTime<Utc>) -> Sale {
        Sale::new(
            CompanyId::new(1),
            WarehouseId::new(warehouse),
            ProductId::new(product),
            qty,
            at,
        )
    }

    #[test]
    fn sums_per_product_and_warehouse() {
        let sales = vec![
            sale(1, 1, 2, now() - Duration::days(1)),
            sale(1, 1, 3, now() - Duration::days(2)),
            sale(1, 2, 7, now() - Duration::days(2)),
            sale(2, 1, 1, now() - Duration::days(3)),
        ];
        let v = SalesVelocity::aggregate(&sales, WindowDays::default(), now());

        assert_eq!(v.total_sold(ProductId::new(1), WarehouseId::new(1)), 5);
        assert_eq!(v.total_sold(ProductId::new(1), WarehouseId::new(2)), 7);
        assert_eq!(v.total_sold(ProductId::new(2), WarehouseId::new(1)), 1);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn missing_key_is_zero() {
        let sales: Vec<Sale> = Vec::new();
        let v = SalesVelocity::aggregate(&sales, WindowDays::default(), now());
        assert!(v.is_empty());
        assert_eq!(v.total_sold(ProductId::new(9), WarehouseId::new(9)), 0);
        assert_eq!(v.avg_daily(ProductId::new(9), WarehouseId::new(9)), Decimal::ZERO);
    }

    #[test]
    fn window_lower_bound_is_inclusive() {
        let window = WindowDays::new(30).unwrap();
        let sales = vec![
            sale(1, 1, 4, window.start(now())),
            sale(1, 1, 100, window.start(now()) - Duration::seconds(1)),
        ];
        let v = SalesVelocity::aggregate(&sales, window, now());
        assert_eq!(v.total_sold(ProductId::new(1), WarehouseId::new(1)), 4);
    }

    #[test]
    fn future_sales_are_excluded() {
        let sales = vec![
            sale(1, 1, 2, now()),
            sale(1, 1, 50, now() + Duration::minutes(5)),
        ];
        let v = SalesVelocity::aggregate(&sales, WindowDays::default(), now());
        assert_eq!(v.total_sold(ProductId::new(1), WarehouseId::new(1)), 2);
    }

    #[test]
    fn thirty_day_average_and_horizon() {
        let avg = average_daily(10, WindowDays::new(30).unwrap());
        assert!(avg > dec!(0.333) && avg < dec!(0.334));
        assert_eq!(days_until_stockout(5, avg), Some(15));
    }

    #[test]
    fn horizon_truncates_after_division() {
        let avg = average_daily(45, WindowDays::new(30).unwrap());
        assert_eq!(avg, dec!(1.5));
        assert_eq!(days_until_stockout(10, avg), Some(6));

        assert_eq!(days_until_stockout(7, dec!(2)), Some(3));
        assert_eq!(days_until_stockout(0, dec!(2)), Some(0));
    }

    #[test]
    fn horizon_is_none_without_velocity() {
        assert_eq!(days_until_stockout(5, Decimal::ZERO), None);
        assert_eq!(days_until_stockout(5, dec!(-1)), None);
    }

    #[test]
    fn negative_stock_has_zero_days_left() {
        assert_eq!(days_until_stockout(-3, dec!(1)), Some(0));
    }
}
