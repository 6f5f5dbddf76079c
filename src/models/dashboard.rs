use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate figures for the dashboard, derived from the in-memory
/// collections at call time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: usize,
    /// On-hand inventory value at cost.
    pub total_value: Decimal,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    /// Revenue from sales recorded today.
    pub today_sales: Decimal,
    pub today_profit: Decimal,
}
