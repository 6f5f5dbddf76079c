use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded sale for one item.
///
/// `cost_price` is a snapshot of the item's cost at sale time so later price
/// edits do not rewrite historical profit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTransaction {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub cost_price: Decimal,
    pub profit: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a sale. Totals and profit are derived by the store.
#[derive(Clone, Debug)]
pub struct NewSale {
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub customer: Option<String>,
    pub reference: Option<String>,
}
