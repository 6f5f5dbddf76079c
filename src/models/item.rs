use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// A catalog entry with its current on-hand quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub category: String,
    pub current_stock: i64,
    pub min_stock_level: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Three-way threshold over current stock and the minimum level.
    /// Zero stock is out-of-stock regardless of the minimum level.
    pub fn stock_status(&self) -> StockStatus {
        if self.current_stock == 0 {
            StockStatus::OutOfStock
        } else if self.current_stock <= self.min_stock_level {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    /// On-hand value at cost.
    pub fn inventory_value(&self) -> Decimal {
        Decimal::from(self.current_stock) * self.cost_price
    }
}

/// Stock classification derived from an item; never stored.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

/// Input for creating a catalog item.
#[derive(Clone, Debug, Validate)]
pub struct NewItem {
    #[validate(length(min = 1, message = "SKU is required"))]
    pub sku: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub category: String,
    pub unit: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub current_stock: i64,
    #[validate(range(min = 0, message = "minimum level cannot be negative"))]
    pub min_stock_level: i64,
}

/// Partial update for an existing item; `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct ItemUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub current_stock: Option<i64>,
    pub min_stock_level: Option<i64>,
}
