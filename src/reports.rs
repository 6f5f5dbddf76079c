//! Report derivations: pure functions over the record collections, used by
//! the `report` CLI commands and mirrored by the dashboard totals.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{InventoryItem, SalesTransaction, StockStatus};

const UNCATEGORIZED: &str = "Uncategorized";

/// Headline figures for the printable report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_items: usize,
    pub inventory_value: Decimal,
    pub total_sales: Decimal,
    pub total_profit: Decimal,
}

/// One row of the inventory-by-category report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub items: usize,
    pub quantity: i64,
    pub value: Decimal,
}

/// Sales aggregated per item, for the top-performers report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSalesSummary {
    pub item_id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub transactions: usize,
}

/// Item counts per stock status.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

pub fn summary(items: &[InventoryItem], sales: &[SalesTransaction]) -> ReportSummary {
    let inventory_value = items
        .iter()
        .fold(Decimal::ZERO, |sum, item| sum + item.inventory_value());
    let (total_sales, total_profit) = sales.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(revenue, profit), sale| (revenue + sale.total_amount, profit + sale.profit),
    );
    ReportSummary {
        total_items: items.len(),
        inventory_value,
        total_sales,
        total_profit,
    }
}

/// Groups inventory by category, sorted by category name. Items without a
/// category land under "Uncategorized".
pub fn inventory_by_category(items: &[InventoryItem]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<String, CategorySummary> = BTreeMap::new();
    for item in items {
        let category = if item.category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            item.category.clone()
        };
        let entry = groups
            .entry(category.clone())
            .or_insert_with(|| CategorySummary {
                category,
                items: 0,
                quantity: 0,
                value: Decimal::ZERO,
            });
        entry.items += 1;
        entry.quantity += item.current_stock;
        entry.value += item.inventory_value();
    }
    groups.into_values().collect()
}

/// Per-item sales totals, highest revenue first, truncated to `limit`.
/// Sales whose item no longer exists are skipped.
pub fn top_items(
    items: &[InventoryItem],
    sales: &[SalesTransaction],
    limit: usize,
) -> Vec<ItemSalesSummary> {
    let mut by_item: HashMap<Uuid, ItemSalesSummary> = HashMap::new();
    for sale in sales {
        let Some(item) = items.iter().find(|item| item.id == sale.item_id) else {
            continue;
        };
        let entry = by_item
            .entry(sale.item_id)
            .or_insert_with(|| ItemSalesSummary {
                item_id: item.id,
                name: item.name.clone(),
                unit: item.unit.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
                profit: Decimal::ZERO,
                transactions: 0,
            });
        entry.quantity += sale.quantity;
        entry.revenue += sale.total_amount;
        entry.profit += sale.profit;
        entry.transactions += 1;
    }

    let mut ranked: Vec<ItemSalesSummary> = by_item.into_values().collect();
    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ranked.truncate(limit);
    ranked
}

pub fn stock_status_summary(items: &[InventoryItem]) -> StatusSummary {
    let mut counts = StatusSummary::default();
    for item in items {
        match item.stock_status() {
            StockStatus::InStock => counts.in_stock += 1,
            StockStatus::LowStock => counts.low_stock += 1,
            StockStatus::OutOfStock => counts.out_of_stock += 1,
        }
    }
    counts
}

/// Average margin over all sales: profit over cost, as a percentage.
/// Returns zero when nothing has been sold at cost.
pub fn average_margin(sales: &[SalesTransaction]) -> Decimal {
    let (revenue, profit) = sales.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(revenue, profit), sale| (revenue + sale.total_amount, profit + sale.profit),
    );
    let cost = revenue - profit;
    if cost.is_zero() {
        Decimal::ZERO
    } else {
        profit / cost * Decimal::from(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn item(sku: &str, category: &str, stock: i64, cost: Decimal) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            sku: sku.into(),
            name: format!("Item {}", sku),
            unit: "pcs".into(),
            cost_price: cost,
            selling_price: cost * dec!(2),
            category: category.into(),
            current_stock: stock,
            min_stock_level: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sale(item: &InventoryItem, quantity: i64, unit_price: Decimal) -> SalesTransaction {
        let total_amount = Decimal::from(quantity) * unit_price;
        SalesTransaction {
            id: Uuid::new_v4(),
            item_id: item.id,
            quantity,
            unit_price,
            total_amount,
            cost_price: item.cost_price,
            profit: total_amount - Decimal::from(quantity) * item.cost_price,
            customer: None,
            reference: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_totals_match_collections() {
        let items = vec![item("A", "Tools", 4, dec!(2.50)), item("B", "Tools", 0, dec!(9))];
        let sales = vec![sale(&items[0], 2, dec!(5.00))];
        let report = summary(&items, &sales);
        assert_eq!(report.total_items, 2);
        assert_eq!(report.inventory_value, dec!(10.00));
        assert_eq!(report.total_sales, dec!(10.00));
        assert_eq!(report.total_profit, dec!(5.00));
    }

    #[test]
    fn categories_group_and_default_to_uncategorized() {
        let items = vec![
            item("A", "Tools", 4, dec!(2.50)),
            item("B", "Tools", 1, dec!(1.00)),
            item("C", "", 2, dec!(3.00)),
        ];
        let groups = inventory_by_category(&items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Tools");
        assert_eq!(groups[0].items, 2);
        assert_eq!(groups[0].quantity, 5);
        assert_eq!(groups[0].value, dec!(11.00));
        assert_eq!(groups[1].category, "Uncategorized");
        assert_eq!(groups[1].value, dec!(6.00));
    }

    #[test]
    fn top_items_ranked_by_revenue_and_truncated() {
        let items = vec![
            item("A", "Tools", 10, dec!(1.00)),
            item("B", "Tools", 10, dec!(1.00)),
            item("C", "Tools", 10, dec!(1.00)),
        ];
        let sales = vec![
            sale(&items[0], 1, dec!(2.00)),
            sale(&items[1], 5, dec!(2.00)),
            sale(&items[1], 1, dec!(2.00)),
            sale(&items[2], 2, dec!(2.00)),
        ];
        let ranked = top_items(&items, &sales, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item_id, items[1].id);
        assert_eq!(ranked[0].revenue, dec!(12.00));
        assert_eq!(ranked[0].transactions, 2);
        assert_eq!(ranked[1].item_id, items[2].id);
    }

    #[test]
    fn top_items_skip_orphaned_sales() {
        let items = vec![item("A", "Tools", 10, dec!(1.00))];
        let orphan = item("GONE", "Tools", 0, dec!(1.00));
        let sales = vec![sale(&orphan, 3, dec!(2.00)), sale(&items[0], 1, dec!(2.00))];
        let ranked = top_items(&items, &sales, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].item_id, items[0].id);
    }

    #[test]
    fn status_summary_counts_every_item_once() {
        let items = vec![
            item("A", "Tools", 9, dec!(1.00)),
            item("B", "Tools", 1, dec!(1.00)),
            item("C", "Tools", 0, dec!(1.00)),
        ];
        let counts = stock_status_summary(&items);
        assert_eq!(counts.in_stock, 1);
        assert_eq!(counts.low_stock, 1);
        assert_eq!(counts.out_of_stock, 1);
        assert_eq!(counts.in_stock + counts.low_stock + counts.out_of_stock, items.len());
    }

    #[test]
    fn average_margin_is_profit_over_cost() {
        let source = item("A", "Tools", 10, dec!(2.00));
        // revenue 12, cost 6, profit 6 -> 100%
        let sales = vec![sale(&source, 3, dec!(4.00))];
        assert_eq!(average_margin(&sales), dec!(100));
        assert_eq!(average_margin(&[]), Decimal::ZERO);
    }
}
