//! CSV export of the item snapshot.

use crate::models::InventoryItem;

const CSV_HEADERS: [&str; 8] = [
    "SKU",
    "Name",
    "Category",
    "Current Stock",
    "Min Stock",
    "Cost Price",
    "Selling Price",
    "Status",
];

/// Renders the fixed 8-column item snapshot.
///
/// Values are comma-joined as-is, with no quoting or escaping of embedded
/// commas, matching what earlier versions of the tool exported.
pub fn items_csv(items: &[InventoryItem]) -> String {
    let mut rows = Vec::with_capacity(items.len() + 1);
    rows.push(CSV_HEADERS.join(","));
    for item in items {
        rows.push(
            [
                item.sku.clone(),
                item.name.clone(),
                item.category.clone(),
                item.current_stock.to_string(),
                item.min_stock_level.to_string(),
                item.cost_price.to_string(),
                item.selling_price.to_string(),
                item.stock_status().to_string(),
            ]
            .join(","),
        );
    }
    rows.join("\n")
}

/// Default export file name, stamped with the current date.
pub fn default_export_filename(date: chrono::NaiveDate) -> String {
    format!("inventory-report-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(sku: &str, name: &str, stock: i64) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            sku: sku.into(),
            name: name.into(),
            unit: "pcs".into(),
            cost_price: dec!(2.50),
            selling_price: dec!(4.00),
            category: "Tools".into(),
            current_stock: stock,
            min_stock_level: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn csv_has_header_plus_one_row_per_item() {
        let csv = items_csv(&[item("A-1", "Hammer", 9), item("A-2", "Chisel", 0)]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "SKU,Name,Category,Current Stock,Min Stock,Cost Price,Selling Price,Status"
        );
        assert_eq!(lines[1], "A-1,Hammer,Tools,9,5,2.50,4.00,in-stock");
        assert_eq!(lines[2], "A-2,Chisel,Tools,0,5,2.50,4.00,out-of-stock");
    }

    #[test]
    fn csv_of_no_items_is_just_the_header() {
        let csv = items_csv(&[]);
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn embedded_commas_are_not_escaped() {
        // Known limitation carried over from the original export.
        let csv = items_csv(&[item("A-1", "Bolt, hex", 9)]);
        assert_eq!(csv.lines().nth(1).unwrap().split(',').count(), 9);
    }

    #[test]
    fn default_filename_is_date_stamped() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        assert_eq!(default_export_filename(date), "inventory-report-2026-08-26.csv");
    }
}
