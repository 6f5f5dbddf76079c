//! The inventory store: in-memory state, derivations, and the two
//! write-through rules (a movement updates its item's stock; a sale emits a
//! stock-out movement).
//!
//! All operations are synchronous and single-user. Collections are loaded
//! once at startup and each mutation rewrites the affected collections
//! through the persistence port. Business rules such as oversell and
//! duplicate SKUs are enforced by the callers, not here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    DashboardStats, InventoryItem, ItemUpdate, MovementType, NewItem, NewMovement, NewSale,
    SalesTransaction, StockMovement, StockStatus,
};
use crate::storage::StateStore;

pub struct InventoryStore<S: StateStore> {
    backend: S,
    items: Vec<InventoryItem>,
    movements: Vec<StockMovement>,
    sales: Vec<SalesTransaction>,
}

impl<S: StateStore> InventoryStore<S> {
    /// Loads all three collections from the backend. Unreadable collections
    /// start empty; see `storage`.
    pub fn open(backend: S) -> Self {
        let items = backend.load_items();
        let movements = backend.load_movements();
        let sales = backend.load_sales();
        Self {
            backend,
            items,
            movements,
            sales,
        }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    pub fn sales(&self) -> &[SalesTransaction] {
        &self.sales
    }

    pub fn item(&self, id: Uuid) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_by_sku(&self, sku: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.sku == sku)
    }

    /// Adds a catalog item. SKU uniqueness is the caller's concern.
    pub fn add_item(&mut self, new: NewItem) -> InventoryItem {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4(),
            sku: new.sku,
            name: new.name,
            unit: new.unit,
            cost_price: new.cost_price,
            selling_price: new.selling_price,
            category: new.category,
            current_stock: new.current_stock,
            min_stock_level: new.min_stock_level,
            created_at: now,
            updated_at: now,
        };
        self.items.push(item.clone());
        self.persist_items();
        info!(item_id = %item.id, sku = %item.sku, "item added");
        item
    }

    /// Applies a partial update and stamps `updated_at`.
    pub fn update_item(&mut self, id: Uuid, update: ItemUpdate) -> Result<InventoryItem, ServiceError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", id)))?;

        if let Some(sku) = update.sku {
            item.sku = sku;
        }
        if let Some(name) = update.name {
            item.name = name;
        }
        if let Some(category) = update.category {
            item.category = category;
        }
        if let Some(unit) = update.unit {
            item.unit = unit;
        }
        if let Some(cost_price) = update.cost_price {
            item.cost_price = cost_price;
        }
        if let Some(selling_price) = update.selling_price {
            item.selling_price = selling_price;
        }
        if let Some(current_stock) = update.current_stock {
            item.current_stock = current_stock;
        }
        if let Some(min_stock_level) = update.min_stock_level {
            item.min_stock_level = min_stock_level;
        }
        item.updated_at = Utc::now();
        let updated = item.clone();

        self.persist_items();
        Ok(updated)
    }

    /// Deletes an item and cascades to its movements and sales.
    pub fn delete_item(&mut self, id: Uuid) -> Result<(), ServiceError> {
        if self.item(id).is_none() {
            return Err(ServiceError::NotFound(format!("item {} not found", id)));
        }
        self.items.retain(|item| item.id != id);
        self.movements.retain(|movement| movement.item_id != id);
        self.sales.retain(|sale| sale.item_id != id);
        self.persist_items();
        self.persist_movements();
        self.persist_sales();
        info!(item_id = %id, "item deleted with cascade");
        Ok(())
    }

    /// Appends a ledger entry and writes `new_stock` through to the item.
    /// The supplied stock transition is recorded as-is; negative outcomes
    /// are prevented at the call sites, not here.
    pub fn add_stock_movement(&mut self, new: NewMovement) -> StockMovement {
        let movement = StockMovement {
            id: Uuid::new_v4(),
            item_id: new.item_id,
            movement_type: new.movement_type,
            quantity: new.quantity,
            previous_stock: new.previous_stock,
            new_stock: new.new_stock,
            reason: new.reason,
            reference: new.reference,
            created_at: Utc::now(),
        };
        self.movements.push(movement.clone());
        self.persist_movements();

        if let Some(item) = self.items.iter_mut().find(|item| item.id == new.item_id) {
            item.current_stock = new.new_stock;
            item.updated_at = Utc::now();
            self.persist_items();
        }

        movement
    }

    /// Records a sale and emits exactly one matching stock-out movement.
    ///
    /// Derives `total_amount = quantity x unit_price` and
    /// `profit = total_amount - quantity x cost_price` from the item's cost
    /// at sale time.
    pub fn add_sale(&mut self, new: NewSale) -> Result<SalesTransaction, ServiceError> {
        let item = self
            .item(new.item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("item {} not found", new.item_id)))?;

        let previous_stock = item.current_stock;
        let cost_price = item.cost_price;
        let total_amount = Decimal::from(new.quantity) * new.unit_price;
        let profit = total_amount - Decimal::from(new.quantity) * cost_price;

        let sale = SalesTransaction {
            id: Uuid::new_v4(),
            item_id: new.item_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
            total_amount,
            cost_price,
            profit,
            customer: new.customer,
            reference: new.reference,
            created_at: Utc::now(),
        };
        self.sales.push(sale.clone());
        self.persist_sales();

        self.add_stock_movement(NewMovement {
            item_id: new.item_id,
            movement_type: MovementType::StockOut,
            quantity: new.quantity,
            previous_stock,
            new_stock: previous_stock - new.quantity,
            reason: Some("Sale".to_string()),
            reference: Some(sale.id.to_string()),
        });

        info!(sale_id = %sale.id, item_id = %sale.item_id, quantity = sale.quantity, "sale recorded");
        Ok(sale)
    }

    /// Aggregates over the current collections; nothing is cached.
    pub fn dashboard_stats(&self) -> DashboardStats {
        self.dashboard_stats_at(Utc::now())
    }

    /// "Today" is the calendar date of `now` in UTC.
    pub fn dashboard_stats_at(&self, now: DateTime<Utc>) -> DashboardStats {
        let today = now.date_naive();
        let total_value = self
            .items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum + item.inventory_value());
        let low_stock_items = self
            .items
            .iter()
            .filter(|item| item.stock_status() == StockStatus::LowStock)
            .count();
        let out_of_stock_items = self
            .items
            .iter()
            .filter(|item| item.stock_status() == StockStatus::OutOfStock)
            .count();

        let todays_sales = self
            .sales
            .iter()
            .filter(|sale| sale.created_at.date_naive() == today);
        let (today_sales, today_profit) = todays_sales.fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(revenue, profit), sale| (revenue + sale.total_amount, profit + sale.profit),
        );

        DashboardStats {
            total_items: self.items.len(),
            total_value,
            low_stock_items,
            out_of_stock_items,
            today_sales,
            today_profit,
        }
    }

    /// Items above zero but at or below their minimum level.
    pub fn low_stock_items(&self) -> Vec<&InventoryItem> {
        self.items
            .iter()
            .filter(|item| item.stock_status() == StockStatus::LowStock)
            .collect()
    }

    /// Ledger entries for one item, newest first.
    pub fn item_movements(&self, item_id: Uuid) -> Vec<&StockMovement> {
        let mut movements: Vec<&StockMovement> = self
            .movements
            .iter()
            .filter(|movement| movement.item_id == item_id)
            .collect();
        movements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        movements
    }

    // Write failures are logged and otherwise ignored; the in-memory state
    // stays authoritative for the rest of the session.
    fn persist_items(&self) {
        if let Err(err) = self.backend.save_items(&self.items) {
            error!(%err, "failed to persist items");
        }
    }

    fn persist_movements(&self) {
        if let Err(err) = self.backend.save_movements(&self.movements) {
            error!(%err, "failed to persist movements");
        }
    }

    fn persist_sales(&self) {
        if let Err(err) = self.backend.save_sales(&self.sales) {
            error!(%err, "failed to persist sales");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn new_item(sku: &str, stock: i64, min: i64) -> NewItem {
        NewItem {
            sku: sku.into(),
            name: format!("Item {}", sku),
            category: "General".into(),
            unit: "pcs".into(),
            cost_price: dec!(2.50),
            selling_price: dec!(4.00),
            current_stock: stock,
            min_stock_level: min,
        }
    }

    fn open_store() -> (InventoryStore<MemoryStore>, MemoryStore) {
        let backend = MemoryStore::new();
        (InventoryStore::open(backend.clone()), backend)
    }

    #[test]
    fn add_item_persists_and_stamps_timestamps() {
        let (mut store, backend) = open_store();
        let item = store.add_item(new_item("WID-1", 10, 2));
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(backend.load_items(), store.items());
    }

    #[test]
    fn update_item_applies_partial_changes() {
        let (mut store, _) = open_store();
        let item = store.add_item(new_item("WID-1", 10, 2));
        let updated = store
            .update_item(
                item.id,
                ItemUpdate {
                    name: Some("Renamed".into()),
                    selling_price: Some(dec!(5.00)),
                    ..ItemUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.selling_price, dec!(5.00));
        assert_eq!(updated.sku, "WID-1");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[test]
    fn update_unknown_item_is_not_found() {
        let (mut store, _) = open_store();
        let err = store
            .update_item(Uuid::new_v4(), ItemUpdate::default())
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(_));
    }

    #[test]
    fn movement_writes_stock_through_to_item() {
        let (mut store, _) = open_store();
        let item = store.add_item(new_item("WID-1", 10, 2));
        let movement = store.add_stock_movement(NewMovement {
            item_id: item.id,
            movement_type: MovementType::StockIn,
            quantity: 5,
            previous_stock: 10,
            new_stock: 15,
            reason: None,
            reference: Some("PO-001".into()),
        });
        assert_eq!(movement.new_stock, 15);
        assert_eq!(store.item(item.id).unwrap().current_stock, 15);
    }

    #[test]
    fn sale_emits_exactly_one_matching_stock_out() {
        let (mut store, _) = open_store();
        let item = store.add_item(new_item("WID-1", 10, 2));
        let sale = store
            .add_sale(NewSale {
                item_id: item.id,
                quantity: 3,
                unit_price: dec!(4.00),
                customer: Some("Ada".into()),
                reference: None,
            })
            .unwrap();

        assert_eq!(sale.total_amount, dec!(12.00));
        // profit = 12.00 - 3 * 2.50
        assert_eq!(sale.profit, dec!(4.50));
        assert_eq!(sale.cost_price, dec!(2.50));

        let movements = store.item_movements(item.id);
        assert_eq!(movements.len(), 1);
        let movement = movements[0];
        assert_eq!(movement.movement_type, MovementType::StockOut);
        assert_eq!(movement.quantity, 3);
        assert_eq!(movement.previous_stock, 10);
        assert_eq!(movement.new_stock, 7);
        assert_eq!(movement.reason.as_deref(), Some("Sale"));
        assert_eq!(movement.reference.as_deref(), Some(sale.id.to_string().as_str()));
        assert_eq!(store.item(item.id).unwrap().current_stock, 7);
    }

    #[test]
    fn sale_for_unknown_item_is_not_found() {
        let (mut store, _) = open_store();
        let err = store
            .add_sale(NewSale {
                item_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: dec!(1.00),
                customer: None,
                reference: None,
            })
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(_));
        assert!(store.sales().is_empty());
    }

    #[test]
    fn delete_item_cascades_and_spares_others() {
        let (mut store, backend) = open_store();
        let doomed = store.add_item(new_item("WID-1", 10, 2));
        let kept = store.add_item(new_item("WID-2", 8, 2));
        store
            .add_sale(NewSale {
                item_id: doomed.id,
                quantity: 1,
                unit_price: dec!(4.00),
                customer: None,
                reference: None,
            })
            .unwrap();
        store
            .add_sale(NewSale {
                item_id: kept.id,
                quantity: 2,
                unit_price: dec!(4.00),
                customer: None,
                reference: None,
            })
            .unwrap();

        store.delete_item(doomed.id).unwrap();

        assert!(store.item(doomed.id).is_none());
        assert!(store.movements().iter().all(|m| m.item_id == kept.id));
        assert!(store.sales().iter().all(|s| s.item_id == kept.id));
        // The cascade reaches the persisted blobs too.
        assert_eq!(backend.load_movements().len(), 1);
        assert_eq!(backend.load_sales().len(), 1);
    }

    #[test]
    fn delete_unknown_item_is_not_found() {
        let (mut store, _) = open_store();
        assert_matches!(
            store.delete_item(Uuid::new_v4()).unwrap_err(),
            ServiceError::NotFound(_)
        );
    }

    #[test]
    fn dashboard_stats_sum_current_collections() {
        let (mut store, _) = open_store();
        store.add_item(new_item("A", 4, 2)); // in stock, value 10.00
        store.add_item(new_item("B", 2, 5)); // low stock, value 5.00
        store.add_item(new_item("C", 0, 1)); // out of stock
        let seller = store.add_item(new_item("D", 10, 1)); // value 25.00 -> 17.50 after sale
        store
            .add_sale(NewSale {
                item_id: seller.id,
                quantity: 3,
                unit_price: dec!(4.00),
                customer: None,
                reference: None,
            })
            .unwrap();

        let stats = store.dashboard_stats();
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.low_stock_items, 1);
        assert_eq!(stats.out_of_stock_items, 1);
        // 10.00 + 5.00 + 0 + 7 * 2.50
        assert_eq!(stats.total_value, dec!(32.50));
        assert_eq!(stats.today_sales, dec!(12.00));
        assert_eq!(stats.today_profit, dec!(4.50));
    }

    #[test]
    fn dashboard_excludes_sales_from_other_days() {
        let backend = MemoryStore::new();
        let mut store = InventoryStore::open(backend.clone());
        let item = store.add_item(new_item("A", 10, 1));
        let mut sale = store
            .add_sale(NewSale {
                item_id: item.id,
                quantity: 1,
                unit_price: dec!(4.00),
                customer: None,
                reference: None,
            })
            .unwrap();

        // Age the persisted sale by two days and reload.
        sale.created_at = sale.created_at - Duration::days(2);
        backend.save_sales(&[sale]).unwrap();
        let store = InventoryStore::open(backend);

        let stats = store.dashboard_stats();
        assert_eq!(stats.today_sales, Decimal::ZERO);
        assert_eq!(stats.today_profit, Decimal::ZERO);
    }

    #[test]
    fn low_stock_excludes_out_of_stock() {
        let (mut store, _) = open_store();
        store.add_item(new_item("A", 2, 5));
        store.add_item(new_item("B", 0, 5));
        store.add_item(new_item("C", 9, 5));
        let low: Vec<&str> = store
            .low_stock_items()
            .iter()
            .map(|item| item.sku.as_str())
            .collect();
        assert_eq!(low, vec!["A"]);
    }

    #[test]
    fn item_movements_sorted_newest_first() {
        let backend = MemoryStore::new();
        let mut store = InventoryStore::open(backend.clone());
        let item = store.add_item(new_item("A", 0, 1));
        for (i, qty) in [5i64, 3, 7].iter().enumerate() {
            let previous = store.item(item.id).unwrap().current_stock;
            store.add_stock_movement(NewMovement {
                item_id: item.id,
                movement_type: MovementType::StockIn,
                quantity: *qty,
                previous_stock: previous,
                new_stock: previous + qty,
                reason: Some(format!("batch {}", i)),
                reference: None,
            });
        }

        // Spread the timestamps out, then reload and check ordering.
        let mut movements = backend.load_movements();
        for (i, movement) in movements.iter_mut().enumerate() {
            movement.created_at = movement.created_at - Duration::hours((3 - i) as i64);
        }
        backend.save_movements(&movements).unwrap();
        let store = InventoryStore::open(backend);

        let history = store.item_movements(item.id);
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(history[0].reason.as_deref(), Some("batch 2"));
    }

    #[test]
    fn reopening_reproduces_state() {
        let backend = MemoryStore::new();
        let mut store = InventoryStore::open(backend.clone());
        let item = store.add_item(new_item("A", 10, 1));
        store
            .add_sale(NewSale {
                item_id: item.id,
                quantity: 2,
                unit_price: dec!(4.00),
                customer: Some("Ada".into()),
                reference: Some("INV-1".into()),
            })
            .unwrap();

        let reopened = InventoryStore::open(backend);
        assert_eq!(reopened.items(), store.items());
        assert_eq!(reopened.movements(), store.movements());
        assert_eq!(reopened.sales(), store.sales());
    }
}
