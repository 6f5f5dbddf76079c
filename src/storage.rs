//! Persistence port for the three record collections.
//!
//! Each collection is an independently keyed JSON blob, loaded once at
//! startup and rewritten wholesale on every mutation. Read failures fall
//! back silently to empty collections so a missing or corrupt file never
//! blocks startup; write failures are reported to the caller, who logs and
//! continues.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::ServiceError;
use crate::models::{InventoryItem, SalesTransaction, StockMovement};

const ITEMS_FILE: &str = "inventory_items.json";
const MOVEMENTS_FILE: &str = "stock_movements.json";
const SALES_FILE: &str = "sales_transactions.json";

/// Storage backend for the three collections.
pub trait StateStore {
    fn load_items(&self) -> Vec<InventoryItem>;
    fn load_movements(&self) -> Vec<StockMovement>;
    fn load_sales(&self) -> Vec<SalesTransaction>;

    fn save_items(&self, items: &[InventoryItem]) -> Result<(), ServiceError>;
    fn save_movements(&self, movements: &[StockMovement]) -> Result<(), ServiceError>;
    fn save_sales(&self, sales: &[SalesTransaction]) -> Result<(), ServiceError>;
}

/// JSON-file backend writing pretty-printed blobs under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let path = self.dir.join(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %path.display(), %err, "collection not readable, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                debug!(path = %path.display(), %err, "collection not parseable, starting empty");
                Vec::new()
            }
        }
    }

    fn save<T: Serialize>(&self, file: &str, records: &[T]) -> Result<(), ServiceError> {
        fs::create_dir_all(&self.dir)?;
        let payload = serde_json::to_vec_pretty(records)?;
        fs::write(self.dir.join(file), payload)?;
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn load_items(&self) -> Vec<InventoryItem> {
        self.load(ITEMS_FILE)
    }

    fn load_movements(&self) -> Vec<StockMovement> {
        self.load(MOVEMENTS_FILE)
    }

    fn load_sales(&self) -> Vec<SalesTransaction> {
        self.load(SALES_FILE)
    }

    fn save_items(&self, items: &[InventoryItem]) -> Result<(), ServiceError> {
        self.save(ITEMS_FILE, items)
    }

    fn save_movements(&self, movements: &[StockMovement]) -> Result<(), ServiceError> {
        self.save(MOVEMENTS_FILE, movements)
    }

    fn save_sales(&self, sales: &[SalesTransaction]) -> Result<(), ServiceError> {
        self.save(SALES_FILE, sales)
    }
}

#[derive(Default)]
struct MemoryState {
    items: Vec<InventoryItem>,
    movements: Vec<StockMovement>,
    sales: Vec<SalesTransaction>,
}

/// In-memory backend for tests. Clones share the same state, so a test can
/// keep a handle and inspect what the store persisted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load_items(&self) -> Vec<InventoryItem> {
        self.state.borrow().items.clone()
    }

    fn load_movements(&self) -> Vec<StockMovement> {
        self.state.borrow().movements.clone()
    }

    fn load_sales(&self) -> Vec<SalesTransaction> {
        self.state.borrow().sales.clone()
    }

    fn save_items(&self, items: &[InventoryItem]) -> Result<(), ServiceError> {
        self.state.borrow_mut().items = items.to_vec();
        Ok(())
    }

    fn save_movements(&self, movements: &[StockMovement]) -> Result<(), ServiceError> {
        self.state.borrow_mut().movements = movements.to_vec();
        Ok(())
    }

    fn save_sales(&self, sales: &[SalesTransaction]) -> Result<(), ServiceError> {
        self.state.borrow_mut().sales = sales.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_load_as_empty_collections() {
        let store = JsonFileStore::new("/nonexistent/stockroom-test");
        assert!(store.load_items().is_empty());
        assert!(store.load_movements().is_empty());
        assert!(store.load_sales().is_empty());
    }

    #[test]
    fn corrupt_blob_loads_as_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ITEMS_FILE), "{not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_items().is_empty());
    }

    #[test]
    fn save_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("data");
        let store = JsonFileStore::new(&nested);
        store.save_items(&[]).unwrap();
        assert!(nested.join(ITEMS_FILE).exists());
    }
}
