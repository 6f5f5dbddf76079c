//! Domain models for the inventory tool.
//!
//! Field names serialize as camelCase and enum values as kebab-case so the
//! JSON blobs written by earlier versions of the tool load unchanged.

pub mod dashboard;
pub mod item;
pub mod movement;
pub mod sale;

pub use dashboard::DashboardStats;
pub use item::{InventoryItem, ItemUpdate, NewItem, StockStatus};
pub use movement::{MovementType, NewMovement, StockMovement};
pub use sale::{NewSale, SalesTransaction};
