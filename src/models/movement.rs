use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Direction of a stock change.
///
/// `Adjustment` sets an absolute level; its `quantity` records the new level
/// rather than a delta.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MovementType {
    StockIn,
    StockOut,
    Adjustment,
}

/// One entry in the append-only stock ledger.
///
/// Movements are never edited; they are removed only when their item is
/// deleted (cascade).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub item_id: Uuid,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a movement. The caller supplies the stock transition;
/// the store records it and writes `new_stock` through to the item.
#[derive(Clone, Debug)]
pub struct NewMovement {
    pub item_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: Option<String>,
    pub reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn movement_type_round_trips_kebab_case() {
        for (ty, text) in [
            (MovementType::StockIn, "stock-in"),
            (MovementType::StockOut, "stock-out"),
            (MovementType::Adjustment, "adjustment"),
        ] {
            assert_eq!(ty.to_string(), text);
            assert_eq!(MovementType::from_str(text).unwrap(), ty);
            assert_eq!(serde_json::to_value(ty).unwrap(), text);
        }
    }

    #[test]
    fn movement_serializes_type_under_legacy_key() {
        let movement = StockMovement {
            id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            movement_type: MovementType::StockIn,
            quantity: 5,
            previous_stock: 0,
            new_stock: 5,
            reason: None,
            reference: Some("PO-001".into()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&movement).unwrap();
        assert_eq!(json["type"], "stock-in");
        assert_eq!(json["previousStock"], 0);
        assert_eq!(json["newStock"], 5);
        // Absent optionals are omitted, matching the legacy blobs.
        assert!(json.get("reason").is_none());
    }
}
