use time::OffsetDateTime;

use crate::host::Vec3;
use crate::identifiers::PlayerId;

/// Stored inventory or ender-chest payload for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadRecord {
    pub owner: PlayerId,
    pub payload: String,
    pub last_updated: OffsetDateTime,
}

pub type InventoryRecord = PayloadRecord;
pub type EnderChestRecord = PayloadRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSnapshot {
    pub dimension: String,
    pub coordinates: Vec3,
}

/// Last known position of a player on this node.
///
/// `last_updated` is `None` when the stored stamp is not RFC 3339, e.g. a row
/// written with SQLite's `CURRENT_TIMESTAMP`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub owner: PlayerId,
    pub dimension: String,
    pub coordinates: Vec3,
    pub last_updated: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadTable {
    Inventory,
    EnderChest,
}

impl PayloadTable {
    pub(crate) fn upsert_sql(self) -> &'static str {
        match self {
            Self::Inventory => {
                "
                INSERT INTO player_inventories (uuid, inventory_data, last_updated)
                VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                ON CONFLICT(uuid) DO UPDATE SET
                    inventory_data = excluded.inventory_data,
                    last_updated = excluded.last_updated
                "
            }
            Self::EnderChest => {
                "
                INSERT INTO player_enderchests (uuid, chest_data, last_updated)
                VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                ON CONFLICT(uuid) DO UPDATE SET
                    chest_data = excluded.chest_data,
                    last_updated = excluded.last_updated
                "
            }
        }
    }

    pub(crate) fn select_payload_sql(self) -> &'static str {
        match self {
            Self::Inventory => "SELECT inventory_data FROM player_inventories WHERE uuid = ?1",
            Self::EnderChest => "SELECT chest_data FROM player_enderchests WHERE uuid = ?1",
        }
    }

    pub(crate) fn select_record_sql(self) -> &'static str {
        match self {
            Self::Inventory => {
                "SELECT inventory_data, last_updated FROM player_inventories WHERE uuid = ?1"
            }
            Self::EnderChest => {
                "SELECT chest_data, last_updated FROM player_enderchests WHERE uuid = ?1"
            }
        }
    }
}
