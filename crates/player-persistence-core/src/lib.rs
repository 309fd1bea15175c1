//! Per-player inventory, ender chest and location persistence for game
//! servers that share one SQLite database across several nodes.
//!
//! Inventories and ender chests are shared by every node. Locations live in a
//! table per node, so a player keeps a separate position on each server.

pub mod connection;
pub mod error;
pub mod host;
pub mod identifiers;
pub mod inventory;
pub mod item;
pub mod location;
pub mod schema;
pub mod serializer;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use connection::{ConnectionProvider, DatabaseLocation, DatabaseSettings};
pub use error::CoreError;
pub use host::{PlayerEntity, TeleportTarget, Vec3, WorldRegistry};
pub use identifiers::{NodeId, PlayerId};
pub use inventory::{EnderChest, InventoryRegion, PlayerInventory, SlotAddress};
pub use item::{
    BasicItemCodec, BasicItemStack, DecodedItem, ItemCodec, ItemCodecAdapter, ItemCodecError,
    ItemDocument, ItemStack,
};
pub use location::{restore_location, save_location, LocationRestore};
pub use schema::ensure_schema;
pub use serializer::{
    deserialize_ender_chest, deserialize_inventory, serialize_ender_chest, serialize_inventory,
    RestoreReport, SlotEntry,
};
pub use store::{
    EnderChestRecord, InventoryRecord, LocationRecord, LocationSnapshot, PayloadRecord,
    PersistenceGateway, PlayerStore,
};
pub use sync::{JoinReport, PlayerPersistence, SyncOutcome};
