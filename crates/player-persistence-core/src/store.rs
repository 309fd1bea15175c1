use player_persistence_config::{load_from_env, PersistenceConfig};
use rusqlite::{params, OptionalExtension};

use crate::connection::{ConnectionProvider, DatabaseSettings};
use crate::error::CoreError;
use crate::host::Vec3;
use crate::identifiers::{NodeId, PlayerId};
use crate::schema::ensure_schema;

mod codec;
mod types;

pub use codec::parse_timestamp;
use codec::persistence;
use types::PayloadTable;
pub use types::{
    EnderChestRecord, InventoryRecord, LocationRecord, LocationSnapshot, PayloadRecord,
};

/// Row-level access to the three player tables.
///
/// Writes are upserts keyed by player id and refresh `last_updated`. Reads
/// return `None` when the player has no row and never depend on the stamp.
pub trait PlayerStore {
    fn write_inventory(&self, owner: &PlayerId, payload: &str) -> Result<(), CoreError>;
    fn read_inventory(&self, owner: &PlayerId) -> Result<Option<String>, CoreError>;
    fn write_ender_chest(&self, owner: &PlayerId, payload: &str) -> Result<(), CoreError>;
    fn read_ender_chest(&self, owner: &PlayerId) -> Result<Option<String>, CoreError>;
    fn write_location(
        &self,
        owner: &PlayerId,
        location: &LocationSnapshot,
    ) -> Result<(), CoreError>;
    fn read_location(&self, owner: &PlayerId) -> Result<Option<LocationRecord>, CoreError>;
}

pub struct PersistenceGateway {
    provider: ConnectionProvider,
    node: NodeId,
    location_table: String,
}

impl PersistenceGateway {
    pub fn new(provider: ConnectionProvider, node: NodeId) -> Self {
        let location_table = node.location_table();
        Self {
            provider,
            node,
            location_table,
        }
    }

    pub fn from_config(config: &PersistenceConfig) -> Result<Self, CoreError> {
        let node = NodeId::new(&config.node)?;
        let settings = DatabaseSettings::from_runtime(&config.database_runtime())?;
        Ok(Self::new(ConnectionProvider::new(settings), node))
    }

    /// Builds a gateway from `DB_URL`, `DB_USER`, `DB_PASS`, `SERVER_NODE` and
    /// the optional `PLAYER_PERSISTENCE_CONFIG` file. Does not touch the database.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_config(&load_from_env()?)
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn in_memory(node: NodeId) -> Result<Self, CoreError> {
        let gateway = Self::new(ConnectionProvider::new(DatabaseSettings::in_memory()), node);
        gateway.initialize()?;
        Ok(gateway)
    }

    /// Creates the payload tables and this node's location table.
    ///
    /// Failure here means the store is unusable; callers should abort start-up.
    pub fn initialize(&self) -> Result<(), CoreError> {
        self.provider
            .with_connection(|conn| ensure_schema(conn, &self.node))?;
        tracing::info!(
            node = self.node.as_str(),
            location_table = self.location_table.as_str(),
            "player persistence store initialized"
        );
        Ok(())
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node
    }

    pub fn location_table(&self) -> &str {
        &self.location_table
    }

    pub fn provider(&self) -> &ConnectionProvider {
        &self.provider
    }

    pub fn read_inventory_record(
        &self,
        owner: &PlayerId,
    ) -> Result<Option<InventoryRecord>, CoreError> {
        self.read_payload_record(PayloadTable::Inventory, owner)
    }

    pub fn read_ender_chest_record(
        &self,
        owner: &PlayerId,
    ) -> Result<Option<EnderChestRecord>, CoreError> {
        self.read_payload_record(PayloadTable::EnderChest, owner)
    }

    fn write_payload(
        &self,
        table: PayloadTable,
        owner: &PlayerId,
        payload: &str,
    ) -> Result<(), CoreError> {
        self.provider.with_connection(|conn| {
            conn.execute(table.upsert_sql(), params![owner.to_db_string(), payload])
                .map_err(persistence)?;
            Ok(())
        })
    }

    fn read_payload(
        &self,
        table: PayloadTable,
        owner: &PlayerId,
    ) -> Result<Option<String>, CoreError> {
        self.provider.with_connection(|conn| {
            conn.query_row(
                table.select_payload_sql(),
                params![owner.to_db_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(persistence)
        })
    }

    fn read_payload_record(
        &self,
        table: PayloadTable,
        owner: &PlayerId,
    ) -> Result<Option<PayloadRecord>, CoreError> {
        let row = self.provider.with_connection(|conn| {
            conn.query_row(table.select_record_sql(), params![owner.to_db_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .optional()
            .map_err(persistence)
        })?;

        row.map(|(payload, stamp)| {
            Ok(PayloadRecord {
                owner: *owner,
                payload,
                last_updated: parse_timestamp(&stamp)?,
            })
        })
        .transpose()
    }
}

impl PlayerStore for PersistenceGateway {
    fn write_inventory(&self, owner: &PlayerId, payload: &str) -> Result<(), CoreError> {
        self.write_payload(PayloadTable::Inventory, owner, payload)
    }

    fn read_inventory(&self, owner: &PlayerId) -> Result<Option<String>, CoreError> {
        self.read_payload(PayloadTable::Inventory, owner)
    }

    fn write_ender_chest(&self, owner: &PlayerId, payload: &str) -> Result<(), CoreError> {
        self.write_payload(PayloadTable::EnderChest, owner, payload)
    }

    fn read_ender_chest(&self, owner: &PlayerId) -> Result<Option<String>, CoreError> {
        self.read_payload(PayloadTable::EnderChest, owner)
    }

    fn write_location(
        &self,
        owner: &PlayerId,
        location: &LocationSnapshot,
    ) -> Result<(), CoreError> {
        let sql = format!(
            "
            INSERT INTO \"{table}\" (uuid, dimension, coord_x, coord_y, coord_z, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            ON CONFLICT(uuid) DO UPDATE SET
                dimension = excluded.dimension,
                coord_x = excluded.coord_x,
                coord_y = excluded.coord_y,
                coord_z = excluded.coord_z,
                last_updated = excluded.last_updated
            ",
            table = self.location_table
        );
        let coords = location.coordinates;

        self.provider.with_connection(|conn| {
            conn.execute(
                &sql,
                params![
                    owner.to_db_string(),
                    location.dimension,
                    coords.x,
                    coords.y,
                    coords.z
                ],
            )
            .map_err(persistence)?;
            Ok(())
        })
    }

    fn read_location(&self, owner: &PlayerId) -> Result<Option<LocationRecord>, CoreError> {
        let sql = format!(
            "SELECT dimension, coord_x, coord_y, coord_z, last_updated \
             FROM \"{table}\" WHERE uuid = ?1",
            table = self.location_table
        );

        let row = self.provider.with_connection(|conn| {
            conn.query_row(&sql, params![owner.to_db_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Vec3::new(row.get(1)?, row.get(2)?, row.get(3)?),
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .optional()
            .map_err(persistence)
        })?;

        Ok(row.map(|(dimension, coordinates, stamp)| {
            let last_updated = stamp.as_deref().and_then(|raw| match parse_timestamp(raw) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    tracing::debug!(player = %owner, error = %err, "ignoring location timestamp");
                    None
                }
            });
            LocationRecord {
                owner: *owner,
                dimension,
                coordinates,
                last_updated,
            }
        }))
    }
}
