use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CoreError;
use crate::identifiers::NodeId;

pub const INVENTORY_TABLE: &str = "player_inventories";
pub const ENDER_CHEST_TABLE: &str = "player_enderchests";

/// Creates the shared payload tables and this node's location table.
///
/// Safe to run on every start. SQLite has no composite row types, so the
/// coordinates that a server database would keep in one `(x, y, z)` type are
/// three `REAL` columns here.
pub fn ensure_schema(conn: &Connection, node: &NodeId) -> Result<(), CoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS player_inventories (
            uuid TEXT PRIMARY KEY,
            inventory_data TEXT NOT NULL,
            last_updated TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE TABLE IF NOT EXISTS player_enderchests (
            uuid TEXT PRIMARY KEY,
            chest_data TEXT NOT NULL,
            last_updated TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
    )
    .map_err(|err| CoreError::Schema(err.to_string()))?;

    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS \"{table}\" (
            uuid TEXT PRIMARY KEY,
            dimension TEXT NOT NULL,
            coord_x REAL NOT NULL,
            coord_y REAL NOT NULL,
            coord_z REAL NOT NULL,
            last_updated TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
        table = node.location_table()
    ))
    .map_err(|err| CoreError::Schema(err.to_string()))?;

    tracing::debug!(node = node.as_str(), "player persistence schema ready");
    Ok(())
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, CoreError> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
        params![name],
        |_| Ok(()),
    )
    .optional()
    .map(|opt| opt.is_some())
    .map_err(|err| CoreError::Persistence(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(raw: &str) -> NodeId {
        NodeId::new(raw).expect("valid node id")
    }

    #[test]
    fn ensure_schema_creates_payload_and_node_tables() {
        let conn = Connection::open_in_memory().expect("open sqlite");
        ensure_schema(&conn, &node("main")).expect("ensure schema");

        for table in [INVENTORY_TABLE, ENDER_CHEST_TABLE, "player_locations_main"] {
            assert!(
                table_exists(&conn, table).expect("table lookup"),
                "missing table {table}"
            );
        }
        assert!(!table_exists(&conn, "player_locations_other").expect("table lookup"));
    }

    #[test]
    fn ensure_schema_is_idempotent_and_keeps_rows() {
        let conn = Connection::open_in_memory().expect("open sqlite");
        ensure_schema(&conn, &node("main")).expect("first run");
        conn.execute(
            "INSERT INTO player_inventories (uuid, inventory_data) VALUES ('u-1', '[]')",
            [],
        )
        .expect("seed row");

        ensure_schema(&conn, &node("main")).expect("second run");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM player_inventories", [], |row| {
                row.get(0)
            })
            .expect("count rows");
        assert_eq!(rows, 1);
    }

    #[test]
    fn each_node_gets_its_own_location_table() {
        let conn = Connection::open_in_memory().expect("open sqlite");
        ensure_schema(&conn, &node("alpha")).expect("alpha schema");
        ensure_schema(&conn, &node("beta")).expect("beta schema");

        assert!(table_exists(&conn, "player_locations_alpha").expect("lookup"));
        assert!(table_exists(&conn, "player_locations_beta").expect("lookup"));
    }

    #[test]
    fn default_timestamp_is_rfc3339() {
        let conn = Connection::open_in_memory().expect("open sqlite");
        ensure_schema(&conn, &node("main")).expect("ensure schema");
        conn.execute(
            "INSERT INTO player_enderchests (uuid, chest_data) VALUES ('u-1', '[]')",
            [],
        )
        .expect("seed row");

        let stamp: String = conn
            .query_row("SELECT last_updated FROM player_enderchests", [], |row| {
                row.get(0)
            })
            .expect("read timestamp");
        assert!(crate::store::parse_timestamp(&stamp).is_ok(), "{stamp}");
    }
}
