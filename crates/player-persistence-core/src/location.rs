use crate::error::CoreError;
use crate::host::{PlayerEntity, TeleportTarget, WorldRegistry};
use crate::store::{LocationSnapshot, PlayerStore};

#[derive(Debug, Clone, PartialEq)]
pub enum LocationRestore {
    Relocated,
    NoRecord,
    UnknownDimension { dimension: String },
}

/// Moves the player to the position stored for this node.
///
/// The stored dimension is matched exactly against the loaded worlds. A
/// dimension that is not loaded leaves the player where they are.
pub fn restore_location<St, P, W>(
    store: &St,
    player: &mut P,
    worlds: &W,
) -> Result<LocationRestore, CoreError>
where
    St: PlayerStore + ?Sized,
    P: PlayerEntity + ?Sized,
    W: WorldRegistry + ?Sized,
{
    let owner = player.player_id();
    let Some(record) = store.read_location(&owner)? else {
        return Ok(LocationRestore::NoRecord);
    };

    let Some(world) = worlds
        .loaded_worlds()
        .into_iter()
        .find(|world| *world == record.dimension)
    else {
        tracing::debug!(
            player = %owner,
            dimension = record.dimension.as_str(),
            "stored dimension is not loaded; location left unchanged"
        );
        return Ok(LocationRestore::UnknownDimension {
            dimension: record.dimension,
        });
    };

    let target = TeleportTarget {
        world,
        position: record.coordinates,
        velocity: player.velocity(),
        yaw: player.yaw(),
        pitch: player.pitch(),
    };
    player.relocate(target);
    Ok(LocationRestore::Relocated)
}

pub fn save_location<St, P>(store: &St, player: &P) -> Result<(), CoreError>
where
    St: PlayerStore + ?Sized,
    P: PlayerEntity + ?Sized,
{
    let snapshot = LocationSnapshot {
        dimension: player.world_id(),
        coordinates: player.position(),
    };
    store.write_location(&player.player_id(), &snapshot)
}
