//! Join and leave hooks tying the store, the serializer and location sync
//! together for one player entity.

use crate::error::CoreError;
use crate::host::{PlayerEntity, WorldRegistry};
use crate::item::{ItemCodec, ItemCodecAdapter};
use crate::location::{restore_location, save_location, LocationRestore};
use crate::serializer::{
    deserialize_ender_chest, deserialize_inventory, serialize_ender_chest, serialize_inventory,
    RestoreReport,
};
use crate::store::PlayerStore;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Restored(RestoreReport),
    NoRecord,
    /// The stored payload could not be read; in-memory state was kept.
    Rejected { reason: String },
}

impl SyncOutcome {
    fn from_restore(result: Result<Option<RestoreReport>, CoreError>) -> Result<Self, CoreError> {
        match result {
            Ok(Some(report)) => Ok(Self::Restored(report)),
            Ok(None) => Ok(Self::NoRecord),
            Err(CoreError::Payload(reason)) => Ok(Self::Rejected { reason }),
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinReport {
    pub inventory: SyncOutcome,
    pub ender_chest: SyncOutcome,
    pub location: LocationRestore,
}

pub struct PlayerPersistence<St, C> {
    store: St,
    items: ItemCodecAdapter<C>,
}

impl<St, C> PlayerPersistence<St, C>
where
    St: PlayerStore,
{
    pub fn new(store: St, codec: C) -> Self {
        Self {
            store,
            items: ItemCodecAdapter::new(codec),
        }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn items(&self) -> &ItemCodecAdapter<C> {
        &self.items
    }

    /// Replaces the player's inventory with the stored one. `Ok(None)` when
    /// nothing is stored; the inventory is then left as it was.
    pub fn sync_inventory<P>(&self, player: &mut P) -> Result<Option<RestoreReport>, CoreError>
    where
        P: PlayerEntity + ?Sized,
        C: ItemCodec<P::Stack>,
    {
        let owner = player.player_id();
        let Some(payload) = self.store.read_inventory(&owner)? else {
            return Ok(None);
        };

        let report = deserialize_inventory(player.inventory_mut(), &payload, &self.items)?;
        tracing::debug!(
            player = %owner,
            placed = report.placed,
            dropped = report.dropped_slots,
            decode_failures = report.decode_failures,
            "restored inventory"
        );
        Ok(Some(report))
    }

    pub fn sync_ender_chest<P>(&self, player: &mut P) -> Result<Option<RestoreReport>, CoreError>
    where
        P: PlayerEntity + ?Sized,
        C: ItemCodec<P::Stack>,
    {
        let owner = player.player_id();
        let Some(payload) = self.store.read_ender_chest(&owner)? else {
            return Ok(None);
        };

        let report = deserialize_ender_chest(player.ender_chest_mut(), &payload, &self.items)?;
        tracing::debug!(
            player = %owner,
            placed = report.placed,
            dropped = report.dropped_slots,
            decode_failures = report.decode_failures,
            "restored ender chest"
        );
        Ok(Some(report))
    }

    pub fn sync_location<P, W>(
        &self,
        player: &mut P,
        worlds: &W,
    ) -> Result<LocationRestore, CoreError>
    where
        P: PlayerEntity + ?Sized,
        W: WorldRegistry + ?Sized,
    {
        restore_location(&self.store, player, worlds)
    }

    pub fn save_inventory<P>(&self, player: &P) -> Result<(), CoreError>
    where
        P: PlayerEntity + ?Sized,
        C: ItemCodec<P::Stack>,
    {
        let payload = serialize_inventory(player.inventory(), &self.items)?;
        self.store.write_inventory(&player.player_id(), &payload)
    }

    pub fn save_ender_chest<P>(&self, player: &P) -> Result<(), CoreError>
    where
        P: PlayerEntity + ?Sized,
        C: ItemCodec<P::Stack>,
    {
        let payload = serialize_ender_chest(player.ender_chest(), &self.items)?;
        self.store.write_ender_chest(&player.player_id(), &payload)
    }

    pub fn save_location<P>(&self, player: &P) -> Result<(), CoreError>
    where
        P: PlayerEntity + ?Sized,
    {
        save_location(&self.store, player)
    }

    /// Restores inventory, ender chest and location in that order.
    ///
    /// An unreadable payload is logged and recorded in the report so the
    /// remaining restores still run. Database failures abort the join.
    pub fn on_player_join<P, W>(&self, player: &mut P, worlds: &W) -> Result<JoinReport, CoreError>
    where
        P: PlayerEntity + ?Sized,
        W: WorldRegistry + ?Sized,
        C: ItemCodec<P::Stack>,
    {
        let owner = player.player_id();

        let inventory = SyncOutcome::from_restore(self.sync_inventory(player))?;
        if let SyncOutcome::Rejected { reason } = &inventory {
            tracing::warn!(
                player = %owner,
                error = %reason,
                "stored inventory unreadable; kept current inventory"
            );
        }

        let ender_chest = SyncOutcome::from_restore(self.sync_ender_chest(player))?;
        if let SyncOutcome::Rejected { reason } = &ender_chest {
            tracing::warn!(
                player = %owner,
                error = %reason,
                "stored ender chest unreadable; kept current contents"
            );
        }

        let location = self.sync_location(player, worlds)?;

        tracing::info!(player = %owner, ?location, "player state restored");
        Ok(JoinReport {
            inventory,
            ender_chest,
            location,
        })
    }

    pub fn on_player_leave<P>(&self, player: &P) -> Result<(), CoreError>
    where
        P: PlayerEntity + ?Sized,
        C: ItemCodec<P::Stack>,
    {
        self.save_all(player)?;
        tracing::info!(player = %player.player_id(), "player state saved on leave");
        Ok(())
    }

    /// Writes inventory, ender chest and location. Also used for periodic saves.
    pub fn save_all<P>(&self, player: &P) -> Result<(), CoreError>
    where
        P: PlayerEntity + ?Sized,
        C: ItemCodec<P::Stack>,
    {
        self.save_inventory(player)?;
        self.save_ender_chest(player)?;
        self.save_location(player)
    }
}
