//! Traits the host game runtime implements for its player and world types.

use serde::{Deserialize, Serialize};

use crate::identifiers::PlayerId;
use crate::inventory::{EnderChest, PlayerInventory};
use crate::item::ItemStack;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeleportTarget {
    pub world: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

pub trait PlayerEntity {
    type Stack: ItemStack;

    fn player_id(&self) -> PlayerId;
    fn inventory(&self) -> &PlayerInventory<Self::Stack>;
    fn inventory_mut(&mut self) -> &mut PlayerInventory<Self::Stack>;
    fn ender_chest(&self) -> &EnderChest<Self::Stack>;
    fn ender_chest_mut(&mut self) -> &mut EnderChest<Self::Stack>;
    /// Identifier of the world the player is in, e.g. `minecraft:overworld`.
    fn world_id(&self) -> String;
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn yaw(&self) -> f32;
    fn pitch(&self) -> f32;
    fn relocate(&mut self, target: TeleportTarget);
}

pub trait WorldRegistry {
    /// Identifiers of the worlds currently loaded, in the host's iteration order.
    fn loaded_worlds(&self) -> Vec<String>;
}

impl WorldRegistry for [String] {
    fn loaded_worlds(&self) -> Vec<String> {
        self.to_vec()
    }
}

impl WorldRegistry for Vec<String> {
    fn loaded_worlds(&self) -> Vec<String> {
        self.clone()
    }
}
