use crate::item::ItemStack;

pub const MAIN_INVENTORY_SIZE: usize = 36;
pub const ARMOR_INVENTORY_SIZE: usize = 4;
pub const OFF_HAND_INVENTORY_SIZE: usize = 1;
pub const ENDER_CHEST_SIZE: usize = 27;

pub const ARMOR_SLOT_OFFSET: i32 = 100;
pub const OFF_HAND_SLOT_OFFSET: i32 = 150;
const MAIN_SLOT_END: i32 = 36;
const ARMOR_SLOT_END: i32 = 150;
const OFF_HAND_SLOT_END: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryRegion {
    Main,
    Armor,
    OffHand,
}

impl InventoryRegion {
    fn offset(self) -> i32 {
        match self {
            Self::Main => 0,
            Self::Armor => ARMOR_SLOT_OFFSET,
            Self::OffHand => OFF_HAND_SLOT_OFFSET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAddress {
    pub region: InventoryRegion,
    pub index: usize,
}

impl SlotAddress {
    /// Maps a flattened slot index back to its sub-inventory.
    ///
    /// `0..36` is main, `100..150` armor, `150..200` off-hand. Anything else
    /// has no address.
    pub fn from_flat(slot: i32) -> Option<Self> {
        let (region, base) = match slot {
            0..MAIN_SLOT_END => (InventoryRegion::Main, 0),
            ARMOR_SLOT_OFFSET..ARMOR_SLOT_END => (InventoryRegion::Armor, ARMOR_SLOT_OFFSET),
            OFF_HAND_SLOT_OFFSET..OFF_HAND_SLOT_END => {
                (InventoryRegion::OffHand, OFF_HAND_SLOT_OFFSET)
            }
            _ => return None,
        };

        usize::try_from(slot - base)
            .ok()
            .map(|index| Self { region, index })
    }

    pub fn to_flat(self) -> Option<i32> {
        i32::try_from(self.index)
            .ok()
            .and_then(|index| index.checked_add(self.region.offset()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInventory<S> {
    pub main: Vec<S>,
    pub armor: Vec<S>,
    pub off_hand: Vec<S>,
}

impl<S: ItemStack> PlayerInventory<S> {
    pub fn new() -> Self {
        Self::with_sizes(
            MAIN_INVENTORY_SIZE,
            ARMOR_INVENTORY_SIZE,
            OFF_HAND_INVENTORY_SIZE,
        )
    }

    pub fn with_sizes(main: usize, armor: usize, off_hand: usize) -> Self {
        Self {
            main: vec![S::empty(); main],
            armor: vec![S::empty(); armor],
            off_hand: vec![S::empty(); off_hand],
        }
    }

    pub fn clear(&mut self) {
        for stack in self
            .main
            .iter_mut()
            .chain(self.armor.iter_mut())
            .chain(self.off_hand.iter_mut())
        {
            *stack = S::empty();
        }
    }

    pub fn region(&self, region: InventoryRegion) -> &[S] {
        match region {
            InventoryRegion::Main => &self.main,
            InventoryRegion::Armor => &self.armor,
            InventoryRegion::OffHand => &self.off_hand,
        }
    }

    fn region_mut(&mut self, region: InventoryRegion) -> &mut Vec<S> {
        match region {
            InventoryRegion::Main => &mut self.main,
            InventoryRegion::Armor => &mut self.armor,
            InventoryRegion::OffHand => &mut self.off_hand,
        }
    }

    pub fn stack(&self, address: SlotAddress) -> Option<&S> {
        self.region(address.region).get(address.index)
    }

    /// Returns `false` when the address is past the end of its region.
    pub fn set_stack(&mut self, address: SlotAddress, stack: S) -> bool {
        match self.region_mut(address.region).get_mut(address.index) {
            Some(slot) => {
                *slot = stack;
                true
            }
            None => false,
        }
    }

    /// Non-empty stacks keyed by flattened slot index: main, then armor, then off-hand.
    pub fn occupied_slots(&self) -> Vec<(i32, &S)> {
        [
            InventoryRegion::Main,
            InventoryRegion::Armor,
            InventoryRegion::OffHand,
        ]
        .into_iter()
        .flat_map(|region| {
            self.region(region)
                .iter()
                .enumerate()
                .filter(|(_, stack)| !stack.is_empty())
                .filter_map(move |(index, stack)| {
                    SlotAddress { region, index }
                        .to_flat()
                        .map(|slot| (slot, stack))
                })
        })
        .collect()
    }
}

impl<S: ItemStack> Default for PlayerInventory<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnderChest<S> {
    pub slots: Vec<S>,
}

impl<S: ItemStack> EnderChest<S> {
    pub fn new() -> Self {
        Self::with_size(ENDER_CHEST_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            slots: vec![S::empty(); size],
        }
    }

    pub fn clear(&mut self) {
        for stack in &mut self.slots {
            *stack = S::empty();
        }
    }

    pub fn set_stack(&mut self, index: usize, stack: S) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = stack;
                true
            }
            None => false,
        }
    }

    pub fn occupied_slots(&self) -> Vec<(i32, &S)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, stack)| !stack.is_empty())
            .filter_map(|(index, stack)| i32::try_from(index).ok().map(|slot| (slot, stack)))
            .collect()
    }
}

impl<S: ItemStack> Default for EnderChest<S> {
    fn default() -> Self {
        Self::new()
    }
}
