//! The world query surface devices run against.
//!
//! Devices never own the world. Each tick they receive a `&mut W` where
//! `W: World` and use it to read fluids, biomes, weather and redstone, to
//! find and mutate loose entities, and to roll loot. [`crate::grid_world::GridWorld`]
//! is the in-crate implementation; hosts may supply their own.

use crate::id::{EntityId, LootTableId};
use crate::item::ItemStack;
use crate::position::{Aabb, BlockPos, Vec3};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Block-level state
// ---------------------------------------------------------------------------

/// Liquid kinds a block can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fluid {
    Water,
    Lava,
}

/// Fluid content of a single block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FluidState {
    #[default]
    Empty,
    Source(Fluid),
    Flowing(Fluid),
}

impl FluidState {
    /// True for a still source block of `fluid`. Flowing blocks never count.
    pub fn is_source_of(&self, fluid: Fluid) -> bool {
        matches!(self, FluidState::Source(f) if *f == fluid)
    }
}

/// Biome properties of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biome {
    pub ocean: bool,
    pub river: bool,
    /// Whether rain falls here at all (false for deserts and the like).
    pub precipitation: bool,
}

impl Biome {
    pub const PLAINS: Biome = Biome {
        ocean: false,
        river: false,
        precipitation: true,
    };
    pub const OCEAN: Biome = Biome {
        ocean: true,
        river: false,
        precipitation: true,
    };
    pub const RIVER: Biome = Biome {
        ocean: false,
        river: true,
        precipitation: true,
    };
    pub const DESERT: Biome = Biome {
        ocean: false,
        river: false,
        precipitation: false,
    };
}

impl Default for Biome {
    fn default() -> Self {
        Biome::PLAINS
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A dropped item lying in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEntity {
    pub stack: ItemStack,
    /// Ticks until the item may be picked up. Non-zero blocks collection.
    pub pickup_delay: u32,
    /// Set while the item rides a conveyor.
    pub on_conveyor: bool,
    /// Marks a conveyor item as collectable anyway.
    pub demagnetize: bool,
}

impl ItemEntity {
    pub fn new(stack: ItemStack) -> Self {
        Self {
            stack,
            pickup_delay: 0,
            on_conveyor: false,
            demagnetize: false,
        }
    }

    /// Pickup eligibility: no pickup delay, and not held by a conveyor unless
    /// explicitly demagnetized.
    pub fn can_be_collected(&self) -> bool {
        self.pickup_delay == 0 && (!self.on_conveyor || self.demagnetize)
    }
}

/// An experience orb carrying `value` experience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceOrb {
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Item(ItemEntity),
    Orb(ExperienceOrb),
}

/// Discriminant used for area queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    Item,
    Orb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub pos: Vec3,
    pub alive: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn item(pos: Vec3, stack: ItemStack) -> Self {
        Self {
            pos,
            alive: true,
            kind: EntityKind::Item(ItemEntity::new(stack)),
        }
    }

    pub fn orb(pos: Vec3, value: u32) -> Self {
        Self {
            pos,
            alive: true,
            kind: EntityKind::Orb(ExperienceOrb { value }),
        }
    }

    pub fn class(&self) -> EntityClass {
        match self.kind {
            EntityKind::Item(_) => EntityClass::Item,
            EntityKind::Orb(_) => EntityClass::Orb,
        }
    }

    pub fn as_item(&self) -> Option<&ItemEntity> {
        match &self.kind {
            EntityKind::Item(item) => Some(item),
            EntityKind::Orb(_) => None,
        }
    }

    pub fn as_item_mut(&mut self) -> Option<&mut ItemEntity> {
        match &mut self.kind {
            EntityKind::Item(item) => Some(item),
            EntityKind::Orb(_) => None,
        }
    }

    pub fn as_orb_mut(&mut self) -> Option<&mut ExperienceOrb> {
        match &mut self.kind {
            EntityKind::Orb(orb) => Some(orb),
            EntityKind::Item(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// World trait
// ---------------------------------------------------------------------------

/// Everything a device may ask of the world it lives in.
pub trait World {
    /// True on a mirrored (non-authoritative) copy of the world. Devices do
    /// no sampling and take no action there.
    fn is_client(&self) -> bool;

    /// Whether every block within `range` of `center` is loaded.
    fn is_area_loaded(&self, center: BlockPos, range: i32) -> bool;

    fn fluid_at(&self, pos: BlockPos) -> FluidState;

    fn biome_at(&self, pos: BlockPos) -> Biome;

    /// Whether rain is currently falling at `pos`.
    fn is_raining_at(&self, pos: BlockPos) -> bool;

    /// Redstone power level (0-15) arriving at `pos`.
    fn redstone_power(&self, pos: BlockPos) -> u8;

    /// Live entities of the given class inside `area`, in a stable order.
    fn entities_within(&self, area: &Aabb, class: EntityClass) -> Vec<EntityId>;

    fn entity(&self, id: EntityId) -> Option<&Entity>;

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity>;

    /// Remove an entity from the world. Unknown ids are ignored.
    fn remove_entity(&mut self, id: EntityId);

    fn rng(&mut self) -> &mut SimRng;

    /// Roll the given loot table once. Unknown tables roll nothing.
    fn roll_loot(&mut self, table: LootTableId) -> Vec<ItemStack>;
}
