//! In-crate [`World`] implementation backed by sparse block maps.
//!
//! Blocks default to empty (no fluid, no redstone), columns default to the
//! world's default biome, and every chunk is loaded unless chunk tracking is
//! switched on with [`GridWorld::track_loaded_chunks`].

use crate::id::{EntityId, LootTableId};
use crate::item::ItemStack;
use crate::loot::LootTables;
use crate::position::{Aabb, BlockPos, Vec3};
use crate::rng::SimRng;
use crate::world::{Biome, Entity, EntityClass, FluidState, World};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridWorld {
    client: bool,
    raining: bool,
    fluids: BTreeMap<BlockPos, FluidState>,
    redstone: BTreeMap<BlockPos, u8>,
    default_biome: Biome,
    biomes: BTreeMap<(i32, i32), Biome>,
    /// `None` means every chunk is loaded.
    loaded_chunks: Option<BTreeSet<(i32, i32)>>,
    entities: SlotMap<EntityId, Entity>,
    rng: SimRng,
    loot: LootTables,
}

impl GridWorld {
    pub fn new(seed: u64) -> Self {
        Self {
            client: false,
            raining: false,
            fluids: BTreeMap::new(),
            redstone: BTreeMap::new(),
            default_biome: Biome::default(),
            biomes: BTreeMap::new(),
            loaded_chunks: None,
            entities: SlotMap::with_key(),
            rng: SimRng::new(seed),
            loot: LootTables::new(),
        }
    }

    /// A non-authoritative mirror of a world.
    pub fn new_client(seed: u64) -> Self {
        Self {
            client: true,
            ..Self::new(seed)
        }
    }

    // -- Blocks --

    pub fn set_fluid(&mut self, pos: BlockPos, state: FluidState) {
        if state == FluidState::Empty {
            self.fluids.remove(&pos);
        } else {
            self.fluids.insert(pos, state);
        }
    }

    /// Fill the inclusive box between `a` and `b` with `state`.
    pub fn fill_fluid(&mut self, a: BlockPos, b: BlockPos, state: FluidState) {
        for pos in BlockPos::all_in_box(a, b) {
            self.set_fluid(pos, state);
        }
    }

    pub fn set_redstone_power(&mut self, pos: BlockPos, power: u8) {
        if power == 0 {
            self.redstone.remove(&pos);
        } else {
            self.redstone.insert(pos, power.min(15));
        }
    }

    // -- Climate --

    pub fn set_default_biome(&mut self, biome: Biome) {
        self.default_biome = biome;
    }

    pub fn set_biome(&mut self, x: i32, z: i32, biome: Biome) {
        self.biomes.insert((x, z), biome);
    }

    pub fn set_raining(&mut self, raining: bool) {
        self.raining = raining;
    }

    pub fn is_raining(&self) -> bool {
        self.raining
    }

    // -- Chunk loading --

    /// Switch from "everything loaded" to explicit chunk tracking. No chunk
    /// is loaded until [`GridWorld::load_chunk`] is called.
    pub fn track_loaded_chunks(&mut self) {
        self.loaded_chunks.get_or_insert_with(BTreeSet::new);
    }

    pub fn load_chunk(&mut self, cx: i32, cz: i32) {
        if let Some(chunks) = &mut self.loaded_chunks {
            chunks.insert((cx, cz));
        }
    }

    pub fn unload_chunk(&mut self, cx: i32, cz: i32) {
        if let Some(chunks) = &mut self.loaded_chunks {
            chunks.remove(&(cx, cz));
        }
    }

    // -- Entities --

    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        self.entities.insert(entity)
    }

    pub fn spawn_item(&mut self, pos: Vec3, stack: ItemStack) -> EntityId {
        self.spawn(Entity::item(pos, stack))
    }

    pub fn spawn_orb(&mut self, pos: Vec3, value: u32) -> EntityId {
        self.spawn(Entity::orb(pos, value))
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Loot --

    pub fn loot_tables(&self) -> &LootTables {
        &self.loot
    }

    pub fn loot_tables_mut(&mut self) -> &mut LootTables {
        &mut self.loot
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }
}

impl World for GridWorld {
    fn is_client(&self) -> bool {
        self.client
    }

    fn is_area_loaded(&self, center: BlockPos, range: i32) -> bool {
        let Some(chunks) = &self.loaded_chunks else {
            return true;
        };
        let (x0, z0) = center.offset(-range, 0, -range).chunk();
        let (x1, z1) = center.offset(range, 0, range).chunk();
        (x0..=x1).all(|cx| (z0..=z1).all(|cz| chunks.contains(&(cx, cz))))
    }

    fn fluid_at(&self, pos: BlockPos) -> FluidState {
        self.fluids.get(&pos).copied().unwrap_or_default()
    }

    fn biome_at(&self, pos: BlockPos) -> Biome {
        self.biomes
            .get(&(pos.x, pos.z))
            .copied()
            .unwrap_or(self.default_biome)
    }

    fn is_raining_at(&self, pos: BlockPos) -> bool {
        self.raining && self.biome_at(pos).precipitation
    }

    fn redstone_power(&self, pos: BlockPos) -> u8 {
        self.redstone.get(&pos).copied().unwrap_or(0)
    }

    fn entities_within(&self, area: &Aabb, class: EntityClass) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.alive && e.class() == class && area.contains(&e.pos))
            .map(|(id, _)| id)
            .collect()
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    fn remove_entity(&mut self, id: EntityId) {
        self.entities.remove(id);
    }

    fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    fn roll_loot(&mut self, table: LootTableId) -> Vec<ItemStack> {
        match self.loot.get(table) {
            Some(t) => t.roll(&mut self.rng),
            None => Vec::new(),
        }
    }
}
