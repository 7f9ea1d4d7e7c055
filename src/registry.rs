//! The shadow collection of visual tile entities.
//!
//! The registry mirrors the engine-owned board so that every on-screen tile
//! has a persistent identity across slides and merges. It is keyed by grid
//! coordinate through lookups rather than by storage: entities live in a
//! slot arena and are addressed by opaque [`TileId`] handles, which double
//! as stable element keys for the renderer. At rest each coordinate holds at
//! most one live entity; during the merge window of an apply cycle a
//! destination briefly holds two.

use crate::result::Coord;

/// Transient render marks carried by an entity for one cycle.
///
/// `new` and `merged` drive the pop-in animations and are cleared at the
/// start of the next cycle. `to-remove` excludes the entity from liveness
/// queries while keeping it in the arena so its exit animation can finish;
/// the next cycle's cleanup phase physically deletes it.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct TileFlags(u8);

impl TileFlags {
    const NEW: u8 = 1;
    const MERGED: u8 = 1 << 1;
    const TO_REMOVE: u8 = 1 << 2;

    pub fn new_tile() -> Self {
        Self(Self::NEW)
    }

    pub fn merged_tile() -> Self {
        Self(Self::MERGED)
    }

    pub fn is_new(self) -> bool {
        self.0 & Self::NEW != 0
    }

    pub fn is_merged(self) -> bool {
        self.0 & Self::MERGED != 0
    }

    pub fn is_to_remove(self) -> bool {
        self.0 & Self::TO_REMOVE != 0
    }

    pub fn mark_to_remove(&mut self) {
        self.0 |= Self::TO_REMOVE;
    }

    /// Drop the previous cycle's `new`/`merged` marks (`to-remove` is
    /// resolved by deletion, not by clearing).
    pub fn clear_cycle_marks(&mut self) {
        self.0 &= !(Self::NEW | Self::MERGED);
    }
}

impl std::fmt::Debug for TileFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut set = f.debug_set();
        if self.is_new() {
            set.entry(&"new");
        }
        if self.is_merged() {
            set.entry(&"merged");
        }
        if self.is_to_remove() {
            set.entry(&"to-remove");
        }
        set.finish()
    }
}

/// One visual tile: a value at a coordinate plus transient render marks.
/// Identity is positional for the lifetime of a frame; the coordinate
/// changes when the tile slides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileEntity {
    pub value: u32,
    pub row: usize,
    pub col: usize,
    pub flags: TileFlags,
}

impl TileEntity {
    pub fn coord(&self) -> Coord {
        (self.row, self.col)
    }

    /// Live entities answer coordinate queries; `to-remove` ones are only
    /// waiting for their exit animation.
    pub fn is_live(&self) -> bool {
        !self.flags.is_to_remove()
    }
}

/// Opaque handle to an entity slot. Stable for the entity's whole lifetime,
/// including the deferred-removal window.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileId(usize);

impl TileId {
    /// Raw slot index, usable as a DOM element key.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of tile entities with coordinate-keyed liveness queries.
#[derive(Debug, Default)]
pub struct TileRegistry {
    slots: Vec<Option<TileEntity>>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, reusing a free slot when one exists.
    pub fn insert(&mut self, entity: TileEntity) -> TileId {
        match self.slots.iter().position(Option::is_none) {
            Some(i) => {
                self.slots[i] = Some(entity);
                TileId(i)
            }
            None => {
                self.slots.push(Some(entity));
                TileId(self.slots.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, id: TileId) -> Option<TileEntity> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn get(&self, id: TileId) -> Option<&TileEntity> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut TileEntity> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Move an entity to a new coordinate. A stale handle is ignored; the
    /// caller decides whether that is worth reporting.
    pub fn relocate(&mut self, id: TileId, row: usize, col: usize) {
        if let Some(entity) = self.get_mut(id) {
            entity.row = row;
            entity.col = col;
        }
    }

    /// The live entity at a coordinate, if any. Outside the merge window at
    /// most one entity can match.
    pub fn live_at(&self, row: usize, col: usize) -> Option<TileId> {
        self.iter()
            .find(|(_, e)| e.is_live() && e.coord() == (row, col))
            .map(|(id, _)| id)
    }

    /// Both live entities sharing a merge destination mid-cycle.
    pub fn live_pair_at(&self, row: usize, col: usize) -> Option<(TileId, TileId)> {
        let mut matches = self
            .iter()
            .filter(|(_, e)| e.is_live() && e.coord() == (row, col))
            .map(|(id, _)| id);
        match (matches.next(), matches.next()) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    /// All occupied slots, including `to-remove` entities.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileEntity)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (TileId(i), e)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TileId, &mut TileEntity)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|e| (TileId(i), e)))
    }

    /// Number of live entities (the on-board tile count).
    pub fn live_count(&self) -> usize {
        self.iter().filter(|(_, e)| e.is_live()).count()
    }

    /// Number of occupied slots, stale entities included.
    pub fn total_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
