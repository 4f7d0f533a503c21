#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilefall engine.
//!
//! This crate defines the value types every other crate agrees on: the
//! [`Tile`] cell stored in the world grid, the data-driven tile-type
//! registry that gives those cells their behavior, item and inventory
//! types, and the handful of constants that double as wire contracts for
//! the synchronization protocol.

use serde::{Deserialize, Serialize};

/// Side length of a single square tile measured in world units.
pub const TILE_SIZE: i32 = 8;

/// Light level assigned to open air and out-of-window neighbors.
///
/// Empty regions equilibrate to this value instantly, which produces the
/// "outdoor" look without waiting for propagation to reach them.
pub const AMBIENT_LIGHT: u16 = 285;

/// Number of tiles a player must travel from the last synced position
/// before the server streams a fresh edge of tile data.
pub const CHUNK_SIZE: i32 = 8;

/// Protocol version exchanged during the connection handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// Number of slots in a player inventory (seven columns by five rows).
pub const INVENTORY_SLOTS: usize = 35;

/// Pixel size of one tile inside the tileset texture.
pub const TEXTURE_SIZE: i32 = 8;

/// Number of tile cells per row of the tileset texture.
pub const TILESET_COLUMNS: i32 = 16;

/// Enumerates the built-in tile types.
///
/// The discriminant is the stable wire identifier; `0` is reserved for
/// empty/air and must never be reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileKind {
    /// Empty space.
    Air = 0,
    /// Impassable world border; blocks all light.
    Bedrock = 1,
    /// Surface dirt with a grass variant style.
    Grass = 2,
    /// Soil beneath the surface.
    Dirt = 3,
    /// Deep rock.
    Stone = 4,
    /// Tree trunk.
    Log = 5,
    /// Tree canopy.
    Leaves = 6,
    /// Placed light source.
    Torch = 7,
}

impl TileKind {
    /// Stable byte identifier used on the wire and in the grid.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Resolves a wire identifier back into a tile kind.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Air),
            1 => Some(Self::Bedrock),
            2 => Some(Self::Grass),
            3 => Some(Self::Dirt),
            4 => Some(Self::Stone),
            5 => Some(Self::Log),
            6 => Some(Self::Leaves),
            7 => Some(Self::Torch),
            _ => None,
        }
    }

    /// Looks up the registry row describing this tile kind.
    #[must_use]
    pub const fn properties(self) -> &'static TileProperties {
        &REGISTRY[self as usize]
    }
}

/// Behavioral properties of one tile type.
///
/// New tile types are rows in [`REGISTRY`], not new match arms; everything
/// the simulation needs to know about a tile type lives here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileProperties {
    /// Whether entities collide with the foreground of this type.
    pub solid: bool,
    /// Light emitted by the tile itself (torches and the like).
    pub light_emission: u16,
    /// Light lost when passing through this type as a foreground tile.
    pub fore_dim: u16,
    /// Light lost when only the background layer holds this type.
    pub back_dim: u16,
    /// Horizontal deceleration applied to entities supported by this type.
    pub movement_resistance: f32,
    /// Base movement speed granted while standing on this type.
    pub movement_speed: f32,
}

const fn tile_properties(solid: bool, light_emission: u16, fore_dim: u16, back_dim: u16) -> TileProperties {
    TileProperties {
        solid,
        light_emission,
        fore_dim,
        back_dim,
        movement_resistance: if solid { 960.0 } else { 120.0 },
        movement_speed: 100.0,
    }
}

/// Property table indexed by [`TileKind`] discriminant.
pub const REGISTRY: [TileProperties; 8] = [
    // Air
    tile_properties(false, 0, 25, 6),
    // Bedrock: opaque to light in both layers.
    tile_properties(true, 0, u16::MAX, u16::MAX),
    // Grass
    tile_properties(true, 0, 25, 6),
    // Dirt
    tile_properties(true, 0, 25, 6),
    // Stone
    tile_properties(true, 0, 25, 6),
    // Log
    tile_properties(false, 0, 25, 6),
    // Leaves: thin canopy lets most light through.
    tile_properties(false, 0, 12, 3),
    // Torch
    tile_properties(false, 275, 25, 6),
];

/// Looks up tile properties by raw identifier.
///
/// Unknown identifiers resolve to air so that a corrupt byte can never make
/// the simulation treat garbage as solid ground.
#[must_use]
pub fn properties_of(id: u8) -> &'static TileProperties {
    match TileKind::from_id(id) {
        Some(kind) => kind.properties(),
        None => TileKind::Air.properties(),
    }
}

/// Reports whether the provided foreground identifier is solid.
///
/// Pure function of the identifier: the same input always yields the same
/// answer, which collision and generation both rely on.
#[must_use]
pub fn is_solid(fore_id: u8) -> bool {
    properties_of(fore_id).solid
}

/// One cell of the world grid.
///
/// Foreground and background layers are independent; the style bytes are
/// rendering hints derived from neighbor adjacency, and `light` is written
/// exclusively by the lighting system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    fore: u8,
    back: u8,
    fore_style: u8,
    back_style: u8,
    light: u16,
}

impl Tile {
    /// A fully empty cell.
    pub const EMPTY: Self = Self {
        fore: 0,
        back: 0,
        fore_style: 0,
        back_style: 0,
        light: 0,
    };

    /// Creates a tile from raw layer identifiers and styles.
    #[must_use]
    pub const fn from_raw(fore: u8, back: u8, fore_style: u8, back_style: u8) -> Self {
        Self {
            fore,
            back,
            fore_style,
            back_style,
            light: 0,
        }
    }

    /// Foreground tile-type identifier, `0` for none.
    #[must_use]
    pub const fn fore(&self) -> u8 {
        self.fore
    }

    /// Background tile-type identifier, `0` for none.
    #[must_use]
    pub const fn back(&self) -> u8 {
        self.back
    }

    /// Border/variant selector for the foreground layer.
    #[must_use]
    pub const fn fore_style(&self) -> u8 {
        self.fore_style
    }

    /// Border/variant selector for the background layer.
    #[must_use]
    pub const fn back_style(&self) -> u8 {
        self.back_style
    }

    /// Current propagated light level.
    #[must_use]
    pub const fn light(&self) -> u16 {
        self.light
    }

    /// Replaces the foreground layer.
    pub fn set_fore(&mut self, kind: TileKind) {
        self.fore = kind.id();
    }

    /// Replaces the background layer.
    pub fn set_back(&mut self, kind: TileKind) {
        self.back = kind.id();
    }

    /// Replaces the foreground layer from a raw identifier.
    pub fn set_fore_id(&mut self, id: u8) {
        self.fore = id;
    }

    /// Replaces the background layer from a raw identifier.
    pub fn set_back_id(&mut self, id: u8) {
        self.back = id;
    }

    /// Overwrites the foreground style selector.
    pub fn set_fore_style(&mut self, style: u8) {
        self.fore_style = style;
    }

    /// Overwrites the background style selector.
    pub fn set_back_style(&mut self, style: u8) {
        self.back_style = style;
    }

    /// Overwrites the propagated light level.
    pub fn set_light(&mut self, light: u16) {
        self.light = light;
    }

    /// True when neither layer holds a tile.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fore == 0 && self.back == 0
    }

    /// True when the foreground blocks entity movement.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        is_solid(self.fore)
    }

    /// True when only the background layer is occupied.
    #[must_use]
    pub const fn back_only(&self) -> bool {
        self.fore == 0 && self.back > 0
    }

    /// True when the background layer should be visible behind the
    /// foreground (air and canopy foregrounds do not cover it).
    #[must_use]
    pub fn draw_back(&self) -> bool {
        matches!(
            TileKind::from_id(self.fore),
            Some(TileKind::Air) | Some(TileKind::Leaves)
        )
    }

    /// Light the tile emits by itself regardless of neighbors.
    #[must_use]
    pub fn light_generated(&self) -> u16 {
        properties_of(self.fore).light_emission
    }

    /// Light attenuation applied when the foreground layer is occupied.
    #[must_use]
    pub fn fore_light_dim(&self) -> u16 {
        properties_of(self.fore).fore_dim
    }

    /// Light attenuation applied when only the background layer is occupied.
    #[must_use]
    pub fn back_light_dim(&self) -> u16 {
        properties_of(self.back).back_dim
    }

    /// Horizontal deceleration granted by this tile to supported entities.
    #[must_use]
    pub fn movement_resistance(&self) -> f32 {
        properties_of(self.fore).movement_resistance
    }

    /// Base movement speed granted by this tile to supported entities.
    #[must_use]
    pub fn movement_speed(&self) -> f32 {
        properties_of(self.fore).movement_speed
    }
}

/// Location of a single tile expressed as signed column and row indices.
///
/// Signed so that window arithmetic around the world edges can go negative
/// before being clamped; the grid itself only stores non-negative indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePoint {
    x: i32,
    y: i32,
}

impl TilePoint {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Converts a world-space coordinate to the tile index containing it.
#[must_use]
pub fn tile_index(world_coordinate: f32) -> i32 {
    (world_coordinate / TILE_SIZE as f32).floor() as i32
}

/// Player slot inside the session roster; a stable identity for the
/// duration of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    /// Creates a slot from its numeric index.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric slot index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Source rectangle within the tileset texture for one tile variant.
///
/// Purely a rendering hint: the core computes it so that renderers do not
/// need to know the tileset layout, but nothing in the simulation reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceRect {
    /// Left edge in texture pixels.
    pub x: i32,
    /// Top edge in texture pixels.
    pub y: i32,
    /// Width in texture pixels.
    pub width: i32,
    /// Height in texture pixels.
    pub height: i32,
}

/// Computes the tileset source rectangle for a tile identifier and style.
///
/// Identifier `0` is empty and has no source; callers should skip drawing
/// it, but asking anyway yields the first cell.
#[must_use]
pub fn tile_source(id: u8, style: u8) -> SourceRect {
    let index = i32::from(id.saturating_sub(1));
    SourceRect {
        x: (index % TILESET_COLUMNS) * TEXTURE_SIZE,
        y: (index / TILESET_COLUMNS + i32::from(style)) * TEXTURE_SIZE,
        width: TEXTURE_SIZE,
        height: TEXTURE_SIZE,
    }
}

/// A stack of items occupying one inventory slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    key: String,
    stack: u32,
    max_stack: u32,
    tile: Option<TileKind>,
}

impl Item {
    /// Creates a new item stack.
    ///
    /// The stack count is clamped into `1..=max_stack` so the
    /// `0 < stack <= max_stack` invariant holds by construction.
    #[must_use]
    pub fn new(key: impl Into<String>, stack: u32, max_stack: u32) -> Self {
        let max_stack = max_stack.max(1);
        Self {
            key: key.into(),
            stack: stack.clamp(1, max_stack),
            max_stack,
            tile: None,
        }
    }

    /// Associates the item with a placeable tile kind.
    #[must_use]
    pub fn with_tile(mut self, tile: TileKind) -> Self {
        self.tile = Some(tile);
        self
    }

    /// Type identity of the item.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current stack count.
    #[must_use]
    pub const fn stack(&self) -> u32 {
        self.stack
    }

    /// Maximum stack count for this item type.
    #[must_use]
    pub const fn max_stack(&self) -> u32 {
        self.max_stack
    }

    /// Tile kind placed when the item is used, if any.
    #[must_use]
    pub const fn tile(&self) -> Option<TileKind> {
        self.tile
    }

    /// Clones the item with a different stack count.
    #[must_use]
    pub fn clone_with_stack(&self, stack: u32) -> Self {
        let mut item = self.clone();
        item.stack = stack.clamp(1, item.max_stack);
        item
    }
}

/// Fixed-capacity item storage attached to a player.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<Item>>,
}

impl Inventory {
    /// Creates an inventory with the provided number of slots.
    #[must_use]
    pub fn new(slots: usize) -> Self {
        Self {
            slots: vec![None; slots],
        }
    }

    /// Number of slots the inventory holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Adds an item, merging into existing partial stacks of the same key
    /// before opening empty slots. Returns the count that did not fit.
    pub fn add(&mut self, item: &Item) -> u32 {
        let mut remaining = item.stack();

        for slot in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if slot.key() != item.key() || slot.stack >= slot.max_stack {
                continue;
            }
            let accepted = (slot.max_stack - slot.stack).min(remaining);
            slot.stack += accepted;
            remaining -= accepted;
        }

        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_some() {
                continue;
            }
            let accepted = remaining.min(item.max_stack());
            *slot = Some(item.clone_with_stack(accepted));
            remaining -= accepted;
        }

        remaining
    }

    /// Replaces the contents of one slot.
    pub fn set(&mut self, slot: usize, item: Option<Item>) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = item;
        }
    }

    /// Empties one slot.
    pub fn clear(&mut self, slot: usize) {
        self.set(slot, None);
    }

    /// Retrieves the item occupying one slot, if any.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Item> {
        self.slots.get(slot).and_then(|entry| entry.as_ref())
    }

    /// Iterates the slots in order, empty slots included.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Item>> {
        self.slots.iter().map(|slot| slot.as_ref())
    }
}
