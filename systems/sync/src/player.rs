//! Server-side player record.

use glam::Vec2;
use tilefall_core::{tile_index, Inventory, PlayerSlot, INVENTORY_SLOTS, TILE_SIZE};
use tilefall_system_physics::Entity;

use crate::ports::PeerId;

/// Hitbox extents of a player, in world units.
pub const PLAYER_SIZE: Vec2 = Vec2::new(6.0, 14.0);

/// One connected player: an entity plus identity, inventory, and the
/// tile coordinates the incremental terrain sync last caught up to.
#[derive(Clone, Debug)]
pub struct Player {
    entity: Entity,
    name: String,
    slot: PlayerSlot,
    peer: PeerId,
    inventory: Inventory,
    last_tile_x: i32,
    last_tile_y: i32,
}

impl Player {
    /// Creates a player standing at a tile coordinate.
    #[must_use]
    pub fn new(name: impl Into<String>, slot: PlayerSlot, peer: PeerId, tile_x: i32, tile_y: i32) -> Self {
        let position = Vec2::new(
            (tile_x * TILE_SIZE) as f32,
            (tile_y * TILE_SIZE) as f32 - PLAYER_SIZE.y,
        );
        Self {
            entity: Entity::new(position, PLAYER_SIZE),
            name: name.into(),
            slot,
            peer,
            inventory: Inventory::new(INVENTORY_SLOTS),
            last_tile_x: tile_x,
            last_tile_y: tile_y,
        }
    }

    /// The player's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The player's roster slot.
    #[must_use]
    pub const fn slot(&self) -> PlayerSlot {
        self.slot
    }

    /// The transport peer this player arrived through.
    #[must_use]
    pub const fn peer(&self) -> PeerId {
        self.peer
    }

    /// The player's physics body.
    #[must_use]
    pub const fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Mutable access to the physics body.
    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    /// The player's inventory.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Mutable access to the inventory.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Tile column containing the player's observed position.
    #[must_use]
    pub fn tile_x(&self) -> i32 {
        tile_index(self.entity.world_position().x)
    }

    /// Tile row containing the player's observed position.
    #[must_use]
    pub fn tile_y(&self) -> i32 {
        tile_index(self.entity.world_position().y)
    }

    /// Column the terrain sync last caught up to.
    #[must_use]
    pub const fn last_tile_x(&self) -> i32 {
        self.last_tile_x
    }

    /// Row the terrain sync last caught up to.
    #[must_use]
    pub const fn last_tile_y(&self) -> i32 {
        self.last_tile_y
    }

    /// Records sync progress along the X axis.
    pub fn set_last_tile_x(&mut self, tile_x: i32) {
        self.last_tile_x = tile_x;
    }

    /// Records sync progress along the Y axis.
    pub fn set_last_tile_y(&mut self, tile_y: i32) {
        self.last_tile_y = tile_y;
    }
}
