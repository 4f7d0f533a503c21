//! Read-only queries over the world grid.
//!
//! Free functions rather than methods so adapters and tests can observe
//! the grid without widening [`World`]'s own surface.

use tilefall_core::TileKind;

use crate::World;

/// Topmost solid row in a column, skipping the sealed border rows.
/// `None` when the interior of the column holds no solid ground.
#[must_use]
pub fn topmost_solid(world: &World, x: i32) -> Option<i32> {
    (1..world.height() - 1).find(|&y| world.is_solid(x, y))
}

/// Number of foreground tiles of the given kind across the whole grid.
#[must_use]
pub fn count_fore(world: &World, kind: TileKind) -> usize {
    let mut count = 0;
    for x in 0..world.width() {
        for y in 0..world.height() {
            if world.tile(x, y).map(|tile| tile.fore()) == Some(kind.id()) {
                count += 1;
            }
        }
    }
    count
}

/// Propagated light level at a coordinate, if in bounds.
#[must_use]
pub fn light_at(world: &World, x: i32, y: i32) -> Option<u16> {
    world.tile(x, y).map(|tile| tile.light())
}
