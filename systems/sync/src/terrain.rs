//! Capture and apply tile strips against a world grid.
//!
//! The host captures strips from its authoritative grid; clients apply
//! received strips to their local copy. Coordinates outside the grid are
//! clamped on capture and skipped on apply, so a malicious or stale
//! strip can never write out of bounds.

use tilefall_protocol::{TileCell, TileStrip};
use tilefall_world::World;

/// Captures one horizontal strip starting at `(x, y)`.
#[must_use]
pub fn capture_row(world: &World, x: i32, y: i32, width: i32) -> TileStrip {
    let cells = (0..width.max(0)).map(|dx| {
        world
            .tile(x + dx, y)
            .map_or_else(TileCell::default, TileCell::of)
    });
    TileStrip::compress(x.max(0) as u16, y.max(0) as u16, cells)
}

/// Captures one vertical strip starting at `(x, y)`, extending down.
#[must_use]
pub fn capture_column(world: &World, x: i32, y: i32, height: i32) -> TileStrip {
    let cells = (0..height.max(0)).map(|dy| {
        world
            .tile(x, y + dy)
            .map_or_else(TileCell::default, TileCell::of)
    });
    TileStrip::compress(x.max(0) as u16, y.max(0) as u16, cells)
}

/// Captures a rectangle as one row strip per covered row.
#[must_use]
pub fn capture_rectangle(world: &World, x: i32, y: i32, width: i32, height: i32) -> Vec<TileStrip> {
    (0..height.max(0))
        .map(|dy| capture_row(world, x, y + dy, width))
        .collect()
}

/// Writes a horizontal strip into the grid.
pub fn apply_row(world: &mut World, strip: &TileStrip) {
    let x = i32::from(strip.x());
    let y = i32::from(strip.y());
    for (dx, cell) in strip.cells().enumerate() {
        if let Some(tile) = world.tile_mut(x + dx as i32, y) {
            cell.apply(tile);
        }
    }
}

/// Writes a vertical strip into the grid.
pub fn apply_column(world: &mut World, strip: &TileStrip) {
    let x = i32::from(strip.x());
    let y = i32::from(strip.y());
    for (dy, cell) in strip.cells().enumerate() {
        if let Some(tile) = world.tile_mut(x, y + dy as i32) {
            cell.apply(tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilefall_core::TileKind;

    #[test]
    fn row_capture_and_apply_are_inverse() {
        let mut source = World::new(20, 10);
        for x in 3..9 {
            source.set_fore(x, 4, TileKind::Stone);
            source.set_back(x, 4, TileKind::Dirt);
        }
        let strip = capture_row(&source, 0, 4, 20);

        let mut target = World::new(20, 10);
        apply_row(&mut target, &strip);
        for x in 0..20 {
            assert_eq!(target.tile(x, 4), source.tile(x, 4));
        }
    }

    #[test]
    fn column_capture_transposes() {
        let mut source = World::new(10, 20);
        source.set_fore(5, 7, TileKind::Log);
        let strip = capture_column(&source, 5, 0, 20);
        assert_eq!(strip.len(), 20);

        let mut target = World::new(10, 20);
        apply_column(&mut target, &strip);
        assert_eq!(
            target.tile(5, 7).map(|tile| tile.fore()),
            Some(TileKind::Log.id())
        );
    }

    #[test]
    fn out_of_bounds_cells_are_skipped_on_apply() {
        let source = World::new(8, 8);
        let strip = capture_row(&source, 4, 4, 20);
        let mut small = World::new(6, 6);
        // Nothing to assert beyond "does not panic": the tail cells fall
        // off the smaller grid.
        apply_row(&mut small, &strip);
    }
}
