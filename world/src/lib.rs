#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tile grid for Tilefall.
//!
//! The [`World`] owns the dense tile array, the spawn point selected by
//! generation, and the viewport bookkeeping that scopes per-frame work
//! (rendering and lighting) to a bounded window around the camera. All
//! access is bounds-checked; out-of-range queries return `None` rather
//! than panicking so callers can substitute their own sentinels.

mod generation;
pub mod query;

pub use generation::Generator;

use tilefall_core::{Tile, TileKind, TilePoint, TILE_SIZE};

/// Number of tiles the lighting window extends past the camera window on
/// every side, so light settles before tiles scroll into view.
pub const LIGHT_BUFFER: i32 = 16;

/// The world grid plus session-scoped bookkeeping.
#[derive(Clone, Debug)]
pub struct World {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    spawn: TilePoint,
    viewport: Viewport,
}

impl World {
    /// Creates an empty world of the provided dimensions.
    ///
    /// # Panics
    ///
    /// Dimensions of two tiles or fewer cannot hold the border ring plus
    /// any interior and indicate a programming error.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        assert!(
            width > 2 && height > 2,
            "world dimensions must exceed the border ring"
        );
        let capacity = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tiles: vec![Tile::EMPTY; capacity],
            spawn: TilePoint::new(width / 2, height / 2),
            viewport: Viewport::covering(width, height),
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Tile coordinates of the safe spawn location.
    #[must_use]
    pub const fn spawn(&self) -> TilePoint {
        self.spawn
    }

    /// Records the spawn location selected by generation or received from
    /// the server.
    pub fn set_spawn(&mut self, spawn: TilePoint) {
        self.spawn = spawn;
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some((x as usize) * (self.height as usize) + (y as usize))
        } else {
            None
        }
    }

    /// Reads the tile at the coordinate, if in bounds.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.index(x, y).map(|index| &self.tiles[index])
    }

    /// Mutable access to the tile at the coordinate, if in bounds.
    #[must_use]
    pub fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        self.index(x, y).map(move |index| &mut self.tiles[index])
    }

    /// Reports whether the foreground at the coordinate blocks movement.
    /// Out-of-bounds coordinates count as solid so entities cannot leave
    /// the grid even if the border ring were damaged.
    #[must_use]
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).map_or(true, Tile::is_solid)
    }

    /// Replaces the foreground layer at the coordinate.
    pub fn set_fore(&mut self, x: i32, y: i32, kind: TileKind) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.set_fore(kind);
        }
    }

    /// Replaces the background layer at the coordinate.
    pub fn set_back(&mut self, x: i32, y: i32, kind: TileKind) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.set_back(kind);
        }
    }

    /// Computes the border-variant style for the foreground layer at the
    /// coordinate.
    ///
    /// The style encodes which of the eight neighbors join this tile's
    /// foreground type: cardinal neighbors contribute bits, and diagonal
    /// neighbors refine specific cardinal combinations into dedicated
    /// variants. Border-ring tiles always report style zero.
    #[must_use]
    pub fn border_style(&self, x: i32, y: i32) -> u8 {
        self.layer_style(x, y, Tile::fore)
    }

    /// Computes the border-variant style for the background layer, using
    /// the same neighbor encoding as [`World::border_style`].
    #[must_use]
    pub fn back_border_style(&self, x: i32, y: i32) -> u8 {
        self.layer_style(x, y, Tile::back)
    }

    fn layer_style(&self, x: i32, y: i32, layer: fn(&Tile) -> u8) -> u8 {
        if x <= 0 || y <= 0 || x >= self.width - 1 || y >= self.height - 1 {
            return 0;
        }
        let Some(tile) = self.tile(x, y) else {
            return 0;
        };

        let joins = |dx: i32, dy: i32| {
            self.tile(x + dx, y + dy)
                .map_or(false, |neighbor| layer(neighbor) == layer(tile))
        };

        let mut style: u8 = 0;
        if joins(0, -1) {
            style += 1;
        }
        if joins(1, 0) {
            style += 2;
        }
        if joins(0, 1) {
            style += 4;
        }
        if joins(-1, 0) {
            style += 8;
        }
        if joins(1, -1) {
            style = match style {
                0 => 16,
                4 => 17,
                8 => 18,
                12 => 19,
                other => other,
            };
        }
        if joins(1, 1) {
            style = match style {
                0 => 20,
                1 => 21,
                8 => 22,
                9 => 23,
                16 => 32,
                18 => 33,
                other => other,
            };
        }
        if joins(-1, 1) {
            style = match style {
                0 => 24,
                1 => 25,
                2 => 26,
                3 => 27,
                16 => 34,
                20 => 42,
                21 => 44,
                32 => 35,
                other => other,
            };
        }
        if joins(-1, -1) {
            style = match style {
                0 => 28,
                2 => 29,
                4 => 30,
                6 => 31,
                16 => 37,
                17 => 38,
                20 => 40,
                24 => 39,
                26 => 41,
                35 => 43,
                42 => 36,
                other => other,
            };
        }
        style
    }

    /// Current camera/lighting window bookkeeping.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Recomputes the camera and lighting windows from a camera position
    /// and half-extents, all expressed in world units.
    pub fn update_viewport(
        &mut self,
        camera_x: f32,
        camera_y: f32,
        half_width: f32,
        half_height: f32,
    ) {
        let tile = TILE_SIZE as f32;
        let cam_min_x = (((camera_x - half_width) / tile).floor() as i32 - 1).max(0);
        let cam_min_y = (((camera_y - half_height) / tile).floor() as i32 - 1).max(0);
        let cam_max_x = (((camera_x + half_width) / tile).ceil() as i32).min(self.width - 1);
        let cam_max_y = (((camera_y + half_height) / tile).ceil() as i32).min(self.height - 1);
        self.viewport = Viewport {
            cam_min: TilePoint::new(cam_min_x, cam_min_y),
            cam_max: TilePoint::new(cam_max_x, cam_max_y),
            light_min: TilePoint::new(
                (cam_min_x - LIGHT_BUFFER).max(0),
                (cam_min_y - LIGHT_BUFFER).max(0),
            ),
            light_max: TilePoint::new(
                (cam_max_x + LIGHT_BUFFER).min(self.width - 1),
                (cam_max_y + LIGHT_BUFFER).min(self.height - 1),
            ),
        };
    }
}

/// Visible and light-update tile bounds derived from the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    cam_min: TilePoint,
    cam_max: TilePoint,
    light_min: TilePoint,
    light_max: TilePoint,
}

impl Viewport {
    /// A viewport spanning the entire grid, used before any camera update
    /// arrives (headless servers never shrink it).
    #[must_use]
    pub const fn covering(width: i32, height: i32) -> Self {
        Self {
            cam_min: TilePoint::new(0, 0),
            cam_max: TilePoint::new(width - 1, height - 1),
            light_min: TilePoint::new(0, 0),
            light_max: TilePoint::new(width - 1, height - 1),
        }
    }

    /// Upper-left corner of the visible tile window.
    #[must_use]
    pub const fn cam_min(&self) -> TilePoint {
        self.cam_min
    }

    /// Lower-right corner of the visible tile window.
    #[must_use]
    pub const fn cam_max(&self) -> TilePoint {
        self.cam_max
    }

    /// Upper-left corner of the lighting update window.
    #[must_use]
    pub const fn light_min(&self) -> TilePoint {
        self.light_min
    }

    /// Lower-right corner of the lighting update window.
    #[must_use]
    pub const fn light_max(&self) -> TilePoint {
        self.light_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "border ring")]
    fn rejects_degenerate_dimensions() {
        let _ = World::new(2, 50);
    }

    #[test]
    fn out_of_bounds_tiles_are_none_and_solid() {
        let world = World::new(10, 10);
        assert!(world.tile(-1, 0).is_none());
        assert!(world.tile(10, 0).is_none());
        assert!(world.is_solid(-1, 0));
        assert!(world.is_solid(0, 10));
    }

    #[test]
    fn border_style_counts_cardinal_joins() {
        let mut world = World::new(8, 8);
        for (x, y) in [(3, 3), (3, 2), (4, 3), (3, 4), (2, 3)] {
            world.set_fore(x, y, TileKind::Dirt);
        }
        // All four cardinal neighbors join: 1 + 2 + 4 + 8.
        assert_eq!(world.border_style(3, 3), 15);
    }

    #[test]
    fn border_style_is_zero_on_the_ring() {
        let mut world = World::new(8, 8);
        world.set_fore(0, 3, TileKind::Bedrock);
        assert_eq!(world.border_style(0, 3), 0);
        assert_eq!(world.border_style(7, 7), 0);
    }

    #[test]
    fn diagonal_joins_refine_the_style() {
        let mut world = World::new(8, 8);
        world.set_fore(3, 3, TileKind::Stone);
        world.set_fore(4, 2, TileKind::Stone);
        // No cardinal joins, upper-right joins: dedicated variant 16.
        assert_eq!(world.border_style(3, 3), 16);
    }

    #[test]
    fn back_style_follows_the_background_layer() {
        let mut world = World::new(8, 8);
        // Foreground joins on all four sides, background only below.
        for (x, y) in [(3, 3), (3, 2), (4, 3), (3, 4), (2, 3)] {
            world.set_fore(x, y, TileKind::Dirt);
        }
        world.set_back(3, 3, TileKind::Stone);
        world.set_back(3, 4, TileKind::Stone);
        assert_eq!(world.border_style(3, 3), 15);
        assert_eq!(world.back_border_style(3, 3), 4);
    }

    #[test]
    fn viewport_windows_clamp_to_the_grid() {
        let mut world = World::new(100, 60);
        world.update_viewport(0.0, 0.0, 40.0, 24.0);
        let viewport = *world.viewport();
        assert_eq!(viewport.cam_min(), TilePoint::new(0, 0));
        assert!(viewport.cam_max().x() >= 5);
        assert_eq!(viewport.light_min(), TilePoint::new(0, 0));
        assert!(viewport.light_max().x() <= 99);
    }

    #[test]
    fn lighting_window_pads_the_camera_window() {
        let mut world = World::new(200, 120);
        world.update_viewport(800.0, 480.0, 80.0, 48.0);
        let viewport = *world.viewport();
        assert_eq!(
            viewport.light_min().x(),
            viewport.cam_min().x() - LIGHT_BUFFER
        );
        assert_eq!(
            viewport.light_max().y(),
            viewport.cam_max().y() + LIGHT_BUFFER
        );
    }
}
