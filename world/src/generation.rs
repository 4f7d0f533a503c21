//! Seeded procedural terrain generation.
//!
//! A single column sweep lays the terrain bands (grass surface, dirt
//! band, stone below), later passes plant trees, carve cave tunnels,
//! seal the bedrock border, compute border styles, and finally clear a
//! guaranteed-safe spawn area. Every random draw comes from one seeded
//! stream, so a seed fully determines the world.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilefall_core::{TileKind, TilePoint};

use crate::World;

/// Deterministic world generator.
pub struct Generator {
    rng: ChaCha8Rng,
}

impl Generator {
    /// Creates a generator whose output is fully determined by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generates a complete world of the given dimensions.
    #[must_use]
    pub fn generate(&mut self, width: i32, height: i32) -> World {
        let mut world = World::new(width, height);
        let surfaces = self.lay_terrain(&mut world);
        self.plant_trees(&mut world, &surfaces);
        self.carve_caves(&mut world, &surfaces);
        seal_border(&mut world);
        apply_styles(&mut world);
        secure_spawn(&mut world, &surfaces);
        world
    }

    /// Sweeps the interior columns left to right, walking the surface
    /// height inside its band and filling grass, dirt, and stone beneath
    /// it. The border ring is reserved for [`seal_border`]. Returns the
    /// surface row chosen for each column.
    fn lay_terrain(&mut self, world: &mut World) -> Vec<i32> {
        let width = world.width();
        let height = world.height();
        let base = height / 4;
        let variance = (height / 10).max(1);
        let min_surface = (base - variance).max(2);
        let max_surface = base + variance;

        let mut surface = base;
        let mut hold: i32 = 0;
        let mut surfaces = vec![base; width as usize];

        for x in 1..width - 1 {
            if x > 1 {
                if self.rng.gen_ratio(1, 100) {
                    // Cliff: a large jump with a pocket carved at the face.
                    let jump = self.rng.gen_range(10..=20);
                    let target = if self.rng.gen() {
                        surface + jump
                    } else {
                        surface - jump
                    };
                    let target = target.clamp(min_surface, max_surface);
                    let low = surface.min(target);
                    let high = surface.max(target);
                    surface = target;
                    hold = 3;
                    surfaces[x as usize] = surface;
                    self.fill_column(world, x, surface, height);
                    for y in (low + 1)..high {
                        if let Some(tile) = world.tile_mut(x, y) {
                            tile.set_fore_id(0);
                        }
                    }
                    continue;
                } else if hold > 0 {
                    hold -= 1;
                } else if self.rng.gen_ratio(3, 10) {
                    let step = if self.rng.gen() { 1 } else { -1 };
                    surface = (surface + step).clamp(min_surface, max_surface);
                    hold = 1;
                }
            }
            surfaces[x as usize] = surface;
            self.fill_column(world, x, surface, height);
        }

        surfaces
    }

    fn fill_column(&mut self, world: &mut World, x: i32, surface: i32, height: i32) {
        let dirt_floor = surface + self.rng.gen_range(10..=15);
        for y in surface..height - 1 {
            let fore = if y == surface {
                TileKind::Grass
            } else if y <= dirt_floor {
                TileKind::Dirt
            } else {
                TileKind::Stone
            };
            let back = if y <= dirt_floor {
                TileKind::Dirt
            } else {
                TileKind::Stone
            };
            world.set_fore(x, y, fore);
            world.set_back(x, y, back);
        }
    }

    /// Plants trees on flat grass, keeping a minimum spacing between
    /// trunks. Two canopy shapes give the forest some variety.
    fn plant_trees(&mut self, world: &mut World, surfaces: &[i32]) {
        let mut tree_space = 0;
        for x in 2..world.width() - 2 {
            let surface = surfaces[x as usize];
            tree_space += 1;
            if tree_space < 4 || !self.rng.gen_ratio(1, 5) {
                continue;
            }
            let on_grass = world
                .tile(x, surface)
                .map_or(false, |tile| tile.fore() == TileKind::Grass.id());
            if !on_grass {
                continue;
            }
            let trunk = self.rng.gen_range(15..=25).min(surface - 3);
            if trunk < 4 {
                continue;
            }
            // Grow upward, stopping early at any occupied foreground
            // (a neighboring canopy, usually).
            let mut top = surface;
            for y in ((surface - trunk)..surface).rev() {
                let occupied = world.tile(x, y).map_or(true, |tile| tile.fore() != 0);
                if occupied {
                    break;
                }
                world.set_fore(x, y, TileKind::Log);
                top = y;
            }
            if surface - top < 4 {
                continue;
            }
            if self.rng.gen() {
                // Wide, rounded canopy.
                grow_canopy(world, x, top, 2, -3..=1);
            } else {
                // Tall, narrow canopy.
                grow_canopy(world, x, top, 1, -5..=1);
            }
            tree_space = 0;
        }
    }

    /// Seeds cave tunnels inside the stone band (deeper tiles seed more
    /// often) and random-walks a short carving tunnel from each seed.
    fn carve_caves(&mut self, world: &mut World, surfaces: &[i32]) {
        let height = world.height();
        let mut seeds = Vec::new();
        for x in 1..world.width() - 1 {
            let surface = surfaces[x as usize];
            for y in (surface + 5)..(height - 1) {
                let depth = (y - surface) as u32;
                if self.rng.gen_ratio(depth.min(40), 4000) {
                    seeds.push(TilePoint::new(x, y));
                }
            }
        }
        for seed in seeds {
            self.carve_tunnel(world, seed);
        }
    }

    fn carve_tunnel(&mut self, world: &mut World, start: TilePoint) {
        let mut x = start.x();
        let mut y = start.y();
        let steps = self.rng.gen_range(12..=40);
        for _ in 0..steps {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let (cx, cy) = (x + dx, y + dy);
                    if cx <= 0 || cy <= 0 || cx >= world.width() - 1 || cy >= world.height() - 1 {
                        continue;
                    }
                    if let Some(tile) = world.tile_mut(cx, cy) {
                        tile.set_fore_id(0);
                    }
                }
            }
            match self.rng.gen_range(0..4) {
                0 => x -= 1,
                1 => x += 1,
                2 => y -= 1,
                _ => y += 1,
            }
            x = x.clamp(1, world.width() - 2);
            y = y.clamp(2, world.height() - 2);
        }
    }
}

fn grow_canopy(
    world: &mut World,
    x: i32,
    top: i32,
    half_width: i32,
    rows: std::ops::RangeInclusive<i32>,
) {
    for dy in rows {
        for dx in -half_width..=half_width {
            let (cx, cy) = (x + dx, top + dy);
            if cx <= 0 || cy <= 0 || cx >= world.width() - 1 || cy >= world.height() - 1 {
                continue;
            }
            if let Some(tile) = world.tile_mut(cx, cy) {
                if tile.fore() == 0 {
                    tile.set_fore(TileKind::Leaves);
                }
            }
        }
    }
}

/// Writes bedrock into the outermost ring in both layers. The interior
/// passes never touch the ring; this is its only writer.
fn seal_border(world: &mut World) {
    let width = world.width();
    let height = world.height();
    for x in 0..width {
        for y in 0..height {
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                world.set_fore(x, y, TileKind::Bedrock);
                world.set_back(x, y, TileKind::Bedrock);
            }
        }
    }
}

/// Recomputes the border-variant style bytes for every occupied tile
/// from its final neighborhood, in both layers.
fn apply_styles(world: &mut World) {
    for x in 0..world.width() {
        for y in 0..world.height() {
            let fore_style = world.border_style(x, y);
            let back_style = world.back_border_style(x, y);
            if let Some(tile) = world.tile_mut(x, y) {
                if tile.fore() != 0 {
                    tile.set_fore_style(fore_style);
                }
                if tile.back() != 0 {
                    tile.set_back_style(back_style);
                }
            }
        }
    }
}

/// Clears a standing-height pocket at the world's horizontal center and
/// guarantees solid ground directly beneath it, then records the spawn.
/// Cave carving can undermine any column, so the ground is re-filled
/// with dirt when missing.
fn secure_spawn(world: &mut World, surfaces: &[i32]) {
    let x = world.width() / 2;
    let surface = surfaces[x as usize];
    let spawn = TilePoint::new(x, surface - 3);
    for y in (spawn.y() - 2).max(1)..=(spawn.y() + 2) {
        if let Some(tile) = world.tile_mut(x, y) {
            tile.set_fore_id(0);
        }
    }
    if !world.is_solid(x, spawn.y() + 3) {
        world.set_fore(x, spawn.y() + 3, TileKind::Dirt);
    }
    world.set_spawn(spawn);
}
