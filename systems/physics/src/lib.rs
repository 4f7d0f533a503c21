#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Axis-separated tile collision and entity integration.
//!
//! Entities are axis-aligned boxes moved one axis at a time: the whole
//! horizontal displacement first, then the vertical one. Each axis
//! advances in steps no longer than one tile so that no amount of
//! velocity can carry the box across a solid tile between two collision
//! tests. Because the axes never interact, sliding along a floor or
//! wall falls out of the resolution with no special cases.

use glam::Vec2;
use tilefall_core::{tile_index, Tile, TILE_SIZE};
use tilefall_world::World;

/// Downward acceleration applied to airborne entities, world units per
/// second squared.
pub const GRAVITY: f32 = 500.0;

/// Terminal downward velocity; gravity never accelerates past this.
pub const MAX_FALL_SPEED: f32 = 300.0;

/// Upward velocity granted by a jump from solid ground.
pub const JUMP_SPEED: f32 = 160.0;

/// Distance below the hitbox probed when testing for support.
const SUPPORT_PROBE: f32 = 1.0;

/// Margin subtracted from the far hitbox edge so a box resting exactly
/// on a tile boundary does not register inside the next tile.
const EDGE: f32 = 1e-3;

/// A movable axis-aligned box in the world.
///
/// The precise position is kept in floating point for integration; the
/// whole-unit position other systems observe (rendering, the wire) is
/// always its rounding, so the two can never drift apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    position: Vec2,
    velocity: Vec2,
    size: Vec2,
    collides_with_terrain: bool,
    is_falling: bool,
    on_ground: bool,
}

impl Entity {
    /// Creates an entity at rest that collides with terrain.
    #[must_use]
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size,
            collides_with_terrain: true,
            is_falling: false,
            on_ground: false,
        }
    }

    /// Enables or disables terrain collision for this entity.
    pub fn set_collides_with_terrain(&mut self, collides: bool) {
        self.collides_with_terrain = collides;
    }

    /// True while the last move carried the entity downward without
    /// landing.
    #[must_use]
    pub const fn is_falling(&self) -> bool {
        self.is_falling
    }

    /// True when the last move ended against solid ground.
    #[must_use]
    pub const fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Precise top-left corner used for integration.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Whole-unit position observed outside the physics step.
    #[must_use]
    pub fn world_position(&self) -> Vec2 {
        self.position.round()
    }

    /// Teleports the entity, discarding any accumulated sub-unit offset.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Current velocity in world units per second.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Overwrites the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Hitbox extents in world units.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }
}

/// Reports whether the box overlaps any solid foreground tile.
#[must_use]
pub fn overlaps_solid(world: &World, position: Vec2, size: Vec2) -> bool {
    let min_x = tile_index(position.x);
    let min_y = tile_index(position.y);
    let max_x = tile_index(position.x + size.x - EDGE);
    let max_y = tile_index(position.y + size.y - EDGE);
    for x in min_x..=max_x {
        for y in min_y..=max_y {
            if world.is_solid(x, y) {
                return true;
            }
        }
    }
    false
}

/// Moves the entity by `delta`, resolving collisions one axis at a time.
///
/// Each axis consumes its displacement in steps clamped to one tile
/// size. On the first step that lands in solid tiles the box backs off
/// in whole unit steps until clear, closes the remaining sub-unit gap
/// so it rests flush against the blocking tile, and the axis stops with
/// its velocity zeroed; any unconsumed displacement is dropped.
pub fn move_entity(world: &World, entity: &mut Entity, delta: Vec2) {
    if !entity.collides_with_terrain {
        entity.position += delta;
        return;
    }
    entity.on_ground = false;
    entity.is_falling = delta.y > 0.0;
    if move_axis(world, entity, Vec2::new(delta.x, 0.0)) {
        entity.velocity.x = 0.0;
    }
    if move_axis(world, entity, Vec2::new(0.0, delta.y)) {
        if delta.y > 0.0 {
            entity.on_ground = true;
            entity.is_falling = false;
        }
        entity.velocity.y = 0.0;
    }
}

fn move_axis(world: &World, entity: &mut Entity, delta: Vec2) -> bool {
    let tile = TILE_SIZE as f32;
    let mut remaining = delta;
    while remaining != Vec2::ZERO {
        let step = remaining.clamp(Vec2::splat(-tile), Vec2::splat(tile));
        let start = entity.position;
        entity.position += step;
        remaining -= step;
        if !overlaps_solid(world, entity.position, entity.size) {
            continue;
        }

        let back = -step.normalize();
        let mut backoff = 0;
        while overlaps_solid(world, entity.position, entity.size) {
            if backoff == TILE_SIZE {
                // Only reachable when the step began inside solid tiles
                // (a teleport into terrain); keep the starting position.
                entity.position = start;
                return true;
            }
            entity.position += back;
            backoff += 1;
        }
        snap_flush(entity, step);
        return true;
    }
    false
}

/// After whole-unit backoff the box sits less than a unit short of the
/// tile it hit; snap the leading edge onto that tile's boundary.
fn snap_flush(entity: &mut Entity, delta: Vec2) {
    let tile = TILE_SIZE as f32;
    if delta.x > 0.0 {
        let leading = entity.position.x + entity.size.x;
        let boundary = (leading / tile).ceil() * tile;
        if boundary - leading < 1.0 {
            entity.position.x = boundary - entity.size.x;
        }
    } else if delta.x < 0.0 {
        let boundary = (entity.position.x / tile).floor() * tile;
        if entity.position.x - boundary < 1.0 {
            entity.position.x = boundary;
        }
    } else if delta.y > 0.0 {
        let leading = entity.position.y + entity.size.y;
        let boundary = (leading / tile).ceil() * tile;
        if boundary - leading < 1.0 {
            entity.position.y = boundary - entity.size.y;
        }
    } else {
        let boundary = (entity.position.y / tile).floor() * tile;
        if entity.position.y - boundary < 1.0 {
            entity.position.y = boundary;
        }
    }
}

/// The tile directly beneath the entity's bottom-center, which supplies
/// ground resistance and movement speed.
#[must_use]
pub fn support_tile<'a>(world: &'a World, entity: &Entity) -> Option<&'a Tile> {
    let center = entity.position.x + entity.size.x / 2.0;
    let below = entity.position.y + entity.size.y + SUPPORT_PROBE;
    world.tile(tile_index(center), tile_index(below))
}

/// Advances one entity by `dt` seconds: gravity, ground resistance, then
/// the axis-separated move.
pub fn update_entity(world: &World, entity: &mut Entity, dt: f32) {
    entity.velocity.y = (entity.velocity.y + GRAVITY * dt).min(MAX_FALL_SPEED);

    // The tile under the feet decelerates horizontal motion; over open
    // air that tile is air, whose low resistance acts as drag.
    let resistance = support_tile(world, entity)
        .map_or_else(|| Tile::EMPTY.movement_resistance(), Tile::movement_resistance);
    let decel = resistance * dt;
    if entity.velocity.x.abs() <= decel {
        entity.velocity.x = 0.0;
    } else {
        entity.velocity.x -= decel * entity.velocity.x.signum();
    }

    let delta = entity.velocity * dt;
    move_entity(world, entity, delta);
}

/// Sets horizontal velocity from a walk input in `-1..=1`, scaled by the
/// supporting tile's movement speed.
pub fn walk(world: &World, entity: &mut Entity, direction: f32) {
    let speed = support_tile(world, entity).map_or_else(
        || Tile::EMPTY.movement_speed(),
        Tile::movement_speed,
    );
    entity.velocity.x = direction.clamp(-1.0, 1.0) * speed;
}

/// Starts a jump if the entity landed on its last move.
pub fn jump(entity: &mut Entity) {
    if entity.on_ground {
        entity.velocity.y = -JUMP_SPEED;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilefall_core::TileKind;

    /// Open 40x40-tile arena with a solid floor at tile row 20.
    fn arena_with_floor() -> World {
        let mut world = World::new(40, 40);
        for x in 0..40 {
            world.set_fore(x, 20, TileKind::Stone);
        }
        world
    }

    fn player_at(x: f32, y: f32) -> Entity {
        Entity::new(Vec2::new(x, y), Vec2::new(8.0, 16.0))
    }

    #[test]
    fn world_position_is_the_rounded_precise_position() {
        let mut entity = player_at(10.4, 7.6);
        assert_eq!(entity.world_position(), Vec2::new(10.0, 8.0));
        entity.set_position(Vec2::new(-0.5, 3.5));
        assert_eq!(entity.world_position(), entity.position().round());
    }

    #[test]
    fn falling_entity_lands_flush_on_the_floor() {
        let world = arena_with_floor();
        // Floor top is at 20 * TILE_SIZE = 160 world units.
        let mut entity = player_at(100.0, 100.0);
        for _ in 0..200 {
            update_entity(&world, &mut entity, 1.0 / 60.0);
        }
        assert_eq!(entity.position().y + entity.size().y, 160.0);
        assert_eq!(entity.velocity().y, 0.0);
        assert!(entity.on_ground());
        assert!(!entity.is_falling());
    }

    /// Arena with a one-tile wall in column 10 (world x 80..88).
    fn walled_arena() -> World {
        let mut world = arena_with_floor();
        for y in 0..20 {
            world.set_fore(10, y, TileKind::Stone);
        }
        world
    }

    #[test]
    fn wall_stops_horizontal_motion_flush() {
        let world = walled_arena();
        let mut entity = player_at(68.0, 140.0);
        entity.set_velocity(Vec2::new(500.0, 0.0));

        // 500 * 0.016 = 8 units of travel, four past the wall face.
        move_entity(&world, &mut entity, Vec2::new(500.0 * 0.016, 0.0));

        assert_eq!(entity.position().x + entity.size().x, 80.0);
        assert_eq!(entity.velocity().x, 0.0);
    }

    #[test]
    fn a_thin_wall_is_never_jumped_in_one_move() {
        let world = walled_arena();
        // Applied in a single jump, 80 units from x=40 would land the box
        // at 120..128, entirely past the one-tile wall with no overlap at
        // the endpoint. The tile-clamped stepping must still detect it.
        let mut entity = player_at(40.0, 140.0);
        entity.set_velocity(Vec2::new(80.0, 0.0));
        move_entity(&world, &mut entity, Vec2::new(80.0, 0.0));

        assert_eq!(entity.position().x + entity.size().x, 80.0);
        assert_eq!(entity.velocity().x, 0.0);
    }

    #[test]
    fn one_second_at_velocity_500_stops_flush_at_the_wall() {
        let world = walled_arena();
        let mut entity = player_at(40.0, 140.0);
        entity.set_velocity(Vec2::new(500.0, 0.0));
        move_entity(&world, &mut entity, Vec2::new(500.0, 0.0));

        assert_eq!(entity.position().x + entity.size().x, 80.0);
        assert_eq!(entity.velocity().x, 0.0);
    }

    #[test]
    fn axis_separation_slides_along_the_floor() {
        let world = arena_with_floor();
        let mut entity = player_at(100.0, 144.0);
        entity.set_velocity(Vec2::new(80.0, 0.0));

        // Resting on the floor: gravity pushes down, the vertical axis
        // blocks, and horizontal motion carries on unimpeded.
        move_entity(&world, &mut entity, Vec2::new(2.0, 1.0));
        assert_eq!(entity.position().x, 102.0);
        assert_eq!(entity.position().y, 144.0);
        assert_eq!(entity.velocity().x, 80.0);
        assert_eq!(entity.velocity().y, 0.0);
    }

    #[test]
    fn a_move_that_starts_inside_solid_is_discarded() {
        let mut world = arena_with_floor();
        for y in 0..20 {
            for x in 10..40 {
                world.set_fore(x, y, TileKind::Stone);
            }
        }
        // Teleported into the middle of the solid block: no amount of
        // backoff frees the box, so the move is abandoned in place.
        let mut entity = player_at(100.0, 100.0);
        entity.set_velocity(Vec2::new(50.0, 0.0));
        move_entity(&world, &mut entity, Vec2::new(20.0, 0.0));
        assert_eq!(entity.position().x, 100.0);
        assert_eq!(entity.velocity().x, 0.0);
    }

    #[test]
    fn a_long_move_into_a_solid_region_stops_at_its_face() {
        let mut world = arena_with_floor();
        for y in 0..20 {
            for x in 10..40 {
                world.set_fore(x, y, TileKind::Stone);
            }
        }
        let mut entity = player_at(40.0, 100.0);
        // 100 units of travel reaches deep into the region; the box must
        // stop flush against its left face at x=80, not stay at 40.
        move_entity(&world, &mut entity, Vec2::new(100.0, 0.0));
        assert_eq!(entity.position().x + entity.size().x, 80.0);
    }

    #[test]
    fn jump_requires_ground_contact() {
        let world = arena_with_floor();
        let mut grounded = player_at(100.0, 144.0);
        update_entity(&world, &mut grounded, 1.0 / 60.0);
        assert!(grounded.on_ground());
        jump(&mut grounded);
        assert_eq!(grounded.velocity().y, -JUMP_SPEED);

        let mut airborne = player_at(100.0, 40.0);
        update_entity(&world, &mut airborne, 1.0 / 60.0);
        assert!(!airborne.on_ground());
        assert!(airborne.is_falling());
        let before = airborne.velocity().y;
        jump(&mut airborne);
        assert_eq!(airborne.velocity().y, before);
    }

    #[test]
    fn ghost_entities_pass_through_terrain() {
        let world = arena_with_floor();
        let mut entity = player_at(100.0, 150.0);
        entity.set_collides_with_terrain(false);
        move_entity(&world, &mut entity, Vec2::new(0.0, 40.0));
        assert_eq!(entity.position().y, 190.0);
    }

    #[test]
    fn ground_resistance_brings_a_slide_to_rest() {
        let world = arena_with_floor();
        let mut entity = player_at(100.0, 144.0);
        walk(&world, &mut entity, 1.0);
        assert!(entity.velocity().x > 0.0);

        for _ in 0..120 {
            update_entity(&world, &mut entity, 1.0 / 60.0);
        }
        assert_eq!(entity.velocity().x, 0.0);
    }

    #[test]
    fn resting_on_a_boundary_does_not_count_as_overlap() {
        let world = arena_with_floor();
        // Bottom edge exactly on the floor top at y = 160.
        assert!(!overlaps_solid(
            &world,
            Vec2::new(100.0, 144.0),
            Vec2::new(8.0, 16.0)
        ));
        assert!(overlaps_solid(
            &world,
            Vec2::new(100.0, 144.5),
            Vec2::new(8.0, 16.0)
        ));
    }
}
