#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tile light propagation.
//!
//! Light relaxes toward a fixed point: each occupied tile takes the
//! brightest of its own emission and its brightest cardinal neighbor
//! minus that tile's attenuation, while fully empty tiles snap straight
//! to the ambient level. [`relax`] runs one in-place sweep over the
//! world's lighting window; [`settle`] iterates sweeps until nothing
//! changes; [`LightingTask`] runs sweeps continuously on a background
//! thread while a session is live.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread;
use std::time::Duration;

use tilefall_core::AMBIENT_LIGHT;
use tilefall_world::{Viewport, World};

/// Maximum relaxation sweeps the background task runs per wakeup.
pub const UPDATE_BATCH: usize = 16;

/// Default pause between background wakeups.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(50);

/// Runs one relaxation sweep over the world's lighting window.
///
/// Sweeps update in place, so light computed earlier in the sweep feeds
/// tiles later in it and convergence takes far fewer passes than a
/// double-buffered scheme would. Returns whether any tile changed.
pub fn relax(world: &mut World) -> bool {
    let viewport = *world.viewport();
    let min = viewport.light_min();
    let max = viewport.light_max();
    let mut changed = false;

    for x in min.x()..=max.x() {
        for y in min.y()..=max.y() {
            let Some(tile) = world.tile(x, y) else {
                continue;
            };

            let target = if tile.is_empty() {
                AMBIENT_LIGHT
            } else {
                let dim = if tile.fore() > 0 {
                    tile.fore_light_dim()
                } else {
                    tile.back_light_dim()
                };
                let brightest = [(0, -1), (1, 0), (0, 1), (-1, 0)]
                    .into_iter()
                    .map(|(dx, dy)| neighbor_light(world, &viewport, x + dx, y + dy))
                    .max()
                    .unwrap_or(0);
                brightest.saturating_sub(dim).max(tile.light_generated())
            };

            if tile.light() != target {
                changed = true;
                if let Some(tile) = world.tile_mut(x, y) {
                    tile.set_light(target);
                }
            }
        }
    }

    changed
}

/// Light contributed by a neighboring cell. Coordinates outside the
/// lighting window read as open sky: tiles beyond it hold stale light,
/// so sampling them would pull darkness into the window's border ring.
fn neighbor_light(world: &World, viewport: &Viewport, x: i32, y: i32) -> u16 {
    let min = viewport.light_min();
    let max = viewport.light_max();
    if x < min.x() || y < min.y() || x > max.x() || y > max.y() {
        return AMBIENT_LIGHT;
    }
    world.tile(x, y).map_or(AMBIENT_LIGHT, |tile| tile.light())
}

/// Runs sweeps until the window converges or `max_passes` is exhausted.
/// Returns the number of sweeps that made a change.
pub fn settle(world: &mut World, max_passes: usize) -> usize {
    for pass in 0..max_passes {
        if !relax(world) {
            return pass;
        }
    }
    max_passes
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct GateState {
    enabled: bool,
    shutdown: bool,
}

struct Gate {
    state: Mutex<GateState>,
    signal: Condvar,
}

/// Background thread that keeps the lighting window settled.
///
/// The task holds only a [`Weak`] reference to the world: it exits on
/// its own once the owning session drops the world, and it never blocks
/// the session from shutting down. Dropping the task stops the thread.
pub struct LightingTask {
    gate: Arc<Gate>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LightingTask {
    /// Spawns the background thread. It starts disabled; call
    /// [`LightingTask::set_enabled`] once the world holds real terrain.
    #[must_use]
    pub fn spawn(world: Weak<RwLock<World>>, period: Duration) -> Self {
        let gate = Arc::new(Gate {
            state: Mutex::new(GateState::default()),
            signal: Condvar::new(),
        });
        let worker_gate = Arc::clone(&gate);
        let handle = thread::spawn(move || run_worker(&worker_gate, &world, period));
        Self {
            gate,
            handle: Some(handle),
        }
    }

    /// Pauses or resumes the sweep loop without stopping the thread.
    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.gate.state).enabled = enabled;
        self.gate.signal.notify_all();
    }
}

impl Drop for LightingTask {
    fn drop(&mut self) {
        lock(&self.gate.state).shutdown = true;
        self.gate.signal.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(gate: &Gate, world: &Weak<RwLock<World>>, period: Duration) {
    tracing::debug!("lighting task started");
    loop {
        {
            let mut state = lock(&gate.state);
            while !state.enabled && !state.shutdown {
                state = gate
                    .signal
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if state.shutdown {
                break;
            }
        }

        let Some(world) = world.upgrade() else {
            tracing::debug!("lighting task exiting: world dropped");
            break;
        };
        {
            let mut world = world.write().unwrap_or_else(PoisonError::into_inner);
            for _ in 0..UPDATE_BATCH {
                if !relax(&mut world) {
                    break;
                }
            }
        }
        drop(world);
        thread::sleep(period);
    }
    tracing::debug!("lighting task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilefall_core::TileKind;

    fn boxed_world(size: i32) -> World {
        let mut world = World::new(size, size);
        for x in 0..size {
            for y in 0..size {
                if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                    world.set_fore(x, y, TileKind::Bedrock);
                    world.set_back(x, y, TileKind::Bedrock);
                }
            }
        }
        world
    }

    #[test]
    fn open_air_snaps_to_ambient_in_one_sweep() {
        let mut world = World::new(6, 6);
        assert!(relax(&mut world));
        assert_eq!(world.tile(3, 3).map(|t| t.light()), Some(AMBIENT_LIGHT));
        // Already converged.
        assert!(!relax(&mut world));
    }

    #[test]
    fn sealed_cavity_settles_to_darkness() {
        let mut world = boxed_world(9);
        for x in 1..8 {
            for y in 1..8 {
                world.set_back(x, y, TileKind::Stone);
            }
        }
        let _ = settle(&mut world, 64);
        for x in 1..8 {
            for y in 1..8 {
                assert_eq!(world.tile(x, y).map(|t| t.light()), Some(0));
            }
        }
    }

    #[test]
    fn torch_lights_a_sealed_cavity() {
        let mut world = boxed_world(9);
        for x in 1..8 {
            for y in 1..8 {
                world.set_back(x, y, TileKind::Stone);
            }
        }
        world.set_fore(4, 4, TileKind::Torch);
        let _ = settle(&mut world, 64);

        let torch = world.tile(4, 4).map(|t| t.light()).unwrap_or(0);
        assert_eq!(torch, TileKind::Torch.properties().light_emission);

        // Neighbors lose the torch tile's pass-through attenuation.
        let beside = world.tile(5, 4).map(|t| t.light()).unwrap_or(0);
        assert_eq!(beside, torch - TileKind::Stone.properties().back_dim);

        // Light falls off monotonically along the row.
        let further = world.tile(6, 4).map(|t| t.light()).unwrap_or(0);
        assert!(further < beside);
    }

    #[test]
    fn light_seeps_downward_from_the_surface() {
        let mut world = World::new(8, 12);
        // Solid dirt floor from row 6 down, sky above.
        for x in 0..8 {
            for y in 6..12 {
                world.set_fore(x, y, TileKind::Dirt);
                world.set_back(x, y, TileKind::Dirt);
            }
        }
        let _ = settle(&mut world, 64);

        let surface = world.tile(4, 6).map(|t| t.light()).unwrap_or(0);
        let fore_dim = TileKind::Dirt.properties().fore_dim;
        assert_eq!(surface, AMBIENT_LIGHT - fore_dim);

        let deeper = world.tile(4, 8).map(|t| t.light()).unwrap_or(0);
        assert_eq!(deeper, AMBIENT_LIGHT - 3 * fore_dim);
    }

    #[test]
    fn a_shrunk_window_reads_ambient_from_beyond_its_edge() {
        let mut world = World::new(50, 50);
        for x in 0..50 {
            for y in 0..50 {
                world.set_back(x, y, TileKind::Stone);
            }
        }
        // Camera over the world center: the lighting window covers only
        // an interior rectangle, and tiles outside it keep their initial
        // darkness.
        world.update_viewport(200.0, 200.0, 16.0, 16.0);
        let _ = settle(&mut world, 64);

        let min = world.viewport().light_min();
        assert!(min.x() > 0, "window should not touch the grid edge");
        assert_eq!(
            world.tile(min.x() - 2, 25).map(|t| t.light()),
            Some(0),
            "tiles outside the window stay untouched"
        );
        // The window's border column samples open sky past the edge, not
        // the stale darkness stored there.
        let expected = AMBIENT_LIGHT - TileKind::Stone.properties().back_dim;
        assert_eq!(world.tile(min.x(), 25).map(|t| t.light()), Some(expected));
    }

    #[test]
    fn settle_reports_convergence() {
        let mut world = World::new(6, 6);
        let passes = settle(&mut world, 64);
        assert!(passes < 64, "open air should converge almost immediately");
        assert_eq!(settle(&mut world, 64), 0);
    }
}
