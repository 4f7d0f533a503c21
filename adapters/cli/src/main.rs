#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line adapter: world generation surveys and an
//! in-process host/join demo.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::ensure;
use clap::{Parser, Subcommand};
use tilefall_core::TileKind;
use tilefall_loopback::pair;
use tilefall_system_lighting::{settle, LightingTask, DEFAULT_PERIOD};
use tilefall_system_sync::{ClientSession, ClientState, HostSession, DEFAULT_CAPACITY};
use tilefall_world::{query, Generator, World};

/// Tile-world sandbox toolkit.
#[derive(Parser)]
#[command(name = "tilefall", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generates a world and prints a survey of its terrain.
    Generate {
        /// World seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// World width in tiles.
        #[arg(long, default_value_t = 400)]
        width: i32,
        /// World height in tiles.
        #[arg(long, default_value_t = 200)]
        height: i32,
    },
    /// Hosts a world and joins it over the in-process loopback.
    Demo {
        /// World seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of 60 Hz simulation frames to run.
        #[arg(long, default_value_t = 600)]
        frames: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Command::Generate {
            seed,
            width,
            height,
        } => generate(seed, width, height),
        Command::Demo { seed, frames } => demo(seed, frames),
    }
}

fn generate(seed: u64, width: i32, height: i32) -> anyhow::Result<()> {
    ensure!(
        width > 2 && height > 2,
        "world dimensions must exceed the border ring"
    );
    let mut world = Generator::new(seed).generate(width, height);
    let spawn = world.spawn();
    println!(
        "seed {seed}: {width}x{height} tiles, spawn at ({}, {})",
        spawn.x(),
        spawn.y()
    );

    let surface: Vec<i32> = (1..width - 1)
        .filter_map(|x| query::topmost_solid(&world, x))
        .collect();
    if let (Some(highest), Some(lowest)) = (surface.iter().min(), surface.iter().max()) {
        println!("surface rows {highest}..{lowest}");
    }

    for kind in [
        TileKind::Grass,
        TileKind::Dirt,
        TileKind::Stone,
        TileKind::Log,
        TileKind::Leaves,
        TileKind::Bedrock,
    ] {
        println!("{kind:?}: {} tiles", query::count_fore(&world, kind));
    }

    let passes = settle(&mut world, 256);
    println!("lighting settled after {passes} sweeps");
    if let Some(light) = query::light_at(&world, spawn.x(), spawn.y()) {
        println!("light at spawn: {light}");
    }
    Ok(())
}

fn demo(seed: u64, frames: u32) -> anyhow::Result<()> {
    let world = Arc::new(RwLock::new(Generator::new(seed).generate(400, 200)));
    let lighting = LightingTask::spawn(Arc::downgrade(&world), DEFAULT_PERIOD);
    lighting.set_enabled(true);

    let mut host = HostSession::new(Arc::clone(&world), DEFAULT_CAPACITY);
    let (mut host_end, mut client_end) = pair();
    let mut client = ClientSession::new("demo");
    client.connect(&mut client_end);

    let dt = 1.0 / 60.0;
    for _ in 0..frames {
        host.tick(&mut host_end, dt);
        client.tick(&mut client_end, dt);
        if client.state() == &ClientState::Playing {
            if let Some(entity) = client.entity_mut() {
                // Drift right so the demo exercises the catch-up stream.
                let mut velocity = entity.velocity();
                velocity.x = 40.0;
                entity.set_velocity(velocity);
            }
        }
    }

    ensure!(
        client.state() == &ClientState::Playing,
        "client never reached playing: {:?}",
        client.state()
    );
    let entity = client
        .entity()
        .ok_or_else(|| anyhow::anyhow!("playing client without an entity"))?;
    println!(
        "demo complete after {frames} frames: client at {:?}, {} player(s) hosted",
        entity.world_position(),
        host.roster().len()
    );

    drop(lighting);
    let world: std::sync::RwLockReadGuard<'_, World> =
        world.read().unwrap_or_else(PoisonError::into_inner);
    let spawn = world.spawn();
    if let Some(light) = query::light_at(&world, spawn.x(), spawn.y()) {
        println!("light at spawn after the run: {light}");
    }
    Ok(())
}
