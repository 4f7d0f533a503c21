//! Host and client sessions exercised over the loopback transport.

use std::sync::{Arc, RwLock};

use tilefall_core::{TileKind, TILE_SIZE};
use tilefall_loopback::{pair, LoopbackTransport};
use tilefall_protocol::TileCell;
use tilefall_system_sync::{
    ClientSession, ClientState, HostSession, DEFAULT_CAPACITY, POSITION_INTERVAL,
};
use tilefall_world::{Generator, World};

fn hosted_world(seed: u64) -> Arc<RwLock<World>> {
    Arc::new(RwLock::new(Generator::new(seed).generate(100, 50)))
}

fn settle(
    host: &mut HostSession,
    host_end: &mut LoopbackTransport,
    client: &mut ClientSession,
    client_end: &mut LoopbackTransport,
) {
    for _ in 0..3 {
        host.tick(host_end, 0.0);
        client.tick(client_end, 0.0);
    }
}

fn joined_pair(
    world: Arc<RwLock<World>>,
) -> (HostSession, LoopbackTransport, ClientSession, LoopbackTransport) {
    let mut host = HostSession::new(world, DEFAULT_CAPACITY);
    let (mut host_end, mut client_end) = pair();
    let mut client = ClientSession::new("miner");
    client.connect(&mut client_end);
    settle(&mut host, &mut host_end, &mut client, &mut client_end);
    (host, host_end, client, client_end)
}

#[test]
fn handshake_reaches_playing_with_a_matching_world() {
    let world = hosted_world(42);
    let (host, _host_end, client, _client_end) = joined_pair(Arc::clone(&world));

    assert_eq!(client.state(), &ClientState::Playing);
    assert_eq!(client.progress(), 1.0);
    assert_eq!(host.roster().len(), 1);

    let source = world.read().expect("world lock");
    let mirror = client.world().expect("client world");
    for x in 0..source.width() {
        for y in 0..source.height() {
            assert_eq!(
                mirror.tile(x, y).map(|tile| (tile.fore(), tile.back())),
                source.tile(x, y).map(|tile| (tile.fore(), tile.back())),
                "mismatch at ({x}, {y})"
            );
        }
    }

    let spawn = source.spawn();
    let entity = client.entity().expect("entity");
    assert_eq!(entity.position().x, (spawn.x() * TILE_SIZE) as f32);
}

#[test]
fn a_full_host_denies_the_join_with_a_reason() {
    let mut host = HostSession::new(hosted_world(1), 0);
    let (mut host_end, mut client_end) = pair();
    let mut client = ClientSession::new("late");
    client.connect(&mut client_end);
    settle(&mut host, &mut host_end, &mut client, &mut client_end);

    assert_eq!(
        client.state(),
        &ClientState::Disconnected {
            reason: "full".to_owned()
        }
    );
    assert!(host.roster().is_empty());
}

#[test]
fn host_tile_edits_reach_the_playing_client() {
    let world = hosted_world(7);
    let (mut host, mut host_end, mut client, mut client_end) = joined_pair(world);

    host.set_tile(
        &mut host_end,
        60,
        20,
        TileCell {
            fore: TileKind::Torch.id(),
            back: 0,
            fore_style: 0,
        },
    );
    client.tick(&mut client_end, 0.0);

    let mirror = client.world().expect("client world");
    assert_eq!(
        mirror.tile(60, 20).map(|tile| tile.fore()),
        Some(TileKind::Torch.id())
    );
}

#[test]
fn teleport_catch_up_delivers_terrain_changed_while_away() {
    let world = hosted_world(9);
    let (mut host, mut host_end, mut client, mut client_end) = joined_pair(Arc::clone(&world));

    // Change the host grid two chunks right of spawn without announcing
    // it; only the catch-up stream can carry it over.
    {
        let mut source = world.write().expect("world lock");
        source.set_fore(85, 20, TileKind::Torch);
    }
    let spawn_x = {
        let source = world.read().expect("world lock");
        source.spawn().x()
    };
    {
        let entity = client.entity_mut().expect("entity");
        let mut position = entity.position();
        position.x = ((spawn_x + 16) * TILE_SIZE) as f32;
        entity.set_position(position);
    }

    // One full position interval so the client up-syncs, then a host
    // tick to stream the catch-up edges, then a client tick to apply.
    client.tick(&mut client_end, POSITION_INTERVAL);
    host.tick(&mut host_end, 0.0);
    client.tick(&mut client_end, 0.0);

    let mirror = client.world().expect("client world");
    assert_eq!(
        mirror.tile(85, 20).map(|tile| tile.fore()),
        Some(TileKind::Torch.id())
    );
}

#[test]
fn a_leaving_client_vacates_its_roster_slot() {
    let world = hosted_world(3);
    let (mut host, mut host_end, mut client, mut client_end) = joined_pair(world);
    assert_eq!(host.roster().len(), 1);

    // Dropping the link from the client side is enough; the host learns
    // through the transport event.
    use tilefall_system_sync::ports::Transport;
    client_end.disconnect(tilefall_loopback::HOST_PEER, "leaving");
    host.tick(&mut host_end, 0.0);
    client.tick(&mut client_end, 0.0);

    assert!(host.roster().is_empty());
}
