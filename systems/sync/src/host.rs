//! Authoritative host session.
//!
//! The host owns the world, approves or denies connection requests,
//! streams terrain to approved clients, keeps the roster in sync, and
//! fans player positions out on a fixed cadence. It can serve a remote
//! transport and a local loopback client at the same time, which is how
//! host-and-play works.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use glam::Vec2;
use tilefall_core::{Item, PlayerSlot, CHUNK_SIZE, PROTOCOL_VERSION};
use tilefall_protocol::{Message, PositionEntry, TileCell};
use tilefall_world::World;

use crate::player::Player;
use crate::ports::{send_message, PeerId, Transport, TransportEvent};
use crate::roster::Roster;
use crate::terrain;

/// Default roster capacity.
pub const DEFAULT_CAPACITY: usize = 16;

/// Seconds between position fan-out batches (20 Hz).
pub const POSITION_INTERVAL: f32 = 0.05;

/// Tiles of terrain kept synced ahead of each player's position.
pub const VIEW_TILES: i32 = 32;

/// Rows bundled into one `WorldData` message during the initial stream.
const ROWS_PER_BATCH: i32 = 16;

/// The server half of a session.
pub struct HostSession {
    world: Arc<RwLock<World>>,
    roster: Roster,
    pending: HashMap<PeerId, String>,
    position_timer: f32,
}

impl HostSession {
    /// Creates a host serving the given world with room for `capacity`
    /// players.
    #[must_use]
    pub fn new(world: Arc<RwLock<World>>, capacity: usize) -> Self {
        Self {
            world,
            roster: Roster::new(capacity),
            pending: HashMap::new(),
            position_timer: 0.0,
        }
    }

    /// Shared handle to the authoritative world.
    #[must_use]
    pub fn world(&self) -> Arc<RwLock<World>> {
        Arc::clone(&self.world)
    }

    /// The connected-player table.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    fn read_world(&self) -> RwLockReadGuard<'_, World> {
        self.world.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_world(&self) -> RwLockWriteGuard<'_, World> {
        self.world.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drains transport events and advances the broadcast timers by `dt`
    /// seconds. Call once per simulation frame.
    pub fn tick<T: Transport>(&mut self, transport: &mut T, dt: f32) {
        while let Some(event) = transport.poll() {
            self.handle_event(transport, event);
        }
        self.position_timer += dt;
        while self.position_timer >= POSITION_INTERVAL {
            self.position_timer -= POSITION_INTERVAL;
            self.broadcast_positions(transport);
        }
    }

    fn handle_event<T: Transport>(&mut self, transport: &mut T, event: TransportEvent) {
        match event {
            TransportEvent::ConnectionRequest { peer, hail } => {
                self.handle_request(transport, peer, &hail);
            }
            TransportEvent::Connected { peer } => {
                self.handle_connected(transport, peer);
            }
            TransportEvent::Disconnected { peer, reason } => {
                let _ = self.pending.remove(&peer);
                self.drop_peer(transport, peer, &reason);
            }
            TransportEvent::Data { peer, bytes } => match Message::decode(&bytes) {
                Ok(message) => self.handle_message(transport, peer, message),
                Err(error) => {
                    tracing::warn!(peer = peer.get(), %error, "undecodable message");
                    transport.disconnect(peer, "protocol error");
                    self.drop_peer(transport, peer, "protocol error");
                }
            },
        }
    }

    fn handle_request<T: Transport>(&mut self, transport: &mut T, peer: PeerId, hail: &[u8]) {
        match Message::decode(hail) {
            Ok(Message::Connection { version, name }) => {
                if version != PROTOCOL_VERSION {
                    tracing::info!(peer = peer.get(), version, "denied: version mismatch");
                    transport.deny(peer, "different version");
                } else if self.roster.len() + self.pending.len() >= self.roster.capacity() {
                    tracing::info!(peer = peer.get(), "denied: server full");
                    transport.deny(peer, "full");
                } else {
                    let _ = self.pending.insert(peer, name);
                    transport.approve(peer);
                }
            }
            Ok(_) | Err(_) => {
                tracing::warn!(peer = peer.get(), "malformed hail");
                transport.deny(peer, "invalid hail");
            }
        }
    }

    fn handle_connected<T: Transport>(&mut self, transport: &mut T, peer: PeerId) {
        let Some(name) = self.pending.remove(&peer) else {
            tracing::warn!(peer = peer.get(), "connection without prior approval");
            return;
        };
        let Some(slot) = self.roster.reserve() else {
            transport.disconnect(peer, "full");
            return;
        };

        let (spawn, width, height) = {
            let world = self.read_world();
            (world.spawn(), world.width(), world.height())
        };
        let player = Player::new(name.clone(), slot, peer, spawn.x(), spawn.y());
        let position = player.entity().world_position();
        self.roster.set(slot, player);

        send_message(
            transport,
            peer,
            &Message::Initial {
                slot,
                width,
                height,
                spawn,
            },
        );
        self.stream_world(transport, peer);

        for other in self.roster.iter().filter(|other| other.slot() != slot) {
            let other_position = other.entity().world_position();
            send_message(
                transport,
                peer,
                &Message::PlayerData {
                    slot: other.slot(),
                    name: other.name().to_owned(),
                    x: other_position.x,
                    y: other_position.y,
                },
            );
        }
        self.broadcast_except(
            transport,
            slot,
            &Message::PlayerData {
                slot,
                name,
                x: position.x,
                y: position.y,
            },
        );
        tracing::info!(slot = slot.get(), "player joined");
    }

    fn stream_world<T: Transport>(&self, transport: &mut T, peer: PeerId) {
        let world = self.read_world();
        let width = world.width();
        let height = world.height();
        let mut y = 0;
        while y < height {
            let rows = ROWS_PER_BATCH.min(height - y);
            let strips = terrain::capture_rectangle(&world, 0, y, width, rows);
            send_message(transport, peer, &Message::WorldData { strips });
            y += rows;
        }
        send_message(transport, peer, &Message::FinalData);
        tracing::debug!(peer = peer.get(), rows = height, "world streamed");
    }

    fn handle_message<T: Transport>(&mut self, transport: &mut T, peer: PeerId, message: Message) {
        match message {
            Message::Position { entries } => {
                if let Some(entry) = entries.first() {
                    if let Some(player) = self.roster.by_peer_mut(peer) {
                        let entity = player.entity_mut();
                        entity.set_position(Vec2::new(entry.x, entry.y));
                        entity.set_velocity(Vec2::new(entry.vx, entry.vy));
                    }
                    self.catch_up(transport, peer);
                }
            }
            Message::Disconnection { .. } => {
                transport.disconnect(peer, "leaving");
                self.drop_peer(transport, peer, "leaving");
            }
            Message::TileData { x, y, cell } => {
                {
                    let mut world = self.write_world();
                    if let Some(tile) = world.tile_mut(i32::from(x), i32::from(y)) {
                        cell.apply(tile);
                    }
                }
                self.relay(transport, peer, &Message::TileData { x, y, cell });
            }
            Message::RowOfTiles { strip } => {
                terrain::apply_row(&mut self.write_world(), &strip);
                self.relay(transport, peer, &Message::RowOfTiles { strip });
            }
            Message::ColumnOfTiles { strip } => {
                terrain::apply_column(&mut self.write_world(), &strip);
                self.relay(transport, peer, &Message::ColumnOfTiles { strip });
            }
            Message::RectangleOfTiles { rows } => {
                {
                    let mut world = self.write_world();
                    for strip in &rows {
                        terrain::apply_row(&mut world, strip);
                    }
                }
                self.relay(transport, peer, &Message::RectangleOfTiles { rows });
            }
            Message::PlayerAddItem { item, .. } => {
                if let Some(player) = self.roster.by_peer_mut(peer) {
                    let _ = player.inventory_mut().add(&item);
                }
            }
            Message::PlayerSetItem { index, item, .. } => {
                if let Some(player) = self.roster.by_peer_mut(peer) {
                    player.inventory_mut().set(usize::from(index), Some(item));
                }
            }
            Message::PlayerSetInv { slots, .. } => {
                if let Some(player) = self.roster.by_peer_mut(peer) {
                    for (index, entry) in slots.into_iter().enumerate() {
                        player.inventory_mut().set(index, entry);
                    }
                }
            }
            Message::PlayerRemoveItem { index, .. } => {
                if let Some(player) = self.roster.by_peer_mut(peer) {
                    player.inventory_mut().clear(usize::from(index));
                }
            }
            other => {
                tracing::warn!(peer = peer.get(), ?other, "unexpected message from client");
            }
        }
    }

    /// Streams the terrain edges a player's movement has newly exposed,
    /// one chunk at a time, and records the caught-up coordinates.
    fn catch_up<T: Transport>(&mut self, transport: &mut T, peer: PeerId) {
        let Some(player) = self.roster.by_peer(peer) else {
            return;
        };
        let tile_x = player.tile_x();
        let tile_y = player.tile_y();
        let mut last_x = player.last_tile_x();
        let mut last_y = player.last_tile_y();

        {
            let world = self.read_world();
            while tile_x - last_x >= CHUNK_SIZE {
                last_x += CHUNK_SIZE;
                send_column_edge(transport, &world, peer, last_x + VIEW_TILES - CHUNK_SIZE);
            }
            while last_x - tile_x >= CHUNK_SIZE {
                last_x -= CHUNK_SIZE;
                send_column_edge(transport, &world, peer, last_x - VIEW_TILES);
            }
            while tile_y - last_y >= CHUNK_SIZE {
                last_y += CHUNK_SIZE;
                send_row_edge(transport, &world, peer, last_y + VIEW_TILES - CHUNK_SIZE);
            }
            while last_y - tile_y >= CHUNK_SIZE {
                last_y -= CHUNK_SIZE;
                send_row_edge(transport, &world, peer, last_y - VIEW_TILES);
            }
        }

        if let Some(player) = self.roster.by_peer_mut(peer) {
            player.set_last_tile_x(last_x);
            player.set_last_tile_y(last_y);
        }
    }

    fn broadcast_positions<T: Transport>(&self, transport: &mut T) {
        let players: Vec<(PlayerSlot, PeerId, Vec2, Vec2)> = self
            .roster
            .iter()
            .map(|player| {
                (
                    player.slot(),
                    player.peer(),
                    player.entity().world_position(),
                    player.entity().velocity(),
                )
            })
            .collect();
        if players.len() < 2 {
            return;
        }
        for (slot, peer, _, _) in &players {
            let entries: Vec<PositionEntry> = players
                .iter()
                .filter(|(other, _, _, _)| other != slot)
                .map(|(other, _, position, velocity)| PositionEntry {
                    slot: *other,
                    x: position.x,
                    y: position.y,
                    vx: velocity.x,
                    vy: velocity.y,
                })
                .collect();
            send_message(transport, *peer, &Message::Position { entries });
        }
    }

    fn broadcast<T: Transport>(&self, transport: &mut T, message: &Message) {
        for player in self.roster.iter() {
            send_message(transport, player.peer(), message);
        }
    }

    fn broadcast_except<T: Transport>(
        &self,
        transport: &mut T,
        excluded: PlayerSlot,
        message: &Message,
    ) {
        for player in self.roster.iter().filter(|player| player.slot() != excluded) {
            send_message(transport, player.peer(), message);
        }
    }

    /// Relays a client-originated message to everyone but its sender.
    fn relay<T: Transport>(&self, transport: &mut T, sender: PeerId, message: &Message) {
        for player in self.roster.iter().filter(|player| player.peer() != sender) {
            send_message(transport, player.peer(), message);
        }
    }

    fn drop_peer<T: Transport>(&mut self, transport: &mut T, peer: PeerId, reason: &str) {
        let Some(slot) = self.roster.by_peer(peer).map(Player::slot) else {
            return;
        };
        let _ = self.roster.remove(slot);
        self.broadcast(transport, &Message::Disconnection { slot });
        tracing::info!(slot = slot.get(), reason, "player left");
    }

    /// Writes one tile on the authoritative grid and announces it.
    pub fn set_tile<T: Transport>(&mut self, transport: &mut T, x: i32, y: i32, cell: TileCell) {
        {
            let mut world = self.write_world();
            if let Some(tile) = world.tile_mut(x, y) {
                cell.apply(tile);
            }
        }
        if x >= 0 && y >= 0 {
            self.broadcast(
                transport,
                &Message::TileData {
                    x: x as u16,
                    y: y as u16,
                    cell,
                },
            );
        }
    }

    /// Merges an item into a player's inventory and notifies them.
    /// Returns the count that did not fit.
    pub fn grant_item<T: Transport>(
        &mut self,
        transport: &mut T,
        slot: PlayerSlot,
        item: Item,
    ) -> u32 {
        let Some(player) = self.roster.get_mut(slot) else {
            return item.stack();
        };
        let remainder = player.inventory_mut().add(&item);
        let peer = player.peer();
        send_message(transport, peer, &Message::PlayerAddItem { slot, item });
        remainder
    }
}

fn send_column_edge<T: Transport>(transport: &mut T, world: &World, peer: PeerId, x0: i32) {
    for x in x0..x0 + CHUNK_SIZE {
        if x < 0 || x >= world.width() {
            continue;
        }
        let strip = terrain::capture_column(world, x, 0, world.height());
        send_message(transport, peer, &Message::ColumnOfTiles { strip });
    }
}

fn send_row_edge<T: Transport>(transport: &mut T, world: &World, peer: PeerId, y0: i32) {
    for y in y0..y0 + CHUNK_SIZE {
        if y < 0 || y >= world.height() {
            continue;
        }
        let strip = terrain::capture_row(world, 0, y, world.width());
        send_message(transport, peer, &Message::RowOfTiles { strip });
    }
}
