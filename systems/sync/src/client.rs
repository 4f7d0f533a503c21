//! Client session state machine.
//!
//! `Connecting → Approved → LoadingWorld → Playing`, with
//! `Disconnected` reachable from anywhere. The client builds a local
//! world copy from the stream, tracks loading progress as rows received
//! over rows expected, simulates its own entity while playing, and
//! up-syncs its position on the broadcast cadence.

use std::collections::BTreeMap;

use glam::Vec2;
use tilefall_core::{Inventory, PlayerSlot, INVENTORY_SLOTS, PROTOCOL_VERSION, TILE_SIZE};
use tilefall_protocol::{Message, PositionEntry};
use tilefall_system_physics::{update_entity, Entity};
use tilefall_world::World;

use crate::host::POSITION_INTERVAL;
use crate::player::PLAYER_SIZE;
use crate::ports::{send_message, PeerId, Transport, TransportEvent};
use crate::terrain;

/// Where a client session currently stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientState {
    /// Hail sent, no answer yet.
    Connecting,
    /// The host approved the connection; waiting for identity data.
    Approved,
    /// Receiving the initial world stream.
    LoadingWorld,
    /// Fully synced and simulating.
    Playing,
    /// The connection ended.
    Disconnected {
        /// Reason supplied by the host or the transport.
        reason: String,
    },
}

/// What a client knows about another player.
#[derive(Clone, Debug, PartialEq)]
pub struct RemotePlayer {
    name: String,
    position: Vec2,
    velocity: Vec2,
}

impl RemotePlayer {
    /// The player's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last received world-unit position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Last received velocity, for extrapolating between batches.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

/// The client half of a session.
pub struct ClientSession {
    name: String,
    state: ClientState,
    server: Option<PeerId>,
    slot: Option<PlayerSlot>,
    world: Option<World>,
    entity: Option<Entity>,
    inventory: Inventory,
    remotes: BTreeMap<PlayerSlot, RemotePlayer>,
    received_rows: u32,
    total_rows: u32,
    position_timer: f32,
}

impl ClientSession {
    /// Creates a session that will join under the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ClientState::Connecting,
            server: None,
            slot: None,
            world: None,
            entity: None,
            inventory: Inventory::new(INVENTORY_SLOTS),
            remotes: BTreeMap::new(),
            received_rows: 0,
            total_rows: 0,
            position_timer: 0.0,
        }
    }

    /// Sends the connection hail through the transport.
    pub fn connect<T: Transport>(&mut self, transport: &mut T) {
        let hail = Message::Connection {
            version: PROTOCOL_VERSION,
            name: self.name.clone(),
        };
        transport.request_connection(hail.encode());
        self.state = ClientState::Connecting;
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ClientState {
        &self.state
    }

    /// Slot assigned by the host, once known.
    #[must_use]
    pub const fn slot(&self) -> Option<PlayerSlot> {
        self.slot
    }

    /// Loading progress in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.state {
            ClientState::Playing => 1.0,
            _ if self.total_rows == 0 => 0.0,
            _ => (self.received_rows as f32 / self.total_rows as f32).min(1.0),
        }
    }

    /// The local world copy, once the stream has started.
    #[must_use]
    pub const fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// The locally simulated player body, once playing.
    #[must_use]
    pub const fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    /// Mutable access to the player body, for input handling.
    pub fn entity_mut(&mut self) -> Option<&mut Entity> {
        self.entity.as_mut()
    }

    /// The local inventory mirror.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Other players, in slot order.
    pub fn remote_players(&self) -> impl Iterator<Item = (PlayerSlot, &RemotePlayer)> {
        self.remotes.iter().map(|(slot, remote)| (*slot, remote))
    }

    /// Drains transport events, advances the local simulation by `dt`
    /// seconds, and up-syncs the position on the broadcast cadence.
    pub fn tick<T: Transport>(&mut self, transport: &mut T, dt: f32) {
        while let Some(event) = transport.poll() {
            self.handle_event(transport, event);
        }
        if self.state != ClientState::Playing {
            return;
        }
        if let (Some(world), Some(entity)) = (self.world.as_ref(), self.entity.as_mut()) {
            update_entity(world, entity, dt);
        }
        self.position_timer += dt;
        while self.position_timer >= POSITION_INTERVAL {
            self.position_timer -= POSITION_INTERVAL;
            self.send_position(transport);
        }
    }

    fn handle_event<T: Transport>(&mut self, transport: &mut T, event: TransportEvent) {
        match event {
            TransportEvent::Connected { peer } => {
                self.server = Some(peer);
                self.state = ClientState::Approved;
                tracing::info!(peer = peer.get(), "connection approved");
            }
            TransportEvent::Disconnected { reason, .. } => {
                tracing::info!(reason, "disconnected");
                self.state = ClientState::Disconnected { reason };
            }
            TransportEvent::Data { peer, bytes } => match Message::decode(&bytes) {
                Ok(message) => self.handle_message(message),
                Err(error) => {
                    tracing::warn!(%error, "undecodable message from host");
                    transport.disconnect(peer, "protocol error");
                    self.state = ClientState::Disconnected {
                        reason: "protocol error".to_owned(),
                    };
                }
            },
            TransportEvent::ConnectionRequest { peer, .. } => {
                tracing::warn!(peer = peer.get(), "ignoring inbound request on a client");
            }
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Initial {
                slot,
                width,
                height,
                spawn,
            } => {
                if width <= 2 || height <= 2 {
                    tracing::warn!(width, height, "unusable world dimensions");
                    self.state = ClientState::Disconnected {
                        reason: "protocol error".to_owned(),
                    };
                    return;
                }
                let mut world = World::new(width, height);
                world.set_spawn(spawn);
                self.world = Some(world);
                self.slot = Some(slot);
                self.total_rows = height.max(0) as u32;
                self.received_rows = 0;
                self.state = ClientState::LoadingWorld;
                tracing::info!(slot = slot.get(), width, height, "loading world");
            }
            Message::WorldData { strips } => {
                if let Some(world) = self.world.as_mut() {
                    for strip in &strips {
                        terrain::apply_row(world, strip);
                    }
                    self.received_rows += strips.len() as u32;
                }
            }
            Message::FinalData => {
                if let Some(world) = self.world.as_ref() {
                    let spawn = world.spawn();
                    let position = Vec2::new(
                        (spawn.x() * TILE_SIZE) as f32,
                        (spawn.y() * TILE_SIZE) as f32 - PLAYER_SIZE.y,
                    );
                    self.entity = Some(Entity::new(position, PLAYER_SIZE));
                    self.state = ClientState::Playing;
                    tracing::info!("world loaded");
                }
            }
            Message::TileData { x, y, cell } => {
                if let Some(world) = self.world.as_mut() {
                    if let Some(tile) = world.tile_mut(i32::from(x), i32::from(y)) {
                        cell.apply(tile);
                    }
                }
            }
            Message::RowOfTiles { strip } => {
                if let Some(world) = self.world.as_mut() {
                    terrain::apply_row(world, &strip);
                }
            }
            Message::ColumnOfTiles { strip } => {
                if let Some(world) = self.world.as_mut() {
                    terrain::apply_column(world, &strip);
                }
            }
            Message::RectangleOfTiles { rows } => {
                if let Some(world) = self.world.as_mut() {
                    for strip in &rows {
                        terrain::apply_row(world, strip);
                    }
                }
            }
            Message::PlayerData { slot, name, x, y } => {
                if self.slot != Some(slot) {
                    let _ = self.remotes.insert(
                        slot,
                        RemotePlayer {
                            name,
                            position: Vec2::new(x, y),
                            velocity: Vec2::ZERO,
                        },
                    );
                }
            }
            Message::Disconnection { slot } => {
                let _ = self.remotes.remove(&slot);
            }
            Message::Position { entries } => {
                for entry in entries {
                    if self.slot == Some(entry.slot) {
                        continue;
                    }
                    if let Some(remote) = self.remotes.get_mut(&entry.slot) {
                        remote.position = Vec2::new(entry.x, entry.y);
                        remote.velocity = Vec2::new(entry.vx, entry.vy);
                    }
                }
            }
            Message::PlayerAddItem { item, .. } => {
                let _ = self.inventory.add(&item);
            }
            Message::PlayerSetItem { index, item, .. } => {
                self.inventory.set(usize::from(index), Some(item));
            }
            Message::PlayerSetInv { slots, .. } => {
                for (index, entry) in slots.into_iter().enumerate() {
                    self.inventory.set(index, entry);
                }
            }
            Message::PlayerRemoveItem { index, .. } => {
                self.inventory.clear(usize::from(index));
            }
            Message::Connection { .. } => {
                tracing::warn!("ignoring client hail echoed back");
            }
        }
    }

    fn send_position<T: Transport>(&self, transport: &mut T) {
        let (Some(server), Some(slot), Some(entity)) = (self.server, self.slot, self.entity.as_ref())
        else {
            return;
        };
        let position = entity.world_position();
        let velocity = entity.velocity();
        send_message(
            transport,
            server,
            &Message::Position {
                entries: vec![PositionEntry {
                    slot,
                    x: position.x,
                    y: position.y,
                    vx: velocity.x,
                    vy: velocity.y,
                }],
            },
        );
    }
}
