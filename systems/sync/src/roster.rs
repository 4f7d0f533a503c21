//! Fixed slot table of connected players.

use tilefall_core::PlayerSlot;

use crate::player::Player;
use crate::ports::PeerId;

/// Slot table with stable identities.
///
/// A slot index names the same player for that player's whole
/// connection; freed slots may be handed to later arrivals.
#[derive(Debug)]
pub struct Roster {
    slots: Vec<Option<Player>>,
}

impl Roster {
    /// Creates a roster with room for `capacity` players.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Maximum number of simultaneous players.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True when no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// True when every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Reserves the lowest free slot. `None` when the table is full.
    #[must_use]
    pub fn reserve(&self) -> Option<PlayerSlot> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|index| PlayerSlot::new(index as u8))
    }

    /// Installs a player in the lowest free slot, returning it; `None`
    /// (and the player is dropped) when the table is full.
    pub fn add(&mut self, player: Player) -> Option<PlayerSlot> {
        let index = self.slots.iter().position(Option::is_none)?;
        let slot = PlayerSlot::new(index as u8);
        self.slots[index] = Some(player);
        Some(slot)
    }

    /// Overwrites one slot.
    pub fn set(&mut self, slot: PlayerSlot, player: Player) {
        if let Some(entry) = self.slots.get_mut(usize::from(slot.get())) {
            *entry = Some(player);
        }
    }

    /// The player in a slot, if present.
    #[must_use]
    pub fn get(&self, slot: PlayerSlot) -> Option<&Player> {
        self.slots.get(usize::from(slot.get()))?.as_ref()
    }

    /// Mutable access to the player in a slot.
    pub fn get_mut(&mut self, slot: PlayerSlot) -> Option<&mut Player> {
        self.slots.get_mut(usize::from(slot.get()))?.as_mut()
    }

    /// Finds the player connected through a transport peer.
    #[must_use]
    pub fn by_peer(&self, peer: PeerId) -> Option<&Player> {
        self.iter().find(|player| player.peer() == peer)
    }

    /// Mutable access to the player connected through a transport peer.
    pub fn by_peer_mut(&mut self, peer: PeerId) -> Option<&mut Player> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|player| player.peer() == peer)
    }

    /// Vacates a slot, returning its former occupant.
    pub fn remove(&mut self, slot: PlayerSlot) -> Option<Player> {
        self.slots.get_mut(usize::from(slot.get()))?.take()
    }

    /// Iterates the occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().flatten()
    }
}
