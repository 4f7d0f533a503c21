//! The transport port sessions are written against.
//!
//! Sessions never see sockets: they exchange byte payloads with peers
//! through this trait and learn about connection lifecycle from polled
//! events. Adapters decide what a peer actually is (an in-process
//! channel pair, a UDP endpoint).

use tilefall_protocol::{Delivery, Message};

/// Opaque identity of a remote endpoint, assigned by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    /// Wraps a transport-assigned identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Lifecycle and data events surfaced by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// A peer wants to connect; the hail carries its first message.
    /// The session must answer with `approve` or `deny`.
    ConnectionRequest {
        /// The requesting peer.
        peer: PeerId,
        /// Hail payload supplied with the request.
        hail: Vec<u8>,
    },
    /// The connection to the peer is established.
    Connected {
        /// The connected peer.
        peer: PeerId,
    },
    /// The connection to the peer ended.
    Disconnected {
        /// The departed peer.
        peer: PeerId,
        /// Human-readable reason supplied by whoever ended it.
        reason: String,
    },
    /// A payload arrived from the peer.
    Data {
        /// The sending peer.
        peer: PeerId,
        /// The raw message bytes.
        bytes: Vec<u8>,
    },
}

/// Byte-level peer-to-peer messaging, implemented by adapters.
pub trait Transport {
    /// Drains the next pending event, if any.
    fn poll(&mut self) -> Option<TransportEvent>;

    /// Queues a payload to a peer with the requested delivery guarantee.
    fn send(&mut self, peer: PeerId, delivery: Delivery, bytes: Vec<u8>);

    /// Client side: asks the remote endpoint to connect, carrying `hail`
    /// as the first payload.
    fn request_connection(&mut self, hail: Vec<u8>);

    /// Host side: accepts a pending connection request.
    fn approve(&mut self, peer: PeerId);

    /// Host side: rejects a pending connection request with a reason.
    fn deny(&mut self, peer: PeerId, reason: &str);

    /// Ends an established connection with a reason.
    fn disconnect(&mut self, peer: PeerId, reason: &str);
}

/// Encodes a message and sends it on its declared delivery channel.
pub(crate) fn send_message<T: Transport>(transport: &mut T, peer: PeerId, message: &Message) {
    transport.send(peer, message.delivery(), message.encode());
}
