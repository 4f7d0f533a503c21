#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-process transport connecting one host to one client.
//!
//! Both endpoints share a pair of event queues behind a mutex, so a
//! host session and a client session in the same process can run the
//! real handshake and sync protocol without a socket. This is the
//! host-and-play path, and what integration tests run over.
//!
//! Delivery guarantees are honored in miniature: reliable payloads
//! queue in order, while an unreliable-sequenced payload replaces any
//! unreliable payload still waiting in the destination queue, the same
//! way a newer position datagram obsoletes an undelivered older one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tilefall_protocol::Delivery;
use tilefall_system_sync::ports::{PeerId, Transport, TransportEvent};

/// Peer identifier the client sees the host under.
pub const HOST_PEER: PeerId = PeerId::new(0);

/// Peer identifier the host sees the client under.
pub const CLIENT_PEER: PeerId = PeerId::new(1);

#[derive(Default)]
struct Shared {
    to_host: VecDeque<(TransportEvent, bool)>,
    to_client: VecDeque<(TransportEvent, bool)>,
    pending: bool,
    connected: bool,
}

impl Shared {
    fn queue_for(&mut self, side: Side) -> &mut VecDeque<(TransportEvent, bool)> {
        match side {
            Side::Host => &mut self.to_host,
            Side::Client => &mut self.to_client,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Host,
    Client,
}

impl Side {
    const fn other(self) -> Self {
        match self {
            Self::Host => Self::Client,
            Self::Client => Self::Host,
        }
    }

    const fn peer(self) -> PeerId {
        match self {
            Self::Host => HOST_PEER,
            Self::Client => CLIENT_PEER,
        }
    }
}

/// One endpoint of a loopback pair.
pub struct LoopbackTransport {
    shared: Arc<Mutex<Shared>>,
    side: Side,
}

/// Creates a connected-in-waiting pair: the first endpoint belongs to
/// the host session, the second to the client session.
#[must_use]
pub fn pair() -> (LoopbackTransport, LoopbackTransport) {
    let shared = Arc::new(Mutex::new(Shared::default()));
    (
        LoopbackTransport {
            shared: Arc::clone(&shared),
            side: Side::Host,
        },
        LoopbackTransport {
            shared,
            side: Side::Client,
        },
    )
}

impl LoopbackTransport {
    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for LoopbackTransport {
    fn poll(&mut self) -> Option<TransportEvent> {
        self.lock().queue_for(self.side).pop_front().map(|(event, _)| event)
    }

    fn send(&mut self, _peer: PeerId, delivery: Delivery, bytes: Vec<u8>) {
        let mut shared = self.lock();
        if !shared.connected {
            return;
        }
        let queue = shared.queue_for(self.side.other());
        if delivery == Delivery::UnreliableSequenced {
            queue.retain(|(_, unreliable)| !unreliable);
        }
        queue.push_back((
            TransportEvent::Data {
                peer: self.side.peer(),
                bytes,
            },
            delivery == Delivery::UnreliableSequenced,
        ));
    }

    fn request_connection(&mut self, hail: Vec<u8>) {
        let mut shared = self.lock();
        if shared.connected || shared.pending {
            return;
        }
        shared.pending = true;
        shared.to_host.push_back((
            TransportEvent::ConnectionRequest {
                peer: CLIENT_PEER,
                hail,
            },
            false,
        ));
    }

    fn approve(&mut self, peer: PeerId) {
        let mut shared = self.lock();
        if !shared.pending {
            return;
        }
        shared.pending = false;
        shared.connected = true;
        shared
            .to_host
            .push_back((TransportEvent::Connected { peer }, false));
        shared
            .to_client
            .push_back((TransportEvent::Connected { peer: HOST_PEER }, false));
    }

    fn deny(&mut self, _peer: PeerId, reason: &str) {
        let mut shared = self.lock();
        shared.pending = false;
        shared.to_client.push_back((
            TransportEvent::Disconnected {
                peer: HOST_PEER,
                reason: reason.to_owned(),
            },
            false,
        ));
    }

    fn disconnect(&mut self, _peer: PeerId, reason: &str) {
        let mut shared = self.lock();
        if !shared.connected {
            return;
        }
        shared.connected = false;
        // The surviving side learns which peer left, so the event names
        // the disconnecting endpoint, not the receiver.
        let event = TransportEvent::Disconnected {
            peer: self.side.peer(),
            reason: reason.to_owned(),
        };
        shared.queue_for(self.side.other()).push_back((event, false));
    }
}
