#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Client/server world synchronization.
//!
//! The host owns the authoritative world and roster; clients build a
//! local copy from the initial stream and stay in sync through tile
//! edits, terrain catch-up edges, and position batches. Both halves
//! talk to the network only through the [`ports::Transport`] trait, so
//! the same sessions run over an in-process loopback or a socket.

mod client;
mod host;
mod player;
pub mod ports;
mod roster;
pub mod terrain;

pub use client::{ClientSession, ClientState, RemotePlayer};
pub use host::{HostSession, DEFAULT_CAPACITY, POSITION_INTERVAL, VIEW_TILES};
pub use player::{Player, PLAYER_SIZE};
pub use roster::Roster;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;

    use tilefall_protocol::Delivery;

    use crate::ports::{PeerId, Transport, TransportEvent};

    /// Scripted transport: tests queue events and inspect what the
    /// session sent in response.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub(crate) events: VecDeque<TransportEvent>,
        pub(crate) sent: Vec<(PeerId, Delivery, Vec<u8>)>,
        pub(crate) hails: Vec<Vec<u8>>,
        pub(crate) approved: Vec<PeerId>,
        pub(crate) denied: Vec<(PeerId, String)>,
        pub(crate) disconnected: Vec<(PeerId, String)>,
    }

    impl MockTransport {
        pub(crate) fn push_event(&mut self, event: TransportEvent) {
            self.events.push_back(event);
        }
    }

    impl Transport for MockTransport {
        fn poll(&mut self) -> Option<TransportEvent> {
            self.events.pop_front()
        }

        fn send(&mut self, peer: PeerId, delivery: Delivery, bytes: Vec<u8>) {
            self.sent.push((peer, delivery, bytes));
        }

        fn request_connection(&mut self, hail: Vec<u8>) {
            self.hails.push(hail);
        }

        fn approve(&mut self, peer: PeerId) {
            self.approved.push(peer);
        }

        fn deny(&mut self, peer: PeerId, reason: &str) {
            self.denied.push((peer, reason.to_owned()));
        }

        fn disconnect(&mut self, peer: PeerId, reason: &str) {
            self.disconnected.push((peer, reason.to_owned()));
        }
    }
}
