#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wire protocol for Tilefall sessions.
//!
//! Every message is a kind byte followed by a kind-specific payload in
//! explicit little-endian form (see [`codec`]). Terrain travels as
//! run-length encoded [`TileStrip`]s. Decoding never panics: malformed
//! input surfaces as a [`DecodeError`] and the sync layer decides the
//! connection's fate.

mod codec;
mod strip;

pub use codec::{DecodeError, Reader, Writer};
pub use strip::{TileCell, TileRun, TileStrip};

use tilefall_core::{Item, PlayerSlot, TileKind, TilePoint};

/// Delivery guarantee requested from the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Arrives exactly once, in order.
    Reliable,
    /// May be dropped; stale packets are discarded by sequence number.
    UnreliableSequenced,
}

/// One player's position and velocity inside a batched position
/// message. Velocity lets receivers extrapolate between batches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionEntry {
    /// Roster slot the entry belongs to.
    pub slot: PlayerSlot,
    /// World-unit X coordinate.
    pub x: f32,
    /// World-unit Y coordinate.
    pub y: f32,
    /// Horizontal velocity in world units per second.
    pub vx: f32,
    /// Vertical velocity in world units per second.
    pub vy: f32,
}

/// Everything that can travel between client and server.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Client hail: protocol version and display name.
    Connection {
        /// Protocol version the client speaks.
        version: u32,
        /// Display name, also echoed in roster broadcasts.
        name: String,
    },
    /// A player left the session.
    Disconnection {
        /// Slot that was vacated.
        slot: PlayerSlot,
    },
    /// First server message after approval: identity and world shape.
    Initial {
        /// Slot assigned to the receiving client.
        slot: PlayerSlot,
        /// World width in tiles.
        width: i32,
        /// World height in tiles.
        height: i32,
        /// Safe spawn location.
        spawn: TilePoint,
    },
    /// Roster entry broadcast when a player joins or is enumerated.
    PlayerData {
        /// The player's slot.
        slot: PlayerSlot,
        /// The player's display name.
        name: String,
        /// World-unit X coordinate.
        x: f32,
        /// World-unit Y coordinate.
        y: f32,
    },
    /// A batch of terrain rows streamed during loading.
    WorldData {
        /// Encoded rows, in ascending row order.
        strips: Vec<TileStrip>,
    },
    /// A single tile write.
    TileData {
        /// Column index.
        x: u16,
        /// Row index.
        y: u16,
        /// New cell contents.
        cell: TileCell,
    },
    /// End of the initial world stream.
    FinalData,
    /// A rectangular region, encoded one row strip per covered row.
    RectangleOfTiles {
        /// Row strips, top to bottom.
        rows: Vec<TileStrip>,
    },
    /// One horizontal line of tiles.
    RowOfTiles {
        /// The encoded row.
        strip: TileStrip,
    },
    /// One vertical line of tiles; runs extend downward from the anchor.
    ColumnOfTiles {
        /// The encoded column.
        strip: TileStrip,
    },
    /// Batched player positions; the only sequenced-unreliable message.
    Position {
        /// One entry per player, never including the recipient's own.
        entries: Vec<PositionEntry>,
    },
    /// Merge an item into a player's inventory.
    PlayerAddItem {
        /// Target player.
        slot: PlayerSlot,
        /// Item to merge.
        item: Item,
    },
    /// Overwrite one inventory slot.
    PlayerSetItem {
        /// Target player.
        slot: PlayerSlot,
        /// Inventory slot index.
        index: u16,
        /// New contents.
        item: Item,
    },
    /// Replace a player's entire inventory.
    PlayerSetInv {
        /// Target player.
        slot: PlayerSlot,
        /// Every inventory slot in order, empty slots included.
        slots: Vec<Option<Item>>,
    },
    /// Empty one inventory slot.
    PlayerRemoveItem {
        /// Target player.
        slot: PlayerSlot,
        /// Inventory slot index.
        index: u16,
    },
}

const K_CONNECTION: u8 = 1;
const K_DISCONNECTION: u8 = 2;
const K_INITIAL: u8 = 3;
const K_PLAYER_DATA: u8 = 4;
const K_WORLD_DATA: u8 = 5;
const K_TILE_DATA: u8 = 6;
const K_FINAL_DATA: u8 = 7;
const K_RECTANGLE_OF_TILES: u8 = 8;
const K_ROW_OF_TILES: u8 = 9;
const K_COLUMN_OF_TILES: u8 = 10;
const K_POSITION: u8 = 11;
const K_PLAYER_ADD_ITEM: u8 = 12;
const K_PLAYER_SET_ITEM: u8 = 13;
const K_PLAYER_SET_INV: u8 = 14;
const K_PLAYER_REMOVE_ITEM: u8 = 15;

impl Message {
    /// Delivery guarantee this message requires. Positions tolerate loss
    /// because a newer batch supersedes them; everything else mutates
    /// state and must arrive.
    #[must_use]
    pub fn delivery(&self) -> Delivery {
        match self {
            Self::Position { .. } => Delivery::UnreliableSequenced,
            _ => Delivery::Reliable,
        }
    }

    /// Encodes the message, kind byte first.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        match self {
            Self::Connection { version, name } => {
                writer.u8(K_CONNECTION);
                writer.u32(*version);
                writer.string(name);
            }
            Self::Disconnection { slot } => {
                writer.u8(K_DISCONNECTION);
                writer.u8(slot.get());
            }
            Self::Initial {
                slot,
                width,
                height,
                spawn,
            } => {
                writer.u8(K_INITIAL);
                writer.u8(slot.get());
                writer.i32(*width);
                writer.i32(*height);
                writer.i32(spawn.x());
                writer.i32(spawn.y());
            }
            Self::PlayerData { slot, name, x, y } => {
                writer.u8(K_PLAYER_DATA);
                writer.u8(slot.get());
                writer.string(name);
                writer.f32(*x);
                writer.f32(*y);
            }
            Self::WorldData { strips } => {
                writer.u8(K_WORLD_DATA);
                write_strips(&mut writer, strips);
            }
            Self::TileData { x, y, cell } => {
                writer.u8(K_TILE_DATA);
                writer.u16(*x);
                writer.u16(*y);
                writer.u8(cell.fore);
                writer.u8(cell.back);
                writer.u8(cell.fore_style);
            }
            Self::FinalData => writer.u8(K_FINAL_DATA),
            Self::RectangleOfTiles { rows } => {
                writer.u8(K_RECTANGLE_OF_TILES);
                write_strips(&mut writer, rows);
            }
            Self::RowOfTiles { strip } => {
                writer.u8(K_ROW_OF_TILES);
                strip.write(&mut writer);
            }
            Self::ColumnOfTiles { strip } => {
                writer.u8(K_COLUMN_OF_TILES);
                strip.write(&mut writer);
            }
            Self::Position { entries } => {
                writer.u8(K_POSITION);
                writer.u8(entries.len().min(usize::from(u8::MAX)) as u8);
                for entry in entries.iter().take(usize::from(u8::MAX)) {
                    writer.u8(entry.slot.get());
                    writer.f32(entry.x);
                    writer.f32(entry.y);
                    writer.f32(entry.vx);
                    writer.f32(entry.vy);
                }
            }
            Self::PlayerAddItem { slot, item } => {
                writer.u8(K_PLAYER_ADD_ITEM);
                writer.u8(slot.get());
                write_item(&mut writer, item);
            }
            Self::PlayerSetItem { slot, index, item } => {
                writer.u8(K_PLAYER_SET_ITEM);
                writer.u8(slot.get());
                writer.u16(*index);
                write_item(&mut writer, item);
            }
            Self::PlayerSetInv { slot, slots } => {
                writer.u8(K_PLAYER_SET_INV);
                writer.u8(slot.get());
                writer.u16(slots.len().min(usize::from(u16::MAX)) as u16);
                for entry in slots.iter().take(usize::from(u16::MAX)) {
                    match entry {
                        Some(item) => {
                            writer.u8(1);
                            write_item(&mut writer, item);
                        }
                        None => writer.u8(0),
                    }
                }
            }
            Self::PlayerRemoveItem { slot, index } => {
                writer.u8(K_PLAYER_REMOVE_ITEM);
                writer.u8(slot.get());
                writer.u16(*index);
            }
        }
        writer.into_bytes()
    }

    /// Decodes one message from a received buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        let message = match reader.u8()? {
            K_CONNECTION => Self::Connection {
                version: reader.u32()?,
                name: reader.string()?,
            },
            K_DISCONNECTION => Self::Disconnection {
                slot: PlayerSlot::new(reader.u8()?),
            },
            K_INITIAL => Self::Initial {
                slot: PlayerSlot::new(reader.u8()?),
                width: reader.i32()?,
                height: reader.i32()?,
                spawn: {
                    let x = reader.i32()?;
                    let y = reader.i32()?;
                    TilePoint::new(x, y)
                },
            },
            K_PLAYER_DATA => Self::PlayerData {
                slot: PlayerSlot::new(reader.u8()?),
                name: reader.string()?,
                x: reader.f32()?,
                y: reader.f32()?,
            },
            K_WORLD_DATA => Self::WorldData {
                strips: read_strips(&mut reader)?,
            },
            K_TILE_DATA => Self::TileData {
                x: reader.u16()?,
                y: reader.u16()?,
                cell: TileCell {
                    fore: reader.u8()?,
                    back: reader.u8()?,
                    fore_style: reader.u8()?,
                },
            },
            K_FINAL_DATA => Self::FinalData,
            K_RECTANGLE_OF_TILES => Self::RectangleOfTiles {
                rows: read_strips(&mut reader)?,
            },
            K_ROW_OF_TILES => Self::RowOfTiles {
                strip: TileStrip::read(&mut reader)?,
            },
            K_COLUMN_OF_TILES => Self::ColumnOfTiles {
                strip: TileStrip::read(&mut reader)?,
            },
            K_POSITION => {
                let count = usize::from(reader.u8()?);
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    entries.push(PositionEntry {
                        slot: PlayerSlot::new(reader.u8()?),
                        x: reader.f32()?,
                        y: reader.f32()?,
                        vx: reader.f32()?,
                        vy: reader.f32()?,
                    });
                }
                Self::Position { entries }
            }
            K_PLAYER_ADD_ITEM => Self::PlayerAddItem {
                slot: PlayerSlot::new(reader.u8()?),
                item: read_item(&mut reader)?,
            },
            K_PLAYER_SET_ITEM => Self::PlayerSetItem {
                slot: PlayerSlot::new(reader.u8()?),
                index: reader.u16()?,
                item: read_item(&mut reader)?,
            },
            K_PLAYER_SET_INV => {
                let slot = PlayerSlot::new(reader.u8()?);
                let count = usize::from(reader.u16()?);
                let mut slots = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    let entry = match reader.u8()? {
                        0 => None,
                        _ => Some(read_item(&mut reader)?),
                    };
                    slots.push(entry);
                }
                Self::PlayerSetInv { slot, slots }
            }
            K_PLAYER_REMOVE_ITEM => Self::PlayerRemoveItem {
                slot: PlayerSlot::new(reader.u8()?),
                index: reader.u16()?,
            },
            other => return Err(DecodeError::UnknownKind(other)),
        };
        Ok(message)
    }
}

fn write_strips(writer: &mut Writer, strips: &[TileStrip]) {
    writer.u16(strips.len().min(usize::from(u16::MAX)) as u16);
    for strip in strips.iter().take(usize::from(u16::MAX)) {
        strip.write(writer);
    }
}

fn read_strips(reader: &mut Reader<'_>) -> Result<Vec<TileStrip>, DecodeError> {
    let count = usize::from(reader.u16()?);
    let mut strips = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        strips.push(TileStrip::read(reader)?);
    }
    Ok(strips)
}

fn write_item(writer: &mut Writer, item: &Item) {
    writer.string(item.key());
    writer.u32(item.stack());
    writer.u32(item.max_stack());
    match item.tile() {
        Some(kind) => {
            writer.u8(1);
            writer.u8(kind.id());
        }
        None => writer.u8(0),
    }
}

fn read_item(reader: &mut Reader<'_>) -> Result<Item, DecodeError> {
    let key = reader.string()?;
    let stack = reader.u32()?;
    let max_stack = reader.u32()?;
    let item = Item::new(key, stack, max_stack);
    match reader.u8()? {
        0 => Ok(item),
        _ => {
            let id = reader.u8()?;
            let kind = TileKind::from_id(id).ok_or(DecodeError::UnknownTileKind(id))?;
            Ok(item.with_tile(kind))
        }
    }
}
