//! Run-length encoded lines of tiles.
//!
//! A strip carries one horizontal or vertical line of tile cells (the
//! orientation is implied by the message that carries it). Consecutive
//! identical cells collapse into `[fore][back][fore_style][run:u16]`
//! tuples behind a `[x:u16][y:u16][len:u16]` header, which makes bulk
//! terrain (long air or stone runs) nearly free on the wire.

use tilefall_core::Tile;

use crate::codec::{DecodeError, Reader, Writer};

/// The wire-visible fields of one tile cell.
///
/// Light and background style never travel: light is recomputed by the
/// receiver's lighting pass and styles below the foreground are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileCell {
    /// Foreground tile-type identifier.
    pub fore: u8,
    /// Background tile-type identifier.
    pub back: u8,
    /// Foreground border/variant selector.
    pub fore_style: u8,
}

impl TileCell {
    /// Captures the wire fields of a grid tile.
    #[must_use]
    pub fn of(tile: &Tile) -> Self {
        Self {
            fore: tile.fore(),
            back: tile.back(),
            fore_style: tile.fore_style(),
        }
    }

    /// Writes this cell into a grid tile.
    pub fn apply(&self, tile: &mut Tile) {
        tile.set_fore_id(self.fore);
        tile.set_back_id(self.back);
        tile.set_fore_style(self.fore_style);
    }
}

/// One run of identical cells inside a strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRun {
    /// The repeated cell.
    pub cell: TileCell,
    /// Number of repetitions, at least one.
    pub length: u16,
}

/// A run-length encoded line of tiles anchored at a grid coordinate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileStrip {
    x: u16,
    y: u16,
    runs: Vec<TileRun>,
}

impl TileStrip {
    /// Compresses a sequence of cells into runs.
    #[must_use]
    pub fn compress(x: u16, y: u16, cells: impl IntoIterator<Item = TileCell>) -> Self {
        let mut runs: Vec<TileRun> = Vec::new();
        for cell in cells {
            match runs.last_mut() {
                Some(run) if run.cell == cell && run.length < u16::MAX => {
                    run.length += 1;
                }
                _ => runs.push(TileRun { cell, length: 1 }),
            }
        }
        Self { x, y, runs }
    }

    /// Column index of the strip's first cell.
    #[must_use]
    pub const fn x(&self) -> u16 {
        self.x
    }

    /// Row index of the strip's first cell.
    #[must_use]
    pub const fn y(&self) -> u16 {
        self.y
    }

    /// The encoded runs.
    #[must_use]
    pub fn runs(&self) -> &[TileRun] {
        &self.runs
    }

    /// Total number of cells across all runs.
    #[must_use]
    pub fn len(&self) -> u16 {
        self.runs
            .iter()
            .fold(0u16, |total, run| total.saturating_add(run.length))
    }

    /// True when the strip covers no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Iterates the cells the runs expand to, in order.
    pub fn cells(&self) -> impl Iterator<Item = TileCell> + '_ {
        self.runs
            .iter()
            .flat_map(|run| std::iter::repeat(run.cell).take(usize::from(run.length)))
    }

    pub(crate) fn write(&self, writer: &mut Writer) {
        writer.u16(self.x);
        writer.u16(self.y);
        writer.u16(self.len());
        for run in &self.runs {
            writer.u8(run.cell.fore);
            writer.u8(run.cell.back);
            writer.u8(run.cell.fore_style);
            writer.u16(run.length);
        }
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let x = reader.u16()?;
        let y = reader.u16()?;
        let width = reader.u16()?;
        let mut runs = Vec::new();
        let mut covered: u32 = 0;
        while covered < u32::from(width) {
            let cell = TileCell {
                fore: reader.u8()?,
                back: reader.u8()?,
                fore_style: reader.u8()?,
            };
            let length = reader.u16()?;
            covered += u32::from(length);
            if length == 0 || covered > u32::from(width) {
                return Err(DecodeError::InvalidRun);
            }
            runs.push(TileRun { cell, length });
        }
        Ok(Self { x, y, runs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(fore: u8) -> TileCell {
        TileCell {
            fore,
            back: fore,
            fore_style: 0,
        }
    }

    #[test]
    fn ten_identical_then_ten_distinct_make_eleven_runs() {
        let cells: Vec<TileCell> = std::iter::repeat(cell(1))
            .take(10)
            .chain((10..20).map(|fore| cell(fore as u8)))
            .collect();
        let strip = TileStrip::compress(0, 5, cells.clone());
        assert_eq!(strip.runs().len(), 11);
        assert_eq!(strip.len(), 20);
        assert_eq!(strip.cells().collect::<Vec<_>>(), cells);
    }

    #[test]
    fn strips_round_trip_through_the_codec() {
        let strip = TileStrip::compress(3, 7, vec![cell(4); 100]);
        let mut writer = Writer::new();
        strip.write(&mut writer);
        let bytes = writer.into_bytes();
        // Header plus a single 5-byte run.
        assert_eq!(bytes.len(), 6 + 5);

        let mut reader = Reader::new(&bytes);
        assert_eq!(TileStrip::read(&mut reader), Ok(strip));
    }

    #[test]
    fn zero_length_runs_are_rejected() {
        let mut writer = Writer::new();
        writer.u16(0);
        writer.u16(0);
        writer.u16(4); // declared width
        writer.u8(1);
        writer.u8(1);
        writer.u8(0);
        writer.u16(0); // empty run can never cover the width
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(TileStrip::read(&mut reader), Err(DecodeError::InvalidRun));
    }

    #[test]
    fn overlong_runs_are_rejected() {
        let mut writer = Writer::new();
        writer.u16(0);
        writer.u16(0);
        writer.u16(4);
        writer.u8(1);
        writer.u8(1);
        writer.u8(0);
        writer.u16(9); // run exceeds the declared width
        let bytes = writer.into_bytes();
        let mut reader = Reader::new(&bytes);
        assert_eq!(TileStrip::read(&mut reader), Err(DecodeError::InvalidRun));
    }
}
