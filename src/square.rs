//! Board coordinates on a 10x12 mailbox.
//!
//! The 64 playable squares sit inside a border two ranks deep above and
//! below and one file wide on each side:
//!
//! ```text
//!   index = (rank + 2) * 10 + file + 1      a1 = 21, h1 = 28, a8 = 91, h8 = 98
//! ```
//!
//! Any knight, king or sliding step from a playable square lands either on
//! another playable square or on a border cell, never outside the array.

use crate::error::CoordinateError;
use std::fmt;
use std::str::FromStr;

pub const MAILBOX_SIZE: usize = 120;

/// File or rank value meaning "no coordinate".
pub const NO_COORD: u8 = 8;

const FILE_NAMES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square::at(0, 0);
    pub const B1: Square = Square::at(1, 0);
    pub const C1: Square = Square::at(2, 0);
    pub const D1: Square = Square::at(3, 0);
    pub const E1: Square = Square::at(4, 0);
    pub const F1: Square = Square::at(5, 0);
    pub const G1: Square = Square::at(6, 0);
    pub const H1: Square = Square::at(7, 0);
    pub const A8: Square = Square::at(0, 7);
    pub const B8: Square = Square::at(1, 7);
    pub const C8: Square = Square::at(2, 7);
    pub const D8: Square = Square::at(3, 7);
    pub const E8: Square = Square::at(4, 7);
    pub const F8: Square = Square::at(5, 7);
    pub const G8: Square = Square::at(6, 7);
    pub const H8: Square = Square::at(7, 7);

    /// Caller guarantees `file` and `rank` are in `0..8`.
    pub(crate) const fn at(file: u8, rank: u8) -> Square {
        Square((rank + 2) * 10 + file + 1)
    }

    pub fn new(file: u8, rank: u8) -> Result<Square, CoordinateError> {
        if file >= NO_COORD || rank >= NO_COORD {
            return Err(CoordinateError::FileRankOutOfRange { file, rank });
        }
        Ok(Square::at(file, rank))
    }

    /// Wraps a raw mailbox index, rejecting border cells.
    pub fn from_mailbox(index: usize) -> Result<Square, CoordinateError> {
        if index >= MAILBOX_SIZE {
            return Err(CoordinateError::OffBoard(index));
        }
        let file = index % 10;
        let row = index / 10;
        if !(1..=8).contains(&file) || !(2..=9).contains(&row) {
            return Err(CoordinateError::OffBoard(index));
        }
        Ok(Square(index as u8))
    }

    /// Steps by a mailbox offset; `None` when the step leaves the board.
    pub fn offset(self, delta: i16) -> Option<Square> {
        let target = self.0 as i16 + delta;
        if target < 0 {
            return None;
        }
        Square::from_mailbox(target as usize).ok()
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> u8 {
        self.0 % 10 - 1
    }

    pub fn rank(self) -> u8 {
        self.0 / 10 - 2
    }

    pub fn file_rank(self) -> (u8, u8) {
        (self.file(), self.rank())
    }

    pub fn name(self) -> String {
        self.to_string()
    }

    /// All 64 squares, a1 to h8 rank by rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square::at(file, rank)))
    }
}

/// Mailbox square for a file/rank pair in `0..8`.
pub fn square_of(file: u8, rank: u8) -> Result<Square, CoordinateError> {
    Square::new(file, rank)
}

/// File/rank pair of a mailbox index; fails on border cells.
pub fn file_rank_of(index: usize) -> Result<(u8, u8), CoordinateError> {
    Square::from_mailbox(index).map(Square::file_rank)
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", FILE_NAMES[self.file() as usize], self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(CoordinateError::InvalidName(s.to_string()));
        }
        let file = match bytes[0] {
            b'a'..=b'h' => bytes[0] - b'a',
            _ => return Err(CoordinateError::InvalidName(s.to_string())),
        };
        let rank = match bytes[1] {
            b'1'..=b'8' => bytes[1] - b'1',
            _ => return Err(CoordinateError::InvalidName(s.to_string())),
        };
        Square::new(file, rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_rank_round_trip() {
        for file in 0..8 {
            for rank in 0..8 {
                let square = square_of(file, rank).unwrap();
                assert_eq!(file_rank_of(square.index()).unwrap(), (file, rank));
                assert_eq!(square_of(square.file(), square.rank()).unwrap(), square);
            }
        }
    }

    #[test]
    fn border_cells_are_rejected() {
        let playable: Vec<usize> = Square::all().map(Square::index).collect();
        assert_eq!(playable.len(), 64);
        for index in 0..MAILBOX_SIZE {
            let result = file_rank_of(index);
            assert_eq!(result.is_ok(), playable.contains(&index), "index {}", index);
        }
        assert_eq!(file_rank_of(200), Err(CoordinateError::OffBoard(200)));
    }

    #[test]
    fn none_sentinel_is_rejected() {
        assert!(square_of(NO_COORD, 0).is_err());
        assert!(square_of(0, NO_COORD).is_err());
    }

    #[test]
    fn names() {
        assert_eq!(Square::A1.index(), 21);
        assert_eq!(Square::H8.index(), 98);
        assert_eq!(Square::E1.name(), "e1");
        for square in Square::all() {
            assert_eq!(square.name().parse::<Square>().unwrap(), square);
        }
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn offsets_stop_at_the_border() {
        assert_eq!(Square::H1.offset(1), None);
        assert_eq!(Square::A1.offset(-10), None);
        assert_eq!(Square::A1.offset(11), Some("b2".parse().unwrap()));
    }
}
