//! Error types for the position core.
//!
//! Coordinate errors are contract violations by the caller. FEN errors carry
//! the exact rule that was broken so a front end can show it to the user.
//! Move errors never leave a position half-updated.

use crate::piece::Color;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("file {file} / rank {rank} is outside the board")]
    FileRankOutOfRange { file: u8, rank: u8 },

    #[error("mailbox index {0} is not a playable square")]
    OffBoard(usize),

    #[error("invalid square name '{0}'")]
    InvalidName(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    // Structural
    #[error("expected 6 space-separated fields, got {0}")]
    WrongFieldCount(usize),

    #[error("expected 8 ranks in piece placement, got {0}")]
    WrongRankCount(usize),

    #[error("invalid character '{ch}' in rank {rank}")]
    InvalidPieceChar { rank: u8, ch: char },

    #[error("consecutive digits in rank {rank}")]
    AdjacentDigits { rank: u8 },

    #[error("rank {rank} describes {cells} cells, expected 8")]
    BadRankLength { rank: u8, cells: u32 },

    #[error("invalid side to move '{0}', expected 'w' or 'b'")]
    InvalidSideToMove(String),

    #[error("invalid castling rights '{0}'")]
    InvalidCastling(String),

    #[error("invalid en passant square '{0}'")]
    InvalidEnPassant(String),

    #[error("halfmove clock '{0}' is not an integer")]
    InvalidHalfmoveClock(String),

    #[error("fullmove number '{0}' is not an integer")]
    InvalidFullmoveNumber(String),

    // Semantic
    #[error("{color} has {count} kings, expected exactly 1")]
    KingCount { color: Color, count: usize },

    #[error("{color} has {count} pawns, at most 8 allowed")]
    TooManyPawns { color: Color, count: usize },

    #[error("pawn on back rank square {square}")]
    PawnOnBackRank { square: String },

    #[error("en passant square {square} does not match the side to move")]
    EnPassantRankMismatch { square: String },

    #[error("en passant square is set but halfmove clock is {0}, expected 0")]
    EnPassantWithHalfmoveClock(i64),

    #[error("halfmove clock {0} is negative")]
    NegativeHalfmoveClock(i64),

    #[error("halfmove clock {halfmove} exceeds {limit} for this move number")]
    HalfmoveClockTooLarge { halfmove: i64, limit: i64 },

    #[error("fullmove number {0} must be at least 1")]
    FullmoveNumberTooSmall(i64),
}

impl FenError {
    /// True for rules about what the position means rather than how it is written.
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            FenError::KingCount { .. }
                | FenError::TooManyPawns { .. }
                | FenError::PawnOnBackRank { .. }
                | FenError::EnPassantRankMismatch { .. }
                | FenError::EnPassantWithHalfmoveClock(_)
                | FenError::NegativeHalfmoveClock(_)
                | FenError::HalfmoveClockTooLarge { .. }
                | FenError::FullmoveNumberTooSmall(_)
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("malformed move '{0}'")]
    Malformed(String),

    #[error("no piece on {0}")]
    EmptySource(String),

    #[error("piece on {square} belongs to {owner}, but {to_move} is to move")]
    WrongSide {
        square: String,
        owner: Color,
        to_move: Color,
    },

    #[error("invalid promotion in move {0}")]
    InvalidPromotion(String),

    #[error("illegal move {0}")]
    Illegal(String),

    #[error("move {0} would overflow the move counters")]
    CounterOverflow(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to start analysis engine '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis engine I/O failed")]
    Io(#[from] std::io::Error),

    #[error("analysis engine closed the connection")]
    Disconnected,

    #[error("analysis engine has no move in this position")]
    NoMove,

    #[error("analysis engine returned an unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("analysis engine suggested a rejected move")]
    RejectedMove(#[from] MoveError),

    #[error("position handed to the analysis engine is invalid")]
    InvalidPosition(#[from] FenError),
}
