use crate::board::Board;
use crate::error::{FenError, MoveError};
use crate::fen;
use crate::movegen::{Move, MoveGenerator};
use crate::piece::{Color, Piece, PieceKind};
use crate::square::Square;
use log::{debug, trace};
use std::fmt;
use std::str::FromStr;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub fn any(&self) -> bool {
        self.white_kingside || self.white_queenside || self.black_kingside || self.black_queenside
    }

    fn revoke_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Drops the right tied to a rook home square, if any.
    fn revoke_rook_home(&mut self, square: Square) {
        match square {
            Square::H1 => self.white_kingside = false,
            Square::A1 => self.white_queenside = false,
            Square::H8 => self.black_kingside = false,
            Square::A8 => self.black_queenside = false,
            _ => {}
        }
    }
}

/// FEN castling field, always in `KQkq` order.
impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.any() {
            return write!(f, "-");
        }
        let flags = [
            (self.white_kingside, 'K'),
            (self.white_queenside, 'Q'),
            (self.black_kingside, 'k'),
            (self.black_queenside, 'q'),
        ];
        for (set, letter) in flags {
            if set {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}

/// Home and post-castle rook squares for a king moving to `king_to`.
pub(crate) fn castling_rook_squares(king_to: Square) -> Option<(Square, Square)> {
    match king_to {
        Square::G1 => Some((Square::H1, Square::F1)),
        Square::C1 => Some((Square::A1, Square::D1)),
        Square::G8 => Some((Square::H8, Square::F8)),
        Square::C8 => Some((Square::A8, Square::D8)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub board: Board,
    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Position {
    pub fn new() -> Self {
        Self {
            board: Board::starting(),
            side_to_move: Color::White,
            castling_rights: CastlingRights::all(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        fen::parse(fen)
    }

    pub fn to_fen(&self) -> String {
        fen::serialize(self)
    }

    pub fn piece_at(&self, square: Square) -> Piece {
        self.board.get(square)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.board.find(Piece::new(PieceKind::King, color))
    }

    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        MoveGenerator::new().is_square_attacked(self, square, by)
    }

    pub fn in_check(&self) -> bool {
        MoveGenerator::new().is_king_in_check(self, self.side_to_move)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        MoveGenerator::new().legal_moves(self)
    }

    /// Applies a move without checking that it leaves the mover's king safe.
    ///
    /// Only the source square, the side to move, the promotion choice and
    /// room in the move counters are checked, all before anything is written,
    /// so a failed call leaves the position untouched. A pawn reaching the last rank without a
    /// promotion choice becomes a queen.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), MoveError> {
        let mover = self.board.get(mv.from);
        let color = match mover.color() {
            Some(color) => color,
            None => return Err(MoveError::EmptySource(mv.from.name())),
        };
        if color != self.side_to_move {
            return Err(MoveError::WrongSide {
                square: mv.from.name(),
                owner: color,
                to_move: self.side_to_move,
            });
        }
        let last_rank = match color {
            Color::White => 7,
            Color::Black => 0,
        };
        let promotes = mover.is_pawn() && mv.to.rank() == last_rank;
        let placed = match mv.promotion {
            Some(kind) if promotes && kind.is_promotion_target() => Piece::new(kind, color),
            Some(_) => return Err(MoveError::InvalidPromotion(mv.to_string())),
            None if promotes => Piece::new(PieceKind::Queen, color),
            None => mover,
        };

        let target = self.board.get(mv.to);
        let file_distance = (mv.from.file() as i16 - mv.to.file() as i16).abs();
        let en_passant_capture = mover.is_pawn() && file_distance == 1 && target.is_empty();
        let castle = if mover.is_king() && file_distance == 2 {
            castling_rook_squares(mv.to)
        } else {
            None
        };
        let captured = target.is_piece() || en_passant_capture;

        let overflow = || MoveError::CounterOverflow(mv.to_string());
        let halfmove_clock = if mover.is_pawn() || captured {
            0
        } else {
            self.halfmove_clock.checked_add(1).ok_or_else(overflow)?
        };
        let fullmove_number = match color {
            Color::White => self.fullmove_number,
            Color::Black => self.fullmove_number.checked_add(1).ok_or_else(overflow)?,
        };

        if en_passant_capture {
            if let Some(victim) = mv.to.offset(-color.forward()) {
                self.board.clear(victim);
            }
        }
        if let Some((rook_from, rook_to)) = castle {
            let rook = self.board.get(rook_from);
            self.board.clear(rook_from);
            self.board.set(rook_to, rook);
        }
        self.board.clear(mv.from);
        self.board.set(mv.to, placed);

        if mover.is_king() {
            self.castling_rights.revoke_color(color);
        }
        if mover.kind() == Some(PieceKind::Rook) {
            self.castling_rights.revoke_rook_home(mv.from);
        }
        if captured {
            self.castling_rights.revoke_rook_home(mv.to);
        }

        let rank_distance = (mv.from.rank() as i16 - mv.to.rank() as i16).abs();
        self.en_passant = if mover.is_pawn() && rank_distance == 2 {
            mv.from.offset(color.forward())
        } else {
            None
        };

        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
        self.side_to_move = color.opposite();

        trace!("applied {} -> {}", mv, self.to_fen());
        Ok(())
    }

    /// Applies `mv` only if it is in the legal move set.
    ///
    /// A move without a promotion suffix matches the queen promotion. Returns
    /// the move as played.
    pub fn play(&mut self, mv: Move) -> Result<Move, MoveError> {
        let wanted = mv.promotion.or(Some(PieceKind::Queen));
        let legal = self.legal_moves().into_iter().find(|candidate| {
            candidate.from == mv.from
                && candidate.to == mv.to
                && match candidate.promotion {
                    None => mv.promotion.is_none(),
                    Some(kind) => Some(kind) == wanted,
                }
        });
        match legal {
            Some(legal) => {
                self.apply_move(legal)?;
                Ok(legal)
            }
            None => {
                // Prefer the specific reason when the move cannot even be applied
                self.clone().apply_move(mv)?;
                debug!("rejected illegal move {} in {}", mv, self.to_fen());
                Err(MoveError::Illegal(mv.to_string()))
            }
        }
    }

    pub fn play_uci(&mut self, text: &str) -> Result<Move, MoveError> {
        let mv = Move::from_str(text)?;
        self.play(mv)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fen::parse(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        write!(f, "{}", self.to_fen())
    }
}
