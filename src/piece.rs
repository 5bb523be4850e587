//! Pieces and their static properties.
//!
//! Every property of a piece (color, class, value, movement offsets) is read
//! from the tables below, indexed by `Piece as usize`. Move generation,
//! attack detection and display all consult the same tables.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Mailbox step of a pawn of this color moving forward one rank.
    pub fn forward(&self) -> i16 {
        match self {
            Color::White => 10,
            Color::Black => -10,
        }
    }

    pub fn fen_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase letter used in FEN and UCI promotion suffixes.
    pub fn letter(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn is_promotion_target(&self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }
}

/// Contents of one mailbox cell.
///
/// `OffBoard` only ever appears in the border of the 10x12 array, so a ray
/// walking off the edge stops on it without any bounds arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Empty,
    WhitePawn,
    WhiteKnight,
    WhiteBishop,
    WhiteRook,
    WhiteQueen,
    WhiteKing,
    BlackPawn,
    BlackKnight,
    BlackBishop,
    BlackRook,
    BlackQueen,
    BlackKing,
    OffBoard,
}

const PIECE_COUNT: usize = 14;

pub const PROMOTION_KINDS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

pub const KNIGHT_OFFSETS: [i16; 8] = [-21, -19, -12, -8, 8, 12, 19, 21];
pub const KING_OFFSETS: [i16; 8] = [-11, -10, -9, -1, 1, 9, 10, 11];
pub const ROOK_DIRECTIONS: [i16; 4] = [-10, -1, 1, 10];
pub const BISHOP_DIRECTIONS: [i16; 4] = [-11, -9, 9, 11];

const PIECES: [Piece; 12] = [
    Piece::WhitePawn,
    Piece::WhiteKnight,
    Piece::WhiteBishop,
    Piece::WhiteRook,
    Piece::WhiteQueen,
    Piece::WhiteKing,
    Piece::BlackPawn,
    Piece::BlackKnight,
    Piece::BlackBishop,
    Piece::BlackRook,
    Piece::BlackQueen,
    Piece::BlackKing,
];

const W: Option<Color> = Some(Color::White);
const B: Option<Color> = Some(Color::Black);

static COLOR: [Option<Color>; PIECE_COUNT] = [None, W, W, W, W, W, W, B, B, B, B, B, B, None];

static KIND: [Option<PieceKind>; PIECE_COUNT] = [
    None,
    Some(PieceKind::Pawn),
    Some(PieceKind::Knight),
    Some(PieceKind::Bishop),
    Some(PieceKind::Rook),
    Some(PieceKind::Queen),
    Some(PieceKind::King),
    Some(PieceKind::Pawn),
    Some(PieceKind::Knight),
    Some(PieceKind::Bishop),
    Some(PieceKind::Rook),
    Some(PieceKind::Queen),
    Some(PieceKind::King),
    None,
];

// Centipawns. Kings carry no material value.
static VALUE: [i32; PIECE_COUNT] = [0, 100, 320, 330, 500, 900, 0, 100, 320, 330, 500, 900, 0, 0];

static IS_PAWN: [bool; PIECE_COUNT] = [
    false, true, false, false, false, false, false, true, false, false, false, false, false, false,
];
static IS_KNIGHT: [bool; PIECE_COUNT] = [
    false, false, true, false, false, false, false, false, true, false, false, false, false, false,
];
static IS_KING: [bool; PIECE_COUNT] = [
    false, false, false, false, false, false, true, false, false, false, false, false, true, false,
];
static IS_ROOK_OR_QUEEN: [bool; PIECE_COUNT] = [
    false, false, false, false, true, true, false, false, false, false, true, true, false, false,
];
static IS_BISHOP_OR_QUEEN: [bool; PIECE_COUNT] = [
    false, false, false, true, false, true, false, false, false, true, false, true, false, false,
];

static SLIDES: [bool; PIECE_COUNT] = [
    false, false, false, true, true, true, false, false, false, true, true, true, false, false,
];

static QUEEN_DIRECTIONS: [i16; 8] = [-11, -10, -9, -1, 1, 9, 10, 11];

static DIRECTIONS: [&[i16]; PIECE_COUNT] = [
    &[],
    &[],
    &KNIGHT_OFFSETS,
    &BISHOP_DIRECTIONS,
    &ROOK_DIRECTIONS,
    &QUEEN_DIRECTIONS,
    &KING_OFFSETS,
    &[],
    &KNIGHT_OFFSETS,
    &BISHOP_DIRECTIONS,
    &ROOK_DIRECTIONS,
    &QUEEN_DIRECTIONS,
    &KING_OFFSETS,
    &[],
];

static FEN_CHAR: [char; PIECE_COUNT] = [
    '.', 'P', 'N', 'B', 'R', 'Q', 'K', 'p', 'n', 'b', 'r', 'q', 'k', '#',
];

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Piece {
        let base = match color {
            Color::White => 0,
            Color::Black => 6,
        };
        let offset = match kind {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        };
        PIECES[base + offset]
    }

    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }

    pub fn fen_char(&self) -> char {
        FEN_CHAR[*self as usize]
    }

    pub fn color(&self) -> Option<Color> {
        COLOR[*self as usize]
    }

    pub fn kind(&self) -> Option<PieceKind> {
        KIND[*self as usize]
    }

    /// True for the twelve real pieces.
    pub fn is_piece(&self) -> bool {
        COLOR[*self as usize].is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Piece::Empty
    }

    pub fn is_color(&self, color: Color) -> bool {
        COLOR[*self as usize] == Some(color)
    }

    pub fn is_pawn(&self) -> bool {
        IS_PAWN[*self as usize]
    }

    pub fn is_knight(&self) -> bool {
        IS_KNIGHT[*self as usize]
    }

    pub fn is_king(&self) -> bool {
        IS_KING[*self as usize]
    }

    pub fn is_rook_or_queen(&self) -> bool {
        IS_ROOK_OR_QUEEN[*self as usize]
    }

    pub fn is_bishop_or_queen(&self) -> bool {
        IS_BISHOP_OR_QUEEN[*self as usize]
    }

    pub fn value(&self) -> i32 {
        VALUE[*self as usize]
    }

    /// Whether the piece repeats its direction steps until blocked.
    pub fn slides(&self) -> bool {
        SLIDES[*self as usize]
    }

    /// Step offsets (knight, king) or ray directions (bishop, rook, queen).
    /// Pawns have none; their moves depend on color and occupancy.
    pub fn directions(&self) -> &'static [i16] {
        DIRECTIONS[*self as usize]
    }
}
