use crate::piece::{Color, Piece, PieceKind};
use crate::square::{Square, MAILBOX_SIZE};
use std::fmt;

/// Piece placement on a bordered 10x12 array.
///
/// Border cells hold `Piece::OffBoard` for the lifetime of the board; only
/// playable squares can be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Piece; MAILBOX_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        let mut cells = [Piece::OffBoard; MAILBOX_SIZE];
        for square in Square::all() {
            cells[square.index()] = Piece::Empty;
        }
        Self { cells }
    }

    pub fn starting() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, &kind) in back_rank.iter().enumerate() {
            let file = file as u8;
            board.set(Square::at(file, 0), Piece::new(kind, Color::White));
            board.set(Square::at(file, 1), Piece::WhitePawn);
            board.set(Square::at(file, 6), Piece::BlackPawn);
            board.set(Square::at(file, 7), Piece::new(kind, Color::Black));
        }
        board
    }

    pub fn get(&self, square: Square) -> Piece {
        self.cells[square.index()]
    }

    /// Raw cell lookup used by ray casting; border cells read as `OffBoard`.
    pub fn cell(&self, index: usize) -> Piece {
        self.cells.get(index).copied().unwrap_or(Piece::OffBoard)
    }

    pub fn set(&mut self, square: Square, piece: Piece) {
        if piece != Piece::OffBoard {
            self.cells[square.index()] = piece;
        }
    }

    pub fn clear(&mut self, square: Square) {
        self.cells[square.index()] = Piece::Empty;
    }

    /// Occupied squares with their pieces, a1 to h8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all()
            .map(move |square| (square, self.get(square)))
            .filter(|(_, piece)| piece.is_piece())
    }

    pub fn count(&self, piece: Piece) -> usize {
        self.pieces().filter(|&(_, p)| p == piece).count()
    }

    pub fn find(&self, piece: Piece) -> Option<Square> {
        self.pieces().find(|&(_, p)| p == piece).map(|(square, _)| square)
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                write!(f, "{}", self.get(Square::at(file, rank)).fen_char())?;
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_is_permanent() {
        let mut board = Board::empty();
        assert_eq!(board.cell(0), Piece::OffBoard);
        assert_eq!(board.cell(20), Piece::OffBoard);
        assert_eq!(board.cell(29), Piece::OffBoard);
        assert_eq!(board.cell(500), Piece::OffBoard);
        assert_eq!(board.get(Square::A1), Piece::Empty);
        board.set(Square::A1, Piece::OffBoard);
        assert_eq!(board.get(Square::A1), Piece::Empty);
    }

    #[test]
    fn starting_layout() {
        let board = Board::starting();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.get(Square::E1), Piece::WhiteKing);
        assert_eq!(board.get(Square::D8), Piece::BlackQueen);
        assert_eq!(board.count(Piece::WhitePawn), 8);
        assert_eq!(board.count(Piece::BlackPawn), 8);
        assert_eq!(board.find(Piece::BlackKing), Some(Square::E8));
    }

    #[test]
    fn diagram() {
        let text = Board::starting().to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "8 r n b q k b n r");
        assert!(text.ends_with("a b c d e f g h"));
    }
}
