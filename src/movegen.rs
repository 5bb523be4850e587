use crate::error::MoveError;
use crate::piece::{
    Color, Piece, PieceKind, BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, PROMOTION_KINDS,
    ROOK_DIRECTIONS,
};
use crate::position::Position;
use crate::square::Square;
use std::fmt;
use std::str::FromStr;

/// A move as a pair of squares plus an optional promotion choice.
///
/// Whether a move is a castle, an en passant capture or a plain move is read
/// off the board when it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn new_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

/// UCI long algebraic form: `e2e4`, `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MoveError::Malformed(s.to_string());
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(malformed());
        }
        let from = s[0..2].parse::<Square>().map_err(|_| malformed())?;
        let to = s[2..4].parse::<Square>().map_err(|_| malformed())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_letter(c) {
                Some(kind) if c.is_ascii_lowercase() && kind.is_promotion_target() => Some(kind),
                _ => return Err(malformed()),
            },
        };
        Ok(Move { from, to, promotion })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate(Color), // Color is the winner
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Whether any piece of `by` attacks `square`.
    ///
    /// Works outward from the target square rather than generating moves: a
    /// piece attacks the square exactly when the square "sees" it with the
    /// same movement pattern.
    pub fn is_square_attacked(&self, position: &Position, square: Square, by: Color) -> bool {
        let board = &position.board;
        let target = square.index() as i16;
        let cell = |delta: i16| board.cell((target + delta) as usize);

        // Pawns of `by` sit one rank behind the square from their point of view
        let pawn = Piece::new(PieceKind::Pawn, by);
        let behind = -by.forward();
        if cell(behind - 1) == pawn || cell(behind + 1) == pawn {
            return true;
        }

        let knight = Piece::new(PieceKind::Knight, by);
        if KNIGHT_OFFSETS.iter().any(|&delta| cell(delta) == knight) {
            return true;
        }

        let king = Piece::new(PieceKind::King, by);
        if KING_OFFSETS.iter().any(|&delta| cell(delta) == king) {
            return true;
        }

        for &direction in &ROOK_DIRECTIONS {
            let blocker = self.first_piece_along(position, square, direction);
            if blocker.is_color(by) && blocker.is_rook_or_queen() {
                return true;
            }
        }

        for &direction in &BISHOP_DIRECTIONS {
            let blocker = self.first_piece_along(position, square, direction);
            if blocker.is_color(by) && blocker.is_bishop_or_queen() {
                return true;
            }
        }

        false
    }

    /// First non-empty cell along a ray, `OffBoard` if the ray runs out.
    fn first_piece_along(&self, position: &Position, from: Square, direction: i16) -> Piece {
        let mut index = from.index() as i16 + direction;
        loop {
            let piece = position.board.cell(index as usize);
            if !piece.is_empty() {
                return piece;
            }
            index += direction;
        }
    }

    pub fn is_king_in_check(&self, position: &Position, color: Color) -> bool {
        match position.king_square(color) {
            Some(king) => self.is_square_attacked(position, king, color.opposite()),
            None => false,
        }
    }

    /// Moves of the piece on `square` that obey its movement rules, without
    /// checking whether they expose the mover's own king.
    pub fn pseudo_legal_from(&self, position: &Position, square: Square) -> Vec<Move> {
        let mut moves = Vec::new();
        let piece = position.board.get(square);
        let color = match piece.color() {
            Some(color) => color,
            None => return moves,
        };

        if piece.is_pawn() {
            self.pawn_moves(position, square, color, &mut moves);
            return moves;
        }

        for &direction in piece.directions() {
            let mut index = square.index() as i16 + direction;
            loop {
                let target = position.board.cell(index as usize);
                if target == Piece::OffBoard || target.is_color(color) {
                    break;
                }
                if let Ok(to) = Square::from_mailbox(index as usize) {
                    moves.push(Move::new(square, to));
                }
                if !target.is_empty() || !piece.slides() {
                    break;
                }
                index += direction;
            }
        }

        if piece.is_king() {
            self.castling_moves(position, square, color, &mut moves);
        }
        moves
    }

    fn pawn_moves(&self, position: &Position, from: Square, color: Color, moves: &mut Vec<Move>) {
        let board = &position.board;
        let forward = color.forward();
        let (home_rank, last_rank, en_passant_rank) = match color {
            Color::White => (1, 7, 4),
            Color::Black => (6, 0, 3),
        };

        let push = |to: Square, moves: &mut Vec<Move>| {
            if to.rank() == last_rank {
                for kind in PROMOTION_KINDS {
                    moves.push(Move::new_promotion(from, to, kind));
                }
            } else {
                moves.push(Move::new(from, to));
            }
        };

        if let Some(one) = from.offset(forward) {
            if board.get(one).is_empty() {
                push(one, moves);
                if from.rank() == home_rank {
                    if let Some(two) = one.offset(forward) {
                        if board.get(two).is_empty() {
                            moves.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        for side in [-1, 1] {
            let to = match from.offset(forward + side) {
                Some(to) => to,
                None => continue,
            };
            let target = board.get(to);
            if target.is_color(color.opposite()) {
                push(to, moves);
            } else if target.is_empty()
                && position.en_passant == Some(to)
                && from.rank() == en_passant_rank
            {
                let enemy_pawn = Piece::new(PieceKind::Pawn, color.opposite());
                if to.offset(-forward).map(|behind| board.get(behind)) == Some(enemy_pawn) {
                    moves.push(Move::new(from, to));
                }
            }
        }
    }

    fn castling_moves(&self, position: &Position, king: Square, color: Color, moves: &mut Vec<Move>) {
        let (home, rook_kingside, rook_queenside) = match color {
            Color::White => (Square::E1, Square::H1, Square::A1),
            Color::Black => (Square::E8, Square::H8, Square::A8),
        };
        if king != home {
            return;
        }
        let rights = position.castling_rights;
        if !rights.kingside(color) && !rights.queenside(color) {
            return;
        }
        let enemy = color.opposite();
        if self.is_square_attacked(position, king, enemy) {
            return;
        }
        let rook = Piece::new(PieceKind::Rook, color);
        let board = &position.board;
        let empty = |squares: &[i16]| {
            squares
                .iter()
                .all(|&delta| king.offset(delta).map(|s| board.get(s).is_empty()) == Some(true))
        };
        let safe = |squares: &[i16]| {
            squares.iter().all(|&delta| match king.offset(delta) {
                Some(s) => !self.is_square_attacked(position, s, enemy),
                None => false,
            })
        };

        if rights.kingside(color) && board.get(rook_kingside) == rook && empty(&[1, 2]) && safe(&[1, 2]) {
            if let Some(to) = king.offset(2) {
                moves.push(Move::new(king, to));
            }
        }
        if rights.queenside(color)
            && board.get(rook_queenside) == rook
            && empty(&[-1, -2, -3])
            && safe(&[-1, -2])
        {
            if let Some(to) = king.offset(-2) {
                moves.push(Move::new(king, to));
            }
        }
    }

    pub fn pseudo_legal_moves(&self, position: &Position) -> Vec<Move> {
        position
            .board
            .pieces()
            .filter(|(_, piece)| piece.is_color(position.side_to_move))
            .flat_map(|(square, _)| self.pseudo_legal_from(position, square))
            .collect()
    }

    /// Whether playing `mv` leaves the mover's king unattacked. The move is
    /// tried on a copy; the original position is never touched.
    fn keeps_king_safe(&self, position: &Position, mv: Move) -> bool {
        let mover = position.side_to_move;
        let mut trial = position.clone();
        trial.apply_move(mv).is_ok() && !self.is_king_in_check(&trial, mover)
    }

    /// Legal moves of the piece on `square`; empty if it is not the side to move's.
    pub fn moves_from(&self, position: &Position, square: Square) -> Vec<Move> {
        if !position.board.get(square).is_color(position.side_to_move) {
            return Vec::new();
        }
        self.pseudo_legal_from(position, square)
            .into_iter()
            .filter(|&mv| self.keeps_king_safe(position, mv))
            .collect()
    }

    pub fn legal_moves(&self, position: &Position) -> Vec<Move> {
        self.pseudo_legal_moves(position)
            .into_iter()
            .filter(|&mv| self.keeps_king_safe(position, mv))
            .collect()
    }

    /// Legal moves `color` would have if it were on move in this placement.
    fn legal_moves_for(&self, position: &Position, color: Color) -> Vec<Move> {
        if position.side_to_move == color {
            return self.legal_moves(position);
        }
        let mut turned = position.clone();
        turned.side_to_move = color;
        turned.en_passant = None;
        self.legal_moves(&turned)
    }

    pub fn is_checkmate(&self, position: &Position, color: Color) -> bool {
        self.is_king_in_check(position, color) && self.legal_moves_for(position, color).is_empty()
    }

    pub fn is_stalemate(&self, position: &Position) -> bool {
        let color = position.side_to_move;
        !self.is_king_in_check(position, color) && self.legal_moves(position).is_empty()
    }

    pub fn game_status(&self, position: &Position) -> GameStatus {
        let color = position.side_to_move;
        if self.legal_moves(position).is_empty() {
            if self.is_king_in_check(position, color) {
                return GameStatus::Checkmate(color.opposite());
            }
            return GameStatus::Stalemate;
        }

        if position.halfmove_clock >= 100 {
            return GameStatus::FiftyMoveRule;
        }

        if self.is_insufficient_material(position) {
            return GameStatus::InsufficientMaterial;
        }

        GameStatus::Ongoing
    }

    pub fn is_game_over(&self, position: &Position) -> bool {
        self.game_status(position) != GameStatus::Ongoing
    }

    fn is_insufficient_material(&self, position: &Position) -> bool {
        let mut minors = Vec::new();
        for (square, piece) in position.board.pieces() {
            if piece.is_king() {
                continue;
            }
            if piece.is_knight() || piece.kind() == Some(PieceKind::Bishop) {
                minors.push((square, piece));
            } else {
                return false;
            }
        }

        match minors.as_slice() {
            // King vs King, or a single minor piece
            [] | [_] => true,
            // Opposing bishops on the same square color
            [(a, first), (b, second)] => {
                first.kind() == Some(PieceKind::Bishop)
                    && second.kind() == Some(PieceKind::Bishop)
                    && first.color() != second.color()
                    && (a.file() + a.rank()) % 2 == (b.file() + b.rank()) % 2
            }
            _ => false,
        }
    }

    /// Counts leaf nodes of the legal move tree to `depth` plies.
    pub fn perft(&self, position: &Position, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = self.legal_moves(position);
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for mv in moves {
            let mut next = position.clone();
            if next.apply_move(mv).is_ok() {
                nodes += self.perft(&next, depth - 1);
            }
        }

        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn targets(moves: &[Move]) -> Vec<String> {
        let mut names: Vec<String> = moves.iter().map(|mv| mv.to.name()).collect();
        names.sort();
        names
    }

    #[test]
    fn move_text() {
        let mv: Move = "e7e8q".parse().unwrap();
        assert_eq!(mv.from, sq("e7"));
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
        assert!("e7e8k".parse::<Move>().is_err());
        assert!("e7e8Q".parse::<Move>().is_err());
        assert!("e7e".parse::<Move>().is_err());
        assert!("e9e8".parse::<Move>().is_err());
    }

    #[test]
    fn rook_on_empty_board_attacks_its_lines() {
        let generator = MoveGenerator::new();
        let mut position = Position::new();
        position.board = Board::empty();
        position.board.set(sq("d4"), Piece::WhiteRook);
        for square in Square::all() {
            let on_lines = square != sq("d4") && (square.file() == 3 || square.rank() == 3);
            assert_eq!(
                generator.is_square_attacked(&position, square, Color::White),
                on_lines,
                "square {}",
                square
            );
            assert!(!generator.is_square_attacked(&position, square, Color::Black));
        }
    }

    #[test]
    fn pawn_attacks_point_forward() {
        let generator = MoveGenerator::new();
        let position = position("4k3/8/8/3p4/8/8/4P3/4K3 w - - 0 1");
        assert!(generator.is_square_attacked(&position, sq("d3"), Color::White));
        assert!(generator.is_square_attacked(&position, sq("f3"), Color::White));
        assert!(!generator.is_square_attacked(&position, sq("e3"), Color::White));
        assert!(generator.is_square_attacked(&position, sq("c4"), Color::Black));
        assert!(generator.is_square_attacked(&position, sq("e4"), Color::Black));
        assert!(!generator.is_square_attacked(&position, sq("d6"), Color::Black));
    }

    #[test]
    fn sliders_are_blocked() {
        let generator = MoveGenerator::new();
        let position = position("4k3/8/8/8/1b6/2P5/8/4K3 w - - 0 1");
        let moves = generator.pseudo_legal_from(&position, sq("b4"));
        assert_eq!(targets(&moves), vec!["a3", "a5", "c3", "c5", "d6", "e7", "f8"]);
        assert!(!generator.is_square_attacked(&position, sq("d2"), Color::Black));
    }

    #[test]
    fn knight_stays_on_the_board() {
        let generator = MoveGenerator::new();
        let position = position("4k3/8/8/8/8/8/8/N3K3 w - - 0 1");
        let moves = generator.moves_from(&position, Square::A1);
        assert_eq!(targets(&moves), vec!["b3", "c2"]);
    }

    #[test]
    fn pawn_pushes_and_promotions() {
        let generator = MoveGenerator::new();
        let start = Position::new();
        assert_eq!(targets(&generator.moves_from(&start, sq("e2"))), vec!["e3", "e4"]);

        let blocked = position("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        assert!(generator.moves_from(&blocked, sq("e2")).is_empty());

        let promoting = position("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let moves = generator.moves_from(&promoting, sq("a7"));
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|mv| mv.promotion.is_some()));
    }

    #[test]
    fn en_passant_is_offered() {
        let generator = MoveGenerator::new();
        let position =
            position("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3");
        let moves = generator.moves_from(&position, sq("e5"));
        assert_eq!(targets(&moves), vec!["d6", "e6"]);
    }

    #[test]
    fn castling_requires_safe_path() {
        let generator = MoveGenerator::new();
        let open = position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let moves = generator.moves_from(&open, Square::E1);
        assert!(moves.contains(&Move::new(Square::E1, Square::G1)));
        assert!(moves.contains(&Move::new(Square::E1, Square::C1)));

        // f1 is covered by the bishop
        let guarded = position("r3k2r/8/8/8/8/8/6b1/R3K2R w KQkq - 0 1");
        let moves = generator.moves_from(&guarded, Square::E1);
        assert!(!moves.contains(&Move::new(Square::E1, Square::G1)));

        // b1 only has to be empty, not safe
        let b1_attacked = position("1r2k2r/8/8/8/8/8/8/R3K2R w KQk - 0 1");
        assert!(generator
            .moves_from(&b1_attacked, Square::E1)
            .contains(&Move::new(Square::E1, Square::C1)));

        let b1_occupied = position("r3k2r/8/8/8/8/8/8/Rn2K2R w KQkq - 0 1");
        assert!(!generator
            .moves_from(&b1_occupied, Square::E1)
            .contains(&Move::new(Square::E1, Square::C1)));

        let in_check = position("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1");
        let moves = generator.moves_from(&in_check, Square::E1);
        assert!(!moves.contains(&Move::new(Square::E1, Square::G1)));
        assert!(!moves.contains(&Move::new(Square::E1, Square::C1)));

        let no_rights = position("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1");
        assert_eq!(generator.moves_from(&no_rights, Square::E1).len(), 5);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let generator = MoveGenerator::new();
        let position = position("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(generator.moves_from(&position, sq("e2")).is_empty());
        assert!(!generator.pseudo_legal_from(&position, sq("e2")).is_empty());
    }

    #[test]
    fn checkmate_and_stalemate() {
        let generator = MoveGenerator::new();
        let mate = position("k7/1Q6/1K6/8/8/8/8/8 b - - 0 1");
        assert!(generator.is_checkmate(&mate, Color::Black));
        assert!(!generator.is_checkmate(&mate, Color::White));
        assert_eq!(generator.game_status(&mate), GameStatus::Checkmate(Color::White));
        assert!(generator.is_game_over(&mate));

        let stale = position("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1");
        assert!(generator.is_stalemate(&stale));
        assert_eq!(generator.game_status(&stale), GameStatus::Stalemate);
        assert!(!generator.is_checkmate(&stale, Color::Black));
    }

    #[test]
    fn checkmate_of_the_side_not_on_move() {
        let generator = MoveGenerator::new();
        // Back-rank mate delivered, asked about from White's turn
        let position = position("R5k1/5ppp/8/8/8/8/8/6K1 w - - 0 2");
        assert!(generator.is_checkmate(&position, Color::Black));
    }

    #[test]
    fn draw_statuses() {
        let generator = MoveGenerator::new();
        let bare = position("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(generator.game_status(&bare), GameStatus::InsufficientMaterial);

        let knight = position("4k3/8/8/8/8/8/8/4KN2 w - - 0 1");
        assert_eq!(generator.game_status(&knight), GameStatus::InsufficientMaterial);

        let same_color_bishops = position("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert_eq!(
            generator.game_status(&same_color_bishops),
            GameStatus::InsufficientMaterial
        );

        let rook = position("4k3/8/8/8/8/8/8/4KR2 w - - 0 1");
        assert_eq!(generator.game_status(&rook), GameStatus::Ongoing);

        let idle = position("4k3/8/8/8/8/8/8/4KR2 w - - 100 60");
        assert_eq!(generator.game_status(&idle), GameStatus::FiftyMoveRule);
    }
}
