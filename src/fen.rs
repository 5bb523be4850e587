//! FEN (Forsyth-Edwards Notation) parsing, validation and serialization.
//!
//! Parsing checks the text in two passes. The structural pass checks the
//! six-field grammar; the semantic pass checks that the decoded position
//! could arise in a game (king and pawn counts, clock consistency). Each
//! broken rule has its own `FenError` variant.

use crate::board::Board;
use crate::error::FenError;
use crate::piece::{Color, Piece, PieceKind};
use crate::position::{CastlingRights, Position};
use crate::square::Square;
use log::debug;

/// Decodes and validates a FEN string.
pub fn parse(fen: &str) -> Result<Position, FenError> {
    let result = parse_fields(fen).and_then(|fields| {
        check_semantics(&fields)?;
        fields.into_position()
    });
    if let Err(err) = &result {
        debug!("rejected FEN '{}': {}", fen, err);
    }
    result
}

/// Checks a FEN string without keeping the position.
pub fn validate(fen: &str) -> Result<(), FenError> {
    parse(fen).map(|_| ())
}

pub fn is_valid(fen: &str) -> bool {
    validate(fen).is_ok()
}

/// Encodes a position. `parse(&serialize(p))` reproduces `p`.
pub fn serialize(position: &Position) -> String {
    let mut placement = String::new();
    for rank in (0..8).rev() {
        let mut empty = 0;
        for file in 0..8 {
            let piece = position.board.get(Square::at(file, rank));
            if piece.is_piece() {
                if empty > 0 {
                    placement.push_str(&empty.to_string());
                    empty = 0;
                }
                placement.push(piece.fen_char());
            } else {
                empty += 1;
            }
        }
        if empty > 0 {
            placement.push_str(&empty.to_string());
        }
        if rank > 0 {
            placement.push('/');
        }
    }

    let en_passant = match position.en_passant {
        Some(square) => square.name(),
        None => "-".to_string(),
    };

    format!(
        "{} {} {} {} {} {}",
        placement,
        position.side_to_move.fen_char(),
        position.castling_rights,
        en_passant,
        position.halfmove_clock,
        position.fullmove_number
    )
}

/// Fields that passed the structural checks. Clocks stay signed until the
/// semantic pass has ruled out negative values.
struct Fields {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: i64,
    fullmove_number: i64,
}

impl Fields {
    fn into_position(self) -> Result<Position, FenError> {
        let halfmove_clock = u32::try_from(self.halfmove_clock)
            .map_err(|_| FenError::InvalidHalfmoveClock(self.halfmove_clock.to_string()))?;
        let fullmove_number = u32::try_from(self.fullmove_number)
            .map_err(|_| FenError::InvalidFullmoveNumber(self.fullmove_number.to_string()))?;
        Ok(Position {
            board: self.board,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }
}

fn parse_fields(fen: &str) -> Result<Fields, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() != 6 {
        return Err(FenError::WrongFieldCount(parts.len()));
    }

    Ok(Fields {
        board: parse_placement(parts[0])?,
        side_to_move: parse_side_to_move(parts[1])?,
        castling_rights: parse_castling(parts[2])?,
        en_passant: parse_en_passant(parts[3])?,
        halfmove_clock: parse_counter(parts[4])
            .ok_or_else(|| FenError::InvalidHalfmoveClock(parts[4].to_string()))?,
        fullmove_number: parse_counter(parts[5])
            .ok_or_else(|| FenError::InvalidFullmoveNumber(parts[5].to_string()))?,
    })
}

fn parse_placement(placement: &str) -> Result<Board, FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount(ranks.len()));
    }

    let mut board = Board::empty();
    for (row, text) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let rank_label = rank + 1;
        let mut cells: u32 = 0;
        let mut previous_digit = false;

        for ch in text.chars() {
            if let Some(run) = ch.to_digit(10) {
                if previous_digit {
                    return Err(FenError::AdjacentDigits { rank: rank_label });
                }
                if !(1..=8).contains(&run) {
                    return Err(FenError::InvalidPieceChar { rank: rank_label, ch });
                }
                previous_digit = true;
                cells += run;
                continue;
            }
            previous_digit = false;

            let piece = Piece::from_fen_char(ch)
                .ok_or(FenError::InvalidPieceChar { rank: rank_label, ch })?;
            if cells < 8 {
                board.set(Square::at(cells as u8, rank), piece);
            }
            cells += 1;
        }

        if cells != 8 {
            return Err(FenError::BadRankLength {
                rank: rank_label,
                cells,
            });
        }
    }

    Ok(board)
}

fn parse_side_to_move(field: &str) -> Result<Color, FenError> {
    match field {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(FenError::InvalidSideToMove(field.to_string())),
    }
}

/// `-` or a non-empty set of `KQkq` letters, each at most once, in any order.
fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::none();
    if field == "-" {
        return Ok(rights);
    }
    let invalid = || FenError::InvalidCastling(field.to_string());
    if field.is_empty() {
        return Err(invalid());
    }

    for ch in field.chars() {
        let flag = match ch {
            'K' => &mut rights.white_kingside,
            'Q' => &mut rights.white_queenside,
            'k' => &mut rights.black_kingside,
            'q' => &mut rights.black_queenside,
            _ => return Err(invalid()),
        };
        if *flag {
            return Err(invalid());
        }
        *flag = true;
    }

    Ok(rights)
}

/// `-` or a square on rank 3 or rank 6.
fn parse_en_passant(field: &str) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let square: Square = field
        .parse()
        .map_err(|_| FenError::InvalidEnPassant(field.to_string()))?;
    if square.rank() != 2 && square.rank() != 5 {
        return Err(FenError::InvalidEnPassant(field.to_string()));
    }
    Ok(Some(square))
}

/// An optionally signed run of decimal digits no larger than a `u32`.
/// Negative values are left for the semantic pass to name.
fn parse_counter(field: &str) -> Option<i64> {
    let digits = field.strip_prefix('-').unwrap_or(field);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = field.parse().ok()?;
    (value <= i64::from(u32::MAX)).then_some(value)
}

fn check_semantics(fields: &Fields) -> Result<(), FenError> {
    let board = &fields.board;

    for color in [Color::White, Color::Black] {
        let kings = board.count(Piece::new(PieceKind::King, color));
        if kings != 1 {
            return Err(FenError::KingCount { color, count: kings });
        }
    }

    for color in [Color::White, Color::Black] {
        let pawns = board.count(Piece::new(PieceKind::Pawn, color));
        if pawns > 8 {
            return Err(FenError::TooManyPawns { color, count: pawns });
        }
    }

    if let Some((square, _)) = board
        .pieces()
        .find(|(square, piece)| piece.is_pawn() && (square.rank() == 0 || square.rank() == 7))
    {
        return Err(FenError::PawnOnBackRank {
            square: square.name(),
        });
    }

    if let Some(square) = fields.en_passant {
        // The pawn that just double-stepped belongs to the side not on move
        let expected_rank = match fields.side_to_move {
            Color::White => 5,
            Color::Black => 2,
        };
        if square.rank() != expected_rank {
            return Err(FenError::EnPassantRankMismatch {
                square: square.name(),
            });
        }
        if fields.halfmove_clock != 0 {
            return Err(FenError::EnPassantWithHalfmoveClock(fields.halfmove_clock));
        }
    }

    if fields.halfmove_clock < 0 {
        return Err(FenError::NegativeHalfmoveClock(fields.halfmove_clock));
    }

    if fields.fullmove_number < 1 {
        return Err(FenError::FullmoveNumberTooSmall(fields.fullmove_number));
    }

    let black_to_move = match fields.side_to_move {
        Color::White => 0,
        Color::Black => 1,
    };
    let limit = (fields.fullmove_number - 1)
        .checked_mul(2)
        .and_then(|plies| plies.checked_add(black_to_move))
        .unwrap_or(i64::MAX);
    if fields.halfmove_clock > limit {
        return Err(FenError::HalfmoveClockTooLarge {
            halfmove: fields.halfmove_clock,
            limit,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::STARTING_FEN;

    #[test]
    fn starting_position() {
        let position = parse(STARTING_FEN).unwrap();
        assert_eq!(position, Position::new());
        assert_eq!(position.board.pieces().filter(|(_, p)| p.is_color(Color::White)).count(), 16);
        assert_eq!(position.board.pieces().filter(|(_, p)| p.is_color(Color::Black)).count(), 16);
        assert_eq!(position.castling_rights, CastlingRights::all());
        assert_eq!(position.en_passant, None);
        assert_eq!(position.halfmove_clock, 0);
        assert_eq!(position.fullmove_number, 1);
        assert_eq!(serialize(&position), STARTING_FEN);
    }

    #[test]
    fn serialization_is_canonical() {
        let cases = [
            (
                "r3k2r/8/8/8/8/8/8/R3K2R w qkQK - 0 1",
                "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
            ),
            (
                "  4k3/8/8/8/8/8/8/4K3   b -  -  3 12 ",
                "4k3/8/8/8/8/8/8/4K3 b - - 3 12",
            ),
            (
                "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
                "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
            ),
        ];
        for (input, canonical) in cases {
            let position = parse(input).unwrap();
            assert_eq!(serialize(&position), canonical);
            assert_eq!(parse(canonical).unwrap(), position);
        }
    }

    #[test]
    fn structural_errors() {
        let cases = [
            ("", FenError::WrongFieldCount(0)),
            ("4k3/8/8/8/8/8/8/4K3 w - - 0", FenError::WrongFieldCount(5)),
            ("4k3/8/8/8/8/8/4K3 w - - 0 1", FenError::WrongRankCount(7)),
            (
                "4k3/8/8/8/8/8/8/4X3 w - - 0 1",
                FenError::InvalidPieceChar { rank: 1, ch: 'X' },
            ),
            (
                "4k3/8/8/8/8/8/8/4K12 w - - 0 1",
                FenError::AdjacentDigits { rank: 1 },
            ),
            (
                "4k3/8/8/8/8/8/8/0K7 w - - 0 1",
                FenError::InvalidPieceChar { rank: 1, ch: '0' },
            ),
            (
                "4k3/8/8/8/8/8/8/4K2 w - - 0 1",
                FenError::BadRankLength { rank: 1, cells: 7 },
            ),
            (
                "4k4/8/8/8/8/8/8/4K3 w - - 0 1",
                FenError::BadRankLength { rank: 8, cells: 9 },
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 x - - 0 1",
                FenError::InvalidSideToMove("x".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w KK - 0 1",
                FenError::InvalidCastling("KK".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w Kx - 0 1",
                FenError::InvalidCastling("Kx".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w - e4 0 1",
                FenError::InvalidEnPassant("e4".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w - z6 0 1",
                FenError::InvalidEnPassant("z6".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w - - x 1",
                FenError::InvalidHalfmoveClock("x".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w - - 0 +1",
                FenError::InvalidFullmoveNumber("+1".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 b - - 0 9223372036854775807",
                FenError::InvalidFullmoveNumber("9223372036854775807".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 b - - 0 4294967296",
                FenError::InvalidFullmoveNumber("4294967296".into()),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 b - - 99999999999999999999 1",
                FenError::InvalidHalfmoveClock("99999999999999999999".into()),
            ),
        ];
        for (fen, expected) in cases {
            let err = validate(fen).unwrap_err();
            assert_eq!(err, expected, "{}", fen);
            assert!(!err.is_semantic(), "{}", fen);
        }
    }

    #[test]
    fn semantic_errors() {
        let cases = [
            (
                "8/8/8/8/8/8/8/8 w - - 0 1",
                FenError::KingCount {
                    color: Color::White,
                    count: 0,
                },
            ),
            (
                "4k3/8/8/8/8/8/8/3KK3 w - - 0 1",
                FenError::KingCount {
                    color: Color::White,
                    count: 2,
                },
            ),
            (
                "8/8/8/8/8/8/8/4K3 w - - 0 1",
                FenError::KingCount {
                    color: Color::Black,
                    count: 0,
                },
            ),
            (
                "4k3/8/8/8/8/P7/PPPPPPPP/4K3 w - - 0 1",
                FenError::TooManyPawns {
                    color: Color::White,
                    count: 9,
                },
            ),
            (
                "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
                FenError::PawnOnBackRank {
                    square: "a8".into(),
                },
            ),
            (
                "4k3/8/8/8/8/8/8/4K2p w - - 0 1",
                FenError::PawnOnBackRank {
                    square: "h1".into(),
                },
            ),
            (
                "4k3/8/8/3pP3/8/8/8/4K3 w - d6 5 3",
                FenError::EnPassantWithHalfmoveClock(5),
            ),
            (
                "4k3/8/8/8/3Pp3/8/8/4K3 w - d3 0 3",
                FenError::EnPassantRankMismatch {
                    square: "d3".into(),
                },
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w - - -1 1",
                FenError::NegativeHalfmoveClock(-1),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w - - 0 0",
                FenError::FullmoveNumberTooSmall(0),
            ),
            (
                "4k3/8/8/8/8/8/8/4K3 w - - 3 2",
                FenError::HalfmoveClockTooLarge {
                    halfmove: 3,
                    limit: 2,
                },
            ),
        ];
        for (fen, expected) in cases {
            let err = validate(fen).unwrap_err();
            assert_eq!(err, expected, "{}", fen);
            assert!(err.is_semantic(), "{}", fen);
        }
    }

    #[test]
    fn halfmove_limit_counts_black_to_move() {
        assert!(is_valid("4k3/8/8/8/8/8/8/4K3 b - - 3 2"));
        assert!(!is_valid("4k3/8/8/8/8/8/8/4K3 w - - 3 2"));
        assert!(is_valid("4k3/8/8/8/8/8/8/4K3 b - - 1 1"));
    }

    #[test]
    fn largest_counters() {
        let position = parse("4k3/8/8/8/8/8/8/4K3 b - - 4294967295 4294967295").unwrap();
        assert_eq!(position.halfmove_clock, u32::MAX);
        assert_eq!(position.fullmove_number, u32::MAX);
        assert_eq!(
            validate("4k3/8/8/8/8/8/8/4K3 w - - -4294967295 1"),
            Err(FenError::NegativeHalfmoveClock(-4294967295))
        );
    }
}
