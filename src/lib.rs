pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod fen;
pub mod movegen;
pub mod piece;
pub mod position;
pub mod square;
pub mod uci;

pub use board::Board;
pub use error::{CoordinateError, EngineError, FenError, MoveError};
pub use movegen::{GameStatus, Move, MoveGenerator};
pub use piece::{Color, Piece, PieceKind};
pub use position::{CastlingRights, Position, STARTING_FEN};
pub use square::{file_rank_of, square_of, Square};
