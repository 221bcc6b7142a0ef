//! Board representation.
//!
//! Data-only position model: square masks, castling rights, the
//! mover-relative board, FEN conversion, and position histories. Move
//! generation and search live in consumers of this crate, not here.

pub mod bitboard;
pub mod board;
pub mod castling;
pub mod fen;
pub mod position;

pub use bitboard::{BitBoard, Square};
pub use board::{ChessBoard, PieceKind};
pub use castling::CastlingRights;
pub use fen::{encode_fen, parse_fen, FenError, STARTPOS_FEN};
pub use position::{Position, PositionHistory};
