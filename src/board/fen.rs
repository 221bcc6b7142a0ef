//! FEN parsing and encoding.
//!
//! Parses standard Forsyth-Edwards Notation into the mover-relative
//! `ChessBoard`, plus the halfmove clock and fullmove number. Game
//! containers (PGN and friends) are external; they hand their start
//! positions to this module one FEN at a time.

use super::bitboard::{BitBoard, Square};
use super::board::{ChessBoard, PieceKind};

/// The standard starting position.
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Errors that can occur during FEN parsing.
#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("expected at least 4 FEN fields, got {0}")]
    MissingFields(usize),

    #[error("expected 8 ranks in piece placement, got {0}")]
    WrongRankCount(usize),

    #[error("rank '{0}' does not describe exactly 8 squares")]
    BadRank(String),

    #[error("invalid piece character: '{0}'")]
    InvalidPiece(char),

    #[error("invalid side to move: '{0}'")]
    InvalidSideToMove(String),

    #[error("invalid castling field: '{0}'")]
    InvalidCastling(String),

    #[error("invalid en-passant square: '{0}'")]
    InvalidEnPassant(String),

    #[error("invalid halfmove clock: '{0}'")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: '{0}'")]
    InvalidFullmove(String),
}

fn piece_from_char(c: char) -> Option<PieceKind> {
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

fn piece_to_char(kind: PieceKind) -> char {
    match kind {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    }
}

/// Parses a FEN string into a mover-relative board, the halfmove clock
/// (plies since the last capture or pawn move), and the fullmove number.
///
/// The clock and fullmove fields may be omitted, defaulting to 0 and 1.
pub fn parse_fen(fen: &str) -> Result<(ChessBoard, u32, u32), FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(FenError::MissingFields(fields.len()));
    }

    // Piece placement, built from white's perspective first.
    let mut board = ChessBoard::empty();
    let ranks: Vec<&str> = fields[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount(ranks.len()));
    }
    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
            } else {
                let kind = piece_from_char(c).ok_or(FenError::InvalidPiece(c))?;
                if file >= 8 {
                    return Err(FenError::BadRank(rank_str.to_string()));
                }
                board.put_piece(Square::new(file, rank), kind, c.is_ascii_uppercase());
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenError::BadRank(rank_str.to_string()));
        }
    }

    let black_to_move = match fields[1] {
        "w" => false,
        "b" => true,
        other => return Err(FenError::InvalidSideToMove(other.to_string())),
    };

    // Castling rights, still from white's perspective.
    if fields[2] != "-" {
        let rights = board.castlings_mut();
        for c in fields[2].chars() {
            match c {
                'K' => rights.set_we_can_kingside(true),
                'Q' => rights.set_we_can_queenside(true),
                'k' => rights.set_they_can_kingside(true),
                'q' => rights.set_they_can_queenside(true),
                _ => return Err(FenError::InvalidCastling(fields[2].to_string())),
            }
        }
    }

    if black_to_move {
        board = board.mirrored();
    }

    // En passant: the FEN target square sits behind the pawn that just
    // double-stepped. The board keeps only the file, marked on the
    // opponent's back rank of the mover-relative frame.
    if fields[3] != "-" {
        let sq = Square::from_name(fields[3])
            .ok_or_else(|| FenError::InvalidEnPassant(fields[3].to_string()))?;
        let expected_rank = if black_to_move { 2 } else { 5 };
        if sq.rank() != expected_rank {
            return Err(FenError::InvalidEnPassant(fields[3].to_string()));
        }
        board.set_en_passant(BitBoard::from_square(Square::new(sq.file(), 7)));
    }

    let rule50_ply = match fields.get(4) {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| FenError::InvalidHalfmoveClock(s.to_string()))?,
        None => 0,
    };
    let fullmove = match fields.get(5) {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| FenError::InvalidFullmove(s.to_string()))?,
        None => 1,
    };

    Ok((board, rule50_ply, fullmove))
}

/// Encodes a mover-relative board back into a FEN string.
pub fn encode_fen(board: &ChessBoard, rule50_ply: u32, fullmove: u32) -> String {
    // Work from white's perspective regardless of whose turn it is.
    let white_board = if board.flipped() {
        board.mirrored()
    } else {
        *board
    };

    let mut out = String::new();
    for rank in (0..8).rev() {
        let mut empty = 0;
        for file in 0..8 {
            match white_board.piece_at(Square::new(file, rank)) {
                Some((kind, ours)) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    let c = piece_to_char(kind);
                    out.push(if ours { c.to_ascii_uppercase() } else { c });
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(if board.flipped() { 'b' } else { 'w' });

    out.push(' ');
    let rights = white_board.castlings();
    if rights.no_legal_castle() {
        out.push('-');
    } else {
        if rights.we_can_kingside() {
            out.push('K');
        }
        if rights.we_can_queenside() {
            out.push('Q');
        }
        if rights.they_can_kingside() {
            out.push('k');
        }
        if rights.they_can_queenside() {
            out.push('q');
        }
    }

    out.push(' ');
    match board.en_passant().squares().next() {
        Some(marker) => {
            let rank = if board.flipped() { '3' } else { '6' };
            out.push((b'a' + marker.file()) as char);
            out.push(rank);
        }
        None => out.push('-'),
    }

    out.push_str(&format!(" {} {}", rule50_ply, fullmove));
    out
}
