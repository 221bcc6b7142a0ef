//! Position-history to input-plane encoding.
//!
//! Serializes a `PositionHistory` into the fixed 112-plane network input:
//! 8 history slots of 13 planes each (six of our piece types, six of the
//! opponent's, one repetition flag), followed by 8 auxiliary planes whose
//! meaning depends on the input format. The canonical format additionally
//! normalizes the whole encoding through the symmetry transform so that
//! geometrically equivalent positions produce identical tensors.

use crate::board::{ChessBoard, PositionHistory};

use super::transform::{apply_transform, choose_transform, NO_TRANSFORM};

/// History slots in the encoding.
pub const MOVE_HISTORY: usize = 8;
/// Planes per history slot.
pub const PLANES_PER_BOARD: usize = 13;
/// Index of the first auxiliary plane.
pub const AUX_PLANE_BASE: usize = PLANES_PER_BOARD * MOVE_HISTORY;
/// Total planes in one encoding.
pub const TOTAL_PLANES: usize = AUX_PLANE_BASE + 8;

/// The supported network input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Four uniform castling planes, one per right.
    Classical,
    /// Two castling planes marking the files of rooks that still hold
    /// rights, for both sides at once.
    CastlingPlane,
    /// Like `CastlingPlane`, plus symmetry canonicalization and an exact
    /// en-passant square plane.
    Canonical,
}

/// An input format number not supported by this encoder.
#[derive(Debug, thiserror::Error)]
#[error("unsupported input plane encoding {0}")]
pub struct UnsupportedFormat(pub u32);

impl InputFormat {
    /// Validates a raw wire/CLI format number. This is the only place an
    /// unsupported format can surface; past it, dispatch is exhaustive.
    pub fn from_raw(raw: u32) -> Result<InputFormat, UnsupportedFormat> {
        match raw {
            1 => Ok(InputFormat::Classical),
            2 => Ok(InputFormat::CastlingPlane),
            3 => Ok(InputFormat::Canonical),
            other => Err(UnsupportedFormat(other)),
        }
    }

    pub const fn as_raw(self) -> u32 {
        match self {
            InputFormat::Classical => 1,
            InputFormat::CastlingPlane => 2,
            InputFormat::Canonical => 3,
        }
    }
}

/// What to do when the game is shorter than the requested history depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillEmptyHistory {
    /// Leave the remaining history planes zeroed.
    No,
    /// Synthesize copies of the oldest position, unless the game started
    /// from the standard starting position.
    FenOnly,
    /// Always synthesize copies of the oldest position.
    Always,
}

/// One network input plane: either a square mask or a uniform value
/// broadcast over all 64 squares (mask all-ones, `value` carrying the
/// scalar).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputPlane {
    pub mask: u64,
    pub value: f32,
}

impl InputPlane {
    pub fn set_all(&mut self) {
        self.mask = !0;
    }

    pub fn fill(&mut self, value: f32) {
        self.mask = !0;
        self.value = value;
    }
}

impl Default for InputPlane {
    fn default() -> InputPlane {
        InputPlane {
            mask: 0,
            value: 1.0,
        }
    }
}

/// The full fixed-length plane sequence of one encoded position.
pub type InputPlanes = [InputPlane; TOTAL_PLANES];

/// The transform the encoder would use for this history, without encoding.
pub fn transform_for_position(input_format: InputFormat, history: &PositionHistory) -> u8 {
    if input_format != InputFormat::Canonical {
        return NO_TRANSFORM;
    }
    choose_transform(history.last().board())
}

/// Encodes a position history into input planes.
///
/// Returns the planes together with the transform code that was applied;
/// callers that need to map square indices back (move legality checks,
/// policy heads) must route them through the same code.
pub fn encode_position_for_nn(
    input_format: InputFormat,
    history: &PositionHistory,
    history_planes: usize,
    fill_empty_history: FillEmptyHistory,
) -> (InputPlanes, u8) {
    let mut result: InputPlanes = [InputPlane::default(); TOTAL_PLANES];

    let mut transform = NO_TRANSFORM;
    // The canonical format stops filling history at transitions the
    // transform cannot cross (castling-rights changes, en passant,
    // irreversible moves); history beyond those points cannot affect the
    // game anyway, which also makes the encoding more canonical.
    let stop_early = input_format == InputFormat::Canonical;
    let current_castlings;
    {
        let board = history.last().board();
        let we_are_black = board.flipped();
        if input_format == InputFormat::Canonical {
            transform = choose_transform(board);
        }
        match input_format {
            InputFormat::Classical => {
                // One uniform plane per castling right.
                if board.castlings().we_can_queenside() {
                    result[AUX_PLANE_BASE].set_all();
                }
                if board.castlings().we_can_kingside() {
                    result[AUX_PLANE_BASE + 1].set_all();
                }
                if board.castlings().they_can_queenside() {
                    result[AUX_PLANE_BASE + 2].set_all();
                }
                if board.castlings().they_can_kingside() {
                    result[AUX_PLANE_BASE + 3].set_all();
                }
            }
            InputFormat::CastlingPlane | InputFormat::Canonical => {
                // Both sides share two planes marking the files of rooks
                // that still hold queenside/kingside rights, on the first
                // and eighth ranks.
                const A1: u64 = 1;
                const A8: u64 = 1 << 56;
                let cast = board.castlings();
                result[AUX_PLANE_BASE].mask = ((if cast.we_can_queenside() { A1 } else { 0 })
                    | (if cast.they_can_queenside() { A8 } else { 0 }))
                    << cast.queenside_rook();
                result[AUX_PLANE_BASE + 1].mask = ((if cast.we_can_kingside() { A1 } else { 0 })
                    | (if cast.they_can_kingside() { A8 } else { 0 }))
                    << cast.kingside_rook();
            }
        }
        if input_format == InputFormat::Canonical {
            result[AUX_PLANE_BASE + 4].mask = board.en_passant().as_u64();
        } else if we_are_black {
            result[AUX_PLANE_BASE + 4].set_all();
        }
        result[AUX_PLANE_BASE + 5].fill(history.last().rule50_ply() as f32);
        // Plane AUX_PLANE_BASE + 6 used to carry the move count and is now
        // always zero. Plane AUX_PLANE_BASE + 7 is all ones so the network
        // can find the board edges.
        result[AUX_PLANE_BASE + 7].set_all();
        current_castlings = board.castlings();
    }

    let mut flip = false;
    let mut history_idx = history.len() as isize - 1;
    for i in 0..history_planes.min(MOVE_HISTORY) {
        let position = history.get(history_idx.max(0) as usize);
        let board = if flip {
            position.them_board()
        } else {
            *position.board()
        };
        // Castling-rights changes are irreversible, so nothing before one
        // is relevant.
        if stop_early && board.castlings() != current_castlings {
            break;
        }
        // En passant cannot repeat, but the current position itself must
        // always be sent.
        if stop_early
            && history_idx != history.len() as isize - 1
            && !board.en_passant().is_empty()
        {
            break;
        }
        if history_idx < 0 && fill_empty_history == FillEmptyHistory::No {
            break;
        }
        // The board may be flipped here, so compare the position's own
        // board against the starting position.
        if history_idx < 0
            && fill_empty_history == FillEmptyHistory::FenOnly
            && *position.board() == ChessBoard::startpos()
        {
            break;
        }

        let base = i * PLANES_PER_BOARD;
        result[base].mask = (board.ours() & board.pawns()).as_u64();
        result[base + 1].mask = (board.ours() & board.knights()).as_u64();
        result[base + 2].mask = (board.ours() & board.bishops()).as_u64();
        result[base + 3].mask = (board.ours() & board.rooks()).as_u64();
        result[base + 4].mask = (board.ours() & board.queens()).as_u64();
        result[base + 5].mask = (board.ours() & board.kings()).as_u64();

        result[base + 6].mask = (board.theirs() & board.pawns()).as_u64();
        result[base + 7].mask = (board.theirs() & board.knights()).as_u64();
        result[base + 8].mask = (board.theirs() & board.bishops()).as_u64();
        result[base + 9].mask = (board.theirs() & board.rooks()).as_u64();
        result[base + 10].mask = (board.theirs() & board.queens()).as_u64();
        result[base + 11].mask = (board.theirs() & board.kings()).as_u64();

        if position.repetitions() >= 1 {
            result[base + 12].set_all();
        }

        // Synthesized plies must describe a position that could actually
        // have preceded the oldest real one: undo the double pawn step an
        // active en-passant marker implies.
        if history_idx < 0 && !board.en_passant().is_empty() {
            let idx = board.en_passant().as_u64().trailing_zeros() as u64;
            if idx < 8 {
                result[base].mask &= !(1u64 << (24 + idx));
                result[base].mask |= 1u64 << (8 + idx);
            } else {
                let file = idx - 56;
                result[base + 6].mask &= !(1u64 << (32 + file));
                result[base + 6].mask |= 1u64 << (48 + file);
            }
        }
        if history_idx > 0 {
            flip = !flip;
        }
        // A zero no-capture counter means the previous ply was the game
        // start, a capture, or a pawn move; nothing before it can repeat.
        if stop_early && position.rule50_ply() == 0 {
            break;
        }
        history_idx -= 1;
    }

    if transform != NO_TRANSFORM {
        for plane in result.iter_mut().take(AUX_PLANE_BASE + 5) {
            plane.mask = apply_transform(plane.mask, transform);
        }
    }

    (result, transform)
}
