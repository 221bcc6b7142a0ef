//! Board symmetry selection and application.
//!
//! A transform code is a 3-bit combination of geometric symmetries:
//! bit 0 mirrors files, bit 1 mirrors ranks, bit 2 transposes across the
//! h1-a8 anti-diagonal. `choose_transform` picks the code that maps a
//! board onto its canonical orientation so that all geometrically
//! equivalent positions encode identically; `apply_transform` re-expresses
//! a square mask under a chosen code.

use std::cmp::Ordering;

use crate::board::{BitBoard, ChessBoard};

/// Leave the board as it is.
pub const NO_TRANSFORM: u8 = 0;
/// Mirror files (a-file swaps with h-file).
pub const FLIP_TRANSFORM: u8 = 1;
/// Mirror ranks (first rank swaps with eighth).
pub const MIRROR_TRANSFORM: u8 = 2;
/// Transpose across the h1-a8 anti-diagonal.
pub const TRANSPOSE_TRANSFORM: u8 = 4;

/// Files a-d on every rank.
const LEFT_HALF: u64 = 0x0F0F_0F0F_0F0F_0F0F;
/// Ranks 5-8.
const TOP_HALF: u64 = 0xFFFF_FFFF_0000_0000;
/// Squares strictly above the anti-diagonal of the bottom-right quadrant
/// (h2, g3, h3, f4, g4, h4).
const QUADRANT_UPPER_TRIANGLE: u64 = 0xE0C0_8000;
/// The anti-diagonal of the bottom-right quadrant (h1, g2, f3, e4).
const QUADRANT_DIAGONAL: u64 = 0x1020_4080;

/// Applies a transform code to a square mask.
///
/// The component permutations compose in a fixed order: files first, then
/// ranks, then the transpose. Masks of `0` and all-ones are fixed points
/// of every component, so they are returned unchanged.
pub fn apply_transform(mask: u64, transform: u8) -> u64 {
    if mask == 0 || mask == !0 {
        return mask;
    }
    let mut bb = BitBoard(mask);
    if transform & FLIP_TRANSFORM != 0 {
        bb = bb.mirror_files();
    }
    if transform & MIRROR_TRANSFORM != 0 {
        bb = bb.mirror_ranks();
    }
    if transform & TRANSPOSE_TRANSFORM != 0 {
        bb = bb.transpose();
    }
    bb.as_u64()
}

/// Compares a bitboard, as seen under the mirrors chosen so far, against
/// its transpose candidate. `Less` means the untransposed value is
/// canonical, `Greater` means the transposed one is.
fn compare_transposing(value: BitBoard, initial_transform: u8) -> Ordering {
    let mut value = value;
    if initial_transform & FLIP_TRANSFORM != 0 {
        value = value.mirror_files();
    }
    if initial_transform & MIRROR_TRANSFORM != 0 {
        value = value.mirror_ranks();
    }
    let alternative = value.transpose();
    value.as_u64().cmp(&alternative.as_u64())
}

/// Picks the canonical transform for a board.
///
/// Equivalent boards always pick the same code, which is what makes the
/// encoding canonical. The decision sequence is fixed and order-sensitive;
/// changing it would change which member of a symmetry class is canonical
/// and silently break compatibility with previously generated data.
pub fn choose_transform(board: &ChessBoard) -> u8 {
    // Castling is directionally asymmetric, even with flexible rook files,
    // so any castling right on either side rules out every symmetry.
    if !board.castlings().no_legal_castle() {
        return NO_TRANSFORM;
    }
    let mut our_king = board.kings() & board.ours();
    let mut transform = NO_TRANSFORM;
    if our_king.as_u64() & LEFT_HALF != 0 {
        transform |= FLIP_TRANSFORM;
        our_king = our_king.mirror_files();
    }
    // Pawns only move one way, so with pawns on the board the file mirror
    // is the only valid symmetry.
    if !board.pawns().is_empty() {
        return transform;
    }
    if our_king.as_u64() & TOP_HALF != 0 {
        transform |= MIRROR_TRANSFORM;
        our_king = our_king.mirror_ranks();
    }
    // The king now sits in the bottom-right quadrant. Transpose if it is
    // strictly above the quadrant's anti-diagonal; on the diagonal itself,
    // break the tie with a fixed cascade of bitboard comparisons, picking
    // whichever side yields the smaller integer at the first difference.
    if our_king.as_u64() & QUADRANT_UPPER_TRIANGLE != 0 {
        transform |= TRANSPOSE_TRANSFORM;
    } else if our_king.as_u64() & QUADRANT_DIAGONAL != 0 {
        let cascade = [
            board.ours() | board.theirs(),
            board.ours(),
            board.kings(),
            board.queens(),
            board.rooks(),
            board.knights(),
            board.bishops(),
        ];
        for value in cascade {
            match compare_transposing(value, transform) {
                Ordering::Less => return transform,
                Ordering::Greater => return transform | TRANSPOSE_TRANSFORM,
                Ordering::Equal => {}
            }
        }
        // Every bitboard is its own transpose: the position is symmetric
        // and transposing would be a no-op.
    }
    transform
}
