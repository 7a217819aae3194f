//! Piece-square tables for the positional evaluator.
//!
//! The values are from the [Chess Programming Wiki](https://www.chessprogramming.org/Simplified_Evaluation_Function).
//! Tables are indexed by square from White's point of view, a1 = 0 and
//! h8 = 63; black pieces are looked up on the vertically mirrored square.

use shakmaty::{Color, Role, Square};

type Pst = [i32; 64];

#[rustfmt::skip]
const PAWN_PST: Pst = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PST: Pst = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PST: Pst = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PST: Pst = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10,  10,  10,  10,  10,   5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      0,   0,   0,   5,   5,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PST: Pst = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
      0,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   0, -10,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_PST: Pst = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];

fn table(role: Role) -> &'static Pst {
    match role {
        Role::Pawn => &PAWN_PST,
        Role::Knight => &KNIGHT_PST,
        Role::Bishop => &BISHOP_PST,
        Role::Rook => &ROOK_PST,
        Role::Queen => &QUEEN_PST,
        Role::King => &KING_PST,
    }
}

/// Positional bonus for a piece of `role` owned by `color` standing on `square`.
pub fn bonus(role: Role, color: Color, square: Square) -> i32 {
    let square = match color {
        Color::White => square,
        Color::Black => square.flip_vertical(),
    };
    table(role)[square as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_lookup_is_mirrored() {
        assert_eq!(bonus(Role::Pawn, Color::White, Square::E7), 50);
        assert_eq!(bonus(Role::Pawn, Color::Black, Square::E2), 50);
        assert_eq!(bonus(Role::King, Color::White, Square::G1), -40);
        assert_eq!(bonus(Role::King, Color::Black, Square::G8), -40);
        assert_eq!(bonus(Role::King, Color::White, Square::G8), 30);
        assert_eq!(bonus(Role::King, Color::Black, Square::G1), 30);
    }

    #[test]
    fn test_asymmetric_queen_rows() {
        // The fifth rank of the queen table is not left-right symmetric.
        assert_eq!(bonus(Role::Queen, Color::White, Square::A5), 0);
        assert_eq!(bonus(Role::Queen, Color::White, Square::H5), -5);
        assert_eq!(bonus(Role::Queen, Color::Black, Square::A4), 0);
    }
}
