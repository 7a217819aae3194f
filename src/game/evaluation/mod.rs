//! Static evaluation of a chess position.
//!
//! Every evaluator scores from White's point of view: positive favours
//! White, negative favours Black. The caller decides whether to negate.

pub mod pst;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Piece, Position, Role, Square};

use crate::constants::{
    BISHOP_VALUE, CHECK_PENALTY, KING_VALUE, KNIGHT_VALUE, MATE_SCORE, PAWN_VALUE, QUEEN_VALUE,
    ROOK_VALUE,
};

/// The interchangeable scoring strategies, in increasing sophistication.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Evaluator {
    /// Material only.
    #[default]
    Material,
    /// Material plus a checkmate override and a check penalty.
    MaterialTactical,
    /// Tactical terms plus piece-square tables.
    MaterialPositional,
}

impl Evaluator {
    pub const ALL: [Evaluator; 3] = [
        Evaluator::Material,
        Evaluator::MaterialTactical,
        Evaluator::MaterialPositional,
    ];

    pub fn evaluate(self, pos: &Chess) -> i32 {
        match self {
            Evaluator::Material => material(pos),
            Evaluator::MaterialTactical => material_tactical(pos),
            Evaluator::MaterialPositional => material_positional(pos),
        }
    }

    /// Short label used by the side panels.
    pub fn label(self) -> &'static str {
        match self {
            Evaluator::Material => "E1",
            Evaluator::MaterialTactical => "E2",
            Evaluator::MaterialPositional => "E3",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Evaluator::Material => Evaluator::MaterialTactical,
            Evaluator::MaterialTactical => Evaluator::MaterialPositional,
            Evaluator::MaterialPositional => Evaluator::Material,
        }
    }

    pub fn previous(self) -> Self {
        self.next().next()
    }
}

pub fn get_piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => KING_VALUE,
    }
}

fn signed(color: Color, score: i32) -> i32 {
    match color {
        Color::White => score,
        Color::Black => -score,
    }
}

/// Sums `value(piece, square)` over the board, signed by owner.
fn sum_pieces(pos: &Chess, value: impl Fn(Piece, Square) -> i32) -> i32 {
    let board = pos.board();
    let mut score = 0;
    for &color in &Color::ALL {
        for &role in &Role::ALL {
            let piece = Piece { role, color };
            for square in board.by_piece(piece) {
                score += signed(color, value(piece, square));
            }
        }
    }
    score
}

/// Being in check costs the side to move.
fn check_term(pos: &Chess) -> i32 {
    if pos.is_check() {
        signed(pos.turn(), -CHECK_PENALTY)
    } else {
        0
    }
}

pub fn material(pos: &Chess) -> i32 {
    sum_pieces(pos, |piece, _| get_piece_value(piece.role))
}

/// Checkmate is a terminal override regardless of which side is mated.
pub fn material_tactical(pos: &Chess) -> i32 {
    if pos.is_checkmate() {
        return MATE_SCORE;
    }
    check_term(pos) + material(pos)
}

pub fn material_positional(pos: &Chess) -> i32 {
    if pos.is_checkmate() {
        return MATE_SCORE;
    }
    check_term(pos)
        + sum_pieces(pos, |piece, square| {
            get_piece_value(piece.role) + pst::bonus(piece.role, piece.color, square)
        })
}
