// game/mod.rs

pub mod evaluation;
pub mod search;

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Piece, Position, Role, Square};

use crate::error::GameError;

#[derive(Clone, Debug)]
struct Ply {
    pos: Chess,
    hash: Zobrist64,
    /// The move that produced `pos`, `None` for the initial layout.
    played: Option<Move>,
}

impl Ply {
    fn new(pos: Chess, played: Option<Move>) -> Self {
        let hash = pos.zobrist_hash(EnPassantMode::Legal);
        Self { pos, hash, played }
    }
}

/// A position together with the history needed for make/unmake and
/// repetition detection.
///
/// shakmaty positions carry no history, so every `push` keeps the previous
/// position on a stack and `pop` restores it exactly.
#[derive(Clone, Debug)]
pub struct Game {
    stack: Vec<Ply>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_position(Chess::default())
    }

    pub fn from_position(pos: Chess) -> Self {
        Self { stack: vec![Ply::new(pos, None)] }
    }

    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let fen: Fen = fen.trim().parse()?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| GameError::Position(e.to_string()))?;
        Ok(Self::from_position(pos))
    }

    pub fn position(&self) -> &Chess {
        &self.current().pos
    }

    fn current(&self) -> &Ply {
        // The initial ply is never popped.
        &self.stack[self.stack.len() - 1]
    }

    pub fn hash(&self) -> Zobrist64 {
        self.current().hash
    }

    pub fn turn(&self) -> Color {
        self.position().turn()
    }

    pub fn legal_moves(&self) -> MoveList {
        self.position().legal_moves()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position().board().piece_at(square)
    }

    /// Number of half-moves played since the initial layout.
    pub fn ply_count(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn last_move(&self) -> Option<Move> {
        self.current().played
    }

    /// Moves played since the initial layout, oldest first.
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.stack[1..].iter().filter_map(|ply| ply.played)
    }

    /// Makes a move without checking legality. Callers must only pass moves
    /// taken from [`Game::legal_moves`].
    pub fn push(&mut self, m: Move) {
        let mut pos = self.position().clone();
        pos.play_unchecked(m);
        self.stack.push(Ply::new(pos, Some(m)));
    }

    /// Unmakes the last move. Returns `None` at the initial layout.
    pub fn pop(&mut self) -> Option<Move> {
        if self.stack.len() == 1 {
            return None;
        }
        self.stack.pop().and_then(|ply| ply.played)
    }

    /// Makes a move after checking it against the legal move list.
    pub fn play(&mut self, m: Move) -> Result<(), GameError> {
        if !self.legal_moves().contains(&m) {
            return Err(GameError::IllegalMove(m.to_uci(CastlingMode::Standard).to_string()));
        }
        self.push(m);
        Ok(())
    }

    pub fn is_check(&self) -> bool {
        self.position().is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position().is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.position().is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.position().is_insufficient_material()
    }

    /// True if the current position occurred at least `count` times,
    /// looking back only as far as the last capture or pawn move.
    pub fn is_repetition(&self, count: usize) -> bool {
        let key = self.hash();
        let mut seen = 1;
        if seen >= count {
            return true;
        }
        for i in (1..self.stack.len()).rev() {
            if self.stack[i].played.is_some_and(|m| m.is_zeroing()) {
                break;
            }
            if self.stack[i - 1].hash == key {
                seen += 1;
                if seen >= count {
                    return true;
                }
            }
        }
        false
    }

    pub fn is_fivefold_repetition(&self) -> bool {
        self.is_repetition(5)
    }

    /// Threefold repetition now, or reachable with one legal move.
    pub fn can_claim_threefold_repetition(&self) -> bool {
        if self.is_repetition(3) {
            return true;
        }
        let mut scratch = self.clone();
        self.legal_moves().into_iter().any(|m| {
            scratch.push(m);
            let repeated = scratch.is_repetition(3);
            scratch.pop();
            repeated
        })
    }

    pub fn is_fifty_moves(&self) -> bool {
        self.position().halfmoves() >= 100 && !self.legal_moves().is_empty()
    }

    pub fn is_seventyfive_moves(&self) -> bool {
        self.position().halfmoves() >= 150 && !self.legal_moves().is_empty()
    }

    /// Fifty-move rule now, or reachable with one non-zeroing move.
    pub fn can_claim_fifty_moves(&self) -> bool {
        if self.is_fifty_moves() {
            return true;
        }
        if self.position().halfmoves() < 99 {
            return false;
        }
        let mut scratch = self.clone();
        self.legal_moves().into_iter().filter(|m| !m.is_zeroing()).any(|m| {
            scratch.push(m);
            let claimable = scratch.is_fifty_moves();
            scratch.pop();
            claimable
        })
    }

    /// Automatic game end. Draw claims (threefold, fifty moves) do not end
    /// the game on their own.
    pub fn is_game_over(&self) -> bool {
        self.is_checkmate()
            || self.is_stalemate()
            || self.is_insufficient_material()
            || self.is_seventyfive_moves()
            || self.is_fivefold_repetition()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position(), EnPassantMode::Legal).to_string()
    }

    /// SAN with a check or mate suffix.
    pub fn san(&self, m: Move) -> String {
        let mut san = San::from_move(self.position(), m).to_string();
        let mut after = self.position().clone();
        after.play_unchecked(m);
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
        san
    }

    /// Finds the legal move from `from` to `to`, if any. Promotions are
    /// matched against the given piece kind; castling accepts the king's
    /// destination square.
    pub fn find_move(&self, from: Square, to: Square, promotion: Option<Role>) -> Option<Move> {
        self.legal_moves().into_iter().find(|m| {
            m.from() == Some(from)
                && (m.to() == to || castling_target(m) == Some(to))
                && m.promotion() == promotion
        })
    }

    /// True if some legal move from `from` to `to` is a promotion.
    pub fn is_promotion(&self, from: Square, to: Square) -> bool {
        self.legal_moves()
            .iter()
            .any(|m| m.from() == Some(from) && m.to() == to && m.is_promotion())
    }
}

fn castling_target(m: &Move) -> Option<Square> {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { shakmaty::File::G } else { shakmaty::File::C };
            Some(Square::from_coords(file, king.rank()))
        }
        _ => None,
    }
}

/// AI promotions always resolve to a queen.
pub fn resolve_promotion(m: Move) -> Move {
    match m {
        Move::Normal { role, from, capture, to, promotion: Some(_) } => Move::Normal {
            role,
            from,
            capture,
            to,
            promotion: Some(Role::Queen),
        },
        other => other,
    }
}
