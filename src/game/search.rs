// src/game/search.rs

use rayon::prelude::*;
use shakmaty::{CastlingMode, Color, Move};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::SideConfig;
use crate::constants::{INFINITY, MATE_SCORE};
use crate::game::evaluation::Evaluator;
use crate::game::Game;

/// Depth-bounded minimax with alpha-beta pruning.
///
/// Leaf scores are taken from `perspective`'s point of view: the evaluator
/// always scores for White, and the searcher negates it when `perspective`
/// is Black. Maximizing nodes are the ones where `perspective` is to move.
#[derive(Clone, Debug)]
pub struct Searcher {
    evaluator: Evaluator,
    perspective: Color,
    nodes: u64,
}

impl Searcher {
    pub fn new(evaluator: Evaluator, perspective: Color) -> Self {
        Self {
            evaluator,
            perspective,
            nodes: 0,
        }
    }

    /// A searcher for the replies to `acting`'s root moves: the responder
    /// maximizes its own score, and the root picks the minimum.
    pub fn for_acting_side(evaluator: Evaluator, acting: Color) -> Self {
        Self::new(evaluator, acting.other())
    }

    /// Number of `alpha_beta` calls made so far.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn alpha_beta(
        &mut self,
        game: &mut Game,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> i32 {
        self.nodes += 1;

        // Checkmate is the worst outcome for whoever is to move.
        if game.is_checkmate() {
            return if maximizing { -MATE_SCORE } else { MATE_SCORE };
        }
        if game.is_stalemate() || game.is_insufficient_material() || game.is_repetition(3) {
            return 0;
        }
        if depth == 0 {
            return self.leaf_score(game);
        }

        let legal_moves = game.legal_moves();
        if legal_moves.is_empty() {
            warn!(fen = %game.fen(), "no legal moves at a non-terminal node");
            return if maximizing { -INFINITY } else { INFINITY };
        }

        if maximizing {
            let mut max_eval = -INFINITY;
            for m in legal_moves {
                game.push(m);
                let score = self.alpha_beta(game, depth - 1, alpha, beta, false);
                game.pop();
                max_eval = max_eval.max(score);
                if max_eval >= beta {
                    return max_eval;
                }
                alpha = alpha.max(score);
            }
            max_eval
        } else {
            let mut min_eval = INFINITY;
            for m in legal_moves {
                game.push(m);
                let score = self.alpha_beta(game, depth - 1, alpha, beta, true);
                game.pop();
                min_eval = min_eval.min(score);
                if min_eval <= alpha {
                    return min_eval;
                }
                beta = beta.min(score);
            }
            min_eval
        }
    }

    fn leaf_score(&self, game: &Game) -> i32 {
        let score = self.evaluator.evaluate(game.position());
        match self.perspective {
            Color::White => score,
            Color::Black => -score,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// `None` only when the side to move has no legal move.
    pub best_move: Option<Move>,
    /// Score of `best_move` from the responder's point of view; lower is
    /// better for the acting side. `None` for a mating or missing move.
    pub score: Option<i32>,
    pub delivers_mate: bool,
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Picks the move for `acting`, which must be the side to move.
///
/// A move that mates immediately is returned without searching. Otherwise
/// every root move is searched to `depth - 1` with a full window from the
/// responder's point of view, and the move with the strictly lowest score
/// wins; ties keep the earliest move in enumeration order. Each root move is
/// searched on a private copy of `game`.
pub fn select_best_move(game: &Game, acting: Color, config: &SideConfig) -> SearchOutcome {
    assert_eq!(game.turn(), acting, "move selection requested for the side not to move");
    assert!(config.search_depth >= 1, "search depth must be positive");

    let start = Instant::now();
    let root_moves: Vec<Move> = game.legal_moves().to_vec();

    if let Some(mate) = find_mate_in_one(game, &root_moves) {
        info!(side = ?acting, mv = %mate.to_uci(CastlingMode::Standard), "found mate in one");
        return SearchOutcome {
            best_move: Some(mate),
            score: None,
            delivers_mate: true,
            nodes: 0,
            elapsed: start.elapsed(),
        };
    }

    let scored: Vec<(Move, i32, u64)> = root_moves
        .par_iter()
        .map(|&m| {
            let mut scratch = game.clone();
            scratch.push(m);
            let mut searcher = Searcher::for_acting_side(config.evaluator, acting);
            let score = searcher.alpha_beta(&mut scratch, config.search_depth - 1, -INFINITY, INFINITY, true);
            (m, score, searcher.nodes())
        })
        .collect();

    let mut best: Option<(Move, i32)> = None;
    let mut nodes = 0;
    for (m, score, searched) in scored {
        debug!(mv = %m.to_uci(CastlingMode::Standard), score, nodes = searched, "root move");
        nodes += searched;
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((m, score));
        }
    }

    let outcome = SearchOutcome {
        best_move: best.map(|(m, _)| m),
        score: best.map(|(_, score)| score),
        delivers_mate: false,
        nodes,
        elapsed: start.elapsed(),
    };
    match outcome.best_move {
        Some(m) => info!(
            side = ?acting,
            depth = config.search_depth,
            evaluator = ?config.evaluator,
            mv = %m.to_uci(CastlingMode::Standard),
            score = outcome.score,
            nodes,
            elapsed = ?outcome.elapsed,
            "selected move"
        ),
        None => info!(side = ?acting, "no legal move available"),
    }
    outcome
}

fn find_mate_in_one(game: &Game, root_moves: &[Move]) -> Option<Move> {
    let mut scratch = game.clone();
    root_moves.iter().copied().find(|&m| {
        scratch.push(m);
        let mate = scratch.is_checkmate();
        scratch.pop();
        mate
    })
}
