// src/session/mod.rs

use crossbeam_channel::Receiver;
use shakmaty::{Color, Move, Role, Square};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{validate_depth, EngineConfig, SideConfig};
use crate::error::SessionError;
use crate::event::{EventBroker, SessionEvent};
use crate::game::evaluation::Evaluator;
use crate::game::search::SearchOutcome;
use crate::game::{resolve_promotion, Game};
use crate::worker::{AiJob, AiReply, Orchestrator};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    HumanToMove,
    WhiteAiThinking,
    BlackAiThinking,
    AwaitingPromotionChoice,
    GameOver,
}

impl TurnState {
    fn thinking(side: Color) -> Self {
        match side {
            Color::White => TurnState::WhiteAiThinking,
            Color::Black => TurnState::BlackAiThinking,
        }
    }
}

/// Wins by White (the human seat) and by Black (the AI), across restarts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreTally {
    pub human_wins: u32,
    pub ai_wins: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
}

/// How a finished game ended, in reporting precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl GameResult {
    /// `None` while the game is still running.
    pub fn of(game: &Game) -> Option<Self> {
        if !game.is_game_over() {
            return None;
        }
        let result = if game.is_checkmate() {
            GameResult::Checkmate {
                winner: game.turn().other(),
            }
        } else if game.is_stalemate() {
            GameResult::Stalemate
        } else if game.is_insufficient_material() {
            GameResult::InsufficientMaterial
        } else if game.can_claim_threefold_repetition() {
            GameResult::ThreefoldRepetition
        } else if game.can_claim_fifty_moves() {
            GameResult::FiftyMoveRule
        } else {
            unreachable!("game over without a recognised cause: {}", game.fen())
        };
        Some(result)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Checkmate { winner: Color::White } => write!(f, "Checkmate! White wins"),
            GameResult::Checkmate { winner: Color::Black } => write!(f, "Checkmate! Black wins"),
            GameResult::Stalemate => write!(f, "Stalemate!"),
            GameResult::InsufficientMaterial => write!(f, "Draw: Insufficient material!"),
            GameResult::ThreefoldRepetition => write!(f, "Draw: Threefold repetition!"),
            GameResult::FiftyMoveRule => write!(f, "Draw: Fifty-move rule!"),
        }
    }
}

/// What became of a human move request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HumanMove {
    Played(Move),
    PromotionPending(PendingPromotion),
}

const PROMOTION_CHOICES: [Role; 4] = [Role::Queen, Role::Rook, Role::Bishop, Role::Knight];

/// One game between a human (White, unless White's AI is enabled) and the
/// engine (always Black), plus the state that survives restarts.
///
/// The session owns the only canonical [`Game`]; AI searches run on copies
/// and their moves are applied here when collected by [`Session::tick`] or
/// [`Session::wait_for_ai`].
pub struct Session {
    game: Game,
    start: Game,
    turn: TurnState,
    pending_promotion: Option<PendingPromotion>,
    white: SideConfig,
    black: SideConfig,
    white_ai_enabled: bool,
    tally: ScoreTally,
    scored: bool,
    result: Option<GameResult>,
    last_search: Option<(Color, SearchOutcome)>,
    /// Bumped on restart so replies from an abandoned game are dropped.
    generation: u64,
    /// A side waiting for an abandoned search to finish before its own starts.
    queued: Option<Color>,
    orchestrator: Orchestrator,
    events: EventBroker,
}

impl Session {
    pub fn new(config: &EngineConfig) -> Result<Self, SessionError> {
        Self::with_game(Game::new(), config)
    }

    /// Starts from `game`; restarts return to it.
    pub fn with_game(game: Game, config: &EngineConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let mut session = Self {
            start: game.clone(),
            game,
            turn: TurnState::HumanToMove,
            pending_promotion: None,
            white: config.white,
            black: config.black,
            white_ai_enabled: config.white_ai_enabled,
            tally: ScoreTally::default(),
            scored: false,
            result: None,
            last_search: None,
            generation: 0,
            queued: None,
            orchestrator: Orchestrator::new(config.pacing()),
            events: EventBroker::new(),
        };
        session.advance()?;
        Ok(session)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn side_config(&self, side: Color) -> SideConfig {
        match side {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn white_ai_enabled(&self) -> bool {
        self.white_ai_enabled
    }

    pub fn tally(&self) -> ScoreTally {
        self.tally
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn last_search(&self) -> Option<&(Color, SearchOutcome)> {
        self.last_search.as_ref()
    }

    /// The side whose AI is thinking for the current game, if any.
    pub fn thinking(&self) -> Option<Color> {
        match self.turn {
            TurnState::WhiteAiThinking => Some(Color::White),
            TurnState::BlackAiThinking => Some(Color::Black),
            _ => None,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn is_ai(&self, side: Color) -> bool {
        match side {
            Color::White => self.white_ai_enabled,
            Color::Black => true,
        }
    }

    /// Human move in coordinate form. A pawn reaching the last rank waits
    /// for [`Session::choose_promotion`].
    pub fn human_move(&mut self, from: Square, to: Square) -> Result<HumanMove, SessionError> {
        if self.turn != TurnState::HumanToMove {
            return Err(SessionError::NotHumanTurn(self.turn));
        }
        if self.game.is_promotion(from, to) {
            let pending = PendingPromotion { from, to };
            self.pending_promotion = Some(pending);
            self.turn = TurnState::AwaitingPromotionChoice;
            self.events.publish(SessionEvent::PromotionPending(pending));
            return Ok(HumanMove::PromotionPending(pending));
        }
        let m = self
            .game
            .find_move(from, to, None)
            .ok_or(SessionError::IllegalMove { from, to })?;
        self.play_human(m)?;
        Ok(HumanMove::Played(m))
    }

    pub fn choose_promotion(&mut self, role: Role) -> Result<Move, SessionError> {
        let pending = match (self.turn, self.pending_promotion) {
            (TurnState::AwaitingPromotionChoice, Some(pending)) => pending,
            _ => return Err(SessionError::NoPendingPromotion),
        };
        if !PROMOTION_CHOICES.contains(&role) {
            return Err(SessionError::InvalidPromotion(role));
        }
        let m = self
            .game
            .find_move(pending.from, pending.to, Some(role))
            .ok_or(SessionError::InvalidPromotion(role))?;
        self.pending_promotion = None;
        self.play_human(m)?;
        Ok(m)
    }

    fn play_human(&mut self, m: Move) -> Result<(), SessionError> {
        let side = self.game.turn();
        let san = self.game.san(m);
        // Only moves found in the legal move list reach this point.
        self.game.push(m);
        info!(side = ?side, san = %san, "human move");
        self.events.publish(SessionEvent::MovePlayed { side, san, by_ai: false });
        self.advance()
    }

    pub fn set_depth(&mut self, side: Color, depth: u8) -> Result<(), SessionError> {
        let depth = validate_depth(depth)?;
        self.side_config_mut(side)?.search_depth = depth;
        debug!(side = ?side, depth, "search depth changed");
        Ok(())
    }

    pub fn set_evaluator(&mut self, side: Color, evaluator: Evaluator) -> Result<(), SessionError> {
        self.side_config_mut(side)?.evaluator = evaluator;
        debug!(side = ?side, evaluator = ?evaluator, "evaluator changed");
        Ok(())
    }

    fn side_config_mut(&mut self, side: Color) -> Result<&mut SideConfig, SessionError> {
        if self.thinking() == Some(side) {
            return Err(SessionError::SearchInFlight(side));
        }
        Ok(match side {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        })
    }

    /// Turning White's AI off while it is thinking lets that search finish;
    /// White is human-controlled from the next White turn.
    pub fn set_white_ai(&mut self, enabled: bool) -> Result<(), SessionError> {
        self.white_ai_enabled = enabled;
        info!(enabled, "white AI toggled");
        if enabled && self.turn == TurnState::HumanToMove && self.game.turn() == Color::White {
            self.launch(Color::White)?;
        }
        Ok(())
    }

    /// Back to the initial layout. The tally and side configurations stay.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.generation += 1;
        self.game = self.start.clone();
        self.turn = TurnState::HumanToMove;
        self.pending_promotion = None;
        self.scored = false;
        self.result = None;
        self.last_search = None;
        self.queued = None;
        info!(generation = self.generation, "game restarted");
        self.events.publish(SessionEvent::Restarted);
        self.advance()
    }

    /// Applies a finished AI move, if any, without blocking.
    pub fn tick(&mut self) -> Result<(), SessionError> {
        if let Some(reply) = self.orchestrator.try_finish() {
            self.apply_reply(reply)?;
        }
        self.launch_queued()
    }

    /// Like [`Session::tick`] but blocks up to `timeout` for the running
    /// search. Returns whether a reply was collected.
    pub fn wait_for_ai(&mut self, timeout: Duration) -> Result<bool, SessionError> {
        let collected = match self.orchestrator.wait_finish(timeout) {
            Some(reply) => {
                self.apply_reply(reply)?;
                true
            }
            None => false,
        };
        self.launch_queued()?;
        Ok(collected)
    }

    /// Decides who acts next after the position changed.
    fn advance(&mut self) -> Result<(), SessionError> {
        self.advance_after(Duration::ZERO)
    }

    fn advance_after(&mut self, lead_in: Duration) -> Result<(), SessionError> {
        if self.game.is_game_over() {
            self.finish();
            return Ok(());
        }
        let side = self.game.turn();
        if self.is_ai(side) {
            self.launch_after(side, lead_in)
        } else {
            self.turn = TurnState::HumanToMove;
            Ok(())
        }
    }

    fn launch(&mut self, side: Color) -> Result<(), SessionError> {
        self.launch_after(side, Duration::ZERO)
    }

    fn launch_after(&mut self, side: Color, lead_in: Duration) -> Result<(), SessionError> {
        self.turn = TurnState::thinking(side);
        if self.orchestrator.thinking().is_some() {
            debug!(side = ?side, "waiting for an abandoned search to finish");
            self.queued = Some(side);
            return Ok(());
        }
        let config = self.side_config(side);
        self.orchestrator.spawn(AiJob {
            side,
            game: self.game.clone(),
            config,
            generation: self.generation,
            lead_in,
        })?;
        info!(
            side = ?side,
            depth = config.search_depth,
            evaluator = ?config.evaluator,
            "AI thinking"
        );
        self.events.publish(SessionEvent::ThinkingStarted(side));
        Ok(())
    }

    fn launch_queued(&mut self) -> Result<(), SessionError> {
        if self.orchestrator.thinking().is_some() {
            return Ok(());
        }
        match self.queued.take() {
            Some(side) => self.launch(side),
            None => Ok(()),
        }
    }

    fn apply_reply(&mut self, reply: AiReply) -> Result<(), SessionError> {
        if reply.generation != self.generation {
            debug!(side = ?reply.side, generation = reply.generation, "discarding result of an abandoned search");
            return Ok(());
        }
        assert_eq!(
            self.turn,
            TurnState::thinking(reply.side),
            "AI reply arrived for a side that was not thinking"
        );

        let side = reply.side;
        let chosen = reply.outcome.best_move;
        self.last_search = Some((side, reply.outcome));
        let Some(m) = chosen else {
            // No legal move: the position is terminal.
            return self.advance();
        };

        let m = resolve_promotion(m);
        let san = self.game.san(m);
        if let Err(e) = self.game.play(m) {
            panic!("search returned a move that cannot be played: {e}");
        }
        info!(side = ?side, san = %san, "AI move");
        self.events.publish(SessionEvent::MovePlayed { side, san, by_ai: true });
        // White's move stays on screen for the pacing delay before Black starts.
        let lead_in = match side {
            Color::White => self.orchestrator.pacing(),
            Color::Black => Duration::ZERO,
        };
        self.advance_after(lead_in)
    }

    /// Enters `GameOver` and scores the game once.
    fn finish(&mut self) {
        self.turn = TurnState::GameOver;
        if self.scored {
            return;
        }
        let Some(result) = GameResult::of(&self.game) else {
            return;
        };
        match result {
            GameResult::Checkmate { winner: Color::White } => self.tally.human_wins += 1,
            GameResult::Checkmate { winner: Color::Black } => self.tally.ai_wins += 1,
            _ => {}
        }
        self.scored = true;
        self.result = Some(result);
        info!(result = %result, human_wins = self.tally.human_wins, ai_wins = self.tally.ai_wins, "game over");
        self.events.publish(SessionEvent::GameOver(result));
    }
}

#[cfg(test)]
mod tests;
