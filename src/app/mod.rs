// app/mod.rs

use crate::constants::DEPTH_PRESETS;
use crate::error::SessionError;
use crate::event::SessionEvent;
use crate::session::{GameResult, HumanMove, Session, TurnState};
use crate::ui;
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{prelude::*, Terminal};
use shakmaty::{CastlingMode, Color, Role, Square};
use std::io;
use std::time::Duration;
use tracing::{info, warn};

const LOG_CAPACITY: usize = 200;

pub struct App {
    pub session: Session,
    events: Receiver<SessionEvent>,
    pub user_input: String,
    pub message: Option<String>,
    /// Side whose panel the configuration keys act on.
    pub selected_side: Color,
    pub log: Vec<String>,
    should_quit: bool,
}

impl App {
    pub fn new(mut session: Session) -> Self {
        let events = session.subscribe();
        Self {
            session,
            events,
            user_input: String::new(),
            message: None,
            selected_side: Color::Black,
            log: Vec::new(),
            should_quit: false,
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            self.session.tick().map_err(io::Error::other)?;
            self.drain_events();
            terminal.draw(|f| ui::draw(f, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn drain_events(&mut self) {
        for event in self.events.try_iter() {
            self.log.push(describe(&event));
        }
        if self.log.len() > LOG_CAPACITY {
            let excess = self.log.len() - LOG_CAPACITY;
            self.log.drain(..excess);
        }
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        if self.session.turn() == TurnState::AwaitingPromotionChoice {
            if let KeyCode::Char(c) = code {
                if let Some(role) = promotion_role(c) {
                    let result = self.session.choose_promotion(role).map(|_| ());
                    self.report(result);
                    return;
                }
            }
        }

        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('R') => {
                let result = self.session.restart();
                self.user_input.clear();
                self.report(result);
            }
            KeyCode::Char('W') => {
                let enabled = !self.session.white_ai_enabled();
                let result = self.session.set_white_ai(enabled);
                self.report(result);
            }
            KeyCode::Tab => self.selected_side = self.selected_side.other(),
            KeyCode::Up => self.step_depth(1),
            KeyCode::Down => self.step_depth(-1),
            KeyCode::Right => {
                let evaluator = self.session.side_config(self.selected_side).evaluator.next();
                let result = self.session.set_evaluator(self.selected_side, evaluator);
                self.report(result);
            }
            KeyCode::Left => {
                let evaluator = self.session.side_config(self.selected_side).evaluator.previous();
                let result = self.session.set_evaluator(self.selected_side, evaluator);
                self.report(result);
            }
            KeyCode::F(n @ 1..=3) => {
                let (label, depth) = DEPTH_PRESETS[usize::from(n - 1)];
                let result = self.session.set_depth(self.selected_side, depth);
                if result.is_ok() {
                    self.message = Some(format!("{:?}: {label}", self.selected_side));
                } else {
                    self.report(result);
                }
            }
            KeyCode::Char(c) => {
                self.user_input.push(c);
                self.message = None;
            }
            KeyCode::Backspace => {
                self.user_input.pop();
            }
            KeyCode::Enter => self.handle_move_input(),
            _ => {}
        }
    }

    fn step_depth(&mut self, delta: i8) {
        let current = self.session.side_config(self.selected_side).search_depth;
        let depth = current.saturating_add_signed(delta);
        let result = self.session.set_depth(self.selected_side, depth);
        self.report(result);
    }

    /// Coordinate input such as `e2e4`, with an optional promotion letter
    /// (`e7e8q`).
    fn handle_move_input(&mut self) {
        let input = self.user_input.trim().to_ascii_lowercase();
        self.user_input.clear();
        let Some((from, to, promotion)) = parse_coordinates(&input) else {
            self.message = Some(format!("Invalid move format: {input}"));
            return;
        };
        let result = self.session.human_move(from, to).and_then(|played| match (played, promotion) {
            (HumanMove::PromotionPending(_), Some(role)) => self.session.choose_promotion(role).map(|_| ()),
            _ => Ok(()),
        });
        self.report(result);
    }

    fn report(&mut self, result: Result<(), SessionError>) {
        self.message = match result {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "input rejected");
                Some(e.to_string())
            }
        };
    }
}

fn promotion_role(c: char) -> Option<Role> {
    match c.to_ascii_lowercase() {
        'q' => Some(Role::Queen),
        'r' => Some(Role::Rook),
        'b' => Some(Role::Bishop),
        'n' => Some(Role::Knight),
        _ => None,
    }
}

fn parse_coordinates(input: &str) -> Option<(Square, Square, Option<Role>)> {
    if !input.is_ascii() || !(4..=5).contains(&input.len()) {
        return None;
    }
    let from: Square = input[0..2].parse().ok()?;
    let to: Square = input[2..4].parse().ok()?;
    let promotion = match input[4..].chars().next() {
        Some(c) => Some(promotion_role(c)?),
        None => None,
    };
    Some((from, to, promotion))
}

fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::ThinkingStarted(side) => format!("{side:?} AI is thinking..."),
        SessionEvent::MovePlayed { side, san, by_ai } => {
            let who = if *by_ai { "AI" } else { "human" };
            format!("{side:?} ({who}): {san}")
        }
        SessionEvent::PromotionPending(pending) => {
            format!("Promotion on {}: press q, r, b or n", pending.to)
        }
        SessionEvent::GameOver(result) => result.to_string(),
        SessionEvent::Restarted => "Game restarted".to_string(),
    }
}

/// Plays the session out AI against AI, printing the moves and the result.
/// Stops early after `max_plies` half-moves.
pub fn run_headless(session: &mut Session, max_plies: usize) -> Result<Option<GameResult>, SessionError> {
    let events = session.subscribe();
    let mut sans = Vec::new();

    while session.turn() != TurnState::GameOver && session.game().ply_count() < max_plies {
        if session.thinking().is_none() {
            // A human seat has nobody to move it here.
            warn!(turn = ?session.turn(), "no AI to move; stopping");
            break;
        }
        session.wait_for_ai(Duration::from_secs(1))?;
        for event in events.try_iter() {
            if let SessionEvent::MovePlayed { san, .. } = event {
                sans.push(san);
            }
        }
    }

    let moves: Vec<String> = sans
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
        .collect();
    println!("{}", moves.join(" "));

    let result = session.result();
    match result {
        Some(result) => println!("{result}"),
        None => println!("Stopped after {} plies", session.game().ply_count()),
    }
    let uci: Vec<String> = session
        .game()
        .moves()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .collect();
    info!(
        plies = session.game().ply_count(),
        moves = %uci.join(" "),
        fen = %session.game().fen(),
        "headless run finished"
    );
    Ok(result)
}
