// src/worker/mod.rs

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use shakmaty::Color;
use std::panic;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::SideConfig;
use crate::error::SessionError;
use crate::game::search::{select_best_move, SearchOutcome};
use crate::game::Game;

/// A request to pick a move for `side`, searched on a private copy of the game.
#[derive(Clone, Debug)]
pub struct AiJob {
    pub side: Color,
    pub game: Game,
    pub config: SideConfig,
    /// Session generation the job was issued in, echoed back in the reply.
    pub generation: u64,
    /// Pause before the search starts.
    pub lead_in: Duration,
}

#[derive(Clone, Debug)]
pub struct AiReply {
    pub side: Color,
    pub generation: u64,
    pub outcome: SearchOutcome,
}

struct InFlight {
    side: Color,
    handle: JoinHandle<()>,
}

/// Runs at most one AI search at a time on a background thread.
///
/// The worker never touches the session's game: it searches its own copy
/// and sends the chosen move back. Black's reply is held for the pacing
/// delay; White's is sent at once, and the session delays the following
/// Black search instead. The owner applies the move after collecting the
/// reply with [`Orchestrator::try_finish`] or [`Orchestrator::wait_finish`].
pub struct Orchestrator {
    pacing: Duration,
    reply_tx: Sender<AiReply>,
    reply_rx: Receiver<AiReply>,
    in_flight: Option<InFlight>,
}

impl Orchestrator {
    pub fn new(pacing: Duration) -> Self {
        let (reply_tx, reply_rx) = unbounded();
        Self {
            pacing,
            reply_tx,
            reply_rx,
            in_flight: None,
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// The side whose search is currently running, if any.
    pub fn thinking(&self) -> Option<Color> {
        self.in_flight.as_ref().map(|job| job.side)
    }

    pub fn spawn(&mut self, job: AiJob) -> Result<(), SessionError> {
        if let Some(side) = self.thinking() {
            return Err(SessionError::AlreadyThinking(side));
        }

        let side = job.side;
        let pacing = self.pacing;
        let tx = self.reply_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-ai", side_name(side)))
            .spawn(move || {
                thread::sleep(job.lead_in);
                let outcome = select_best_move(&job.game, job.side, &job.config);
                if job.side == Color::Black {
                    thread::sleep(pacing);
                }
                // The session may already be gone.
                let _ = tx.send(AiReply {
                    side: job.side,
                    generation: job.generation,
                    outcome,
                });
            })
            .map_err(SessionError::Spawn)?;

        debug!(side = ?side, "search worker started");
        self.in_flight = Some(InFlight { side, handle });
        Ok(())
    }

    /// Collects the reply of the running search if it is ready.
    pub fn try_finish(&mut self) -> Option<AiReply> {
        match self.reply_rx.try_recv() {
            Ok(reply) => Some(self.complete(reply)),
            Err(_) => {
                self.check_worker();
                None
            }
        }
    }

    /// Blocks for up to `timeout` waiting for the running search.
    pub fn wait_finish(&mut self, timeout: Duration) -> Option<AiReply> {
        if self.in_flight.is_none() {
            return None;
        }
        match self.reply_rx.recv_timeout(timeout) {
            Ok(reply) => Some(self.complete(reply)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.check_worker();
                None
            }
        }
    }

    fn complete(&mut self, reply: AiReply) -> AiReply {
        if let Some(job) = self.in_flight.take() {
            if let Err(payload) = job.handle.join() {
                panic::resume_unwind(payload);
            }
        }
        reply
    }

    /// Re-raises a worker panic on the calling thread.
    fn check_worker(&mut self) {
        let finished = self.in_flight.as_ref().is_some_and(|job| job.handle.is_finished());
        if !finished {
            return;
        }
        // The reply may have landed after the first poll.
        if let Ok(reply) = self.reply_rx.try_recv() {
            // Put it back for the next poll.
            let _ = self.reply_tx.send(reply);
            return;
        }
        if let Some(job) = self.in_flight.take() {
            if let Err(payload) = job.handle.join() {
                error!(side = ?job.side, "search worker panicked");
                panic::resume_unwind(payload);
            }
            panic!("search worker for {:?} exited without a reply", job.side);
        }
    }
}

fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "white",
        Color::Black => "black",
    }
}
