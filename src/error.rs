//! Error types for the engine, configuration and session layers.

use shakmaty::fen::ParseFenError;
use shakmaty::{Color, Role, Square};
use std::io;
use thiserror::Error;

use crate::session::TurnState;

/// Errors raised while building or mutating a [`crate::game::Game`].
#[derive(Error, Debug)]
pub enum GameError {
    #[error("invalid FEN: {0}")]
    Fen(#[from] ParseFenError),

    #[error("illegal position: {0}")]
    Position(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// Errors raised at the configuration boundary.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("search depth {depth} out of range ({min}..={max})")]
    DepthOutOfRange { depth: u8, min: u8, max: u8 },

    #[error("failed to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by session and orchestrator entry points.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("human input not accepted while {0:?}")]
    NotHumanTurn(TurnState),

    #[error("no promotion choice is pending")]
    NoPendingPromotion,

    #[error("cannot promote to {0:?}")]
    InvalidPromotion(Role),

    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    #[error("{0:?} is searching; configuration is locked until it finishes")]
    SearchInFlight(Color),

    #[error("{0:?} is already thinking")]
    AlreadyThinking(Color),

    #[error("failed to spawn search worker: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
