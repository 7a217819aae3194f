//! Session state machine tests. Pacing is zero unless a test needs a search
//! to stay in flight.

use super::*;
use crate::error::ConfigError;
use shakmaty::{Move, Piece, Square};

const WAIT: Duration = Duration::from_secs(60);

fn config(white_ai_enabled: bool, pacing_ms: u64) -> EngineConfig {
    EngineConfig {
        white: SideConfig::default(),
        black: SideConfig::default(),
        white_ai_enabled,
        pacing_ms,
    }
}

fn session_from(fen: &str, config: &EngineConfig) -> Session {
    Session::with_game(Game::from_fen(fen).unwrap(), config).unwrap()
}

/// Collects AI replies until no side is thinking.
fn settle(session: &mut Session) {
    while session.thinking().is_some() {
        session.wait_for_ai(WAIT).unwrap();
    }
}

#[test]
fn test_new_session_waits_for_human() {
    let session = Session::new(&config(false, 0)).unwrap();
    assert_eq!(session.turn(), TurnState::HumanToMove);
    assert_eq!(session.thinking(), None);
    assert_eq!(session.tally(), ScoreTally::default());
}

#[test]
fn test_black_mates_after_human_move() {
    let mut session = session_from("r5k1/5ppp/8/8/8/8/1P3PPP/6K1 w - - 0 1", &config(false, 0));
    let events = session.subscribe();

    assert!(matches!(session.human_move(Square::B2, Square::B3), Ok(HumanMove::Played(_))));
    assert_eq!(session.turn(), TurnState::BlackAiThinking);
    settle(&mut session);

    assert_eq!(session.game().last_move().unwrap().to(), Square::A1);
    assert_eq!(session.turn(), TurnState::GameOver);
    assert_eq!(session.result(), Some(GameResult::Checkmate { winner: Color::Black }));
    assert_eq!(session.tally(), ScoreTally { human_wins: 0, ai_wins: 1 });
    let (side, outcome) = session.last_search().unwrap();
    assert_eq!(*side, Color::Black);
    assert!(outcome.delivers_mate);

    let received: Vec<SessionEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            SessionEvent::MovePlayed { side: Color::White, san: "b3".to_string(), by_ai: false },
            SessionEvent::ThinkingStarted(Color::Black),
            SessionEvent::MovePlayed { side: Color::Black, san: "Ra1#".to_string(), by_ai: true },
            SessionEvent::GameOver(GameResult::Checkmate { winner: Color::Black }),
        ]
    );
}

#[test]
fn test_scoring_is_idempotent() {
    let mut session = session_from("r5k1/5ppp/8/8/8/8/1P3PPP/6K1 w - - 0 1", &config(false, 0));
    session.human_move(Square::B2, Square::B3).unwrap();
    settle(&mut session);
    for _ in 0..3 {
        session.finish();
        session.tick().unwrap();
    }
    assert_eq!(session.tally(), ScoreTally { human_wins: 0, ai_wins: 1 });
}

#[test]
fn test_ai_promotion_resolves_to_queen() {
    let mut session = session_from("8/P7/8/8/8/8/k7/4K3 w - - 0 1", &config(true, 0));
    assert_eq!(session.turn(), TurnState::WhiteAiThinking);
    assert!(session.wait_for_ai(WAIT).unwrap());

    assert_eq!(
        session.game().piece_at(Square::A8),
        Some(Piece { color: Color::White, role: Role::Queen })
    );
    assert_eq!(session.pending_promotion(), None);
    assert_ne!(session.turn(), TurnState::AwaitingPromotionChoice);
}

#[test]
fn test_ai_underpromotion_is_played_as_queen() {
    let mut session = session_from("8/P7/8/8/8/8/k7/4K3 w - - 0 1", &config(false, 0));
    session.turn = TurnState::WhiteAiThinking;
    let knight = Move::Normal {
        role: Role::Pawn,
        from: Square::A7,
        capture: None,
        to: Square::A8,
        promotion: Some(Role::Knight),
    };
    let reply = AiReply {
        side: Color::White,
        generation: session.generation,
        outcome: SearchOutcome {
            best_move: Some(knight),
            score: Some(0),
            delivers_mate: false,
            nodes: 1,
            elapsed: Duration::ZERO,
        },
    };
    let events = session.subscribe();
    session.apply_reply(reply).unwrap();

    assert_eq!(
        session.game().piece_at(Square::A8),
        Some(Piece { color: Color::White, role: Role::Queen })
    );
    assert_eq!(session.game().last_move().unwrap().promotion(), Some(Role::Queen));
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::MovePlayed { side: Color::White, san: "a8=Q+".to_string(), by_ai: true }
    );
    settle(&mut session);
}

#[test]
fn test_human_promotion_choice() {
    let mut session = session_from("1k6/4P3/8/8/8/8/p7/4K3 w - - 0 1", &config(false, 0));
    let pending = PendingPromotion { from: Square::E7, to: Square::E8 };

    assert_eq!(
        session.human_move(Square::E7, Square::E8).unwrap(),
        HumanMove::PromotionPending(pending)
    );
    assert_eq!(session.turn(), TurnState::AwaitingPromotionChoice);
    assert_eq!(session.pending_promotion(), Some(pending));

    // Other input is suspended until a piece is chosen.
    assert!(matches!(
        session.human_move(Square::E1, Square::E2),
        Err(SessionError::NotHumanTurn(TurnState::AwaitingPromotionChoice))
    ));
    assert!(matches!(
        session.choose_promotion(Role::King),
        Err(SessionError::InvalidPromotion(Role::King))
    ));

    let m = session.choose_promotion(Role::Knight).unwrap();
    assert_eq!(m.promotion(), Some(Role::Knight));
    assert_eq!(
        session.game().piece_at(Square::E8),
        Some(Piece { color: Color::White, role: Role::Knight })
    );
    assert_eq!(session.pending_promotion(), None);
    assert_eq!(session.turn(), TurnState::BlackAiThinking);
    assert!(matches!(session.choose_promotion(Role::Queen), Err(SessionError::NoPendingPromotion)));
    settle(&mut session);
}

#[test]
fn test_illegal_and_out_of_turn_moves() {
    let mut session = Session::new(&config(false, 200)).unwrap();
    assert!(matches!(
        session.human_move(Square::E2, Square::E5),
        Err(SessionError::IllegalMove { from: Square::E2, to: Square::E5 })
    ));
    assert_eq!(session.turn(), TurnState::HumanToMove);

    session.human_move(Square::E2, Square::E4).unwrap();
    assert!(matches!(
        session.human_move(Square::D2, Square::D4),
        Err(SessionError::NotHumanTurn(TurnState::BlackAiThinking))
    ));
    settle(&mut session);
    assert_eq!(session.turn(), TurnState::HumanToMove);
    assert_eq!(session.game().ply_count(), 2);
}

#[test]
fn test_restart_is_idempotent_and_keeps_tally() {
    let mut session = session_from("r5k1/5ppp/8/8/8/8/1P3PPP/6K1 w - - 0 1", &config(false, 0));
    let initial_fen = session.game().fen();
    session.human_move(Square::B2, Square::B3).unwrap();
    settle(&mut session);
    session.set_depth(Color::Black, 3).unwrap();
    let tally = session.tally();

    session.restart().unwrap();
    let once = (session.game().fen(), session.turn(), session.pending_promotion(), session.result());
    session.restart().unwrap();
    let twice = (session.game().fen(), session.turn(), session.pending_promotion(), session.result());

    assert_eq!(once, twice);
    assert_eq!(once, (initial_fen, TurnState::HumanToMove, None, None));
    assert_eq!(session.tally(), tally);
    assert_eq!(session.side_config(Color::Black).search_depth, 3);
    assert_eq!(session.game().ply_count(), 0);
}

#[test]
fn test_restart_discards_abandoned_search() {
    let mut session = Session::new(&config(false, 200)).unwrap();
    session.human_move(Square::E2, Square::E4).unwrap();
    assert_eq!(session.turn(), TurnState::BlackAiThinking);

    session.restart().unwrap();
    assert_eq!(session.turn(), TurnState::HumanToMove);
    assert!(session.wait_for_ai(WAIT).unwrap());
    // The abandoned reply changed nothing.
    assert_eq!(session.game().ply_count(), 0);
    assert_eq!(session.turn(), TurnState::HumanToMove);
}

#[test]
fn test_search_queued_behind_abandoned_search() {
    let mut session = Session::new(&config(false, 200)).unwrap();
    session.human_move(Square::E2, Square::E4).unwrap();
    session.restart().unwrap();
    session.human_move(Square::D2, Square::D4).unwrap();
    assert_eq!(session.turn(), TurnState::BlackAiThinking);

    settle(&mut session);
    assert_eq!(session.game().ply_count(), 2);
    assert_eq!(
        session.game().piece_at(Square::D4),
        Some(Piece { color: Color::White, role: Role::Pawn })
    );
    assert_eq!(session.turn(), TurnState::HumanToMove);
}

#[test]
fn test_configuration_boundary() {
    let mut session = Session::new(&config(false, 200)).unwrap();
    for depth in [0, 7] {
        assert!(matches!(
            session.set_depth(Color::White, depth),
            Err(SessionError::Config(ConfigError::DepthOutOfRange { .. }))
        ));
    }
    session.set_depth(Color::White, 4).unwrap();
    session.set_evaluator(Color::White, Evaluator::MaterialPositional).unwrap();
    assert_eq!(
        session.side_config(Color::White),
        SideConfig { search_depth: 4, evaluator: Evaluator::MaterialPositional }
    );

    session.human_move(Square::E2, Square::E4).unwrap();
    assert!(matches!(
        session.set_depth(Color::Black, 3),
        Err(SessionError::SearchInFlight(Color::Black))
    ));
    assert!(matches!(
        session.set_evaluator(Color::Black, Evaluator::MaterialTactical),
        Err(SessionError::SearchInFlight(Color::Black))
    ));
    // The other side is still configurable.
    session.set_depth(Color::White, 2).unwrap();
    assert_eq!(session.side_config(Color::Black), SideConfig::default());

    settle(&mut session);
    session.set_depth(Color::Black, 3).unwrap();
}

#[test]
fn test_invalid_engine_config_is_rejected() {
    let mut bad = config(false, 0);
    bad.black.search_depth = 9;
    assert!(matches!(
        Session::new(&bad),
        Err(SessionError::Config(ConfigError::DepthOutOfRange { depth: 9, .. }))
    ));
}

#[test]
fn test_ai_versus_ai_alternates() {
    let mut cfg = config(true, 0);
    cfg.white.search_depth = 1;
    cfg.black.search_depth = 1;
    let mut session = Session::new(&cfg).unwrap();
    let events = session.subscribe();

    for _ in 0..6 {
        assert!(session.wait_for_ai(WAIT).unwrap());
    }
    let sides: Vec<Color> = events
        .try_iter()
        .filter_map(|event| match event {
            SessionEvent::MovePlayed { side, by_ai: true, .. } => Some(side),
            _ => None,
        })
        .collect();
    assert_eq!(
        sides,
        vec![Color::White, Color::Black, Color::White, Color::Black, Color::White, Color::Black]
    );

    session.set_white_ai(false).unwrap();
    settle(&mut session);
    assert_eq!(session.turn(), TurnState::HumanToMove);
}

#[test]
fn test_enabling_white_ai_takes_over_the_move() {
    let mut session = Session::new(&config(false, 0)).unwrap();
    session.set_white_ai(true).unwrap();
    assert_eq!(session.turn(), TurnState::WhiteAiThinking);
    assert!(session.wait_for_ai(WAIT).unwrap());
    assert_eq!(session.game().ply_count(), 1);
    session.set_white_ai(false).unwrap();
    settle(&mut session);
    assert_eq!(session.turn(), TurnState::HumanToMove);
}

#[test]
fn test_game_result_reporting() {
    let stalemate = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(GameResult::of(&stalemate), Some(GameResult::Stalemate));
    let bare = Game::from_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1").unwrap();
    assert_eq!(GameResult::of(&bare), Some(GameResult::InsufficientMaterial));
    assert_eq!(GameResult::of(&Game::new()), None);

    let mated = GameResult::Checkmate { winner: Color::White };
    assert_eq!(mated.to_string(), "Checkmate! White wins");
    assert_eq!(GameResult::FiftyMoveRule.to_string(), "Draw: Fifty-move rule!");
}

#[test]
fn test_terminal_start_position_is_scored_once() {
    let session = session_from("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &config(false, 0));
    assert_eq!(session.turn(), TurnState::GameOver);
    assert_eq!(session.result(), Some(GameResult::Stalemate));
    assert_eq!(session.tally(), ScoreTally::default());
}

#[test]
fn test_black_search_waits_after_white_ai_move() {
    let mut cfg = config(true, 400);
    cfg.white.search_depth = 1;
    cfg.black.search_depth = 1;
    let mut session = Session::new(&cfg).unwrap();

    assert!(session.wait_for_ai(WAIT).unwrap());
    assert_eq!(session.game().ply_count(), 1);
    assert_eq!(session.turn(), TurnState::BlackAiThinking);
    assert!(!session.wait_for_ai(Duration::from_millis(100)).unwrap());
    assert_eq!(session.game().ply_count(), 1);

    session.set_white_ai(false).unwrap();
    settle(&mut session);
    assert_eq!(session.game().ply_count(), 2);
    assert_eq!(session.turn(), TurnState::HumanToMove);
}
