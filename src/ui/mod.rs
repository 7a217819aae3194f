// ui/mod.rs

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListDirection, ListItem, Paragraph, Wrap},
};
use shakmaty::{File, Move, Piece, Position as _, Rank, Role, Square};

use crate::app::App;
use crate::constants::DEPTH_PRESETS;
use crate::game::Game;
use crate::session::TurnState;

pub fn draw(frame: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Status bar
            Constraint::Length(11), // Board and side panels
            Constraint::Length(3),  // Move input
            Constraint::Min(0),     // Log
        ])
        .split(frame.size());

    draw_status_bar(frame, app, main_chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(24),    // Black AI
            Constraint::Length(28), // Board
            Constraint::Min(24),    // White AI
        ])
        .split(main_chunks[1]);

    draw_side_panel(frame, app, shakmaty::Color::Black, middle[0]);
    let game = app.session.game();
    draw_board(frame, middle[1], game, game.last_move(), "Board");
    draw_side_panel(frame, app, shakmaty::Color::White, middle[2]);

    draw_input(frame, app, main_chunks[2]);
    draw_log(frame, app, main_chunks[3]);

    if app.session.turn() == TurnState::AwaitingPromotionChoice {
        draw_promotion_prompt(frame, middle[1]);
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let tally = session.tally();
    let (status, color) = match (session.turn(), session.result()) {
        (TurnState::GameOver, Some(result)) => (format!("{result}  (R to restart)"), Color::Red),
        (TurnState::GameOver, None) => ("Game over".to_string(), Color::Red),
        (TurnState::HumanToMove, _) if session.game().is_check() => {
            (format!("{:?} to move, in check", session.game().turn()), Color::Magenta)
        }
        (TurnState::HumanToMove, _) => (format!("{:?} to move", session.game().turn()), Color::Green),
        (TurnState::WhiteAiThinking, _) => ("White AI is thinking...".to_string(), Color::Yellow),
        (TurnState::BlackAiThinking, _) => ("Black AI is thinking...".to_string(), Color::Yellow),
        (TurnState::AwaitingPromotionChoice, _) => ("Choose a promotion piece".to_string(), Color::Cyan),
    };
    let line = Line::from(vec![
        Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "  |  Player {} : {} Computer  |  Move {}",
            tally.human_wins,
            tally.ai_wins,
            session.game().position().fullmoves()
        )),
    ]);
    let bar = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Minimax Chess"));
    frame.render_widget(bar, area);
}

fn draw_side_panel(frame: &mut Frame, app: &App, side: shakmaty::Color, area: Rect) {
    let session = &app.session;
    let config = session.side_config(side);
    let preset = DEPTH_PRESETS
        .iter()
        .find(|(_, depth)| *depth == config.search_depth)
        .map(|(label, _)| format!(" ({label})"))
        .unwrap_or_default();

    let controller = match side {
        shakmaty::Color::Black => "AI".to_string(),
        shakmaty::Color::White if session.white_ai_enabled() => "AI (W to hand back)".to_string(),
        shakmaty::Color::White => "Human (W for AI)".to_string(),
    };

    let mut lines = vec![
        Line::from(format!("Player: {controller}")),
        Line::from(format!("Depth: {}{preset}", config.search_depth)),
        Line::from(format!("Eval: {} {:?}", config.evaluator.label(), config.evaluator)),
    ];
    if session.thinking() == Some(side) {
        lines.push(Line::styled("Thinking...", Style::default().fg(Color::Yellow)));
    }
    if let Some((searched, outcome)) = session.last_search() {
        if *searched == side {
            let score = match (outcome.delivers_mate, outcome.score) {
                (true, _) => "mate".to_string(),
                (false, Some(score)) => score.to_string(),
                (false, None) => "-".to_string(),
            };
            lines.push(Line::from(format!("Last: {score}, {} nodes", outcome.nodes)));
            lines.push(Line::from(format!("Time: {:.2?}", outcome.elapsed)));
        }
    }

    let border = if app.selected_side == side {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!("{side:?}")),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(format!("> {}", app.user_input))];
    if let Some(message) = &app.message {
        spans.push(Span::styled(format!("   {message}"), Style::default().fg(Color::Red)));
    }
    let help = "Move (e2e4) | Tab side | Up/Down depth | F1-F3 preset | Left/Right eval | W white AI | R restart | Esc quit";
    let input = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(help));
    frame.render_widget(input, area);
}

fn draw_log(frame: &mut Frame, app: &App, area: Rect) {
    let log_items: Vec<ListItem> = app
        .log
        .iter()
        .rev()
        .map(|msg| ListItem::new(msg.as_str()))
        .collect();
    let log_list = List::new(log_items)
        .block(Block::default().borders(Borders::ALL).title("Log"))
        .direction(ListDirection::BottomToTop);
    frame.render_widget(log_list, area);
}

fn draw_promotion_prompt(frame: &mut Frame, board_area: Rect) {
    let width = 26.min(board_area.width);
    let area = Rect {
        x: board_area.x + (board_area.width - width) / 2,
        y: board_area.y + board_area.height / 2 - 1,
        width,
        height: 3,
    };
    let prompt = Paragraph::new("q   r   b   n")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Promote to"));
    frame.render_widget(Clear, area);
    frame.render_widget(prompt, area);
}

fn draw_board(frame: &mut Frame, area: Rect, game: &Game, last_move: Option<Move>, title: &str) {
    let highlighted = |square: Square| last_move.is_some_and(|m| m.from() == Some(square) || m.to() == square);
    let mut board_text = Text::default();

    for rank_idx in (0..8).rev() {
        let mut line = Line::default();
        line.spans.push(Span::styled(
            format!("{} ", rank_idx + 1),
            Style::default().fg(Color::Gray),
        ));
        for file_idx in 0..8 {
            let square = Square::from_coords(File::new(file_idx), Rank::new(rank_idx));
            let piece = game.piece_at(square);
            let symbol = get_piece_symbol(piece);

            let bg_color = if highlighted(square) {
                Color::Rgb(205, 210, 106)
            } else if (file_idx + rank_idx) % 2 == 0 {
                Color::Rgb(181, 136, 99) // Dark square
            } else {
                Color::Rgb(240, 217, 181) // Light square
            };

            let fg_color = match piece {
                Some(p) if p.color == shakmaty::Color::White => Color::White,
                Some(_) => Color::Black,
                None => bg_color,
            };

            line.spans.push(Span::styled(
                format!(" {symbol} "),
                Style::default().bg(bg_color).fg(fg_color),
            ));
        }
        board_text.lines.push(line);
    }

    let mut file_labels = Line::default();
    file_labels.spans.push(Span::raw("  "));
    for file in 'a'..='h' {
        file_labels.spans.push(Span::styled(
            format!(" {file} "),
            Style::default().fg(Color::Gray),
        ));
    }
    board_text.lines.push(file_labels);

    let board_widget =
        Paragraph::new(board_text).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(board_widget, area);
}

fn get_piece_symbol(piece: Option<Piece>) -> &'static str {
    let Some(piece) = piece else {
        return " ";
    };
    match (piece.color, piece.role) {
        (shakmaty::Color::White, Role::King) => "♔",
        (shakmaty::Color::White, Role::Queen) => "♕",
        (shakmaty::Color::White, Role::Rook) => "♖",
        (shakmaty::Color::White, Role::Bishop) => "♗",
        (shakmaty::Color::White, Role::Knight) => "♘",
        (shakmaty::Color::White, Role::Pawn) => "♙",
        (shakmaty::Color::Black, Role::King) => "♚",
        (shakmaty::Color::Black, Role::Queen) => "♛",
        (shakmaty::Color::Black, Role::Rook) => "♜",
        (shakmaty::Color::Black, Role::Bishop) => "♝",
        (shakmaty::Color::Black, Role::Knight) => "♞",
        (shakmaty::Color::Black, Role::Pawn) => "♟",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::session::Session;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn test_draw_renders_board_and_panels() {
        let config = EngineConfig {
            pacing_ms: 0,
            ..EngineConfig::default()
        };
        let app = App::new(Session::new(&config).unwrap());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("♔"));
        assert!(text.contains("♚"));
        assert!(text.contains("White to move"));
        assert!(text.contains("Depth: 2 (Easy)"));
    }

    #[test]
    fn test_piece_symbols() {
        assert_eq!(get_piece_symbol(None), " ");
        assert_eq!(
            get_piece_symbol(Some(Piece { color: shakmaty::Color::Black, role: Role::Knight })),
            "♞"
        );
    }
}
