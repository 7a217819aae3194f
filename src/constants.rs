// --- Piece values ---
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;
pub const KING_VALUE: i32 = 20_000;

// Tactical terms
pub const CHECK_PENALTY: i32 = 50;

// Search
pub const MATE_SCORE: i32 = 2_000_000;
pub const INFINITY: i32 = i32::MAX;

// Side configuration
pub const MIN_SEARCH_DEPTH: u8 = 1;
pub const MAX_SEARCH_DEPTH: u8 = 6;
pub const DEFAULT_SEARCH_DEPTH: u8 = 2;

/// Easy / Medium / Hard.
pub const DEPTH_PRESETS: [(&str, u8); 3] = [("Easy", 2), ("Medium", 3), ("Hard", 4)];

// Orchestration
pub const DEFAULT_PACING_MS: u64 = 350;
