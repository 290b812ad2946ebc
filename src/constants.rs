//! Configuration constants for the Genhoot game system
//!
//! This module contains all the configuration limits and tuning values
//! used throughout the game system to ensure data integrity and
//! provide consistent boundaries for different game components.

/// Quiz configuration constants
pub mod quiz {
    /// Maximum number of questions allowed in a single quiz
    pub const MAX_QUESTION_COUNT: usize = 100;
    /// Maximum length of a quiz title in characters
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum length of a quiz topic in characters
    pub const MAX_TOPIC_LENGTH: usize = 200;
    /// Maximum length of a question text in characters
    pub const MAX_QUESTION_LENGTH: usize = 300;
    /// Maximum number of answer options for a question
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of a single answer option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
    /// Minimum time limit in seconds for answering a question
    pub const MIN_TIME_LIMIT: u32 = 5;
    /// Maximum time limit in seconds for answering a question
    pub const MAX_TIME_LIMIT: u32 = 240;
}

/// Scoring constants
pub mod scoring {
    /// Points awarded for any correct answer before bonuses
    pub const BASE_POINTS: u64 = 500;
    /// Maximum time bonus, awarded for an instantaneous correct answer
    pub const MAX_TIME_BONUS: u64 = 500;
    /// Extra points per consecutive correct answer held before this round
    pub const STREAK_BONUS_STEP: u64 = 100;
}

/// Session configuration constants
pub mod session {
    /// Maximum number of players allowed in a single session
    pub const MAX_PLAYER_COUNT: usize = 1000;
    /// Maximum length of a player name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
}

/// Leaderboard display constants
pub mod leaderboard {
    /// Number of entries shown in the between-round "Top N" view
    pub const TOP_VIEW_LIMIT: usize = 5;
    /// Number of players highlighted on the final podium
    pub const PODIUM_SIZE: usize = 3;
    /// How long rank-change markers remain valid after a refresh, in milliseconds
    pub const RANK_CHANGE_WINDOW_MS: u64 = 2000;
}

/// Persistence and resumption constants
pub mod store {
    /// Storage key under which the host's session snapshot is saved
    pub const HOST_KEY: &str = "genhoot.host";
    /// Storage key under which a player's local state is saved
    pub const PLAYER_KEY: &str = "genhoot.player";
    /// Upper bound in milliseconds for the liveness probe during resumption
    pub const PROBE_TIMEOUT_MS: u64 = 4000;
    /// Grace period in milliseconds before the snapshot is purged after FINISH
    pub const FINISH_PURGE_GRACE_MS: u64 = 5000;
}
