//! Match settings and the match phase machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// What the bot says and does around a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Chat lines sent once the match has started.
    pub pre_battle_messages: Vec<String>,
    /// Chat lines sent once the match is decided.
    pub post_battle_messages: Vec<String>,
    /// Send `/timer on` at the start.
    pub start_timer: bool,
    /// Save a replay before leaving.
    pub save_replay: bool,
    /// Announce the opponent's win streak at the start and end.
    pub show_win_streak: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            pre_battle_messages: vec!["glhf".into()],
            post_battle_messages: vec!["ggwp".into()],
            start_timer: false,
            save_replay: false,
            show_win_streak: false,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// Where a match is in its lifecycle.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Discovering → Starting → InProgress → Finished → Leaving
/// ```
///
/// - **Discovering**: waiting for the room tag, the opponent, and the
///   first request.
/// - **Starting**: roster preview or the first switch-ins.
/// - **InProgress**: the turn loop.
/// - **Finished**: the result is known; records are being updated.
/// - **Leaving**: the leave command is out, waiting for the room to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    Discovering,
    Starting,
    InProgress,
    Finished,
    Leaving,
}

impl MatchPhase {
    /// Returns `true` while moves may be sent.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::InProgress)
    }

    /// The phase after this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Discovering => Some(Self::Starting),
            Self::Starting => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => Some(Self::Leaving),
            Self::Leaving => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovering => write!(f, "Discovering"),
            Self::Starting => write!(f, "Starting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
            Self::Leaving => write!(f, "Leaving"),
        }
    }
}
