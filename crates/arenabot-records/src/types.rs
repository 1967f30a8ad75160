//! Record types.

use serde::{Deserialize, Serialize};

/// Account names are compared by their normalized id, so `"Ash Ketchum"`
/// and `"ashketchum"` are the same account.
pub use arenabot_roster::normalize as user_id;

/// An account the bot has met.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Display name as first seen.
    pub username: String,
    /// Banned accounts have their challenges rejected.
    pub banned: bool,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            banned: false,
        }
    }

    pub fn id(&self) -> String {
        user_id(&self.username)
    }
}

/// How an account wants the bot to pick a roster against them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Try the account-supplied roster first.
    pub use_team: bool,
    /// Paste link for the account-supplied roster.
    pub team: Option<String>,
    /// Prefer a pool draft over a static roster.
    pub use_factory: bool,
}

/// One account's record in one format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatRecord {
    pub username: String,
    pub format: String,
    pub wins: u32,
    pub losses: u32,
    pub win_streak: u32,
    pub max_win_streak: u32,
    pub preferences: Preferences,
}

impl FormatRecord {
    pub fn new(username: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            format: format.into(),
            ..Self::default()
        }
    }

    /// Counts a win and returns the new streak.
    pub fn record_win(&mut self) -> u32 {
        self.wins += 1;
        self.win_streak += 1;
        self.max_win_streak = self.max_win_streak.max(self.win_streak);
        self.win_streak
    }

    /// Counts a loss and returns the new streak, which is always zero.
    pub fn record_loss(&mut self) -> u32 {
        self.losses += 1;
        self.win_streak = 0;
        self.win_streak
    }
}
