//! Bot configuration.
//!
//! Loaded once from a TOML file, overlaid by command-line flags, then
//! checked with [`BotConfig::validated`]. Every key has a default, so an
//! almost-empty file is enough for a guest account in accept mode.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use arenabot_protocol::format::{RANDOM_DOUBLES_FORMATS, RANDOM_SINGLES_FORMATS};
use arenabot_room::MatchConfig;
use arenabot_roster::DraftRules;
use arenabot_session::{DEFAULT_LOGIN_URI, DEFAULT_REPLAY_UPLOAD_URI, SessionConfig};
use serde::{Deserialize, Serialize};

use crate::ArenaError;

/// How the bot finds its matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotMode {
    /// Wait for other accounts to challenge the bot.
    #[default]
    AcceptChallenge,
    /// Challenge `user_to_challenge` over and over.
    ChallengeUser,
    /// Queue on the ladder.
    SearchLadder,
}

impl FromStr for BotMode {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept_challenge" => Ok(Self::AcceptChallenge),
            "challenge_user" => Ok(Self::ChallengeUser),
            "search_ladder" => Ok(Self::SearchLadder),
            other => Err(ArenaError::Config(format!(
                "unknown bot_mode '{other}' (expected accept_challenge, challenge_user or search_ladder)"
            ))),
        }
    }
}

impl fmt::Display for BotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptChallenge => write!(f, "accept_challenge"),
            Self::ChallengeUser => write!(f, "challenge_user"),
            Self::SearchLadder => write!(f, "search_ladder"),
        }
    }
}

/// Everything the bot reads at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// `host[:port]` of the arena server.
    pub websocket_uri: String,
    pub username: String,
    /// Without a password the name is claimed unregistered.
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub bot_mode: BotMode,
    /// Format played in challenge and ladder modes.
    pub format: String,
    /// Registry id of the decision engine.
    pub engine: String,
    /// Stop after this many matches; unlimited when unset.
    pub run_count: Option<u32>,
    pub team_dir: PathBuf,
    pub factory_dir: PathBuf,
    pub user_to_challenge: Option<String>,
    pub start_timer: bool,
    pub pre_battle_messages: Vec<String>,
    pub post_battle_messages: Vec<String>,
    pub save_replay: bool,
    /// Room joined before waiting for challenges.
    pub room_name: Option<String>,
    pub log_level: String,
    pub max_megas: usize,
    pub max_z_holders: usize,
    pub item_clause: bool,
    pub species_clause: bool,
    pub show_win_streak: bool,
    /// JSON record file; records live in memory when unset.
    pub records_path: Option<PathBuf>,
    /// Formats challengers may pick. Defaults to `format` alone.
    pub allowed_formats: Vec<String>,
    pub allow_random: bool,
    pub allow_doubles: bool,
    pub login_uri: String,
    pub replay_upload_uri: String,
    /// Concurrent decision-engine calls.
    pub worker_threads: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        let rules = DraftRules::default();
        let messages = MatchConfig::default();
        Self {
            websocket_uri: "localhost:8000".into(),
            username: String::new(),
            password: None,
            avatar: None,
            bot_mode: BotMode::default(),
            format: "gen9randombattle".into(),
            engine: "first".into(),
            run_count: None,
            team_dir: PathBuf::from("teams"),
            factory_dir: PathBuf::from("factory"),
            user_to_challenge: None,
            start_timer: messages.start_timer,
            pre_battle_messages: messages.pre_battle_messages,
            post_battle_messages: messages.post_battle_messages,
            save_replay: messages.save_replay,
            room_name: None,
            log_level: "debug".into(),
            max_megas: rules.max_megas,
            max_z_holders: rules.max_crystals,
            item_clause: rules.item_clause,
            species_clause: rules.species_clause,
            show_win_streak: messages.show_win_streak,
            records_path: None,
            allowed_formats: Vec::new(),
            allow_random: false,
            allow_doubles: false,
            login_uri: DEFAULT_LOGIN_URI.into(),
            replay_upload_uri: DEFAULT_REPLAY_UPLOAD_URI.into(),
            worker_threads: 2,
        }
    }
}

impl BotConfig {
    /// Parses TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ArenaError> {
        toml::from_str(text).map_err(|e| ArenaError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArenaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ArenaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the settings and fills in the derived ones.
    ///
    /// The allow-list ends up holding `format` when left empty, plus the
    /// random singles and doubles lists when enabled, de-duplicated and
    /// sorted.
    pub fn validated(mut self) -> Result<Self, ArenaError> {
        if self.username.trim().is_empty() {
            return Err(ArenaError::Config("username is required".into()));
        }
        if self.format.trim().is_empty() {
            return Err(ArenaError::Config("format is required".into()));
        }
        if self.bot_mode == BotMode::ChallengeUser
            && self.user_to_challenge.as_deref().is_none_or(|u| u.trim().is_empty())
        {
            return Err(ArenaError::Config(
                "challenge_user mode needs user_to_challenge".into(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(ArenaError::Config("worker_threads must be at least 1".into()));
        }

        if self.allowed_formats.is_empty() {
            self.allowed_formats.push(self.format.clone());
        }
        if self.allow_random {
            self.allowed_formats
                .extend(RANDOM_SINGLES_FORMATS.iter().map(|f| f.to_string()));
        }
        if self.allow_doubles {
            self.allowed_formats
                .extend(RANDOM_DOUBLES_FORMATS.iter().map(|f| f.to_string()));
        }
        self.allowed_formats.sort();
        self.allowed_formats.dedup();

        Ok(self)
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            pre_battle_messages: self.pre_battle_messages.clone(),
            post_battle_messages: self.post_battle_messages.clone(),
            start_timer: self.start_timer,
            save_replay: self.save_replay,
            show_win_streak: self.show_win_streak,
        }
    }

    pub fn draft_rules(&self) -> DraftRules {
        DraftRules {
            species_clause: self.species_clause,
            item_clause: self.item_clause,
            max_megas: self.max_megas,
            max_crystals: self.max_z_holders,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        let config = SessionConfig::new(&self.username);
        match &self.password {
            Some(password) => config.with_password(password),
            None => config,
        }
    }
}
