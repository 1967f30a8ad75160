//! # Arenabot
//!
//! An automated player for a turn-based arena server.
//!
//! The bot logs in, finds a match (by accepting challenges, challenging a
//! configured account, or queueing on the ladder), plays it with a
//! pluggable [`DecisionEngine`](arenabot_room::DecisionEngine), records the
//! result, and goes again.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arenabot::prelude::*;
//!
//! # async fn start() -> Result<(), ArenaError> {
//! let config = BotConfig::load("arenabot.toml")?;
//! let mut bot = BotBuilder::new(config)
//!     .connect(MemoryRecordStore::new())
//!     .await?;
//! bot.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - `arenabot-transport` — text frames over WebSocket or in-memory channels
//! - `arenabot-protocol` — the pipe-delimited wire format
//! - `arenabot-roster` — export text, pool drafting, packing
//! - `arenabot-pace` — challenge pacing
//! - `arenabot-records` — win/loss records and challenger preferences
//! - `arenabot-session` — login and session-level commands
//! - `arenabot-room` — the match loop and decision engines
//! - this crate — configuration, roster sources, challenge negotiation,
//!   and the bot runner

mod bot;
mod challenge;
mod config;
mod error;
mod teams;

pub use bot::{Bot, BotBuilder, RunSummary};
pub use challenge::{
    BANNED_REASON, ChallengeRequest, FORMAT_REASON, NO_TEAM_REASON, NegotiationState,
    Negotiator, TEAM_LINK_REASON, Verdict,
};
pub use config::{BotConfig, BotMode};
pub use error::ArenaError;
pub use teams::{RosterLibrary, RosterSource, TeamError};

pub use arenabot_pace as pace;
pub use arenabot_protocol as protocol;
pub use arenabot_records as records;
pub use arenabot_room as room;
pub use arenabot_roster as roster;
pub use arenabot_session as session;
pub use arenabot_transport as transport;

/// The types most programs need.
pub mod prelude {
    pub use crate::{
        ArenaError, Bot, BotBuilder, BotConfig, BotMode, RosterLibrary, RunSummary,
    };
    pub use arenabot_records::{JsonRecordStore, MemoryRecordStore, RecordStore};
    pub use arenabot_room::{DecisionEngine, EngineRegistry, MatchState};
}
