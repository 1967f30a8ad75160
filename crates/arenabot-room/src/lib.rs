//! Match loop for the arena bot.
//!
//! One match runs at a time, driven by [`run_match`] on the bot's
//! session. The loop owns the authoritative [`MatchState`]; moves come
//! from a pluggable [`DecisionEngine`] that only ever sees snapshots.
//!
//! # Key types
//!
//! - [`run_match`] / [`MatchContext`] / [`MatchResult`] — the loop itself
//! - [`MatchState`] — what the bot knows about the match
//! - [`DecisionEngine`] — the trait move pickers implement
//! - [`StateUpdater`] / [`RequestTracker`] — folding events into state
//! - [`EngineRegistry`] — engines by id, resolved once at startup
//! - [`EnginePool`] — bounded blocking workers for engine calls
//! - [`MatchPhase`] — lifecycle state machine
//! - [`MatchConfig`] — messages, timer, replay, streak settings

mod config;
mod engines;
mod error;
mod logic;
mod pool;
mod room;
mod state;

pub use config::{MatchConfig, MatchPhase};
pub use engines::{legal_options, FirstLegal, RandomLegal};
pub use error::RoomError;
pub use logic::{DecisionEngine, EngineRegistry, RequestTracker, StateUpdater};
pub use pool::EnginePool;
pub use room::{run_match, team_order, MatchContext, MatchResult};
pub use state::{opponent_from_title, Combatant, MatchState, Side};
