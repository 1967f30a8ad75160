//! Roster assembly for the arena bot.
//!
//! Turns human-authored roster text into the packed form the server
//! accepts:
//!
//! ```text
//! export text ──parse_export──→ [RosterSet] ──pack──→ "name|species|...]name|..."
//!                                    │
//!                                    └──draft_factory (pool of candidates → ≤ 6 sets)
//! ```
//!
//! Everything here is pure: reading files or fetching pastes is the
//! caller's business.

mod draft;
mod export;
mod normalize;
mod pack;
mod set;

pub use draft::{
    DraftRules, DraftState, ROSTER_SIZE, Rejection, draft_factory,
    draft_factory_with,
};
pub use export::{parse_export, parse_export_with};
pub use normalize::{base_species, normalize};
pub use pack::{PACKED_FIELDS, pack};
pub use set::{MAX_MOVES, RosterSet, Stat, StatTable};
