//! Win/loss and preference records for the arena bot.
//!
//! The match loop updates a [`FormatRecord`] for each participant when a
//! match ends; the challenge negotiator reads [`User::banned`] and the
//! roster [`Preferences`] before accepting a challenge.
//!
//! Two stores are provided:
//!
//! - [`MemoryRecordStore`] — process lifetime only.
//! - [`JsonRecordStore`] — a JSON file rewritten after every change.

#![allow(async_fn_in_trait)]

mod error;
mod store;
mod types;

pub use error::RecordError;
pub use store::{JsonRecordStore, MemoryRecordStore, RecordStore};
pub use types::{FormatRecord, Preferences, User, user_id};
