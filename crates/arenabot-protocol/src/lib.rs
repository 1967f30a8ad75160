//! Wire protocol for the arena bot.
//!
//! This crate defines the "language" spoken with the arena server:
//!
//! - **Types** ([`Event`], [`Message`], [`Request`]) — classified lines,
//!   received frames, and the move-request payload.
//! - **Codec** ([`parse_message`], [`parse_line`], [`encode`]) — text to
//!   events and back.
//! - **Commands** ([`Command`]) — every outgoing line the bot sends.
//! - **Formats** ([`format`]) — what a format id implies.
//! - **Errors** ([`ProtocolError`]) — payload decoding failures.
//!
//! # Architecture
//!
//! ```text
//! Transport (text frames) → Protocol (Message/Event) → Session / Match loop
//! ```

mod codec;
mod command;
mod error;
pub mod format;
mod types;

pub use codec::{encode, parse_line, parse_message, strip_rank};
pub use command::Command;
pub use error::ProtocolError;
pub use types::{
    ActiveSlot, Event, Finish, Message, MoveSlot, Request, RequestSide,
    SideMember,
};
