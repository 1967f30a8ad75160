//! Server session for the arena bot.
//!
//! A [`Session`] owns the one connection to the arena server and knows
//! who the bot is:
//!
//! 1. **Login** — `challstr` → [`AccountServer`] assertion → `/trn`.
//! 2. **Session-level commands** — roster upload, challenges (paced by a
//!    [`RateLimiter`](arenabot_pace::RateLimiter)), ladder search,
//!    accept/reject, room join/leave, replay saving.
//! 3. **Receiving** — every frame is classified into a
//!    [`Message`](arenabot_protocol::Message).
//!
//! # How it fits in the stack
//!
//! ```text
//! Negotiator / Match loop (above)  ← drive the session
//!     ↕
//! Session (this crate)             ← identity, pacing, command wire text
//!     ↕
//! Transport + Protocol (below)     ← frames and their classification
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod session;

pub use auth::{
    AccountServer, DEFAULT_LOGIN_URI, DEFAULT_REPLAY_UPLOAD_URI, HttpAccountServer,
    parse_login_response,
};
pub use error::SessionError;
pub use session::{Session, SessionConfig};
