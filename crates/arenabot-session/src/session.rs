//! The server session: one connection, one identity.

use std::time::Duration;

use arenabot_pace::{CHALLENGE_INTERVAL, RateLimiter};
use arenabot_protocol::{format, parse_message, Command, Event, Message};
use arenabot_transport::{Connection, WebSocketConnection};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{AccountServer, SessionError};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Identity and pacing for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub username: String,
    /// `None` logs in without a password (assertion-only).
    pub password: Option<String>,
    /// Minimum interval between two outgoing challenges.
    pub challenge_interval: Duration,
}

impl SessionConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            challenge_interval: CHALLENGE_INTERVAL,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The bot's session with the arena server.
///
/// Owns the connection and is the only thing that reads from or writes
/// to it. Every outgoing line goes through [`Session::send`], every
/// incoming frame through [`Session::next_message`].
pub struct Session<C: Connection, A: AccountServer> {
    config: SessionConfig,
    connection: C,
    account: A,
    /// Last line sent, kept for diagnostics.
    last_message: Option<String>,
    challenges: RateLimiter,
}

impl<A: AccountServer> Session<WebSocketConnection, A> {
    /// Connects to the arena server at `address` (`host[:port]`).
    pub async fn connect(
        address: &str,
        account: A,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let url = format!("ws://{address}/showdown/websocket");
        let connection = WebSocketConnection::connect(&url).await?;
        info!(%url, "connected to arena server");
        Ok(Self::new(connection, account, config))
    }
}

impl<C: Connection, A: AccountServer> Session<C, A> {
    /// Wraps an already-open connection.
    pub fn new(connection: C, account: A, config: SessionConfig) -> Self {
        let challenges = RateLimiter::new(config.challenge_interval);
        Self {
            config,
            connection,
            account,
            last_message: None,
            challenges,
        }
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    // -- raw traffic --------------------------------------------------------

    /// Sends one command.
    pub async fn send(&mut self, command: &Command) -> Result<(), SessionError> {
        let line = command.encode();
        debug!(conn = %self.connection.id(), line = %line, "send");
        self.connection.send(&line).await?;
        self.last_message = Some(line);
        Ok(())
    }

    /// Waits for the next frame from the server.
    ///
    /// A closed connection is an error here; nothing above the session
    /// can make progress without the server.
    pub async fn next_message(&mut self) -> Result<Message, SessionError> {
        let frame = self.connection.recv_frame().await?;
        debug!(conn = %self.connection.id(), frame = %frame, "recv");
        Ok(parse_message(&frame))
    }

    // -- login --------------------------------------------------------------

    /// Performs the login handshake.
    ///
    /// Waits for the `challstr`, trades it for an assertion at the account
    /// server and claims the configured name.
    pub async fn login(&mut self) -> Result<(), SessionError> {
        debug!(username = %self.config.username, "logging in");
        let challstr = loop {
            let message = self.next_message().await?;
            let found = message.events.iter().find_map(|event| match event {
                Event::Challstr {
                    client_id,
                    challenge,
                } => Some(format!("{client_id}|{challenge}")),
                _ => None,
            });
            if let Some(challstr) = found {
                break challstr;
            }
        };

        let assertion = self
            .account
            .assertion(
                &self.config.username,
                self.config.password.as_deref(),
                &challstr,
            )
            .await?;

        let claim = Command::claim_identity(&self.config.username, &assertion);
        self.send(&claim).await?;
        info!(username = %self.config.username, "logged in");
        Ok(())
    }

    // -- global commands ----------------------------------------------------

    pub async fn join_room(&mut self, room: &str) -> Result<(), SessionError> {
        self.send(&Command::join(room)).await?;
        debug!(room, "joined room");
        Ok(())
    }

    pub async fn set_avatar(&mut self, avatar: &str) -> Result<(), SessionError> {
        self.send(&Command::avatar(avatar)).await
    }

    /// Sets the roster for the next challenge or search.
    ///
    /// Formats whose rosters the server builds get `null`.
    pub async fn update_team(
        &mut self,
        format_id: &str,
        packed: Option<&str>,
    ) -> Result<(), SessionError> {
        let packed = if !format::needs_roster(format_id) {
            info!(format = format_id, "clearing roster, the server builds it for this format");
            None
        } else {
            packed
        };
        self.send(&Command::update_team(packed)).await
    }

    /// Challenges `user`, waiting out the challenge interval if needed.
    pub async fn challenge_user(
        &mut self,
        user: &str,
        format_id: &str,
        packed: Option<&str>,
    ) -> Result<(), SessionError> {
        debug!(user, format = format_id, "challenging");
        self.challenges.wait().await;
        self.update_team(format_id, packed).await?;
        self.send(&Command::challenge(user, format_id)).await?;
        self.challenges.mark();
        Ok(())
    }

    /// Enters the ladder queue for `format_id`.
    pub async fn search_for_match(
        &mut self,
        format_id: &str,
        packed: Option<&str>,
    ) -> Result<(), SessionError> {
        debug!(format = format_id, "searching for ladder match");
        self.update_team(format_id, packed).await?;
        self.send(&Command::search(format_id)).await
    }

    pub async fn accept_challenge(&mut self, user: &str) -> Result<(), SessionError> {
        self.send(&Command::accept(user)).await
    }

    /// Rejects `user`'s challenge, telling them why when `reason` is given.
    pub async fn reject_challenge(
        &mut self,
        user: &str,
        reason: Option<&str>,
    ) -> Result<(), SessionError> {
        self.send(&Command::reject(user)).await?;
        if let Some(reason) = reason {
            self.private_message(user, reason).await?;
        }
        Ok(())
    }

    pub async fn private_message(&mut self, user: &str, text: &str) -> Result<(), SessionError> {
        self.send(&Command::private_message(user, text)).await
    }

    // -- match room ---------------------------------------------------------

    /// Leaves a finished match room and waits until the server closes it.
    ///
    /// A failed replay save is logged and does not stop the leave. Only a
    /// broken connection ends it early.
    pub async fn leave_battle(&mut self, tag: &str, save_replay: bool) -> Result<(), SessionError> {
        if save_replay {
            match self.save_replay(tag).await {
                Ok(()) => info!(tag, "replay saved"),
                Err(SessionError::Transport(e)) => return Err(e.into()),
                Err(e) => warn!(tag, error = %e, "could not save replay"),
            }
        }

        self.send(&Command::leave(tag)).await?;
        loop {
            if self.next_message().await?.is_deinit_for(tag) {
                debug!(tag, "left match room");
                return Ok(());
            }
        }
    }

    /// Asks the server for the match log and uploads it as a replay.
    pub async fn save_replay(&mut self, tag: &str) -> Result<(), SessionError> {
        self.send(&Command::save_replay(tag)).await?;

        let payload = loop {
            let message = self.next_message().await?;
            let found = message.events.into_iter().find_map(|event| match event {
                Event::QueryResponse { query, payload } if query == "savereplay" => Some(payload),
                _ => None,
            });
            if let Some(payload) = found {
                break payload;
            }
        };

        let replay: ReplayPayload = serde_json::from_str(&payload)
            .map_err(|e| SessionError::SaveReplay(format!("unreadable replay payload: {e}")))?;
        self.account.upload_replay(&replay.log, &replay.id).await
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), SessionError> {
        self.connection.close().await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ReplayPayload {
    log: String,
    id: String,
}
