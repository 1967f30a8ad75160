//! The bot runner: find a match, play it, repeat.
//!
//! The runner ties the layers together:
//!
//! ```text
//! Bot::run
//!   ├─ Session::login, avatar
//!   └─ loop
//!        ├─ enter a match   (Negotiator | challenge_user | search_for_match)
//!        ├─ run_match       (arenabot-room)
//!        └─ tally, stop after run_count
//! ```
//!
//! Nothing survives from one match to the next except the session and
//! the record store.

use std::sync::Arc;

use arenabot_protocol::format;
use arenabot_records::{RecordStore, user_id};
use arenabot_room::{
    DecisionEngine, EnginePool, EngineRegistry, MatchConfig, MatchContext, MatchResult,
    RequestTracker, run_match,
};
use arenabot_session::{AccountServer, HttpAccountServer, Session};
use arenabot_transport::{Connection, WebSocketConnection};
use tracing::{info, warn};

use crate::challenge::Negotiator;
use crate::teams::RosterLibrary;
use crate::{ArenaError, BotConfig, BotMode};

/// Outcome counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl RunSummary {
    fn count(&mut self, result: &MatchResult, own_name: &str) {
        self.matches += 1;
        match result.winner.as_deref() {
            None => self.ties += 1,
            Some(winner) if user_id(winner) == user_id(own_name) => self.wins += 1,
            Some(_) => self.losses += 1,
        }
    }
}

/// Builder for a [`Bot`].
///
/// # Example
///
/// ```rust,ignore
/// let config = BotConfig::load("arenabot.toml")?;
/// let mut bot = BotBuilder::new(config)
///     .connect(MemoryRecordStore::new())
///     .await?;
/// let summary = bot.run().await?;
/// ```
pub struct BotBuilder {
    config: BotConfig,
    registry: EngineRegistry,
}

impl BotBuilder {
    /// A builder with the built-in engines registered.
    pub fn new(config: BotConfig) -> Self {
        Self {
            config,
            registry: EngineRegistry::with_builtins(),
        }
    }

    /// Registers an extra decision engine under `id`.
    pub fn engine(mut self, id: impl Into<String>, engine: Arc<dyn DecisionEngine>) -> Self {
        self.registry.register(id, engine);
        self
    }

    /// Connects to the configured server with the HTTPS account server.
    pub async fn connect<R: RecordStore>(
        self,
        records: R,
    ) -> Result<Bot<WebSocketConnection, HttpAccountServer, R>, ArenaError> {
        let config = self.config.clone().validated()?;
        let account = HttpAccountServer::new(&config.login_uri, &config.replay_upload_uri);
        let session =
            Session::connect(&config.websocket_uri, account, config.session_config()).await?;
        self.build(session, records)
    }

    /// Builds a bot around an existing session.
    ///
    /// Validates the configuration and resolves the engine id; an unknown
    /// id is a configuration error.
    pub fn build<C, A, R>(
        self,
        session: Session<C, A>,
        records: R,
    ) -> Result<Bot<C, A, R>, ArenaError>
    where
        C: Connection,
        A: AccountServer,
        R: RecordStore,
    {
        let config = self.config.validated()?;
        let engine = self.registry.get(&config.engine).ok_or_else(|| {
            let known: Vec<&str> = self.registry.ids().collect();
            ArenaError::Config(format!(
                "unknown engine '{}' (known: {})",
                config.engine,
                known.join(", ")
            ))
        })?;

        Ok(Bot {
            library: RosterLibrary::from_config(&config),
            match_config: config.match_config(),
            pool: EnginePool::new(config.worker_threads),
            updater: RequestTracker,
            engine,
            session,
            records,
            config,
        })
    }
}

/// A logged-in player looping over matches.
pub struct Bot<C: Connection, A: AccountServer, R: RecordStore> {
    config: BotConfig,
    session: Session<C, A>,
    records: R,
    engine: Arc<dyn DecisionEngine>,
    updater: RequestTracker,
    pool: EnginePool,
    library: RosterLibrary,
    match_config: MatchConfig,
}

impl<C, A, R> Bot<C, A, R>
where
    C: Connection,
    A: AccountServer,
    R: RecordStore,
{
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn session(&self) -> &Session<C, A> {
        &self.session
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    /// Logs in and sets the avatar.
    pub async fn start(&mut self) -> Result<(), ArenaError> {
        self.session.login().await?;
        if let Some(avatar) = &self.config.avatar {
            self.session.set_avatar(avatar).await?;
        }
        Ok(())
    }

    /// Logs in, then plays until `run_count` matches are done.
    ///
    /// Without a `run_count` this only returns on error.
    pub async fn run(&mut self) -> Result<RunSummary, ArenaError> {
        self.start().await?;
        info!(mode = %self.config.bot_mode, engine = %self.config.engine, "bot running");

        let mut summary = RunSummary::default();
        loop {
            let result = self.play_one().await?;
            summary.count(&result, self.session.username());
            info!(
                tag = %result.tag,
                winner = result.winner.as_deref().unwrap_or("tie"),
                played = summary.matches,
                wins = summary.wins,
                losses = summary.losses,
                "match finished"
            );

            if self
                .config
                .run_count
                .is_some_and(|limit| summary.matches >= limit)
            {
                info!(played = summary.matches, "run count reached");
                return Ok(summary);
            }
        }
    }

    /// Enters one match and plays it out.
    pub async fn play_one(&mut self) -> Result<MatchResult, ArenaError> {
        let format_id = self.enter_match().await?;

        let ctx = MatchContext {
            records: &self.records,
            engine: Arc::clone(&self.engine),
            updater: &self.updater,
            pool: &self.pool,
            config: &self.match_config,
        };
        Ok(run_match(&mut self.session, &ctx, &format_id).await?)
    }

    /// Gets a match started according to the bot mode; returns its format.
    async fn enter_match(&mut self) -> Result<String, ArenaError> {
        match self.config.bot_mode {
            BotMode::AcceptChallenge => {
                let negotiator = Negotiator {
                    records: &self.records,
                    library: &self.library,
                    allowed_formats: &self.config.allowed_formats,
                    engine: self.engine.as_ref(),
                    room: self.config.room_name.as_deref(),
                };
                negotiator.accept_challenge(&mut self.session).await
            }
            BotMode::ChallengeUser => {
                let roster = self.own_roster().await?;
                let format_id = self.config.format.clone();
                let user = self.config.user_to_challenge.clone().ok_or_else(|| {
                    ArenaError::Config("challenge_user mode needs user_to_challenge".into())
                })?;
                self.engine.apply_format_rules(&format_id);
                self.session
                    .challenge_user(&user, &format_id, roster.as_deref())
                    .await?;
                Ok(format_id)
            }
            BotMode::SearchLadder => {
                let roster = self.own_roster().await?;
                let format_id = self.config.format.clone();
                self.engine.apply_format_rules(&format_id);
                self.session
                    .search_for_match(&format_id, roster.as_deref())
                    .await?;
                Ok(format_id)
            }
        }
    }

    /// The bot's own roster for the configured format.
    ///
    /// Formats that need a roster fail the run when none can be found.
    async fn own_roster(&self) -> Result<Option<String>, ArenaError> {
        let format_id = &self.config.format;
        if !format::needs_roster(format_id) {
            return Ok(None);
        }
        match self.library.own_roster(format_id).await? {
            Some(roster) => Ok(Some(roster)),
            None => {
                warn!(format = %format_id, "no roster in team_dir or factory_dir");
                Err(ArenaError::Config(format!(
                    "no roster available for {format_id}"
                )))
            }
        }
    }

    /// Closes the connection.
    pub async fn shutdown(&self) -> Result<(), ArenaError> {
        self.session.close().await?;
        Ok(())
    }
}
