//! The match loop: one match from discovery to room exit.
//!
//! ```text
//! Discovering ──(tag, opponent, first request)──→ Starting
//! Starting ──(preview order | first switch-ins + first move)──→ InProgress
//! InProgress ──(win/tie narration)──→ Finished ──(records, messages)──→ Leaving
//! ```
//!
//! The loop reads one frame at a time and finishes with it before reading
//! the next. The only work done elsewhere is the engine's decision, which
//! runs on the [`EnginePool`] while the loop waits for it.

use std::sync::Arc;

use arenabot_protocol::{format, Command, Event, Finish, Message, Request};
use arenabot_records::RecordStore;
use arenabot_session::{AccountServer, Session};
use arenabot_transport::Connection;
use tracing::{debug, info, warn};

use crate::state::opponent_from_title;
use crate::{
    DecisionEngine, EnginePool, MatchConfig, MatchPhase, MatchState, RoomError, StateUpdater,
};

/// Sent when an engine offers no candidates.
const FALLBACK_CHOICE: &str = "/choose default";

/// Everything a match needs besides the session.
pub struct MatchContext<'a, R: RecordStore> {
    pub records: &'a R,
    pub engine: Arc<dyn DecisionEngine>,
    pub updater: &'a dyn StateUpdater,
    pub pool: &'a EnginePool,
    pub config: &'a MatchConfig,
}

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub tag: String,
    pub format: String,
    /// Narrated winner, `None` on a tie.
    pub winner: Option<String>,
    /// The other participant, when the winner is one of the two.
    pub loser: Option<String>,
}

impl MatchResult {
    /// Classifies a finish narration.
    ///
    /// Names are compared exactly as the server narrated them. A winner
    /// who is neither participant leaves `loser` empty.
    pub fn from_finish(
        tag: impl Into<String>,
        format_id: impl Into<String>,
        finish: &Finish,
        own_name: &str,
        opponent_name: &str,
    ) -> Self {
        let (winner, loser) = match finish {
            Finish::Tie => (None, None),
            Finish::Win(name) => {
                let loser = if name == own_name {
                    Some(opponent_name.to_string())
                } else if name == opponent_name {
                    Some(own_name.to_string())
                } else {
                    None
                };
                (Some(name.clone()), loser)
            }
        };
        Self {
            tag: tag.into(),
            format: format_id.into(),
            winner,
            loser,
        }
    }

    pub fn is_tie(&self) -> bool {
        self.winner.is_none()
    }
}

/// Plays one match on `session` in `format_id` and leaves its room.
///
/// Returns once the server has closed the room. Any transport failure
/// along the way ends the match with an error; there is no resume.
pub async fn run_match<C, A, R>(
    session: &mut Session<C, A>,
    ctx: &MatchContext<'_, R>,
    format_id: &str,
) -> Result<MatchResult, RoomError>
where
    C: Connection,
    A: AccountServer,
    R: RecordStore,
{
    let mut run = MatchRun {
        session,
        ctx,
        phase: MatchPhase::Discovering,
        state: MatchState::new("", format_id),
    };

    run.discover(format_id).await?;

    run.advance(MatchPhase::Starting)?;
    if format::has_roster_preview(format_id) {
        run.start_with_preview().await?;
    } else {
        run.start_without_preview().await?;
    }
    run.announce_start().await?;

    run.advance(MatchPhase::InProgress)?;
    let finish = run.turn_loop().await?;

    run.advance(MatchPhase::Finished)?;
    let result = run.resolve(&finish).await?;

    run.advance(MatchPhase::Leaving)?;
    let save_replay = run.ctx.config.save_replay;
    run.session.leave_battle(&result.tag, save_replay).await?;

    Ok(result)
}

struct MatchRun<'s, 'c, 'r, C: Connection, A: AccountServer, R: RecordStore> {
    session: &'s mut Session<C, A>,
    ctx: &'c MatchContext<'r, R>,
    phase: MatchPhase,
    state: MatchState,
}

impl<C: Connection, A: AccountServer, R: RecordStore> MatchRun<'_, '_, '_, C, A, R> {
    fn advance(&mut self, to: MatchPhase) -> Result<(), RoomError> {
        if !self.phase.can_transition_to(to) {
            return Err(RoomError::InvalidPhase {
                from: self.phase,
                to,
            });
        }
        debug!(tag = %self.state.tag, from = %self.phase, to = %to, "match phase");
        self.phase = to;
        Ok(())
    }

    async fn next_for_match(&mut self) -> Result<Message, RoomError> {
        loop {
            let message = self.session.next_message().await?;
            if message.is_for(&self.state.tag) {
                return Ok(message);
            }
        }
    }

    // -- discovery ----------------------------------------------------------

    /// Finds the room tag, the opponent, and our side.
    async fn discover(&mut self, format_id: &str) -> Result<(), RoomError> {
        let first = loop {
            let message = self.session.next_message().await?;
            if message.is_battle() {
                break message;
            }
        };
        let tag = first.room.clone().unwrap_or_default();
        self.state = MatchState::new(tag, format_id);

        // `|player|` lines only make sense once the request has told us
        // which side is ours, so they are held back until then.
        let mut players = Vec::new();
        let mut pending = Some(first);
        loop {
            let message = match pending.take() {
                Some(message) => message,
                None => self.next_for_match().await?,
            };

            let mut request = None;
            for event in message.events {
                match event {
                    Event::Title { title } => {
                        if let Some(name) = opponent_from_title(&title, self.session.username()) {
                            self.state.opponent.account_name = name;
                        }
                    }
                    Event::Player { .. } => players.push(event),
                    Event::Request {
                        payload: Some(payload),
                    } => match Request::from_payload(&payload) {
                        Ok(parsed) => request = Some(parsed),
                        Err(e) => warn!(tag = %self.state.tag, error = %e, "ignoring unreadable request"),
                    },
                    _ => {}
                }
            }

            if let Some(request) = request {
                self.state.apply_request(request);
                break;
            }
        }
        self.state.observe_players(&players);

        info!(
            tag = %self.state.tag,
            format = format_id,
            opponent = %self.state.opponent.account_name,
            side = %self.state.user.id,
            "match found"
        );
        Ok(())
    }

    // -- start --------------------------------------------------------------

    /// Start without roster preview: wait for the opponent's lead to
    /// appear, then play the first move.
    async fn start_without_preview(&mut self) -> Result<(), RoomError> {
        loop {
            let message = self.next_for_match().await?;
            let Some(after_start) = message.after_start() else {
                self.ctx.updater.update(&mut self.state, &message.events);
                continue;
            };

            self.state.observe_players(&message.events);
            let opponent_id = self.state.opponent.id.clone();
            let lead = after_start.iter().position(|event| {
                matches!(event, Event::Switch { position, .. } if position.starts_with(&opponent_id))
            });
            let from = lead.unwrap_or_else(|| {
                warn!(tag = %self.state.tag, "start frame did not show the opponent's lead");
                0
            });

            self.state.started = true;
            self.ctx.updater.update(&mut self.state, &after_start[from..]);
            break;
        }

        self.send_decision().await
    }

    /// Start with roster preview: collect the opponent's roster, then
    /// send our lead and order.
    async fn start_with_preview(&mut self) -> Result<(), RoomError> {
        let preview = loop {
            let message = self.next_for_match().await?;
            self.state.observe_players(&message.events);
            if let Some(after) = message.after_clear_poke() {
                break after.to_vec();
            }
            self.ctx.updater.update(&mut self.state, &message.events);
        };

        for event in &preview {
            if let Event::Poke { side, details } = event {
                if *side == self.state.opponent.id {
                    self.state.add_opponent_preview(details);
                }
            }
        }
        self.state.team_preview = true;
        debug!(
            tag = %self.state.tag,
            opponent_roster = self.state.opponent.reserve.len(),
            "roster preview"
        );

        let choices = self
            .ctx
            .pool
            .decide(self.ctx.engine.clone(), self.state.preview_placeholder())
            .await?;
        let order = team_order(choices.first().map(String::as_str), self.state.roster_size());
        let command = Command::team_order(&self.state.tag, &order, self.state.rqid);
        self.session.send(&command).await?;
        self.state.mark_answered();
        self.state.team_preview = false;
        Ok(())
    }

    /// Streak announcement, greetings, timer.
    async fn announce_start(&mut self) -> Result<(), RoomError> {
        let tag = self.state.tag.clone();
        let config = self.ctx.config;
        let opponent = self.state.opponent.account_name.clone();

        if config.show_win_streak && !opponent.is_empty() {
            let user = self.ctx.records.get_or_create_user(&opponent).await?;
            let record = self
                .ctx
                .records
                .get_or_create_format_record(&user, &self.state.format)
                .await?;
            let line = format!("Win streak for {opponent}: {}", record.win_streak);
            self.session.send(&Command::room(&tag, line)).await?;
        }

        for line in &config.pre_battle_messages {
            self.session.send(&Command::room(&tag, line.as_str())).await?;
        }
        if config.start_timer {
            self.session.send(&Command::timer_on(&tag)).await?;
        }
        Ok(())
    }

    // -- turns --------------------------------------------------------------

    async fn turn_loop(&mut self) -> Result<Finish, RoomError> {
        loop {
            let message = self.session.next_message().await?;
            if let Some(finish) = message.finish(&self.state.tag) {
                return Ok(finish);
            }
            if !message.is_for(&self.state.tag) {
                continue;
            }

            let required = self.ctx.updater.update(&mut self.state, &message.events);
            if required && !self.state.wait {
                self.send_decision().await?;
            }
        }
    }

    /// Asks the engine about a snapshot and sends its first candidate.
    async fn send_decision(&mut self) -> Result<(), RoomError> {
        let choices = self
            .ctx
            .pool
            .decide(self.ctx.engine.clone(), self.state.snapshot())
            .await?;
        let choice = match choices.into_iter().next() {
            Some(choice) => choice,
            None => {
                warn!(tag = %self.state.tag, "engine offered nothing, letting the server choose");
                FALLBACK_CHOICE.to_string()
            }
        };

        debug!(tag = %self.state.tag, turn = self.state.turn, %choice, "decision");
        let command = Command::choose(&self.state.tag, &choice, self.state.rqid);
        self.session.send(&command).await?;
        self.state.mark_answered();
        Ok(())
    }

    // -- resolution ---------------------------------------------------------

    async fn resolve(&mut self, finish: &Finish) -> Result<MatchResult, RoomError> {
        let tag = self.state.tag.clone();
        let opponent = self.state.opponent.account_name.clone();
        let result = MatchResult::from_finish(
            tag.as_str(),
            self.state.format.as_str(),
            finish,
            self.session.username(),
            &opponent,
        );
        info!(
            tag = %tag,
            winner = result.winner.as_deref().unwrap_or("-"),
            loser = result.loser.as_deref().unwrap_or("-"),
            "match finished"
        );

        if let (Some(winner), Some(loser)) = (&result.winner, &result.loser) {
            let streak = self.update_record(winner, true).await?;
            if *winner == opponent {
                self.announce_streak(winner, streak).await?;
            }
            let streak = self.update_record(loser, false).await?;
            if *loser == opponent {
                self.announce_streak(loser, streak).await?;
            }
        }

        for line in &self.ctx.config.post_battle_messages {
            self.session.send(&Command::room(&tag, line.as_str())).await?;
        }
        Ok(result)
    }

    async fn update_record(&self, name: &str, won: bool) -> Result<u32, RoomError> {
        let records = self.ctx.records;
        let user = records.get_or_create_user(name).await?;
        let mut record = records
            .get_or_create_format_record(&user, &self.state.format)
            .await?;
        let streak = if won {
            records.record_win(&mut record).await?
        } else {
            records.record_loss(&mut record).await?
        };
        debug!(name, won, streak, "record updated");
        Ok(streak)
    }

    async fn announce_streak(&mut self, name: &str, streak: u32) -> Result<(), RoomError> {
        if !self.ctx.config.show_win_streak {
            return Ok(());
        }
        let line = format!("Current win streak for {name}: {streak}");
        self.session.send(&Command::room(&self.state.tag, line)).await?;
        Ok(())
    }
}

/// Maps the engine's preview choice to a full roster order: the chosen
/// slot leads, the rest follow in roster order.
///
/// The slot is the last number in the choice (`/choose switch 3` → 3).
/// Anything unreadable or out of range leads with slot 1.
pub fn team_order(choice: Option<&str>, roster_size: usize) -> Vec<usize> {
    let size = roster_size.max(1);
    let lead = choice
        .and_then(|c| c.split_whitespace().last())
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| (1..=size).contains(n))
        .unwrap_or(1);

    std::iter::once(lead)
        .chain((1..=size).filter(|slot| *slot != lead))
        .collect()
}
