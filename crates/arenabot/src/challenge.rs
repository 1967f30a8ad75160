//! Challenge negotiation.
//!
//! In accept mode the bot sits idle until someone challenges it, then
//! decides whether to play:
//!
//! ```text
//! AwaitingChallenge ──challenge──→ Validating ──→ Accepted   (returns the format)
//!        ↑                             │
//!        └──────────── Rejected ←──────┘
//! ```
//!
//! A challenge is turned down when the challenger is banned, when the
//! format is not on the allow-list, or when no roster can be put together
//! for a format that needs one. Every rejection tells the challenger why.

use std::time::Instant;

use arenabot_protocol::{Event, Message, format};
use arenabot_records::{Preferences, RecordStore, user_id};
use arenabot_room::DecisionEngine;
use arenabot_session::{AccountServer, Session};
use arenabot_transport::Connection;
use tracing::{debug, info, warn};

use crate::teams::{RosterLibrary, RosterSource};
use crate::ArenaError;

pub const BANNED_REASON: &str = "You are currently banned from challenging this bot.";
pub const FORMAT_REASON: &str = "Challenges in this format cannot be accepted!";
pub const TEAM_LINK_REASON: &str =
    "Team could not be generated! Please ensure the team link is a valid PokePaste link!";
pub const NO_TEAM_REASON: &str = "No teams available for this format!";

/// Where the negotiator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    AwaitingChallenge,
    Validating,
    Rejected,
    Accepted,
}

impl NegotiationState {
    pub fn can_transition_to(self, target: Self) -> bool {
        use NegotiationState::*;
        matches!(
            (self, target),
            (AwaitingChallenge, Validating)
                | (Validating, Accepted)
                | (Validating, Rejected)
                | (Rejected, AwaitingChallenge)
        )
    }
}

/// A challenge addressed to the bot.
#[derive(Debug, Clone)]
pub struct ChallengeRequest {
    pub challenger: String,
    pub format: String,
    pub received_at: Instant,
}

impl ChallengeRequest {
    /// Finds a challenge to `own_name` in `message`.
    ///
    /// Names are compared by account id, so rank marks and case do not
    /// matter.
    pub fn addressed_to(message: &Message, own_name: &str) -> Option<Self> {
        let own_id = user_id(own_name);
        message.events.iter().find_map(|event| match event {
            Event::Challenge {
                challenger,
                recipient,
                format,
            } if user_id(recipient) == own_id => Some(Self {
                challenger: challenger.clone(),
                format: format.clone(),
                received_at: Instant::now(),
            }),
            _ => None,
        })
    }
}

/// The decision on one challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Play, submitting `roster` first (`None` for server-built rosters).
    Accept { roster: Option<String> },
    /// Decline with `reason`; `followup` is a second message, if any.
    Reject {
        reason: &'static str,
        followup: Option<String>,
    },
}

impl Verdict {
    fn reject(reason: &'static str) -> Self {
        Self::Reject {
            reason,
            followup: None,
        }
    }
}

/// Waits for an acceptable challenge.
pub struct Negotiator<'a, R: RecordStore> {
    pub records: &'a R,
    pub library: &'a RosterLibrary,
    pub allowed_formats: &'a [String],
    pub engine: &'a dyn DecisionEngine,
    /// Joined before listening when set.
    pub room: Option<&'a str>,
}

impl<R: RecordStore> Negotiator<'_, R> {
    /// Blocks until a challenge is accepted and returns its format.
    ///
    /// Rejected challenges do not end the wait. The only way out besides
    /// an acceptance is a fatal session or store error.
    pub async fn accept_challenge<C, A>(
        &self,
        session: &mut Session<C, A>,
    ) -> Result<String, ArenaError>
    where
        C: Connection,
        A: AccountServer,
    {
        if let Some(room) = self.room {
            session.join_room(room).await?;
        }

        let mut state = NegotiationState::AwaitingChallenge;
        info!(allowed = ?self.allowed_formats, "waiting for a challenge");
        loop {
            let message = session.next_message().await?;
            let Some(request) = ChallengeRequest::addressed_to(&message, session.username())
            else {
                continue;
            };

            advance(&mut state, NegotiationState::Validating)?;
            info!(
                challenger = %request.challenger,
                format = %request.format,
                "challenge received"
            );

            match self.judge(&request).await? {
                Verdict::Accept { roster } => {
                    session.update_team(&request.format, roster.as_deref()).await?;
                    self.engine.apply_format_rules(&request.format);
                    session.accept_challenge(&request.challenger).await?;
                    advance(&mut state, NegotiationState::Accepted)?;
                    info!(
                        challenger = %request.challenger,
                        format = %request.format,
                        elapsed_ms = request.received_at.elapsed().as_millis() as u64,
                        "challenge accepted"
                    );
                    return Ok(request.format);
                }
                Verdict::Reject { reason, followup } => {
                    info!(challenger = %request.challenger, reason, "challenge rejected");
                    session
                        .reject_challenge(&request.challenger, Some(reason))
                        .await?;
                    if let Some(followup) = followup {
                        session
                            .private_message(&request.challenger, &followup)
                            .await?;
                    }
                    advance(&mut state, NegotiationState::Rejected)?;
                    advance(&mut state, NegotiationState::AwaitingChallenge)?;
                }
            }
        }
    }

    /// Decides on one challenge without touching the connection.
    pub async fn judge(&self, request: &ChallengeRequest) -> Result<Verdict, ArenaError> {
        let user = self.records.get_or_create_user(&request.challenger).await?;
        if user.banned {
            return Ok(Verdict::reject(BANNED_REASON));
        }

        if !self.allowed_formats.contains(&request.format) {
            return Ok(Verdict::Reject {
                reason: FORMAT_REASON,
                followup: Some(format!(
                    "I am only accepting challenges in the following format(s): '{}'",
                    self.allowed_formats.join(", ")
                )),
            });
        }

        if !format::needs_roster(&request.format) {
            return Ok(Verdict::Accept { roster: None });
        }

        let record = self
            .records
            .get_or_create_format_record(&user, &request.format)
            .await?;
        Ok(self.roster_for(&record.preferences, &request.format).await)
    }

    async fn roster_for(&self, preferences: &Preferences, format_id: &str) -> Verdict {
        if let (true, Some(link)) = (preferences.use_team, preferences.team.as_deref()) {
            return match self.library.provided_roster(link).await {
                Ok(Some(roster)) => Verdict::Accept {
                    roster: Some(roster),
                },
                Ok(None) => Verdict::reject(TEAM_LINK_REASON),
                Err(e) => {
                    warn!(link, error = %e, "provided roster unavailable");
                    Verdict::reject(TEAM_LINK_REASON)
                }
            };
        }

        let order = if preferences.use_factory {
            [RosterSource::Factory, RosterSource::Static]
        } else {
            [RosterSource::Static, RosterSource::Factory]
        };
        for source in order {
            match self.library.resolve(source, format_id).await {
                Ok(Some(roster)) => {
                    debug!(?source, format = format_id, "roster resolved");
                    return Verdict::Accept {
                        roster: Some(roster),
                    };
                }
                Ok(None) => {}
                Err(e) => warn!(?source, format = format_id, error = %e, "roster lookup failed"),
            }
        }
        Verdict::reject(NO_TEAM_REASON)
    }
}

fn advance(state: &mut NegotiationState, to: NegotiationState) -> Result<(), ArenaError> {
    if !state.can_transition_to(to) {
        return Err(ArenaError::InvalidNegotiation { from: *state, to });
    }
    debug!(from = ?state, ?to, "negotiation");
    *state = to;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arenabot_protocol::parse_message;
    use arenabot_records::MemoryRecordStore;
    use arenabot_room::FirstLegal;
    use arenabot_roster::DraftRules;

    fn negotiator<'a>(
        records: &'a MemoryRecordStore,
        library: &'a RosterLibrary,
        allowed: &'a [String],
    ) -> Negotiator<'a, MemoryRecordStore> {
        Negotiator {
            records,
            library,
            allowed_formats: allowed,
            engine: &FirstLegal,
            room: None,
        }
    }

    fn request(challenger: &str, format: &str) -> ChallengeRequest {
        ChallengeRequest {
            challenger: challenger.into(),
            format: format.into(),
            received_at: Instant::now(),
        }
    }

    #[test]
    fn test_negotiation_state_can_transition_to() {
        use NegotiationState::*;

        assert!(AwaitingChallenge.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(AwaitingChallenge));
        assert!(!AwaitingChallenge.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(AwaitingChallenge));
    }

    #[test]
    fn test_advance_rejects_illegal_jump() {
        let mut state = NegotiationState::AwaitingChallenge;

        let err = advance(&mut state, NegotiationState::Accepted).unwrap_err();

        assert!(matches!(err, ArenaError::InvalidNegotiation { .. }));
        assert_eq!(state, NegotiationState::AwaitingChallenge);
        advance(&mut state, NegotiationState::Validating).unwrap();
        assert_eq!(state, NegotiationState::Validating);
    }

    #[test]
    fn test_addressed_to_matches_by_account_id() {
        let message = parse_message("|pm| Rival|+ArenaBot|/challenge gen9ou|gen9ou|||");

        let found = ChallengeRequest::addressed_to(&message, "arenabot").unwrap();

        assert_eq!(found.challenger, "Rival");
        assert_eq!(found.format, "gen9ou");
    }

    #[test]
    fn test_addressed_to_ignores_other_recipients() {
        let message = parse_message("|pm| Rival| Someone|/challenge gen9ou|gen9ou|||");

        assert!(ChallengeRequest::addressed_to(&message, "arenabot").is_none());
    }

    #[tokio::test]
    async fn test_judge_banned_challenger_rejected() {
        let records = MemoryRecordStore::new();
        let mut user = records.get_or_create_user("Griefer").await.unwrap();
        user.banned = true;
        records.save_user(&user).await.unwrap();
        let library = RosterLibrary::new("teams", "factory", DraftRules::default());
        let allowed = vec!["gen9randombattle".to_string()];

        let verdict = negotiator(&records, &library, &allowed)
            .judge(&request("Griefer", "gen9randombattle"))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::reject(BANNED_REASON));
    }

    #[tokio::test]
    async fn test_judge_format_not_allowed_lists_allowed() {
        let records = MemoryRecordStore::new();
        let library = RosterLibrary::new("teams", "factory", DraftRules::default());
        let allowed = vec!["gen9randombattle".to_string()];

        let verdict = negotiator(&records, &library, &allowed)
            .judge(&request("Rival", "gen9ou"))
            .await
            .unwrap();

        assert_eq!(
            verdict,
            Verdict::Reject {
                reason: FORMAT_REASON,
                followup: Some(
                    "I am only accepting challenges in the following format(s): 'gen9randombattle'"
                        .into()
                ),
            }
        );
    }

    #[tokio::test]
    async fn test_judge_random_format_needs_no_roster() {
        let records = MemoryRecordStore::new();
        let library = RosterLibrary::new("/nonexistent", "/nonexistent", DraftRules::default());
        let allowed = vec!["gen9randombattle".to_string()];

        let verdict = negotiator(&records, &library, &allowed)
            .judge(&request("Rival", "gen9randombattle"))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::Accept { roster: None });
    }

    #[tokio::test]
    async fn test_judge_no_roster_anywhere_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let records = MemoryRecordStore::new();
        let library = RosterLibrary::new(
            dir.path().join("teams"),
            dir.path().join("factory"),
            DraftRules::default(),
        );
        let allowed = vec!["gen9ou".to_string()];

        let verdict = negotiator(&records, &library, &allowed)
            .judge(&request("Rival", "gen9ou"))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::reject(NO_TEAM_REASON));
    }

    #[tokio::test]
    async fn test_judge_factory_preference_falls_back_to_static() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("teams")).unwrap();
        std::fs::write(dir.path().join("teams/gen9ou"), "Mew @ Leftovers\n- Psychic\n").unwrap();
        let records = MemoryRecordStore::new();
        let user = records.get_or_create_user("Rival").await.unwrap();
        let mut record = records
            .get_or_create_format_record(&user, "gen9ou")
            .await
            .unwrap();
        record.preferences.use_factory = true;
        records.save_format_record(&record).await.unwrap();
        let library = RosterLibrary::new(
            dir.path().join("teams"),
            dir.path().join("factory"),
            DraftRules::default(),
        );
        let allowed = vec!["gen9ou".to_string()];

        let verdict = negotiator(&records, &library, &allowed)
            .judge(&request("Rival", "gen9ou"))
            .await
            .unwrap();

        let Verdict::Accept { roster: Some(roster) } = verdict else {
            panic!("expected an accepted roster, got {verdict:?}");
        };
        assert!(roster.starts_with("mew|mew|leftovers|"));
    }

    #[tokio::test]
    async fn test_judge_bad_team_link_rejected() {
        let records = MemoryRecordStore::new();
        let user = records.get_or_create_user("Rival").await.unwrap();
        let mut record = records
            .get_or_create_format_record(&user, "gen9ou")
            .await
            .unwrap();
        record.preferences.use_team = true;
        record.preferences.team = Some("not a link".into());
        records.save_format_record(&record).await.unwrap();
        let library = RosterLibrary::new("teams", "factory", DraftRules::default());
        let allowed = vec!["gen9ou".to_string()];

        let verdict = negotiator(&records, &library, &allowed)
            .judge(&request("Rival", "gen9ou"))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::reject(TEAM_LINK_REASON));
    }
}
