//! Match state: everything the bot knows about one match.
//!
//! The match loop owns the one authoritative [`MatchState`]. Decision
//! engines only ever receive a [`MatchState::snapshot`], an independent
//! clone they may mutate freely while exploring.

use arenabot_protocol::{format, Event, Request};
use arenabot_records::user_id;
use serde::Serialize;

/// One combatant as far as the bot can see it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Combatant {
    pub species: String,
    /// Raw details string (`"Pikachu, L50, M"`), empty when unknown.
    pub details: String,
    pub fainted: bool,
}

impl Combatant {
    /// A combatant known only by its details string.
    pub fn from_details(details: &str) -> Self {
        Self {
            species: details.split(',').next().unwrap_or("").trim().to_string(),
            details: details.to_string(),
            fainted: false,
        }
    }

    /// A neutral stand-in used while ordering the roster during preview.
    pub fn placeholder() -> Self {
        Self {
            species: "placeholder".into(),
            details: String::new(),
            fainted: false,
        }
    }
}

/// One side of the match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Side {
    /// Protocol side id (`p1`, `p2`).
    pub id: String,
    /// Account name, used for record keys and messages.
    pub account_name: String,
    pub active: Option<Combatant>,
    pub reserve: Vec<Combatant>,
}

impl Side {
    /// Every combatant seen on this side, active first.
    pub fn roster(&self) -> impl Iterator<Item = &Combatant> {
        self.active.iter().chain(self.reserve.iter())
    }

    /// Records a combatant entering the field, moving the previous one
    /// back to the reserve.
    fn switch_in(&mut self, incoming: Combatant) {
        if let Some(pos) = self
            .reserve
            .iter()
            .position(|c| c.species == incoming.species)
        {
            self.reserve.remove(pos);
        }
        if let Some(previous) = self.active.replace(incoming) {
            self.reserve.push(previous);
        }
    }
}

/// The authoritative state of one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchState {
    /// Room tag, e.g. `battle-gen9ou-123`.
    pub tag: String,
    pub format: String,
    /// `gen1` ... `gen9`, derived from the format.
    pub generation: String,
    pub started: bool,
    pub turn: u32,
    /// Last move request. Opaque to the loop; read by engines.
    pub request: Option<Request>,
    pub rqid: Option<u64>,
    /// The rqid of the last request a choice was sent for.
    pub answered_rqid: Option<u64>,
    /// Set while the server says no action is required of us.
    pub wait: bool,
    pub team_preview: bool,
    pub user: Side,
    pub opponent: Side,
}

impl MatchState {
    pub fn new(tag: impl Into<String>, format_id: impl Into<String>) -> Self {
        let format_id = format_id.into();
        Self {
            tag: tag.into(),
            generation: format::generation(&format_id).to_string(),
            format: format_id,
            ..Self::default()
        }
    }

    /// An independent copy for a decision engine.
    ///
    /// The engine owns the copy outright; nothing it does to it reaches
    /// the authoritative state.
    pub fn snapshot(&self) -> MatchState {
        self.clone()
    }

    /// Notes that the current request has been answered.
    pub fn mark_answered(&mut self) {
        self.answered_rqid = self.rqid;
    }

    /// `true` once a choice went out for the current request. Requests
    /// without an rqid are never considered answered.
    pub fn is_answered(&self) -> bool {
        self.rqid.is_some() && self.rqid == self.answered_rqid
    }

    /// Stores a move request and refreshes our side from it.
    pub fn apply_request(&mut self, request: Request) {
        self.wait = request.wait;
        self.team_preview = request.team_preview;
        if request.rqid.is_some() {
            self.rqid = request.rqid;
        }

        if !request.side.id.is_empty() {
            self.user.id = request.side.id.clone();
            self.opponent.id = request.opponent_side_id().to_string();
        }
        if !request.side.name.is_empty() {
            self.user.account_name = request.side.name.clone();
        }
        if !request.side.pokemon.is_empty() {
            self.user.active = None;
            self.user.reserve.clear();
            for member in &request.side.pokemon {
                let mut combatant = Combatant::from_details(&member.details);
                combatant.fainted = member.is_fainted();
                if member.active && self.user.active.is_none() {
                    self.user.active = Some(combatant);
                } else {
                    self.user.reserve.push(combatant);
                }
            }
        }

        self.request = Some(request);
    }

    /// Learns account names from `|player|` lines.
    pub fn observe_players(&mut self, events: &[Event]) {
        for event in events {
            if let Event::Player { side, name } = event {
                if name.is_empty() {
                    continue;
                }
                if *side == self.opponent.id {
                    self.opponent.account_name = name.clone();
                } else if *side == self.user.id {
                    self.user.account_name = name.clone();
                }
            }
        }
    }

    /// Records a switch-in if it happened on the opponent's side.
    ///
    /// Returns `true` if it did.
    pub fn observe_opponent_switch(&mut self, position: &str, details: &str) -> bool {
        if self.opponent.id.is_empty() || !position.starts_with(&self.opponent.id) {
            return false;
        }
        self.opponent.switch_in(Combatant::from_details(details));
        true
    }

    /// Adds a species seen in the opponent's roster preview.
    pub fn add_opponent_preview(&mut self, details: &str) {
        self.opponent.reserve.push(Combatant::from_details(details));
    }

    /// A copy in which both active combatants are neutral stand-ins.
    ///
    /// Used to ask the engine for a lead before anything is on the field.
    pub fn preview_placeholder(&self) -> MatchState {
        let mut copy = self.snapshot();
        for side in [&mut copy.user, &mut copy.opponent] {
            if let Some(active) = side.active.take() {
                side.reserve.insert(0, active);
            }
            side.active = Some(Combatant::placeholder());
        }
        copy
    }

    /// Number of combatants on our roster, as the last request listed them.
    pub fn roster_size(&self) -> usize {
        self.request
            .as_ref()
            .map(|r| r.side.pokemon.len())
            .unwrap_or(0)
    }
}

/// Picks the opponent's name out of a `A vs. B` title.
pub fn opponent_from_title(title: &str, own_name: &str) -> Option<String> {
    let own = user_id(own_name);
    title
        .split(" vs. ")
        .map(str::trim)
        .find(|name| !name.is_empty() && user_id(name) != own)
        .map(str::to_string)
}
