//! Core protocol types: the events and payloads that travel on the wire.
//!
//! The arena server speaks a line-oriented text protocol. Every line is a
//! list of `|`-separated fields and its first non-empty field says what
//! kind of line it is. A single WebSocket frame may carry many lines; when
//! the lines belong to a room the first line of the frame is `>room-tag`.
//!
//! ```text
//! >battle-gen9randombattle-1234     ← room tag (optional)
//! |init|battle                      ← one Event per line
//! |title|arenabot vs. Rival
//! |player|p1|arenabot|1|
//! ```

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Event — one classified protocol line
// ---------------------------------------------------------------------------

/// A single classified protocol line.
///
/// Only the shapes the bot acts on get their own variant. Anything else
/// is kept as [`Event::Unrecognized`] with its raw fields so a state
/// updater can still look at it. Classification never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `|challstr|<client id>|<challenge>` — login challenge.
    Challstr { client_id: String, challenge: String },

    /// A private message whose body is a `/challenge` addressed to someone.
    Challenge {
        challenger: String,
        recipient: String,
        format: String,
    },

    /// Any other private message.
    PrivateMessage { from: String, to: String, body: String },

    /// `|updateuser|<name>|<named>|...` — identity confirmation.
    UpdateUser { name: String, named: bool },

    /// `|init|<kind>` — a room was opened.
    Init { kind: String },

    /// `|title|<A> vs. <B>`.
    Title { title: String },

    /// `|player|<side>|<name>|...` — a side was assigned to an account.
    Player { side: String, name: String },

    /// `|request|<json>` — a move request. The payload is `None` when the
    /// server sends an empty request.
    Request { payload: Option<String> },

    /// `|clearpoke` — roster preview begins.
    ClearPoke,

    /// `|poke|<side>|<details>|...` — one roster preview entry.
    Poke { side: String, details: String },

    /// `|teampreview` — roster preview entries are complete.
    TeamPreview,

    /// `|start` — the match proper begins.
    Start,

    /// `|switch|<position>|<details>|<hp>` (also `drag` and `replace`).
    Switch { position: String, details: String },

    /// `|turn|<n>`.
    Turn(u32),

    /// `|upkeep` — end-of-turn residuals are done.
    Upkeep,

    /// `|win|<name>`.
    Win { winner: String },

    /// `|tie`.
    Tie,

    /// `|c|<user>|<text>` (also `c:` with a timestamp, and `chat`).
    Chat { user: String, text: String },

    /// `|deinit` — the room was closed.
    Deinit,

    /// `|queryresponse|<query>|<payload>`.
    QueryResponse { query: String, payload: String },

    /// `|popup|<text>` — a server notice, usually an error.
    Popup { text: String },

    /// Any line the bot does not model.
    Unrecognized { fields: Vec<String> },
}

impl Event {
    /// Returns `true` for the two match-ending narrations.
    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Win { .. } | Self::Tie)
    }

    /// Returns `true` for chat lines.
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Chat { .. })
    }
}

// ---------------------------------------------------------------------------
// Message — one received frame
// ---------------------------------------------------------------------------

/// How a match ended, as narrated by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finish {
    /// Someone won. The name is exactly what the server narrated.
    Win(String),
    /// Nobody won.
    Tie,
}

/// One received frame: an optional room tag plus its classified lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Room the lines belong to (`None` for global lines).
    pub room: Option<String>,
    /// Classified lines in order of arrival. Blank lines are dropped.
    pub events: Vec<Event>,
    /// The frame as it was received.
    pub raw: String,
}

impl Message {
    /// Returns `true` if this frame was addressed to room `tag`.
    pub fn is_for(&self, tag: &str) -> bool {
        self.room.as_deref() == Some(tag)
    }

    /// Returns `true` if this frame belongs to a battle room.
    pub fn is_battle(&self) -> bool {
        self.room.as_deref().is_some_and(|r| r.contains("battle"))
    }

    /// Returns how the match in room `tag` ended, if this frame says so.
    ///
    /// A frame counts as the end of the match only when it is addressed
    /// to `tag`, carries a win or tie narration, and carries no chat line.
    pub fn finish(&self, tag: &str) -> Option<Finish> {
        if !self.is_for(tag) || self.events.iter().any(Event::is_chat) {
            return None;
        }
        self.events.iter().find_map(|event| match event {
            Event::Win { winner } => Some(Finish::Win(winner.clone())),
            Event::Tie => Some(Finish::Tie),
            _ => None,
        })
    }

    /// Returns `true` if this frame closes room `tag`.
    pub fn is_deinit_for(&self, tag: &str) -> bool {
        self.is_for(tag) && self.events.iter().any(|e| matches!(e, Event::Deinit))
    }

    /// Returns the events that follow the first `|start` line.
    pub fn after_start(&self) -> Option<&[Event]> {
        let idx = self.events.iter().position(|e| matches!(e, Event::Start))?;
        Some(&self.events[idx + 1..])
    }

    /// Returns the events that follow the first `|clearpoke` line.
    pub fn after_clear_poke(&self) -> Option<&[Event]> {
        let idx = self
            .events
            .iter()
            .position(|e| matches!(e, Event::ClearPoke))?;
        Some(&self.events[idx + 1..])
    }
}

// ---------------------------------------------------------------------------
// Request — the move-request payload
// ---------------------------------------------------------------------------

/// A decoded `|request|` payload.
///
/// Only the fields the bot itself reads are typed. Everything else is kept
/// in `extra`, so the decision engine sees the full payload.
///
/// `#[serde(default)]` on the struct means any missing field falls back to
/// its `Default` value: the server omits `forceSwitch` or `active` freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Request {
    pub active: Vec<ActiveSlot>,
    pub side: RequestSide,
    pub rqid: Option<u64>,
    pub force_switch: Vec<bool>,
    pub wait: bool,
    pub team_preview: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Request {
    /// Decodes a request payload. Some servers wrap it in single quotes.
    pub fn from_payload(payload: &str) -> Result<Self, ProtocolError> {
        let trimmed = payload.trim().trim_matches('\'');
        if trimmed.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "empty request payload".into(),
            ));
        }
        Ok(serde_json::from_str(trimmed)?)
    }

    /// Returns `true` if any active slot must be replaced before anything else.
    pub fn requires_switch(&self) -> bool {
        self.force_switch.iter().any(|f| *f)
    }

    /// Side id of the opponent (`p1` ↔ `p2`, `p3` ↔ `p4`).
    pub fn opponent_side_id(&self) -> &'static str {
        match self.side.id.as_str() {
            "p2" => "p1",
            "p3" => "p4",
            "p4" => "p3",
            _ => "p2",
        }
    }
}

/// One active slot in a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveSlot {
    pub moves: Vec<MoveSlot>,
    pub trapped: bool,
}

/// One move option in an active slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveSlot {
    #[serde(rename = "move")]
    pub name: String,
    pub id: String,
    pub pp: Option<u32>,
    /// The server sends either `true`/`false` or the name of the effect
    /// that disabled the move.
    pub disabled: serde_json::Value,
}

impl MoveSlot {
    /// Returns `true` if this move cannot be chosen.
    pub fn is_disabled(&self) -> bool {
        let flagged = match &self.disabled {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => !s.is_empty(),
            _ => false,
        };
        flagged || self.pp == Some(0)
    }
}

/// Our side as described by a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestSide {
    pub name: String,
    pub id: String,
    pub pokemon: Vec<SideMember>,
}

/// One roster member as described by a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideMember {
    pub ident: String,
    pub details: String,
    pub condition: String,
    pub active: bool,
}

impl SideMember {
    /// Returns `true` if this member has fainted.
    pub fn is_fainted(&self) -> bool {
        self.condition.ends_with(" fnt") || self.condition == "0 fnt"
    }

    /// Species name from the details string (`"Pikachu, L50, M"` → `"Pikachu"`).
    pub fn species(&self) -> &str {
        self.details.split(',').next().unwrap_or("").trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{"active":[{"moves":[{"move":"Thunderbolt","id":"thunderbolt","pp":24,"maxpp":24,"target":"normal","disabled":false},{"move":"Protect","id":"protect","pp":0,"disabled":false}]}],"side":{"name":"arenabot","id":"p2","pokemon":[{"ident":"p2: Pikachu","details":"Pikachu, L50, M","condition":"100/100","active":true},{"ident":"p2: Snorlax","details":"Snorlax, L50","condition":"0 fnt","active":false}]},"rqid":7}"#;

    #[test]
    fn test_request_from_payload_decodes_typed_fields() {
        let req = Request::from_payload(REQUEST).unwrap();

        assert_eq!(req.rqid, Some(7));
        assert_eq!(req.side.id, "p2");
        assert_eq!(req.opponent_side_id(), "p1");
        assert_eq!(req.active[0].moves[0].id, "thunderbolt");
        assert!(!req.wait);
        assert!(!req.requires_switch());
    }

    #[test]
    fn test_request_from_payload_keeps_unknown_fields() {
        let req = Request::from_payload(REQUEST).unwrap();
        // `maxpp` lives on moves, but top-level extras are preserved too.
        let req2 =
            Request::from_payload(r#"{"side":{"id":"p1"},"noCancel":true}"#)
                .unwrap();

        assert!(req.extra.is_empty());
        assert_eq!(req2.extra.get("noCancel"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_request_from_payload_strips_quotes_and_rejects_empty() {
        assert!(Request::from_payload(r#"'{"wait":true}'"#).unwrap().wait);
        assert!(matches!(
            Request::from_payload("  "),
            Err(ProtocolError::InvalidMessage(_))
        ));
        assert!(matches!(
            Request::from_payload("{not json"),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_move_slot_disabled_by_flag_string_or_pp() {
        let req = Request::from_payload(REQUEST).unwrap();
        let moves = &req.active[0].moves;

        assert!(!moves[0].is_disabled());
        assert!(moves[1].is_disabled(), "0 pp means unusable");

        let by_effect = MoveSlot {
            disabled: serde_json::Value::String("Taunt".into()),
            ..MoveSlot::default()
        };
        assert!(by_effect.is_disabled());

        let flagged = MoveSlot {
            pp: Some(10),
            disabled: serde_json::Value::Bool(true),
            ..MoveSlot::default()
        };
        assert!(flagged.is_disabled());
        assert!(!MoveSlot::default().is_disabled());
    }

    #[test]
    fn test_side_member_species_and_fainted() {
        let req = Request::from_payload(REQUEST).unwrap();
        let mons = &req.side.pokemon;

        assert_eq!(mons[0].species(), "Pikachu");
        assert!(!mons[0].is_fainted());
        assert!(mons[1].is_fainted());
    }
}
