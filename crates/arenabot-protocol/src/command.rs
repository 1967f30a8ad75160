//! Outgoing commands.
//!
//! Every command the bot sends is built here, so the exact wire text of
//! each one lives in a single place.

use crate::codec::encode;

/// One outgoing line: a room id (empty for global commands) plus parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    room: String,
    parts: Vec<String>,
}

impl Command {
    /// A command with an explicit room and parts.
    pub fn new(room: impl Into<String>, parts: Vec<String>) -> Self {
        Self {
            room: room.into(),
            parts,
        }
    }

    /// A single-part command sent outside any room.
    pub fn global(part: impl Into<String>) -> Self {
        Self::new("", vec![part.into()])
    }

    /// A single-part command (or chat line) sent to a room.
    pub fn room(room: &str, part: impl Into<String>) -> Self {
        Self::new(room, vec![part.into()])
    }

    /// `/trn <name>,0,<assertion>` — claims an identity after login.
    pub fn claim_identity(username: &str, assertion: &str) -> Self {
        Self::global(format!("/trn {username},0,{assertion}"))
    }

    /// `/utm <packed>` — sets the roster for the next challenge or search.
    /// `None` clears it, which randomized formats require.
    pub fn update_team(packed: Option<&str>) -> Self {
        Self::global(format!("/utm {}", packed.unwrap_or("null")))
    }

    /// `/challenge <user>,<format>`.
    pub fn challenge(user: &str, format: &str) -> Self {
        Self::global(format!("/challenge {user},{format}"))
    }

    /// `/search <format>` — enters the ladder queue.
    pub fn search(format: &str) -> Self {
        Self::global(format!("/search {format}"))
    }

    /// `/accept <user>`.
    pub fn accept(user: &str) -> Self {
        Self::global(format!("/accept {user}"))
    }

    /// `/reject <user>`.
    pub fn reject(user: &str) -> Self {
        Self::global(format!("/reject {user}"))
    }

    /// `/msg <user>,<text>` — private message.
    pub fn private_message(user: &str, text: &str) -> Self {
        Self::global(format!("/msg {user},{text}"))
    }

    /// `/join <room>`.
    pub fn join(room: &str) -> Self {
        Self::global(format!("/join {room}"))
    }

    /// `/leave <room>`.
    pub fn leave(room: &str) -> Self {
        Self::global(format!("/leave {room}"))
    }

    /// `/avatar <avatar>`.
    pub fn avatar(avatar: &str) -> Self {
        Self::global(format!("/avatar {avatar}"))
    }

    /// `/savereplay`, sent to the match room.
    pub fn save_replay(tag: &str) -> Self {
        Self::room(tag, "/savereplay")
    }

    /// `/timer on`, sent to the match room.
    pub fn timer_on(tag: &str) -> Self {
        Self::room(tag, "/timer on")
    }

    /// A decision for the current request, e.g. `/choose move 1`.
    ///
    /// The request id is appended when known so the server can discard
    /// decisions for requests it already superseded.
    pub fn choose(tag: &str, choice: &str, rqid: Option<u64>) -> Self {
        let mut parts = vec![choice.to_string()];
        if let Some(rqid) = rqid {
            parts.push(rqid.to_string());
        }
        Self::new(tag, parts)
    }

    /// `/team <order>` — lead and order chosen during roster preview.
    ///
    /// `order` holds 1-based roster slots, lead first.
    pub fn team_order(tag: &str, order: &[usize], rqid: Option<u64>) -> Self {
        let digits: String = order.iter().map(|slot| slot.to_string()).collect();
        Self::choose(tag, &format!("/team {digits}"), rqid)
    }

    /// Renders the command as a wire line.
    pub fn encode(&self) -> String {
        encode(&self.room, &self.parts)
    }

    /// The room this command targets (empty for global commands).
    pub fn room_id(&self) -> &str {
        &self.room
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_team_none_sends_null() {
        assert_eq!(Command::update_team(None).encode(), "|/utm null");
        assert_eq!(
            Command::update_team(Some("pikachu|||")).encode(),
            "|/utm pikachu|||"
        );
    }

    #[test]
    fn test_challenge_and_search_lines() {
        assert_eq!(
            Command::challenge("Rival", "gen9ou").encode(),
            "|/challenge Rival,gen9ou"
        );
        assert_eq!(
            Command::search("gen9randombattle").encode(),
            "|/search gen9randombattle"
        );
    }

    #[test]
    fn test_claim_identity_line() {
        assert_eq!(
            Command::claim_identity("arenabot", "tok;en").encode(),
            "|/trn arenabot,0,tok;en"
        );
    }

    #[test]
    fn test_choose_appends_rqid_when_known() {
        assert_eq!(
            Command::choose("battle-x-1", "/choose move 2", Some(5)).encode(),
            "battle-x-1|/choose move 2|5"
        );
        assert_eq!(
            Command::choose("battle-x-1", "/choose default", None).encode(),
            "battle-x-1|/choose default"
        );
    }

    #[test]
    fn test_team_order_lead_first() {
        assert_eq!(
            Command::team_order("battle-x-1", &[3, 1, 2, 4, 5, 6], Some(2))
                .encode(),
            "battle-x-1|/team 312456|2"
        );
    }
}
