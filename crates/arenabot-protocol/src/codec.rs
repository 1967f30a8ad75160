//! Line codec: turns raw frames into [`Message`]s and commands into lines.
//!
//! Incoming text is split on `|` and classified by its first non-empty
//! field. Outgoing commands are a room id followed by `|`-joined parts:
//!
//! ```text
//! encode("", ["/search gen9randombattle"])   → "|/search gen9randombattle"
//! encode("battle-x-1", ["/choose move 1", "3"]) → "battle-x-1|/choose move 1|3"
//! ```
//!
//! The server versions its protocol on its own schedule, so nothing here
//! ever fails on input: unknown or truncated lines become
//! [`Event::Unrecognized`] and callers skip what they don't understand.

use crate::{Event, Message};

/// Characters the server prefixes to user names to show rank or status.
const RANK_MARKS: &[char] = &[
    ' ', '+', '%', '@', '*', '#', '&', '~', '!', '‽', '☆', '§', '^',
];

/// Strips rank/status markers and surrounding whitespace from a user name.
pub fn strip_rank(name: &str) -> &str {
    name.trim().trim_start_matches(RANK_MARKS).trim()
}

/// Parses one received frame.
///
/// A leading `>tag` line sets the room; every other non-blank line becomes
/// one [`Event`].
pub fn parse_message(raw: &str) -> Message {
    let mut lines = raw.lines().peekable();

    let room = match lines.peek() {
        Some(first) if first.starts_with('>') => {
            let tag = first[1..].trim().to_string();
            lines.next();
            Some(tag)
        }
        _ => None,
    };

    let events = lines
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect();

    Message {
        room,
        events,
        raw: raw.to_string(),
    }
}

/// Classifies a single protocol line.
pub fn parse_line(line: &str) -> Event {
    let fields: Vec<&str> = line.split('|').collect();

    // The kind is the first non-empty field; for well-formed lines that is
    // fields[1], because every line starts with `|`.
    let Some(kind_idx) = fields.iter().position(|f| !f.is_empty()) else {
        return unrecognized(&fields);
    };
    let kind = fields[kind_idx];
    let args = &fields[kind_idx + 1..];
    let arg = |i: usize| args.get(i).copied();

    match kind {
        "challstr" => match (arg(0), args.get(1..)) {
            (Some(client_id), Some(rest)) if !rest.is_empty() => {
                Event::Challstr {
                    client_id: client_id.to_string(),
                    challenge: rest.join("|"),
                }
            }
            _ => unrecognized(&fields),
        },
        "pm" => parse_private_message(&fields, args),
        "updateuser" => match arg(0) {
            Some(name) => Event::UpdateUser {
                name: strip_rank(name).to_string(),
                named: arg(1) == Some("1"),
            },
            None => unrecognized(&fields),
        },
        "init" => Event::Init {
            kind: arg(0).unwrap_or_default().to_string(),
        },
        "title" => Event::Title {
            title: args.join("|"),
        },
        "player" => match (arg(0), arg(1)) {
            (Some(side), Some(name)) if !name.is_empty() => Event::Player {
                side: side.trim().to_string(),
                name: strip_rank(name).to_string(),
            },
            _ => unrecognized(&fields),
        },
        "request" => {
            let payload = args.join("|");
            let payload = payload.trim();
            Event::Request {
                payload: (!payload.is_empty()).then(|| payload.to_string()),
            }
        }
        "clearpoke" => Event::ClearPoke,
        "poke" => match (arg(0), arg(1)) {
            (Some(side), Some(details)) => Event::Poke {
                side: side.trim().to_string(),
                details: details.to_string(),
            },
            _ => unrecognized(&fields),
        },
        "teampreview" => Event::TeamPreview,
        "start" => Event::Start,
        "switch" | "drag" | "replace" => match (arg(0), arg(1)) {
            (Some(position), Some(details)) => Event::Switch {
                position: position.to_string(),
                details: details.to_string(),
            },
            _ => unrecognized(&fields),
        },
        "turn" => match arg(0).and_then(|n| n.trim().parse().ok()) {
            Some(n) => Event::Turn(n),
            None => unrecognized(&fields),
        },
        "upkeep" => Event::Upkeep,
        "win" => Event::Win {
            winner: args.join("|").trim().to_string(),
        },
        "tie" => Event::Tie,
        "c" | "chat" => match arg(0) {
            Some(user) => Event::Chat {
                user: strip_rank(user).to_string(),
                text: args.get(1..).unwrap_or_default().join("|"),
            },
            None => unrecognized(&fields),
        },
        // `|c:|<timestamp>|<user>|<text>`
        "c:" => match arg(1) {
            Some(user) => Event::Chat {
                user: strip_rank(user).to_string(),
                text: args.get(2..).unwrap_or_default().join("|"),
            },
            None => unrecognized(&fields),
        },
        "deinit" => Event::Deinit,
        "queryresponse" => match arg(0) {
            Some(query) => Event::QueryResponse {
                query: query.to_string(),
                payload: args.get(1..).unwrap_or_default().join("|"),
            },
            None => unrecognized(&fields),
        },
        "popup" => Event::Popup {
            text: args.join("|"),
        },
        _ => unrecognized(&fields),
    }
}

/// `|pm|<from>|<to>|<body>|...`
///
/// A challenge is a 9-field line whose body starts with `/challenge`; the
/// format sits in the field right after the body.
fn parse_private_message(fields: &[&str], args: &[&str]) -> Event {
    let (Some(from), Some(to)) = (args.first(), args.get(1)) else {
        return unrecognized(fields);
    };
    let body = args.get(2).copied().unwrap_or_default();

    if fields.len() == 9 && body.starts_with("/challenge") {
        if let Some(format) = args.get(3) {
            return Event::Challenge {
                challenger: strip_rank(from).to_string(),
                recipient: strip_rank(to).to_string(),
                format: format.trim().to_string(),
            };
        }
    }

    Event::PrivateMessage {
        from: strip_rank(from).to_string(),
        to: strip_rank(to).to_string(),
        body: args.get(2..).unwrap_or_default().join("|"),
    }
}

fn unrecognized(fields: &[&str]) -> Event {
    Event::Unrecognized {
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

/// Joins a room id and command parts into one outgoing line.
pub fn encode<S: AsRef<str>>(room: &str, parts: &[S]) -> String {
    let mut line = String::from(room);
    for part in parts {
        line.push('|');
        line.push_str(part.as_ref());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Finish;

    // =====================================================================
    // parse_line()
    // =====================================================================

    #[test]
    fn test_parse_line_challstr_keeps_challenge_with_pipes() {
        let event = parse_line("|challstr|4|abc|def");

        assert_eq!(
            event,
            Event::Challstr {
                client_id: "4".into(),
                challenge: "abc|def".into(),
            }
        );
    }

    #[test]
    fn test_parse_line_challenge_pm_extracts_format() {
        let event =
            parse_line("|pm| Rival| arenabot|/challenge gen9ou|gen9ou|||");

        assert_eq!(
            event,
            Event::Challenge {
                challenger: "Rival".into(),
                recipient: "arenabot".into(),
                format: "gen9ou".into(),
            }
        );
    }

    #[test]
    fn test_parse_line_challenge_strips_rank_marks() {
        let event =
            parse_line("|pm|+Voiced|!arenabot|/challenge gen9ou|gen9ou|||");

        assert!(matches!(
            event,
            Event::Challenge { ref challenger, ref recipient, .. }
                if challenger == "Voiced" && recipient == "arenabot"
        ));
    }

    #[test]
    fn test_parse_line_short_pm_is_plain_private_message() {
        let event = parse_line("|pm| Rival| arenabot|/challenge gen9ou");

        assert_eq!(
            event,
            Event::PrivateMessage {
                from: "Rival".into(),
                to: "arenabot".into(),
                body: "/challenge gen9ou".into(),
            }
        );
    }

    #[test]
    fn test_parse_line_request_empty_payload_is_none() {
        assert_eq!(parse_line("|request|"), Event::Request { payload: None });
        assert_eq!(
            parse_line(r#"|request|{"wait":true}"#),
            Event::Request {
                payload: Some(r#"{"wait":true}"#.into())
            }
        );
    }

    #[test]
    fn test_parse_line_turn_with_garbage_is_unrecognized() {
        assert_eq!(parse_line("|turn|3"), Event::Turn(3));
        assert!(matches!(
            parse_line("|turn|three"),
            Event::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_parse_line_chat_joins_text_with_pipes() {
        assert_eq!(
            parse_line("|c|☆Rival|gg |win| lol"),
            Event::Chat {
                user: "Rival".into(),
                text: "gg |win| lol".into(),
            }
        );
        assert_eq!(
            parse_line("|c:|1700000000| Rival|hi"),
            Event::Chat {
                user: "Rival".into(),
                text: "hi".into(),
            }
        );
    }

    #[test]
    fn test_parse_line_malformed_input_never_panics() {
        for line in ["", "|", "||||", "|pm", "|player|p1", "|switch", "no pipes"] {
            let _ = parse_line(line);
        }
        assert!(matches!(parse_line("|"), Event::Unrecognized { .. }));
        assert!(matches!(
            parse_line("|-damage|p2a: Pikachu|50/100"),
            Event::Unrecognized { .. }
        ));
    }

    // =====================================================================
    // parse_message()
    // =====================================================================

    #[test]
    fn test_parse_message_reads_room_tag_and_skips_blank_lines() {
        let msg = parse_message(
            ">battle-gen9randombattle-42\n|init|battle\n\n|title|arenabot vs. Rival",
        );

        assert_eq!(msg.room.as_deref(), Some("battle-gen9randombattle-42"));
        assert!(msg.is_battle());
        assert_eq!(msg.events.len(), 2);
        assert_eq!(
            msg.events[1],
            Event::Title {
                title: "arenabot vs. Rival".into()
            }
        );
    }

    #[test]
    fn test_parse_message_global_frame_has_no_room() {
        let msg = parse_message("|updateuser| arenabot|1|1|{}");

        assert!(msg.room.is_none());
        assert_eq!(
            msg.events,
            vec![Event::UpdateUser {
                name: "arenabot".into(),
                named: true
            }]
        );
    }

    #[test]
    fn test_finish_win_for_matching_tag() {
        let msg = parse_message(">battle-x-1\n|\n|win|arenabot");

        assert_eq!(msg.finish("battle-x-1"), Some(Finish::Win("arenabot".into())));
        assert_eq!(msg.finish("battle-x-2"), None);
    }

    #[test]
    fn test_finish_tie() {
        let msg = parse_message(">battle-x-1\n|tie");

        assert_eq!(msg.finish("battle-x-1"), Some(Finish::Tie));
    }

    #[test]
    fn test_finish_chat_line_is_never_match_end() {
        // Someone types the win token into chat: no win narration exists,
        // only a chat marker.
        let msg = parse_message(">battle-x-1\n|c| Rival||win| arenabot");

        assert_eq!(msg.finish("battle-x-1"), None);
    }

    #[test]
    fn test_after_start_returns_following_events() {
        let msg = parse_message(
            ">battle-x-1\n|player|p1|arenabot\n|start\n|switch|p2a: Mew|Mew, L80|100/100\n|turn|1",
        );

        let after = msg.after_start().unwrap();
        assert_eq!(after.len(), 2);
        assert!(matches!(after[0], Event::Switch { .. }));
        assert!(parse_message("|init|battle").after_start().is_none());
    }

    #[test]
    fn test_is_deinit_for() {
        let msg = parse_message(">battle-x-1\n|deinit");

        assert!(msg.is_deinit_for("battle-x-1"));
        assert!(!msg.is_deinit_for("battle-x-2"));
    }

    // =====================================================================
    // encode()
    // =====================================================================

    #[test]
    fn test_encode_global_and_room_lines() {
        assert_eq!(encode("", &["/search gen9ou"]), "|/search gen9ou");
        assert_eq!(
            encode("battle-x-1", &["/choose move 1", "3"]),
            "battle-x-1|/choose move 1|3"
        );
        assert_eq!(encode::<&str>("lobby", &[]), "lobby");
    }
}
